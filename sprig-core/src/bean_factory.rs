//! Bean Factory - 核心容器接口与默认实现
//!
//! 参考 Spring 的 BeanFactory 架构设计：
//! - [`BeanFactory`]：按名称 / 类型获取 Bean，可以作为 trait object 使用
//! - [`BeanFactoryExt`]：带泛型的便捷方法
//! - [`ListableBeanFactory`]：列举 Bean
//! - [`DefaultBeanFactory`]：定义注册表 + 单例缓存 + 类型索引的默认实现

use std::any::Any;
use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use parking_lot::{ReentrantMutex, RwLock};

use crate::bean::{BeanDefinition, BeanInstance, Construction};
use crate::config::ContainerConfig;
use crate::error::{display_chain, ContainerError, ContainerResult};
use crate::lifecycle::{self, CloseSummary};
use crate::registry::{BeanDefinitionRegistry, DefinitionRegistry};
use crate::type_index::TypeIndex;
use crate::types::{TypeDescriptor, TypeHandle};
use crate::utils::dependency::ResolutionChain;
use crate::Scope;

/// BeanFactory - 最基础的容器接口
///
/// 注意：此 trait 不包含泛型方法，因此可以作为 trait object 使用
pub trait BeanFactory: Send + Sync {
    /// 通过名称获取 Bean
    fn get_bean(&self, name: &str) -> ContainerResult<BeanInstance>;

    /// 通过类型获取 Bean
    ///
    /// 没有可赋值的 Bean 时返回 `Ok(None)`；有多个时取唯一的 primary。
    fn get_bean_by_type(&self, ty: &TypeDescriptor) -> ContainerResult<Option<BeanInstance>>;

    /// 获取所有可以赋值给 `ty` 的 Bean，键为 Bean 名称
    fn get_beans_of_type(&self, ty: &TypeDescriptor) -> ContainerResult<HashMap<String, BeanInstance>>;

    /// 获取 Bean 的声明类型，不会创建实例
    fn get_type(&self, name: &str) -> ContainerResult<TypeHandle>;

    /// 检查是否包含指定名称的 Bean
    fn contains_bean(&self, name: &str) -> bool;

    fn is_singleton(&self, name: &str) -> ContainerResult<bool>;

    fn is_prototype(&self, name: &str) -> ContainerResult<bool>;
}

/// BeanFactoryExt - BeanFactory 的扩展 trait
///
/// 提供泛型方法，不能作为 trait object 使用
pub trait BeanFactoryExt: BeanFactory {
    /// 通过名称获取 Bean 并转换为具体类型
    fn get_bean_as<T: Any + Send + Sync>(&self, name: &str) -> ContainerResult<Arc<T>> {
        let bean = self.get_bean(name)?;
        downcast_bean(name, &bean)
    }

    /// 通过类型获取 Bean 并转换为具体类型
    fn get_bean_by_type_as<T: Any + Send + Sync>(
        &self,
        ty: &TypeDescriptor,
    ) -> ContainerResult<Option<Arc<T>>> {
        match self.get_bean_by_type(ty)? {
            Some(bean) => downcast_bean(ty.name(), &bean).map(Some),
            None => Ok(None),
        }
    }
}

impl<F: BeanFactory + ?Sized> BeanFactoryExt for F {}

fn downcast_bean<T: Any + Send + Sync>(name: &str, bean: &BeanInstance) -> ContainerResult<Arc<T>> {
    bean.downcast::<T>().ok_or_else(|| ContainerError::TypeMismatch {
        name: name.to_string(),
        expected: std::any::type_name::<T>().to_string(),
        found: bean.class().name().to_string(),
    })
}

/// ListableBeanFactory - 可列举的 Bean 工厂
pub trait ListableBeanFactory: BeanFactory {
    /// 获取所有 Bean 的名称（排序后）
    fn get_bean_names(&self) -> Vec<String>;

    /// 获取可以赋值给指定类型的 Bean 名称（排序后）
    fn get_bean_names_for_type(&self, ty: &TypeDescriptor) -> Vec<String>;

    /// 获取 Bean 定义的数量
    fn get_bean_definition_count(&self) -> usize;
}

/// DefaultBeanFactory - Bean 工厂的默认实现
///
/// 持有定义注册表、单例缓存和类型索引。单例的创建在一把可重入锁内完成，
/// 保证同一名称在并发首次访问时只构造一次；已缓存的单例通过读锁直接返回。
///
/// ```
/// use sprig_core::prelude::*;
///
/// struct Greeter;
///
/// let class = TypeDescriptor::builder::<Greeter>().constructor(|| Ok(Greeter)).build();
/// let factory = DefaultBeanFactory::new();
/// factory
///     .register_bean_definition("greeter", BeanDefinition::new().with_bean_class(&class))
///     .unwrap();
///
/// let a = factory.get_bean("greeter").unwrap();
/// let b = factory.get_bean("greeter").unwrap();
/// assert!(a.ptr_eq(&b));
/// ```
pub struct DefaultBeanFactory {
    /// Bean 定义存储
    registry: DefinitionRegistry,

    /// 单例 Bean 缓存
    singletons: RwLock<HashMap<String, BeanInstance>>,

    /// 单例创建锁（工厂 Bean 本身可能也是单例，因此必须可重入）
    singleton_lock: ReentrantMutex<()>,

    /// 类型到名称集合的索引，需要显式构建
    type_index: RwLock<TypeIndex>,

    type_index_built: AtomicBool,

    closed: AtomicBool,

    config: ContainerConfig,
}

impl DefaultBeanFactory {
    /// 使用默认配置创建 Bean 工厂
    pub fn new() -> Self {
        Self::with_config(ContainerConfig::default())
    }

    pub fn with_config(config: ContainerConfig) -> Self {
        Self {
            registry: DefinitionRegistry::with_capacity(config.initial_capacity),
            singletons: RwLock::new(HashMap::with_capacity(config.initial_capacity)),
            singleton_lock: ReentrantMutex::new(()),
            type_index: RwLock::new(TypeIndex::new()),
            type_index_built: AtomicBool::new(false),
            closed: AtomicBool::new(false),
            config,
        }
    }

    pub fn config(&self) -> &ContainerConfig {
        &self.config
    }

    /// 构建类型索引
    ///
    /// 索引不会随注册自动更新，注册新定义后需要重新调用。
    pub fn build_type_index(&self) -> ContainerResult<()> {
        let mut index = TypeIndex::new();
        let names = self.registry.names();
        for name in &names {
            let ty = self.get_type(name)?;
            index.insert(name, &ty);
        }

        tracing::debug!(
            "Type index built: {} bean(s) under {} type(s)",
            names.len(),
            index.len()
        );
        *self.type_index.write() = index;
        self.type_index_built.store(true, Ordering::Release);
        Ok(())
    }

    /// 构建类型索引，并按配置预实例化单例
    pub fn refresh(&self) -> ContainerResult<()> {
        self.build_type_index()?;
        if self.config.preinstantiate_singletons {
            self.preinstantiate_singletons()?;
        }
        Ok(())
    }

    /// 预实例化所有单例 Bean
    pub fn preinstantiate_singletons(&self) -> ContainerResult<()> {
        let names: Vec<String> = self
            .registry
            .snapshot()
            .into_iter()
            .filter(|(_, definition)| definition.is_singleton())
            .map(|(name, _)| name)
            .collect();

        tracing::debug!("Pre-instantiating {} singleton beans", names.len());
        for name in names {
            self.get_bean(&name)?;
        }
        Ok(())
    }

    /// 单例是否已经创建
    pub fn contains_singleton(&self, name: &str) -> bool {
        self.singletons.read().contains_key(name)
    }

    pub fn singleton_count(&self) -> usize {
        self.singletons.read().len()
    }

    pub fn is_closed(&self) -> bool {
        self.closed.load(Ordering::Acquire)
    }

    /// 关闭容器，执行所有已创建单例的 destroy 方法
    ///
    /// 单个 Bean 的销毁失败只记录日志并计入 [`CloseSummary`]，不会中断其余 Bean。
    /// 只有第一次调用会执行销毁，之后的调用直接返回空结果。关闭后单例缓存被清空，
    /// 再获取 Bean 会返回 [`ContainerError::Closed`]。
    pub fn close(&self) -> CloseSummary {
        if self.closed.swap(true, Ordering::AcqRel) {
            tracing::debug!("Bean factory already closed, skipping destruction");
            return CloseSummary::default();
        }

        // 等待正在进行的单例创建完成，之后不会再有新的单例进入缓存
        let _guard = self.singleton_lock.lock();
        let singletons = std::mem::take(&mut *self.singletons.write());
        lifecycle::destroy_singletons(&self.registry.snapshot(), &singletons)
    }

    fn cached_singleton(&self, name: &str) -> Option<BeanInstance> {
        self.singletons.read().get(name).cloned()
    }

    fn ensure_open(&self, name: &str) -> ContainerResult<()> {
        if self.is_closed() {
            tracing::debug!("Rejected request for bean '{}': factory is closed", name);
            return Err(ContainerError::Closed(name.to_string()));
        }
        Ok(())
    }

    fn do_get_bean(&self, name: &str, chain: &mut ResolutionChain) -> ContainerResult<BeanInstance> {
        tracing::trace!("Requesting bean: '{}'", name);
        self.ensure_open(name)?;

        if let Some(bean) = self.cached_singleton(name) {
            tracing::debug!("Returning cached instance of singleton bean '{}'", name);
            return Ok(bean);
        }

        let definition = self.registry.get(name).ok_or_else(|| {
            tracing::debug!("Bean '{}' not found in container", name);
            ContainerError::BeanNotFound(name.to_string())
        })?;

        chain
            .enter(name)
            .map_err(|chain| ContainerError::CircularReference { chain })?;

        let result = match definition.scope() {
            Scope::Singleton => self.get_or_create_singleton(name, &definition, chain),
            Scope::Prototype => {
                tracing::debug!("Creating new instance of prototype bean '{}'", name);
                self.create_bean(name, &definition, chain)
            }
        };

        chain.exit(name);
        result
    }

    /// 双重检查：锁外的读已经未命中，加锁后再检查一次，仍然不存在才创建并缓存
    fn get_or_create_singleton(
        &self,
        name: &str,
        definition: &BeanDefinition,
        chain: &mut ResolutionChain,
    ) -> ContainerResult<BeanInstance> {
        let _guard = self.singleton_lock.lock();

        if let Some(bean) = self.cached_singleton(name) {
            tracing::debug!("Singleton bean '{}' was created by another caller", name);
            return Ok(bean);
        }
        self.ensure_open(name)?;

        tracing::info!("Creating shared instance of singleton bean '{}'", name);
        let bean = self.create_bean(name, definition, chain)?;

        self.singletons.write().insert(name.to_string(), bean.clone());
        tracing::debug!("Singleton bean '{}' created and cached", name);
        Ok(bean)
    }

    /// 实例化并执行 init 方法，init 失败的实例不会被缓存
    fn create_bean(
        &self,
        name: &str,
        definition: &BeanDefinition,
        chain: &mut ResolutionChain,
    ) -> ContainerResult<BeanInstance> {
        let instance = match definition.construction() {
            Some(Construction::Constructor { bean_class }) => {
                self.instantiate_by_constructor(name, bean_class)
            }
            Some(Construction::StaticFactory {
                bean_class,
                factory_method,
            }) => self.instantiate_by_static_factory(name, bean_class, factory_method),
            Some(Construction::FactoryBean {
                factory_bean,
                factory_method,
            }) => self.instantiate_by_factory_bean(name, factory_bean, factory_method, chain),
            None => Err(ContainerError::InvalidDefinition {
                name: name.to_string(),
                definition: definition.to_string(),
            }),
        }?;

        self.invoke_init_method(name, definition, &instance)?;
        Ok(instance)
    }

    fn instantiate_by_constructor(&self, name: &str, class: &TypeHandle) -> ContainerResult<BeanInstance> {
        let strategy = || format!("constructor of '{}'", class.name());
        match class.instantiate() {
            Some(Ok(bean)) => Ok(bean),
            Some(Err(source)) => Err(instantiation_failure(name, strategy(), source)),
            None => Err(instantiation_failure(
                name,
                strategy(),
                anyhow::anyhow!("'{}' has no no-argument constructor", class.name()),
            )),
        }
    }

    fn instantiate_by_static_factory(
        &self,
        name: &str,
        class: &TypeHandle,
        method: &str,
    ) -> ContainerResult<BeanInstance> {
        let strategy = format!("static factory method '{}::{}'", class.name(), method);
        let factory = match class.find_static_method(method) {
            Some(factory) => factory,
            None => {
                let source = anyhow::anyhow!("no static method named '{}' on '{}'", method, class.name());
                return Err(instantiation_failure(name, strategy, source));
            }
        };
        factory
            .invoke()
            .map_err(|source| instantiation_failure(name, strategy, source))
    }

    fn instantiate_by_factory_bean(
        &self,
        name: &str,
        factory_bean: &str,
        method: &str,
        chain: &mut ResolutionChain,
    ) -> ContainerResult<BeanInstance> {
        let factory = self.do_get_bean(factory_bean, chain)?;
        let strategy = format!("factory method '{}' on bean '{}'", method, factory_bean);

        let factory_method = match factory.class().find_method(method) {
            Some(factory_method) => factory_method,
            None => {
                let source = anyhow::anyhow!("no method named '{}' on '{}'", method, factory.class().name());
                return Err(instantiation_failure(name, strategy, source));
            }
        };

        match factory_method.invoke(&factory) {
            Ok(Some(bean)) => Ok(bean),
            Ok(None) => Err(instantiation_failure(
                name,
                strategy,
                anyhow::anyhow!("factory method returned no instance"),
            )),
            Err(source) => Err(instantiation_failure(name, strategy, source)),
        }
    }

    fn invoke_init_method(
        &self,
        name: &str,
        definition: &BeanDefinition,
        instance: &BeanInstance,
    ) -> ContainerResult<()> {
        let Some(method) = definition.init_method_name() else {
            return Ok(());
        };

        let failure = |source: anyhow::Error| {
            let err = ContainerError::InitializationFailed {
                name: name.to_string(),
                method: method.to_string(),
                source,
            };
            tracing::error!("{}", display_chain(&err));
            err
        };

        let init = instance.class().find_method(method).ok_or_else(|| {
            failure(anyhow::anyhow!(
                "no method named '{}' on '{}'",
                method,
                instance.class().name()
            ))
        })?;

        tracing::trace!("Invoking init method '{}' on bean '{}'", method, name);
        init.invoke(instance).map(|_| ()).map_err(failure)
    }

    fn resolve_type(&self, name: &str, chain: &mut ResolutionChain) -> ContainerResult<TypeHandle> {
        let definition = self
            .registry
            .get(name)
            .ok_or_else(|| ContainerError::BeanNotFound(name.to_string()))?;

        let type_error = |type_name: &str, method: &str| ContainerError::TypeResolution {
            name: name.to_string(),
            type_name: type_name.to_string(),
            method: method.to_string(),
        };

        match definition.construction() {
            // 构造函数方式，类型就是 bean_class
            Some(Construction::Constructor { bean_class }) => Ok(Arc::clone(bean_class)),
            // 静态工厂方式，只查找 bean_class 自己声明的方法
            Some(Construction::StaticFactory {
                bean_class,
                factory_method,
            }) => bean_class
                .declared_static_method(factory_method)
                .map(|method| Arc::clone(method.return_type()))
                .ok_or_else(|| type_error(bean_class.name(), factory_method)),
            // 工厂 Bean 方式，先推断工厂 Bean 的类型，再取工厂方法的返回值类型
            Some(Construction::FactoryBean {
                factory_bean,
                factory_method,
            }) => {
                chain
                    .enter(name)
                    .map_err(|chain| ContainerError::CircularReference { chain })?;
                let factory_type = self.resolve_type(factory_bean, chain);
                chain.exit(name);

                let factory_type = factory_type?;
                factory_type
                    .declared_method(factory_method)
                    .and_then(|method| method.return_type().cloned())
                    .ok_or_else(|| type_error(factory_type.name(), factory_method))
            }
            None => Err(ContainerError::InvalidDefinition {
                name: name.to_string(),
                definition: definition.to_string(),
            }),
        }
    }

    /// 多个候选时选出唯一的 primary
    ///
    /// 一次遍历同时收集全部候选名称；遇到第二个 primary 立即失败。
    fn determine_primary(&self, ty: &TypeDescriptor, candidates: &[String]) -> ContainerResult<String> {
        let mut primary: Option<&String> = None;
        let mut scanned: Vec<String> = Vec::with_capacity(candidates.len());

        for name in candidates {
            let is_primary = self
                .registry
                .get(name)
                .map(|definition| definition.is_primary())
                .unwrap_or(false);

            if is_primary {
                if let Some(first) = primary {
                    let err = ContainerError::AmbiguousPrimary {
                        type_name: ty.name().to_string(),
                        primaries: vec![first.clone(), name.clone()],
                    };
                    tracing::error!("{}", err);
                    return Err(err);
                }
                primary = Some(name);
            }
            scanned.push(name.clone());
        }

        match primary {
            Some(name) => Ok(name.clone()),
            None => {
                let err = ContainerError::AmbiguousBean {
                    type_name: ty.name().to_string(),
                    candidates: scanned,
                };
                tracing::error!("{}", err);
                Err(err)
            }
        }
    }

    fn names_for_type(&self, ty: &TypeDescriptor) -> Vec<String> {
        let index = self.type_index.read();
        match index.names_for(ty) {
            Some(names) => names.iter().cloned().collect(),
            None => {
                if !self.type_index_built.load(Ordering::Acquire) && !self.registry.is_empty() {
                    tracing::warn!(
                        "Type index has not been built, lookup of '{}' sees no beans",
                        ty.name()
                    );
                }
                Vec::new()
            }
        }
    }
}

fn instantiation_failure(name: &str, strategy: String, source: anyhow::Error) -> ContainerError {
    let err = ContainerError::InstantiationFailed {
        name: name.to_string(),
        strategy,
        source,
    };
    tracing::error!("Error creating bean instance: {}", display_chain(&err));
    err
}

impl Default for DefaultBeanFactory {
    fn default() -> Self {
        Self::new()
    }
}

impl BeanFactory for DefaultBeanFactory {
    fn get_bean(&self, name: &str) -> ContainerResult<BeanInstance> {
        let mut chain = ResolutionChain::new();
        self.do_get_bean(name, &mut chain)
    }

    fn get_bean_by_type(&self, ty: &TypeDescriptor) -> ContainerResult<Option<BeanInstance>> {
        let names = self.names_for_type(ty);
        match names.as_slice() {
            [] => Ok(None),
            [name] => self.get_bean(name).map(Some),
            candidates => {
                let primary = self.determine_primary(ty, candidates)?;
                tracing::debug!("Resolved primary bean '{}' for type '{}'", primary, ty.name());
                self.get_bean(&primary).map(Some)
            }
        }
    }

    fn get_beans_of_type(&self, ty: &TypeDescriptor) -> ContainerResult<HashMap<String, BeanInstance>> {
        let names = self.names_for_type(ty);
        let mut beans = HashMap::with_capacity(names.len());
        for name in names {
            let bean = self.get_bean(&name)?;
            beans.insert(name, bean);
        }
        Ok(beans)
    }

    fn get_type(&self, name: &str) -> ContainerResult<TypeHandle> {
        let mut chain = ResolutionChain::new();
        self.resolve_type(name, &mut chain)
    }

    fn contains_bean(&self, name: &str) -> bool {
        self.registry.contains(name)
    }

    fn is_singleton(&self, name: &str) -> ContainerResult<bool> {
        self.registry
            .get(name)
            .map(|definition| definition.is_singleton())
            .ok_or_else(|| ContainerError::BeanNotFound(name.to_string()))
    }

    fn is_prototype(&self, name: &str) -> ContainerResult<bool> {
        self.registry
            .get(name)
            .map(|definition| definition.is_prototype())
            .ok_or_else(|| ContainerError::BeanNotFound(name.to_string()))
    }
}

impl ListableBeanFactory for DefaultBeanFactory {
    fn get_bean_names(&self) -> Vec<String> {
        self.registry.names()
    }

    fn get_bean_names_for_type(&self, ty: &TypeDescriptor) -> Vec<String> {
        self.names_for_type(ty)
    }

    fn get_bean_definition_count(&self) -> usize {
        self.registry.len()
    }
}

impl BeanDefinitionRegistry for DefaultBeanFactory {
    fn register_bean_definition(&self, name: &str, definition: BeanDefinition) -> ContainerResult<()> {
        self.registry.register(name, definition)
    }

    fn get_bean_definition(&self, name: &str) -> Option<Arc<BeanDefinition>> {
        self.registry.get(name)
    }

    fn contains_bean_definition(&self, name: &str) -> bool {
        self.registry.contains(name)
    }
}
