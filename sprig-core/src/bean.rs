use std::any::Any;
use std::fmt;
use std::sync::Arc;

use crate::types::TypeHandle;
use crate::Scope;

/// 容器管理的 Bean 实例
///
/// 持有实例本身以及它的运行时类型描述符。克隆只增加引用计数，
/// 单例的所有克隆都指向同一个实例。
#[derive(Clone)]
pub struct BeanInstance {
    class: TypeHandle,
    value: Arc<dyn Any + Send + Sync>,
}

impl BeanInstance {
    pub fn new<T: Any + Send + Sync>(class: TypeHandle, value: T) -> Self {
        Self {
            class,
            value: Arc::new(value),
        }
    }

    pub fn from_arc(class: TypeHandle, value: Arc<dyn Any + Send + Sync>) -> Self {
        Self { class, value }
    }

    /// 运行时类型
    pub fn class(&self) -> &TypeHandle {
        &self.class
    }

    pub fn value(&self) -> &Arc<dyn Any + Send + Sync> {
        &self.value
    }

    pub fn downcast_ref<T: Any>(&self) -> Option<&T> {
        self.value.downcast_ref::<T>()
    }

    pub fn downcast<T: Any + Send + Sync>(&self) -> Option<Arc<T>> {
        Arc::clone(&self.value).downcast::<T>().ok()
    }

    /// 是否为同一个实例
    pub fn ptr_eq(&self, other: &BeanInstance) -> bool {
        Arc::ptr_eq(&self.value, &other.value)
    }
}

impl fmt::Debug for BeanInstance {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("BeanInstance")
            .field("class", &self.class.name())
            .field("address", &Arc::as_ptr(&self.value).cast::<()>())
            .finish()
    }
}

/// 构造方式，由合法的 Bean 定义唯一确定
#[derive(Debug, Clone, Copy)]
pub enum Construction<'a> {
    /// 调用 `bean_class` 的无参构造函数
    Constructor { bean_class: &'a TypeHandle },

    /// 调用 `bean_class` 上的静态工厂方法
    StaticFactory {
        bean_class: &'a TypeHandle,
        factory_method: &'a str,
    },

    /// 调用另一个 Bean 上的实例工厂方法
    FactoryBean {
        factory_bean: &'a str,
        factory_method: &'a str,
    },
}

/// Bean 定义 - 描述如何创建和销毁一个 Bean
///
/// 通过 builder 风格的方法构建，注册到容器后不再修改。
///
/// ```
/// use sprig_core::{BeanDefinition, Scope};
/// use sprig_core::types::TypeDescriptor;
///
/// struct ABean;
///
/// let class = TypeDescriptor::builder::<ABean>().constructor(|| Ok(ABean)).build();
/// let bd = BeanDefinition::new()
///     .with_bean_class(&class)
///     .with_scope(Scope::Prototype)
///     .with_init_method("init");
/// assert!(bd.validate());
///
/// assert!(!BeanDefinition::new().validate());
/// ```
#[derive(Clone, Default)]
pub struct BeanDefinition {
    bean_class: Option<TypeHandle>,
    factory_method_name: Option<String>,
    factory_bean_name: Option<String>,
    scope: Scope,
    init_method_name: Option<String>,
    destroy_method_name: Option<String>,
    primary: bool,
}

impl BeanDefinition {
    pub fn new() -> Self {
        Self::default()
    }

    /// 设置 Bean 的类型
    pub fn with_bean_class(mut self, class: &TypeHandle) -> Self {
        self.bean_class = Some(Arc::clone(class));
        self
    }

    /// 设置工厂方法名（静态工厂或工厂 Bean 的实例方法）
    pub fn with_factory_method(mut self, name: impl Into<String>) -> Self {
        self.factory_method_name = Some(name.into());
        self
    }

    /// 设置工厂 Bean 名称
    pub fn with_factory_bean(mut self, name: impl Into<String>) -> Self {
        self.factory_bean_name = Some(name.into());
        self
    }

    pub fn with_scope(mut self, scope: Scope) -> Self {
        self.scope = scope;
        self
    }

    /// 设置初始化方法（@PostConstruct）
    pub fn with_init_method(mut self, name: impl Into<String>) -> Self {
        self.init_method_name = Some(name.into());
        self
    }

    /// 设置销毁方法（@PreDestroy）
    pub fn with_destroy_method(mut self, name: impl Into<String>) -> Self {
        self.destroy_method_name = Some(name.into());
        self
    }

    pub fn with_primary(mut self, primary: bool) -> Self {
        self.primary = primary;
        self
    }

    pub fn bean_class(&self) -> Option<&TypeHandle> {
        self.bean_class.as_ref()
    }

    pub fn factory_method_name(&self) -> Option<&str> {
        non_blank(&self.factory_method_name)
    }

    pub fn factory_bean_name(&self) -> Option<&str> {
        non_blank(&self.factory_bean_name)
    }

    pub fn scope(&self) -> Scope {
        self.scope
    }

    pub fn is_singleton(&self) -> bool {
        self.scope == Scope::Singleton
    }

    pub fn is_prototype(&self) -> bool {
        self.scope == Scope::Prototype
    }

    pub fn init_method_name(&self) -> Option<&str> {
        non_blank(&self.init_method_name)
    }

    pub fn destroy_method_name(&self) -> Option<&str> {
        non_blank(&self.destroy_method_name)
    }

    pub fn is_primary(&self) -> bool {
        self.primary
    }

    /// 校验定义的合法性
    ///
    /// 没有指定类型时，工厂 Bean 和工厂方法必须同时指定；
    /// 指定了类型就不能再指定工厂 Bean。
    pub fn validate(&self) -> bool {
        self.construction().is_some()
    }

    /// 定义对应的构造方式，不合法的定义返回 `None`
    pub fn construction(&self) -> Option<Construction<'_>> {
        match (
            self.bean_class.as_ref(),
            self.factory_bean_name(),
            self.factory_method_name(),
        ) {
            (Some(bean_class), None, None) => Some(Construction::Constructor { bean_class }),
            (Some(bean_class), None, Some(factory_method)) => Some(Construction::StaticFactory {
                bean_class,
                factory_method,
            }),
            (None, Some(factory_bean), Some(factory_method)) => Some(Construction::FactoryBean {
                factory_bean,
                factory_method,
            }),
            _ => None,
        }
    }
}

fn non_blank(value: &Option<String>) -> Option<&str> {
    value.as_deref().filter(|s| !s.trim().is_empty())
}

impl PartialEq for BeanDefinition {
    fn eq(&self, other: &Self) -> bool {
        self.bean_class == other.bean_class
            && self.factory_method_name() == other.factory_method_name()
            && self.factory_bean_name() == other.factory_bean_name()
            && self.scope == other.scope
            && self.init_method_name() == other.init_method_name()
            && self.destroy_method_name() == other.destroy_method_name()
            && self.primary == other.primary
    }
}

impl fmt::Debug for BeanDefinition {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("BeanDefinition")
            .field("bean_class", &self.bean_class.as_ref().map(|c| c.name()))
            .field("factory_method_name", &self.factory_method_name)
            .field("factory_bean_name", &self.factory_bean_name)
            .field("scope", &self.scope)
            .field("init_method_name", &self.init_method_name)
            .field("destroy_method_name", &self.destroy_method_name)
            .field("primary", &self.primary)
            .finish()
    }
}

impl fmt::Display for BeanDefinition {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[")?;
        match self.construction() {
            Some(Construction::Constructor { bean_class }) => {
                write!(f, "class={}", bean_class.name())?
            }
            Some(Construction::StaticFactory {
                bean_class,
                factory_method,
            }) => write!(f, "class={}; factoryMethod={}", bean_class.name(), factory_method)?,
            Some(Construction::FactoryBean {
                factory_bean,
                factory_method,
            }) => write!(f, "factoryBean={}; factoryMethod={}", factory_bean, factory_method)?,
            None => write!(
                f,
                "class={}; factoryBean={}; factoryMethod={}",
                self.bean_class.as_ref().map(|c| c.name()).unwrap_or("<none>"),
                self.factory_bean_name().unwrap_or("<none>"),
                self.factory_method_name().unwrap_or("<none>")
            )?,
        }
        write!(f, "; scope={}; primary={}", self.scope, self.primary)?;
        if let Some(init) = self.init_method_name() {
            write!(f, "; initMethod={}", init)?;
        }
        if let Some(destroy) = self.destroy_method_name() {
            write!(f, "; destroyMethod={}", destroy)?;
        }
        write!(f, "]")
    }
}
