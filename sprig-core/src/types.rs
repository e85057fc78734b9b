//! 类型模型 - 代替运行时反射的显式类型描述
//!
//! 每个可以被容器构造、或者作为类型查找键的类型都由一个 [`TypeDescriptor`] 描述：
//! 名称、父类、实现的接口、无参构造函数、声明的静态方法和实例方法。
//! 描述符在注册期一次性构建，之后不可变；父类和接口通过已经构建好的
//! [`TypeHandle`] 引用，因此类型图天然无环。
//!
//! 所有类型共同的根类型（类似 Java 的 `Object`）不会被显式建模：
//! 没有父类的描述符就是继承链的终点。
//!
//! # 示例
//!
//! ```
//! use sprig_core::types::TypeDescriptor;
//!
//! struct Product;
//! struct ProductFactory;
//!
//! let product = TypeDescriptor::builder::<Product>()
//!     .constructor(|| Ok(Product))
//!     .build();
//!
//! let factory = TypeDescriptor::builder::<ProductFactory>()
//!     .static_method("make", &product, || Ok(Product))
//!     .build();
//!
//! let make = factory.declared_static_method("make").unwrap();
//! assert_eq!(make.return_type().name(), product.name());
//! ```

use std::any::{Any, TypeId};
use std::collections::{HashMap, HashSet};
use std::fmt;
use std::hash::{Hash, Hasher};
use std::marker::PhantomData;
use std::sync::Arc;

use crate::bean::BeanInstance;

/// 类型句柄
pub type TypeHandle = Arc<TypeDescriptor>;

/// 无参构造函数
pub type ConstructorFn = Arc<dyn Fn() -> anyhow::Result<Arc<dyn Any + Send + Sync>> + Send + Sync>;

/// 无参静态方法，返回新的 Bean 实例
pub type StaticMethodFn = Arc<dyn Fn() -> anyhow::Result<BeanInstance> + Send + Sync>;

/// 无参实例方法，`None` 表示没有返回值
pub type InstanceMethodFn =
    Arc<dyn Fn(&BeanInstance) -> anyhow::Result<Option<BeanInstance>> + Send + Sync>;

/// 类型种类
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TypeKind {
    /// 类（可能是抽象的，即没有构造函数）
    Class,
    /// 接口 / 能力
    Interface,
}

/// 声明在类型上的静态方法
#[derive(Clone)]
pub struct StaticMethod {
    name: String,
    return_type: TypeHandle,
    invoke: StaticMethodFn,
}

impl StaticMethod {
    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn return_type(&self) -> &TypeHandle {
        &self.return_type
    }

    pub fn invoke(&self) -> anyhow::Result<BeanInstance> {
        (self.invoke)()
    }
}

/// 声明在类型上的实例方法
#[derive(Clone)]
pub struct Method {
    name: String,
    return_type: Option<TypeHandle>,
    invoke: InstanceMethodFn,
}

impl Method {
    pub fn name(&self) -> &str {
        &self.name
    }

    /// 返回类型，`None` 表示无返回值
    pub fn return_type(&self) -> Option<&TypeHandle> {
        self.return_type.as_ref()
    }

    pub fn invoke(&self, target: &BeanInstance) -> anyhow::Result<Option<BeanInstance>> {
        (self.invoke)(target)
    }
}

/// 类型描述符
///
/// 描述符以名称作为身份：两个同名描述符被视为同一类型。
pub struct TypeDescriptor {
    name: String,
    kind: TypeKind,
    rust_type: Option<TypeId>,
    superclass: Option<TypeHandle>,
    interfaces: Vec<TypeHandle>,
    constructor: Option<ConstructorFn>,
    static_methods: HashMap<String, StaticMethod>,
    methods: HashMap<String, Method>,
}

impl TypeDescriptor {
    /// 为具体的 Rust 类型创建描述符构建器，名称默认为 `std::any::type_name::<T>()`
    pub fn builder<T: Any + Send + Sync>() -> TypeBuilder<T> {
        TypeBuilder::new(
            std::any::type_name::<T>().to_string(),
            TypeKind::Class,
            Some(TypeId::of::<T>()),
        )
    }

    /// 没有对应 Rust 类型的类（例如只提供继承方法的抽象父类）
    pub fn class(name: impl Into<String>) -> TypeBuilder<Opaque> {
        TypeBuilder::new(name.into(), TypeKind::Class, None)
    }

    /// 接口描述符
    pub fn interface(name: impl Into<String>) -> TypeBuilder<Opaque> {
        TypeBuilder::new(name.into(), TypeKind::Interface, None)
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// 去掉模块路径和泛型参数后的名称，`app::service::UserService<T>` -> `UserService`
    pub fn short_name(&self) -> &str {
        let base = self.name.split('<').next().unwrap_or(&self.name);
        base.rsplit(|c: char| c == ':' || c == '.')
            .next()
            .unwrap_or(base)
            .trim()
    }

    pub fn kind(&self) -> TypeKind {
        self.kind
    }

    pub fn is_interface(&self) -> bool {
        self.kind == TypeKind::Interface
    }

    /// 描述符对应的 Rust 类型
    pub fn rust_type(&self) -> Option<TypeId> {
        self.rust_type
    }

    pub fn superclass(&self) -> Option<&TypeHandle> {
        self.superclass.as_ref()
    }

    /// 直接声明实现的接口
    pub fn interfaces(&self) -> &[TypeHandle] {
        &self.interfaces
    }

    pub fn has_constructor(&self) -> bool {
        self.constructor.is_some()
    }

    /// 调用无参构造函数，没有构造函数时返回 `None`
    pub fn instantiate(self: &Arc<Self>) -> Option<anyhow::Result<BeanInstance>> {
        let constructor = self.constructor.as_ref()?;
        Some(constructor().map(|value| BeanInstance::from_arc(Arc::clone(self), value)))
    }

    /// 只在本类型上查找静态方法（不含父类）
    pub fn declared_static_method(&self, name: &str) -> Option<&StaticMethod> {
        self.static_methods.get(name)
    }

    /// 沿父类链查找静态方法
    pub fn find_static_method(&self, name: &str) -> Option<&StaticMethod> {
        self.declared_static_method(name).or_else(|| {
            self.superclass
                .as_ref()
                .and_then(|parent| parent.find_static_method(name))
        })
    }

    /// 只在本类型上查找实例方法（不含父类）
    pub fn declared_method(&self, name: &str) -> Option<&Method> {
        self.methods.get(name)
    }

    /// 查找实例方法，包含父类和接口上声明的方法
    pub fn find_method(&self, name: &str) -> Option<Method> {
        if let Some(method) = self.declared_method(name) {
            return Some(method.clone());
        }
        self.assignable_types()
            .iter()
            .find_map(|ty| ty.declared_method(name).cloned())
    }

    /// 父类链，从直接父类开始
    pub fn ancestors(&self) -> Vec<TypeHandle> {
        let mut chain = Vec::new();
        let mut current = self.superclass.clone();
        while let Some(parent) = current {
            current = parent.superclass.clone();
            chain.push(parent);
        }
        chain
    }

    /// 本类型之外所有可赋值的类型：父类链以及其中任意一层实现的接口（递归）
    ///
    /// 结果已去重，顺序为：父类链在前，接口按发现顺序在后。
    pub fn assignable_types(&self) -> Vec<TypeHandle> {
        let ancestors = self.ancestors();
        let mut seen: HashSet<String> = HashSet::new();
        seen.insert(self.name.clone());

        let mut result: Vec<TypeHandle> = Vec::new();
        for parent in &ancestors {
            if seen.insert(parent.name.clone()) {
                result.push(Arc::clone(parent));
            }
        }

        let mut pending: Vec<TypeHandle> = self.interfaces.iter().cloned().collect();
        for parent in &ancestors {
            pending.extend(parent.interfaces.iter().cloned());
        }
        pending.reverse();

        while let Some(iface) = pending.pop() {
            if !seen.insert(iface.name.clone()) {
                continue;
            }
            for parent_iface in iface.interfaces.iter().rev() {
                pending.push(Arc::clone(parent_iface));
            }
            if let Some(parent) = &iface.superclass {
                pending.push(Arc::clone(parent));
            }
            result.push(iface);
        }

        result
    }

    /// `self` 的实例是否可以赋值给 `other`
    pub fn is_assignable_to(&self, other: &TypeDescriptor) -> bool {
        self == other || self.assignable_types().iter().any(|ty| **ty == *other)
    }
}

impl PartialEq for TypeDescriptor {
    fn eq(&self, other: &Self) -> bool {
        self.name == other.name
    }
}

impl Eq for TypeDescriptor {}

impl Hash for TypeDescriptor {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.name.hash(state);
    }
}

impl fmt::Display for TypeDescriptor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.name)
    }
}

impl fmt::Debug for TypeDescriptor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut static_methods: Vec<&String> = self.static_methods.keys().collect();
        static_methods.sort();
        let mut methods: Vec<&String> = self.methods.keys().collect();
        methods.sort();

        f.debug_struct("TypeDescriptor")
            .field("name", &self.name)
            .field("kind", &self.kind)
            .field("superclass", &self.superclass.as_ref().map(|s| s.name()))
            .field(
                "interfaces",
                &self.interfaces.iter().map(|i| i.name()).collect::<Vec<_>>(),
            )
            .field("constructor", &self.constructor.is_some())
            .field("static_methods", &static_methods)
            .field("methods", &methods)
            .finish()
    }
}

/// 没有对应 Rust 类型的描述符使用的占位类型
pub enum Opaque {}

/// 类型描述符构建器
pub struct TypeBuilder<T> {
    descriptor: TypeDescriptor,
    _marker: PhantomData<fn() -> T>,
}

impl<T> TypeBuilder<T> {
    fn new(name: String, kind: TypeKind, rust_type: Option<TypeId>) -> Self {
        Self {
            descriptor: TypeDescriptor {
                name,
                kind,
                rust_type,
                superclass: None,
                interfaces: Vec::new(),
                constructor: None,
                static_methods: HashMap::new(),
                methods: HashMap::new(),
            },
            _marker: PhantomData,
        }
    }

    /// 覆盖描述符名称
    pub fn name(mut self, name: impl Into<String>) -> Self {
        self.descriptor.name = name.into();
        self
    }

    /// 设置父类
    pub fn extends(mut self, parent: &TypeHandle) -> Self {
        self.descriptor.superclass = Some(Arc::clone(parent));
        self
    }

    /// 添加实现的接口（接口描述符上表示继承的父接口）
    pub fn implements(mut self, iface: &TypeHandle) -> Self {
        if !self.descriptor.interfaces.iter().any(|i| i == iface) {
            self.descriptor.interfaces.push(Arc::clone(iface));
        }
        self
    }

    /// 注册静态方法，返回值由调用方包装成 [`BeanInstance`]
    pub fn static_method_raw<F>(mut self, name: impl Into<String>, returns: &TypeHandle, f: F) -> Self
    where
        F: Fn() -> anyhow::Result<BeanInstance> + Send + Sync + 'static,
    {
        let name = name.into();
        self.descriptor.static_methods.insert(
            name.clone(),
            StaticMethod {
                name,
                return_type: Arc::clone(returns),
                invoke: Arc::new(f),
            },
        );
        self
    }

    /// 注册静态方法，返回值的运行时类型为 `returns`
    pub fn static_method<R, F>(self, name: impl Into<String>, returns: &TypeHandle, f: F) -> Self
    where
        R: Any + Send + Sync,
        F: Fn() -> anyhow::Result<R> + Send + Sync + 'static,
    {
        let class = Arc::clone(returns);
        self.static_method_raw(name, returns, move || {
            f().map(|value| BeanInstance::new(Arc::clone(&class), value))
        })
    }

    /// 注册实例方法，接收者为未经转换的 [`BeanInstance`]
    ///
    /// 父类或接口上的方法需要作用于子类实例时使用此方法。
    pub fn method_raw<F>(mut self, name: impl Into<String>, returns: Option<&TypeHandle>, f: F) -> Self
    where
        F: Fn(&BeanInstance) -> anyhow::Result<Option<BeanInstance>> + Send + Sync + 'static,
    {
        let name = name.into();
        self.descriptor.methods.insert(
            name.clone(),
            Method {
                name,
                return_type: returns.cloned(),
                invoke: Arc::new(f),
            },
        );
        self
    }

    pub fn build(self) -> TypeHandle {
        Arc::new(self.descriptor)
    }
}

impl<T: Any + Send + Sync> TypeBuilder<T> {
    /// 注册无参构造函数
    pub fn constructor<F>(mut self, f: F) -> Self
    where
        F: Fn() -> anyhow::Result<T> + Send + Sync + 'static,
    {
        self.descriptor.constructor = Some(Arc::new(move || {
            f().map(|value| Arc::new(value) as Arc<dyn Any + Send + Sync>)
        }));
        self
    }

    /// 注册无返回值的实例方法（init / destroy 等）
    pub fn method<F>(self, name: impl Into<String>, f: F) -> Self
    where
        F: Fn(&T) -> anyhow::Result<()> + Send + Sync + 'static,
    {
        let name = name.into();
        let method_name = name.clone();
        self.method_raw(name, None, move |target| {
            let receiver = downcast_receiver::<T>(target, &method_name)?;
            f(receiver).map(|_| None)
        })
    }

    /// 注册返回新实例的实例方法（工厂 Bean 的工厂方法）
    pub fn factory_method<R, F>(self, name: impl Into<String>, returns: &TypeHandle, f: F) -> Self
    where
        R: Any + Send + Sync,
        F: Fn(&T) -> anyhow::Result<R> + Send + Sync + 'static,
    {
        let name = name.into();
        let method_name = name.clone();
        let class = Arc::clone(returns);
        self.method_raw(name, Some(returns), move |target| {
            let receiver = downcast_receiver::<T>(target, &method_name)?;
            let value = f(receiver)?;
            Ok(Some(BeanInstance::new(Arc::clone(&class), value)))
        })
    }
}

fn downcast_receiver<'a, T: Any + Send + Sync>(
    target: &'a BeanInstance,
    method: &str,
) -> anyhow::Result<&'a T> {
    target.downcast_ref::<T>().ok_or_else(|| {
        anyhow::anyhow!(
            "method '{}' expects a receiver of type '{}', got '{}'",
            method,
            std::any::type_name::<T>(),
            target.class().name()
        )
    })
}
