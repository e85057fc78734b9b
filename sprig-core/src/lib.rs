// sprig-core: 最小化的 Bean 定义注册表与实例解析引擎
//
// 提供：
// - Bean 定义的校验与注册
// - 三种构造方式：构造函数、静态工厂方法、工厂 Bean 的实例方法
// - 单例和原型作用域，单例并发安全的延迟创建
// - 按类型查找（支持 primary）
// - 生命周期管理（init/destroy 方法）

pub mod bean;
pub mod bean_factory;
pub mod config;
pub mod error;
pub mod lifecycle;
pub mod logging;
pub mod registry;
pub mod scope;
pub mod type_index;
pub mod types;
pub mod utils;

// 重新导出常用类型
pub use bean::{BeanDefinition, BeanInstance, Construction};
pub use bean_factory::{BeanFactory, BeanFactoryExt, DefaultBeanFactory, ListableBeanFactory};
pub use config::ContainerConfig;
pub use error::{ContainerError, ContainerResult};
pub use lifecycle::CloseSummary;
pub use logging::{LogFormat, LogLevel, LoggingConfig};
pub use registry::{BeanDefinitionRegistry, DefinitionRegistry};
pub use scope::{Scope, SCOPE_PROTOTYPE, SCOPE_SINGLETON};
pub use type_index::TypeIndex;
pub use types::{TypeDescriptor, TypeHandle, TypeKind};

// 钩子函数返回 anyhow::Result，重新导出方便使用
pub use anyhow;

/// Prelude 模块，包含常用的 traits 和类型
pub mod prelude {
    pub use crate::bean::{BeanDefinition, BeanInstance};
    pub use crate::bean_factory::{
        BeanFactory, BeanFactoryExt, DefaultBeanFactory, ListableBeanFactory,
    };
    pub use crate::config::ContainerConfig;
    pub use crate::error::{ContainerError, ContainerResult};
    pub use crate::lifecycle::CloseSummary;
    pub use crate::logging::{LogFormat, LogLevel, LoggingConfig};
    pub use crate::registry::BeanDefinitionRegistry;
    pub use crate::scope::Scope;
    pub use crate::types::{TypeDescriptor, TypeHandle};
}
