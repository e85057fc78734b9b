//! 容器统一错误类型
//!
//! 容器自身的错误使用 `ContainerError`（thiserror），
//! 用户提供的构造函数、工厂方法、init/destroy 方法返回 `anyhow::Result`，
//! 其错误作为 `source` 保存在对应的变体中。

use thiserror::Error;

/// 容器错误
#[derive(Debug, Error)]
pub enum ContainerError {
    /// Bean 定义不合法（注册时校验）
    #[error("Invalid bean definition for '{name}': {definition}")]
    InvalidDefinition { name: String, definition: String },

    /// Bean 名称已被注册
    #[error("Bean '{name}' is already registered: {existing}")]
    DuplicateName { name: String, existing: String },

    /// 找不到 Bean 定义
    #[error("No bean named '{0}' is defined")]
    BeanNotFound(String),

    /// 无法推断 Bean 的声明类型
    #[error("Cannot resolve type of bean '{name}': method '{method}' is not declared on '{type_name}'")]
    TypeResolution {
        name: String,
        type_name: String,
        method: String,
    },

    /// 构造策略执行失败（构造函数 / 静态工厂 / 工厂 Bean）
    #[error("Failed to instantiate bean '{name}' via {strategy}")]
    InstantiationFailed {
        name: String,
        strategy: String,
        #[source]
        source: anyhow::Error,
    },

    /// init 方法执行失败
    #[error("Init method '{method}' of bean '{name}' failed")]
    InitializationFailed {
        name: String,
        method: String,
        #[source]
        source: anyhow::Error,
    },

    /// 同一类型存在多个候选 Bean，但没有 primary
    #[error("Multiple beans of type '{type_name}' found [{}] but none is marked primary", .candidates.join(", "))]
    AmbiguousBean {
        type_name: String,
        candidates: Vec<String>,
    },

    /// 同一类型存在多个 primary Bean
    #[error("Multiple primary beans of type '{type_name}' found [{}]", .primaries.join(", "))]
    AmbiguousPrimary {
        type_name: String,
        primaries: Vec<String>,
    },

    /// destroy 方法执行失败（关闭时只记录，不中断）
    #[error("Destroy method '{method}' of bean '{name}' failed")]
    DestructionFailed {
        name: String,
        method: String,
        #[source]
        source: anyhow::Error,
    },

    /// 工厂 Bean 引用链形成环
    #[error("Circular factory bean reference: {}", .chain.join(" -> "))]
    CircularReference { chain: Vec<String> },

    /// 类型转换失败
    #[error("Bean '{name}' is of type '{found}', expected '{expected}'")]
    TypeMismatch {
        name: String,
        expected: String,
        found: String,
    },

    /// 容器已关闭
    #[error("Bean factory is closed, cannot resolve '{0}'")]
    Closed(String),

    /// 配置加载或日志初始化失败
    #[error("Configuration error: {0}")]
    Config(String),
}

/// 把错误及其 source 链拼成一行，用于日志
pub(crate) fn display_chain(err: &(dyn std::error::Error + 'static)) -> String {
    let mut message = err.to_string();
    let mut source = err.source();
    while let Some(cause) = source {
        message.push_str(": ");
        message.push_str(&cause.to_string());
        source = cause.source();
    }
    message
}

/// 容器操作结果
pub type ContainerResult<T> = std::result::Result<T, ContainerError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_ambiguity_messages_list_every_candidate() {
        let err = ContainerError::AmbiguousBean {
            type_name: "Greeter".to_string(),
            candidates: vec!["english".to_string(), "french".to_string(), "german".to_string()],
        };
        let msg = err.to_string();
        assert!(msg.contains("english, french, german"));

        let err = ContainerError::AmbiguousPrimary {
            type_name: "Greeter".to_string(),
            primaries: vec!["english".to_string(), "french".to_string()],
        };
        assert!(err.to_string().contains("[english, french]"));
    }

    #[test]
    fn test_hook_error_is_kept_as_source() {
        use std::error::Error as _;

        let err = ContainerError::InitializationFailed {
            name: "aBean".to_string(),
            method: "init".to_string(),
            source: anyhow::anyhow!("disk full"),
        };
        let source = err.source().map(|s| s.to_string());
        assert_eq!(source.as_deref(), Some("disk full"));
        assert_eq!(display_chain(&err), "Init method 'init' of bean 'aBean' failed: disk full");
    }
}
