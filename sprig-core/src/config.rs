//! 容器配置
//!
//! 从 TOML 文档加载，环境变量可以覆盖其中的值：
//!
//! ```toml
//! initial_capacity = 64
//! preinstantiate_singletons = true
//!
//! [logging]
//! level = "debug"
//! format = "json"
//! ```

use std::fs;
use std::path::Path;

use serde::Deserialize;

use crate::error::{ContainerError, ContainerResult};
use crate::logging::LoggingConfig;

/// 默认的定义表 / 单例缓存初始容量
pub const DEFAULT_INITIAL_CAPACITY: usize = 256;

pub const ENV_INITIAL_CAPACITY: &str = "SPRIG_INITIAL_CAPACITY";
pub const ENV_PREINSTANTIATE: &str = "SPRIG_PREINSTANTIATE";

/// Bean 工厂配置
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ContainerConfig {
    /// 定义表和单例缓存的初始容量
    pub initial_capacity: usize,

    /// `refresh()` 时是否提前创建所有单例
    pub preinstantiate_singletons: bool,

    pub logging: LoggingConfig,
}

impl Default for ContainerConfig {
    fn default() -> Self {
        Self {
            initial_capacity: DEFAULT_INITIAL_CAPACITY,
            preinstantiate_singletons: false,
            logging: LoggingConfig::default(),
        }
    }
}

impl ContainerConfig {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn initial_capacity(mut self, capacity: usize) -> Self {
        self.initial_capacity = capacity;
        self
    }

    pub fn preinstantiate_singletons(mut self, enabled: bool) -> Self {
        self.preinstantiate_singletons = enabled;
        self
    }

    pub fn logging(mut self, logging: LoggingConfig) -> Self {
        self.logging = logging;
        self
    }

    /// 解析 TOML 文本，缺省的键使用默认值，未知的键报错
    pub fn from_toml_str(content: &str) -> ContainerResult<Self> {
        toml::from_str(content)
            .map_err(|e| ContainerError::Config(format!("invalid container config: {}", e)))
    }

    /// 读取并解析 TOML 配置文件
    pub fn from_file<P: AsRef<Path>>(path: P) -> ContainerResult<Self> {
        let path = path.as_ref();
        let content = fs::read_to_string(path).map_err(|e| {
            ContainerError::Config(format!("failed to read {}: {}", path.display(), e))
        })?;
        tracing::debug!("Loading container config from {}", path.display());
        Self::from_toml_str(&content)
    }

    /// 用环境变量覆盖配置
    ///
    /// `SPRIG_INITIAL_CAPACITY`、`SPRIG_PREINSTANTIATE` 以及日志相关的
    /// `RUST_LOG`、`LOG_LEVEL`、`LOG_FORMAT`。
    pub fn with_env_overrides(mut self) -> ContainerResult<Self> {
        if let Ok(value) = std::env::var(ENV_INITIAL_CAPACITY) {
            self.initial_capacity = value.trim().parse().map_err(|_| {
                ContainerError::Config(format!("{} must be an integer, got '{}'", ENV_INITIAL_CAPACITY, value))
            })?;
        }
        if let Ok(value) = std::env::var(ENV_PREINSTANTIATE) {
            self.preinstantiate_singletons = parse_bool(&value).ok_or_else(|| {
                ContainerError::Config(format!("{} must be a boolean, got '{}'", ENV_PREINSTANTIATE, value))
            })?;
        }
        self.logging = self.logging.with_env_overrides();
        Ok(self)
    }
}

fn parse_bool(value: &str) -> Option<bool> {
    match value.trim().to_lowercase().as_str() {
        "true" | "yes" | "1" | "on" => Some(true),
        "false" | "no" | "0" | "off" => Some(false),
        _ => None,
    }
}
