use std::fmt;
use std::str::FromStr;

/// 单例作用域名称
pub const SCOPE_SINGLETON: &str = "singleton";

/// 原型作用域名称
pub const SCOPE_PROTOTYPE: &str = "prototype";

/// Bean 的作用域
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum Scope {
    /// 单例模式 - 容器中只有一个实例
    #[default]
    Singleton,

    /// 原型模式 - 每次请求都创建新实例
    Prototype,
}

impl Scope {
    pub fn as_str(&self) -> &'static str {
        match self {
            Scope::Singleton => SCOPE_SINGLETON,
            Scope::Prototype => SCOPE_PROTOTYPE,
        }
    }
}

impl FromStr for Scope {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            SCOPE_SINGLETON => Ok(Scope::Singleton),
            SCOPE_PROTOTYPE => Ok(Scope::Prototype),
            _ => Err(format!("Invalid scope: {}", s)),
        }
    }
}

impl fmt::Display for Scope {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
