//! Bean 定义注册表
//!
//! 注册是唯一的准入关口：定义在这里校验合法性、拒绝重名，
//! 注册成功后在容器生命周期内不可修改、不可移除。

use std::collections::HashMap;
use std::sync::Arc;

use parking_lot::RwLock;

use crate::bean::BeanDefinition;
use crate::error::{ContainerError, ContainerResult};
use crate::utils::naming;

/// 用于把 Bean 定义注册到 Bean 工厂
pub trait BeanDefinitionRegistry: Send + Sync {
    /// 注册 Bean 定义
    fn register_bean_definition(&self, name: &str, definition: BeanDefinition) -> ContainerResult<()>;

    /// 获取 Bean 定义
    fn get_bean_definition(&self, name: &str) -> Option<Arc<BeanDefinition>>;

    /// 是否包含指定名称的 Bean 定义
    fn contains_bean_definition(&self, name: &str) -> bool;

    /// 按类型短名称生成 Bean 名称并注册，返回生成的名称
    ///
    /// `ABean` 生成 `aBean`；没有 `bean_class` 的定义无法生成名称。
    fn register_with_generated_name(&self, definition: BeanDefinition) -> ContainerResult<String> {
        let name = naming::generate_bean_name(&definition).ok_or_else(|| {
            ContainerError::InvalidDefinition {
                name: String::new(),
                definition: format!("cannot generate a bean name for {}", definition),
            }
        })?;
        self.register_bean_definition(&name, definition)?;
        Ok(name)
    }
}

/// 线程安全的定义存储
#[derive(Debug)]
pub struct DefinitionRegistry {
    definitions: RwLock<HashMap<String, Arc<BeanDefinition>>>,
}

impl DefinitionRegistry {
    pub fn new() -> Self {
        Self::with_capacity(0)
    }

    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            definitions: RwLock::new(HashMap::with_capacity(capacity)),
        }
    }

    /// 校验并注册
    pub fn register(&self, name: &str, definition: BeanDefinition) -> ContainerResult<()> {
        if name.trim().is_empty() {
            tracing::warn!("Rejected bean definition without a name: {}", definition);
            return Err(ContainerError::InvalidDefinition {
                name: name.to_string(),
                definition: format!("bean name must not be blank, {}", definition),
            });
        }

        if !definition.validate() {
            tracing::warn!("Bean definition '{}' is invalid: {}", name, definition);
            return Err(ContainerError::InvalidDefinition {
                name: name.to_string(),
                definition: definition.to_string(),
            });
        }

        let mut definitions = self.definitions.write();
        if let Some(existing) = definitions.get(name) {
            tracing::warn!("Bean '{}' already exists, registration failed", name);
            return Err(ContainerError::DuplicateName {
                name: name.to_string(),
                existing: existing.to_string(),
            });
        }

        tracing::debug!("Bean definition registered: '{}' {}", name, definition);
        definitions.insert(name.to_string(), Arc::new(definition));
        Ok(())
    }

    pub fn get(&self, name: &str) -> Option<Arc<BeanDefinition>> {
        self.definitions.read().get(name).cloned()
    }

    pub fn contains(&self, name: &str) -> bool {
        self.definitions.read().contains_key(name)
    }

    /// 所有已注册的名称（排序后）
    pub fn names(&self) -> Vec<String> {
        let mut names: Vec<String> = self.definitions.read().keys().cloned().collect();
        names.sort();
        names
    }

    /// 所有定义的快照，按名称排序
    pub fn snapshot(&self) -> Vec<(String, Arc<BeanDefinition>)> {
        let mut entries: Vec<(String, Arc<BeanDefinition>)> = self
            .definitions
            .read()
            .iter()
            .map(|(name, bd)| (name.clone(), Arc::clone(bd)))
            .collect();
        entries.sort_by(|a, b| a.0.cmp(&b.0));
        entries
    }

    pub fn len(&self) -> usize {
        self.definitions.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.definitions.read().is_empty()
    }
}

impl Default for DefinitionRegistry {
    fn default() -> Self {
        Self::new()
    }
}

impl BeanDefinitionRegistry for DefinitionRegistry {
    fn register_bean_definition(&self, name: &str, definition: BeanDefinition) -> ContainerResult<()> {
        self.register(name, definition)
    }

    fn get_bean_definition(&self, name: &str) -> Option<Arc<BeanDefinition>> {
        self.get(name)
    }

    fn contains_bean_definition(&self, name: &str) -> bool {
        self.contains(name)
    }
}
