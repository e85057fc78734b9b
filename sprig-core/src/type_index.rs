//! 类型索引 - 类型到可赋值 Bean 名称集合的映射
//!
//! 索引是注册表的派生投影：由 [`TypeIndex::insert`] 对每个 Bean 的声明类型、
//! 它的父类链以及其中实现的全部接口逐一登记。索引不会增量更新，
//! 注册新定义后需要重新构建。

use std::collections::{BTreeSet, HashMap};
use std::sync::Arc;

use crate::types::{TypeDescriptor, TypeHandle};

#[derive(Debug, Default, Clone)]
pub struct TypeIndex {
    entries: HashMap<TypeHandle, BTreeSet<String>>,
}

impl TypeIndex {
    pub fn new() -> Self {
        Self::default()
    }

    /// 登记 `name`：声明类型本身、所有父类（不含根类型）、所有接口
    pub fn insert(&mut self, name: &str, declared_type: &TypeHandle) {
        self.insert_exact(name, declared_type);
        for ty in declared_type.assignable_types() {
            self.insert_exact(name, &ty);
        }
    }

    fn insert_exact(&mut self, name: &str, ty: &TypeHandle) {
        self.entries
            .entry(Arc::clone(ty))
            .or_default()
            .insert(name.to_string());
    }

    /// 可以赋值给 `ty` 的 Bean 名称，按名称排序
    pub fn names_for(&self, ty: &TypeDescriptor) -> Option<&BTreeSet<String>> {
        self.entries.get(ty)
    }

    /// 被索引的类型数量
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}
