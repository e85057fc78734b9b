//! 容器关闭时的单例销毁
//!
//! 逐个调用缓存中单例的 destroy 方法（@PreDestroy），某个 Bean 销毁失败时
//! 只记录日志，不会中断其余 Bean 的销毁。原型 Bean 不被容器跟踪，不会销毁。

use std::any::Any;
use std::collections::HashMap;
use std::sync::Arc;

use crate::bean::{BeanDefinition, BeanInstance};
use crate::error::{display_chain, ContainerError, ContainerResult};

/// 一次关闭的结果
#[derive(Debug, Default)]
pub struct CloseSummary {
    /// destroy 方法执行成功的 Bean
    pub destroyed: Vec<String>,

    /// destroy 方法执行失败的 Bean 及原因
    pub failures: Vec<ContainerError>,
}

impl CloseSummary {
    /// 所有 destroy 方法都执行成功
    pub fn is_clean(&self) -> bool {
        self.failures.is_empty()
    }

    pub fn failed_names(&self) -> Vec<&str> {
        self.failures
            .iter()
            .filter_map(|e| match e {
                ContainerError::DestructionFailed { name, .. } => Some(name.as_str()),
                _ => None,
            })
            .collect()
    }
}

/// 按定义顺序销毁单例
pub(crate) fn destroy_singletons(
    definitions: &[(String, Arc<BeanDefinition>)],
    singletons: &HashMap<String, BeanInstance>,
) -> CloseSummary {
    tracing::info!("Destroying singleton beans");
    let mut summary = CloseSummary::default();

    for (name, definition) in definitions {
        if !definition.is_singleton() {
            continue;
        }
        let Some(method) = definition.destroy_method_name() else {
            continue;
        };
        let Some(instance) = singletons.get(name) else {
            tracing::debug!("Singleton bean '{}' was never created, nothing to destroy", name);
            continue;
        };

        match destroy_bean(name, method, instance) {
            Ok(()) => {
                tracing::debug!("Bean '{}' destroyed successfully", name);
                summary.destroyed.push(name.clone());
            }
            Err(err) => {
                tracing::error!("Error destroying bean '{}' {}: {}", name, definition, display_chain(&err));
                summary.failures.push(err);
            }
        }
    }

    tracing::info!(
        "Singleton beans destruction completed: {} destroyed, {} failed",
        summary.destroyed.len(),
        summary.failures.len()
    );
    summary
}

fn destroy_bean(name: &str, method: &str, instance: &BeanInstance) -> ContainerResult<()> {
    let failure = |source: anyhow::Error| ContainerError::DestructionFailed {
        name: name.to_string(),
        method: method.to_string(),
        source,
    };

    let destroy = instance.class().find_method(method).ok_or_else(|| {
        failure(anyhow::anyhow!(
            "no method named '{}' on '{}'",
            method,
            instance.class().name()
        ))
    })?;

    // destroy 方法 panic 时同样只算作这个 Bean 的失败
    match std::panic::catch_unwind(std::panic::AssertUnwindSafe(|| destroy.invoke(instance))) {
        Ok(result) => result.map(|_| ()).map_err(failure),
        Err(payload) => Err(failure(anyhow::anyhow!(
            "destroy method panicked: {}",
            panic_message(payload.as_ref())
        ))),
    }
}

fn panic_message(payload: &(dyn Any + Send)) -> &str {
    if let Some(message) = payload.downcast_ref::<&'static str>() {
        *message
    } else if let Some(message) = payload.downcast_ref::<String>() {
        message.as_str()
    } else {
        "unknown panic payload"
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::TypeDescriptor;
    use parking_lot::Mutex;

    struct Resource;

    #[test]
    fn test_panicking_destroy_does_not_stop_the_pass() {
        let destroyed = Arc::new(Mutex::new(Vec::new()));
        let log = Arc::clone(&destroyed);

        let exploding = TypeDescriptor::builder::<Resource>()
            .name("Exploding")
            .method("destroy", |_| panic!("boom"))
            .build();
        let orderly = TypeDescriptor::builder::<Resource>()
            .name("Orderly")
            .method("destroy", move |_| {
                log.lock().push("b".to_string());
                Ok(())
            })
            .build();

        let definitions = vec![
            (
                "a".to_string(),
                Arc::new(BeanDefinition::new().with_bean_class(&exploding).with_destroy_method("destroy")),
            ),
            (
                "b".to_string(),
                Arc::new(BeanDefinition::new().with_bean_class(&orderly).with_destroy_method("destroy")),
            ),
        ];
        let mut singletons = HashMap::new();
        singletons.insert("a".to_string(), BeanInstance::new(exploding, Resource));
        singletons.insert("b".to_string(), BeanInstance::new(orderly, Resource));

        let summary = destroy_singletons(&definitions, &singletons);

        assert_eq!(summary.destroyed, vec!["b"]);
        assert_eq!(summary.failed_names(), vec!["a"]);
        assert_eq!(*destroyed.lock(), vec!["b"]);
        assert!(display_chain(&summary.failures[0]).contains("boom"));
    }

    #[test]
    fn test_panic_message() {
        let payload: Box<dyn Any + Send> = Box::new("static message");
        assert_eq!(panic_message(payload.as_ref()), "static message");

        let payload: Box<dyn Any + Send> = Box::new(format!("formatted {}", 42));
        assert_eq!(panic_message(payload.as_ref()), "formatted 42");

        let payload: Box<dyn Any + Send> = Box::new(7_u8);
        assert_eq!(panic_message(payload.as_ref()), "unknown panic payload");
    }
}
