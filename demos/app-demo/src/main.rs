use std::path::Path;
use std::sync::atomic::{AtomicUsize, Ordering};

use sprig_core::prelude::*;

// ==================== 示例类型 ====================

/// 示例 Bean
#[derive(Debug)]
struct ABean {
    serial: usize,
}

impl ABean {
    fn do_something(&self) {
        println!("   ABean#{} doing something", self.serial);
    }
}

/// 同时提供静态工厂方法和实例工厂方法
struct ABeanFactory;

static SERIAL: AtomicUsize = AtomicUsize::new(0);

fn next_bean() -> anyhow::Result<ABean> {
    Ok(ABean {
        serial: SERIAL.fetch_add(1, Ordering::SeqCst),
    })
}

fn describe_types() -> (TypeHandle, TypeHandle) {
    let a_bean = TypeDescriptor::builder::<ABean>()
        .name("ABean")
        .constructor(next_bean)
        .method("init", |bean| {
            tracing::info!("ABean#{} initialized", bean.serial);
            Ok(())
        })
        .method("destroy", |bean| {
            tracing::info!("ABean#{} destroyed", bean.serial);
            Ok(())
        })
        .build();

    let factory = TypeDescriptor::builder::<ABeanFactory>()
        .name("ABeanFactory")
        .constructor(|| Ok(ABeanFactory))
        .static_method("getABean", &a_bean, next_bean)
        .factory_method("getABean2", &a_bean, |_: &ABeanFactory| next_bean())
        .build();

    (a_bean, factory)
}

// ==================== 主程序 ====================

fn main() -> anyhow::Result<()> {
    println!("\n╔════════════════════════════════════════════════════╗");
    println!("║     Sprig Bean Factory - Demo                      ║");
    println!("╚════════════════════════════════════════════════════╝\n");

    // 查找配置文件
    let config_paths = ["demos/app-demo/sprig.toml", "sprig.toml"];
    let config = match config_paths.iter().find(|path| Path::new(path).exists()) {
        Some(path) => ContainerConfig::from_file(path)?,
        None => ContainerConfig::default(),
    }
    .with_env_overrides()?;

    config.logging.init()?;

    let factory = DefaultBeanFactory::with_config(config);
    let (a_bean, a_bean_factory) = describe_types();

    // 通过构造器创建
    factory.register_bean_definition(
        "aBean",
        BeanDefinition::new()
            .with_bean_class(&a_bean)
            .with_init_method("init")
            .with_destroy_method("destroy"),
    )?;

    // 通过工厂 Bean 创建，工厂本身使用生成的名称 aBeanFactory
    let factory_name =
        factory.register_with_generated_name(BeanDefinition::new().with_bean_class(&a_bean_factory))?;
    tracing::info!("Registered factory bean under generated name '{}'", factory_name);
    factory.register_bean_definition(
        "factoryABean",
        BeanDefinition::new()
            .with_factory_bean(factory_name.as_str())
            .with_factory_method("getABean2")
            .with_scope(Scope::Prototype)
            .with_primary(true),
    )?;

    // 通过静态工厂方法创建
    factory.register_bean_definition(
        "staticABean",
        BeanDefinition::new()
            .with_bean_class(&a_bean_factory)
            .with_factory_method("getABean"),
    )?;

    factory.refresh()?;

    println!("📦 Registered beans: {:?}\n", factory.get_bean_names());

    println!("🔨 Constructor (singleton):");
    for _ in 0..3 {
        factory.get_bean_as::<ABean>("aBean")?.do_something();
    }

    println!("\n🏭 Factory bean (prototype):");
    for _ in 0..3 {
        factory.get_bean_as::<ABean>("factoryABean")?.do_something();
    }

    println!("\n⚙️  Static factory method:");
    for _ in 0..3 {
        factory.get_bean_as::<ABean>("staticABean")?.do_something();
    }
    println!("   getType(staticABean) = {}", factory.get_type("staticABean")?);

    println!("\n🔍 Beans of type ABean:");
    let mut beans: Vec<(String, BeanInstance)> = factory.get_beans_of_type(&a_bean)?.into_iter().collect();
    beans.sort_by(|a, b| a.0.cmp(&b.0));
    for (name, bean) in &beans {
        println!("   {} == {:?}", name, bean);
    }

    println!("\n🎯 Bean by type ABean (primary):");
    if let Some(bean) = factory.get_bean_by_type_as::<ABean>(&a_bean)? {
        bean.do_something();
    }

    let summary = factory.close();
    println!("\n╔════════════════════════════════════════════════════╗");
    println!("║              Factory Closed                        ║");
    println!("╚════════════════════════════════════════════════════╝");
    println!("   destroyed: {:?}", summary.destroyed);
    for failure in &summary.failures {
        println!("   failed: {}", failure);
    }

    Ok(())
}
