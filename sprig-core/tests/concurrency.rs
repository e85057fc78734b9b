//! 单例在并发首次访问下只创建一次

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Barrier};
use std::thread;

use sprig_core::prelude::*;

const THREADS: usize = 16;

struct Connection;

struct ConnectionPool;

#[test]
fn concurrent_first_access_creates_singleton_once() {
    let constructed = Arc::new(AtomicUsize::new(0));
    let initialized = Arc::new(AtomicUsize::new(0));

    let counter = Arc::clone(&constructed);
    let init_counter = Arc::clone(&initialized);
    let class = TypeDescriptor::builder::<Connection>()
        .name("Connection")
        .constructor(move || {
            counter.fetch_add(1, Ordering::SeqCst);
            // 拉长构造时间，让其他线程在创建期间到达
            thread::sleep(std::time::Duration::from_millis(20));
            Ok(Connection)
        })
        .method("init", move |_| {
            init_counter.fetch_add(1, Ordering::SeqCst);
            Ok(())
        })
        .build();

    let factory = Arc::new(DefaultBeanFactory::new());
    factory
        .register_bean_definition(
            "connection",
            BeanDefinition::new().with_bean_class(&class).with_init_method("init"),
        )
        .unwrap();

    let barrier = Arc::new(Barrier::new(THREADS));
    let handles: Vec<_> = (0..THREADS)
        .map(|_| {
            let factory = Arc::clone(&factory);
            let barrier = Arc::clone(&barrier);
            thread::spawn(move || {
                barrier.wait();
                factory.get_bean("connection").unwrap()
            })
        })
        .collect();

    let beans: Vec<BeanInstance> = handles.into_iter().map(|h| h.join().unwrap()).collect();

    assert_eq!(constructed.load(Ordering::SeqCst), 1);
    assert_eq!(initialized.load(Ordering::SeqCst), 1);
    assert!(beans.iter().all(|bean| bean.ptr_eq(&beans[0])));
}

#[test]
fn concurrent_factory_bean_products_share_one_factory() {
    let factories = Arc::new(AtomicUsize::new(0));
    let counter = Arc::clone(&factories);

    let connection = TypeDescriptor::builder::<Connection>().name("Connection").build();
    let pool = TypeDescriptor::builder::<ConnectionPool>()
        .name("ConnectionPool")
        .constructor(move || {
            counter.fetch_add(1, Ordering::SeqCst);
            Ok(ConnectionPool)
        })
        .factory_method("acquire", &connection, |_: &ConnectionPool| Ok(Connection))
        .build();

    let factory = Arc::new(DefaultBeanFactory::new());
    factory
        .register_bean_definition("pool", BeanDefinition::new().with_bean_class(&pool))
        .unwrap();
    factory
        .register_bean_definition(
            "connection",
            BeanDefinition::new()
                .with_factory_bean("pool")
                .with_factory_method("acquire")
                .with_scope(Scope::Prototype),
        )
        .unwrap();

    let barrier = Arc::new(Barrier::new(THREADS));
    let handles: Vec<_> = (0..THREADS)
        .map(|_| {
            let factory = Arc::clone(&factory);
            let barrier = Arc::clone(&barrier);
            thread::spawn(move || {
                barrier.wait();
                factory.get_bean_as::<Connection>("connection").unwrap()
            })
        })
        .collect();

    let connections: Vec<Arc<Connection>> = handles.into_iter().map(|h| h.join().unwrap()).collect();

    assert_eq!(connections.len(), THREADS);
    assert!(!Arc::ptr_eq(&connections[0], &connections[1]));
    assert_eq!(factories.load(Ordering::SeqCst), 1);
    assert_eq!(factory.singleton_count(), 1);
}

#[test]
fn close_while_resolving_never_leaves_singletons_behind() {
    let class = TypeDescriptor::builder::<Connection>()
        .name("Connection")
        .constructor(|| Ok(Connection))
        .build();

    let factory = Arc::new(DefaultBeanFactory::new());
    for i in 0..THREADS {
        factory
            .register_bean_definition(&format!("connection{}", i), BeanDefinition::new().with_bean_class(&class))
            .unwrap();
    }

    let barrier = Arc::new(Barrier::new(THREADS + 1));
    let handles: Vec<_> = (0..THREADS)
        .map(|i| {
            let factory = Arc::clone(&factory);
            let barrier = Arc::clone(&barrier);
            thread::spawn(move || {
                barrier.wait();
                match factory.get_bean(&format!("connection{}", i)) {
                    Ok(_) | Err(ContainerError::Closed(_)) => {}
                    Err(other) => panic!("unexpected error: {}", other),
                }
            })
        })
        .collect();

    barrier.wait();
    factory.close();
    for handle in handles {
        handle.join().unwrap();
    }

    assert!(factory.is_closed());
    assert_eq!(factory.singleton_count(), 0);
}
