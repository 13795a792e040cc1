//! 并发解析与快照替换

mod common;

use common::{charge, deployment, payment, qualifier, recording_elements, settings, Journal, RecordingTarget};
use di_abstractions::{instance, BeanContainer, BeanResolver};
use di_impl::Container;
use infrastructure_common::{BeanId, ContainerSettings};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::thread;

const READERS: usize = 8;
const ROUNDS: usize = 200;

/// 奇数代启用 Audit，偶数代禁用
fn settings_for(generation: u64) -> ContainerSettings {
    if generation % 2 == 0 {
        settings().with_disabled("AuditInterceptor")
    } else {
        settings()
    }
}

/// 多线程并发解析得到同一个 Bean 实例
#[test]
fn test_concurrent_resolution_is_consistent() {
    let container = Container::new(deployment(), settings()).unwrap();
    let expected = container.resolve(&payment(), &[]).unwrap();
    let fast = qualifier("Fast");

    thread::scope(|scope| {
        for _ in 0..READERS {
            scope.spawn(|| {
                for _ in 0..ROUNDS {
                    let bean = container.resolve(&payment(), &[]).unwrap();
                    assert!(Arc::ptr_eq(&bean, &expected));
                    let bean = container.resolve(&payment(), &[fast.clone()]).unwrap();
                    assert_eq!(bean.id.as_str(), "PaymentServiceFast");
                }
            });
        }
    });

    let stats = container.stats();
    assert_eq!(stats.generation, 1);
    assert_eq!(
        stats.resolution_cache_hits + stats.resolution_cache_misses,
        (READERS * ROUNDS * 2 + 1) as u64
    );
}

/// 读者在重新配置期间总是看到一个完整的快照
#[test]
fn test_readers_observe_whole_snapshots_during_reconfigure() {
    let container = Container::new(deployment(), settings()).unwrap();
    let id = BeanId::new("PaymentService");
    let done = AtomicBool::new(false);

    thread::scope(|scope| {
        for _ in 0..READERS {
            scope.spawn(|| {
                while !done.load(Ordering::Acquire) {
                    let snapshot = container.snapshot();
                    let chain = snapshot
                        .plan(&id)
                        .unwrap()
                        .method_chain(&charge())
                        .cloned()
                        .unwrap();
                    let expected = if snapshot.generation() % 2 == 0 { 1 } else { 2 };
                    assert_eq!(chain.interceptors.len(), expected);
                    assert_eq!(snapshot.settings(), &settings_for(snapshot.generation()));
                }
            });
        }

        for round in 0..ROUNDS as u64 {
            let generation = container.reconfigure(settings_for(round + 2)).unwrap();
            assert_eq!(generation, round + 2);
        }
        done.store(true, Ordering::Release);
    });

    assert_eq!(container.stats().generation, ROUNDS as u64 + 1);
}

/// 已创建的调用处理器继续使用创建时的计划
#[test]
fn test_handler_keeps_its_plan_after_reconfigure() {
    let container = Container::new(deployment(), settings()).unwrap();
    let journal = Journal::default();
    let handler = container
        .invocation_handler(
            &BeanId::new("PaymentService"),
            RecordingTarget::new(&journal),
            Arc::new(recording_elements(&journal)),
        )
        .unwrap();

    container
        .reconfigure(settings().with_disabled("AuditInterceptor"))
        .unwrap();
    handler.invoke(&charge(), vec![instance(1_i64)]).unwrap();

    assert!(journal.entries().contains(&"AuditInterceptor >".to_string()));
    assert_eq!(
        container
            .interception_plan(&BeanId::new("PaymentService"))
            .unwrap()
            .method_chain(&charge())
            .unwrap()
            .interceptors,
        vec!["TxInterceptor"]
    );
}

/// 失败的重新配置不替换当前快照
#[test]
fn test_failed_reconfigure_keeps_current_snapshot() {
    let container = Container::new(deployment(), settings()).unwrap();
    let before = container.snapshot();

    assert!(container
        .reconfigure(settings().with_interceptor("MissingInterceptor"))
        .is_err());

    let after = container.snapshot();
    assert!(Arc::ptr_eq(&before, &after));
    assert_eq!(after.generation(), 1);
}
