//! 解析引擎集成测试：唯一解析、限定符、特化与备选实现

mod common;

use common::{catalog, deployment, payment, qualifier, settings};
use di_abstractions::{BeanContainer, BeanLookup, BeanResolver};
use di_impl::{qualifiers_match, Container};
use infrastructure_common::{
    BeanDeclaration, ConfigurationError, ContainerError, ContainerSettings, ContractType,
    Deployment, MarkerCategory, MarkerLiteral, ResolutionError,
};
use std::collections::BTreeSet;
use std::sync::Arc;

fn container(deployment: Deployment, settings: ContainerSettings) -> Container {
    Container::new(deployment, settings).unwrap()
}

fn resolved_id(container: &Container, qualifiers: &[&str]) -> String {
    let qualifiers: Vec<_> = qualifiers.iter().map(|kind| qualifier(kind)).collect();
    container
        .resolve(&payment(), &qualifiers)
        .unwrap()
        .id
        .to_string()
}

/// 端到端支付示例
#[test]
fn test_payment_example_end_to_end() {
    let container = container(deployment(), settings());

    assert_eq!(resolved_id(&container, &[]), "PaymentService");
    assert_eq!(resolved_id(&container, &["Fast"]), "PaymentServiceFast");

    let error = container
        .resolve(&payment(), &[qualifier("Fast"), qualifier("Slow")])
        .unwrap_err();
    assert!(error.is_unsatisfied());
    let message = error.to_string();
    assert!(message.contains("Payment"));
    assert!(message.contains("PaymentServiceFast"));
}

/// 同一快照上重复解析得到同一个 Bean，缓存命中被统计
#[test]
fn test_resolution_is_deterministic_and_cached() {
    let container = container(deployment(), settings());

    let first = container.resolve(&payment(), &[]).unwrap();
    for _ in 0..10 {
        let again = container.resolve(&payment(), &[]).unwrap();
        assert!(Arc::ptr_eq(&first, &again));
    }
    let stats = container.stats();
    assert_eq!(stats.resolution_cache_misses, 1);
    assert_eq!(stats.resolution_cache_hits, 10);

    let uncached = Container::new(deployment(), settings().with_resolution_cache(false)).unwrap();
    let a = uncached.resolve(&payment(), &[]).unwrap();
    let b = uncached.resolve(&payment(), &[]).unwrap();
    assert_eq!(a.id, b.id);
    assert_eq!(uncached.stats().resolution_cache_hits, 0);
}

/// nonbinding 成员不参与限定符相等性
#[test]
fn test_nonbinding_members_are_ignored() {
    let deployment = deployment().with_bean(
        BeanDeclaration::new("EuroPaymentService")
            .exposes(payment())
            .qualified(MarkerLiteral::new("Currency").with("code", "EUR").with("note", "声明")),
    );
    let catalog = catalog(&deployment);
    let requested = catalog
        .resolve(
            &MarkerLiteral::new("Currency").with("code", "EUR").with("note", "请求"),
            MarkerCategory::Qualifier,
        )
        .unwrap();
    let offered = catalog
        .resolve(
            &MarkerLiteral::new("Currency").with("code", "EUR").with("note", "声明"),
            MarkerCategory::Qualifier,
        )
        .unwrap();
    let other_code = catalog
        .resolve(
            &MarkerLiteral::new("Currency").with("code", "USD"),
            MarkerCategory::Qualifier,
        )
        .unwrap();

    assert_eq!(requested, offered);
    assert!(qualifiers_match(
        &[requested.clone()],
        &BTreeSet::from([offered])
    ));

    let container = container(deployment, settings());
    assert_eq!(
        container.resolve(&payment(), &[requested]).unwrap().id.as_str(),
        "EuroPaymentService"
    );
    assert!(container
        .resolve(&payment(), &[other_code])
        .unwrap_err()
        .is_unsatisfied());
}

/// 相同 (类型, 限定符) 的两个 Bean 产生歧义
#[test]
fn test_identical_footprints_are_ambiguous() {
    let deployment = Deployment::new()
        .with_bean(BeanDeclaration::new("CardPayment").exposes(payment()))
        .with_bean(BeanDeclaration::new("WalletPayment").exposes(payment()));
    let container = container(deployment.clone(), ContainerSettings::default());

    let error = container.resolve(&payment(), &[]).unwrap_err();
    assert!(error.is_ambiguous());
    match error {
        ResolutionError::Ambiguous { candidates, .. } => assert_eq!(candidates.len(), 2),
        other => panic!("期望歧义错误, 实际 {:?}", other),
    }

    // 严格模式在构建期拒绝
    assert!(Container::new(
        deployment,
        ContainerSettings::default().with_strict_footprints(true)
    )
    .is_err());
}

#[test]
fn test_unknown_type_is_unsatisfied() {
    let container = container(deployment(), settings());

    let error = container
        .resolve(&ContractType::raw("Shipping"), &[])
        .unwrap_err();

    assert!(matches!(error, ResolutionError::Unsatisfied { .. }));
}

/// `@Any` 匹配该类型的全部 Bean
#[test]
fn test_any_lists_every_candidate() {
    let container = container(deployment(), settings());
    let any = catalog(&deployment()).qualifier("Any").unwrap();

    let mut ids: Vec<String> = container
        .candidates(&payment(), &[any.clone()])
        .iter()
        .map(|bean| bean.id.to_string())
        .collect();
    ids.sort();

    assert_eq!(ids, vec!["PaymentService", "PaymentServiceFast"]);
    assert!(container.resolve(&payment(), &[any]).unwrap_err().is_ambiguous());
}

/// 特化是排他且传递的
#[test]
fn test_specialization_is_exclusive_and_transitive() {
    let deployment = deployment()
        .with_bean(
            BeanDeclaration::new("MockPaymentService")
                .exposes(payment())
                .specializes("PaymentService"),
        )
        .with_bean(
            BeanDeclaration::new("RecordingPaymentService")
                .exposes(payment())
                .specializes("MockPaymentService"),
        );
    let container = container(deployment, settings());

    let visible: Vec<String> = container
        .find_by_type(&payment())
        .iter()
        .map(|bean| bean.id.to_string())
        .collect();
    assert!(!visible.contains(&"PaymentService".to_string()));
    assert!(!visible.contains(&"MockPaymentService".to_string()));

    assert_eq!(resolved_id(&container, &[]), "RecordingPaymentService");
    assert_eq!(
        container.resolve_name("paymentService").unwrap().id.as_str(),
        "RecordingPaymentService"
    );
    assert_eq!(
        container
            .specializer_of(&"PaymentService".into())
            .unwrap()
            .id
            .as_str(),
        "MockPaymentService"
    );
}

/// 启用的备选实现胜出，列表越靠前优先级越高
#[test]
fn test_enabled_alternatives_win() {
    let deployment = deployment()
        .with_bean(
            BeanDeclaration::new("MockPaymentService")
                .exposes(payment())
                .alternative(),
        )
        .with_bean(
            BeanDeclaration::new("SandboxPaymentService")
                .exposes(payment())
                .alternative(),
        );

    let disabled = container(deployment.clone(), settings());
    assert_eq!(resolved_id(&disabled, &[]), "PaymentService");

    let enabled = container(
        deployment.clone(),
        settings()
            .with_alternative("SandboxPaymentService")
            .with_alternative("MockPaymentService"),
    );
    assert_eq!(resolved_id(&enabled, &[]), "SandboxPaymentService");

    // 同一个备选实现列出两次是定义错误
    assert!(matches!(
        Container::new(
            deployment.clone(),
            settings()
                .with_alternative("MockPaymentService")
                .with_alternative("SandboxPaymentService")
                .with_alternative("MockPaymentService"),
        ),
        Err(ContainerError::Configuration {
            source: ConfigurationError::DuplicateEnablement { .. }
        })
    ));

    let with_priority = deployment.with_bean(
        BeanDeclaration::new("PriorityPaymentService")
            .exposes(payment())
            .alternative()
            .with_priority(10),
    );
    assert_eq!(
        resolved_id(&container(with_priority.clone(), settings()), &[]),
        "PriorityPaymentService"
    );
    // 启用列表中的备选实现优先于只声明优先级的
    assert_eq!(
        resolved_id(
            &container(with_priority, settings().with_alternative("MockPaymentService")),
            &[]
        ),
        "MockPaymentService"
    );
}

/// 按名称解析与按类型解析互相独立
#[test]
fn test_name_resolution() {
    let container = container(deployment(), settings());

    assert_eq!(
        container.resolve_name("paymentService").unwrap().id.as_str(),
        "PaymentService"
    );
    match container.resolve_name("PaymentService").unwrap_err() {
        ResolutionError::UnsatisfiedName { near_misses, .. } => assert_eq!(near_misses.len(), 1),
        other => panic!("期望名称不满足错误, 实际 {:?}", other),
    }

    let duplicated = container_with_legacy_name();
    assert!(duplicated
        .resolve_name("paymentService")
        .unwrap_err()
        .is_ambiguous());
    // 同名不影响按类型解析
    assert_eq!(resolved_id(&duplicated, &[]), "PaymentService");
}

fn container_with_legacy_name() -> Container {
    container(
        deployment().with_bean(
            BeanDeclaration::new("LegacyPaymentService")
                .exposes(ContractType::raw("LegacyPayment"))
                .named("paymentService"),
        ),
        settings(),
    )
}
