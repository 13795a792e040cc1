//! 单元测试共用的支付场景

use crate::bindings::BindingCollector;
use crate::enablement::AlternativeSelector;
use crate::matcher::TypeMatcher;
use crate::registry::{assemble_bean, BeanRegistry, BeanRegistryBuilder};
use infrastructure_common::{
    BeanDeclaration, ConfigurationResult, ContainerSettings, ContractType, DelegatePoint,
    Deployment, InterceptionKind, MarkerCatalog, MarkerKind, MarkerLiteral, MemberDef,
    MethodDeclaration, MethodSignature, Qualifier, TypeCatalog, TypeDescriptor, Visibility,
};
use std::sync::Arc;

pub(crate) fn marker_kinds() -> Vec<MarkerKind> {
    vec![
        MarkerKind::qualifier("Fast"),
        MarkerKind::qualifier("Slow"),
        MarkerKind::qualifier("Mock"),
        MarkerKind::qualifier("Currency")
            .with_member("code", MemberDef::scalar())
            .with_member("note", MemberDef::scalar().nonbinding().with_default("")),
        MarkerKind::interceptor_binding("Transactional"),
        MarkerKind::interceptor_binding("Audited"),
        MarkerKind::interceptor_binding("Logged"),
    ]
}

pub(crate) fn marker_catalog() -> MarkerCatalog {
    let mut catalog = MarkerCatalog::new();
    for kind in marker_kinds() {
        catalog.register_kind(kind).unwrap();
    }
    catalog
}

pub(crate) fn qualifier(kind: &str) -> Qualifier {
    marker_catalog().qualifier(kind).unwrap()
}

pub(crate) fn money() -> ContractType {
    ContractType::raw("Money")
}

/// `Payment.charge(Money)`
pub(crate) fn charge() -> MethodSignature {
    MethodSignature::new("charge", vec![money()])
}

/// `PaymentService.close()`，不属于 `Payment` 接口
pub(crate) fn close() -> MethodSignature {
    MethodSignature::nullary("close")
}

pub(crate) fn type_descriptors() -> Vec<TypeDescriptor> {
    vec![
        TypeDescriptor::new("Money"),
        TypeDescriptor::new("Payment").declares(charge()),
        TypeDescriptor::new("Refund").declares(MethodSignature::new("refund", vec![money()])),
        TypeDescriptor::new("PaymentService").extends(ContractType::raw("Payment")),
        TypeDescriptor::new("PaymentServiceFast").extends(ContractType::raw("Payment")),
    ]
}

pub(crate) fn type_catalog() -> TypeCatalog {
    TypeCatalog::from_descriptors(type_descriptors())
}

/// 类级 `@Transactional`，`charge` 另有 `@Audited`
pub(crate) fn payment_service() -> BeanDeclaration {
    BeanDeclaration::new("PaymentService")
        .exposes(ContractType::raw("Payment"))
        .with_binding(MarkerLiteral::new("Transactional"))
        .with_method(
            MethodDeclaration::new(charge()).with_binding(MarkerLiteral::new("Audited")),
        )
        .with_method(MethodDeclaration::new(close()))
        .with_method(
            MethodDeclaration::new(MethodSignature::nullary("reconcile"))
                .with_visibility(Visibility::Private),
        )
}

pub(crate) fn payment_service_fast() -> BeanDeclaration {
    BeanDeclaration::new("PaymentServiceFast")
        .exposes(ContractType::raw("Payment"))
        .qualified(MarkerLiteral::new("Fast"))
        .with_method(MethodDeclaration::new(charge()))
}

pub(crate) fn tx_interceptor() -> BeanDeclaration {
    BeanDeclaration::interceptor("TxInterceptor", [InterceptionKind::AroundInvoke])
        .with_binding(MarkerLiteral::new("Transactional"))
}

pub(crate) fn audit_interceptor() -> BeanDeclaration {
    BeanDeclaration::interceptor("AuditInterceptor", [InterceptionKind::AroundInvoke])
        .with_binding(MarkerLiteral::new("Audited"))
}

/// 只参与生命周期的拦截器，未列入启用列表，靠优先级启用
pub(crate) fn trace_interceptor() -> BeanDeclaration {
    BeanDeclaration::interceptor(
        "TraceInterceptor",
        [InterceptionKind::PostConstruct, InterceptionKind::PreDestroy],
    )
    .with_binding(MarkerLiteral::new("Transactional"))
    .with_priority(100)
}

pub(crate) fn limit_decorator() -> BeanDeclaration {
    BeanDeclaration::decorator(
        "LimitDecorator",
        DelegatePoint::new(ContractType::raw("Payment")),
    )
}

pub(crate) fn fraud_decorator() -> BeanDeclaration {
    BeanDeclaration::decorator(
        "FraudDecorator",
        DelegatePoint::new(ContractType::raw("Payment")),
    )
}

pub(crate) fn deployment() -> Deployment {
    let mut deployment = Deployment::new();
    deployment.marker_kinds = marker_kinds();
    deployment.types = type_descriptors();
    deployment
        .with_bean(payment_service())
        .with_bean(payment_service_fast())
        .with_bean(tx_interceptor())
        .with_bean(audit_interceptor())
        .with_bean(trace_interceptor())
        .with_bean(limit_decorator())
        .with_bean(fraud_decorator())
}

pub(crate) fn settings() -> ContainerSettings {
    ContainerSettings::new()
        .with_interceptor("TxInterceptor")
        .with_interceptor("AuditInterceptor")
        .with_decorator("LimitDecorator")
        .with_decorator("FraudDecorator")
}

fn build_registry(
    declarations: Vec<BeanDeclaration>,
    alternatives: &[&str],
    strict: bool,
) -> ConfigurationResult<BeanRegistry> {
    let types = Arc::new(type_catalog());
    let collector = BindingCollector::new(Arc::new(marker_catalog()));
    let selector = AlternativeSelector::new(alternatives)?;
    let mut builder = BeanRegistryBuilder::new(TypeMatcher::new(Arc::clone(&types)))
        .with_strict_footprints(strict);
    for declaration in &declarations {
        builder.register(assemble_bean(declaration, &collector, &selector, &types)?)?;
    }
    builder.build()
}

pub(crate) fn registry(declarations: Vec<BeanDeclaration>) -> ConfigurationResult<BeanRegistry> {
    build_registry(declarations, &[], false)
}

pub(crate) fn strict_registry(
    declarations: Vec<BeanDeclaration>,
) -> ConfigurationResult<BeanRegistry> {
    build_registry(declarations, &[], true)
}

pub(crate) fn registry_with_alternatives(
    declarations: Vec<BeanDeclaration>,
    alternatives: &[&str],
) -> ConfigurationResult<BeanRegistry> {
    build_registry(declarations, alternatives, false)
}
