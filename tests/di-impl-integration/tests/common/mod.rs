//! 集成测试共用的支付场景
#![allow(dead_code)]

use di_abstractions::{instance, Instance, Invocation, InvocationResult, InvocationTarget};
use di_impl::ChainElements;
use infrastructure_common::{
    BeanDeclaration, ContainerSettings, ContractType, DelegatePoint, Deployment, InterceptionKind,
    InvocationError, LifecyclePhase, MarkerCatalog, MarkerKind, MarkerLiteral, MemberDef,
    MethodDeclaration, MethodSignature, Qualifier, TypeDescriptor, Visibility,
};
use parking_lot::Mutex;
use std::sync::Arc;

pub fn payment() -> ContractType {
    ContractType::raw("Payment")
}

pub fn money() -> ContractType {
    ContractType::raw("Money")
}

pub fn charge() -> MethodSignature {
    MethodSignature::new("charge", vec![money()])
}

pub fn authorize() -> MethodSignature {
    MethodSignature::new("authorize", vec![money()])
}

pub fn close() -> MethodSignature {
    MethodSignature::nullary("close")
}

pub fn marker_kinds() -> Vec<MarkerKind> {
    vec![
        MarkerKind::qualifier("Fast"),
        MarkerKind::qualifier("Slow"),
        MarkerKind::qualifier("Currency")
            .with_member("code", MemberDef::scalar())
            .with_member("note", MemberDef::scalar().nonbinding().with_default("")),
        MarkerKind::interceptor_binding("Transactional"),
        MarkerKind::interceptor_binding("Audited"),
    ]
}

/// 支付场景的 Bean、拦截器与装饰器
pub fn deployment() -> Deployment {
    let mut deployment = Deployment::new();
    deployment.marker_kinds = marker_kinds();
    deployment
        .with_type(TypeDescriptor::new("Money"))
        .with_type(
            TypeDescriptor::new("Payment")
                .declares(charge())
                .declares(authorize()),
        )
        .with_bean(payment_service())
        .with_bean(
            BeanDeclaration::new("PaymentServiceFast")
                .exposes(payment())
                .qualified(MarkerLiteral::new("Fast"))
                .with_method(MethodDeclaration::new(charge())),
        )
        .with_bean(
            BeanDeclaration::interceptor("TxInterceptor", [InterceptionKind::AroundInvoke])
                .with_binding(MarkerLiteral::new("Transactional")),
        )
        .with_bean(
            BeanDeclaration::interceptor("AuditInterceptor", [InterceptionKind::AroundInvoke])
                .with_binding(MarkerLiteral::new("Audited")),
        )
        .with_bean(
            BeanDeclaration::interceptor("TraceInterceptor", [InterceptionKind::PostConstruct])
                .with_binding(MarkerLiteral::new("Transactional"))
                .with_priority(100),
        )
        .with_bean(BeanDeclaration::decorator(
            "LimitDecorator",
            DelegatePoint::new(payment()),
        ))
        .with_bean(BeanDeclaration::decorator(
            "FraudDecorator",
            DelegatePoint::new(payment()),
        ))
}

/// 类级 `@Transactional`，`charge` 另有 `@Audited`
pub fn payment_service() -> BeanDeclaration {
    BeanDeclaration::new("PaymentService")
        .exposes(payment())
        .named("paymentService")
        .with_binding(MarkerLiteral::new("Transactional"))
        .with_method(MethodDeclaration::new(charge()).with_binding(MarkerLiteral::new("Audited")))
        .with_method(MethodDeclaration::new(authorize()))
        .with_method(MethodDeclaration::new(close()))
        .with_method(
            MethodDeclaration::new(MethodSignature::nullary("reconcile"))
                .with_visibility(Visibility::Private),
        )
        .with_lifecycle_hook(LifecyclePhase::PostConstruct)
}

pub fn settings() -> ContainerSettings {
    ContainerSettings::new()
        .with_interceptor("TxInterceptor")
        .with_interceptor("AuditInterceptor")
        .with_decorator("LimitDecorator")
        .with_decorator("FraudDecorator")
}

pub fn catalog(deployment: &Deployment) -> MarkerCatalog {
    deployment.marker_catalog().unwrap()
}

pub fn qualifier(kind: &str) -> Qualifier {
    catalog(&deployment()).qualifier(kind).unwrap()
}

/// 按进入顺序记录调用轨迹
#[derive(Debug, Clone, Default)]
pub struct Journal(Arc<Mutex<Vec<String>>>);

impl Journal {
    pub fn record(&self, entry: impl Into<String>) {
        self.0.lock().push(entry.into());
    }

    pub fn entries(&self) -> Vec<String> {
        self.0.lock().clone()
    }
}

/// 进入时记录 `名称 >`，返回时记录 `名称 <`
pub fn recording(journal: &Journal, name: &'static str) -> impl Fn(&mut dyn Invocation) -> InvocationResult + Send + Sync {
    let journal = journal.clone();
    move |invocation: &mut dyn Invocation| -> InvocationResult {
        journal.record(format!("{} >", name));
        let result = invocation.proceed();
        journal.record(format!("{} <", name));
        result
    }
}

/// 全部链元素都只记录轨迹
pub fn recording_elements(journal: &Journal) -> ChainElements {
    ChainElements::new()
        .with_interceptor("TxInterceptor", recording(journal, "TxInterceptor"))
        .with_interceptor("AuditInterceptor", recording(journal, "AuditInterceptor"))
        .with_interceptor("TraceInterceptor", recording(journal, "TraceInterceptor"))
        .with_decorator("LimitDecorator", recording(journal, "LimitDecorator"))
        .with_decorator("FraudDecorator", recording(journal, "FraudDecorator"))
}

/// 目标对象：记录方法名并返回方法名
pub struct RecordingTarget {
    journal: Journal,
}

impl RecordingTarget {
    pub fn new(journal: &Journal) -> Arc<Self> {
        Arc::new(Self {
            journal: journal.clone(),
        })
    }
}

impl InvocationTarget for RecordingTarget {
    fn invoke(&self, method: &MethodSignature, _args: &[Instance]) -> InvocationResult {
        self.journal.record(format!("target.{}", method.name));
        Ok(instance(method.name.clone()))
    }

    fn lifecycle_callback(&self, phase: LifecyclePhase) -> Result<(), InvocationError> {
        self.journal.record(format!("target.{:?}", phase));
        Ok(())
    }
}

/// 业务异常
#[derive(Debug, thiserror::Error)]
#[error("余额不足")]
pub struct InsufficientFunds;
