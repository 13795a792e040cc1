//! 支付场景
//!
//! 内置的部署描述、启用配置，以及拦截器 / 装饰器 / 目标对象的运行时实现

use di_abstractions::{downcast, instance, Instance, Invocation, InvocationResult, InvocationTarget};
use di_impl::ChainElements;
use infrastructure_common::{
    BeanDeclaration, ContainerSettings, ContractType, DelegatePoint, Deployment, InterceptionKind,
    InvocationError, LifecyclePhase, MarkerKind, MarkerLiteral, MemberDef, MethodDeclaration,
    MethodSignature, TypeDescriptor, Visibility,
};
use parking_lot::Mutex;
use std::fmt;
use std::sync::Arc;

/// 金额，以分为单位
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub struct Money(pub i64);

impl fmt::Display for Money {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}.{:02}", self.0 / 100, self.0 % 100)
    }
}

/// 超出单笔限额
#[derive(Debug, thiserror::Error)]
#[error("金额 {amount} 超出单笔限额 {limit}")]
pub struct LimitExceeded {
    pub amount: Money,
    pub limit: Money,
}

/// 调用轨迹，链元素和目标按进入顺序写入
#[derive(Debug, Clone, Default)]
pub struct Journal(Arc<Mutex<Vec<String>>>);

impl Journal {
    pub fn record(&self, entry: impl Into<String>) {
        self.0.lock().push(entry.into());
    }

    /// 取出并清空已记录的条目
    pub fn drain(&self) -> Vec<String> {
        std::mem::take(&mut *self.0.lock())
    }
}

pub fn charge() -> MethodSignature {
    MethodSignature::new("charge", vec![ContractType::raw("Money")])
}

pub fn close() -> MethodSignature {
    MethodSignature::nullary("close")
}

pub fn payment() -> ContractType {
    ContractType::raw("Payment")
}

/// 内置部署描述，与 `config/payment.toml` 等价
pub fn deployment() -> Deployment {
    Deployment::new()
        .with_kind(MarkerKind::qualifier("Fast"))
        .with_kind(
            MarkerKind::qualifier("Currency")
                .with_member("code", MemberDef::scalar())
                .with_member("note", MemberDef::scalar().nonbinding().with_default("")),
        )
        .with_kind(MarkerKind::interceptor_binding("Transactional"))
        .with_kind(MarkerKind::interceptor_binding("Audited"))
        .with_type(TypeDescriptor::new("Money"))
        .with_type(TypeDescriptor::new("Payment").declares(charge()))
        .with_bean(
            BeanDeclaration::new("PaymentService")
                .exposes(payment())
                .named("paymentService")
                .with_binding(MarkerLiteral::new("Transactional"))
                .with_method(
                    MethodDeclaration::new(charge()).with_binding(MarkerLiteral::new("Audited")),
                )
                .with_method(MethodDeclaration::new(close()))
                .with_method(
                    MethodDeclaration::new(MethodSignature::nullary("reconcile"))
                        .with_visibility(Visibility::Private),
                )
                .with_lifecycle_hook(LifecyclePhase::PostConstruct),
        )
        .with_bean(
            BeanDeclaration::new("PaymentServiceFast")
                .exposes(payment())
                .qualified(MarkerLiteral::new("Fast"))
                .with_method(MethodDeclaration::new(charge())),
        )
        .with_bean(
            BeanDeclaration::new("EuroPaymentService")
                .exposes(payment())
                .qualified(MarkerLiteral::new("Currency").with("code", "EUR"))
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
            BeanDeclaration::interceptor(
                "TraceInterceptor",
                [InterceptionKind::PostConstruct, InterceptionKind::PreDestroy],
            )
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

/// 内置启用配置，与 `config/container.toml` 等价
pub fn settings() -> ContainerSettings {
    ContainerSettings::new()
        .with_interceptor("TxInterceptor")
        .with_interceptor("AuditInterceptor")
        .with_decorator("LimitDecorator")
        .with_decorator("FraudDecorator")
}

fn amount_of(invocation: &dyn Invocation) -> Option<Money> {
    invocation
        .args()
        .first()
        .and_then(|arg| arg.downcast_ref::<Money>())
        .copied()
}

fn method_name(invocation: &dyn Invocation) -> String {
    invocation
        .method()
        .map(ToString::to_string)
        .unwrap_or_else(|| format!("{:?}", invocation.kind()))
}

/// 支付场景全部链元素的运行时实例
pub fn elements(journal: &Journal, limit: Money) -> ChainElements {
    let tx = journal.clone();
    let audit = journal.clone();
    let trace = journal.clone();
    let limiter = journal.clone();
    let fraud = journal.clone();

    ChainElements::new()
        .with_interceptor(
            "TxInterceptor",
            move |invocation: &mut dyn Invocation| -> InvocationResult {
                tx.record("TxInterceptor: 开启事务");
                let result = invocation.proceed();
                tx.record(if result.is_ok() {
                    "TxInterceptor: 提交"
                } else {
                    "TxInterceptor: 回滚"
                });
                result
            },
        )
        .with_interceptor(
            "AuditInterceptor",
            move |invocation: &mut dyn Invocation| -> InvocationResult {
                audit.record(format!("AuditInterceptor: {}", method_name(invocation)));
                invocation.proceed()
            },
        )
        .with_interceptor(
            "TraceInterceptor",
            move |invocation: &mut dyn Invocation| -> InvocationResult {
                trace.record(format!("TraceInterceptor: {}", method_name(invocation)));
                invocation.proceed()
            },
        )
        .with_decorator(
            "LimitDecorator",
            move |invocation: &mut dyn Invocation| -> InvocationResult {
                if let Some(amount) = amount_of(invocation) {
                    if amount > limit {
                        limiter.record(format!("LimitDecorator: 拒绝 {}", amount));
                        return Err(InvocationError::raised(LimitExceeded { amount, limit }));
                    }
                }
                limiter.record("LimitDecorator: 通过");
                invocation.proceed()
            },
        )
        .with_decorator(
            "FraudDecorator",
            move |invocation: &mut dyn Invocation| -> InvocationResult {
                let score = amount_of(invocation).map_or(0, |amount| amount.0 / 1000);
                invocation
                    .context_data_mut()
                    .insert("fraud_score".to_string(), serde_json::json!(score));
                fraud.record(format!("FraudDecorator: 风险评分 {}", score));
                invocation.proceed()
            },
        )
}

/// 支付服务目标对象
pub struct PaymentTarget {
    name: String,
    journal: Journal,
}

impl PaymentTarget {
    pub fn new(name: impl Into<String>, journal: Journal) -> Self {
        Self {
            name: name.into(),
            journal,
        }
    }
}

impl InvocationTarget for PaymentTarget {
    fn invoke(&self, method: &MethodSignature, args: &[Instance]) -> InvocationResult {
        match method.name.as_str() {
            "charge" => {
                let amount = args
                    .first()
                    .map(downcast::<Money>)
                    .transpose()?
                    .unwrap_or(Money(0));
                self.journal.record(format!("{}.charge({})", self.name, amount));
                Ok(instance(format!("receipt:{}:{}", self.name, amount)))
            }
            _ => {
                self.journal.record(format!("{}.{}", self.name, method));
                Ok(instance(()))
            }
        }
    }

    fn lifecycle_callback(&self, phase: LifecyclePhase) -> Result<(), InvocationError> {
        self.journal.record(format!("{}: {:?} 回调", self.name, phase));
        Ok(())
    }
}
