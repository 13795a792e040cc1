//! 拦截计划与调用链集成测试

mod common;

use common::{
    authorize, charge, close, deployment, money, recording, recording_elements, settings,
    InsufficientFunds, Journal, RecordingTarget,
};
use di_abstractions::{
    downcast, instance, BeanContainer, Invocation, InvocationHandler, InvocationResult,
};
use di_impl::{ChainElements, Container};
use infrastructure_common::{
    BeanDeclaration, BeanId, ContainerSettings, ContractType, DelegatePoint, InvocationError,
    LifecyclePhase, MarkerLiteral, MethodDeclaration, MethodSignature, StereotypeDefinition,
    TypeDescriptor,
};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

fn payment_service() -> BeanId {
    BeanId::new("PaymentService")
}

fn handler(container: &Container, elements: ChainElements, journal: &Journal) -> Arc<dyn InvocationHandler> {
    container
        .invocation_handler(&payment_service(), RecordingTarget::new(journal), Arc::new(elements))
        .unwrap()
}

/// 启用顺序 [Tx, Audit] 决定计划与执行顺序，装饰器在拦截器之后
#[test]
fn test_interceptor_order_follows_enablement() {
    let container = Container::new(deployment(), settings()).unwrap();
    let plan = container.interception_plan(&payment_service()).unwrap();

    let chain = plan.method_chain(&charge()).unwrap();
    assert_eq!(chain.interceptors, vec!["TxInterceptor", "AuditInterceptor"]);
    assert_eq!(chain.decorators, vec!["LimitDecorator", "FraudDecorator"]);
    // 只有类级绑定的方法
    assert_eq!(
        plan.method_chain(&authorize()).unwrap().interceptors,
        vec!["TxInterceptor"]
    );
    // close 不属于 Payment 接口，装饰器不适用
    assert!(plan.method_chain(&close()).unwrap().decorators.is_empty());
    // 私有方法不拦截
    assert!(!plan.is_intercepted(&MethodSignature::nullary("reconcile")));

    let journal = Journal::default();
    let result = handler(&container, recording_elements(&journal), &journal)
        .invoke(&charge(), vec![instance(100_i64)])
        .unwrap();

    assert_eq!(downcast::<String>(&result).unwrap(), "charge");
    assert_eq!(
        journal.entries(),
        vec![
            "TxInterceptor >",
            "AuditInterceptor >",
            "LimitDecorator >",
            "FraudDecorator >",
            "target.charge",
            "FraudDecorator <",
            "LimitDecorator <",
            "AuditInterceptor <",
            "TxInterceptor <",
        ]
    );

    // 调换启用顺序后计划随之调换
    let swapped = Container::new(
        deployment(),
        ContainerSettings::new()
            .with_interceptor("AuditInterceptor")
            .with_interceptor("TxInterceptor")
            .with_decorator("FraudDecorator")
            .with_decorator("LimitDecorator"),
    )
    .unwrap();
    let chain = swapped
        .interception_plan(&payment_service())
        .unwrap()
        .method_chain(&charge())
        .cloned()
        .unwrap();
    assert_eq!(chain.interceptors, vec!["AuditInterceptor", "TxInterceptor"]);
    assert_eq!(chain.decorators, vec!["FraudDecorator", "LimitDecorator"]);
}

/// 外层拦截器不调用 proceed 时，内层元素和目标都不会执行，错误原样传播
#[test]
fn test_short_circuit_and_error_propagation() {
    let container = Container::new(deployment(), settings()).unwrap();
    let journal = Journal::default();
    let reject = journal.clone();
    let elements = recording_elements(&journal).with_interceptor(
        "TxInterceptor",
        move |_: &mut dyn Invocation| -> InvocationResult {
            reject.record("TxInterceptor 拒绝");
            Err(InvocationError::raised(InsufficientFunds))
        },
    );

    let error = handler(&container, elements, &journal)
        .invoke(&charge(), vec![instance(100_i64)])
        .unwrap_err();

    assert!(error.downcast_ref::<InsufficientFunds>().is_some());
    assert_eq!(error.to_string(), "余额不足");
    assert_eq!(journal.entries(), vec!["TxInterceptor 拒绝"]);
}

/// 拦截器可以多次调用 proceed 重试
#[test]
fn test_interceptor_retries_proceed() {
    let container = Container::new(deployment(), settings()).unwrap();
    let journal = Journal::default();
    let attempts = Arc::new(AtomicUsize::new(0));
    let counter = Arc::clone(&attempts);
    let failures = Arc::new(AtomicUsize::new(0));
    let flaky = Arc::clone(&failures);

    let elements = recording_elements(&journal)
        .with_interceptor(
            "TxInterceptor",
            move |invocation: &mut dyn Invocation| -> InvocationResult {
                loop {
                    counter.fetch_add(1, Ordering::SeqCst);
                    match invocation.proceed() {
                        Err(_) if counter.load(Ordering::SeqCst) < 3 => continue,
                        result => return result,
                    }
                }
            },
        )
        .with_decorator(
            "FraudDecorator",
            move |invocation: &mut dyn Invocation| -> InvocationResult {
                if flaky.fetch_add(1, Ordering::SeqCst) < 2 {
                    return Err(InvocationError::raised(InsufficientFunds));
                }
                invocation.proceed()
            },
        );

    let result = handler(&container, elements, &journal)
        .invoke(&charge(), vec![instance(100_i64)])
        .unwrap();

    assert_eq!(downcast::<String>(&result).unwrap(), "charge");
    assert_eq!(attempts.load(Ordering::SeqCst), 3);
    // 每次重试都重新经过 Audit 和 Limit，目标只执行一次
    let entries = journal.entries();
    assert_eq!(entries.iter().filter(|e| *e == "AuditInterceptor >").count(), 3);
    assert_eq!(entries.iter().filter(|e| *e == "target.charge").count(), 1);
}

/// 后启用的装饰器最靠近目标
#[test]
fn test_decorator_nesting_reverses_enablement() {
    let container = Container::new(deployment(), settings()).unwrap();
    let plan = container.interception_plan(&payment_service()).unwrap();

    assert_eq!(
        plan.decorator_nesting(&charge()),
        vec!["FraudDecorator", "LimitDecorator"]
    );

    let journal = Journal::default();
    handler(&container, recording_elements(&journal), &journal)
        .invoke(&authorize(), vec![instance(100_i64)])
        .unwrap();

    assert_eq!(
        journal.entries(),
        vec![
            "TxInterceptor >",
            "LimitDecorator >",
            "FraudDecorator >",
            "target.authorize",
            "FraudDecorator <",
            "LimitDecorator <",
            "TxInterceptor <",
        ]
    );
}

/// 装饰器以另一个业务方法调用委托时，从它之后的装饰器继续
#[test]
fn test_delegate_reentry_with_other_method() {
    let container = Container::new(deployment(), settings()).unwrap();
    let journal = Journal::default();
    let limiter = journal.clone();
    let elements = recording_elements(&journal).with_decorator(
        "LimitDecorator",
        move |invocation: &mut dyn Invocation| -> InvocationResult {
            limiter.record("LimitDecorator 先授权");
            let args = invocation.args().to_vec();
            invocation.invoke_delegate(&authorize(), args.clone())?;
            invocation.invoke_delegate(&charge(), args)
        },
    );

    handler(&container, elements, &journal)
        .invoke(&charge(), vec![instance(100_i64)])
        .unwrap();

    assert_eq!(
        journal.entries(),
        vec![
            "TxInterceptor >",
            "AuditInterceptor >",
            "LimitDecorator 先授权",
            "FraudDecorator >",
            "target.authorize",
            "FraudDecorator <",
            "FraudDecorator >",
            "target.charge",
            "FraudDecorator <",
            "AuditInterceptor <",
            "TxInterceptor <",
        ]
    );
}

/// 委托的方法不被当前装饰器装饰时，启用顺序在它之后的装饰器仍然执行
#[test]
fn test_delegate_reaches_later_decorators_of_other_method() {
    let refunds = ContractType::raw("Refunds");
    let refund = MethodSignature::new("refund", vec![money()]);
    let mut deployment = deployment()
        .with_type(TypeDescriptor::new("Refunds").declares(refund.clone()))
        .with_bean(BeanDeclaration::decorator(
            "RefundAuditDecorator",
            DelegatePoint::new(refunds.clone()),
        ));
    if let Some(service) = deployment
        .beans
        .iter_mut()
        .find(|bean| bean.bean_class == "PaymentService")
    {
        service.types.push(refunds);
        service.methods.push(MethodDeclaration::new(refund.clone()));
    }
    let container = Container::new(
        deployment,
        settings().with_decorator("RefundAuditDecorator"),
    )
    .unwrap();

    let plan = container.interception_plan(&payment_service()).unwrap();
    assert_eq!(
        plan.method_chain(&charge()).unwrap().decorators,
        vec!["LimitDecorator", "FraudDecorator"]
    );
    assert_eq!(
        plan.method_chain(&refund).unwrap().decorators,
        vec!["RefundAuditDecorator"]
    );

    let journal = Journal::default();
    let limiter = journal.clone();
    let elements = recording_elements(&journal)
        .with_decorator(
            "RefundAuditDecorator",
            recording(&journal, "RefundAuditDecorator"),
        )
        .with_decorator(
            "LimitDecorator",
            move |invocation: &mut dyn Invocation| -> InvocationResult {
                limiter.record("LimitDecorator 转为退款");
                let args = invocation.args().to_vec();
                invocation.invoke_delegate(&refund, args)
            },
        );

    let result = handler(&container, elements, &journal)
        .invoke(&charge(), vec![instance(100_i64)])
        .unwrap();

    assert_eq!(downcast::<String>(&result).unwrap(), "refund");
    assert_eq!(
        journal.entries(),
        vec![
            "TxInterceptor >",
            "AuditInterceptor >",
            "LimitDecorator 转为退款",
            "RefundAuditDecorator >",
            "target.refund",
            "RefundAuditDecorator <",
            "AuditInterceptor <",
            "TxInterceptor <",
        ]
    );
}

/// 生命周期拦截器不会出现在业务方法链中，反之亦然
#[test]
fn test_lifecycle_scoping() {
    let container = Container::new(deployment(), settings()).unwrap();
    let plan = container.interception_plan(&payment_service()).unwrap();

    assert_eq!(
        plan.lifecycle_interceptors(LifecyclePhase::PostConstruct),
        ["TraceInterceptor".to_string()]
    );
    assert!(plan.lifecycle_interceptors(LifecyclePhase::PreDestroy).is_empty());
    for method in plan.methods.keys() {
        let chain = plan.method_chain(method).unwrap();
        assert!(!chain.interceptors.contains(&"TraceInterceptor".to_string()));
    }

    let journal = Journal::default();
    let handler = handler(&container, recording_elements(&journal), &journal);
    handler.invoke_lifecycle(LifecyclePhase::PostConstruct).unwrap();
    handler.invoke_lifecycle(LifecyclePhase::PreDestroy).unwrap();

    assert_eq!(
        journal.entries(),
        vec!["TraceInterceptor >", "target.PostConstruct", "TraceInterceptor <"]
    );
}

/// 通过 stereotype 获得的拦截器绑定与直接声明的绑定产生相同的计划
#[test]
fn test_stereotype_bindings_plan_like_direct_bindings() {
    let post = MethodSignature::nullary("post");
    let deployment = deployment()
        .with_stereotype(
            StereotypeDefinition::new("TransactionalService")
                .with_binding(MarkerLiteral::new("Transactional")),
        )
        .with_stereotype(StereotypeDefinition::new("AuditedService").with_stereotype("TransactionalService"))
        .with_bean(
            BeanDeclaration::new("StereotypedLedger")
                .exposes(ContractType::raw("Ledger"))
                .with_stereotype("AuditedService")
                .with_method(MethodDeclaration::new(post.clone())),
        )
        .with_bean(
            BeanDeclaration::new("DirectLedger")
                .exposes(ContractType::raw("Ledger"))
                .with_binding(MarkerLiteral::new("Transactional"))
                .with_method(MethodDeclaration::new(post.clone())),
        );
    let container = Container::new(deployment, settings()).unwrap();

    let stereotyped = container
        .interception_plan(&BeanId::new("StereotypedLedger"))
        .unwrap();
    let direct = container.interception_plan(&BeanId::new("DirectLedger")).unwrap();

    assert_eq!(stereotyped.methods, direct.methods);
    assert_eq!(stereotyped.lifecycle, direct.lifecycle);
    assert_eq!(
        stereotyped.method_chain(&post).unwrap().interceptors,
        vec!["TxInterceptor"]
    );
}

/// 没有计划的方法与缺失的链元素实例
#[test]
fn test_invocation_errors() {
    let container = Container::new(deployment(), settings()).unwrap();
    let journal = Journal::default();
    let handler = handler(
        &container,
        ChainElements::new().with_interceptor("TxInterceptor", recording(&journal, "TxInterceptor")),
        &journal,
    );

    assert!(matches!(
        handler.invoke(&MethodSignature::nullary("refund"), Vec::new()),
        Err(InvocationError::MethodNotInPlan { .. })
    ));
    assert!(matches!(
        handler.invoke(&authorize(), vec![instance(1_i64)]),
        Err(InvocationError::MissingElement { ref class }) if class == "LimitDecorator"
    ));
    assert!(journal.entries().is_empty());
}
