//! 调用链执行
//!
//! 每次调用创建一个 [`ChainInvocation`]，只在当前调用栈上使用。
//! 链元素拿到的 `proceed` 总是指向下一个位置，返回后位置复原，
//! 因此链元素可以短路、重试或改写参数与结果

use di_abstractions::{
    void_result, BeanInterceptionPlan, ChainElementProvider, Decorator, Instance, Interceptor,
    Invocation, InvocationHandler, InvocationResult, InvocationTarget,
};
use infrastructure_common::{
    BeanId, InterceptionKind, InvocationError, LifecyclePhase, MethodSignature,
};
use std::collections::HashMap;
use std::sync::Arc;
use tracing::trace;

/// 已取得实例的链元素
#[derive(Clone)]
enum ChainStep {
    Interceptor {
        class: String,
        element: Arc<dyn Interceptor>,
    },
    Decorator {
        class: String,
        element: Arc<dyn Decorator>,
    },
}

impl ChainStep {
    fn class(&self) -> &str {
        match self {
            Self::Interceptor { class, .. } | Self::Decorator { class, .. } => class,
        }
    }
}

/// 调用链执行器
///
/// 绑定一个拦截计划和链元素提供者，本身无状态，可以在线程间共享
#[derive(Clone)]
pub struct InvocationChainExecutor {
    plan: Arc<BeanInterceptionPlan>,
    elements: Arc<dyn ChainElementProvider>,
}

impl InvocationChainExecutor {
    pub fn new(plan: Arc<BeanInterceptionPlan>, elements: Arc<dyn ChainElementProvider>) -> Self {
        Self { plan, elements }
    }

    pub fn plan(&self) -> &Arc<BeanInterceptionPlan> {
        &self.plan
    }

    /// 执行业务方法调用
    ///
    /// 不在计划中的方法返回 [`InvocationError::MethodNotInPlan`]，空调用链直接调用目标
    pub fn invoke(
        &self,
        target: &dyn InvocationTarget,
        method: &MethodSignature,
        args: Vec<Instance>,
    ) -> InvocationResult {
        let chain =
            self.plan
                .method_chain(method)
                .ok_or_else(|| InvocationError::MethodNotInPlan {
                    bean: self.plan.bean.to_string(),
                    method: method.to_string(),
                })?;
        if chain.is_empty() {
            trace!("{}.{} 没有调用链，直接调用目标", self.plan.bean, method);
            return target.invoke(method, &args);
        }

        let mut steps = Vec::with_capacity(chain.len());
        for class in &chain.interceptors {
            steps.push(self.interceptor_step(class)?);
        }
        for class in &chain.decorators {
            steps.push(self.decorator_step(class)?);
        }
        ChainInvocation::new(
            self,
            target,
            InterceptionKind::AroundInvoke,
            Some(method.clone()),
            steps,
            args,
        )
        .proceed()
    }

    /// 执行生命周期回调链：拦截器依次执行，最后调用目标自身的回调
    ///
    /// 计划中没有该阶段时不做任何事
    pub fn invoke_lifecycle(
        &self,
        target: &dyn InvocationTarget,
        phase: LifecyclePhase,
    ) -> Result<(), InvocationError> {
        if !self.plan.lifecycle.contains_key(&phase) {
            return Ok(());
        }
        let steps = self
            .plan
            .lifecycle_interceptors(phase)
            .iter()
            .map(|class| self.interceptor_step(class))
            .collect::<Result<Vec<_>, _>>()?;
        ChainInvocation::new(self, target, InterceptionKind::from(phase), None, steps, Vec::new())
            .proceed()
            .map(|_| ())
    }

    fn interceptor_step(&self, class: &str) -> Result<ChainStep, InvocationError> {
        let element = self
            .elements
            .interceptor(class)
            .ok_or_else(|| missing(class))?;
        Ok(ChainStep::Interceptor {
            class: class.to_string(),
            element,
        })
    }

    fn decorator_step(&self, class: &str) -> Result<ChainStep, InvocationError> {
        let element = self.elements.decorator(class).ok_or_else(|| missing(class))?;
        Ok(ChainStep::Decorator {
            class: class.to_string(),
            element,
        })
    }

    /// 委托调用的剩余装饰器：按启用顺序排在 `after` 之后、且装饰该方法的装饰器
    ///
    /// `after` 本身不必装饰该方法
    fn delegate_steps(
        &self,
        method: &MethodSignature,
        after: &str,
    ) -> Result<Vec<ChainStep>, InvocationError> {
        let Some(chain) = self.plan.method_chain(method) else {
            return Ok(Vec::new());
        };
        let rank = |class: &str| self.plan.decorators.iter().position(|d| d == class);
        let Some(caller) = rank(after) else {
            return Ok(Vec::new());
        };
        chain
            .decorators
            .iter()
            .filter(|class| rank(class.as_str()).is_some_and(|position| position > caller))
            .map(|class| self.decorator_step(class))
            .collect()
    }
}

fn missing(class: &str) -> InvocationError {
    InvocationError::MissingElement {
        class: class.to_string(),
    }
}

/// 单次调用的上下文
pub struct ChainInvocation<'a> {
    executor: &'a InvocationChainExecutor,
    target: &'a dyn InvocationTarget,
    kind: InterceptionKind,
    method: Option<MethodSignature>,
    steps: Vec<ChainStep>,
    next: usize,
    args: Vec<Instance>,
    context_data: HashMap<String, serde_json::Value>,
}

impl<'a> ChainInvocation<'a> {
    fn new(
        executor: &'a InvocationChainExecutor,
        target: &'a dyn InvocationTarget,
        kind: InterceptionKind,
        method: Option<MethodSignature>,
        steps: Vec<ChainStep>,
        args: Vec<Instance>,
    ) -> Self {
        Self {
            executor,
            target,
            kind,
            method,
            steps,
            next: 0,
            args,
            context_data: HashMap::new(),
        }
    }

    fn invoke_target(&self) -> InvocationResult {
        match &self.method {
            Some(method) => {
                trace!("{}.{} 到达目标", self.executor.plan.bean, method);
                self.target.invoke(method, &self.args)
            }
            None => {
                trace!("{} {} 到达目标回调", self.executor.plan.bean, self.kind);
                if let Some(phase) = self.kind.lifecycle_phase() {
                    self.target.lifecycle_callback(phase)?;
                }
                void_result()
            }
        }
    }
}

impl Invocation for ChainInvocation<'_> {
    fn kind(&self) -> InterceptionKind {
        self.kind
    }

    fn bean(&self) -> &BeanId {
        &self.executor.plan.bean
    }

    fn method(&self) -> Option<&MethodSignature> {
        self.method.as_ref()
    }

    fn target(&self) -> &dyn InvocationTarget {
        self.target
    }

    fn args(&self) -> &[Instance] {
        &self.args
    }

    fn set_args(&mut self, args: Vec<Instance>) {
        self.args = args;
    }

    fn position(&self) -> usize {
        self.next
    }

    fn context_data(&self) -> &HashMap<String, serde_json::Value> {
        &self.context_data
    }

    fn context_data_mut(&mut self) -> &mut HashMap<String, serde_json::Value> {
        &mut self.context_data
    }

    fn proceed(&mut self) -> InvocationResult {
        let position = self.next;
        let Some(step) = self.steps.get(position).cloned() else {
            return self.invoke_target();
        };

        trace!(
            "{} {} 第 {} 步: {}",
            self.executor.plan.bean,
            self.kind,
            position,
            step.class()
        );
        self.next = position + 1;
        let result = match &step {
            ChainStep::Interceptor { element, .. } => element.intercept(self),
            ChainStep::Decorator { element, .. } => element.decorate(self),
        };
        self.next = position;
        result
    }

    fn invoke_delegate(
        &mut self,
        method: &MethodSignature,
        args: Vec<Instance>,
    ) -> InvocationResult {
        let current = self
            .next
            .checked_sub(1)
            .and_then(|index| self.steps.get(index));
        let Some(ChainStep::Decorator { class, .. }) = current else {
            return Err(InvocationError::DelegateUnavailable {
                method: method.to_string(),
            });
        };

        trace!("{} 调用委托 {}", class, method);
        let steps = self.executor.delegate_steps(method, class)?;
        let mut delegate = ChainInvocation::new(
            self.executor,
            self.target,
            InterceptionKind::AroundInvoke,
            Some(method.clone()),
            steps,
            args,
        );
        delegate.context_data = self.context_data.clone();
        delegate.proceed()
    }
}

/// 调用处理器：拦截计划 + 目标对象 + 链元素
pub struct ChainInvocationHandler {
    executor: InvocationChainExecutor,
    target: Arc<dyn InvocationTarget>,
}

impl ChainInvocationHandler {
    pub fn new(
        plan: Arc<BeanInterceptionPlan>,
        target: Arc<dyn InvocationTarget>,
        elements: Arc<dyn ChainElementProvider>,
    ) -> Self {
        Self {
            executor: InvocationChainExecutor::new(plan, elements),
            target,
        }
    }
}

impl InvocationHandler for ChainInvocationHandler {
    fn bean(&self) -> &BeanId {
        &self.executor.plan.bean
    }

    fn plan(&self) -> &Arc<BeanInterceptionPlan> {
        &self.executor.plan
    }

    fn invoke(&self, method: &MethodSignature, args: Vec<Instance>) -> InvocationResult {
        self.executor.invoke(self.target.as_ref(), method, args)
    }

    fn invoke_lifecycle(&self, phase: LifecyclePhase) -> Result<(), InvocationError> {
        self.executor.invoke_lifecycle(self.target.as_ref(), phase)
    }
}
