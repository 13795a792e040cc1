//! 调用链元素抽象接口
//!
//! 拦截器、装饰器和目标对象都以类型擦除的实例交换参数与返回值。
//! 每次调用拥有独立的 [`Invocation`]，链元素通过它把调用推进到下一个位置。

use infrastructure_common::{
    BeanId, InterceptionKind, InvocationError, LifecyclePhase, MethodSignature,
};
use std::any::Any;
use std::collections::HashMap;
use std::sync::Arc;

/// 类型擦除的实例（参数、返回值、目标对象）
pub type Instance = Arc<dyn Any + Send + Sync>;

/// 调用结果
pub type InvocationResult = Result<Instance, InvocationError>;

/// 包装一个值
pub fn instance<T: Any + Send + Sync>(value: T) -> Instance {
    Arc::new(value)
}

/// 无返回值的调用结果
pub fn void_result() -> InvocationResult {
    Ok(Arc::new(()))
}

/// 取出具体类型的值
pub fn downcast<T: Any + Send + Sync + Clone>(value: &Instance) -> Result<T, InvocationError> {
    value
        .downcast_ref::<T>()
        .cloned()
        .ok_or_else(|| InvocationError::ResultTypeMismatch {
            expected: std::any::type_name::<T>().to_string(),
        })
}

/// 单次调用的上下文
///
/// 由执行器在每次调用时创建，只属于这一次调用，不会在线程间共享
pub trait Invocation {
    /// 拦截类型
    fn kind(&self) -> InterceptionKind;

    /// 目标 Bean
    fn bean(&self) -> &BeanId;

    /// 被调用的业务方法，生命周期调用时为 `None`
    fn method(&self) -> Option<&MethodSignature>;

    /// 目标对象
    fn target(&self) -> &dyn InvocationTarget;

    /// 当前参数
    fn args(&self) -> &[Instance];

    /// 替换参数，对后续链元素和目标生效
    fn set_args(&mut self, args: Vec<Instance>);

    /// 下一个将被调用的链位置，等于已进入的链元素数量
    fn position(&self) -> usize;

    /// 在链元素之间传递的上下文数据
    fn context_data(&self) -> &HashMap<String, serde_json::Value>;

    /// 可变的上下文数据
    fn context_data_mut(&mut self) -> &mut HashMap<String, serde_json::Value>;

    /// 调用链中的下一个元素，最后到达目标
    ///
    /// 可以不调用（短路）或多次调用（重试），每次都从下一个位置重新开始
    fn proceed(&mut self) -> InvocationResult;

    /// 装饰器调用其委托
    ///
    /// 委托调用从当前装饰器之后的装饰器继续，可以是另一个业务方法。
    /// 当前元素不是装饰器时返回 [`InvocationError::DelegateUnavailable`]
    fn invoke_delegate(&mut self, method: &MethodSignature, args: Vec<Instance>)
        -> InvocationResult;
}

/// 拦截器
pub trait Interceptor: Send + Sync {
    /// 环绕调用，通过 [`Invocation::proceed`] 继续调用链
    fn intercept(&self, invocation: &mut dyn Invocation) -> InvocationResult;
}

impl<F> Interceptor for F
where
    F: Fn(&mut dyn Invocation) -> InvocationResult + Send + Sync,
{
    fn intercept(&self, invocation: &mut dyn Invocation) -> InvocationResult {
        self(invocation)
    }
}

/// 装饰器
///
/// 以业务语义包装目标，通过 [`Invocation::invoke_delegate`] 或
/// [`Invocation::proceed`] 调用被装饰对象
pub trait Decorator: Send + Sync {
    fn decorate(&self, invocation: &mut dyn Invocation) -> InvocationResult;
}

impl<F> Decorator for F
where
    F: Fn(&mut dyn Invocation) -> InvocationResult + Send + Sync,
{
    fn decorate(&self, invocation: &mut dyn Invocation) -> InvocationResult {
        self(invocation)
    }
}

/// 调用目标
pub trait InvocationTarget: Send + Sync {
    /// 调用业务方法
    fn invoke(&self, method: &MethodSignature, args: &[Instance]) -> InvocationResult;

    /// 目标自身的生命周期回调
    fn lifecycle_callback(&self, _phase: LifecyclePhase) -> Result<(), InvocationError> {
        Ok(())
    }
}

impl<F> InvocationTarget for F
where
    F: Fn(&MethodSignature, &[Instance]) -> InvocationResult + Send + Sync,
{
    fn invoke(&self, method: &MethodSignature, args: &[Instance]) -> InvocationResult {
        self(method, args)
    }
}

/// 链元素实例提供者
///
/// 拦截计划只记录类名，执行时由提供者给出实例
pub trait ChainElementProvider: Send + Sync {
    fn interceptor(&self, class: &str) -> Option<Arc<dyn Interceptor>>;

    fn decorator(&self, class: &str) -> Option<Arc<dyn Decorator>>;
}
