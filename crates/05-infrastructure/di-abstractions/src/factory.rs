//! 代理工厂抽象接口
//!
//! 代理的生成由外部协作方完成，容器只提供调用处理器

use crate::interception::{Instance, InvocationResult};
use crate::plan::BeanInterceptionPlan;
use infrastructure_common::{
    BeanId, ContainerError, ContractType, InvocationError, LifecyclePhase, MethodSignature,
};
use std::sync::Arc;

/// 调用处理器
///
/// 绑定到一个 Bean 的拦截计划与目标对象，代理把每次业务调用转交给它
pub trait InvocationHandler: Send + Sync {
    /// 目标 Bean
    fn bean(&self) -> &BeanId;

    /// 生效的拦截计划
    fn plan(&self) -> &Arc<BeanInterceptionPlan>;

    /// 处理一次业务方法调用
    fn invoke(&self, method: &MethodSignature, args: Vec<Instance>) -> InvocationResult;

    /// 执行生命周期回调链
    fn invoke_lifecycle(&self, phase: LifecyclePhase) -> Result<(), InvocationError>;
}

/// 代理工厂 trait
pub trait ProxyFactory: Send + Sync {
    /// 为契约类型创建代理实例
    fn create_proxy(
        &self,
        contract: &ContractType,
        handler: Arc<dyn InvocationHandler>,
    ) -> Result<Instance, ContainerError>;

    /// 获取工厂名称
    fn name(&self) -> &str;
}
