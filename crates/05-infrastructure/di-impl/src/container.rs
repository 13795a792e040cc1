//! 容器
//!
//! 读取方通过 `ArcSwap` 无锁地拿到当前快照；写入方（重新配置 / 重新部署）
//! 串行化，在旁边构建新快照后原子替换。持有旧快照的读取方继续看到一致的旧视图

use crate::invocation::ChainInvocationHandler;
use crate::snapshot::ContainerSnapshot;
use arc_swap::ArcSwap;
use di_abstractions::{
    BeanContainer, BeanInterceptionPlan, BeanLookup, BeanResolver, ChainElementProvider,
    ContainerStats, Instance, InvocationHandler, InvocationTarget, ProxyFactory,
};
use infrastructure_common::{
    Bean, BeanId, ContainerError, ContainerResult, ContainerSettings, ContractType, Deployment,
    Qualifier, ResolutionResult,
};
use parking_lot::Mutex;
use std::fmt;
use std::sync::Arc;
use tracing::info;

/// Bean 容器实现
pub struct Container {
    current: ArcSwap<ContainerSnapshot>,
    writer: Mutex<()>,
    proxy_factory: Option<Arc<dyn ProxyFactory>>,
}

impl Container {
    /// 构建第一代快照并创建容器
    pub fn new(deployment: Deployment, settings: ContainerSettings) -> ContainerResult<Self> {
        let snapshot = ContainerSnapshot::build(Arc::new(deployment), settings, 1)?;
        Ok(Self {
            current: ArcSwap::from_pointee(snapshot),
            writer: Mutex::new(()),
            proxy_factory: None,
        })
    }

    /// 设置代理工厂
    pub fn with_proxy_factory(mut self, factory: Arc<dyn ProxyFactory>) -> Self {
        info!("使用代理工厂: {}", factory.name());
        self.proxy_factory = Some(factory);
        self
    }

    /// 当前快照
    pub fn snapshot(&self) -> Arc<ContainerSnapshot> {
        self.current.load_full()
    }

    /// 用新的配置重建快照并原子发布，返回新快照的代数
    ///
    /// 构建失败时当前快照保持不变
    pub fn reconfigure(&self, settings: ContainerSettings) -> ContainerResult<u64> {
        let _guard = self.writer.lock();
        let current = self.current.load_full();
        self.publish(Arc::clone(current.deployment()), settings, current.generation())
    }

    /// 用新的部署描述重建快照并原子发布，返回新快照的代数
    pub fn redeploy(&self, deployment: Deployment) -> ContainerResult<u64> {
        let _guard = self.writer.lock();
        let current = self.current.load_full();
        self.publish(
            Arc::new(deployment),
            current.settings().clone(),
            current.generation(),
        )
    }

    fn publish(
        &self,
        deployment: Arc<Deployment>,
        settings: ContainerSettings,
        previous: u64,
    ) -> ContainerResult<u64> {
        let generation = previous + 1;
        let snapshot = ContainerSnapshot::build(deployment, settings, generation)?;
        self.current.store(Arc::new(snapshot));
        info!("发布容器快照: 第 {} 代替换第 {} 代", generation, previous);
        Ok(generation)
    }

    /// 为 Bean 创建代理
    ///
    /// 没有任何被拦截方法的 Bean 不需要代理，返回 `None`
    pub fn create_proxy(
        &self,
        contract: &ContractType,
        bean: &BeanId,
        target: Arc<dyn InvocationTarget>,
        elements: Arc<dyn ChainElementProvider>,
    ) -> ContainerResult<Option<Instance>> {
        let plan = self.interception_plan(bean)?;
        if !plan.requires_proxy() {
            return Ok(None);
        }
        let factory = self
            .proxy_factory
            .as_ref()
            .ok_or_else(|| ContainerError::ProxyCreationFailed {
                message: format!("Bean {} 需要代理，但没有配置代理工厂", bean),
            })?;
        let handler: Arc<dyn InvocationHandler> =
            Arc::new(ChainInvocationHandler::new(plan, target, elements));
        factory.create_proxy(contract, handler).map(Some)
    }
}

impl fmt::Debug for Container {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let snapshot = self.current.load();
        f.debug_struct("Container")
            .field("generation", &snapshot.generation())
            .field("snapshot", &snapshot.id())
            .field(
                "proxy_factory",
                &self.proxy_factory.as_ref().map(|factory| factory.name().to_string()),
            )
            .finish()
    }
}

impl BeanResolver for Container {
    fn resolve(&self, ty: &ContractType, qualifiers: &[Qualifier]) -> ResolutionResult<Arc<Bean>> {
        self.current.load().resolver().resolve(ty, qualifiers)
    }

    fn resolve_name(&self, name: &str) -> ResolutionResult<Arc<Bean>> {
        self.current.load().resolver().resolve_name(name)
    }

    fn candidates(&self, ty: &ContractType, qualifiers: &[Qualifier]) -> Vec<Arc<Bean>> {
        self.current.load().resolver().candidates(ty, qualifiers)
    }

    fn can_resolve(&self, ty: &ContractType, qualifiers: &[Qualifier]) -> bool {
        self.current.load().resolver().can_resolve(ty, qualifiers)
    }
}

impl BeanLookup for Container {
    fn find_by_type(&self, ty: &ContractType) -> Vec<Arc<Bean>> {
        self.current.load().registry().find_by_type(ty)
    }

    fn find_by_name(&self, name: &str) -> Vec<Arc<Bean>> {
        self.current.load().registry().find_by_name(name)
    }

    fn bean(&self, id: &BeanId) -> Option<Arc<Bean>> {
        self.current.load().registry().bean(id)
    }

    fn beans(&self) -> Vec<Arc<Bean>> {
        self.current.load().registry().beans()
    }

    fn specializer_of(&self, id: &BeanId) -> Option<Arc<Bean>> {
        self.current.load().registry().specializer_of(id)
    }
}

impl BeanContainer for Container {
    fn interception_plan(&self, bean: &BeanId) -> ContainerResult<Arc<BeanInterceptionPlan>> {
        self.current.load().plan(bean)
    }

    fn invocation_handler(
        &self,
        bean: &BeanId,
        target: Arc<dyn InvocationTarget>,
        elements: Arc<dyn ChainElementProvider>,
    ) -> ContainerResult<Arc<dyn InvocationHandler>> {
        let plan = self.interception_plan(bean)?;
        Ok(Arc::new(ChainInvocationHandler::new(plan, target, elements)))
    }

    fn stats(&self) -> ContainerStats {
        self.current.load().stats()
    }
}
