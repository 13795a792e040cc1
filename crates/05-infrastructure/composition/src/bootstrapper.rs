//! 容器启动器

use di_abstractions::{discover_all, BeanDiscovery, ProxyFactory};
use di_impl::Container;
use infrastructure_common::{ContainerResult, ContainerSettings, Deployment};
use std::fmt;
use std::sync::Arc;
use tracing::{debug, info};

/// 容器启动器
///
/// 负责协调发现协作方与快照构建的顺序：先依次执行全部发现器并合并部署描述，
/// 再用配置构建第一代快照
pub struct ContainerBootstrapper {
    /// 发现协作方列表
    discoverers: Vec<Box<dyn BeanDiscovery>>,
    /// 容器配置
    settings: ContainerSettings,
    proxy_factory: Option<Arc<dyn ProxyFactory>>,
}

impl ContainerBootstrapper {
    /// 创建新的容器启动器
    pub fn new(discoverers: Vec<Box<dyn BeanDiscovery>>, settings: ContainerSettings) -> Self {
        Self {
            discoverers,
            settings,
            proxy_factory: None,
        }
    }

    pub fn with_proxy_factory(mut self, factory: Arc<dyn ProxyFactory>) -> Self {
        self.proxy_factory = Some(factory);
        self
    }

    pub fn settings(&self) -> &ContainerSettings {
        &self.settings
    }

    /// 执行全部发现器并按注册顺序合并结果
    pub async fn discover(&self) -> ContainerResult<Deployment> {
        let mut deployment = Deployment::new();
        for result in discover_all(&self.discoverers).await? {
            debug!(
                "合并发现结果: {} ({} 个 Bean 声明, 发现于 {})",
                result.discoverer,
                result.deployment.beans.len(),
                result.discovered_at
            );
            deployment.merge(result.deployment);
        }
        Ok(deployment)
    }

    /// 启动容器
    pub async fn bootstrap(&self) -> ContainerResult<Container> {
        info!("开始启动容器, 发现器数量: {}", self.discoverers.len());

        let deployment = self.discover().await?;
        let mut container = Container::new(deployment, self.settings.clone())?;
        if let Some(factory) = &self.proxy_factory {
            container = container.with_proxy_factory(Arc::clone(factory));
        }

        let stats = container.snapshot().stats();
        info!(
            "容器启动完成: 快照 {}, {} 个 Bean, {} 个拦截计划",
            stats.snapshot_id, stats.beans, stats.plans_built
        );
        Ok(container)
    }

    /// 重新执行发现并替换容器中的部署描述，返回新快照的代数
    pub async fn refresh(&self, container: &Container) -> ContainerResult<u64> {
        info!("重新发现 Bean 声明");
        let deployment = self.discover().await?;
        container.redeploy(deployment)
    }
}

impl fmt::Debug for ContainerBootstrapper {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let discoverers: Vec<&str> = self.discoverers.iter().map(|d| d.name()).collect();
        f.debug_struct("ContainerBootstrapper")
            .field("discoverers", &discoverers)
            .field("settings", &self.settings)
            .field("proxy_factory", &self.proxy_factory.is_some())
            .finish()
    }
}
