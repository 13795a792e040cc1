//! Bean 发现抽象接口
//!
//! 类路径扫描等发现机制不属于容器本身，由发现协作方以部署描述的形式提供

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use infrastructure_common::{ContainerError, Deployment};

/// Bean 发现器 trait
#[async_trait]
pub trait BeanDiscovery: Send + Sync {
    /// 发现 Bean 声明、标记种类、stereotype 与类型信息
    async fn discover(&self) -> Result<Deployment, ContainerError>;

    /// 获取发现器名称
    fn name(&self) -> &str;
}

/// 发现结果
#[derive(Debug, Clone)]
pub struct DiscoveryResult {
    /// 部署描述
    pub deployment: Deployment,
    /// 发现器名称
    pub discoverer: String,
    /// 发现时间
    pub discovered_at: DateTime<Utc>,
}

impl DiscoveryResult {
    /// 创建新的发现结果
    pub fn new(deployment: Deployment, discoverer: impl Into<String>) -> Self {
        Self {
            deployment,
            discoverer: discoverer.into(),
            discovered_at: Utc::now(),
        }
    }
}

/// 依次执行多个发现器并合并结果
pub async fn discover_all(
    discoveries: &[Box<dyn BeanDiscovery>],
) -> Result<Vec<DiscoveryResult>, ContainerError> {
    let mut results = Vec::with_capacity(discoveries.len());
    for discovery in discoveries {
        let deployment = discovery.discover().await?;
        tracing::debug!(
            "发现器 {} 提供了 {} 个 Bean 声明",
            discovery.name(),
            deployment.beans.len()
        );
        results.push(DiscoveryResult::new(deployment, discovery.name()));
    }
    Ok(results)
}
