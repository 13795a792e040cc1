//! Bean 容器抽象接口

use crate::factory::InvocationHandler;
use crate::interception::{ChainElementProvider, InvocationTarget};
use crate::plan::BeanInterceptionPlan;
use crate::registry::BeanLookup;
use crate::resolver::BeanResolver;
use chrono::{DateTime, Utc};
use infrastructure_common::{BeanId, ContainerResult};
use serde::Serialize;
use std::sync::Arc;
use uuid::Uuid;

/// Bean 容器 trait
///
/// 在解析能力之上提供拦截计划和调用处理器
pub trait BeanContainer: BeanResolver + BeanLookup {
    /// 获取 Bean 的拦截计划，首次访问时计算并缓存
    fn interception_plan(&self, bean: &BeanId) -> ContainerResult<Arc<BeanInterceptionPlan>>;

    /// 为目标对象创建调用处理器
    fn invocation_handler(
        &self,
        bean: &BeanId,
        target: Arc<dyn InvocationTarget>,
        elements: Arc<dyn ChainElementProvider>,
    ) -> ContainerResult<Arc<dyn InvocationHandler>>;

    /// 容器统计信息
    fn stats(&self) -> ContainerStats;
}

/// 容器统计信息
#[derive(Debug, Clone, Serialize)]
pub struct ContainerStats {
    /// 快照代数，每次发布递增
    pub generation: u64,
    /// 快照标识
    pub snapshot_id: Uuid,
    /// 快照构建时间
    pub built_at: DateTime<Utc>,
    /// 托管 Bean 数量
    pub beans: usize,
    /// 已启用拦截器数量
    pub interceptors: usize,
    /// 已启用装饰器数量
    pub decorators: usize,
    /// 已计算的拦截计划数量
    pub plans_built: usize,
    /// 解析缓存命中次数
    pub resolution_cache_hits: u64,
    /// 解析缓存未命中次数
    pub resolution_cache_misses: u64,
}

impl Default for ContainerStats {
    fn default() -> Self {
        Self {
            generation: 0,
            snapshot_id: Uuid::nil(),
            built_at: Utc::now(),
            beans: 0,
            interceptors: 0,
            decorators: 0,
            plans_built: 0,
            resolution_cache_hits: 0,
            resolution_cache_misses: 0,
        }
    }
}

impl ContainerStats {
    /// 解析缓存命中率
    pub fn cache_hit_rate(&self) -> f64 {
        let total = self.resolution_cache_hits + self.resolution_cache_misses;
        if total == 0 {
            0.0
        } else {
            self.resolution_cache_hits as f64 / total as f64
        }
    }
}
