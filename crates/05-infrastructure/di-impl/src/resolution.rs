//! 解析引擎
//!
//! 对同一份注册表快照，相同的 (类型, 限定符) 总是解析到同一个 Bean，
//! 因此结果以值为键缓存在并发安全的映射中，只在快照替换时随之丢弃

use crate::matcher::{normalize_requested, qualifiers_match};
use crate::registry::BeanRegistry;
use dashmap::DashMap;
use di_abstractions::{BeanLookup, BeanResolver, ResolutionRequest};
use infrastructure_common::{
    Bean, BeanId, ContractType, Qualifier, ResolutionError, ResolutionResult,
};
use std::collections::BTreeMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use tracing::{debug, warn};

/// 解析引擎
#[derive(Debug)]
pub struct Resolver {
    registry: Arc<BeanRegistry>,
    cache: Option<DashMap<ResolutionRequest, ResolutionResult<Arc<Bean>>>>,
    hits: AtomicU64,
    misses: AtomicU64,
}

impl Resolver {
    /// 创建解析引擎，`cache` 控制是否缓存解析结果
    pub fn new(registry: Arc<BeanRegistry>, cache: bool) -> Self {
        Self {
            registry,
            cache: cache.then(DashMap::new),
            hits: AtomicU64::new(0),
            misses: AtomicU64::new(0),
        }
    }

    pub fn registry(&self) -> &Arc<BeanRegistry> {
        &self.registry
    }

    /// 缓存命中次数
    pub fn cache_hits(&self) -> u64 {
        self.hits.load(Ordering::Relaxed)
    }

    /// 缓存未命中次数
    pub fn cache_misses(&self) -> u64 {
        self.misses.load(Ordering::Relaxed)
    }

    /// 已缓存的请求数量
    pub fn cached_requests(&self) -> usize {
        self.cache.as_ref().map_or(0, DashMap::len)
    }

    fn resolve_request(&self, request: &ResolutionRequest) -> ResolutionResult<Arc<Bean>> {
        let candidates = self.enabled_candidates(request);
        debug!("解析 {}: {} 个候选", request, candidates.len());

        let survivors = match candidates.len() {
            0 => return Err(self.unsatisfied(request)),
            1 => candidates,
            _ => self.disambiguate(candidates),
        };

        match survivors.as_slice() {
            [bean] => {
                debug!("解析 {} -> {}", request, bean.id);
                Ok(Arc::clone(bean))
            }
            _ => Err(ResolutionError::Ambiguous {
                requested: request.ty.to_string(),
                qualifiers: request.qualifier_names(),
                candidates: survivors.iter().map(|bean| bean.describe()).collect(),
            }),
        }
    }

    /// 实际计算一次解析，失败时记录警告；缓存命中不经过这里
    fn resolve_uncached(&self, request: &ResolutionRequest) -> ResolutionResult<Arc<Bean>> {
        let result = self.resolve_request(request);
        if let Err(error) = &result {
            warn!("{}", error);
        }
        result
    }

    /// 按类型查找并按限定符过滤，丢弃未启用的备选实现
    fn enabled_candidates(&self, request: &ResolutionRequest) -> Vec<Arc<Bean>> {
        self.registry
            .find_by_type(&request.ty)
            .into_iter()
            .filter(|bean| qualifiers_match(&request.qualifiers, &bean.qualifiers))
            .filter(|bean| bean.is_enabled())
            .collect()
    }

    /// 多个候选时：先替换为最终特化者，再按备选实现优先级收敛
    fn disambiguate(&self, candidates: Vec<Arc<Bean>>) -> Vec<Arc<Bean>> {
        let mut reduced: BTreeMap<BeanId, Arc<Bean>> = BTreeMap::new();
        for bean in candidates {
            let specialized = self.registry.most_specialized(&bean);
            reduced.insert(specialized.id.clone(), specialized);
        }
        let reduced: Vec<Arc<Bean>> = reduced.into_values().collect();
        if reduced.len() <= 1 {
            return reduced;
        }

        let Some(highest) = reduced.iter().filter_map(|bean| bean.precedence()).max() else {
            return reduced;
        };
        reduced
            .into_iter()
            .filter(|bean| bean.precedence() == Some(highest))
            .collect()
    }

    fn unsatisfied(&self, request: &ResolutionRequest) -> ResolutionError {
        let near_misses = self
            .registry
            .find_by_raw(&request.ty.raw)
            .iter()
            .map(|bean| bean.describe())
            .collect();
        ResolutionError::Unsatisfied {
            requested: request.ty.to_string(),
            qualifiers: request.qualifier_names(),
            near_misses,
        }
    }
}

impl BeanResolver for Resolver {
    fn resolve(&self, ty: &ContractType, qualifiers: &[Qualifier]) -> ResolutionResult<Arc<Bean>> {
        let request = ResolutionRequest::new(ty.clone(), &normalize_requested(qualifiers));
        let Some(cache) = &self.cache else {
            return self.resolve_uncached(&request);
        };

        if let Some(cached) = cache.get(&request) {
            self.hits.fetch_add(1, Ordering::Relaxed);
            debug!("解析缓存命中: {}", request);
            return cached.clone();
        }
        self.misses.fetch_add(1, Ordering::Relaxed);
        let result = self.resolve_uncached(&request);
        cache.entry(request).or_insert_with(|| result.clone());
        result
    }

    fn resolve_name(&self, name: &str) -> ResolutionResult<Arc<Bean>> {
        let candidates: Vec<Arc<Bean>> = self
            .registry
            .find_by_name(name)
            .into_iter()
            .filter(|bean| bean.is_enabled())
            .collect();

        let survivors = match candidates.len() {
            0 => {
                let near_misses = self
                    .registry
                    .beans()
                    .iter()
                    .filter(|bean| {
                        bean.name
                            .as_deref()
                            .is_some_and(|candidate| candidate.eq_ignore_ascii_case(name))
                    })
                    .map(|bean| bean.describe())
                    .collect();
                let error = ResolutionError::UnsatisfiedName {
                    name: name.to_string(),
                    near_misses,
                };
                warn!("{}", error);
                return Err(error);
            }
            1 => candidates,
            _ => self.disambiguate(candidates),
        };

        match survivors.as_slice() {
            [bean] => Ok(Arc::clone(bean)),
            _ => {
                let error = ResolutionError::AmbiguousName {
                    name: name.to_string(),
                    candidates: survivors.iter().map(|bean| bean.describe()).collect(),
                };
                warn!("{}", error);
                Err(error)
            }
        }
    }

    fn candidates(&self, ty: &ContractType, qualifiers: &[Qualifier]) -> Vec<Arc<Bean>> {
        let request = ResolutionRequest::new(ty.clone(), &normalize_requested(qualifiers));
        self.enabled_candidates(&request)
    }

    /// 只检查候选集能否收敛为唯一 Bean，不写缓存也不记录警告
    fn can_resolve(&self, ty: &ContractType, qualifiers: &[Qualifier]) -> bool {
        let candidates = self.candidates(ty, qualifiers);
        match candidates.len() {
            0 => false,
            1 => true,
            _ => self.disambiguate(candidates).len() == 1,
        }
    }
}
