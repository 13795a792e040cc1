//! 容器快照
//!
//! 一次部署 + 一份配置的完整构建结果。快照构建完成后只读，
//! 重新配置时在旁边构建新快照再整体替换

use crate::bindings::{BindingCollector, DecoratorModel, InterceptorModel};
use crate::enablement::Enablement;
use crate::matcher::TypeMatcher;
use crate::planner::{BeanMetadata, InterceptionPlanner};
use crate::registry::{assemble_bean, BeanRegistry, BeanRegistryBuilder};
use crate::resolution::Resolver;
use chrono::{DateTime, Utc};
use di_abstractions::{BeanInterceptionPlan, BeanLookup, ContainerStats};
use infrastructure_common::{
    BeanDeclaration, BeanId, ConfigurationError, ConfigurationResult, ContainerError,
    ContainerResult, ContainerSettings, Deployment, MarkerCatalog,
};
use once_cell::sync::OnceCell;
use std::collections::{BTreeMap, HashSet};
use std::sync::Arc;
use tracing::{debug, info};
use uuid::Uuid;

/// 只读的容器快照
#[derive(Debug)]
pub struct ContainerSnapshot {
    id: Uuid,
    generation: u64,
    built_at: DateTime<Utc>,
    deployment: Arc<Deployment>,
    settings: ContainerSettings,
    resolver: Resolver,
    planner: InterceptionPlanner,
    metadata: BTreeMap<BeanId, BeanMetadata>,
    plans: BTreeMap<BeanId, OnceCell<Arc<BeanInterceptionPlan>>>,
}

impl ContainerSnapshot {
    /// 构建快照
    ///
    /// 全部定义错误都在这里检测；开启 `eager_planning` 时同时计算全部拦截计划
    pub fn build(
        deployment: Arc<Deployment>,
        settings: ContainerSettings,
        generation: u64,
    ) -> ConfigurationResult<Self> {
        let markers = Arc::new(deployment.marker_catalog()?);
        let types = Arc::new(deployment.type_catalog());
        let collector = BindingCollector::new(Arc::clone(&markers));
        let matcher = TypeMatcher::new(Arc::clone(&types));

        let mut interceptors: Vec<InterceptorModel> = Vec::new();
        let mut decorators: Vec<DecoratorModel> = Vec::new();
        let mut managed: Vec<&BeanDeclaration> = Vec::new();
        for declaration in &deployment.beans {
            if declaration.interceptor.is_some() {
                interceptors.push(collector.interceptor_model(declaration)?);
            } else if declaration.decorator.is_some() {
                decorators.push(collector.decorator_model(declaration, &types)?);
            } else {
                managed.push(declaration);
            }
        }

        let enablement =
            Enablement::from_settings(&settings.enablement, &interceptors, &decorators)?;
        validate_alternatives(&enablement, &managed, &markers)?;

        let mut builder = BeanRegistryBuilder::new(matcher.clone())
            .with_strict_footprints(settings.container.strict_footprints);
        for declaration in &managed {
            builder.register(assemble_bean(
                declaration,
                &collector,
                &enablement.alternatives,
                &types,
            )?)?;
        }
        let registry = Arc::new(builder.build()?);

        let mut metadata = BTreeMap::new();
        for declaration in &managed {
            let id = declaration.bean_id();
            if let Some(bean) = registry.bean(&id) {
                metadata.insert(id, BeanMetadata::collect(bean, declaration, &collector)?);
            }
        }
        let plans = metadata.keys().map(|id| (id.clone(), OnceCell::new())).collect();

        let planner = InterceptionPlanner::new(
            enablement.order_interceptors(&interceptors),
            enablement.order_decorators(&decorators),
            matcher,
            collector,
        );
        let snapshot = Self {
            id: Uuid::new_v4(),
            generation,
            built_at: Utc::now(),
            resolver: Resolver::new(registry, settings.container.resolution_cache),
            deployment,
            settings,
            planner,
            metadata,
            plans,
        };

        if snapshot.settings.container.eager_planning {
            for id in snapshot.metadata.keys() {
                snapshot.cached_plan(id);
            }
        }
        info!(
            "容器快照构建完成: 第 {} 代, {} 个 Bean, {} 个拦截器, {} 个装饰器",
            snapshot.generation,
            snapshot.registry().len(),
            snapshot.planner.interceptors().len(),
            snapshot.planner.decorators().len()
        );
        Ok(snapshot)
    }

    pub fn id(&self) -> Uuid {
        self.id
    }

    pub fn generation(&self) -> u64 {
        self.generation
    }

    pub fn built_at(&self) -> DateTime<Utc> {
        self.built_at
    }

    pub fn deployment(&self) -> &Arc<Deployment> {
        &self.deployment
    }

    pub fn settings(&self) -> &ContainerSettings {
        &self.settings
    }

    pub fn resolver(&self) -> &Resolver {
        &self.resolver
    }

    pub fn registry(&self) -> &BeanRegistry {
        self.resolver.registry()
    }

    pub fn planner(&self) -> &InterceptionPlanner {
        &self.planner
    }

    /// Bean 的拦截计划，首次访问时计算
    pub fn plan(&self, bean: &BeanId) -> ContainerResult<Arc<BeanInterceptionPlan>> {
        self.cached_plan(bean).ok_or_else(|| ContainerError::UnknownBean {
            bean: bean.to_string(),
        })
    }

    fn cached_plan(&self, bean: &BeanId) -> Option<Arc<BeanInterceptionPlan>> {
        let metadata = self.metadata.get(bean)?;
        let cell = self.plans.get(bean)?;
        let plan = cell.get_or_init(|| Arc::new(self.planner.plan(metadata)));
        Some(Arc::clone(plan))
    }

    /// 已计算的拦截计划数量
    pub fn plans_built(&self) -> usize {
        self.plans.values().filter(|cell| cell.get().is_some()).count()
    }

    pub fn stats(&self) -> ContainerStats {
        ContainerStats {
            generation: self.generation,
            snapshot_id: self.id,
            built_at: self.built_at,
            beans: self.registry().len(),
            interceptors: self.planner.interceptors().len(),
            decorators: self.planner.decorators().len(),
            plans_built: self.plans_built(),
            resolution_cache_hits: self.resolver.cache_hits(),
            resolution_cache_misses: self.resolver.cache_misses(),
        }
    }
}

/// 启用的备选实现必须是已声明的备选实现类或带备选标记的 stereotype
fn validate_alternatives(
    enablement: &Enablement,
    managed: &[&BeanDeclaration],
    markers: &MarkerCatalog,
) -> ConfigurationResult<()> {
    let alternative_classes: HashSet<&str> = managed
        .iter()
        .filter(|declaration| declaration.alternative)
        .map(|declaration| declaration.bean_class.as_str())
        .collect();
    for name in enablement.alternatives.names() {
        let known = alternative_classes.contains(name)
            || markers
                .stereotype(name)
                .is_some_and(|stereotype| stereotype.alternative);
        if !known {
            return Err(ConfigurationError::UnknownEnabledClass {
                kind: "备选实现".to_string(),
                class: name.to_string(),
            });
        }
        debug!("启用备选实现: {}", name);
    }
    Ok(())
}
