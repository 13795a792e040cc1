//! 拦截计划
//!
//! 为每个 Bean 计算业务方法和生命周期阶段的调用链。计划只依赖启用顺序和绑定元数据，
//! 计算结果不可变

use crate::bindings::{BindingCollector, DecoratorModel, InterceptorModel, MethodBindings};
use crate::matcher::TypeMatcher;
use di_abstractions::{BeanInterceptionPlan, MethodChain};
use infrastructure_common::{
    Bean, BeanDeclaration, BeanRole, ConfigurationResult, InterceptionKind, InterceptorBinding,
    LifecyclePhase,
};
use std::collections::BTreeSet;
use std::sync::Arc;
use tracing::debug;

/// 计划所需的 Bean 元数据
#[derive(Debug, Clone)]
pub struct BeanMetadata {
    pub bean: Arc<Bean>,
    /// 类级有效绑定（含 stereotype 携带的绑定）
    pub class_bindings: BTreeSet<InterceptorBinding>,
    pub methods: Vec<MethodBindings>,
    /// 目标类自身声明的生命周期回调
    pub lifecycle_hooks: BTreeSet<LifecyclePhase>,
}

impl BeanMetadata {
    /// 从声明收集绑定元数据
    pub fn collect(
        bean: Arc<Bean>,
        declaration: &BeanDeclaration,
        collector: &BindingCollector,
    ) -> ConfigurationResult<Self> {
        let class_bindings = collector.class_bindings(declaration)?;
        let methods = declaration
            .methods
            .iter()
            .map(|method| collector.method_bindings(&class_bindings, method))
            .collect::<ConfigurationResult<Vec<_>>>()?;
        Ok(Self {
            bean,
            class_bindings,
            methods,
            lifecycle_hooks: declaration.lifecycle_hooks.clone(),
        })
    }
}

/// 拦截计划器
///
/// 持有按启用顺序排列、且只包含已启用元素的拦截器与装饰器
#[derive(Debug, Clone)]
pub struct InterceptionPlanner {
    interceptors: Vec<InterceptorModel>,
    decorators: Vec<DecoratorModel>,
    matcher: TypeMatcher,
    collector: BindingCollector,
}

impl InterceptionPlanner {
    pub fn new(
        interceptors: Vec<InterceptorModel>,
        decorators: Vec<DecoratorModel>,
        matcher: TypeMatcher,
        collector: BindingCollector,
    ) -> Self {
        Self {
            interceptors,
            decorators,
            matcher,
            collector,
        }
    }

    /// 已启用的拦截器，外层在前
    pub fn interceptors(&self) -> &[InterceptorModel] {
        &self.interceptors
    }

    /// 已启用的装饰器，外层在前
    pub fn decorators(&self) -> &[DecoratorModel] {
        &self.decorators
    }

    /// 计算 Bean 的拦截计划
    pub fn plan(&self, metadata: &BeanMetadata) -> BeanInterceptionPlan {
        let bean = &metadata.bean;
        let mut plan = BeanInterceptionPlan::empty(bean.id.clone());
        if bean.role != BeanRole::Managed {
            return plan;
        }

        let decorators =
            self.collector
                .applicable_decorators(bean, &self.decorators, &self.matcher);
        plan.decorators = decorators.iter().map(|d| d.class.clone()).collect();

        for method in &metadata.methods {
            let chain = if method.interceptable {
                MethodChain {
                    interceptors: self.matching_interceptors(
                        InterceptionKind::AroundInvoke,
                        &method.bindings,
                    ),
                    decorators: decorators
                        .iter()
                        .filter(|d| d.decorates_method(self.matcher.catalog(), &method.signature))
                        .map(|d| d.class.clone())
                        .collect(),
                }
            } else {
                MethodChain::default()
            };
            plan.methods.insert(method.signature.clone(), chain);
        }

        for phase in LifecyclePhase::ALL {
            let interceptors =
                self.matching_interceptors(InterceptionKind::from(phase), &metadata.class_bindings);
            if !interceptors.is_empty() || metadata.lifecycle_hooks.contains(&phase) {
                plan.lifecycle.insert(phase, interceptors);
            }
        }

        debug!(
            "计算拦截计划 {}: {} 个方法, {} 个被拦截",
            plan.bean,
            plan.methods.len(),
            plan.intercepted_methods().count()
        );
        plan
    }

    fn matching_interceptors(
        &self,
        kind: InterceptionKind,
        bindings: &BTreeSet<InterceptorBinding>,
    ) -> Vec<String> {
        if bindings.is_empty() {
            return Vec::new();
        }
        self.interceptors
            .iter()
            .filter(|interceptor| interceptor.supports(kind) && interceptor.matches(bindings))
            .map(|interceptor| interceptor.class.clone())
            .collect()
    }
}
