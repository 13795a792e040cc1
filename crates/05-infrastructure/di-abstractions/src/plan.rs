//! 拦截计划
//!
//! 计划只描述每个方法 / 生命周期阶段的调用链顺序，构建后不可变，
//! 重新配置时整体替换

use infrastructure_common::{BeanId, LifecyclePhase, MethodSignature};
use serde::{Serialize, Serializer};
use std::collections::BTreeMap;
use std::fmt;

/// 单个业务方法的调用链
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct MethodChain {
    /// 拦截器类名，外层在前
    pub interceptors: Vec<String>,
    /// 装饰器类名，外层在前，最后一个最靠近目标
    pub decorators: Vec<String>,
}

impl MethodChain {
    /// 调用链是否为空
    pub fn is_empty(&self) -> bool {
        self.interceptors.is_empty() && self.decorators.is_empty()
    }

    /// 链元素总数
    pub fn len(&self) -> usize {
        self.interceptors.len() + self.decorators.len()
    }
}

/// Bean 的拦截计划
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct BeanInterceptionPlan {
    pub bean: BeanId,
    /// 每个可拦截业务方法的调用链，空链表示不需要拦截
    #[serde(serialize_with = "serialize_methods")]
    pub methods: BTreeMap<MethodSignature, MethodChain>,
    /// 每个生命周期阶段的拦截器，外层在前
    pub lifecycle: BTreeMap<LifecyclePhase, Vec<String>>,
    /// 适用于该 Bean 的全部装饰器，外层在前
    pub decorators: Vec<String>,
}

impl BeanInterceptionPlan {
    /// 没有任何链元素的计划
    pub fn empty(bean: BeanId) -> Self {
        Self {
            bean,
            methods: BTreeMap::new(),
            lifecycle: BTreeMap::new(),
            decorators: Vec::new(),
        }
    }

    /// 获取方法调用链
    pub fn method_chain(&self, method: &MethodSignature) -> Option<&MethodChain> {
        self.methods.get(method)
    }

    /// 方法是否被拦截或装饰
    pub fn is_intercepted(&self, method: &MethodSignature) -> bool {
        self.methods
            .get(method)
            .is_some_and(|chain| !chain.is_empty())
    }

    /// 是否需要代理：至少一个业务方法拥有非空调用链
    pub fn requires_proxy(&self) -> bool {
        self.methods.values().any(|chain| !chain.is_empty())
    }

    /// 被拦截的业务方法
    pub fn intercepted_methods(&self) -> impl Iterator<Item = &MethodSignature> {
        self.methods
            .iter()
            .filter(|(_, chain)| !chain.is_empty())
            .map(|(method, _)| method)
    }

    /// 生命周期阶段的拦截器
    pub fn lifecycle_interceptors(&self, phase: LifecyclePhase) -> &[String] {
        self.lifecycle.get(&phase).map(Vec::as_slice).unwrap_or(&[])
    }

    /// 装饰器的嵌套构建顺序：最靠近目标的在前
    pub fn decorator_nesting(&self, method: &MethodSignature) -> Vec<&str> {
        self.methods
            .get(method)
            .map(|chain| chain.decorators.iter().rev().map(String::as_str).collect())
            .unwrap_or_default()
    }
}

impl fmt::Display for BeanInterceptionPlan {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "Bean {}", self.bean)?;
        for (method, chain) in &self.methods {
            if chain.is_empty() {
                writeln!(f, "  {} -> (直接调用)", method)?;
            } else {
                writeln!(
                    f,
                    "  {} -> 拦截器 [{}] 装饰器 [{}]",
                    method,
                    chain.interceptors.join(" > "),
                    chain.decorators.join(" > ")
                )?;
            }
        }
        for (phase, interceptors) in &self.lifecycle {
            writeln!(f, "  {:?} -> [{}]", phase, interceptors.join(" > "))?;
        }
        Ok(())
    }
}

fn serialize_methods<S>(
    methods: &BTreeMap<MethodSignature, MethodChain>,
    serializer: S,
) -> Result<S::Ok, S::Error>
where
    S: Serializer,
{
    serializer.collect_map(methods.iter().map(|(method, chain)| (method.to_string(), chain)))
}
