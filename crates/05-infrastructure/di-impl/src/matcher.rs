//! 类型与限定符匹配
//!
//! 纯函数式的判定，不持有可变状态，结果可以安全地被上层缓存

use infrastructure_common::{ContractType, Marker, Qualifier, TypeArg, TypeCatalog};
use std::collections::BTreeSet;
use std::sync::Arc;

/// 类型匹配器
///
/// 泛型参数的边界检查依赖 [`TypeCatalog`] 提供的子类型关系
#[derive(Debug, Clone, Default)]
pub struct TypeMatcher {
    catalog: Arc<TypeCatalog>,
}

impl TypeMatcher {
    pub fn new(catalog: Arc<TypeCatalog>) -> Self {
        Self { catalog }
    }

    pub fn catalog(&self) -> &TypeCatalog {
        &self.catalog
    }

    /// 请求类型是否可以由 Bean 提供的类型满足
    pub fn assignable(&self, requested: &ContractType, offered: &ContractType) -> bool {
        if requested.raw != offered.raw {
            return false;
        }

        match (requested.is_parameterized(), offered.is_parameterized()) {
            (false, false) => true,
            // 原始类型与参数化类型之间只接受 Object 或无界类型变量作为参数
            (false, true) => offered.args.iter().all(TypeArg::is_unbounded),
            (true, false) => requested.args.iter().all(TypeArg::is_unbounded),
            (true, true) => {
                requested.args.len() == offered.args.len()
                    && requested
                        .args
                        .iter()
                        .zip(&offered.args)
                        .all(|(required, bean)| self.argument_assignable(required, bean))
            }
        }
    }

    fn argument_assignable(&self, required: &TypeArg, bean: &TypeArg) -> bool {
        match (required, bean) {
            (TypeArg::Actual(required), TypeArg::Actual(bean)) => self.assignable(required, bean),
            (TypeArg::Wildcard { upper, lower }, TypeArg::Actual(bean)) => {
                upper
                    .as_deref()
                    .map_or(true, |upper| self.catalog.is_subtype(bean, upper))
                    && lower
                        .as_deref()
                        .map_or(true, |lower| self.catalog.is_subtype(lower, bean))
            }
            (TypeArg::Wildcard { upper, lower }, TypeArg::Variable { bounds, .. }) => {
                let bounds = upper_bounds(bounds);
                let upper_ok = upper.as_deref().map_or(true, |upper| {
                    bounds.iter().all(|bound| {
                        self.catalog.is_subtype(bound, upper) || self.catalog.is_subtype(upper, bound)
                    })
                });
                let lower_ok = lower.as_deref().map_or(true, |lower| {
                    bounds.iter().all(|bound| self.catalog.is_subtype(lower, bound))
                });
                upper_ok && lower_ok
            }
            (TypeArg::Actual(required), TypeArg::Variable { bounds, .. }) => upper_bounds(bounds)
                .iter()
                .all(|bound| self.catalog.is_subtype(required, bound)),
            (TypeArg::Variable { bounds: required, .. }, TypeArg::Variable { bounds: bean, .. }) => {
                let required = upper_bounds(required);
                upper_bounds(bean).iter().all(|bean_bound| {
                    required
                        .iter()
                        .any(|required_bound| self.catalog.is_subtype(required_bound, bean_bound))
                })
            }
            (TypeArg::Variable { .. }, TypeArg::Actual(_)) => false,
            (_, TypeArg::Wildcard { .. }) => false,
        }
    }

    /// Bean 的类型闭包中是否存在满足请求的类型
    pub fn matches_any(&self, requested: &ContractType, offered: &BTreeSet<ContractType>) -> bool {
        offered
            .iter()
            .any(|offered| self.assignable(requested, offered))
    }
}

fn upper_bounds(bounds: &[ContractType]) -> Vec<ContractType> {
    if bounds.is_empty() {
        vec![ContractType::object()]
    } else {
        bounds.to_vec()
    }
}

/// 补全请求的限定符：空集合等价于 `{@Default}`
pub fn normalize_requested(requested: &[Qualifier]) -> Vec<Qualifier> {
    if requested.is_empty() {
        vec![Marker::default_qualifier()]
    } else {
        requested.to_vec()
    }
}

/// 每个请求的限定符都能在 Bean 的限定符中找到相等的实例
///
/// 调用方负责先用 [`normalize_requested`] 处理空集合
pub fn qualifiers_match(requested: &[Qualifier], offered: &BTreeSet<Qualifier>) -> bool {
    requested.iter().all(|qualifier| offered.contains(qualifier))
}
