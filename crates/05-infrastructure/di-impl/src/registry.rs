//! Bean 注册表
//!
//! 注册表由 [`BeanRegistryBuilder`] 一次性构建，构建完成后只读。
//! 特化是并集操作：被特化 Bean 的限定符、名称和类型合并到特化者，
//! 被特化 Bean 本身不再出现在按类型 / 按名称的查找结果中

use crate::bindings::BindingCollector;
use crate::enablement::AlternativeSelector;
use crate::matcher::TypeMatcher;
use di_abstractions::BeanLookup;
use infrastructure_common::{
    Bean, BeanDeclaration, BeanId, BeanRole, ConfigurationError, ConfigurationResult,
    ContractType, Marker, MemberValue, Qualifier, TypeCatalog,
};
use std::collections::{BTreeMap, BTreeSet, HashMap, HashSet, VecDeque};
use std::sync::Arc;
use tracing::{debug, info, warn};

/// 由声明组装 Bean 记录
///
/// 展开 stereotype，补全内置限定符，计算有效作用域、名称和备选状态，
/// 并沿类型目录补全类型闭包
pub fn assemble_bean(
    declaration: &BeanDeclaration,
    collector: &BindingCollector,
    selector: &AlternativeSelector,
    types: &TypeCatalog,
) -> ConfigurationResult<Bean> {
    let stereotypes = collector.stereotype_closure(&declaration.stereotypes)?;
    let mut qualifiers = collector.collect_qualifiers(declaration, &stereotypes)?;
    let scope = collector.effective_scope(declaration, &stereotypes)?;

    let mut name = declaration.name.clone();
    if let Some(named) = qualifiers.iter().find(|q| q.is_named()).cloned() {
        qualifiers.remove(&named);
        if name.is_none() {
            name = match named.member("value") {
                Some(MemberValue::Str(value)) if !value.is_empty() => Some(value.clone()),
                _ => Some(declaration.default_name()),
            };
        }
    }
    if name.is_none() && stereotypes.iter().any(|stereotype| stereotype.named) {
        name = Some(declaration.default_name());
    }

    if !qualifiers.iter().any(|q| !q.is_any()) {
        qualifiers.insert(Marker::default_qualifier());
    }
    if let Some(name) = &name {
        qualifiers.insert(Marker::named(name.clone()));
    }
    qualifiers.insert(Marker::any());

    let role = if declaration.interceptor.is_some() {
        BeanRole::Interceptor
    } else if declaration.decorator.is_some() {
        BeanRole::Decorator
    } else {
        BeanRole::Managed
    };

    Ok(Bean {
        id: declaration.bean_id(),
        bean_class: declaration.bean_class.clone(),
        types: expand_types(declaration.type_closure(), types),
        qualifiers,
        scope,
        name,
        role,
        selection: selector.selection(declaration, &stereotypes),
        specializes: declaration.specializes.clone(),
        stereotypes: stereotypes.iter().map(|s| s.name.clone()).collect(),
    })
}

/// 沿类型目录补全全部超类型
fn expand_types(declared: BTreeSet<ContractType>, types: &TypeCatalog) -> BTreeSet<ContractType> {
    let mut closure = BTreeSet::new();
    let mut queue: VecDeque<ContractType> = declared.into_iter().collect();
    while let Some(ty) = queue.pop_front() {
        if closure.contains(&ty) {
            continue;
        }
        queue.extend(types.direct_supertypes(&ty));
        closure.insert(ty);
    }
    closure
}

/// 注册表构建器
#[derive(Debug)]
pub struct BeanRegistryBuilder {
    matcher: TypeMatcher,
    beans: BTreeMap<BeanId, Bean>,
    strict_footprints: bool,
}

impl BeanRegistryBuilder {
    pub fn new(matcher: TypeMatcher) -> Self {
        Self {
            matcher,
            beans: BTreeMap::new(),
            strict_footprints: false,
        }
    }

    /// 重复的 (类型, 限定符) 注册在构建期即报错
    pub fn with_strict_footprints(mut self, strict: bool) -> Self {
        self.strict_footprints = strict;
        self
    }

    /// 注册 Bean
    pub fn register(&mut self, bean: Bean) -> ConfigurationResult<()> {
        if self.beans.contains_key(&bean.id) {
            return Err(ConfigurationError::DuplicateBeanId {
                bean: bean.id.to_string(),
            });
        }
        debug!("注册 Bean: {}", bean);
        self.beans.insert(bean.id.clone(), bean);
        Ok(())
    }

    /// 合并特化链并建立索引
    pub fn build(mut self) -> ConfigurationResult<BeanRegistry> {
        let edges = self.specialization_edges()?;
        detect_cycles(&edges)?;

        let mut folded = HashMap::new();
        for id in self.beans.keys() {
            fold(id, &self.beans, &edges, &mut folded)?;
        }
        for (id, bean) in folded {
            self.beans.insert(id, bean);
        }

        let specializer_of: HashMap<BeanId, BeanId> = edges
            .iter()
            .map(|(specializer, target)| (target.clone(), specializer.clone()))
            .collect();
        let all: BTreeMap<BeanId, Arc<Bean>> = self
            .beans
            .into_iter()
            .map(|(id, bean)| (id, Arc::new(bean)))
            .collect();

        let mut by_raw: HashMap<String, Vec<Arc<Bean>>> = HashMap::new();
        let mut by_name: HashMap<String, Vec<Arc<Bean>>> = HashMap::new();
        for bean in all.values() {
            if specializer_of.contains_key(&bean.id) {
                debug!("Bean {} 已被 {} 特化，不参与查找", bean.id, specializer_of[&bean.id]);
                continue;
            }
            let raws: BTreeSet<&str> = bean.types.iter().map(|ty| ty.raw.as_str()).collect();
            for raw in raws {
                by_raw.entry(raw.to_string()).or_default().push(Arc::clone(bean));
            }
            if let Some(name) = &bean.name {
                by_name.entry(name.clone()).or_default().push(Arc::clone(bean));
            }
        }

        let registry = BeanRegistry {
            matcher: self.matcher,
            all,
            by_raw,
            by_name,
            specializer_of,
        };
        registry.check_footprints(self.strict_footprints)?;
        info!(
            "Bean 注册表构建完成: {} 个 Bean, {} 个特化关系",
            registry.all.len(),
            registry.specializer_of.len()
        );
        Ok(registry)
    }

    /// 特化边：特化者 -> 被特化者。未启用的备选实现不参与特化
    fn specialization_edges(&self) -> ConfigurationResult<BTreeMap<BeanId, BeanId>> {
        let mut edges = BTreeMap::new();
        let mut claimed: HashMap<&BeanId, &BeanId> = HashMap::new();
        for bean in self.beans.values() {
            let Some(target) = &bean.specializes else {
                continue;
            };
            if !bean.is_enabled() {
                debug!("未启用的备选实现 {} 不特化 {}", bean.id, target);
                continue;
            }
            if !self.beans.contains_key(target) {
                return Err(ConfigurationError::UnknownSpecializationTarget {
                    bean: bean.id.to_string(),
                    target: target.to_string(),
                });
            }
            if let Some(existing) = claimed.insert(target, &bean.id) {
                return Err(ConfigurationError::InconsistentSpecialization {
                    target: target.to_string(),
                    specializers: format!("{}, {}", existing, bean.id),
                });
            }
            edges.insert(bean.id.clone(), target.clone());
        }
        Ok(edges)
    }
}

fn detect_cycles(edges: &BTreeMap<BeanId, BeanId>) -> ConfigurationResult<()> {
    let mut cleared: HashSet<&BeanId> = HashSet::new();
    for start in edges.keys() {
        let mut chain = vec![start];
        let mut current = start;
        while let Some(next) = edges.get(current) {
            if cleared.contains(next) {
                break;
            }
            if chain.contains(&next) {
                chain.push(next);
                return Err(ConfigurationError::SpecializationCycle {
                    chain: chain
                        .iter()
                        .map(ToString::to_string)
                        .collect::<Vec<_>>()
                        .join(" -> "),
                });
            }
            chain.push(next);
            current = next;
        }
        cleared.extend(chain);
    }
    Ok(())
}

/// 把被特化 Bean（已递归合并）的限定符、名称与类型并入特化者
fn fold(
    id: &BeanId,
    beans: &BTreeMap<BeanId, Bean>,
    edges: &BTreeMap<BeanId, BeanId>,
    folded: &mut HashMap<BeanId, Bean>,
) -> ConfigurationResult<Bean> {
    if let Some(bean) = folded.get(id) {
        return Ok(bean.clone());
    }
    let mut bean = beans[id].clone();
    if let Some(target) = edges.get(id) {
        let specialized = fold(target, beans, edges, folded)?;
        if let Some(inherited) = &specialized.name {
            match &bean.name {
                Some(declared) if declared != inherited => {
                    return Err(ConfigurationError::ConflictingSpecializedName {
                        bean: bean.id.to_string(),
                        declared: declared.clone(),
                        inherited: inherited.clone(),
                    });
                }
                _ => bean.name = Some(inherited.clone()),
            }
        }
        bean.qualifiers.extend(specialized.qualifiers.iter().cloned());
        bean.types.extend(specialized.types.iter().cloned());
        debug!("Bean {} 特化 {}，合并后限定符: {:?}", bean.id, target, bean.qualifiers);
    }
    folded.insert(id.clone(), bean.clone());
    Ok(bean)
}

/// 只读的 Bean 注册表
#[derive(Debug)]
pub struct BeanRegistry {
    matcher: TypeMatcher,
    all: BTreeMap<BeanId, Arc<Bean>>,
    by_raw: HashMap<String, Vec<Arc<Bean>>>,
    by_name: HashMap<String, Vec<Arc<Bean>>>,
    /// 被特化者 -> 直接特化者
    specializer_of: HashMap<BeanId, BeanId>,
}

impl BeanRegistry {
    pub fn matcher(&self) -> &TypeMatcher {
        &self.matcher
    }

    /// 与请求类型原始类型相同的全部可查找 Bean，用于报告近似候选
    pub fn find_by_raw(&self, raw: &str) -> Vec<Arc<Bean>> {
        self.by_raw.get(raw).cloned().unwrap_or_default()
    }

    /// 沿特化链找到最终的特化者
    pub fn most_specialized(&self, bean: &Arc<Bean>) -> Arc<Bean> {
        let mut current = Arc::clone(bean);
        let mut visited = HashSet::new();
        while let Some(next) = self.specializer_of.get(&current.id) {
            if !visited.insert(next.clone()) {
                break;
            }
            match self.all.get(next) {
                Some(specializer) => current = Arc::clone(specializer),
                None => break,
            }
        }
        current
    }

    /// 是否被其他 Bean 特化
    pub fn is_specialized(&self, id: &BeanId) -> bool {
        self.specializer_of.contains_key(id)
    }

    pub fn len(&self) -> usize {
        self.all.len()
    }

    pub fn is_empty(&self) -> bool {
        self.all.is_empty()
    }

    /// 可查找 Bean 中重复的 (类型, 限定符) 组合
    fn check_footprints(&self, strict: bool) -> ConfigurationResult<()> {
        let mut seen: HashMap<(&BTreeSet<ContractType>, &BTreeSet<Qualifier>), &BeanId> =
            HashMap::new();
        for bean in self.all.values() {
            if self.is_specialized(&bean.id) || bean.is_alternative() {
                continue;
            }
            let Some(first) = seen.insert((&bean.types, &bean.qualifiers), &bean.id) else {
                continue;
            };
            let error = ConfigurationError::DuplicateFootprint {
                footprint: footprint(bean),
                first: first.to_string(),
                second: bean.id.to_string(),
            };
            if strict {
                return Err(error);
            }
            warn!("{}，将在解析时报告歧义", error);
        }
        Ok(())
    }
}

fn footprint(bean: &Bean) -> String {
    let types: Vec<String> = bean.types.iter().map(ToString::to_string).collect();
    let qualifiers: Vec<String> = bean.qualifiers.iter().map(ToString::to_string).collect();
    format!("({}) [{}]", types.join(", "), qualifiers.join(", "))
}

impl BeanLookup for BeanRegistry {
    fn find_by_type(&self, ty: &ContractType) -> Vec<Arc<Bean>> {
        self.by_raw
            .get(&ty.raw)
            .map(|beans| {
                beans
                    .iter()
                    .filter(|bean| self.matcher.matches_any(ty, &bean.types))
                    .cloned()
                    .collect()
            })
            .unwrap_or_default()
    }

    fn find_by_name(&self, name: &str) -> Vec<Arc<Bean>> {
        self.by_name.get(name).cloned().unwrap_or_default()
    }

    fn bean(&self, id: &BeanId) -> Option<Arc<Bean>> {
        self.all.get(id).cloned()
    }

    fn beans(&self) -> Vec<Arc<Bean>> {
        self.all.values().cloned().collect()
    }

    fn specializer_of(&self, id: &BeanId) -> Option<Arc<Bean>> {
        self.specializer_of
            .get(id)
            .and_then(|specializer| self.all.get(specializer))
            .cloned()
    }
}
