//! 拦截器 / 装饰器 / 备选实现的启用顺序
//!
//! 启用列表的位置是权威顺序：拦截器越早启用越靠外，装饰器越晚启用越靠近目标

use crate::bindings::{DecoratorModel, InterceptorModel};
use infrastructure_common::{
    BeanDeclaration, ConfigurationError, ConfigurationResult, EnablementSettings, Selection,
    StereotypeDefinition,
};
use std::cmp::Ordering;
use std::collections::HashMap;
use tracing::debug;

/// 有序启用列表
#[derive(Debug, Clone)]
pub struct EnablementList {
    kind: &'static str,
    classes: Vec<String>,
    positions: HashMap<String, usize>,
}

impl EnablementList {
    /// 创建空列表，`kind` 用于错误信息
    pub fn new(kind: &'static str) -> Self {
        Self {
            kind,
            classes: Vec::new(),
            positions: HashMap::new(),
        }
    }

    /// 追加到列表末尾
    pub fn enable(&mut self, class: impl Into<String>) -> ConfigurationResult<()> {
        let class = class.into();
        if self.positions.contains_key(&class) {
            return Err(ConfigurationError::DuplicateEnablement {
                kind: self.kind.to_string(),
                class,
            });
        }
        self.positions.insert(class.clone(), self.classes.len());
        self.classes.push(class);
        Ok(())
    }

    /// 列表位置，未启用的类是错误
    pub fn position(&self, class: &str) -> ConfigurationResult<usize> {
        self.positions
            .get(class)
            .copied()
            .ok_or_else(|| ConfigurationError::NotEnabled {
                kind: self.kind.to_string(),
                class: class.to_string(),
            })
    }

    /// 按列表位置比较两个类
    pub fn compare(&self, a: &str, b: &str) -> ConfigurationResult<Ordering> {
        Ok(self.position(a)?.cmp(&self.position(b)?))
    }

    pub fn is_enabled(&self, class: &str) -> bool {
        self.positions.contains_key(class)
    }

    /// 按启用顺序排列的类
    pub fn classes(&self) -> &[String] {
        &self.classes
    }

    pub fn len(&self) -> usize {
        self.classes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.classes.is_empty()
    }
}

/// 备选实现的选择规则
///
/// 启用列表中的备选实现优先于只声明了优先级的备选实现，列表中越靠前优先级越高
#[derive(Debug, Clone)]
pub struct AlternativeSelector {
    list: EnablementList,
}

impl Default for AlternativeSelector {
    fn default() -> Self {
        Self {
            list: EnablementList::new("备选实现"),
        }
    }
}

impl AlternativeSelector {
    /// 按列表顺序启用备选实现，重复的名称是错误
    pub fn new(alternatives: &[&str]) -> ConfigurationResult<Self> {
        let mut selector = Self::default();
        for class in alternatives {
            selector.list.enable(*class)?;
        }
        Ok(selector)
    }

    /// 是否列出了给定类名或 stereotype 名
    pub fn lists(&self, name: &str) -> bool {
        self.list.is_enabled(name)
    }

    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.list.classes().iter().map(String::as_str)
    }

    /// 计算 Bean 的选择状态
    pub fn selection(
        &self,
        declaration: &BeanDeclaration,
        stereotypes: &[&StereotypeDefinition],
    ) -> Selection {
        let alternative_stereotypes: Vec<&str> = stereotypes
            .iter()
            .filter(|stereotype| stereotype.alternative)
            .map(|stereotype| stereotype.name.as_str())
            .collect();
        if !declaration.alternative && alternative_stereotypes.is_empty() {
            return Selection::Default;
        }

        let listed = std::iter::once(declaration.bean_class.as_str())
            .chain(alternative_stereotypes)
            .filter_map(|name| self.list.position(name).ok())
            .min();
        match (listed, declaration.priority) {
            // 列表去重后 position < len
            (Some(position), _) => Selection::Alternative {
                precedence: i64::from(i32::MAX) + (self.list.len() - position) as i64,
            },
            (None, Some(priority)) => Selection::Alternative {
                precedence: i64::from(priority),
            },
            (None, None) => Selection::DisabledAlternative,
        }
    }
}

/// 全局启用状态
#[derive(Debug, Clone)]
pub struct Enablement {
    pub interceptors: EnablementList,
    pub decorators: EnablementList,
    pub alternatives: AlternativeSelector,
}

impl Enablement {
    /// 根据配置和已声明的拦截器 / 装饰器构建启用顺序
    ///
    /// 配置列表中的类先按列表顺序启用；未列出但声明了优先级的类随后按优先级升序启用。
    /// 被禁用的类不会启用
    pub fn from_settings(
        settings: &EnablementSettings,
        interceptors: &[InterceptorModel],
        decorators: &[DecoratorModel],
    ) -> ConfigurationResult<Self> {
        let interceptor_priorities: Vec<(&str, Option<i32>)> = interceptors
            .iter()
            .map(|model| (model.class.as_str(), model.priority))
            .collect();
        let decorator_priorities: Vec<(&str, Option<i32>)> = decorators
            .iter()
            .map(|model| (model.class.as_str(), model.priority))
            .collect();

        let enablement = Self {
            interceptors: build_list(
                "拦截器",
                &settings.active_interceptors(),
                &interceptor_priorities,
                settings,
            )?,
            decorators: build_list(
                "装饰器",
                &settings.active_decorators(),
                &decorator_priorities,
                settings,
            )?,
            alternatives: AlternativeSelector::new(&settings.active_alternatives())?,
        };
        debug!(
            "启用拦截器: {:?}, 装饰器: {:?}",
            enablement.interceptors.classes(),
            enablement.decorators.classes()
        );
        Ok(enablement)
    }

    /// 按拦截器启用顺序排列已启用的拦截器
    pub fn order_interceptors(&self, models: &[InterceptorModel]) -> Vec<InterceptorModel> {
        order_by(&self.interceptors, models, |model| &model.class)
    }

    /// 按装饰器启用顺序排列已启用的装饰器
    pub fn order_decorators(&self, models: &[DecoratorModel]) -> Vec<DecoratorModel> {
        order_by(&self.decorators, models, |model| &model.class)
    }
}

fn build_list(
    kind: &'static str,
    listed: &[&str],
    declared: &[(&str, Option<i32>)],
    settings: &EnablementSettings,
) -> ConfigurationResult<EnablementList> {
    let mut list = EnablementList::new(kind);
    for class in listed {
        if !declared.iter().any(|(declared, _)| declared == class) {
            return Err(ConfigurationError::UnknownEnabledClass {
                kind: kind.to_string(),
                class: (*class).to_string(),
            });
        }
        list.enable(*class)?;
    }

    let mut prioritized: Vec<(i32, &str)> = declared
        .iter()
        .filter_map(|(class, priority)| priority.map(|priority| (priority, *class)))
        .filter(|(_, class)| !list.is_enabled(class) && !settings.is_disabled(class))
        .collect();
    prioritized.sort();
    for (_, class) in prioritized {
        list.enable(class)?;
    }
    Ok(list)
}

fn order_by<T: Clone>(list: &EnablementList, models: &[T], class: impl Fn(&T) -> &String) -> Vec<T> {
    let mut enabled: Vec<(usize, &T)> = models
        .iter()
        .filter_map(|model| list.position(class(model)).ok().map(|position| (position, model)))
        .collect();
    enabled.sort_by_key(|(position, _)| *position);
    enabled.into_iter().map(|(_, model)| model.clone()).collect()
}
