//! 容器配置模型
//!
//! 对应配置文件中的 `[container]` 与 `[enablement]` 两节

use serde::{Deserialize, Serialize};

/// 容器配置
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ContainerSettings {
    /// 容器选项
    pub container: ContainerOptions,
    /// 启用列表
    pub enablement: EnablementSettings,
}

/// 容器选项
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ContainerOptions {
    /// 启动时计算全部拦截计划
    pub eager_planning: bool,
    /// 缓存 (类型, 限定符) -> Bean 的解析结果
    pub resolution_cache: bool,
    /// 构建期拒绝重复的 (类型, 限定符) 注册，否则推迟到解析时报告歧义
    pub strict_footprints: bool,
}

impl Default for ContainerOptions {
    fn default() -> Self {
        Self {
            eager_planning: true,
            resolution_cache: true,
            strict_footprints: false,
        }
    }
}

/// 启用列表
///
/// 列表顺序即全局顺序
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct EnablementSettings {
    /// 拦截器，越靠前越外层
    pub interceptors: Vec<String>,
    /// 装饰器，越靠后越靠近目标
    pub decorators: Vec<String>,
    /// 已启用的备选实现（类名或 stereotype 名），越靠前优先级越高
    pub alternatives: Vec<String>,
    /// 被禁用的类，从上面三个列表中剔除
    pub disabled: Vec<String>,
}

impl EnablementSettings {
    /// 剔除禁用类后的拦截器列表
    pub fn active_interceptors(&self) -> Vec<&str> {
        self.active(&self.interceptors)
    }

    /// 剔除禁用类后的装饰器列表
    pub fn active_decorators(&self) -> Vec<&str> {
        self.active(&self.decorators)
    }

    /// 剔除禁用类后的备选实现列表
    pub fn active_alternatives(&self) -> Vec<&str> {
        self.active(&self.alternatives)
    }

    /// 是否被禁用
    pub fn is_disabled(&self, class: &str) -> bool {
        self.disabled.iter().any(|disabled| disabled == class)
    }

    fn active<'a>(&'a self, classes: &'a [String]) -> Vec<&'a str> {
        classes
            .iter()
            .map(String::as_str)
            .filter(|class| !self.is_disabled(class))
            .collect()
    }
}

impl ContainerSettings {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_interceptor(mut self, class: impl Into<String>) -> Self {
        self.enablement.interceptors.push(class.into());
        self
    }

    pub fn with_decorator(mut self, class: impl Into<String>) -> Self {
        self.enablement.decorators.push(class.into());
        self
    }

    pub fn with_alternative(mut self, class: impl Into<String>) -> Self {
        self.enablement.alternatives.push(class.into());
        self
    }

    pub fn with_disabled(mut self, class: impl Into<String>) -> Self {
        self.enablement.disabled.push(class.into());
        self
    }

    pub fn with_strict_footprints(mut self, strict: bool) -> Self {
        self.container.strict_footprints = strict;
        self
    }

    pub fn with_eager_planning(mut self, eager: bool) -> Self {
        self.container.eager_planning = eager;
        self
    }

    pub fn with_resolution_cache(mut self, enabled: bool) -> Self {
        self.container.resolution_cache = enabled;
        self
    }
}
