//! 作用域与生命周期阶段

use serde::{Deserialize, Serialize};
use std::fmt;

/// Bean 作用域
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ScopeKind {
    /// 依赖作用域 - 实例跟随注入它的对象
    Dependent,
    /// 单例 - 不经过客户端代理的全局唯一实例
    Singleton,
    /// 应用作用域
    Application,
    /// 请求作用域
    Request,
    /// 会话作用域
    Session,
    /// 自定义作用域
    Custom(String),
}

impl Default for ScopeKind {
    fn default() -> Self {
        Self::Dependent
    }
}

impl ScopeKind {
    /// 是否为正常作用域（需要客户端代理）
    pub fn is_normal(&self) -> bool {
        !matches!(self, Self::Dependent | Self::Singleton)
    }
}

impl fmt::Display for ScopeKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Dependent => write!(f, "dependent"),
            Self::Singleton => write!(f, "singleton"),
            Self::Application => write!(f, "application"),
            Self::Request => write!(f, "request"),
            Self::Session => write!(f, "session"),
            Self::Custom(name) => write!(f, "{}", name),
        }
    }
}

impl std::str::FromStr for ScopeKind {
    type Err = std::convert::Infallible;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Ok(match s.to_lowercase().as_str() {
            "dependent" => Self::Dependent,
            "singleton" => Self::Singleton,
            "application" => Self::Application,
            "request" => Self::Request,
            "session" => Self::Session,
            _ => Self::Custom(s.to_string()),
        })
    }
}

/// 生命周期回调阶段
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LifecyclePhase {
    /// 构造环绕
    AroundConstruct,
    /// 构造完成后
    PostConstruct,
    /// 销毁前
    PreDestroy,
}

impl LifecyclePhase {
    /// 全部生命周期阶段
    pub const ALL: [LifecyclePhase; 3] = [
        LifecyclePhase::AroundConstruct,
        LifecyclePhase::PostConstruct,
        LifecyclePhase::PreDestroy,
    ];
}

/// 拦截能力
///
/// 拦截器声明自己参与哪些阶段：业务方法调用或特定的生命周期阶段
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum InterceptionKind {
    /// 业务方法环绕
    AroundInvoke,
    AroundConstruct,
    PostConstruct,
    PreDestroy,
}

impl InterceptionKind {
    /// 对应的生命周期阶段
    pub fn lifecycle_phase(self) -> Option<LifecyclePhase> {
        match self {
            Self::AroundInvoke => None,
            Self::AroundConstruct => Some(LifecyclePhase::AroundConstruct),
            Self::PostConstruct => Some(LifecyclePhase::PostConstruct),
            Self::PreDestroy => Some(LifecyclePhase::PreDestroy),
        }
    }
}

impl From<LifecyclePhase> for InterceptionKind {
    fn from(phase: LifecyclePhase) -> Self {
        match phase {
            LifecyclePhase::AroundConstruct => Self::AroundConstruct,
            LifecyclePhase::PostConstruct => Self::PostConstruct,
            LifecyclePhase::PreDestroy => Self::PreDestroy,
        }
    }
}

impl fmt::Display for InterceptionKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::AroundInvoke => "around_invoke",
            Self::AroundConstruct => "around_construct",
            Self::PostConstruct => "post_construct",
            Self::PreDestroy => "pre_destroy",
        };
        write!(f, "{}", name)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_scope_from_str() {
        assert_eq!("Singleton".parse::<ScopeKind>().unwrap(), ScopeKind::Singleton);
        assert_eq!("request".parse::<ScopeKind>().unwrap(), ScopeKind::Request);
        assert_eq!(
            "conversation".parse::<ScopeKind>().unwrap(),
            ScopeKind::Custom("conversation".to_string())
        );
        assert!(ScopeKind::Request.is_normal());
        assert!(!ScopeKind::Dependent.is_normal());
    }

    #[test]
    fn test_phase_kind_mapping() {
        for phase in LifecyclePhase::ALL {
            assert_eq!(InterceptionKind::from(phase).lifecycle_phase(), Some(phase));
        }
        assert_eq!(InterceptionKind::AroundInvoke.lifecycle_phase(), None);
    }
}
