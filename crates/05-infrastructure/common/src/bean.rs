//! 已解析的 Bean 记录

use crate::discovery::BeanId;
use crate::lifecycle::ScopeKind;
use crate::markers::Qualifier;
use crate::metadata::ContractType;
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use std::fmt;

/// Bean 角色
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BeanRole {
    /// 普通托管 Bean，参与类型解析
    Managed,
    /// 拦截器
    Interceptor,
    /// 装饰器
    Decorator,
}

/// 备选实现的选择状态
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Selection {
    /// 非备选实现
    Default,
    /// 已启用的备选实现，precedence 越大越优先
    Alternative { precedence: i64 },
    /// 未启用的备选实现
    DisabledAlternative,
}

impl Selection {
    pub fn is_enabled(&self) -> bool {
        !matches!(self, Self::DisabledAlternative)
    }
}

/// Bean 记录
///
/// 由注册表在构建期产出：stereotype 已展开，默认限定符已补全，
/// 特化链上的限定符和名称已合并到特化者
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Bean {
    pub id: BeanId,
    pub bean_class: String,
    /// 类型闭包
    pub types: BTreeSet<ContractType>,
    /// 有效限定符集合
    #[serde(serialize_with = "serialize_markers")]
    pub qualifiers: BTreeSet<Qualifier>,
    pub scope: ScopeKind,
    pub name: Option<String>,
    pub role: BeanRole,
    pub selection: Selection,
    /// 直接特化的 Bean
    pub specializes: Option<BeanId>,
    /// 展开后的 stereotype 名称
    pub stereotypes: Vec<String>,
}

impl Bean {
    /// 是否为备选实现（无论是否启用）
    pub fn is_alternative(&self) -> bool {
        !matches!(self.selection, Selection::Default)
    }

    /// 是否参与解析
    pub fn is_enabled(&self) -> bool {
        self.selection.is_enabled()
    }

    /// 已启用备选实现的优先级
    pub fn precedence(&self) -> Option<i64> {
        match self.selection {
            Selection::Alternative { precedence } => Some(precedence),
            _ => None,
        }
    }

    /// 是否暴露给定类型
    pub fn has_type(&self, ty: &ContractType) -> bool {
        self.types.contains(ty)
    }

    /// 用于错误信息的简短描述
    pub fn describe(&self) -> String {
        let qualifiers = self
            .qualifiers
            .iter()
            .map(ToString::to_string)
            .collect::<Vec<_>>()
            .join(", ");
        let mut text = format!("{} ({}) [{}]", self.id, self.bean_class, qualifiers);
        if let Some(name) = &self.name {
            text.push_str(&format!(" name={}", name));
        }
        match self.selection {
            Selection::Default => {}
            Selection::Alternative { precedence } => {
                text.push_str(&format!(" alternative(precedence={})", precedence));
            }
            Selection::DisabledAlternative => text.push_str(" alternative(disabled)"),
        }
        text
    }
}

impl fmt::Display for Bean {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.describe())
    }
}

fn serialize_markers<S>(markers: &BTreeSet<Qualifier>, serializer: S) -> Result<S::Ok, S::Error>
where
    S: serde::Serializer,
{
    serializer.collect_seq(markers.iter().map(|marker| marker.literal()))
}
