//! 标记（限定符 / 拦截器绑定 / stereotype）
//!
//! 标记以不可变值对象表示：种类 + 成员映射。两个同种类标记相等，当且仅当
//! 它们的绑定成员相等，nonbinding 成员不参与比较。

use crate::errors::{ConfigurationError, ConfigurationResult};
use crate::lifecycle::ScopeKind;
use once_cell::sync::Lazy;
use serde::{Deserialize, Serialize};
use std::cmp::Ordering;
use std::collections::BTreeMap;
use std::fmt;
use std::hash::{Hash, Hasher};
use std::sync::Arc;

/// 内置默认限定符
pub const DEFAULT_QUALIFIER: &str = "Default";
/// 内置通配限定符
pub const ANY_QUALIFIER: &str = "Any";
/// 内置名称限定符
pub const NAMED_QUALIFIER: &str = "Named";

/// 标记类别
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MarkerCategory {
    /// 限定符
    Qualifier,
    /// 拦截器绑定
    InterceptorBinding,
}

impl fmt::Display for MarkerCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Qualifier => write!(f, "限定符"),
            Self::InterceptorBinding => write!(f, "拦截器绑定"),
        }
    }
}

/// 标记成员值
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(untagged)]
pub enum MemberValue {
    Bool(bool),
    Int(i64),
    Str(String),
    Array(Vec<MemberValue>),
    Marker(MarkerLiteral),
}

impl fmt::Display for MemberValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Bool(value) => write!(f, "{}", value),
            Self::Int(value) => write!(f, "{}", value),
            Self::Str(value) => write!(f, "{:?}", value),
            Self::Array(values) => {
                write!(f, "[")?;
                for (index, value) in values.iter().enumerate() {
                    if index > 0 {
                        write!(f, ", ")?;
                    }
                    write!(f, "{}", value)?;
                }
                write!(f, "]")
            }
            Self::Marker(literal) => write!(f, "{}", literal),
        }
    }
}

impl From<&str> for MemberValue {
    fn from(value: &str) -> Self {
        Self::Str(value.to_string())
    }
}

impl From<String> for MemberValue {
    fn from(value: String) -> Self {
        Self::Str(value)
    }
}

impl From<i64> for MemberValue {
    fn from(value: i64) -> Self {
        Self::Int(value)
    }
}

impl From<bool> for MemberValue {
    fn from(value: bool) -> Self {
        Self::Bool(value)
    }
}

/// 成员值的形态
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MemberType {
    #[default]
    Scalar,
    Array,
    Marker,
}

/// 成员定义
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct MemberDef {
    #[serde(default)]
    pub kind: MemberType,
    /// 是否忽略该成员的相等性比较
    #[serde(default)]
    pub nonbinding: bool,
    #[serde(default)]
    pub default: Option<MemberValue>,
}

impl MemberDef {
    /// 标量成员
    pub fn scalar() -> Self {
        Self::default()
    }

    /// 数组成员
    pub fn array() -> Self {
        Self {
            kind: MemberType::Array,
            ..Self::default()
        }
    }

    /// 标记成员
    pub fn marker() -> Self {
        Self {
            kind: MemberType::Marker,
            ..Self::default()
        }
    }

    /// 标记为 nonbinding
    pub fn nonbinding(mut self) -> Self {
        self.nonbinding = true;
        self
    }

    /// 设置默认值
    pub fn with_default(mut self, value: impl Into<MemberValue>) -> Self {
        self.default = Some(value.into());
        self
    }
}

/// 标记种类定义
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MarkerKind {
    /// 种类名称
    pub name: String,
    /// 类别
    pub category: MarkerCategory,
    /// 成员定义
    #[serde(default)]
    pub members: BTreeMap<String, MemberDef>,
    /// 该绑定自身携带的拦截器绑定（传递生效）
    #[serde(default)]
    pub inherited_bindings: Vec<MarkerLiteral>,
}

impl MarkerKind {
    /// 定义限定符种类
    pub fn qualifier(name: impl Into<String>) -> Self {
        Self::new(name, MarkerCategory::Qualifier)
    }

    /// 定义拦截器绑定种类
    pub fn interceptor_binding(name: impl Into<String>) -> Self {
        Self::new(name, MarkerCategory::InterceptorBinding)
    }

    fn new(name: impl Into<String>, category: MarkerCategory) -> Self {
        Self {
            name: name.into(),
            category,
            members: BTreeMap::new(),
            inherited_bindings: Vec::new(),
        }
    }

    /// 添加成员定义
    pub fn with_member(mut self, name: impl Into<String>, def: MemberDef) -> Self {
        self.members.insert(name.into(), def);
        self
    }

    /// 添加传递的拦截器绑定
    pub fn inherits(mut self, binding: MarkerLiteral) -> Self {
        self.inherited_bindings.push(binding);
        self
    }

    /// 成员是否参与相等性比较
    ///
    /// 未定义的成员视为绑定成员
    pub fn is_binding_member(&self, member: &str) -> bool {
        self.members.get(member).map_or(true, |def| !def.nonbinding)
    }

    /// 校验种类定义：数组/标记类型的成员必须声明为 nonbinding
    pub fn validate(&self) -> ConfigurationResult<()> {
        for (member, def) in &self.members {
            if matches!(def.kind, MemberType::Array | MemberType::Marker) && !def.nonbinding {
                return Err(ConfigurationError::NonbindingRequired {
                    kind: self.name.clone(),
                    member: member.clone(),
                });
            }
        }
        Ok(())
    }
}

/// 标记字面量
///
/// 发现协作方提供的未解析形式，只记录种类名称和显式给出的成员值
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(from = "MarkerLiteralRepr")]
pub struct MarkerLiteral {
    pub kind: String,
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub members: BTreeMap<String, MemberValue>,
}

impl MarkerLiteral {
    /// 创建无成员的字面量
    pub fn new(kind: impl Into<String>) -> Self {
        Self {
            kind: kind.into(),
            members: BTreeMap::new(),
        }
    }

    /// 设置成员值
    pub fn with(mut self, member: impl Into<String>, value: impl Into<MemberValue>) -> Self {
        self.members.insert(member.into(), value.into());
        self
    }
}

impl fmt::Display for MarkerLiteral {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write_marker(f, &self.kind, self.members.iter())
    }
}

#[derive(Deserialize)]
#[serde(untagged)]
enum MarkerLiteralRepr {
    Text(String),
    Structured {
        kind: String,
        #[serde(default)]
        members: BTreeMap<String, MemberValue>,
    },
}

impl From<MarkerLiteralRepr> for MarkerLiteral {
    fn from(repr: MarkerLiteralRepr) -> Self {
        match repr {
            MarkerLiteralRepr::Text(kind) => Self::new(kind),
            MarkerLiteralRepr::Structured { kind, members } => Self { kind, members },
        }
    }
}

fn write_marker<'a>(
    f: &mut fmt::Formatter<'_>,
    kind: &str,
    members: impl Iterator<Item = (&'a String, &'a MemberValue)>,
) -> fmt::Result {
    write!(f, "@{}", kind)?;
    let mut members = members.peekable();
    if members.peek().is_some() {
        write!(f, "(")?;
        for (index, (name, value)) in members.enumerate() {
            if index > 0 {
                write!(f, ", ")?;
            }
            write!(f, "{}={}", name, value)?;
        }
        write!(f, ")")?;
    }
    Ok(())
}

/// 已解析的标记
///
/// 持有种类定义，相等性与哈希只考虑种类名称和绑定成员
#[derive(Clone)]
pub struct Marker {
    kind: Arc<MarkerKind>,
    members: BTreeMap<String, MemberValue>,
}

/// 限定符
pub type Qualifier = Marker;
/// 拦截器绑定
pub type InterceptorBinding = Marker;

static DEFAULT_KIND: Lazy<Arc<MarkerKind>> =
    Lazy::new(|| Arc::new(MarkerKind::qualifier(DEFAULT_QUALIFIER)));
static ANY_KIND: Lazy<Arc<MarkerKind>> =
    Lazy::new(|| Arc::new(MarkerKind::qualifier(ANY_QUALIFIER)));
static NAMED_KIND: Lazy<Arc<MarkerKind>> = Lazy::new(|| {
    Arc::new(
        MarkerKind::qualifier(NAMED_QUALIFIER)
            .with_member("value", MemberDef::scalar().with_default("")),
    )
});

impl Marker {
    /// 按种类定义创建标记，并填充成员默认值
    pub fn new(kind: Arc<MarkerKind>) -> Self {
        let members = kind
            .members
            .iter()
            .filter_map(|(name, def)| def.default.clone().map(|value| (name.clone(), value)))
            .collect();
        Self { kind, members }
    }

    /// 设置成员值
    pub fn with_member(mut self, member: impl Into<String>, value: impl Into<MemberValue>) -> Self {
        self.members.insert(member.into(), value.into());
        self
    }

    /// 内置 `@Default` 限定符
    pub fn default_qualifier() -> Self {
        Self::new(Arc::clone(&*DEFAULT_KIND))
    }

    /// 内置 `@Any` 限定符
    pub fn any() -> Self {
        Self::new(Arc::clone(&*ANY_KIND))
    }

    /// 内置 `@Named` 限定符
    pub fn named(value: impl Into<String>) -> Self {
        Self::new(Arc::clone(&*NAMED_KIND)).with_member("value", MemberValue::Str(value.into()))
    }

    /// 种类定义
    pub fn kind(&self) -> &Arc<MarkerKind> {
        &self.kind
    }

    /// 种类名称
    pub fn kind_name(&self) -> &str {
        &self.kind.name
    }

    /// 类别
    pub fn category(&self) -> MarkerCategory {
        self.kind.category
    }

    /// 成员值
    pub fn member(&self, name: &str) -> Option<&MemberValue> {
        self.members.get(name)
    }

    /// 是否为 `@Default`
    pub fn is_default(&self) -> bool {
        self.kind.name == DEFAULT_QUALIFIER
    }

    /// 是否为 `@Any`
    pub fn is_any(&self) -> bool {
        self.kind.name == ANY_QUALIFIER
    }

    /// 是否为 `@Named`
    pub fn is_named(&self) -> bool {
        self.kind.name == NAMED_QUALIFIER
    }

    /// 转换回字面量形式
    pub fn literal(&self) -> MarkerLiteral {
        MarkerLiteral {
            kind: self.kind.name.clone(),
            members: self.members.clone(),
        }
    }

    fn binding_members(&self) -> impl Iterator<Item = (&String, &MemberValue)> {
        self.members
            .iter()
            .filter(|(name, _)| self.kind.is_binding_member(name))
    }
}

impl PartialEq for Marker {
    fn eq(&self, other: &Self) -> bool {
        self.kind.name == other.kind.name && self.binding_members().eq(other.binding_members())
    }
}

impl Eq for Marker {}

impl Hash for Marker {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.kind.name.hash(state);
        for (name, value) in self.binding_members() {
            name.hash(state);
            value.hash(state);
        }
    }
}

impl PartialOrd for Marker {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for Marker {
    fn cmp(&self, other: &Self) -> Ordering {
        self.kind
            .name
            .cmp(&other.kind.name)
            .then_with(|| self.binding_members().cmp(other.binding_members()))
    }
}

impl fmt::Display for Marker {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write_marker(f, &self.kind.name, self.members.iter())
    }
}

impl fmt::Debug for Marker {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self)
    }
}

/// Stereotype 定义
///
/// 可复用的默认作用域、限定符、拦截器绑定组合，可以嵌套其他 stereotype
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct StereotypeDefinition {
    pub name: String,
    #[serde(default)]
    pub default_scope: Option<ScopeKind>,
    #[serde(default)]
    pub qualifiers: Vec<MarkerLiteral>,
    #[serde(default)]
    pub interceptor_bindings: Vec<MarkerLiteral>,
    /// 嵌套的 stereotype
    #[serde(default)]
    pub stereotypes: Vec<String>,
    /// 携带该 stereotype 的 Bean 是否为备选实现
    #[serde(default)]
    pub alternative: bool,
    /// 携带该 stereotype 的 Bean 是否获得默认名称
    #[serde(default)]
    pub named: bool,
}

impl StereotypeDefinition {
    /// 创建 stereotype 定义
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            ..Self::default()
        }
    }

    /// 设置默认作用域
    pub fn with_scope(mut self, scope: ScopeKind) -> Self {
        self.default_scope = Some(scope);
        self
    }

    /// 添加限定符
    pub fn with_qualifier(mut self, qualifier: MarkerLiteral) -> Self {
        self.qualifiers.push(qualifier);
        self
    }

    /// 添加拦截器绑定
    pub fn with_binding(mut self, binding: MarkerLiteral) -> Self {
        self.interceptor_bindings.push(binding);
        self
    }

    /// 嵌套 stereotype
    pub fn with_stereotype(mut self, name: impl Into<String>) -> Self {
        self.stereotypes.push(name.into());
        self
    }

    /// 标记为备选
    pub fn alternative(mut self) -> Self {
        self.alternative = true;
        self
    }

    /// 赋予默认名称
    pub fn named(mut self) -> Self {
        self.named = true;
        self
    }
}

/// 标记目录
///
/// 持有标记种类与 stereotype 定义，负责把字面量解析为标记
#[derive(Debug, Clone)]
pub struct MarkerCatalog {
    kinds: BTreeMap<String, Arc<MarkerKind>>,
    stereotypes: BTreeMap<String, StereotypeDefinition>,
}

impl MarkerCatalog {
    /// 创建包含内置限定符的目录
    pub fn new() -> Self {
        let kinds = [&DEFAULT_KIND, &ANY_KIND, &NAMED_KIND]
            .into_iter()
            .map(|kind| (kind.name.clone(), Arc::clone(&**kind)))
            .collect();
        Self {
            kinds,
            stereotypes: BTreeMap::new(),
        }
    }

    /// 注册标记种类
    ///
    /// 内置的 `@Default`、`@Any`、`@Named` 不能被重新定义
    pub fn register_kind(&mut self, kind: MarkerKind) -> ConfigurationResult<Arc<MarkerKind>> {
        kind.validate()?;
        if [DEFAULT_QUALIFIER, ANY_QUALIFIER, NAMED_QUALIFIER].contains(&kind.name.as_str()) {
            return Err(ConfigurationError::BuiltinMarkerRedefined { kind: kind.name });
        }
        if self.kinds.contains_key(&kind.name) {
            tracing::warn!("标记种类被重新定义: @{}", kind.name);
        }
        let kind = Arc::new(kind);
        self.kinds.insert(kind.name.clone(), Arc::clone(&kind));
        Ok(kind)
    }

    /// 注册 stereotype
    pub fn register_stereotype(&mut self, stereotype: StereotypeDefinition) {
        self.stereotypes.insert(stereotype.name.clone(), stereotype);
    }

    /// 查找标记种类
    pub fn kind(&self, name: &str) -> Option<&Arc<MarkerKind>> {
        self.kinds.get(name)
    }

    /// 查找 stereotype
    pub fn stereotype(&self, name: &str) -> Option<&StereotypeDefinition> {
        self.stereotypes.get(name)
    }

    /// 全部 stereotype
    pub fn stereotypes(&self) -> impl Iterator<Item = &StereotypeDefinition> {
        self.stereotypes.values()
    }

    /// 把字面量解析为标记
    pub fn resolve(
        &self,
        literal: &MarkerLiteral,
        expected: MarkerCategory,
    ) -> ConfigurationResult<Marker> {
        let kind = self
            .kinds
            .get(&literal.kind)
            .ok_or_else(|| ConfigurationError::UnknownMarkerKind {
                kind: literal.kind.clone(),
            })?;
        if kind.category != expected {
            return Err(ConfigurationError::WrongMarkerCategory {
                kind: literal.kind.clone(),
                expected: expected.to_string(),
            });
        }

        if let Some(member) = literal
            .members
            .keys()
            .find(|member| !kind.members.contains_key(*member))
        {
            return Err(ConfigurationError::UnknownMarkerMember {
                kind: literal.kind.clone(),
                member: member.clone(),
            });
        }

        let mut members = BTreeMap::new();
        for (name, def) in &kind.members {
            let value = literal
                .members
                .get(name)
                .or(def.default.as_ref())
                .ok_or_else(|| ConfigurationError::MissingMarkerMember {
                    kind: literal.kind.clone(),
                    member: name.clone(),
                })?;
            members.insert(name.clone(), value.clone());
        }

        Ok(Marker {
            kind: Arc::clone(kind),
            members,
        })
    }

    /// 批量解析字面量
    pub fn resolve_all(
        &self,
        literals: &[MarkerLiteral],
        expected: MarkerCategory,
    ) -> ConfigurationResult<Vec<Marker>> {
        literals
            .iter()
            .map(|literal| self.resolve(literal, expected))
            .collect()
    }

    /// 按种类名称解析无成员的限定符
    pub fn qualifier(&self, kind: &str) -> ConfigurationResult<Qualifier> {
        self.resolve(&MarkerLiteral::new(kind), MarkerCategory::Qualifier)
    }

    /// 按种类名称解析无成员的拦截器绑定
    pub fn binding(&self, kind: &str) -> ConfigurationResult<InterceptorBinding> {
        self.resolve(&MarkerLiteral::new(kind), MarkerCategory::InterceptorBinding)
    }
}

impl Default for MarkerCatalog {
    fn default() -> Self {
        Self::new()
    }
}
