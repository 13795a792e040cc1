//! Bean 声明与部署描述
//!
//! 发现协作方以 [`BeanDeclaration`] 的形式提供 Bean，
//! 连同标记种类、stereotype 和类型信息组成一个 [`Deployment`]

use crate::errors::ConfigurationResult;
use crate::lifecycle::{InterceptionKind, LifecyclePhase, ScopeKind};
use crate::markers::{MarkerCatalog, MarkerKind, MarkerLiteral, StereotypeDefinition};
use crate::metadata::{ContractType, MethodSignature, TypeCatalog, TypeDescriptor};
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use std::fmt;

/// Bean 标识
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct BeanId(String);

impl BeanId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for BeanId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<&str> for BeanId {
    fn from(id: &str) -> Self {
        Self::new(id)
    }
}

impl From<String> for BeanId {
    fn from(id: String) -> Self {
        Self(id)
    }
}

/// 方法可见性
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Visibility {
    #[default]
    Public,
    Protected,
    Package,
    Private,
}

/// 业务方法声明
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MethodDeclaration {
    /// 方法签名
    pub signature: MethodSignature,
    /// 方法级拦截器绑定
    #[serde(default)]
    pub interceptor_bindings: Vec<MarkerLiteral>,
    #[serde(default)]
    pub visibility: Visibility,
    #[serde(default, rename = "static")]
    pub is_static: bool,
}

impl MethodDeclaration {
    /// 创建公开的实例方法声明
    pub fn new(signature: MethodSignature) -> Self {
        Self {
            signature,
            interceptor_bindings: Vec::new(),
            visibility: Visibility::Public,
            is_static: false,
        }
    }

    /// 添加方法级拦截器绑定
    pub fn with_binding(mut self, binding: MarkerLiteral) -> Self {
        self.interceptor_bindings.push(binding);
        self
    }

    /// 设置可见性
    pub fn with_visibility(mut self, visibility: Visibility) -> Self {
        self.visibility = visibility;
        self
    }

    /// 标记为静态方法
    pub fn static_method(mut self) -> Self {
        self.is_static = true;
        self
    }

    /// 静态方法和私有方法不会被拦截
    pub fn is_interceptable(&self) -> bool {
        !self.is_static && self.visibility != Visibility::Private
    }
}

/// 装饰器的委托注入点
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DelegatePoint {
    /// 委托类型
    pub contract: ContractType,
    /// 委托限定符，空集合等价于 `@Default`
    #[serde(default)]
    pub qualifiers: Vec<MarkerLiteral>,
}

impl DelegatePoint {
    pub fn new(contract: ContractType) -> Self {
        Self {
            contract,
            qualifiers: Vec::new(),
        }
    }

    pub fn qualified(mut self, qualifier: MarkerLiteral) -> Self {
        self.qualifiers.push(qualifier);
        self
    }
}

/// 拦截器声明
///
/// 拦截器绑定取自类级的 `interceptor_bindings`
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct InterceptorSpec {
    /// 拦截器支持的拦截能力
    #[serde(default)]
    pub kinds: BTreeSet<InterceptionKind>,
}

impl InterceptorSpec {
    pub fn new(kinds: impl IntoIterator<Item = InterceptionKind>) -> Self {
        Self {
            kinds: kinds.into_iter().collect(),
        }
    }

    /// 只拦截业务方法
    pub fn around_invoke() -> Self {
        Self::new([InterceptionKind::AroundInvoke])
    }
}

/// 装饰器声明
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DecoratorSpec {
    /// 委托注入点，必须恰好一个
    #[serde(default)]
    pub delegates: Vec<DelegatePoint>,
    /// 被装饰类型
    ///
    /// 为空时取装饰器类型闭包中除装饰器类本身和 `Object` 外的全部类型
    #[serde(default)]
    pub decorated_types: Vec<ContractType>,
}

impl DecoratorSpec {
    /// 以单个委托注入点创建装饰器声明
    pub fn delegating(delegate: DelegatePoint) -> Self {
        Self {
            delegates: vec![delegate],
            decorated_types: Vec::new(),
        }
    }

    /// 显式声明被装饰类型
    pub fn decorating(mut self, ty: ContractType) -> Self {
        self.decorated_types.push(ty);
        self
    }
}

/// Bean 声明
///
/// 发现协作方提供的原始元数据，尚未经过 stereotype 展开和特化合并
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BeanDeclaration {
    /// Bean 标识，缺省为 Bean 类名
    #[serde(default)]
    pub id: Option<BeanId>,
    /// Bean 类名
    pub bean_class: String,
    /// 声明的类型闭包，Bean 类本身和 `Object` 会自动加入
    #[serde(default)]
    pub types: Vec<ContractType>,
    #[serde(default)]
    pub qualifiers: Vec<MarkerLiteral>,
    /// 显式作用域
    #[serde(default)]
    pub scope: Option<ScopeKind>,
    /// 显式名称
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub alternative: bool,
    /// 备选实现的优先级，声明后即视为已启用
    #[serde(default)]
    pub priority: Option<i32>,
    /// 被特化 Bean 的标识
    #[serde(default)]
    pub specializes: Option<BeanId>,
    #[serde(default)]
    pub stereotypes: Vec<String>,
    /// 类级拦截器绑定
    #[serde(default)]
    pub interceptor_bindings: Vec<MarkerLiteral>,
    /// 业务方法
    #[serde(default)]
    pub methods: Vec<MethodDeclaration>,
    /// 目标类自身声明的生命周期回调
    #[serde(default)]
    pub lifecycle_hooks: BTreeSet<LifecyclePhase>,
    #[serde(default)]
    pub interceptor: Option<InterceptorSpec>,
    #[serde(default)]
    pub decorator: Option<DecoratorSpec>,
}

impl BeanDeclaration {
    /// 创建 Bean 声明
    pub fn new(bean_class: impl Into<String>) -> Self {
        Self {
            id: None,
            bean_class: bean_class.into(),
            types: Vec::new(),
            qualifiers: Vec::new(),
            scope: None,
            name: None,
            alternative: false,
            priority: None,
            specializes: None,
            stereotypes: Vec::new(),
            interceptor_bindings: Vec::new(),
            methods: Vec::new(),
            lifecycle_hooks: BTreeSet::new(),
            interceptor: None,
            decorator: None,
        }
    }

    /// 创建拦截器声明
    pub fn interceptor(
        bean_class: impl Into<String>,
        kinds: impl IntoIterator<Item = InterceptionKind>,
    ) -> Self {
        let mut declaration = Self::new(bean_class);
        declaration.interceptor = Some(InterceptorSpec::new(kinds));
        declaration
    }

    /// 创建装饰器声明
    pub fn decorator(bean_class: impl Into<String>, delegate: DelegatePoint) -> Self {
        let mut declaration = Self::new(bean_class).exposes(delegate.contract.clone());
        declaration.decorator = Some(DecoratorSpec::delegating(delegate));
        declaration
    }

    /// Bean 标识
    pub fn bean_id(&self) -> BeanId {
        self.id
            .clone()
            .unwrap_or_else(|| BeanId::new(self.bean_class.clone()))
    }

    /// 设置标识
    pub fn with_id(mut self, id: impl Into<BeanId>) -> Self {
        self.id = Some(id.into());
        self
    }

    /// 添加暴露的契约类型
    pub fn exposes(mut self, ty: ContractType) -> Self {
        self.types.push(ty);
        self
    }

    /// 添加限定符
    pub fn qualified(mut self, qualifier: MarkerLiteral) -> Self {
        self.qualifiers.push(qualifier);
        self
    }

    /// 设置作用域
    pub fn with_scope(mut self, scope: ScopeKind) -> Self {
        self.scope = Some(scope);
        self
    }

    /// 设置名称
    pub fn named(mut self, name: impl Into<String>) -> Self {
        self.name = Some(name.into());
        self
    }

    /// 标记为备选实现
    pub fn alternative(mut self) -> Self {
        self.alternative = true;
        self
    }

    /// 设置优先级
    pub fn with_priority(mut self, priority: i32) -> Self {
        self.priority = Some(priority);
        self
    }

    /// 特化另一个 Bean
    pub fn specializes(mut self, target: impl Into<BeanId>) -> Self {
        self.specializes = Some(target.into());
        self
    }

    /// 添加 stereotype
    pub fn with_stereotype(mut self, stereotype: impl Into<String>) -> Self {
        self.stereotypes.push(stereotype.into());
        self
    }

    /// 添加类级拦截器绑定
    pub fn with_binding(mut self, binding: MarkerLiteral) -> Self {
        self.interceptor_bindings.push(binding);
        self
    }

    /// 添加业务方法
    pub fn with_method(mut self, method: MethodDeclaration) -> Self {
        self.methods.push(method);
        self
    }

    /// 声明生命周期回调
    pub fn with_lifecycle_hook(mut self, phase: LifecyclePhase) -> Self {
        self.lifecycle_hooks.insert(phase);
        self
    }

    /// 显式声明被装饰类型
    pub fn decorating(mut self, ty: ContractType) -> Self {
        if let Some(decorator) = self.decorator.as_mut() {
            decorator.decorated_types.push(ty);
        }
        self
    }

    /// 完整类型闭包：声明的类型 + Bean 类 + `Object`
    pub fn type_closure(&self) -> BTreeSet<ContractType> {
        let mut types: BTreeSet<ContractType> = self.types.iter().cloned().collect();
        types.insert(ContractType::raw(self.bean_class.clone()));
        types.insert(ContractType::object());
        types
    }

    /// 默认名称：首字母小写的简单类名
    pub fn default_name(&self) -> String {
        let simple = self
            .bean_class
            .rsplit(['.', ':'])
            .next()
            .unwrap_or(&self.bean_class);
        let mut chars = simple.chars();
        match chars.next() {
            Some(first) => first.to_lowercase().chain(chars).collect(),
            None => String::new(),
        }
    }
}

/// 部署描述
///
/// 一次发现的完整结果，多个发现协作方的结果可以合并
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Deployment {
    #[serde(default)]
    pub marker_kinds: Vec<MarkerKind>,
    #[serde(default)]
    pub stereotypes: Vec<StereotypeDefinition>,
    #[serde(default)]
    pub types: Vec<TypeDescriptor>,
    #[serde(default)]
    pub beans: Vec<BeanDeclaration>,
}

impl Deployment {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_kind(mut self, kind: MarkerKind) -> Self {
        self.marker_kinds.push(kind);
        self
    }

    pub fn with_stereotype(mut self, stereotype: StereotypeDefinition) -> Self {
        self.stereotypes.push(stereotype);
        self
    }

    pub fn with_type(mut self, descriptor: TypeDescriptor) -> Self {
        self.types.push(descriptor);
        self
    }

    pub fn with_bean(mut self, bean: BeanDeclaration) -> Self {
        self.beans.push(bean);
        self
    }

    /// 合并另一个部署描述
    pub fn merge(&mut self, other: Deployment) {
        self.marker_kinds.extend(other.marker_kinds);
        self.stereotypes.extend(other.stereotypes);
        self.types.extend(other.types);
        self.beans.extend(other.beans);
    }

    pub fn is_empty(&self) -> bool {
        self.marker_kinds.is_empty()
            && self.stereotypes.is_empty()
            && self.types.is_empty()
            && self.beans.is_empty()
    }

    /// 构建标记目录
    pub fn marker_catalog(&self) -> ConfigurationResult<MarkerCatalog> {
        let mut catalog = MarkerCatalog::new();
        for kind in &self.marker_kinds {
            catalog.register_kind(kind.clone())?;
        }
        for stereotype in &self.stereotypes {
            catalog.register_stereotype(stereotype.clone());
        }
        Ok(catalog)
    }

    /// 构建类型目录
    pub fn type_catalog(&self) -> TypeCatalog {
        TypeCatalog::from_descriptors(self.types.iter().cloned())
    }
}
