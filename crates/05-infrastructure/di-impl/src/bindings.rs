//! 绑定收集
//!
//! 展开 stereotype 与拦截器绑定的传递闭包，校验拦截器 / 装饰器声明，
//! 并计算适用于 Bean 的装饰器

use crate::matcher::{normalize_requested, qualifiers_match, TypeMatcher};
use infrastructure_common::{
    Bean, BeanDeclaration, BeanId, BeanRole, ConfigurationError, ConfigurationResult,
    ContractType, InterceptionKind, InterceptorBinding, MarkerCatalog, MarkerCategory,
    MarkerLiteral, MethodDeclaration, MethodSignature, Qualifier, ScopeKind,
    StereotypeDefinition, TypeCatalog,
};
use std::collections::{BTreeSet, HashSet, VecDeque};
use std::sync::Arc;
use tracing::debug;

/// 已校验的拦截器
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InterceptorModel {
    pub bean: BeanId,
    pub class: String,
    /// 拦截器绑定（已展开传递绑定）
    pub bindings: BTreeSet<InterceptorBinding>,
    pub kinds: BTreeSet<InterceptionKind>,
    /// 未出现在启用列表时用于排序的优先级
    pub priority: Option<i32>,
}

impl InterceptorModel {
    /// 是否支持给定的拦截能力
    pub fn supports(&self, kind: InterceptionKind) -> bool {
        self.kinds.contains(&kind)
    }

    /// 全部绑定都出现在目标的有效绑定中
    pub fn matches(&self, effective: &BTreeSet<InterceptorBinding>) -> bool {
        self.bindings.is_subset(effective)
    }
}

/// 已校验的装饰器
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DecoratorModel {
    pub bean: BeanId,
    pub class: String,
    /// 委托注入点类型
    pub delegate_type: ContractType,
    /// 委托注入点限定符（空集合已补全为 `@Default`）
    pub delegate_qualifiers: Vec<Qualifier>,
    /// 被装饰类型
    pub decorated_types: BTreeSet<ContractType>,
    pub priority: Option<i32>,
}

impl DecoratorModel {
    /// 被装饰类型是否声明了给定方法
    pub fn decorates_method(&self, types: &TypeCatalog, method: &MethodSignature) -> bool {
        self.decorated_types
            .iter()
            .any(|ty| types.declares_method(&ty.raw, method))
    }
}

/// 方法及其有效绑定
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MethodBindings {
    pub signature: MethodSignature,
    /// 类级绑定与方法级绑定的并集
    pub bindings: BTreeSet<InterceptorBinding>,
    /// 静态方法和私有方法不可拦截
    pub interceptable: bool,
}

/// 绑定收集器
#[derive(Debug, Clone)]
pub struct BindingCollector {
    markers: Arc<MarkerCatalog>,
}

impl BindingCollector {
    pub fn new(markers: Arc<MarkerCatalog>) -> Self {
        Self { markers }
    }

    pub fn markers(&self) -> &MarkerCatalog {
        &self.markers
    }

    /// 展开 stereotype（包括嵌套的 stereotype），按首次出现的顺序返回
    pub fn stereotype_closure(
        &self,
        names: &[String],
    ) -> ConfigurationResult<Vec<&StereotypeDefinition>> {
        let mut visited = HashSet::new();
        let mut queue: VecDeque<&str> = names.iter().map(String::as_str).collect();
        let mut closure = Vec::new();

        while let Some(name) = queue.pop_front() {
            if !visited.insert(name) {
                continue;
            }
            let stereotype = self.markers.stereotype(name).ok_or_else(|| {
                ConfigurationError::UnknownStereotype {
                    name: name.to_string(),
                }
            })?;
            queue.extend(stereotype.stereotypes.iter().map(String::as_str));
            closure.push(stereotype);
        }
        Ok(closure)
    }

    /// 收集拦截器绑定
    ///
    /// 直接声明的绑定加上 stereotype 携带的绑定，再沿绑定种类的
    /// `inherited_bindings` 求不动点
    pub fn collect_interceptor_bindings(
        &self,
        literals: &[MarkerLiteral],
        stereotypes: &[String],
    ) -> ConfigurationResult<BTreeSet<InterceptorBinding>> {
        let mut pending: Vec<&MarkerLiteral> = literals.iter().collect();
        for stereotype in self.stereotype_closure(stereotypes)? {
            pending.extend(&stereotype.interceptor_bindings);
        }
        self.close_bindings(pending)
    }

    fn close_bindings<'a>(
        &'a self,
        mut pending: Vec<&'a MarkerLiteral>,
    ) -> ConfigurationResult<BTreeSet<InterceptorBinding>> {
        let mut bindings = BTreeSet::new();
        while let Some(literal) = pending.pop() {
            let binding = self
                .markers
                .resolve(literal, MarkerCategory::InterceptorBinding)?;
            if bindings.contains(&binding) {
                continue;
            }
            if let Some(kind) = self.markers.kind(&literal.kind) {
                pending.extend(&kind.inherited_bindings);
            }
            bindings.insert(binding);
        }
        Ok(bindings)
    }

    /// 类级有效绑定
    pub fn class_bindings(
        &self,
        declaration: &BeanDeclaration,
    ) -> ConfigurationResult<BTreeSet<InterceptorBinding>> {
        self.collect_interceptor_bindings(
            &declaration.interceptor_bindings,
            &declaration.stereotypes,
        )
    }

    /// 方法级有效绑定：方法级绑定只扩展类级绑定，不会移除
    pub fn method_bindings(
        &self,
        class_bindings: &BTreeSet<InterceptorBinding>,
        method: &MethodDeclaration,
    ) -> ConfigurationResult<MethodBindings> {
        let mut bindings = class_bindings.clone();
        bindings.extend(self.close_bindings(method.interceptor_bindings.iter().collect())?);
        Ok(MethodBindings {
            signature: method.signature.clone(),
            bindings,
            interceptable: method.is_interceptable(),
        })
    }

    /// 有效限定符（尚未补全内置限定符）
    pub fn collect_qualifiers(
        &self,
        declaration: &BeanDeclaration,
        stereotypes: &[&StereotypeDefinition],
    ) -> ConfigurationResult<BTreeSet<Qualifier>> {
        let mut literals: Vec<&MarkerLiteral> = declaration.qualifiers.iter().collect();
        for stereotype in stereotypes {
            literals.extend(&stereotype.qualifiers);
        }
        literals
            .into_iter()
            .map(|literal| self.markers.resolve(literal, MarkerCategory::Qualifier))
            .collect()
    }

    /// 有效作用域：显式声明 > 唯一的 stereotype 默认作用域 > Dependent
    pub fn effective_scope(
        &self,
        declaration: &BeanDeclaration,
        stereotypes: &[&StereotypeDefinition],
    ) -> ConfigurationResult<ScopeKind> {
        if let Some(scope) = &declaration.scope {
            return Ok(scope.clone());
        }
        let scopes: BTreeSet<&ScopeKind> = stereotypes
            .iter()
            .filter_map(|stereotype| stereotype.default_scope.as_ref())
            .collect();
        match scopes.len() {
            0 => Ok(ScopeKind::Dependent),
            1 => Ok(scopes.into_iter().next().cloned().unwrap_or_default()),
            _ => Err(ConfigurationError::ConflictingStereotypeScopes {
                bean: declaration.bean_id().to_string(),
                scopes: scopes
                    .iter()
                    .map(ToString::to_string)
                    .collect::<Vec<_>>()
                    .join(", "),
            }),
        }
    }

    /// 校验拦截器声明
    pub fn interceptor_model(
        &self,
        declaration: &BeanDeclaration,
    ) -> ConfigurationResult<InterceptorModel> {
        let class = declaration.bean_class.clone();
        if declaration.decorator.is_some() {
            return Err(ConfigurationError::InterceptorAndDecorator { class });
        }
        let kinds = declaration
            .interceptor
            .as_ref()
            .map(|spec| spec.kinds.clone())
            .unwrap_or_default();
        if kinds.is_empty() {
            return Err(ConfigurationError::InterceptorWithoutKinds { class });
        }
        let bindings = self.class_bindings(declaration)?;
        if bindings.is_empty() {
            return Err(ConfigurationError::InterceptorWithoutBindings { class });
        }

        debug!("拦截器 {} 绑定: {:?}", class, bindings);
        Ok(InterceptorModel {
            bean: declaration.bean_id(),
            class,
            bindings,
            kinds,
            priority: declaration.priority,
        })
    }

    /// 校验装饰器声明
    ///
    /// 必须恰好一个委托注入点，委托类型必须实现每一个被装饰类型
    pub fn decorator_model(
        &self,
        declaration: &BeanDeclaration,
        types: &TypeCatalog,
    ) -> ConfigurationResult<DecoratorModel> {
        let class = declaration.bean_class.clone();
        if declaration.interceptor.is_some() {
            return Err(ConfigurationError::InterceptorAndDecorator { class });
        }
        let spec = declaration.decorator.clone().unwrap_or_default();
        let [delegate] = spec.delegates.as_slice() else {
            return Err(ConfigurationError::MalformedDelegate {
                class,
                count: spec.delegates.len(),
            });
        };

        let decorated_types: BTreeSet<ContractType> = if spec.decorated_types.is_empty() {
            declaration
                .type_closure()
                .into_iter()
                .filter(|ty| !ty.is_object() && ty.raw != declaration.bean_class)
                .collect()
        } else {
            spec.decorated_types.iter().cloned().collect()
        };
        if decorated_types.is_empty() {
            return Err(ConfigurationError::NoDecoratedTypes { class });
        }
        if let Some(decorated) = decorated_types
            .iter()
            .find(|decorated| !types.is_subtype(&delegate.contract, decorated))
        {
            return Err(ConfigurationError::DelegateTypeMismatch {
                class,
                delegate: delegate.contract.to_string(),
                decorated: decorated.to_string(),
            });
        }

        let qualifiers = delegate
            .qualifiers
            .iter()
            .map(|literal| self.markers.resolve(literal, MarkerCategory::Qualifier))
            .collect::<ConfigurationResult<Vec<_>>>()?;

        Ok(DecoratorModel {
            bean: declaration.bean_id(),
            class,
            delegate_type: delegate.contract.clone(),
            delegate_qualifiers: normalize_requested(&qualifiers),
            decorated_types,
            priority: declaration.priority,
        })
    }

    /// 适用于 Bean 的装饰器，保持传入的启用顺序
    ///
    /// Bean 的某个类型可以赋值给委托类型，且 Bean 满足委托限定符
    pub fn applicable_decorators<'d>(
        &self,
        bean: &Bean,
        decorators: &'d [DecoratorModel],
        matcher: &TypeMatcher,
    ) -> Vec<&'d DecoratorModel> {
        if bean.role != BeanRole::Managed {
            return Vec::new();
        }
        decorators
            .iter()
            .filter(|decorator| {
                matcher.matches_any(&decorator.delegate_type, &bean.types)
                    && qualifiers_match(&decorator.delegate_qualifiers, &bean.qualifiers)
            })
            .collect()
    }
}
