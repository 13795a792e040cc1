//! 错误类型定义

use thiserror::Error;

/// 装箱的业务错误
pub type BoxError = Box<dyn std::error::Error + Send + Sync>;

/// 配置文件错误类型
#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("配置文件不存在: {path}")]
    FileNotFound { path: String },

    #[error("配置文件读取失败: {source}")]
    FileReadError {
        #[from]
        source: std::io::Error,
    },

    #[error("配置解析失败: {source}")]
    ParseError { source: BoxError },

    #[error("配置序列化失败: {source}")]
    SerializationError {
        #[from]
        source: serde_json::Error,
    },
}

/// 容器定义错误
///
/// 在快照构建期检测，致命，会中止启动
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ConfigurationError {
    #[error("Bean 标识重复: {bean}")]
    DuplicateBeanId { bean: String },

    #[error("重复的 (类型, 限定符) 注册: {footprint}, Bean: {first} 与 {second}")]
    DuplicateFootprint {
        footprint: String,
        first: String,
        second: String,
    },

    #[error("未知的标记种类: @{kind}")]
    UnknownMarkerKind { kind: String },

    #[error("内置标记种类不能重新定义: @{kind}")]
    BuiltinMarkerRedefined { kind: String },

    #[error("标记 @{kind} 不是 {expected}")]
    WrongMarkerCategory { kind: String, expected: String },

    #[error("标记 @{kind} 不存在成员 {member}")]
    UnknownMarkerMember { kind: String, member: String },

    #[error("标记 @{kind} 缺少成员 {member} 且没有默认值")]
    MissingMarkerMember { kind: String, member: String },

    #[error("标记 @{kind} 的数组/标记类型成员 {member} 必须声明为 nonbinding")]
    NonbindingRequired { kind: String, member: String },

    #[error("未知的 stereotype: {name}")]
    UnknownStereotype { name: String },

    #[error("Bean {bean} 的 stereotype 声明了冲突的默认作用域: {scopes}")]
    ConflictingStereotypeScopes { bean: String, scopes: String },

    #[error("{class} 同时被声明为拦截器和装饰器")]
    InterceptorAndDecorator { class: String },

    #[error("拦截器 {class} 没有声明任何拦截器绑定")]
    InterceptorWithoutBindings { class: String },

    #[error("拦截器 {class} 没有声明任何拦截能力")]
    InterceptorWithoutKinds { class: String },

    #[error("装饰器 {class} 必须恰好声明一个委托注入点, 实际 {count} 个")]
    MalformedDelegate { class: String, count: usize },

    #[error("装饰器 {class} 的委托类型 {delegate} 没有实现被装饰类型 {decorated}")]
    DelegateTypeMismatch {
        class: String,
        delegate: String,
        decorated: String,
    },

    #[error("装饰器 {class} 没有任何被装饰类型")]
    NoDecoratedTypes { class: String },

    #[error("Bean {bean} 特化的目标 {target} 不存在")]
    UnknownSpecializationTarget { bean: String, target: String },

    #[error("Bean {target} 被多个 Bean 同时特化: {specializers}")]
    InconsistentSpecialization { target: String, specializers: String },

    #[error("检测到特化环: {chain}")]
    SpecializationCycle { chain: String },

    #[error("Bean {bean} 显式声明了名称 {declared}, 与被特化 Bean 的名称 {inherited} 冲突")]
    ConflictingSpecializedName {
        bean: String,
        declared: String,
        inherited: String,
    },

    #[error("{kind} 启用列表中重复出现: {class}")]
    DuplicateEnablement { kind: String, class: String },

    #[error("{kind} 启用列表中的类不存在或类型不符: {class}")]
    UnknownEnabledClass { kind: String, class: String },

    #[error("{class} 未在 {kind} 启用列表中")]
    NotEnabled { kind: String, class: String },
}

/// Bean 解析错误
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ResolutionError {
    #[error(
        "不满足的依赖: 类型 {requested}, 限定符 [{}], 考察过的候选: [{}]",
        .qualifiers.join(", "),
        .near_misses.join("; ")
    )]
    Unsatisfied {
        requested: String,
        qualifiers: Vec<String>,
        near_misses: Vec<String>,
    },

    #[error(
        "有歧义的依赖: 类型 {requested}, 限定符 [{}], 候选: [{}]",
        .qualifiers.join(", "),
        .candidates.join("; ")
    )]
    Ambiguous {
        requested: String,
        qualifiers: Vec<String>,
        candidates: Vec<String>,
    },

    #[error("不满足的名称依赖: {name}, 考察过的候选: [{}]", .near_misses.join("; "))]
    UnsatisfiedName {
        name: String,
        near_misses: Vec<String>,
    },

    #[error("有歧义的名称依赖: {name}, 候选: [{}]", .candidates.join("; "))]
    AmbiguousName { name: String, candidates: Vec<String> },
}

impl ResolutionError {
    /// 是否为不满足错误
    pub fn is_unsatisfied(&self) -> bool {
        matches!(
            self,
            Self::Unsatisfied { .. } | Self::UnsatisfiedName { .. }
        )
    }

    /// 是否为歧义错误
    pub fn is_ambiguous(&self) -> bool {
        matches!(self, Self::Ambiguous { .. } | Self::AmbiguousName { .. })
    }
}

/// 调用链执行错误
#[derive(Error, Debug)]
pub enum InvocationError {
    /// 调用链元素或目标抛出的错误，原样传播
    #[error(transparent)]
    Raised(BoxError),

    #[error("方法未包含在拦截计划中: {bean}.{method}")]
    MethodNotInPlan { bean: String, method: String },

    #[error("缺少调用链元素实例: {class}")]
    MissingElement { class: String },

    #[error("当前调用链位置不是装饰器，无法调用委托: {method}")]
    DelegateUnavailable { method: String },

    #[error("调用结果类型不匹配: 期望 {expected}")]
    ResultTypeMismatch { expected: String },
}

impl InvocationError {
    /// 包装业务错误
    pub fn raised(error: impl Into<BoxError>) -> Self {
        Self::Raised(error.into())
    }

    /// 尝试取出原始业务错误
    pub fn downcast_ref<E: std::error::Error + 'static>(&self) -> Option<&E> {
        match self {
            Self::Raised(source) => source.downcast_ref::<E>(),
            _ => None,
        }
    }
}

/// 容器错误类型
#[derive(Error, Debug)]
pub enum ContainerError {
    #[error("配置错误: {source}")]
    Config {
        #[from]
        source: ConfigError,
    },

    #[error("定义错误: {source}")]
    Configuration {
        #[from]
        source: ConfigurationError,
    },

    #[error("解析错误: {source}")]
    Resolution {
        #[from]
        source: ResolutionError,
    },

    #[error("Bean 不存在: {bean}")]
    UnknownBean { bean: String },

    #[error("组件发现失败: {message}")]
    DiscoveryFailed { message: String },

    #[error("代理创建失败: {message}")]
    ProxyCreationFailed { message: String },

    #[error("容器启动失败: {message}")]
    BootstrapFailed { message: String },
}

/// 结果类型别名
pub type ConfigResult<T> = Result<T, ConfigError>;
pub type ConfigurationResult<T> = Result<T, ConfigurationError>;
pub type ResolutionResult<T> = Result<T, ResolutionError>;
pub type ContainerResult<T> = Result<T, ContainerError>;
