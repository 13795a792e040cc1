//! # 依赖注入具体实现
//!
//! 类型安全的 Bean 解析与拦截编排引擎。
//!
//! ## 组成
//!
//! - [`TypeMatcher`] - 类型与限定符匹配
//! - [`BeanRegistry`] - 带特化合并的 Bean 注册表
//! - [`Resolver`] - 解析引擎，带值键缓存
//! - [`BindingCollector`] - stereotype / 拦截器绑定的传递闭包
//! - [`Enablement`] - 拦截器、装饰器、备选实现的启用顺序
//! - [`InterceptionPlanner`] - 每个 Bean 的调用链计划
//! - [`InvocationChainExecutor`] - 调用链执行
//! - [`Container`] - 原子替换快照的容器

pub mod bindings;
pub mod container;
pub mod elements;
pub mod enablement;
pub mod invocation;
pub mod matcher;
pub mod planner;
pub mod registry;
pub mod resolution;
pub mod snapshot;

#[cfg(test)]
pub(crate) mod fixtures;

pub use bindings::{BindingCollector, DecoratorModel, InterceptorModel, MethodBindings};
pub use container::Container;
pub use elements::ChainElements;
pub use enablement::{AlternativeSelector, Enablement, EnablementList};
pub use invocation::{ChainInvocation, ChainInvocationHandler, InvocationChainExecutor};
pub use matcher::{normalize_requested, qualifiers_match, TypeMatcher};
pub use planner::{BeanMetadata, InterceptionPlanner};
pub use registry::{assemble_bean, BeanRegistry, BeanRegistryBuilder};
pub use resolution::Resolver;
pub use snapshot::ContainerSnapshot;
