//! # Dependency Injection Abstractions
//!
//! Bean 容器的抽象层，定义解析、拦截计划和调用链的核心接口。
//!
//! ## 核心接口
//!
//! - [`BeanDiscovery`] - 发现协作方，提供部署描述
//! - [`BeanLookup`] - 按类型 / 名称查找 Bean
//! - [`BeanResolver`] - 按 (类型, 限定符) 或名称解析唯一 Bean
//! - [`Interceptor`] / [`Decorator`] - 调用链元素
//! - [`Invocation`] - 单次调用的上下文与 proceed 能力
//! - [`BeanInterceptionPlan`] - 每个 Bean 的方法 / 生命周期调用链计划
//! - [`ProxyFactory`] - 代理生成协作方

pub mod container;
pub mod discovery;
pub mod factory;
pub mod interception;
pub mod plan;
pub mod registry;
pub mod resolver;

pub use container::*;
pub use discovery::*;
pub use factory::*;
pub use interception::*;
pub use plan::*;
pub use registry::*;
pub use resolver::*;
