//! # Infrastructure Common
//!
//! 这个 crate 提供了 Bean 容器各层共享的数据模型和错误类型。
//!
//! ## 核心组件
//!
//! - [`ContractType`] - 契约类型（原始类型 + 泛型参数）
//! - [`Marker`] - 限定符 / 拦截器绑定的结构化值对象
//! - [`MarkerCatalog`] - 标记种类与 stereotype 定义目录
//! - [`BeanDeclaration`] - 发现协作方提供的 Bean 声明
//! - [`Bean`] - 注册表持有的已解析 Bean 记录
//! - [`ContainerSettings`] - 容器配置
//!
//! ## 设计原则
//!
//! - 标记以不可变值对象表示，相等性只比较绑定成员
//! - 所有声明都可以通过 serde 从部署描述文件加载
//! - 错误在构建期尽早暴露

pub mod bean;
pub mod configuration;
pub mod discovery;
pub mod errors;
pub mod lifecycle;
pub mod markers;
pub mod metadata;

pub use bean::*;
pub use configuration::*;
pub use discovery::*;
pub use errors::*;
pub use lifecycle::*;
pub use markers::*;
pub use metadata::*;
