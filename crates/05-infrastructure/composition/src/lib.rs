//! # 容器组合层
//!
//! 这个 crate 负责将配置、日志、发现协作方与容器引擎组合成一个可运行的 Bean 容器。
//!
//! ## 主要功能
//!
//! - **容器构建器**: 使用构建者模式组装容器
//! - **配置加载**: 通过 `config` crate 合并 TOML / JSON 文件与环境变量
//! - **发现协作方**: 编程方式与部署描述文件两种内置实现
//! - **日志初始化**: 基于 `tracing-subscriber` 的 fmt / JSON 输出
//!
//! ## 基本使用
//!
//! ```rust,no_run
//! use infrastructure_composition::{ContainerBuilder, LoggingConfig};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let container = ContainerBuilder::new()
//!         .with_logging(LoggingConfig::development())
//!         .add_settings_file("container.toml")
//!         .add_settings_env("ADSP")
//!         .add_deployment_file("beans.toml")
//!         .build()
//!         .await?;
//!
//!     println!("容器快照: {:?}", container.snapshot().stats());
//!     Ok(())
//! }
//! ```

pub mod bootstrapper;
pub mod builder;
pub mod discovery;
pub mod logging;
pub mod settings;

// 重新导出主要类型
pub use bootstrapper::ContainerBootstrapper;
pub use builder::ContainerBuilder;
pub use discovery::{DescriptorFormat, FileDiscovery, StaticDiscovery};
pub use logging::LoggingConfig;
pub use settings::SettingsLoader;

// 重新导出错误类型
pub use infrastructure_common::ContainerError;
