//! 容器构建器

use crate::bootstrapper::ContainerBootstrapper;
use crate::discovery::{FileDiscovery, StaticDiscovery};
use crate::logging::LoggingConfig;
use crate::settings::SettingsLoader;
use di_abstractions::{BeanDiscovery, ProxyFactory};
use di_impl::Container;
use infrastructure_common::{ContainerResult, ContainerSettings, Deployment};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing::{debug, info};

/// 容器构建器
///
/// 使用构建者模式组装配置来源、发现协作方、代理工厂和日志系统
pub struct ContainerBuilder {
    /// 配置加载器
    settings_loader: SettingsLoader,
    /// 直接给定的配置，优先于配置文件与环境变量
    settings: Option<ContainerSettings>,
    /// 发现协作方列表
    discoverers: Vec<Box<dyn BeanDiscovery>>,
    /// 待加载的部署描述文件
    deployment_files: Vec<PathBuf>,
    proxy_factory: Option<Arc<dyn ProxyFactory>>,
    /// 日志配置，为空时不初始化日志
    logging_config: Option<LoggingConfig>,
}

impl ContainerBuilder {
    /// 创建新的容器构建器
    pub fn new() -> Self {
        Self {
            settings_loader: SettingsLoader::new(),
            settings: None,
            discoverers: Vec::new(),
            deployment_files: Vec::new(),
            proxy_factory: None,
            logging_config: None,
        }
    }

    /// 添加配置文件（TOML / JSON），文件不存在时跳过
    pub fn add_settings_file(mut self, path: impl AsRef<Path>) -> Self {
        info!("添加配置文件: {}", path.as_ref().display());
        self.settings_loader = self.settings_loader.with_file(path);
        self
    }

    /// 添加必需的配置文件
    pub fn add_required_settings_file(mut self, path: impl AsRef<Path>) -> Self {
        info!("添加必需的配置文件: {}", path.as_ref().display());
        self.settings_loader = self.settings_loader.with_required_file(path);
        self
    }

    /// 添加环境变量配置源
    pub fn add_settings_env(mut self, prefix: impl Into<String>) -> Self {
        let prefix = prefix.into();
        info!("添加环境变量配置源，前缀: {}", prefix);
        self.settings_loader = self.settings_loader.with_env_prefix(prefix);
        self
    }

    /// 直接使用给定配置
    pub fn with_settings(mut self, settings: ContainerSettings) -> Self {
        self.settings = Some(settings);
        self
    }

    /// 添加编程方式提供的部署描述
    pub fn add_deployment(self, deployment: Deployment) -> Self {
        let name = format!("static-{}", self.discoverers.len());
        self.add_discovery(StaticDiscovery::new(name, deployment))
    }

    /// 添加部署描述文件，格式在构建时按扩展名推断
    pub fn add_deployment_file(mut self, path: impl AsRef<Path>) -> Self {
        info!("添加部署描述文件: {}", path.as_ref().display());
        self.deployment_files.push(path.as_ref().to_path_buf());
        self
    }

    /// 添加自定义发现协作方
    pub fn add_discovery<T: BeanDiscovery + 'static>(mut self, discovery: T) -> Self {
        debug!("添加发现协作方: {}", discovery.name());
        self.discoverers.push(Box::new(discovery));
        self
    }

    pub fn with_proxy_factory(mut self, factory: Arc<dyn ProxyFactory>) -> Self {
        self.proxy_factory = Some(factory);
        self
    }

    /// 设置日志配置
    pub fn with_logging(mut self, config: LoggingConfig) -> Self {
        self.logging_config = Some(config);
        self
    }

    /// 自动配置开发环境
    pub fn auto_configure_development(mut self) -> Self {
        info!("自动配置开发环境");
        for file in ["./container.dev.toml", "./container.Development.json"] {
            if Path::new(file).exists() {
                debug!("添加开发环境配置: {}", file);
                self.settings_loader = self.settings_loader.with_file(file);
            }
        }
        self.logging_config = Some(LoggingConfig::development());
        self
    }

    /// 自动配置生产环境
    pub fn auto_configure_production(mut self) -> Self {
        info!("自动配置生产环境");
        for file in ["./container.prod.toml", "./container.Production.json"] {
            if Path::new(file).exists() {
                debug!("添加生产环境配置: {}", file);
                self.settings_loader = self.settings_loader.with_file(file);
            }
        }
        self.logging_config = Some(LoggingConfig::production());
        self
    }

    /// 创建启动器，不执行发现
    pub fn into_bootstrapper(self) -> ContainerResult<ContainerBootstrapper> {
        if let Some(config) = &self.logging_config {
            config.init()?;
        }

        let settings = match self.settings {
            Some(settings) => settings,
            None => self.settings_loader.load()?,
        };

        let mut discoverers = self.discoverers;
        for path in &self.deployment_files {
            discoverers.push(Box::new(FileDiscovery::new(path)?));
        }

        let mut bootstrapper = ContainerBootstrapper::new(discoverers, settings);
        if let Some(factory) = self.proxy_factory {
            bootstrapper = bootstrapper.with_proxy_factory(factory);
        }
        Ok(bootstrapper)
    }

    /// 构建容器
    pub async fn build(self) -> ContainerResult<Container> {
        info!("开始构建容器");
        let container = self.into_bootstrapper()?.bootstrap().await?;
        info!("容器构建完成");
        Ok(container)
    }
}

impl Default for ContainerBuilder {
    fn default() -> Self {
        Self::new()
    }
}
