//! 内置的发现协作方
//!
//! - [`StaticDiscovery`] 以编程方式直接提供部署描述
//! - [`FileDiscovery`] 从 JSON / TOML 部署描述文件加载

use async_trait::async_trait;
use di_abstractions::BeanDiscovery;
use infrastructure_common::{ConfigError, ContainerError, ContainerResult, Deployment};
use std::path::{Path, PathBuf};
use tracing::{debug, info};

/// 编程方式提供的部署描述
#[derive(Debug, Clone)]
pub struct StaticDiscovery {
    name: String,
    deployment: Deployment,
}

impl StaticDiscovery {
    pub fn new(name: impl Into<String>, deployment: Deployment) -> Self {
        Self {
            name: name.into(),
            deployment,
        }
    }
}

#[async_trait]
impl BeanDiscovery for StaticDiscovery {
    async fn discover(&self) -> Result<Deployment, ContainerError> {
        Ok(self.deployment.clone())
    }

    fn name(&self) -> &str {
        &self.name
    }
}

/// 部署描述文件格式
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DescriptorFormat {
    Json,
    Toml,
}

impl DescriptorFormat {
    /// 根据扩展名推断格式
    pub fn from_path(path: &Path) -> Option<Self> {
        let extension = path.extension()?.to_str()?.to_ascii_lowercase();
        match extension.as_str() {
            "json" => Some(Self::Json),
            "toml" => Some(Self::Toml),
            _ => None,
        }
    }

    /// 解析部署描述
    pub fn parse(self, content: &str) -> Result<Deployment, ConfigError> {
        match self {
            Self::Json => Ok(serde_json::from_str(content)?),
            Self::Toml => toml::from_str(content).map_err(|e| ConfigError::ParseError {
                source: Box::new(e),
            }),
        }
    }
}

/// 从部署描述文件发现 Bean
#[derive(Debug, Clone)]
pub struct FileDiscovery {
    path: PathBuf,
    format: DescriptorFormat,
    name: String,
}

impl FileDiscovery {
    /// 按扩展名推断格式，不支持的扩展名返回错误
    pub fn new(path: impl AsRef<Path>) -> ContainerResult<Self> {
        let path = path.as_ref().to_path_buf();
        let format =
            DescriptorFormat::from_path(&path).ok_or_else(|| ContainerError::DiscoveryFailed {
                message: format!("不支持的部署描述格式: {}", path.display()),
            })?;
        Ok(Self::with_format(path, format))
    }

    pub fn with_format(path: impl AsRef<Path>, format: DescriptorFormat) -> Self {
        let path = path.as_ref().to_path_buf();
        Self {
            name: format!("file:{}", path.display()),
            path,
            format,
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn format(&self) -> DescriptorFormat {
        self.format
    }
}

#[async_trait]
impl BeanDiscovery for FileDiscovery {
    async fn discover(&self) -> Result<Deployment, ContainerError> {
        debug!("读取部署描述文件: {}", self.path.display());
        let content = tokio::fs::read_to_string(&self.path)
            .await
            .map_err(|e| match e.kind() {
                std::io::ErrorKind::NotFound => ConfigError::FileNotFound {
                    path: self.path.display().to_string(),
                },
                _ => ConfigError::FileReadError { source: e },
            })?;
        let deployment = self.format.parse(&content)?;
        info!(
            "部署描述文件 {} 加载完成: {} 个 Bean 声明",
            self.path.display(),
            deployment.beans.len()
        );
        Ok(deployment)
    }

    fn name(&self) -> &str {
        &self.name
    }
}
