//! 容器配置加载
//!
//! 通过 `config` crate 合并配置文件与环境变量，后添加的来源覆盖先添加的来源

use infrastructure_common::{ConfigError, ConfigResult, ContainerSettings};
use std::path::{Path, PathBuf};
use tracing::{debug, error, info};

/// 环境变量中按逗号拆分为列表的配置键
const LIST_KEYS: [&str; 4] = [
    "enablement.interceptors",
    "enablement.decorators",
    "enablement.alternatives",
    "enablement.disabled",
];

/// 配置来源
#[derive(Debug, Clone)]
struct SettingsFile {
    path: PathBuf,
    required: bool,
}

/// 容器配置加载器
#[derive(Debug, Clone, Default)]
pub struct SettingsLoader {
    files: Vec<SettingsFile>,
    env_prefix: Option<String>,
}

impl SettingsLoader {
    pub fn new() -> Self {
        Self::default()
    }

    /// 添加可选的配置文件，格式由扩展名推断（TOML / JSON）
    pub fn with_file(mut self, path: impl AsRef<Path>) -> Self {
        self.files.push(SettingsFile {
            path: path.as_ref().to_path_buf(),
            required: false,
        });
        self
    }

    /// 添加必需的配置文件
    pub fn with_required_file(mut self, path: impl AsRef<Path>) -> Self {
        self.files.push(SettingsFile {
            path: path.as_ref().to_path_buf(),
            required: true,
        });
        self
    }

    /// 添加环境变量来源，例如前缀 `ADSP` 对应 `ADSP__CONTAINER__EAGER_PLANNING`
    pub fn with_env_prefix(mut self, prefix: impl Into<String>) -> Self {
        self.env_prefix = Some(prefix.into());
        self
    }

    /// 加载配置，缺失的可选来源按默认值处理
    pub fn load(&self) -> ConfigResult<ContainerSettings> {
        let mut builder = config::Config::builder();

        for file in &self.files {
            if file.required && !file.path.exists() {
                return Err(ConfigError::FileNotFound {
                    path: file.path.display().to_string(),
                });
            }
            debug!("添加配置文件: {}", file.path.display());
            builder = builder.add_source(config::File::from(file.path.as_path()).required(file.required));
        }

        if let Some(prefix) = &self.env_prefix {
            debug!("添加环境变量配置源，前缀: {}", prefix);
            let mut environment = config::Environment::with_prefix(prefix)
                .separator("__")
                .try_parsing(true)
                .list_separator(",");
            for key in LIST_KEYS {
                environment = environment.with_list_parse_key(key);
            }
            builder = builder.add_source(environment);
        }

        let settings = builder
            .build()
            .and_then(|config| config.try_deserialize::<ContainerSettings>())
            .map_err(|e| {
                error!("容器配置加载失败: {}", e);
                ConfigError::ParseError {
                    source: Box::new(e),
                }
            })?;

        info!(
            "容器配置加载完成: {} 个拦截器, {} 个装饰器, {} 个备选实现",
            settings.enablement.interceptors.len(),
            settings.enablement.decorators.len(),
            settings.enablement.alternatives.len()
        );
        Ok(settings)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    fn settings_file(suffix: &str, content: &str) -> tempfile::NamedTempFile {
        let mut file = tempfile::Builder::new().suffix(suffix).tempfile().unwrap();
        file.write_all(content.as_bytes()).unwrap();
        file
    }

    #[test]
    fn test_missing_optional_sources_use_defaults() {
        let settings = SettingsLoader::new()
            .with_file("/nonexistent/container.toml")
            .load()
            .unwrap();

        assert_eq!(settings, ContainerSettings::default());
        assert!(settings.container.eager_planning);
    }

    #[test]
    fn test_missing_required_file() {
        assert!(matches!(
            SettingsLoader::new()
                .with_required_file("/nonexistent/container.toml")
                .load(),
            Err(ConfigError::FileNotFound { .. })
        ));
    }

    #[test]
    fn test_toml_then_json_override() {
        let toml = settings_file(
            ".toml",
            r#"
            [container]
            eager_planning = false

            [enablement]
            interceptors = ["TxInterceptor", "AuditInterceptor"]
            decorators = ["LimitDecorator"]
            "#,
        );
        let json = settings_file(".json", r#"{ "enablement": { "decorators": ["FraudDecorator"] } }"#);

        let settings = SettingsLoader::new()
            .with_required_file(toml.path())
            .with_file(json.path())
            .load()
            .unwrap();

        assert!(!settings.container.eager_planning);
        assert!(settings.container.resolution_cache);
        assert_eq!(
            settings.enablement.interceptors,
            vec!["TxInterceptor", "AuditInterceptor"]
        );
        assert_eq!(settings.enablement.decorators, vec!["FraudDecorator"]);
    }

    #[test]
    fn test_environment_overrides() {
        std::env::set_var("ADSPSETTINGSTEST__CONTAINER__STRICT_FOOTPRINTS", "true");
        std::env::set_var(
            "ADSPSETTINGSTEST__ENABLEMENT__DISABLED",
            "AuditInterceptor,LegacyInterceptor",
        );

        let settings = SettingsLoader::new()
            .with_env_prefix("ADSPSETTINGSTEST")
            .load()
            .unwrap();

        assert!(settings.container.strict_footprints);
        assert_eq!(
            settings.enablement.disabled,
            vec!["AuditInterceptor", "LegacyInterceptor"]
        );
    }

    #[test]
    fn test_malformed_file_is_parse_error() {
        let broken = settings_file(".toml", "[container\neager_planning = ");

        assert!(matches!(
            SettingsLoader::new().with_file(broken.path()).load(),
            Err(ConfigError::ParseError { .. })
        ));
    }
}
