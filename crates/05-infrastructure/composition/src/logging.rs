//! 日志初始化

use infrastructure_common::{ContainerError, ContainerResult};
use tracing::info;
use tracing_subscriber::filter::LevelFilter;
use tracing_subscriber::EnvFilter;

/// 日志配置
#[derive(Debug, Clone)]
pub struct LoggingConfig {
    /// 日志级别
    pub level: tracing::Level,
    /// 过滤指令，例如 `di_impl=debug,info`；为空时先读取 `RUST_LOG`，再回退到 `level`
    pub filter: Option<String>,
    /// 是否显示目标
    pub show_target: bool,
    /// 是否显示线程ID
    pub show_thread_ids: bool,
    /// 是否显示文件名
    pub show_file: bool,
    /// 是否显示行号
    pub show_line_number: bool,
    /// 是否使用 JSON 格式
    pub json_format: bool,
    /// 已经安装全局订阅者时是否视为成功
    pub allow_existing: bool,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: tracing::Level::INFO,
            filter: None,
            show_target: true,
            show_thread_ids: false,
            show_file: false,
            show_line_number: false,
            json_format: false,
            allow_existing: false,
        }
    }
}

impl LoggingConfig {
    /// 创建开发环境日志配置
    pub fn development() -> Self {
        Self {
            level: tracing::Level::DEBUG,
            filter: None,
            show_target: true,
            show_thread_ids: true,
            show_file: true,
            show_line_number: true,
            json_format: false,
            allow_existing: true,
        }
    }

    /// 创建生产环境日志配置
    pub fn production() -> Self {
        Self {
            level: tracing::Level::INFO,
            filter: None,
            show_target: false,
            show_thread_ids: false,
            show_file: false,
            show_line_number: false,
            json_format: true,
            allow_existing: false,
        }
    }

    pub fn with_filter(mut self, filter: impl Into<String>) -> Self {
        self.filter = Some(filter.into());
        self
    }

    pub fn allow_existing(mut self, allow: bool) -> Self {
        self.allow_existing = allow;
        self
    }

    /// 构建过滤器
    pub fn env_filter(&self) -> ContainerResult<EnvFilter> {
        match &self.filter {
            Some(directives) => {
                EnvFilter::try_new(directives).map_err(|e| ContainerError::BootstrapFailed {
                    message: format!("日志过滤指令无效: {}", e),
                })
            }
            None => Ok(EnvFilter::try_from_default_env().unwrap_or_else(|_| {
                EnvFilter::default().add_directive(LevelFilter::from_level(self.level).into())
            })),
        }
    }

    /// 安装全局 `tracing` 订阅者
    pub fn init(&self) -> ContainerResult<()> {
        let subscriber = tracing_subscriber::fmt()
            .with_env_filter(self.env_filter()?)
            .with_target(self.show_target)
            .with_thread_ids(self.show_thread_ids)
            .with_file(self.show_file)
            .with_line_number(self.show_line_number);

        let installed = if self.json_format {
            subscriber.json().try_init()
        } else {
            subscriber.try_init()
        };

        match installed {
            Ok(()) => {
                info!("日志系统初始化完成");
                Ok(())
            }
            Err(_) if self.allow_existing => Ok(()),
            Err(e) => Err(ContainerError::BootstrapFailed {
                message: format!("日志初始化失败: {}", e),
            }),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_presets() {
        let development = LoggingConfig::development();
        assert_eq!(development.level, tracing::Level::DEBUG);
        assert!(development.allow_existing);

        let production = LoggingConfig::production();
        assert!(production.json_format);
        assert!(!production.show_target);
    }

    #[test]
    fn test_invalid_filter_is_rejected() {
        let config = LoggingConfig::default().with_filter("di_impl=verbose");

        assert!(matches!(
            config.env_filter(),
            Err(ContainerError::BootstrapFailed { .. })
        ));
        assert!(LoggingConfig::default()
            .with_filter("di_impl=debug,info")
            .env_filter()
            .is_ok());
    }

    #[test]
    fn test_repeated_init_tolerated_when_allowed() {
        let config = LoggingConfig::default().allow_existing(true);

        assert!(config.init().is_ok());
        assert!(config.init().is_ok());
    }
}
