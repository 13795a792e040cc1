//! 从配置文件与部署描述文件启动容器

mod common;

use common::{deployment, payment};
use di_abstractions::{BeanContainer, BeanLookup, BeanResolver};
use infrastructure_common::{ConfigError, ContainerError, ContractType, MethodSignature};
use infrastructure_composition::{ContainerBuilder, FileDiscovery, StaticDiscovery};
use std::io::Write;
use std::path::Path;
use tempfile::NamedTempFile;

const SETTINGS: &str = r#"
[container]
eager_planning = false

[enablement]
interceptors = ["TxInterceptor", "AuditInterceptor"]
decorators = ["LimitDecorator", "FraudDecorator"]
"#;

const LEDGER: &str = r#"{
  "beans": [
    {
      "bean_class": "LedgerService",
      "types": ["Ledger"],
      "interceptor_bindings": ["Transactional"],
      "methods": [{ "signature": { "name": "post" } }]
    }
  ]
}"#;

const LEDGER_WITH_ARCHIVE: &str = r#"{
  "beans": [
    {
      "bean_class": "LedgerService",
      "types": ["Ledger"],
      "interceptor_bindings": ["Transactional"],
      "methods": [{ "signature": { "name": "post" } }]
    },
    {
      "bean_class": "ArchiveService",
      "types": ["Archive"],
      "name": "archive"
    }
  ]
}"#;

fn temp_file(suffix: &str, content: &str) -> NamedTempFile {
    let mut file = tempfile::Builder::new().suffix(suffix).tempfile().unwrap();
    file.write_all(content.as_bytes()).unwrap();
    file
}

fn rewrite(path: &Path, content: &str) {
    std::fs::write(path, content).unwrap();
}

/// 静态发现与文件发现的结果合并后构建容器
#[tokio::test]
async fn test_build_from_files_and_static_deployment() {
    let settings = temp_file(".toml", SETTINGS);
    let ledger = temp_file(".json", LEDGER);

    let container = ContainerBuilder::new()
        .add_required_settings_file(settings.path())
        .add_discovery(StaticDiscovery::new("payment", deployment()))
        .add_deployment_file(ledger.path())
        .build()
        .await
        .unwrap();

    assert_eq!(container.stats().plans_built, 0);
    assert_eq!(
        container.resolve(&payment(), &[]).unwrap().id.as_str(),
        "PaymentService"
    );

    // 文件中的 Bean 使用静态部署描述声明的绑定种类
    let plan = container.interception_plan(&"LedgerService".into()).unwrap();
    assert_eq!(
        plan.method_chain(&MethodSignature::nullary("post"))
            .unwrap()
            .interceptors,
        vec!["TxInterceptor"]
    );
    assert_eq!(container.stats().plans_built, 1);
}

/// 重新发现后部署描述整体替换，代数递增
#[tokio::test]
async fn test_refresh_picks_up_changed_descriptor() {
    let ledger = temp_file(".json", LEDGER);
    let bootstrapper = ContainerBuilder::new()
        .with_settings(common::settings())
        .add_deployment(deployment())
        .add_deployment_file(ledger.path())
        .into_bootstrapper()
        .unwrap();

    let container = bootstrapper.bootstrap().await.unwrap();
    assert!(container.find_by_type(&ContractType::raw("Archive")).is_empty());

    rewrite(ledger.path(), LEDGER_WITH_ARCHIVE);
    let generation = bootstrapper.refresh(&container).await.unwrap();

    assert_eq!(generation, 2);
    assert_eq!(
        container.resolve_name("archive").unwrap().id.as_str(),
        "ArchiveService"
    );
    assert_eq!(
        container.resolve(&payment(), &[]).unwrap().id.as_str(),
        "PaymentService"
    );
}

/// 刷新失败时容器保留原快照
#[tokio::test]
async fn test_failed_refresh_keeps_container() {
    let ledger = temp_file(".json", LEDGER);
    let bootstrapper = ContainerBuilder::new()
        .with_settings(common::settings())
        .add_deployment(deployment())
        .add_deployment_file(ledger.path())
        .into_bootstrapper()
        .unwrap();
    let container = bootstrapper.bootstrap().await.unwrap();

    rewrite(ledger.path(), "{ \"beans\": [ { \"types\": [] } ] }");
    assert!(matches!(
        bootstrapper.refresh(&container).await,
        Err(ContainerError::Config {
            source: ConfigError::SerializationError { .. }
        })
    ));

    assert_eq!(container.stats().generation, 1);
    assert!(container.bean(&"LedgerService".into()).is_some());
}

#[tokio::test]
async fn test_missing_descriptor_file() {
    let discovery = FileDiscovery::new("/nonexistent/beans.toml").unwrap();

    let result = ContainerBuilder::new()
        .with_settings(common::settings())
        .add_deployment(deployment())
        .add_discovery(discovery)
        .build()
        .await;

    assert!(matches!(
        result,
        Err(ContainerError::Config {
            source: ConfigError::FileNotFound { .. }
        })
    ));
}
