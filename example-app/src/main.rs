//! # 示例应用程序
//!
//! 演示 Bean 解析、拦截计划与调用链执行

mod payment;

use anyhow::Context;
use clap::{Parser, Subcommand};
use di_abstractions::{downcast, instance, BeanContainer, BeanLookup, BeanResolver};
use di_impl::Container;
use infrastructure_common::{
    BeanId, ContractType, LifecyclePhase, MarkerCategory, MarkerLiteral, Qualifier,
};
use infrastructure_composition::{ContainerBuilder, LoggingConfig};
use payment::{Journal, Money, PaymentTarget};
use std::path::PathBuf;
use std::sync::Arc;
use tracing::{info, warn};

/// 命令行参数
#[derive(Parser, Debug)]
#[command(name = "example-app")]
#[command(about = "Lorn ADSP Bean 容器示例应用")]
struct Args {
    /// 容器配置文件路径（TOML / JSON），缺省使用内置配置
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// 部署描述文件路径（TOML / JSON），缺省使用内置支付场景
    #[arg(short, long)]
    deployment: Option<PathBuf>,

    /// 日志级别
    #[arg(long, default_value = "info")]
    log_level: String,

    /// 以 JSON 格式输出日志
    #[arg(long)]
    json_logs: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// 运行支付端到端场景
    Demo {
        /// 扣款金额（分）
        #[arg(long, default_value_t = 12_000)]
        amount: i64,

        /// 单笔限额（分）
        #[arg(long, default_value_t = 100_000)]
        limit: i64,
    },
    /// 打印拦截计划
    Plan {
        /// 只打印指定 Bean
        #[arg(long)]
        bean: Option<String>,

        /// 以 JSON 输出
        #[arg(long)]
        json: bool,
    },
    /// 解析 Bean
    Resolve {
        /// 契约类型，例如 `Payment`
        #[arg(required_unless_present = "name")]
        contract: Option<String>,

        /// 限定符，格式 `Kind` 或 `Kind:member=value,member=value`
        #[arg(short, long = "qualifier")]
        qualifiers: Vec<String>,

        /// 按名称解析
        #[arg(long, conflicts_with = "contract")]
        name: Option<String>,
    },
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let args = Args::parse();

    let mut logging = LoggingConfig::default().with_filter(args.log_level.clone());
    logging.json_format = args.json_logs;

    let container = build_container(&args, logging).await?;

    match args.command {
        Command::Demo { amount, limit } => run_demo(&container, Money(amount), Money(limit))?,
        Command::Plan { bean, json } => print_plans(&container, bean.as_deref(), json)?,
        Command::Resolve {
            contract,
            qualifiers,
            name,
        } => resolve(&container, contract.as_deref(), &qualifiers, name.as_deref())?,
    }
    Ok(())
}

/// 构建容器
async fn build_container(args: &Args, logging: LoggingConfig) -> anyhow::Result<Container> {
    let mut builder = ContainerBuilder::new()
        .with_logging(logging)
        .add_settings_env("ADSP");

    builder = match &args.config {
        Some(path) => builder.add_required_settings_file(path),
        None => builder.with_settings(payment::settings()),
    };
    builder = match &args.deployment {
        Some(path) => builder.add_deployment_file(path),
        None => builder.add_deployment(payment::deployment()),
    };

    let container = builder.build().await.context("容器构建失败")?;
    info!("示例应用容器就绪: {:?}", container);
    Ok(container)
}

/// 支付端到端场景：解析、生命周期、业务调用、重新配置
fn run_demo(container: &Container, amount: Money, limit: Money) -> anyhow::Result<()> {
    let journal = Journal::default();
    let elements = Arc::new(payment::elements(&journal, limit));

    let bean = container.resolve(&payment::payment(), &[])?;
    println!("解析 Payment -> {}", bean.describe());

    let target = Arc::new(PaymentTarget::new(bean.bean_class.clone(), journal.clone()));
    let handler = container.invocation_handler(&bean.id, target.clone(), elements.clone())?;
    println!("{}", handler.plan());

    handler.invoke_lifecycle(LifecyclePhase::PostConstruct)?;
    print_journal("PostConstruct", &journal);

    match handler.invoke(&payment::charge(), vec![instance(amount)]) {
        Ok(receipt) => {
            println!("扣款成功: {}", downcast::<String>(&receipt)?);
        }
        Err(error) => {
            warn!("扣款失败: {}", error);
            println!("扣款失败: {}", error);
        }
    }
    print_journal("charge", &journal);

    handler.invoke(&payment::close(), Vec::new())?;
    print_journal("close", &journal);

    let generation = container.reconfigure(payment::settings().with_disabled("AuditInterceptor"))?;
    println!("重新配置完成，当前第 {} 代快照（禁用 AuditInterceptor）", generation);
    let handler = container.invocation_handler(&bean.id, target, elements)?;
    handler.invoke(&payment::charge(), vec![instance(amount)])?;
    print_journal("charge（重新配置后）", &journal);

    handler.invoke_lifecycle(LifecyclePhase::PreDestroy)?;
    print_journal("PreDestroy", &journal);

    let stats = container.stats();
    println!(
        "统计: 第 {} 代, {} 个 Bean, {} 个拦截计划, 解析缓存命中率 {:.0}%",
        stats.generation,
        stats.beans,
        stats.plans_built,
        stats.cache_hit_rate() * 100.0
    );
    Ok(())
}

fn print_journal(title: &str, journal: &Journal) {
    println!("== {} ==", title);
    for entry in journal.drain() {
        println!("  {}", entry);
    }
}

fn print_plans(container: &Container, bean: Option<&str>, json: bool) -> anyhow::Result<()> {
    let ids: Vec<BeanId> = match bean {
        Some(id) => vec![BeanId::new(id)],
        None => container.beans().iter().map(|bean| bean.id.clone()).collect(),
    };

    for id in ids {
        let plan = container.interception_plan(&id)?;
        if json {
            println!("{}", serde_json::to_string_pretty(plan.as_ref())?);
        } else {
            print!("{}", plan);
        }
    }
    Ok(())
}

fn resolve(
    container: &Container,
    contract: Option<&str>,
    qualifiers: &[String],
    name: Option<&str>,
) -> anyhow::Result<()> {
    let bean = match (name, contract) {
        (Some(name), _) => container.resolve_name(name)?,
        (None, Some(contract)) => {
            let ty: ContractType = contract
                .parse()
                .with_context(|| format!("无法解析契约类型: {}", contract))?;
            let qualifiers = parse_qualifiers(container, qualifiers)?;
            container.resolve(&ty, &qualifiers)?
        }
        (None, None) => anyhow::bail!("需要指定契约类型或 --name"),
    };

    println!("{}", bean.describe());
    if let Some(specializer) = container.specializer_of(&bean.id) {
        println!("  被 {} 特化", specializer.id);
    }
    Ok(())
}

/// 按当前快照的标记目录解析命令行中的限定符
fn parse_qualifiers(container: &Container, raw: &[String]) -> anyhow::Result<Vec<Qualifier>> {
    let catalog = container.snapshot().deployment().marker_catalog()?;
    raw.iter()
        .map(|text| {
            let literal = match text.split_once(':') {
                Some((kind, members)) => members
                    .split(',')
                    .filter_map(|pair| pair.split_once('='))
                    .fold(MarkerLiteral::new(kind.trim()), |literal, (member, value)| {
                        literal.with(member.trim(), value.trim())
                    }),
                None => MarkerLiteral::new(text.trim()),
            };
            catalog
                .resolve(&literal, MarkerCategory::Qualifier)
                .with_context(|| format!("无效的限定符: {}", text))
        })
        .collect()
}
