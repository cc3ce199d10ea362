//! flowgen CLI
//!
//! 合成用户行为数据集生成工具的命令行入口。

use std::fs;

use anyhow::Context;
use clap::Parser;
use flow_generator::cli::{Cli, CommandRunner};
use flow_generator::params::{GeneratorParams, partition_time};
use flow_generator::pipeline::DatasetPipeline;
use flowgen_shared::config::AppConfig;
use flowgen_shared::observability;
use flowgen_shared::store::LocalDatasetStore;
use tracing::info;

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let mut config = AppConfig::load("flowgen").context("加载配置失败")?;

    // 命令行参数优先于配置文件与环境变量
    if let Some(data_dir) = cli.data_dir.clone() {
        config.generator.data_dir = data_dir;
    }
    if let Some(params) = cli.params.clone() {
        config.generator.params_path = Some(params);
    }
    let seed = cli.seed.or(config.generator.seed);

    let observability_config = config
        .observability
        .clone()
        .with_service_name(&config.service_name)
        .with_log_level(cli.log_level.as_deref());
    let guard = observability::init(&observability_config)?;

    let params = match &config.generator.params_path {
        Some(path) => GeneratorParams::from_file(path)
            .with_context(|| format!("加载生成参数失败: {}", path.display()))?,
        None => GeneratorParams::default(),
    };

    let at = partition_time(cli.at.as_deref()).context("无效的分区时间")?;

    info!(
        environment = %config.environment,
        data_dir = %config.generator.data_dir.display(),
        seed = ?seed,
        "flowgen 启动"
    );

    let pipeline = DatasetPipeline::new(LocalDatasetStore::new(&config.generator.data_dir), params);
    let mut runner = CommandRunner::new(pipeline, seed, at);

    let summary = runner.run(cli.command)?;
    println!("{}", summary);

    if let Some(path) = &cli.metrics_file {
        let snapshot = guard.render_metrics().unwrap_or_default();
        fs::write(path, snapshot)
            .with_context(|| format!("写入指标快照失败: {}", path.display()))?;
        info!(path = %path.display(), "指标快照已写入");
    }

    Ok(())
}
