//! 命令执行器
//!
//! 负责执行各 CLI 子命令的具体逻辑。
//! 将命令行参数转化为数据集流水线调用，并返回一行执行摘要。

use anyhow::{Context, Result};
use chrono::NaiveDateTime;
use rand::SeedableRng;
use rand::rngs::StdRng;
use tracing::info;

use crate::cli::Commands;
use crate::pipeline::DatasetPipeline;

/// 命令执行器
///
/// 持有流水线、随机源和分区时间。
/// 同一个执行器内的多次调用共享随机源，种子相同则整体输出相同。
pub struct CommandRunner {
    pipeline: DatasetPipeline,
    rng: StdRng,
    at: NaiveDateTime,
}

impl CommandRunner {
    /// 创建命令执行器
    ///
    /// 未指定种子时使用操作系统随机源
    pub fn new(pipeline: DatasetPipeline, seed: Option<u64>, at: NaiveDateTime) -> Self {
        let rng = match seed {
            Some(seed) => StdRng::seed_from_u64(seed),
            None => StdRng::from_os_rng(),
        };
        Self { pipeline, rng, at }
    }

    /// 执行子命令，返回执行摘要
    pub fn run(&mut self, command: Commands) -> Result<String> {
        match command {
            Commands::UserIds { size } => self.run_user_ids(size),
            Commands::Items { size, n_del } => self.run_items(size, n_del),
            Commands::UserActions {
                size,
                start_date,
                end_date,
            } => self.run_user_actions(size, start_date, end_date),
            Commands::RotateItems { n_del } => self.run_rotate_items(n_del),
        }
    }

    /// 执行 user-ids 命令
    pub fn run_user_ids(&mut self, size: usize) -> Result<String> {
        info!(size, at = %self.at, "生成用户 ID");

        let report = self
            .pipeline
            .user_ids(&mut self.rng, size, self.at)
            .context("生成用户 ID 数据集失败")?;

        Ok(format!("{} user ids generated.", report.records))
    }

    /// 执行 items 命令
    pub fn run_items(&mut self, size: usize, n_del: usize) -> Result<String> {
        info!(size, n_del, at = %self.at, "生成商品");

        let report = self
            .pipeline
            .items(&mut self.rng, size, n_del, self.at)
            .context("生成商品数据集失败")?;

        Ok(format!(
            "{} items generated. {} items were deleted.",
            report.items.records, report.rotation.retired
        ))
    }

    /// 执行 user-actions 命令
    ///
    /// 命令行提供的时间窗口覆盖参数文件中的值
    pub fn run_user_actions(
        &mut self,
        size: usize,
        start_date: Option<String>,
        end_date: Option<String>,
    ) -> Result<String> {
        info!(
            size,
            start_date = ?start_date,
            end_date = ?end_date,
            at = %self.at,
            "生成用户行为"
        );

        let params = self
            .pipeline
            .params()
            .clone()
            .with_window(start_date, end_date);
        let pipeline = DatasetPipeline::new(self.pipeline.store().clone(), params);

        let report = pipeline
            .user_actions(&mut self.rng, size, self.at)
            .context("生成用户行为数据集失败")?;

        Ok(format!("{} user actions generated.", report.records))
    }

    /// 执行 rotate-items 命令
    pub fn run_rotate_items(&mut self, n_del: usize) -> Result<String> {
        info!(n_del, at = %self.at, "轮换上架商品");

        let report = self
            .pipeline
            .rotate_items(&mut self.rng, n_del, self.at)
            .context("商品上下架轮换失败")?;

        Ok(format!("{} items were deleted.", report.retired))
    }
}
