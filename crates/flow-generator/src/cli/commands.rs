//! CLI 命令定义
//!
//! 使用 clap derive 宏定义命令行接口结构。
//! 每个子命令对应一个数据集流水线。

use std::path::PathBuf;

use clap::{Parser, Subcommand};

/// 合成用户行为数据集生成工具
///
/// 使用 `--help` 查看各子命令的详细说明。
#[derive(Parser, Debug)]
#[command(name = "flowgen")]
#[command(version, about = "合成电商用户行为数据集生成工具")]
#[command(propagate_version = true)]
pub struct Cli {
    /// 日志级别 (trace, debug, info, warn, error)，覆盖配置文件
    #[arg(short, long, global = true)]
    pub log_level: Option<String>,

    /// 随机种子，设置后输出可复现
    #[arg(long, global = true)]
    pub seed: Option<u64>,

    /// 数据集根目录，覆盖配置文件
    #[arg(long, global = true)]
    pub data_dir: Option<PathBuf>,

    /// 生成参数文件（generator_params.json）
    #[arg(short, long, global = true)]
    pub params: Option<PathBuf>,

    /// 分区时间（ISO-8601），默认为本地当前时间
    #[arg(long, global = true)]
    pub at: Option<String>,

    /// 命令结束后将 Prometheus 指标快照写入该文件
    #[arg(long, global = true)]
    pub metrics_file: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Commands,
}

/// 子命令枚举
#[derive(Subcommand, Debug)]
pub enum Commands {
    /// 生成用户 ID 数据集
    UserIds {
        /// 用户数量
        #[arg(short, long, default_value = "1000")]
        size: usize,
    },

    /// 生成商品数据集，并轮换上架商品列表
    Items {
        /// 商品数量
        #[arg(short, long, default_value = "1000")]
        size: usize,

        /// 从上架列表中下架的商品数量
        #[arg(long, default_value = "5")]
        n_del: usize,
    },

    /// 生成用户行为数据集
    ///
    /// 读取最新的用户 ID 与上架商品列表。
    /// 未指定时间窗口且参数文件中也没有时，会话开始时间落在分区时间之前的一小时内。
    UserActions {
        /// 目标事件数量，最后一个会话不会被截断
        #[arg(short, long, default_value = "10000")]
        size: usize,

        /// 会话开始时间窗口起点
        #[arg(long)]
        start_date: Option<String>,

        /// 会话开始时间窗口终点
        #[arg(long)]
        end_date: Option<String>,
    },

    /// 仅执行商品上下架轮换
    RotateItems {
        /// 下架的商品数量
        #[arg(long, default_value = "5")]
        n_del: usize,
    },
}

// ============================================================================
// 单元测试
// ============================================================================
