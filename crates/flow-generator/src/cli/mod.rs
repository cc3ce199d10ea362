//! CLI 模块
//!
//! 提供命令行接口，支持以下功能：
//!
//! - `user-ids` - 生成用户 ID 数据集
//! - `items` - 生成商品数据集并轮换上架列表
//! - `user-actions` - 生成用户行为数据集
//! - `rotate-items` - 仅轮换上架列表
//!
//! # 使用示例
//!
//! ```bash
//! flowgen --seed 42 user-ids --size 1000
//! flowgen items --size 1000 --n-del 5
//! flowgen user-actions --size 10000 --start-date 2021-01-01 --end-date 2021-12-31
//! flowgen rotate-items --n-del 5 --metrics-file metrics.prom
//! ```

pub mod commands;
pub mod runner;

pub use commands::{Cli, Commands};
pub use runner::CommandRunner;
