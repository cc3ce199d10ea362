//! 共享库
//!
//! 包含生成器各入口共用的配置、错误处理、可观测性以及数据集存储等基础设施代码。

pub mod config;
pub mod error;
pub mod observability;
pub mod store;
