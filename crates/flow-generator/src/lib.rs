//! Flow Generator
//!
//! 合成电商用户行为数据集生成器。
//!
//! # 主要模块
//!
//! - `markov`: 马尔可夫链状态游走
//! - `actions` / `session`: 行为类型、业务规则与会话状态
//! - `flow`: 单次会话的事件生成
//! - `batch`: 按目标数量批量生成会话
//! - `catalog`: 用户 ID 与商品生成
//! - `pipeline`: 按小时分区写入数据集
//!
//! # 使用示例
//!
//! ```rust
//! use flow_generator::batch::generate_user_actions;
//! use flow_generator::params::GeneratorParams;
//! use rand::SeedableRng;
//! use rand::rngs::StdRng;
//!
//! let params = GeneratorParams::default().with_window(
//!     Some("2021-01-01".to_string()),
//!     Some("2021-12-31".to_string()),
//! );
//! let user_ids = vec!["u1".to_string(), "u2".to_string()];
//! let items_ids = vec!["i1".to_string(), "i2".to_string()];
//!
//! let mut rng = StdRng::seed_from_u64(42);
//! let events = generate_user_actions(&params, &user_ids, &items_ids, 100, &mut rng).unwrap();
//! assert!(events.len() >= 100);
//! ```

pub mod actions;
pub mod batch;
pub mod catalog;
pub mod cli;
pub mod error;
pub mod flow;
pub mod markov;
pub mod params;
pub mod pipeline;
pub mod session;
pub mod templates;

pub use actions::ActionType;
pub use batch::generate_user_actions;
pub use error::{FlowError, Result};
pub use flow::{ActionEvent, FlowSynthesizer};
pub use markov::MarkovChain;
pub use params::GeneratorParams;
