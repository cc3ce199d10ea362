//! 用户行为类型与业务规则
//!
//! 每种行为类型对应一个枚举变体，`ActionType::apply` 中的 match
//! 覆盖全部变体，新增行为时编译器会强制补齐对应规则。

use std::fmt;
use std::str::FromStr;

use rand::Rng;
use serde::{Deserialize, Serialize};

use crate::error::FlowError;
use crate::session::Session;

/// 放弃搜索时随机返回的状态码
const ABANDONED_SEARCH_CODES: [u16; 3] = [200, 204, 404];

/// 支付成功概率，剩余概率在 400 与 402 之间平分
const PAY_SUCCESS_PROBABILITY: f64 = 0.9;

/// 用户行为类型
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ActionType {
    LogIn,
    OpenStore,
    SearchItem,
    AddToCart,
    ViewCart,
    RemoveFromCart,
    Pay,
    LogOut,
}

impl ActionType {
    /// 全部行为类型
    pub const ALL: [ActionType; 8] = [
        Self::LogIn,
        Self::OpenStore,
        Self::SearchItem,
        Self::AddToCart,
        Self::ViewCart,
        Self::RemoveFromCart,
        Self::Pay,
        Self::LogOut,
    ];

    /// 转移表和结果模板中使用的名称
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::LogIn => "log_in",
            Self::OpenStore => "open_store",
            Self::SearchItem => "search_item",
            Self::AddToCart => "add_to_cart",
            Self::ViewCart => "view_cart",
            Self::RemoveFromCart => "remove_from_cart",
            Self::Pay => "pay",
            Self::LogOut => "log_out",
        }
    }

    /// 执行一步行为，更新会话状态并返回状态码
    ///
    /// - `candidate`：本步随机抽中的商品 ID，仅 search_item 使用
    /// - `next`：下一步的行为类型，最后一步为 None
    pub fn apply<R: Rng + ?Sized>(
        &self,
        session: &mut Session,
        candidate: &str,
        next: Option<ActionType>,
        rng: &mut R,
    ) -> StepOutcome {
        match self {
            Self::LogIn => {
                // 登录前的会话状态视为未登录
                session.logged_in = false;
                StepOutcome::status(200)
            }
            Self::OpenStore => {
                let status = if session.logged_in { 100 } else { 200 };
                session.logged_in = true;
                StepOutcome::status(status)
            }
            Self::SearchItem => {
                if matches!(next, Some(Self::OpenStore | Self::ViewCart)) {
                    // 用户放弃了这次搜索，结果随机
                    let idx = rng.random_range(0..ABANDONED_SEARCH_CODES.len());
                    StepOutcome::status(ABANDONED_SEARCH_CODES[idx])
                } else {
                    session.found_item = Some(candidate.to_string());
                    StepOutcome::status(200)
                }
            }
            Self::AddToCart => {
                // 没有找到商品时同样加入购物车，记为 None
                session.cart.push(session.found_item.clone());
                StepOutcome::status(200)
            }
            Self::ViewCart => {
                let status = if session.cart.is_empty() { 204 } else { 200 };
                StepOutcome::status(status)
            }
            Self::RemoveFromCart => {
                if session.cart.is_empty() {
                    StepOutcome::status(405)
                } else {
                    let idx = rng.random_range(0..session.cart.len());
                    StepOutcome {
                        status_code: 200,
                        id_to_remove: session.cart.remove(idx),
                    }
                }
            }
            Self::Pay => {
                if session.cart.is_empty() {
                    StepOutcome::status(405)
                } else if rng.random::<f64>() < PAY_SUCCESS_PROBABILITY {
                    StepOutcome::status(200)
                } else if rng.random_bool(0.5) {
                    StepOutcome::status(400)
                } else {
                    StepOutcome::status(402)
                }
            }
            Self::LogOut => StepOutcome::status(200),
        }
    }
}

impl fmt::Display for ActionType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ActionType {
    type Err = FlowError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|action| action.as_str() == s)
            .ok_or_else(|| FlowError::UnknownAction(s.to_string()))
    }
}

/// 单步行为的执行结果
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StepOutcome {
    pub status_code: u16,
    /// remove_from_cart 成功时被移除的商品，移除的是空条目时为 None
    pub id_to_remove: Option<String>,
}

impl StepOutcome {
    fn status(status_code: u16) -> Self {
        Self {
            status_code,
            id_to_remove: None,
        }
    }
}
