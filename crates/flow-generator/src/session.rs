//! 单次会话的可变状态

use chrono::{Duration, NaiveDateTime};
use rand::Rng;

/// 每一步事件时间的抽样窗口（秒）
const STEP_WINDOW_SECS: i64 = 15 * 60;

/// 两次事件之间至少间隔的时间（秒）
const STEP_GAP_SECS: i64 = 60;

/// 会话状态，仅在一次行为流内部使用
#[derive(Debug, Clone)]
pub struct Session {
    pub logged_in: bool,
    pub found_item: Option<String>,
    /// 未找到商品时加入购物车的是 None
    pub cart: Vec<Option<String>>,
    clock: NaiveDateTime,
}

impl Session {
    /// 会话开始时视为已登录，购物车为空
    pub fn new(start: NaiveDateTime) -> Self {
        Self {
            logged_in: true,
            found_item: None,
            cart: Vec::new(),
            clock: start,
        }
    }

    /// 当前时间游标
    pub fn clock(&self) -> NaiveDateTime {
        self.clock
    }

    /// 抽取下一事件的时间并推进游标
    ///
    /// 事件时间在 `[clock, clock + 15min]` 内均匀抽样，之后游标移动到事件时间之后 1 分钟，
    /// 因此同一会话内的事件时间严格递增。
    pub fn tick<R: Rng + ?Sized>(&mut self, rng: &mut R) -> NaiveDateTime {
        let offset = Duration::seconds(rng.random_range(0..=STEP_WINDOW_SECS));
        let event_time = self.clock + offset;
        self.clock = event_time + Duration::seconds(STEP_GAP_SECS);
        event_time
    }
}
