//! 用户行为流生成
//!
//! 马尔可夫链给出一次会话的行为类型序列，`FlowSynthesizer` 为每一步
//! 附加事件时间、会话副作用、状态码和结果文本，得到完整的事件列表。

use chrono::NaiveDateTime;
use rand::Rng;
use serde::{Deserialize, Serialize};
use tracing::trace;

use crate::actions::ActionType;
use crate::error::{FlowError, Result};
use crate::markov::{INITIAL_STATE, MarkovChain, TERMINAL_STATE};
use crate::params::{CampaignWindow, GeneratorParams};
use crate::session::Session;
use crate::templates::{ResultRenderer, TemplateFields};

/// 每一步之后用户放弃会话的概率
pub const ABORT_PROBABILITY: f64 = 0.005;

/// 一条用户行为事件
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ActionEvent {
    #[serde(with = "event_time_format")]
    pub event_time: NaiveDateTime,
    pub user_id: String,
    pub action_type: ActionType,
    pub action_result: String,
    pub status_code: u16,
}

/// 事件时间的序列化格式：`2021-03-01 12:00:00`
mod event_time_format {
    use chrono::NaiveDateTime;
    use serde::{Deserialize, Deserializer, Serializer};

    const FORMAT: &str = "%Y-%m-%d %H:%M:%S";

    pub fn serialize<S: Serializer>(value: &NaiveDateTime, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(&value.format(FORMAT))
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<NaiveDateTime, D::Error> {
        let s = String::deserialize(deserializer)?;
        NaiveDateTime::parse_from_str(&s, FORMAT).map_err(serde::de::Error::custom)
    }
}

/// 一次会话的生成结果
#[derive(Debug, Clone, Default)]
pub struct FlowRun {
    pub events: Vec<ActionEvent>,
    /// 会话是否被提前放弃
    pub aborted: bool,
}

/// 用户行为流生成器
#[derive(Debug, Clone)]
pub struct FlowSynthesizer {
    chain: MarkovChain,
    renderer: ResultRenderer,
    window: CampaignWindow,
    abort_probability: f64,
}

impl FlowSynthesizer {
    /// 构建生成器
    ///
    /// 转移表中除 start/stop 以外的每个状态都必须是已知的行为类型
    pub fn new(params: &GeneratorParams, window: CampaignWindow) -> Result<Self> {
        let chain = MarkovChain::new(&params.transition_probs)?;

        for state in chain.states() {
            if state != INITIAL_STATE && state != TERMINAL_STATE {
                state.parse::<ActionType>()?;
            }
        }
        if !chain.contains(INITIAL_STATE) {
            return Err(FlowError::InvalidState {
                state: INITIAL_STATE.to_string(),
            });
        }

        Ok(Self {
            chain,
            renderer: ResultRenderer::new(params.action_results.clone()),
            window,
            abort_probability: ABORT_PROBABILITY,
        })
    }

    /// 修改提前放弃概率，取值会被限制在 [0, 1]，非有限值回退为默认概率
    pub fn with_abort_probability(mut self, probability: f64) -> Self {
        self.abort_probability = if probability.is_finite() {
            probability.clamp(0.0, 1.0)
        } else {
            ABORT_PROBABILITY
        };
        self
    }

    /// 为用户生成一次会话的事件
    pub fn generate_flow<R: Rng + ?Sized>(
        &self,
        user_id: &str,
        items_ids: &[String],
        rng: &mut R,
    ) -> Result<Vec<ActionEvent>> {
        Ok(self.run(user_id, items_ids, rng)?.events)
    }

    /// 生成一次会话，同时返回是否被提前放弃
    pub fn run<R: Rng + ?Sized>(
        &self,
        user_id: &str,
        items_ids: &[String],
        rng: &mut R,
    ) -> Result<FlowRun> {
        if items_ids.is_empty() {
            return Err(FlowError::EmptyPool("items_ids"));
        }

        let actions = self
            .chain
            .generate_states(INITIAL_STATE, TERMINAL_STATE, rng)
            .map(|state| state.and_then(str::parse::<ActionType>))
            .collect::<Result<Vec<_>>>()?;

        let mut session = Session::new(self.window.sample(rng));
        let mut run = FlowRun::default();

        // 相邻两步配对，最后一步的后继为 None
        let lookahead = actions.iter().skip(1).copied().map(Some).chain([None]);

        for (&action, next) in actions.iter().zip(lookahead) {
            let event_time = session.tick(rng);
            let item_id = &items_ids[rng.random_range(0..items_ids.len())];

            let outcome = action.apply(&mut session, item_id, next, rng);

            let fields = TemplateFields {
                user_id,
                item_id,
                found_item_id: session.found_item.as_deref(),
                cart: &session.cart,
                id_to_remove: outcome.id_to_remove.as_deref(),
            };
            let action_result = self
                .renderer
                .render(action, outcome.status_code, &fields)?;

            trace!(
                user_id,
                action = %action,
                status_code = outcome.status_code,
                "生成事件"
            );

            run.events.push(ActionEvent {
                event_time,
                user_id: user_id.to_string(),
                action_type: action,
                action_result,
                status_code: outcome.status_code,
            });

            if rng.random_bool(self.abort_probability) {
                run.aborted = true;
                break;
            }
        }

        Ok(run)
    }
}
