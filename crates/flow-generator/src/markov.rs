//! 马尔可夫链状态游走
//!
//! 给定转移概率表、初始状态和终止状态，生成一条有限的中间状态序列。
//! 每一行概率在构建时编译为加权分布，抽样时自动归一化，
//! 因此浮点舍入导致的概率和不为 1 不会影响抽样。

use std::collections::BTreeMap;
use std::iter::FusedIterator;

use rand::Rng;
use rand::distr::Distribution;
use rand::distr::weighted::WeightedIndex;

use crate::error::{FlowError, Result};

/// 转移概率表：当前状态 -> (下一状态 -> 概率)
///
/// 使用有序 Map，保证同一随机种子下的游走结果与哈希顺序无关
pub type TransitionTable = BTreeMap<String, BTreeMap<String, f64>>;

/// 会话流的初始状态
pub const INITIAL_STATE: &str = "start";
/// 会话流的终止状态，永远不会作为源状态
pub const TERMINAL_STATE: &str = "stop";

/// 编译后的一行转移分布
#[derive(Debug, Clone)]
struct TransitionRow {
    targets: Vec<String>,
    weights: WeightedIndex<f64>,
}

/// 马尔可夫链
///
/// 构建时校验每一行概率都可以归一化；状态缺失只在游走到该状态时才报错，
/// 与转移表中是否真的可达保持一致。
#[derive(Debug, Clone)]
pub struct MarkovChain {
    rows: BTreeMap<String, TransitionRow>,
}

impl MarkovChain {
    /// 从转移表构建马尔可夫链
    pub fn new(table: &TransitionTable) -> Result<Self> {
        let mut rows = BTreeMap::new();

        for (state, transitions) in table {
            if transitions.is_empty() {
                return Err(FlowError::InvalidTransitions {
                    state: state.clone(),
                    reason: "没有任何后继状态".to_string(),
                });
            }

            let weights = WeightedIndex::new(transitions.values().copied()).map_err(|e| {
                FlowError::InvalidTransitions {
                    state: state.clone(),
                    reason: e.to_string(),
                }
            })?;

            rows.insert(
                state.clone(),
                TransitionRow {
                    targets: transitions.keys().cloned().collect(),
                    weights,
                },
            );
        }

        Ok(Self { rows })
    }

    /// 从当前状态抽取下一个状态
    ///
    /// 当前状态不在转移表中时返回 `InvalidState`（例如把终止状态当作源状态）
    pub fn next_state<R: Rng + ?Sized>(&self, current: &str, rng: &mut R) -> Result<&str> {
        let row = self
            .rows
            .get(current)
            .ok_or_else(|| FlowError::InvalidState {
                state: current.to_string(),
            })?;

        Ok(&row.targets[row.weights.sample(rng)])
    }

    /// 从 `initial` 开始游走，直到抽到 `terminal`
    ///
    /// 返回惰性、一次性的状态序列，终止状态本身不会出现在序列中。
    /// 链本身不限制长度，能否终止取决于转移表中每个状态都有通往终止状态的路径。
    pub fn generate_states<'a, R: Rng + ?Sized>(
        &'a self,
        initial: &'a str,
        terminal: &'a str,
        rng: &'a mut R,
    ) -> StateWalk<'a, R> {
        StateWalk {
            chain: self,
            current: Some(initial),
            terminal,
            rng,
        }
    }

    /// 所有出现在转移表中的状态（源状态与目标状态）
    pub fn states(&self) -> impl Iterator<Item = &str> {
        self.rows
            .iter()
            .flat_map(|(state, row)| {
                std::iter::once(state.as_str()).chain(row.targets.iter().map(String::as_str))
            })
    }

    /// 状态是否作为源状态出现在转移表中
    pub fn contains(&self, state: &str) -> bool {
        self.rows.contains_key(state)
    }
}

/// 一次随机游走
///
/// 每次 `next` 抽取一个状态；抽到终止状态或出现错误后迭代结束。
pub struct StateWalk<'a, R: Rng + ?Sized> {
    chain: &'a MarkovChain,
    current: Option<&'a str>,
    terminal: &'a str,
    rng: &'a mut R,
}

impl<'a, R: Rng + ?Sized> Iterator for StateWalk<'a, R> {
    type Item = Result<&'a str>;

    fn next(&mut self) -> Option<Self::Item> {
        let current = self.current?;

        match self.chain.next_state(current, self.rng) {
            Ok(next) if next == self.terminal => {
                self.current = None;
                None
            }
            Ok(next) => {
                self.current = Some(next);
                Some(Ok(next))
            }
            Err(e) => {
                self.current = None;
                Some(Err(e))
            }
        }
    }
}

impl<R: Rng + ?Sized> FusedIterator for StateWalk<'_, R> {}
