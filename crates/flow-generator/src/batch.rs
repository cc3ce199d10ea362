//! 批量会话生成
//!
//! 随机挑选用户反复生成完整会话，直到累计事件数达到目标数量。
//! 最后一个会话不会被截断，因此结果可能超出目标数量最多一个会话的长度。

use flowgen_shared::observability::metrics as flow_metrics;
use rand::Rng;
use tracing::{debug, info};

use crate::error::{FlowError, Result};
use crate::flow::{ActionEvent, FlowSynthesizer};
use crate::params::GeneratorParams;

/// 连续产生空会话的上限，超过后认为转移表只能生成空路径
pub const MAX_CONSECUTIVE_EMPTY_FLOWS: usize = 1000;

/// 按生成参数批量生成用户行为事件
///
/// 时间窗口取自参数中的 start_date/end_date，缺失时使用当前时间之前的一小时。
pub fn generate_user_actions<R: Rng + ?Sized>(
    params: &GeneratorParams,
    user_ids: &[String],
    items_ids: &[String],
    size: usize,
    rng: &mut R,
) -> Result<Vec<ActionEvent>> {
    let synthesizer = FlowSynthesizer::new(params, params.campaign_window()?)?;
    generate_batch(&synthesizer, user_ids, items_ids, size, rng)
}

/// 使用已构建的生成器批量生成事件
///
/// 至少生成一个会话，`size` 为 0 时同样如此。
pub fn generate_batch<R: Rng + ?Sized>(
    synthesizer: &FlowSynthesizer,
    user_ids: &[String],
    items_ids: &[String],
    size: usize,
    rng: &mut R,
) -> Result<Vec<ActionEvent>> {
    if user_ids.is_empty() {
        return Err(FlowError::EmptyPool("user_ids"));
    }
    if items_ids.is_empty() {
        return Err(FlowError::EmptyPool("items_ids"));
    }

    let mut events = Vec::new();
    let mut flows = 0usize;
    let mut empty_streak = 0usize;

    loop {
        let user_id = &user_ids[rng.random_range(0..user_ids.len())];
        let run = synthesizer.run(user_id, items_ids, rng)?;

        flows += 1;
        flow_metrics::record_flow(run.events.len(), run.aborted);
        debug!(
            user_id = %user_id,
            events = run.events.len(),
            aborted = run.aborted,
            "会话生成完成"
        );

        if run.events.is_empty() {
            empty_streak += 1;
            if empty_streak >= MAX_CONSECUTIVE_EMPTY_FLOWS {
                return Err(FlowError::EmptyFlow {
                    attempts: empty_streak,
                });
            }
        } else {
            empty_streak = 0;
        }

        events.extend(run.events);
        if events.len() >= size {
            break;
        }
    }

    info!(
        flows,
        events = events.len(),
        target = size,
        "用户行为批量生成完成"
    );

    Ok(events)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::params::CampaignWindow;
    use chrono::NaiveDateTime;
    use rand::SeedableRng;
    use rand::rngs::StdRng;
    use serde_json::json;

    fn params() -> GeneratorParams {
        GeneratorParams::default().with_window(
            Some("2021-01-01T00:00:00".to_string()),
            Some("2021-12-31T00:00:00".to_string()),
        )
    }

    fn ids(prefix: &str, n: usize) -> Vec<String> {
        (0..n).map(|i| format!("{prefix}{i}")).collect()
    }

    #[test]
    fn test_reaches_target_size() {
        let mut rng = StdRng::seed_from_u64(42);
        let events =
            generate_user_actions(&params(), &ids("u", 5), &ids("i", 10), 500, &mut rng).unwrap();

        assert!(events.len() >= 500);
        let users = ids("u", 5);
        assert!(events.iter().all(|e| users.contains(&e.user_id)));
    }

    #[test]
    fn test_zero_size_returns_one_flow() {
        let mut rng = StdRng::seed_from_u64(1);
        let mut p = params();
        p.transition_probs =
            serde_json::from_value(json!({"start": {"log_in": 1.0}, "log_in": {"stop": 1.0}}))
                .unwrap();

        let events = generate_user_actions(&p, &ids("u", 1), &ids("i", 1), 0, &mut rng).unwrap();
        assert_eq!(events.len(), 1);
    }

    #[test]
    fn test_overshoot_keeps_whole_session() {
        let mut p = params();
        p.transition_probs = serde_json::from_value(json!({
            "start": {"log_in": 1.0},
            "log_in": {"open_store": 1.0},
            "open_store": {"log_out": 1.0},
            "log_out": {"stop": 1.0}
        }))
        .unwrap();
        let window = p.campaign_window().unwrap();
        let synth = FlowSynthesizer::new(&p, window)
            .unwrap()
            .with_abort_probability(0.0);
        let mut rng = StdRng::seed_from_u64(2);

        // 每个会话固定 3 个事件，目标 4 个时生成 2 个完整会话
        let events = generate_batch(&synth, &ids("u", 2), &ids("i", 2), 4, &mut rng).unwrap();
        assert_eq!(events.len(), 6);
    }

    #[test]
    fn test_same_seed_same_output() {
        let run = |seed| {
            let mut rng = StdRng::seed_from_u64(seed);
            generate_user_actions(&params(), &ids("u", 3), &ids("i", 3), 100, &mut rng).unwrap()
        };

        assert_eq!(run(7), run(7));
        assert_ne!(run(7), run(8));
    }

    #[test]
    fn test_empty_pools_rejected() {
        let mut rng = StdRng::seed_from_u64(3);

        let err = generate_user_actions(&params(), &[], &ids("i", 1), 10, &mut rng).unwrap_err();
        assert!(matches!(err, FlowError::EmptyPool("user_ids")));

        let err = generate_user_actions(&params(), &ids("u", 1), &[], 10, &mut rng).unwrap_err();
        assert!(matches!(err, FlowError::EmptyPool("items_ids")));
    }

    #[test]
    fn test_only_empty_flows_rejected() {
        let mut p = params();
        p.transition_probs = serde_json::from_value(json!({"start": {"stop": 1.0}})).unwrap();
        let start = NaiveDateTime::parse_from_str("2021-01-01 00:00:00", "%Y-%m-%d %H:%M:%S")
            .unwrap();
        let synth = FlowSynthesizer::new(&p, CampaignWindow::new(start, start).unwrap()).unwrap();
        let mut rng = StdRng::seed_from_u64(4);

        let err = generate_batch(&synth, &ids("u", 1), &ids("i", 1), 1, &mut rng).unwrap_err();
        assert!(matches!(
            err,
            FlowError::EmptyFlow {
                attempts: MAX_CONSECUTIVE_EMPTY_FLOWS
            }
        ));
    }

    #[test]
    fn test_huge_target_with_empty_flows() {
        let mut p = params();
        p.transition_probs = serde_json::from_value(json!({"start": {"stop": 1.0}})).unwrap();
        let start = NaiveDateTime::parse_from_str("2021-01-01 00:00:00", "%Y-%m-%d %H:%M:%S")
            .unwrap();
        let synth = FlowSynthesizer::new(&p, CampaignWindow::new(start, start).unwrap()).unwrap();
        let mut rng = StdRng::seed_from_u64(5);

        // 目标数量不会被用来预分配内存
        let err =
            generate_batch(&synth, &ids("u", 1), &ids("i", 1), usize::MAX, &mut rng).unwrap_err();
        assert!(matches!(err, FlowError::EmptyFlow { .. }));
    }
}
