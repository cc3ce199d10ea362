//! 生成参数
//!
//! 对应 `generator_params.json`，字段缺失时使用内置默认值。

use std::collections::BTreeMap;
use std::fs;
use std::path::Path;

use chrono::{DateTime, Duration, Local, NaiveDate, NaiveDateTime};
use flowgen_shared::error::FlowgenError;
use rand::Rng;
use serde::{Deserialize, Serialize};

use crate::error::{FlowError, Result};
use crate::markov::TransitionTable;
use crate::templates::ActionResults;

/// 生成参数
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GeneratorParams {
    #[serde(default = "default_transition_probs")]
    pub transition_probs: TransitionTable,
    #[serde(default = "default_action_results")]
    pub action_results: ActionResults,
    /// 会话开始时间窗口，ISO-8601
    #[serde(default)]
    pub start_date: Option<String>,
    #[serde(default)]
    pub end_date: Option<String>,
    #[serde(default = "default_item_types")]
    pub item_types: Vec<String>,
    /// 免费商品比例
    #[serde(default = "default_pfi")]
    pub pfi: f64,
    #[serde(default = "default_price_lower")]
    pub price_lower: f64,
    #[serde(default = "default_price_upper")]
    pub price_upper: f64,
}

impl Default for GeneratorParams {
    fn default() -> Self {
        Self {
            transition_probs: default_transition_probs(),
            action_results: default_action_results(),
            start_date: None,
            end_date: None,
            item_types: default_item_types(),
            pfi: default_pfi(),
            price_lower: default_price_lower(),
            price_upper: default_price_upper(),
        }
    }
}

impl GeneratorParams {
    /// 从 JSON 文件加载参数
    pub fn from_file(path: &Path) -> Result<Self> {
        let content = fs::read(path).map_err(|e| FlowgenError::io(path, e))?;
        let params = serde_json::from_slice(&content).map_err(FlowgenError::from)?;
        Ok(params)
    }

    /// 覆盖时间窗口，只覆盖提供了的一端
    pub fn with_window(mut self, start_date: Option<String>, end_date: Option<String>) -> Self {
        if start_date.is_some() {
            self.start_date = start_date;
        }
        if end_date.is_some() {
            self.end_date = end_date;
        }
        self
    }

    /// 解析会话开始时间窗口，缺少任一端时使用本地当前时间之前的一小时
    pub fn campaign_window(&self) -> Result<CampaignWindow> {
        self.campaign_window_at(Local::now().naive_local())
    }

    /// 以 `now` 为基准解析时间窗口
    pub fn campaign_window_at(&self, now: NaiveDateTime) -> Result<CampaignWindow> {
        match (&self.start_date, &self.end_date) {
            (Some(start), Some(end)) => {
                CampaignWindow::new(parse_datetime(start)?, parse_datetime(end)?)
            }
            _ => CampaignWindow::new(now - Duration::hours(1), now),
        }
    }

    /// 校验商品生成相关参数
    pub fn validate_items(&self) -> Result<()> {
        if !(0.0..=1.0).contains(&self.pfi) {
            return Err(FlowError::invalid_params("pfi", "必须在 [0, 1] 范围内"));
        }
        if !(self.price_lower >= 0.0 && self.price_lower < self.price_upper) {
            return Err(FlowError::invalid_params(
                "price_lower",
                format!(
                    "价格区间无效: [{}, {})",
                    self.price_lower, self.price_upper
                ),
            ));
        }
        if self.item_types.is_empty() {
            return Err(FlowError::invalid_params("item_types", "商品类型不能为空"));
        }
        Ok(())
    }
}

/// 会话开始时间的抽样窗口
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CampaignWindow {
    start: NaiveDateTime,
    end: NaiveDateTime,
}

impl CampaignWindow {
    pub fn new(start: NaiveDateTime, end: NaiveDateTime) -> Result<Self> {
        if start > end {
            return Err(FlowError::InvalidWindow {
                start: start.to_string(),
                end: end.to_string(),
            });
        }
        Ok(Self { start, end })
    }

    pub fn start(&self) -> NaiveDateTime {
        self.start
    }

    pub fn end(&self) -> NaiveDateTime {
        self.end
    }

    /// 在窗口内按秒均匀抽取一个时间点
    pub fn sample<R: Rng + ?Sized>(&self, rng: &mut R) -> NaiveDateTime {
        let span = (self.end - self.start).num_seconds();
        self.start + Duration::seconds(rng.random_range(0..=span))
    }
}

/// 解析 ISO-8601 时间
///
/// 支持 RFC 3339、`YYYY-MM-DDTHH:MM:SS[.fff]`、`YYYY-MM-DD HH:MM:SS` 以及只有日期的形式
pub fn parse_datetime(value: &str) -> Result<NaiveDateTime> {
    let value = value.trim();

    if let Ok(dt) = DateTime::parse_from_rfc3339(value) {
        return Ok(dt.naive_utc());
    }
    for format in ["%Y-%m-%dT%H:%M:%S%.f", "%Y-%m-%d %H:%M:%S%.f"] {
        if let Ok(dt) = NaiveDateTime::parse_from_str(value, format) {
            return Ok(dt);
        }
    }
    if let Some(dt) = NaiveDate::parse_from_str(value, "%Y-%m-%d")
        .ok()
        .and_then(|d| d.and_hms_opt(0, 0, 0))
    {
        return Ok(dt);
    }

    Err(FlowError::InvalidDate(value.to_string()))
}

/// 数据集分区时间，未指定时取本地当前时间
pub fn partition_time(at: Option<&str>) -> Result<NaiveDateTime> {
    match at {
        Some(at) => parse_datetime(at),
        None => Ok(Local::now().naive_local()),
    }
}

// ==================== 默认参数 ====================

fn default_transition_probs() -> TransitionTable {
    let rows: [(&str, &[(&str, f64)]); 9] = [
        ("start", &[("log_in", 0.5), ("open_store", 0.5)]),
        ("log_in", &[("open_store", 1.0)]),
        ("open_store", &[("search_item", 0.85), ("view_cart", 0.15)]),
        (
            "search_item",
            &[("add_to_cart", 0.6), ("open_store", 0.3), ("view_cart", 0.1)],
        ),
        ("add_to_cart", &[("view_cart", 0.6), ("open_store", 0.4)]),
        (
            "view_cart",
            &[("pay", 0.4), ("open_store", 0.4), ("remove_from_cart", 0.2)],
        ),
        ("remove_from_cart", &[("view_cart", 0.8), ("open_store", 0.2)]),
        ("pay", &[("log_out", 0.7), ("stop", 0.3)]),
        ("log_out", &[("stop", 1.0)]),
    ];

    rows.into_iter()
        .map(|(state, targets)| {
            let targets = targets
                .iter()
                .map(|(target, p)| (target.to_string(), *p))
                .collect();
            (state.to_string(), targets)
        })
        .collect()
}

fn default_action_results() -> ActionResults {
    let rows: [(&str, &[(&str, &str)]); 8] = [
        ("log_in", &[("200", "User {user_id} logged in.")]),
        (
            "open_store",
            &[
                ("100", "User {user_id} was logged in. Keep buying."),
                ("200", "User {user_id} was not logged in. Start buying."),
            ],
        ),
        (
            "search_item",
            &[
                ("404", "Item not found."),
                ("204", "Item {item_id} not available."),
                ("200", "Item {item_id} available."),
            ],
        ),
        ("add_to_cart", &[("200", "Add item {found_item_id} to cart.")]),
        ("view_cart", &[("200", "{cart}"), ("204", "{cart}")]),
        (
            "remove_from_cart",
            &[
                ("200", "Item {id_to_remove} removed from cart."),
                ("405", "Cart is empty."),
            ],
        ),
        (
            "pay",
            &[
                ("200", "Payment successful."),
                ("400", "Payment failed."),
                ("402", "Payment failed."),
                ("405", "Payment failed. Cart is empty."),
            ],
        ),
        ("log_out", &[("200", "User {user_id} logged out.")]),
    ];

    rows.into_iter()
        .map(|(action, templates)| {
            let templates = templates
                .iter()
                .map(|(status, text)| (status.to_string(), text.to_string()))
                .collect::<BTreeMap<_, _>>();
            (action.to_string(), templates)
        })
        .collect()
}

fn default_item_types() -> Vec<String> {
    ["office", "game", "photography", "fitness"]
        .into_iter()
        .map(String::from)
        .collect()
}

fn default_pfi() -> f64 {
    0.05
}

fn default_price_lower() -> f64 {
    0.01
}

fn default_price_upper() -> f64 {
    50.0
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::SeedableRng;
    use rand::rngs::StdRng;

    fn dt(s: &str) -> NaiveDateTime {
        NaiveDateTime::parse_from_str(s, "%Y-%m-%d %H:%M:%S").unwrap()
    }

    #[test]
    fn test_default_params() {
        let params = GeneratorParams::default();

        assert_eq!(params.transition_probs.len(), 9);
        assert!(!params.transition_probs.contains_key("stop"));
        for row in params.transition_probs.values() {
            let sum: f64 = row.values().sum();
            assert!((sum - 1.0).abs() < 1e-9);
        }
        assert_eq!(params.action_results["pay"].len(), 4);
        assert_eq!(params.item_types.len(), 4);
        assert!(params.validate_items().is_ok());
    }

    #[test]
    fn test_partial_json_uses_defaults() {
        let params: GeneratorParams = serde_json::from_str(
            r#"{"start_date": "2021-01-01", "end_date": "2021-12-31", "pfi": 0.1}"#,
        )
        .unwrap();

        assert_eq!(params.pfi, 0.1);
        assert_eq!(params.price_upper, 50.0);
        assert_eq!(params.transition_probs, default_transition_probs());
    }

    #[test]
    fn test_from_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("generator_params.json");
        fs::write(&path, r#"{"item_types": ["book"]}"#).unwrap();

        let params = GeneratorParams::from_file(&path).unwrap();
        assert_eq!(params.item_types, vec!["book".to_string()]);

        let err = GeneratorParams::from_file(&dir.path().join("missing.json")).unwrap_err();
        assert_eq!(err.code(), "IO_ERROR");

        fs::write(&path, "not json").unwrap();
        let err = GeneratorParams::from_file(&path).unwrap_err();
        assert_eq!(err.code(), "JSON_ERROR");
    }

    #[test]
    fn test_bundled_params_match_defaults() {
        let path = Path::new(env!("CARGO_MANIFEST_DIR")).join("../../config/generator_params.json");
        let params = GeneratorParams::from_file(&path).unwrap();

        assert_eq!(params.transition_probs, default_transition_probs());
        assert_eq!(params.action_results, default_action_results());
        assert!(params.campaign_window().is_ok());
    }

    #[test]
    fn test_parse_datetime_formats() {
        let expected = dt("2021-01-01 10:30:00");

        assert_eq!(parse_datetime("2021-01-01T10:30:00").unwrap(), expected);
        assert_eq!(parse_datetime("2021-01-01 10:30:00").unwrap(), expected);
        assert_eq!(parse_datetime("2021-01-01T10:30:00.000").unwrap(), expected);
        assert_eq!(parse_datetime("2021-01-01T12:30:00+02:00").unwrap(), expected);
        assert_eq!(
            parse_datetime("2021-01-01").unwrap(),
            dt("2021-01-01 00:00:00")
        );

        let err = parse_datetime("01/01/2021").unwrap_err();
        assert_eq!(err.code(), "INVALID_DATE");
    }

    #[test]
    fn test_partition_time() {
        assert_eq!(
            partition_time(Some("2022-01-20 13:05:00")).unwrap(),
            dt("2022-01-20 13:05:00")
        );
        assert_eq!(partition_time(Some("bad")).unwrap_err().code(), "INVALID_DATE");

        // 默认值与本地时钟一致，而不是 UTC
        let before = Local::now().naive_local();
        let at = partition_time(None).unwrap();
        let after = Local::now().naive_local();
        assert!(before <= at && at <= after);
    }

    #[test]
    fn test_campaign_window_from_params() {
        let params = GeneratorParams::default().with_window(
            Some("2021-01-01".to_string()),
            Some("2021-01-02".to_string()),
        );
        let window = params.campaign_window().unwrap();

        assert_eq!(window.start(), dt("2021-01-01 00:00:00"));
        assert_eq!(window.end(), dt("2021-01-02 00:00:00"));
    }

    #[test]
    fn test_campaign_window_falls_back_to_previous_hour() {
        let now = dt("2022-01-20 13:05:00");

        // 只提供一端时同样回退
        let params = GeneratorParams::default().with_window(Some("2021-01-01".to_string()), None);
        let window = params.campaign_window_at(now).unwrap();

        assert_eq!(window.start(), dt("2022-01-20 12:05:00"));
        assert_eq!(window.end(), now);
    }

    #[test]
    fn test_inverted_window_rejected() {
        let params = GeneratorParams::default().with_window(
            Some("2021-02-01".to_string()),
            Some("2021-01-01".to_string()),
        );
        let err = params.campaign_window().unwrap_err();
        assert_eq!(err.code(), "INVALID_WINDOW");
    }

    #[test]
    fn test_window_sample_in_range() {
        let window =
            CampaignWindow::new(dt("2021-01-01 00:00:00"), dt("2021-01-01 01:00:00")).unwrap();
        let mut rng = StdRng::seed_from_u64(3);

        for _ in 0..200 {
            let t = window.sample(&mut rng);
            assert!(t >= window.start() && t <= window.end());
        }

        // 起止相同的窗口也是合法的
        let point = CampaignWindow::new(window.start(), window.start()).unwrap();
        assert_eq!(point.sample(&mut rng), window.start());
    }

    #[test]
    fn test_validate_items() {
        let mut params = GeneratorParams::default();
        params.pfi = 1.5;
        assert_eq!(params.validate_items().unwrap_err().code(), "INVALID_PARAMS");

        let mut params = GeneratorParams::default();
        params.price_lower = 60.0;
        assert!(params.validate_items().is_err());

        let mut params = GeneratorParams::default();
        params.item_types.clear();
        assert!(params.validate_items().is_err());
    }
}
