//! Prometheus 指标模块
//!
//! 基于 metrics crate 和 metrics-exporter-prometheus 实现指标收集。
//! 生成器是一次性命令而非常驻服务，指标不通过 HTTP 暴露，
//! 而是在命令结束时渲染为文本快照。

use metrics_exporter_prometheus::{PrometheusBuilder, PrometheusHandle};

use super::ObservabilityConfig;
use crate::error::{FlowgenError, Result};

/// Metrics 资源守卫
pub struct MetricsHandle {
    handle: PrometheusHandle,
}

impl MetricsHandle {
    /// 渲染 Prometheus 文本格式的指标快照
    pub fn render(&self) -> String {
        self.handle.run_upkeep();
        self.handle.render()
    }
}

/// 安装全局 Prometheus recorder
pub fn init(config: &ObservabilityConfig) -> Result<MetricsHandle> {
    let handle = PrometheusBuilder::new()
        .add_global_label("service", config.service_name.clone())
        .install_recorder()
        .map_err(|e| FlowgenError::Observability(e.to_string()))?;

    register_common_metrics();

    Ok(MetricsHandle { handle })
}

/// 注册预定义的业务指标
fn register_common_metrics() {
    metrics::describe_counter!("flowgen_flows_total", "Total number of simulated user flows");
    metrics::describe_counter!(
        "flowgen_flows_aborted_total",
        "Flows abandoned before the chain reached its terminal state"
    );
    metrics::describe_counter!("flowgen_events_total", "Total number of generated action events");
    metrics::describe_histogram!("flowgen_flow_length", "Number of events per flow");
    metrics::describe_counter!(
        "flowgen_dataset_records_total",
        "Records written to dataset partitions"
    );
}

// ============================================================================
// 便捷的指标记录函数
// ============================================================================

/// 记录一次用户会话流
#[inline]
pub fn record_flow(events: usize, aborted: bool) {
    metrics::counter!("flowgen_flows_total").increment(1);
    if aborted {
        metrics::counter!("flowgen_flows_aborted_total").increment(1);
    }
    metrics::counter!("flowgen_events_total").increment(events as u64);
    metrics::histogram!("flowgen_flow_length").record(events as f64);
}

/// 记录写入数据集的记录数
#[inline]
pub fn record_dataset_written(dataset: &str, records: usize) {
    metrics::counter!(
        "flowgen_dataset_records_total",
        "dataset" => dataset.to_string()
    )
    .increment(records as u64);
}
