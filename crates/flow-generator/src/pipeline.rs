//! 数据集流水线
//!
//! 将生成结果按小时分区写入数据集存储：
//!
//! | 数据集 | 文件 |
//! |--------|------|
//! | 用户 ID | `user_ids/<分区>.json` |
//! | 商品 | `items/<分区>.json` |
//! | 上架商品 ID | `items/<分区>_available.json` |
//! | 下架商品 ID | `items/<分区>_unavailable.json` |
//! | 用户行为 | `user_actions/<分区>.json` |

use std::path::PathBuf;

use chrono::NaiveDateTime;
use flowgen_shared::observability::metrics as flow_metrics;
use flowgen_shared::store::{JSON_EXT, LocalDatasetStore, dt_path};
use rand::Rng;
use rand::seq::index;
use serde::Serialize;
use tracing::{info, instrument};

use crate::batch::generate_batch;
use crate::catalog::{generate_items, generate_user_ids};
use crate::error::Result;
use crate::flow::FlowSynthesizer;
use crate::params::GeneratorParams;

pub const USER_IDS: &str = "user_ids";
pub const ITEMS: &str = "items";
pub const USER_ACTIONS: &str = "user_actions";

pub const AVAILABLE_SUFFIX: &str = "_available";
pub const UNAVAILABLE_SUFFIX: &str = "_unavailable";

/// 一次数据集写入的结果
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DatasetReport {
    pub dataset: &'static str,
    pub path: PathBuf,
    pub records: usize,
}

/// 商品上下架轮换结果
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RotationReport {
    pub available: usize,
    pub retired: usize,
    pub available_path: PathBuf,
    pub unavailable_path: PathBuf,
}

/// 商品数据集写入结果
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ItemsReport {
    pub items: DatasetReport,
    pub rotation: RotationReport,
}

/// 数据集流水线
#[derive(Debug, Clone)]
pub struct DatasetPipeline {
    store: LocalDatasetStore,
    params: GeneratorParams,
}

impl DatasetPipeline {
    pub fn new(store: LocalDatasetStore, params: GeneratorParams) -> Self {
        Self { store, params }
    }

    pub fn store(&self) -> &LocalDatasetStore {
        &self.store
    }

    pub fn params(&self) -> &GeneratorParams {
        &self.params
    }

    /// 生成用户 ID 数据集
    #[instrument(skip(self, rng))]
    pub fn user_ids<R: Rng + ?Sized>(
        &self,
        rng: &mut R,
        size: usize,
        at: NaiveDateTime,
    ) -> Result<DatasetReport> {
        let user_ids = generate_user_ids(rng, size);
        self.save(USER_IDS, &dt_path(USER_IDS, at), "", &user_ids)
    }

    /// 生成商品数据集，并把新商品加入上架列表
    #[instrument(skip(self, rng))]
    pub fn items<R: Rng + ?Sized>(
        &self,
        rng: &mut R,
        size: usize,
        n_del: usize,
        at: NaiveDateTime,
    ) -> Result<ItemsReport> {
        let items = generate_items(rng, &self.params, size)?;
        let report = self.save(ITEMS, &dt_path(ITEMS, at), "", &items)?;

        let new_available: Vec<String> = items.into_iter().map(|item| item.id).collect();
        let rotation = rotate_items(&self.store, rng, n_del, new_available, at)?;

        Ok(ItemsReport {
            items: report,
            rotation,
        })
    }

    /// 基于最新的用户 ID 与上架商品生成用户行为数据集
    ///
    /// 参数中没有完整时间窗口时，使用 `at` 之前的一小时
    #[instrument(skip(self, rng))]
    pub fn user_actions<R: Rng + ?Sized>(
        &self,
        rng: &mut R,
        size: usize,
        at: NaiveDateTime,
    ) -> Result<DatasetReport> {
        let user_ids: Vec<String> = self.store.load_latest(USER_IDS, "")?;
        let items_ids: Vec<String> = self.store.load_latest(ITEMS, AVAILABLE_SUFFIX)?;

        let window = self.params.campaign_window_at(at)?;
        let synthesizer = FlowSynthesizer::new(&self.params, window)?;
        let events = generate_batch(&synthesizer, &user_ids, &items_ids, size, rng)?;

        self.save(USER_ACTIONS, &dt_path(USER_ACTIONS, at), "", &events)
    }

    /// 仅执行商品上下架轮换
    pub fn rotate_items<R: Rng + ?Sized>(
        &self,
        rng: &mut R,
        n_del: usize,
        at: NaiveDateTime,
    ) -> Result<RotationReport> {
        rotate_items(&self.store, rng, n_del, Vec::new(), at)
    }

    fn save<T: Serialize>(
        &self,
        dataset: &'static str,
        base: &str,
        suffix: &str,
        records: &[T],
    ) -> Result<DatasetReport> {
        let path = self
            .store
            .save(&format!("{}{}{}", base, suffix, JSON_EXT), records)?;
        flow_metrics::record_dataset_written(dataset, records.len());
        info!(dataset, path = %path.display(), records = records.len(), "数据集已生成");

        Ok(DatasetReport {
            dataset,
            path,
            records: records.len(),
        })
    }
}

/// 商品上下架轮换
///
/// 从最新的上架列表中随机下架 `min(n_del, 上架数)` 个商品，
/// 剩余商品与 `new_available` 一起写入 `at` 所在分区的上架列表，
/// 下架商品写入同一分区的下架列表。不存在上架列表时视为空。
pub fn rotate_items<R: Rng + ?Sized>(
    store: &LocalDatasetStore,
    rng: &mut R,
    n_del: usize,
    new_available: Vec<String>,
    at: NaiveDateTime,
) -> Result<RotationReport> {
    let available: Vec<String> = match store.latest(ITEMS, AVAILABLE_SUFFIX)? {
        Some(base) => store.load(&format!("{}{}{}", base, AVAILABLE_SUFFIX, JSON_EXT))?,
        None => Vec::new(),
    };

    let n_del = n_del.min(available.len());
    let mut retire = vec![false; available.len()];
    for idx in index::sample(rng, available.len(), n_del) {
        retire[idx] = true;
    }

    let (retired, kept): (Vec<_>, Vec<_>) = available
        .into_iter()
        .zip(retire)
        .partition(|(_, retired)| *retired);

    let mut still_available: Vec<String> = kept.into_iter().map(|(id, _)| id).collect();
    still_available.extend(new_available);
    let retired: Vec<String> = retired.into_iter().map(|(id, _)| id).collect();

    let base = dt_path(ITEMS, at);
    let available_path = store.save(
        &format!("{}{}{}", base, AVAILABLE_SUFFIX, JSON_EXT),
        &still_available,
    )?;
    let unavailable_path = store.save(
        &format!("{}{}{}", base, UNAVAILABLE_SUFFIX, JSON_EXT),
        &retired,
    )?;

    info!(
        available = still_available.len(),
        retired = retired.len(),
        "商品上下架轮换完成"
    );

    Ok(RotationReport {
        available: still_available.len(),
        retired: retired.len(),
        available_path,
        unavailable_path,
    })
}
