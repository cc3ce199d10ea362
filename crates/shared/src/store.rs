//! 本地数据集存储
//!
//! 以按小时分区的目录结构保存 JSON 数据集：
//!
//! ```text
//! <root>/<dataset>/<YYYY>/<MM>/<DD>/<H><suffix>.json
//! ```
//!
//! 例如 `items/2022/01/20/13_available.json`。小时不补零，
//! 因此查找最新分区时按数值而非字典序比较。

use std::fs;
use std::path::{Path, PathBuf};

use chrono::{Datelike, NaiveDateTime, Timelike};
use serde::Serialize;
use serde::de::DeserializeOwned;
use tracing::debug;

use crate::error::{FlowgenError, Result};

/// 数据文件扩展名
pub const JSON_EXT: &str = ".json";

/// 构造分区基础路径（不含后缀与扩展名）
///
/// `dt_path("user_ids", 2022-01-20T13:05)` -> `user_ids/2022/01/20/13`
pub fn dt_path(dataset: &str, at: NaiveDateTime) -> String {
    format!(
        "{}/{:04}/{:02}/{:02}/{}",
        dataset,
        at.year(),
        at.month(),
        at.day(),
        at.hour()
    )
}

/// 分区键：(年, 月, 日, 时)
type PartitionKey = (i32, u32, u32, u32);

/// 本地文件系统数据集存储
#[derive(Debug, Clone)]
pub struct LocalDatasetStore {
    root: PathBuf,
}

impl LocalDatasetStore {
    /// 创建以 `root` 为根目录的存储
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    /// 相对路径对应的绝对路径
    pub fn resolve(&self, relative: &str) -> PathBuf {
        self.root.join(relative)
    }

    /// 以 JSON 格式保存数据，自动创建父目录
    pub fn save<T: Serialize + ?Sized>(&self, relative: &str, data: &T) -> Result<PathBuf> {
        let path = self.resolve(relative);
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).map_err(|e| FlowgenError::io(parent, e))?;
        }

        let json = serde_json::to_vec_pretty(data)?;
        fs::write(&path, json).map_err(|e| FlowgenError::io(&path, e))?;

        debug!(path = %path.display(), "数据集已写入");
        Ok(path)
    }

    /// 读取 JSON 数据
    pub fn load<T: DeserializeOwned>(&self, relative: &str) -> Result<T> {
        let path = self.resolve(relative);
        let content = fs::read(&path).map_err(|e| FlowgenError::io(&path, e))?;
        Ok(serde_json::from_slice(&content)?)
    }

    /// 查找数据集的最新分区
    ///
    /// 返回形如 `items/2022/01/20/13` 的基础路径，调用方拼接 `suffix` 与 `.json`
    /// 即可得到文件路径。数据集目录不存在或没有匹配文件时返回 None。
    pub fn latest(&self, dataset: &str, suffix: &str) -> Result<Option<String>> {
        let dataset_dir = self.root.join(dataset);
        if !dataset_dir.is_dir() {
            return Ok(None);
        }

        let mut newest: Option<PartitionKey> = None;

        for (year, year_dir) in numeric_children(&dataset_dir)? {
            for (month, month_dir) in numeric_children(&year_dir)? {
                for (day, day_dir) in numeric_children(&month_dir)? {
                    for hour in partition_hours(&day_dir, suffix)? {
                        let key = (year as i32, month, day, hour);
                        if newest.is_none_or(|current| key > current) {
                            newest = Some(key);
                        }
                    }
                }
            }
        }

        Ok(newest.map(|(year, month, day, hour)| {
            format!("{}/{:04}/{:02}/{:02}/{}", dataset, year, month, day, hour)
        }))
    }

    /// 读取最新分区的数据，不存在时返回 DatasetNotFound
    pub fn load_latest<T: DeserializeOwned>(&self, dataset: &str, suffix: &str) -> Result<T> {
        let base = self
            .latest(dataset, suffix)?
            .ok_or_else(|| FlowgenError::DatasetNotFound {
                dataset: dataset.to_string(),
                suffix: suffix.to_string(),
            })?;
        self.load(&format!("{}{}{}", base, suffix, JSON_EXT))
    }
}

/// 列出名称为纯数字的子目录
fn numeric_children(dir: &Path) -> Result<Vec<(u32, PathBuf)>> {
    let entries = fs::read_dir(dir).map_err(|e| FlowgenError::io(dir, e))?;

    let mut children = Vec::new();
    for entry in entries {
        let entry = entry.map_err(|e| FlowgenError::io(dir, e))?;
        let path = entry.path();
        if !path.is_dir() {
            continue;
        }
        if let Some(value) = entry.file_name().to_str().and_then(|n| n.parse().ok()) {
            children.push((value, path));
        }
    }
    Ok(children)
}

/// 列出分区目录中匹配 `<H><suffix>.json` 的小时
fn partition_hours(dir: &Path, suffix: &str) -> Result<Vec<u32>> {
    let entries = fs::read_dir(dir).map_err(|e| FlowgenError::io(dir, e))?;

    let mut hours = Vec::new();
    for entry in entries {
        let entry = entry.map_err(|e| FlowgenError::io(dir, e))?;
        let name = entry.file_name();
        let Some(name) = name.to_str() else {
            continue;
        };
        let hour = name
            .strip_suffix(JSON_EXT)
            .and_then(|stem| stem.strip_suffix(suffix))
            .and_then(|h| h.parse::<u32>().ok());
        if let Some(hour) = hour {
            hours.push(hour);
        }
    }
    Ok(hours)
}
