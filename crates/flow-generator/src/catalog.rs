//! 用户与商品基础数据生成
//!
//! 用户 ID 和商品 ID 都是由随机源生成的 UUIDv4，
//! 同一种子下生成结果可复现。

use fake::Fake;
use fake::faker::lorem::en::Sentence;
use rand::Rng;
use rand::seq::index;
use rand_distr::{Distribution, Pareto};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::error::{FlowError, Result};
use crate::params::GeneratorParams;

/// 价格与折扣分布的形状参数
const PARETO_SHAPE: f64 = 0.8;

/// 折扣上限（百分比）
const DISCOUNT_UPPER: f64 = 100.0;

/// 商品
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Item {
    pub id: String,
    pub name: String,
    pub desc: String,
    #[serde(rename = "type")]
    pub item_type: String,
    pub price: f64,
    pub discount: f64,
}

/// 由随机源生成 UUIDv4
pub fn random_uuid<R: Rng + ?Sized>(rng: &mut R) -> Uuid {
    uuid::Builder::from_random_bytes(rng.random()).into_uuid()
}

/// 生成 `size` 个用户 ID
pub fn generate_user_ids<R: Rng + ?Sized>(rng: &mut R, size: usize) -> Vec<String> {
    (0..size).map(|_| random_uuid(rng).to_string()).collect()
}

/// 生成 `size` 个商品
///
/// - `floor(size * pfi)` 个随机商品免费，价格与折扣都为 0
/// - 价格服从 Lomax 分布并平移到 `[price_lower, price_upper)`，保留两位小数
/// - 折扣服从同一分布，取值 `[0, 100)`，取整
pub fn generate_items<R: Rng + ?Sized>(
    rng: &mut R,
    params: &GeneratorParams,
    size: usize,
) -> Result<Vec<Item>> {
    params.validate_items()?;

    let n_free = (size as f64 * params.pfi).floor() as usize;
    let mut free = vec![false; size];
    for idx in index::sample(rng, size, n_free.min(size)) {
        free[idx] = true;
    }

    let lomax = Lomax::new(PARETO_SHAPE)?;

    let items = free
        .into_iter()
        .map(|is_free| {
            let (price, discount) = if is_free {
                (0.0, 0.0)
            } else {
                let price = lomax.sample_in(rng, params.price_lower, params.price_upper);
                let discount = lomax.sample_in(rng, 0.0, DISCOUNT_UPPER);
                ((price * 100.0).round() / 100.0, discount.round())
            };

            let name: String = Sentence(1..4).fake_with_rng(rng);
            Item {
                id: random_uuid(rng).to_string(),
                name: name.trim_end_matches('.').to_string(),
                desc: Sentence(4..10).fake_with_rng(rng),
                item_type: params.item_types[rng.random_range(0..params.item_types.len())]
                    .clone(),
                price,
                discount,
            }
        })
        .collect();

    Ok(items)
}

/// Lomax 分布（平移到 0 的 Pareto 分布）
struct Lomax {
    pareto: Pareto<f64>,
}

impl Lomax {
    fn new(shape: f64) -> Result<Self> {
        let pareto = Pareto::new(1.0, shape)
            .map_err(|e| FlowError::invalid_params("pareto_shape", e.to_string()))?;
        Ok(Self { pareto })
    }

    /// 抽样并平移到 `lower`，拒绝所有不小于 `upper` 的值
    fn sample_in<R: Rng + ?Sized>(&self, rng: &mut R, lower: f64, upper: f64) -> f64 {
        loop {
            let value = self.pareto.sample(rng) - 1.0 + lower;
            if value < upper {
                return value;
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::SeedableRng;
    use rand::rngs::StdRng;
    use std::collections::HashSet;

    #[test]
    fn test_user_ids_are_unique_uuids() {
        let mut rng = StdRng::seed_from_u64(1);
        let ids = generate_user_ids(&mut rng, 200);

        assert_eq!(ids.len(), 200);
        let unique: HashSet<&String> = ids.iter().collect();
        assert_eq!(unique.len(), 200);

        let parsed = Uuid::parse_str(&ids[0]).unwrap();
        assert_eq!(parsed.get_version_num(), 4);
    }

    #[test]
    fn test_user_ids_reproducible() {
        let a = generate_user_ids(&mut StdRng::seed_from_u64(9), 10);
        let b = generate_user_ids(&mut StdRng::seed_from_u64(9), 10);
        assert_eq!(a, b);
    }

    #[test]
    fn test_generate_items() {
        let mut rng = StdRng::seed_from_u64(2);
        let params = GeneratorParams::default();
        let items = generate_items(&mut rng, &params, 100).unwrap();

        assert_eq!(items.len(), 100);

        // 5% 的商品免费
        let free = items.iter().filter(|i| i.price == 0.0).count();
        assert!(free >= 5);

        for item in &items {
            assert!(params.item_types.contains(&item.item_type));
            assert!(!item.name.ends_with('.'));
            assert!(!item.name.is_empty());
            assert!(item.price < params.price_upper);
            assert!((0.0..DISCOUNT_UPPER).contains(&item.discount));
            assert_eq!(item.discount, item.discount.round());
            assert!(((item.price * 100.0).round() - item.price * 100.0).abs() < 1e-6);
        }
    }

    #[test]
    fn test_all_free_items() {
        let mut rng = StdRng::seed_from_u64(3);
        let mut params = GeneratorParams::default();
        params.pfi = 1.0;

        let items = generate_items(&mut rng, &params, 20).unwrap();
        assert!(items.iter().all(|i| i.price == 0.0 && i.discount == 0.0));
    }

    #[test]
    fn test_item_json_field_names() {
        let mut rng = StdRng::seed_from_u64(4);
        let items = generate_items(&mut rng, &GeneratorParams::default(), 1).unwrap();
        let value = serde_json::to_value(&items[0]).unwrap();

        for key in ["id", "name", "desc", "type", "price", "discount"] {
            assert!(value.get(key).is_some(), "missing field {key}");
        }
    }

    #[test]
    fn test_invalid_item_params() {
        let mut rng = StdRng::seed_from_u64(5);
        let mut params = GeneratorParams::default();
        params.price_upper = params.price_lower;

        let err = generate_items(&mut rng, &params, 10).unwrap_err();
        assert_eq!(err.code(), "INVALID_PARAMS");
    }

    #[test]
    fn test_zero_items() {
        let mut rng = StdRng::seed_from_u64(6);
        let items = generate_items(&mut rng, &GeneratorParams::default(), 0).unwrap();
        assert!(items.is_empty());
    }
}
