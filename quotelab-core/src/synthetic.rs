//! Deterministic synthetic steps for replay and benchmarking.
//!
//! Each product gets its own random walk. A master seed is expanded into
//! a per-product RNG seed via BLAKE3, so a product's path does not depend on
//! which other products are generated alongside it or in what order.

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

use crate::config::EngineConfig;
use crate::domain::{OrderDepth, StepInput, Trade};
use crate::valuation::Estimator;

/// The product's own RNG: its full 32-byte seed is BLAKE3 of the master seed
/// and the product name.
fn product_rng(seed: u64, product: &str) -> StdRng {
    let hash = blake3::Hasher::new()
        .update(&seed.to_le_bytes())
        .update(product.as_bytes())
        .finalize();
    StdRng::from_seed(*hash.as_bytes())
}

/// Shape of a generated market.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct WalkParams {
    /// Standard deviation of the per-step mid change, in ticks.
    pub volatility: f64,
    /// Distance in ticks from the mid to each touch.
    pub half_spread: i64,
    /// Price levels per side.
    pub levels: usize,
    pub max_level_volume: u64,
    /// Probability that a step's book is missing one side.
    pub one_sided_prob: f64,
    pub max_trades_per_step: usize,
}

impl Default for WalkParams {
    fn default() -> Self {
        Self {
            volatility: 1.5,
            half_spread: 2,
            levels: 3,
            max_level_volume: 30,
            one_sided_prob: 0.02,
            max_trades_per_step: 2,
        }
    }
}

struct Walk {
    rng: StdRng,
    mid: f64,
}

impl Walk {
    /// Uniform noise scaled to unit variance.
    fn shock(&mut self) -> f64 {
        (self.rng.gen::<f64>() * 2.0 - 1.0) * 3f64.sqrt()
    }

    fn next_depth(&mut self, params: &WalkParams) -> (OrderDepth, Vec<Trade>) {
        self.mid = (self.mid + params.volatility * self.shock()).max(1.0);
        let center = self.mid.round() as i64;

        let mut bids = Vec::with_capacity(params.levels);
        let mut asks = Vec::with_capacity(params.levels);
        for i in 0..params.levels as i64 {
            bids.push((center - params.half_spread - i, self.rng.gen_range(1..=params.max_level_volume)));
            asks.push((center + params.half_spread + i, self.rng.gen_range(1..=params.max_level_volume)));
        }
        if self.rng.gen_bool(params.one_sided_prob) {
            if self.rng.gen_bool(0.5) {
                bids.clear();
            } else {
                asks.clear();
            }
        }

        let n_trades = self.rng.gen_range(0..=params.max_trades_per_step);
        let trades = (0..n_trades)
            .map(|_| {
                let offset = self.rng.gen_range(-params.half_spread..=params.half_spread);
                Trade::new((center + offset) as f64, self.rng.gen_range(1..=5))
            })
            .collect();

        (OrderDepth::from_levels(&bids, &asks), trades)
    }
}

/// Starting mid for a product: its fixed reference if it has one, else its fallback.
fn start_price(estimator: &Estimator, fallback_price: f64) -> f64 {
    match estimator {
        Estimator::FixedReference { value } => *value,
        _ => fallback_price,
    }
}

/// `steps` synthetic exchange steps for every product in `config`.
///
/// Timestamps advance by 100 per step. Positions are left empty since nothing
/// is filled.
pub fn generate_steps(
    config: &EngineConfig,
    params: &WalkParams,
    steps: usize,
    seed: u64,
) -> Vec<StepInput> {
    let mut walks: Vec<(String, Walk)> = config
        .products
        .iter()
        .map(|(product, strategy)| {
            let walk = Walk {
                rng: product_rng(seed, product),
                mid: start_price(&strategy.estimator, strategy.fallback_price),
            };
            (product.clone(), walk)
        })
        .collect();

    (0..steps)
        .map(|i| {
            let mut input = StepInput::new(i as u64 * 100);
            for (product, walk) in walks.iter_mut() {
                let (depth, trades) = walk.next_depth(params);
                input = input.with_depth(product.clone(), depth);
                if !trades.is_empty() {
                    input = input.with_trades(product.clone(), trades);
                }
            }
            input
        })
        .collect()
}
