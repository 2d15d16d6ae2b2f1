//! Mutable per-product trading state and its `trader_data` encoding.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::config::EngineConfig;
use crate::history::PriceHistory;
use crate::signals::StateUpdate;
use crate::valuation::EmaAccumulator;

#[derive(Debug, Error)]
pub enum StateError {
    #[error("encode trader data: {0}")]
    Encode(#[source] serde_json::Error),
    #[error("decode trader data: {0}")]
    Decode(#[source] serde_json::Error),
    #[error("trader data belongs to config {found}, expected {expected}")]
    FingerprintMismatch { expected: String, found: String },
}

/// Everything the engine remembers about one product between steps.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProductState {
    pub history: PriceHistory,
    pub ema: EmaAccumulator,
    pub entry_price: Option<f64>,
    /// Remaining silent steps.
    pub cooldown: u32,
    pub trailing_stop: Option<f64>,
}

impl ProductState {
    pub fn new(history_capacity: usize) -> Self {
        Self {
            history: PriceHistory::with_capacity(history_capacity),
            ema: EmaAccumulator::default(),
            entry_price: None,
            cooldown: 0,
            trailing_stop: None,
        }
    }

    pub fn apply(&mut self, update: StateUpdate) {
        update.entry_price.apply(&mut self.entry_price);
        update.trailing_stop.apply(&mut self.trailing_stop);
    }
}

/// State of every configured product, keyed by product.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct EngineState {
    pub products: BTreeMap<String, ProductState>,
}

impl EngineState {
    /// Fresh state for every product in `config`.
    pub fn for_config(config: &EngineConfig) -> Self {
        let products = config
            .products
            .iter()
            .map(|(product, strategy)| {
                (product.clone(), ProductState::new(strategy.history_capacity))
            })
            .collect();
        Self { products }
    }

    pub fn product(&self, product: &str) -> Option<&ProductState> {
        self.products.get(product)
    }

    pub fn product_mut(&mut self, product: &str) -> Option<&mut ProductState> {
        self.products.get_mut(product)
    }

    /// Most recent `n` observations, oldest first. Empty for unknown products.
    pub fn window(&self, product: &str, n: usize) -> Vec<f64> {
        self.products
            .get(product)
            .map(|state| state.history.window(n))
            .unwrap_or_default()
    }
}

/// The `trader_data` payload: engine state tagged with the config that wrote it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PersistedState {
    pub fingerprint: String,
    /// Steps processed so far.
    pub step: u64,
    pub products: BTreeMap<String, ProductState>,
}

impl PersistedState {
    pub fn encode(&self) -> Result<String, StateError> {
        serde_json::to_string(self).map_err(StateError::Encode)
    }

    pub fn decode(data: &str) -> Result<Self, StateError> {
        serde_json::from_str(data).map_err(StateError::Decode)
    }

    /// Decode and check that the blob was written under `fingerprint`.
    pub fn decode_for(data: &str, fingerprint: &str) -> Result<Self, StateError> {
        let persisted = Self::decode(data)?;
        if persisted.fingerprint != fingerprint {
            return Err(StateError::FingerprintMismatch {
                expected: fingerprint.to_string(),
                found: persisted.fingerprint,
            });
        }
        Ok(persisted)
    }
}
