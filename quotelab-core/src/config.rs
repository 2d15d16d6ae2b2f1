//! Engine configuration: TOML loading, validation, fingerprinting and presets.
//!
//! ```toml
//! conversions = 0
//!
//! [products.KELP]
//! max_position = 50
//! fallback_price = 2028.0
//! window = 14
//! estimator = { type = "vwap", depth = 5 }
//! sizing = { type = "fixed", size = 10 }
//!
//! [products.KELP.rule.signal]
//! type = "z_score"
//! period = 14
//! ```

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::signals::SignalConfig;
use crate::sizing::{QuoteConfig, SizingConfig};
use crate::strategy::{Rule, StrategyConfig};
use crate::valuation::Estimator;

// ─── Error type ──────────────────────────────────────────────────────

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("read config {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("parse config TOML: {0}")]
    Parse(#[from] toml::de::Error),
    #[error("no products configured")]
    NoProducts,
    #[error("product {product}: {reason}")]
    Invalid { product: String, reason: String },
    #[error("unknown preset: {0}")]
    UnknownPreset(String),
}

// ─── EngineConfig ────────────────────────────────────────────────────

/// Complete engine configuration: one strategy per traded product.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EngineConfig {
    /// Passed through unchanged into every step's output.
    #[serde(default)]
    pub conversions: i64,
    pub products: BTreeMap<String, StrategyConfig>,
}

impl EngineConfig {
    pub fn new(products: BTreeMap<String, StrategyConfig>) -> Self {
        Self {
            conversions: 0,
            products,
        }
    }

    /// Parse and validate a TOML document.
    pub fn from_toml_str(content: &str) -> Result<Self, ConfigError> {
        let config: Self = toml::from_str(content)?;
        config.validate()?;
        Ok(config)
    }

    /// Read, parse and validate a TOML file.
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_toml_str(&content)
    }

    /// Deterministic identity of this configuration.
    ///
    /// BLAKE3 over the canonical JSON encoding. `BTreeMap` keeps key order stable.
    pub fn fingerprint(&self) -> String {
        let json = serde_json::to_string(self).expect("EngineConfig must serialize");
        blake3::hash(json.as_bytes()).to_hex().to_string()
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.products.is_empty() {
            return Err(ConfigError::NoProducts);
        }
        for (product, strategy) in &self.products {
            validate_strategy(strategy).map_err(|reason| ConfigError::Invalid {
                product: product.clone(),
                reason,
            })?;
        }
        Ok(())
    }
}

// ─── Validation ──────────────────────────────────────────────────────

fn ensure(cond: bool, reason: impl FnOnce() -> String) -> Result<(), String> {
    if cond {
        Ok(())
    } else {
        Err(reason())
    }
}

fn ensure_non_negative(name: &str, value: f64) -> Result<(), String> {
    ensure(value.is_finite() && value >= 0.0, || {
        format!("{name} must be a finite value >= 0 (got {value})")
    })
}

fn validate_strategy(s: &StrategyConfig) -> Result<(), String> {
    ensure(s.max_position > 0, || {
        format!("max_position must be > 0 (got {})", s.max_position)
    })?;
    ensure(s.history_capacity >= 1, || "history_capacity must be >= 1".into())?;
    ensure(s.window >= 1, || "window must be >= 1".into())?;
    ensure(s.window <= s.history_capacity, || {
        format!(
            "window {} exceeds history_capacity {}",
            s.window, s.history_capacity
        )
    })?;
    ensure(s.fallback_price.is_finite(), || "fallback_price must be finite".into())?;
    if let Some(threshold) = s.volatility_threshold {
        ensure_non_negative("volatility_threshold", threshold)?;
    }
    if let SizingConfig::Fixed { size } = s.sizing {
        ensure(size > 0, || "fixed size must be > 0".into())?;
    }
    validate_estimator(&s.estimator)?;
    match &s.rule {
        Rule::Signal(signal) => validate_signal(signal, s.window),
        Rule::Quote(quote) => validate_quote(quote),
    }
}

fn validate_estimator(e: &Estimator) -> Result<(), String> {
    match *e {
        Estimator::Midpoint => Ok(()),
        Estimator::TradeWeighted { window } => {
            ensure(window >= 1, || "trade_weighted window must be >= 1".into())
        }
        Estimator::Vwap { depth, .. } => ensure(depth >= 1, || "vwap depth must be >= 1".into()),
        Estimator::Ema { window } => ensure(window >= 1, || "ema window must be >= 1".into()),
        Estimator::FixedReference { value } => {
            ensure(value.is_finite(), || "fixed_reference value must be finite".into())
        }
    }
}

fn validate_signal(signal: &SignalConfig, window: usize) -> Result<(), String> {
    let kind = signal.kind();
    let lookback = signal.lookback();
    ensure(lookback <= window, || {
        format!("{kind} needs {lookback} observations but window is {window}")
    })?;

    match *signal {
        SignalConfig::Bollinger { multiplier, .. } | SignalConfig::Keltner { multiplier, .. } => {
            ensure_non_negative("multiplier", multiplier)?
        }
        SignalConfig::Rsi {
            oversold,
            overbought,
            ..
        } => ensure(
            (0.0..=100.0).contains(&oversold)
                && (0.0..=100.0).contains(&overbought)
                && oversold < overbought,
            || format!("rsi bounds out of order: oversold {oversold}, overbought {overbought}"),
        )?,
        SignalConfig::RateOfChange { sensitivity, .. } => {
            ensure_non_negative("sensitivity", sensitivity)?
        }
        SignalConfig::ZScore { threshold, .. } | SignalConfig::BookImbalance { threshold } => {
            ensure_non_negative("threshold", threshold)?
        }
        SignalConfig::MaCrossover { short, long } => ensure(short >= 1 && short < long, || {
            format!("ma_crossover needs 1 <= short < long (got {short}, {long})")
        })?,
        SignalConfig::MomentumRun { stop_fraction } => {
            ensure((0.0..=1.0).contains(&stop_fraction), || {
                format!("stop_fraction must be within [0, 1] (got {stop_fraction})")
            })?
        }
        SignalConfig::TrendSlope { atr_multiplier, .. } => {
            ensure_non_negative("atr_multiplier", atr_multiplier)?
        }
        SignalConfig::Breakout { .. } | SignalConfig::MovingAverage { .. } => {}
    }

    let min_period = signal.min_period();
    ensure(lookback >= min_period, || {
        format!("{kind} period must be >= {min_period}")
    })
}

fn validate_quote(q: &QuoteConfig) -> Result<(), String> {
    ensure_non_negative("base_spread", q.base_spread)?;
    ensure_non_negative("volatility_mult", q.volatility_mult)?;
    ensure(q.skew_sensitivity.is_finite(), || "skew_sensitivity must be finite".into())?;
    ensure(q.trend_sensitivity.is_finite(), || "trend_sensitivity must be finite".into())?;
    ensure(q.quote_size > 0, || "quote_size must be > 0".into())
}

// ─── StrategyPreset ─────────────────────────────────────────────────

pub const KELP: &str = "KELP";
pub const RAINFOREST_RESIN: &str = "RAINFOREST_RESIN";
pub const SQUID_INK: &str = "SQUID_INK";

/// Named configurations for the three tutorial products.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StrategyPreset {
    /// Fade deviations from the mean on every product.
    MeanReversion,
    /// Follow runs and slopes, exit on stops.
    TrendFollowing,
    /// Quote both sides around fair value.
    MarketMaking,
}

fn product(rule: Rule, window: usize, fallback_price: f64) -> StrategyConfig {
    StrategyConfig {
        window,
        history_capacity: 50,
        ..StrategyConfig::new(rule, 50, fallback_price)
    }
}

impl StrategyPreset {
    pub fn all() -> &'static [StrategyPreset] {
        &[Self::MeanReversion, Self::TrendFollowing, Self::MarketMaking]
    }

    pub fn name(self) -> &'static str {
        match self {
            Self::MeanReversion => "mean_reversion",
            Self::TrendFollowing => "trend_following",
            Self::MarketMaking => "market_making",
        }
    }

    pub fn to_config(self) -> EngineConfig {
        let mut products = BTreeMap::new();
        match self {
            Self::MeanReversion => {
                products.insert(
                    KELP.to_string(),
                    product(
                        Rule::Signal(SignalConfig::Keltner {
                            period: 10,
                            multiplier: 1.5,
                        }),
                        10,
                        2028.0,
                    ),
                );
                products.insert(
                    RAINFOREST_RESIN.to_string(),
                    product(
                        Rule::Signal(SignalConfig::ZScore {
                            period: 20,
                            threshold: 1.0,
                        }),
                        20,
                        10_000.0,
                    ),
                );
                products.insert(
                    SQUID_INK.to_string(),
                    StrategyConfig {
                        volatility_threshold: Some(5.0),
                        ..product(
                            Rule::Signal(SignalConfig::Bollinger {
                                period: 20,
                                multiplier: 2.0,
                            }),
                            20,
                            2000.0,
                        )
                    },
                );
            }
            Self::TrendFollowing => {
                products.insert(
                    KELP.to_string(),
                    product(
                        Rule::Signal(SignalConfig::MaCrossover { short: 3, long: 7 }),
                        8,
                        2028.0,
                    ),
                );
                products.insert(
                    RAINFOREST_RESIN.to_string(),
                    product(
                        Rule::Signal(SignalConfig::MomentumRun { stop_fraction: 0.8 }),
                        10,
                        10_000.0,
                    ),
                );
                products.insert(
                    SQUID_INK.to_string(),
                    StrategyConfig {
                        cooldown_steps: 5,
                        ..product(
                            Rule::Signal(SignalConfig::TrendSlope {
                                period: 20,
                                entry_slope: 0.2,
                                atr_multiplier: 1.5,
                            }),
                            20,
                            2000.0,
                        )
                    },
                );
            }
            Self::MarketMaking => {
                products.insert(
                    KELP.to_string(),
                    StrategyConfig {
                        estimator: Estimator::Vwap {
                            depth: 5,
                            min_volume: 10,
                        },
                        ..product(
                            Rule::Quote(QuoteConfig {
                                skew_sensitivity: 0.05,
                                ..QuoteConfig::default()
                            }),
                            20,
                            2028.0,
                        )
                    },
                );
                products.insert(
                    RAINFOREST_RESIN.to_string(),
                    StrategyConfig {
                        estimator: Estimator::FixedReference { value: 10_000.0 },
                        ..product(Rule::Quote(QuoteConfig::default()), 20, 10_000.0)
                    },
                );
                products.insert(
                    SQUID_INK.to_string(),
                    StrategyConfig {
                        estimator: Estimator::Ema { window: 10 },
                        ..product(
                            Rule::Quote(QuoteConfig {
                                base_spread: 2.0,
                                volatility_mult: 0.5,
                                skew_sensitivity: 0.1,
                                trend_sensitivity: 0.5,
                                quote_size: 10,
                            }),
                            20,
                            2000.0,
                        )
                    },
                );
            }
        }
        EngineConfig::new(products)
    }
}

impl FromStr for StrategyPreset {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::all()
            .iter()
            .copied()
            .find(|p| p.name() == s)
            .ok_or_else(|| ConfigError::UnknownPreset(s.to_string()))
    }
}

// ─── Tests ──────────────────────────────────────────────────────────
