//! QuoteLab Core: per-product valuation, signals and order sizing for a
//! step-driven exchange agent.
//!
//! This crate contains the engine:
//! - Domain types (order books, trades, order intents, step input/output)
//! - Bounded price history per product
//! - Fair-value estimators with strict fallback ordering
//! - Signal bank with a volatility gate, and a market-making quoter
//! - Position-capped order sizing and placement
//! - Step controller with persisted `trader_data` state
//! - TOML configuration, presets, and synthetic step generation

pub mod config;
pub mod domain;
pub mod engine;
pub mod history;
pub mod indicators;
pub mod signals;
pub mod sizing;
pub mod strategy;
pub mod synthetic;
pub mod valuation;

pub use config::{ConfigError, EngineConfig, StrategyPreset};
pub use engine::{Engine, EngineError};
