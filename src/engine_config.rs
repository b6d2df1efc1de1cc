//! # Engine Configuration Module
//!
//! This module defines configuration structures for the resolution and
//! consumption engine: matching thresholds, retry behavior for the
//! transaction executor, and numeric cutoffs.

// Constants for engine configuration
pub const DEFAULT_MIN_CONFIDENCE: u8 = 60;
pub const NEGLIGIBLE_QUANTITY: f64 = 1e-6; // below this a lot is deleted, not left near-zero

/// Name-matcher configuration
#[derive(Debug, Clone)]
pub struct MatcherConfig {
    /// Minimum confidence (0-100) a candidate needs to be kept
    pub min_confidence: u8,
}

impl Default for MatcherConfig {
    fn default() -> Self {
        Self {
            min_confidence: DEFAULT_MIN_CONFIDENCE,
        }
    }
}

/// Retry configuration for the transaction executor's optimistic-concurrency
/// loop
#[derive(Debug, Clone)]
pub struct RetryConfig {
    /// Maximum number of apply attempts before surfacing a conflict
    pub max_attempts: u32,
    /// Base delay between retries in milliseconds
    pub base_delay_ms: u64,
    /// Maximum delay between retries in milliseconds
    pub max_delay_ms: u64,
}

impl Default for RetryConfig {
    fn default() -> Self {
        Self {
            max_attempts: 3,
            base_delay_ms: 25,
            max_delay_ms: 250,
        }
    }
}

/// Top-level configuration for one engine instance
#[derive(Debug, Clone)]
pub struct EngineConfig {
    /// Name-matcher settings
    pub matcher: MatcherConfig,
    /// Executor retry settings
    pub retry: RetryConfig,
    /// Residual quantity at or below which a lot is deleted outright
    pub negligible_quantity: f64,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            matcher: MatcherConfig::default(),
            retry: RetryConfig::default(),
            negligible_quantity: NEGLIGIBLE_QUANTITY,
        }
    }
}

impl EngineConfig {
    /// Default configuration with the standard negligible-quantity cutoff
    pub fn new() -> Self {
        Self::default()
    }
}
