//! Market data seam
//!
//! Resolves a tradeable-pair reference for the session's resource. The
//! engine only needs this during stage 1 of the bootstrap; price and
//! liquidity are recorded into the checkpoint for the operator.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::error::{Result, RotorError};

/// Resolved tradeable pair for a resource
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PairInfo {
    /// Venue identifier of the pair
    pub pair_address: String,
    /// Traded resource symbol
    pub base_symbol: String,
    /// Symbol of the primary resource it trades against
    pub quote_symbol: String,
    /// Last observed price
    pub price: f64,
    /// Pool liquidity in primary-resource units
    pub liquidity: f64,
}

/// External price/liquidity lookup
#[async_trait]
pub trait MarketDataProvider: Send + Sync {
    /// Resolve a pair for a resource reference, or fail with `PairNotFound`.
    async fn resolve_pair(&self, resource_ref: &str) -> Result<PairInfo>;
}

/// Provider returning a fixed pair, for paper sessions and tests.
#[derive(Debug, Default)]
pub struct StaticMarketData {
    known: Vec<PairInfo>,
}

impl StaticMarketData {
    /// Provider that resolves any reference to a synthetic pair.
    pub fn any() -> Self {
        Self { known: Vec::new() }
    }

    /// Provider that only resolves the given pairs, by base symbol.
    pub fn with_pairs(known: Vec<PairInfo>) -> Self {
        Self { known }
    }
}

#[async_trait]
impl MarketDataProvider for StaticMarketData {
    async fn resolve_pair(&self, resource_ref: &str) -> Result<PairInfo> {
        if self.known.is_empty() {
            return Ok(PairInfo {
                pair_address: format!("pair-{}", resource_ref),
                base_symbol: resource_ref.to_string(),
                quote_symbol: "PRI".to_string(),
                price: 1.0,
                liquidity: 0.0,
            });
        }
        self.known
            .iter()
            .find(|p| p.base_symbol == resource_ref)
            .cloned()
            .ok_or_else(|| RotorError::PairNotFound(resource_ref.to_string()))
    }
}
