//! Anchored rate tables and pairwise rate derivation

use anyhow::{Result, anyhow};
use chrono::{DateTime, Utc};
use std::collections::HashMap;

/// Currency every fetched table is expressed against.
pub const ANCHOR_CURRENCY: &str = "USD";

/// Full set of rates returned by a provider, each expressed as units of the
/// currency per one unit of `anchor`.
#[derive(Debug, Clone, PartialEq)]
pub struct RateTable {
    pub anchor: String,
    pub rates: HashMap<String, f64>,
    pub as_of: Option<DateTime<Utc>>,
}

impl RateTable {
    pub fn new(anchor: &str, rates: HashMap<String, f64>) -> Self {
        Self {
            anchor: anchor.to_uppercase(),
            rates: rates
                .into_iter()
                .map(|(code, rate)| (code.to_uppercase(), rate))
                .collect(),
            as_of: None,
        }
    }

    pub fn with_timestamp(mut self, as_of: DateTime<Utc>) -> Self {
        self.as_of = Some(as_of);
        self
    }

    /// Rate of `code` against the anchor. The anchor itself is always 1.
    pub fn get(&self, code: &str) -> Option<f64> {
        let code = code.to_uppercase();
        if code == self.anchor {
            return Some(self.rates.get(&code).copied().unwrap_or(1.0));
        }
        self.rates.get(&code).copied()
    }

    pub fn contains(&self, code: &str) -> bool {
        self.get(code).is_some()
    }

    fn lookup(&self, code: &str) -> Result<f64> {
        let rate = self
            .get(code)
            .ok_or_else(|| anyhow!("Unknown currency: {}", code.to_uppercase()))?;
        if !rate.is_finite() || rate <= 0.0 {
            return Err(anyhow!(
                "Invalid rate {} for currency: {}",
                rate,
                code.to_uppercase()
            ));
        }
        Ok(rate)
    }
}

/// Derives the conversion factor from `base` to `target` using an anchored table.
///
/// - `base` is the anchor: `table[target]`
/// - `target` is the anchor: `1 / table[base]`
/// - otherwise: `table[target] / table[base]`
///
/// Identical codes always yield 1.
pub fn derive_rate(table: &RateTable, base: &str, target: &str) -> Result<f64> {
    let base = base.to_uppercase();
    let target = target.to_uppercase();

    if base == target {
        return Ok(1.0);
    }

    let rate = if base == table.anchor {
        table.lookup(&target)?
    } else if target == table.anchor {
        1.0 / table.lookup(&base)?
    } else {
        table.lookup(&target)? / table.lookup(&base)?
    };
    Ok(rate)
}

/// Converts `amount` of `base` into `target`, returning `(rate, target_amount)`.
pub fn convert(table: &RateTable, base: &str, target: &str, amount: f64) -> Result<(f64, f64)> {
    let rate = derive_rate(table, base, target)?;
    Ok((rate, amount * rate))
}
