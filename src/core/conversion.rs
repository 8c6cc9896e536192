//! Conversion requests and the rate provider that resolves them

use super::currency::RateTableProvider;
use super::rates::{self, RateTable};
use anyhow::{Result, bail};
use chrono::{DateTime, Utc};
use std::fmt::Display;
use tracing::{debug, instrument};

#[derive(Debug, Clone, PartialEq)]
pub struct ConversionRequest {
    pub base: String,
    pub target: String,
    pub amount: f64,
}

impl ConversionRequest {
    pub fn new(base: &str, target: &str, amount: f64) -> Self {
        Self {
            base: base.to_uppercase(),
            target: target.to_uppercase(),
            amount,
        }
    }

    /// Resolves this request against an already fetched table.
    pub fn resolve(&self, table: &RateTable) -> Result<Conversion> {
        let (rate, target_amount) =
            rates::convert(table, &self.base, &self.target, self.amount)?;
        Ok(Conversion {
            base: self.base.clone(),
            target: self.target.clone(),
            amount: self.amount,
            rate,
            target_amount,
            as_of: table.as_of,
        })
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Conversion {
    pub base: String,
    pub target: String,
    pub amount: f64,
    pub rate: f64,
    pub target_amount: f64,
    pub as_of: Option<DateTime<Utc>>,
}

impl Conversion {
    /// Target amount as displayed, four decimal places.
    pub fn display_target_amount(&self) -> String {
        format!("{:.4}", self.target_amount)
    }

    /// Rate line as displayed, e.g. `1 USD = 0.92000000 EUR`.
    pub fn display_rate(&self) -> String {
        format!("1 {} = {:.8} {}", self.base, self.rate, self.target)
    }
}

impl Display for Conversion {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "{} {} = {} {}",
            self.amount,
            self.base,
            self.display_target_amount(),
            self.target
        )
    }
}

/// Parses user-entered amount text.
///
/// Blank input counts as zero. Negative, non-finite and malformed values are rejected.
pub fn parse_amount(input: &str) -> Result<f64> {
    let trimmed = input.trim();
    if trimmed.is_empty() {
        return Ok(0.0);
    }
    let amount: f64 = match trimmed.parse() {
        Ok(value) => value,
        Err(_) => bail!("Invalid amount: {}", trimmed),
    };
    if !amount.is_finite() {
        bail!("Invalid amount: {}", trimmed);
    }
    if amount < 0.0 {
        bail!("Base value cannot be negative.");
    }
    // Collapses "-0" so it never renders with a sign.
    if amount == 0.0 {
        return Ok(0.0);
    }
    Ok(amount)
}

/// Resolves conversions by fetching the full anchored table on every call and
/// deriving the pairwise rate from that freshly returned table.
pub struct RateProvider<P: RateTableProvider> {
    source: P,
}

impl<P: RateTableProvider> RateProvider<P> {
    pub fn new(source: P) -> Self {
        Self { source }
    }

    #[instrument(
        name = "Convert",
        skip(self),
        fields(base = %request.base, target = %request.target)
    )]
    pub async fn convert(&self, request: &ConversionRequest) -> Result<Conversion> {
        if request.amount < 0.0 {
            bail!("Base value cannot be negative.");
        }
        let table = self.source.fetch_table().await?;
        let conversion = request.resolve(&table)?;
        debug!(rate = conversion.rate, "Derived conversion rate");
        Ok(conversion)
    }

    pub async fn table(&self) -> Result<RateTable> {
        self.source.fetch_table().await
    }
}
