//! Conversion state owned by a single interactive session.
//!
//! Every input change advances the session generation. Fetches are issued as
//! [`FetchTicket`]s stamped with the generation they were issued for, and a
//! completion is only applied while its generation is still current, so the
//! last issued fetch wins regardless of the order responses arrive in.

use super::conversion::{Conversion, ConversionRequest, parse_amount};
use super::rates::RateTable;
use anyhow::Result;
use std::time::{Duration, Instant};
use tracing::{debug, error};

pub const FETCH_FAILED_MESSAGE: &str =
    "Failed to fetch currency data. Please check your network connection.";

#[derive(Debug, Clone, PartialEq)]
pub enum ConversionStatus {
    Idle,
    Loading,
    Ready(Conversion),
    Failed(String),
}

#[derive(Debug, Clone, PartialEq)]
pub enum InputOutcome {
    Changed,
    Unchanged,
    Rejected(String),
}

#[derive(Debug, Clone, PartialEq)]
pub struct FetchTicket {
    pub generation: u64,
    pub request: ConversionRequest,
}

struct HeldTable {
    table: RateTable,
    fetched_at: Instant,
}

pub struct ConversionSession {
    base: String,
    target: String,
    amount: f64,
    status: ConversionStatus,
    generation: u64,
    table: Option<HeldTable>,
    table_ttl: Duration,
}

impl ConversionSession {
    pub fn new(base: &str, target: &str, amount: f64, table_ttl: Duration) -> Self {
        Self {
            base: base.to_uppercase(),
            target: target.to_uppercase(),
            amount: amount.max(0.0),
            status: ConversionStatus::Idle,
            generation: 0,
            table: None,
            table_ttl,
        }
    }

    pub fn base(&self) -> &str {
        &self.base
    }

    pub fn target(&self) -> &str {
        &self.target
    }

    pub fn amount(&self) -> f64 {
        self.amount
    }

    pub fn generation(&self) -> u64 {
        self.generation
    }

    pub fn status(&self) -> &ConversionStatus {
        &self.status
    }

    pub fn is_loading(&self) -> bool {
        matches!(self.status, ConversionStatus::Loading)
    }

    pub fn error(&self) -> Option<&str> {
        match &self.status {
            ConversionStatus::Failed(message) => Some(message),
            _ => None,
        }
    }

    pub fn conversion(&self) -> Option<&Conversion> {
        match &self.status {
            ConversionStatus::Ready(conversion) => Some(conversion),
            _ => None,
        }
    }

    pub fn has_table(&self) -> bool {
        self.table.is_some()
    }

    pub fn request(&self) -> ConversionRequest {
        ConversionRequest::new(&self.base, &self.target, self.amount)
    }

    pub fn set_base(&mut self, code: &str) -> InputOutcome {
        let code = code.trim().to_uppercase();
        if code.is_empty() {
            return InputOutcome::Rejected("Currency code cannot be empty.".to_string());
        }
        if code == self.base {
            return InputOutcome::Unchanged;
        }
        self.base = code;
        self.advance();
        InputOutcome::Changed
    }

    pub fn set_target(&mut self, code: &str) -> InputOutcome {
        let code = code.trim().to_uppercase();
        if code.is_empty() {
            return InputOutcome::Rejected("Currency code cannot be empty.".to_string());
        }
        if code == self.target {
            return InputOutcome::Unchanged;
        }
        self.target = code;
        self.advance();
        InputOutcome::Changed
    }

    /// Exchanges base and target in one step.
    pub fn swap(&mut self) -> InputOutcome {
        if self.base == self.target {
            return InputOutcome::Unchanged;
        }
        std::mem::swap(&mut self.base, &mut self.target);
        self.advance();
        InputOutcome::Changed
    }

    /// Applies raw amount text. Rejected input leaves the session untouched.
    pub fn set_amount(&mut self, input: &str) -> InputOutcome {
        let amount = match parse_amount(input) {
            Ok(amount) => amount,
            Err(e) => return InputOutcome::Rejected(e.to_string()),
        };
        if amount == self.amount {
            return InputOutcome::Unchanged;
        }
        self.amount = amount;
        self.advance();
        InputOutcome::Changed
    }

    /// Re-derives the conversion from the held table when it is still fresh.
    /// Returns `false` when a fetch is required instead.
    pub fn recompute_locally(&mut self) -> bool {
        let Some(held) = &self.table else {
            return false;
        };
        if held.fetched_at.elapsed() >= self.table_ttl {
            debug!("Held rate table is stale");
            return false;
        }
        match self.request().resolve(&held.table) {
            Ok(conversion) => {
                debug!(generation = self.generation, "Recomputed conversion locally");
                self.status = ConversionStatus::Ready(conversion);
                true
            }
            Err(_) => false,
        }
    }

    /// Shows the session as loading while a deferred fetch is waiting to be issued.
    pub fn mark_pending(&mut self) {
        self.status = ConversionStatus::Loading;
    }

    /// Marks the session as loading and issues a ticket for the current inputs.
    pub fn begin_fetch(&mut self) -> FetchTicket {
        self.status = ConversionStatus::Loading;
        debug!(generation = self.generation, "Issuing rate fetch");
        FetchTicket {
            generation: self.generation,
            request: self.request(),
        }
    }

    /// Issues a fresh fetch for the current inputs, superseding any in flight.
    pub fn retry(&mut self) -> FetchTicket {
        self.advance();
        self.begin_fetch()
    }

    /// Applies a fetch result. Returns `false` if the ticket was superseded
    /// and the result was discarded.
    pub fn complete(&mut self, ticket: &FetchTicket, result: Result<RateTable>) -> bool {
        if ticket.generation != self.generation {
            debug!(
                ticket = ticket.generation,
                current = self.generation,
                "Discarding stale rate response"
            );
            return false;
        }

        match result {
            Ok(table) => {
                self.status = match ticket.request.resolve(&table) {
                    Ok(conversion) => ConversionStatus::Ready(conversion),
                    Err(e) => ConversionStatus::Failed(e.to_string()),
                };
                self.table = Some(HeldTable {
                    table,
                    fetched_at: Instant::now(),
                });
            }
            Err(e) => {
                error!(error = %e, "Error fetching rate table");
                self.table = None;
                self.status = ConversionStatus::Failed(FETCH_FAILED_MESSAGE.to_string());
            }
        }
        true
    }

    fn advance(&mut self) {
        self.generation += 1;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use anyhow::anyhow;
    use std::collections::HashMap;

    fn table(entries: &[(&str, f64)]) -> RateTable {
        RateTable::new(
            "USD",
            entries
                .iter()
                .map(|(code, rate)| (code.to_string(), *rate))
                .collect::<HashMap<_, _>>(),
        )
    }

    fn session() -> ConversionSession {
        ConversionSession::new("USD", "EUR", 1.0, Duration::from_secs(60))
    }

    #[test]
    fn test_fetch_cycle_produces_conversion() {
        let mut session = session();
        assert_eq!(session.set_amount("100"), InputOutcome::Changed);

        let ticket = session.begin_fetch();
        assert!(session.is_loading());

        assert!(session.complete(&ticket, Ok(table(&[("EUR", 0.9)]))));
        assert!(!session.is_loading());
        let conversion = session.conversion().unwrap();
        assert_eq!(conversion.display_target_amount(), "90.0000");
        assert_eq!(conversion.display_rate(), "1 USD = 0.90000000 EUR");
    }

    #[test]
    fn test_swap_is_an_involution() {
        let mut session = session();
        assert_eq!(session.swap(), InputOutcome::Changed);
        assert_eq!((session.base(), session.target()), ("EUR", "USD"));
        assert_eq!(session.swap(), InputOutcome::Changed);
        assert_eq!((session.base(), session.target()), ("USD", "EUR"));
    }

    #[test]
    fn test_swap_same_currency_is_noop() {
        let mut session = ConversionSession::new("GBP", "GBP", 1.0, Duration::from_secs(60));
        let generation = session.generation();
        assert_eq!(session.swap(), InputOutcome::Unchanged);
        assert_eq!(session.generation(), generation);
    }

    #[test]
    fn test_negative_amount_rejected_without_changing_state() {
        let mut session = session();
        session.set_amount("25");
        let ticket = session.begin_fetch();
        session.complete(&ticket, Ok(table(&[("EUR", 0.9)])));
        let generation = session.generation();
        let before = session.status().clone();

        assert_eq!(
            session.set_amount("-3"),
            InputOutcome::Rejected("Base value cannot be negative.".to_string())
        );
        assert_eq!(session.amount(), 25.0);
        assert_eq!(session.generation(), generation);
        assert_eq!(session.status(), &before);
    }

    #[test]
    fn test_malformed_amount_rejected() {
        let mut session = session();
        assert!(matches!(
            session.set_amount("12..5"),
            InputOutcome::Rejected(_)
        ));
        assert_eq!(session.amount(), 1.0);
    }

    #[test]
    fn test_stale_response_is_discarded() {
        let mut session = session();
        let first = session.begin_fetch();
        session.set_target("JPY");
        let second = session.begin_fetch();

        // The newer request resolves first.
        assert!(session.complete(&second, Ok(table(&[("EUR", 0.9), ("JPY", 150.0)]))));
        // The older one arrives late and must not overwrite it.
        assert!(!session.complete(&first, Ok(table(&[("EUR", 0.5), ("JPY", 1.0)]))));

        let conversion = session.conversion().unwrap();
        assert_eq!(conversion.target, "JPY");
        assert_eq!(conversion.rate, 150.0);
    }

    #[test]
    fn test_failure_exposes_single_error_and_drops_table() {
        let mut session = session();
        let ticket = session.begin_fetch();
        session.complete(&ticket, Ok(table(&[("EUR", 0.9)])));
        assert!(session.has_table());

        session.set_target("GBP");
        let ticket = session.begin_fetch();
        session.complete(&ticket, Err(anyhow!("HTTP error: 500")));

        assert!(!session.is_loading());
        assert_eq!(session.error(), Some(FETCH_FAILED_MESSAGE));
        assert!(session.conversion().is_none());
        assert!(!session.has_table());
        assert!(!session.recompute_locally());
    }

    #[test]
    fn test_retry_after_failure() {
        let mut session = session();
        let ticket = session.begin_fetch();
        session.complete(&ticket, Err(anyhow!("timeout")));

        let retry = session.retry();
        assert!(session.is_loading());
        assert!(!session.complete(&ticket, Ok(table(&[("EUR", 0.9)]))));
        assert!(session.complete(&retry, Ok(table(&[("EUR", 0.9)]))));
        assert!(session.error().is_none());
        assert!(session.conversion().is_some());
    }

    #[test]
    fn test_amount_change_recomputes_from_held_table() {
        let mut session = session();
        let ticket = session.begin_fetch();
        session.complete(&ticket, Ok(table(&[("EUR", 0.9)])));

        session.set_amount("10");
        assert!(session.recompute_locally());
        assert_eq!(session.conversion().unwrap().display_target_amount(), "9.0000");
    }

    #[test]
    fn test_expired_table_requires_fetch() {
        let mut session = ConversionSession::new("USD", "EUR", 1.0, Duration::ZERO);
        let ticket = session.begin_fetch();
        session.complete(&ticket, Ok(table(&[("EUR", 0.9)])));

        session.set_amount("10");
        assert!(!session.recompute_locally());

        session.mark_pending();
        assert!(session.is_loading());
        assert!(session.conversion().is_none());
    }

    #[test]
    fn test_unknown_currency_in_table() {
        let mut session = ConversionSession::new("USD", "XYZ", 1.0, Duration::from_secs(60));
        let ticket = session.begin_fetch();
        session.complete(&ticket, Ok(table(&[("EUR", 0.9)])));
        assert_eq!(session.error(), Some("Unknown currency: XYZ"));
    }
}
