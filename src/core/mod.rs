//! Core conversion logic and abstractions

pub mod cache;
pub mod config;
pub mod conversion;
pub mod currency;
pub mod driver;
pub mod flags;
pub mod log;
pub mod rates;
pub mod session;
pub mod theme;

// Re-export main types for cleaner imports
pub use conversion::{Conversion, ConversionRequest, RateProvider};
pub use currency::RateTableProvider;
pub use rates::{ANCHOR_CURRENCY, RateTable};
pub use session::{ConversionSession, ConversionStatus, FetchTicket, InputOutcome};
pub use theme::Theme;
