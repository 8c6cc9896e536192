//! Static currency reference data: display names and flag assets.

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::{fs, path::Path};
use tracing::debug;

const BUNDLED_FLAGS: &str = include_str!("../../assets/currencies-with-flags.json");

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CurrencyFlagEntry {
    pub code: String,
    pub name: String,
    pub flag: String,
}

/// Read-only catalogue of flag entries, loaded once at startup.
#[derive(Debug, Clone, Default)]
pub struct FlagCatalog {
    entries: Vec<CurrencyFlagEntry>,
}

impl FlagCatalog {
    pub fn bundled() -> Result<Self> {
        Self::from_json(BUNDLED_FLAGS).context("Failed to parse bundled currency flags")
    }

    pub fn load_from_path<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let content = fs::read_to_string(path)
            .with_context(|| format!("Failed to read currency flags: {}", path.display()))?;
        Self::from_json(&content)
            .with_context(|| format!("Failed to parse currency flags: {}", path.display()))
    }

    pub fn from_json(content: &str) -> Result<Self> {
        let entries: Vec<CurrencyFlagEntry> = serde_json::from_str(content)?;
        debug!("Loaded {} currency flag entries", entries.len());
        Ok(Self { entries })
    }

    pub fn entry(&self, code: &str) -> Option<&CurrencyFlagEntry> {
        self.entries
            .iter()
            .find(|entry| entry.code.eq_ignore_ascii_case(code))
    }

    /// Flag asset for `code`, if the catalogue has one.
    pub fn flag_for(&self, code: &str) -> Option<&str> {
        self.entry(code).map(|entry| entry.flag.as_str())
    }

    /// Entries for the offered currencies, in the order they are offered.
    /// Codes without an entry are skipped.
    pub fn filtered(&self, options: &[String]) -> Vec<&CurrencyFlagEntry> {
        options.iter().filter_map(|code| self.entry(code)).collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_bundled_catalog_covers_default_options() {
        let catalog = FlagCatalog::bundled().unwrap();
        for code in ["USD", "EUR", "LKR", "JPY", "GBP", "KRW"] {
            assert!(catalog.flag_for(code).is_some(), "missing flag for {code}");
        }
    }

    #[test]
    fn test_flag_lookup() {
        let catalog = FlagCatalog::from_json(
            r#"[{"code": "USD", "name": "US Dollar", "flag": "https://flags.test/us.png"}]"#,
        )
        .unwrap();

        assert_eq!(catalog.flag_for("USD"), Some("https://flags.test/us.png"));
        assert_eq!(catalog.flag_for("usd"), Some("https://flags.test/us.png"));
        assert_eq!(catalog.flag_for("XYZ"), None);
        assert_eq!(catalog.flag_for(""), None);
    }

    #[test]
    fn test_filtered_keeps_option_order() {
        let catalog = FlagCatalog::bundled().unwrap();
        let options = vec!["JPY".to_string(), "XYZ".to_string(), "EUR".to_string()];
        let codes: Vec<&str> = catalog
            .filtered(&options)
            .iter()
            .map(|entry| entry.code.as_str())
            .collect();
        assert_eq!(codes, vec!["JPY", "EUR"]);
    }

    #[test]
    fn test_malformed_catalog_is_an_error() {
        assert!(FlagCatalog::from_json(r#"{"code": "USD"}"#).is_err());
    }
}
