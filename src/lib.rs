pub mod cli;
pub mod core;
pub mod providers;

use crate::core::cache::Cache;
use crate::core::config::AppConfig;
use crate::core::flags::FlagCatalog;
use crate::core::{ConversionRequest, RateProvider, RateTable, Theme};
use crate::providers::OpenExchangeRatesProvider;
use anyhow::Result;
use std::sync::Arc;
use tracing::{debug, info};

pub enum AppCommand {
    Convert {
        amount: String,
        from: Option<String>,
        to: Option<String>,
    },
    Rates {
        base: Option<String>,
        amount: String,
    },
    Currencies,
    Interactive,
}

/// Options shared by every command.
#[derive(Default)]
pub struct RunOptions<'a> {
    pub config_path: Option<&'a str>,
    pub theme: Option<Theme>,
}

fn load_config(config_path: Option<&str>) -> Result<AppConfig> {
    let config = match config_path {
        Some(path) => AppConfig::load_from_path(path)?,
        None => AppConfig::load()?,
    };
    debug!("Loaded config: {config:#?}");
    Ok(config)
}

fn load_flags(config: &AppConfig) -> Result<FlagCatalog> {
    match &config.flags_path {
        Some(path) => FlagCatalog::load_from_path(path),
        None => FlagCatalog::bundled(),
    }
}

fn build_provider(config: &AppConfig) -> Result<OpenExchangeRatesProvider> {
    let app_id = config.app_id()?;
    let table_cache = Arc::new(Cache::<String, RateTable>::new());
    Ok(OpenExchangeRatesProvider::new(
        config.base_url(),
        &app_id,
        table_cache,
        config.cache_ttl(),
    ))
}

pub async fn run_command(command: AppCommand, options: RunOptions<'_>) -> Result<()> {
    info!("CurrenZ starting...");

    let config = load_config(options.config_path)?;
    let theme = options.theme.unwrap_or(config.theme);
    let flags = load_flags(&config)?;

    match command {
        AppCommand::Currencies => {
            cli::currencies::run(&config.currencies, &flags, theme);
            Ok(())
        }
        AppCommand::Convert { amount, from, to } => {
            let amount = crate::core::conversion::parse_amount(&amount)?;
            let from = from.unwrap_or_else(|| config.base_currency.clone());
            let to = to.unwrap_or_else(|| config.target_currency.clone());
            let provider = RateProvider::new(build_provider(&config)?);
            let request = ConversionRequest::new(&from, &to, amount);
            cli::convert::run(&provider, &request, &flags, theme).await
        }
        AppCommand::Rates { base, amount } => {
            let amount = crate::core::conversion::parse_amount(&amount)?;
            let base = base.unwrap_or_else(|| config.base_currency.clone());
            let provider = RateProvider::new(build_provider(&config)?);
            cli::rates::run(&provider, &base, amount, &config.currencies, &flags, theme).await
        }
        AppCommand::Interactive => {
            let provider = Arc::new(build_provider(&config)?);
            cli::interactive::run(provider, &config, &flags, theme).await
        }
    }
}
