use super::{ui, view};
use crate::core::flags::FlagCatalog;
use crate::core::{Conversion, ConversionRequest, RateProvider, RateTableProvider, Theme};
use anyhow::{Context, Result};

/// Resolves a single conversion, showing a spinner while the table is fetched.
pub async fn convert<P: RateTableProvider>(
    provider: &RateProvider<P>,
    request: &ConversionRequest,
) -> Result<Conversion> {
    let pb = ui::new_spinner("Fetching latest rates...");
    let result = provider.convert(request).await;
    pb.finish_and_clear();
    result.with_context(|| {
        format!(
            "Failed to convert {} {} to {}",
            request.amount, request.base, request.target
        )
    })
}

pub async fn run<P: RateTableProvider>(
    provider: &RateProvider<P>,
    request: &ConversionRequest,
    flags: &FlagCatalog,
    theme: Theme,
) -> Result<()> {
    let conversion = convert(provider, request).await?;
    println!(
        "{}\n",
        ui::style_text(view::TITLE, ui::StyleType::Title, theme)
    );
    println!("{}", view::render_conversion(&conversion, flags, theme));
    Ok(())
}
