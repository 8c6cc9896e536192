use super::ui;
use crate::core::flags::FlagCatalog;
use crate::core::{ConversionRequest, RateProvider, RateTable, RateTableProvider, Theme};
use anyhow::{Context, Result};
use comfy_table::{Cell, Table};

/// Builds a table of `amount` of `base` converted into every offered currency.
pub fn rates_table(
    table: &RateTable,
    base: &str,
    amount: f64,
    currencies: &[String],
    flags: &FlagCatalog,
    theme: Theme,
) -> Table {
    let mut output = ui::new_styled_table();
    output.set_header(vec![
        ui::header_cell("Currency", theme),
        ui::header_cell("Name", theme),
        ui::header_cell(&format!("Rate (1 {})", base.to_uppercase()), theme),
        ui::header_cell("Value", theme),
    ]);

    for code in currencies {
        let name = flags
            .entry(code)
            .map_or(String::new(), |entry| entry.name.clone());
        let request = ConversionRequest::new(base, code, amount);

        let row = match request.resolve(table) {
            Ok(conversion) => vec![
                Cell::new(&conversion.target),
                Cell::new(name),
                ui::number_cell(format!("{:.8}", conversion.rate)),
                ui::number_cell(conversion.display_target_amount()),
            ],
            Err(_) => vec![
                Cell::new(code.to_uppercase()),
                Cell::new(name),
                ui::na_cell(true),
                ui::na_cell(true),
            ],
        };
        output.add_row(row);
    }
    output
}

pub async fn run<P: RateTableProvider>(
    provider: &RateProvider<P>,
    base: &str,
    amount: f64,
    currencies: &[String],
    flags: &FlagCatalog,
    theme: Theme,
) -> Result<()> {
    let pb = ui::new_spinner("Fetching latest rates...");
    let table = provider.table().await;
    pb.finish_and_clear();
    let table = table.context("Failed to fetch currency data")?;

    println!(
        "{} {}\n",
        ui::style_text("Rates for", ui::StyleType::Title, theme),
        ui::style_text(
            &format!("{} {}", amount, base.to_uppercase()),
            ui::StyleType::Value,
            theme
        )
    );
    println!(
        "{}",
        rates_table(&table, base, amount, currencies, flags, theme)
    );
    if let Some(as_of) = table.as_of {
        println!(
            "\n{}",
            ui::style_text(
                &format!("Rates as of {}", as_of.format("%Y-%m-%d %H:%M UTC")),
                ui::StyleType::Subtle,
                theme
            )
        );
    }
    Ok(())
}
