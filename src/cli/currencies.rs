use super::ui;
use crate::core::Theme;
use crate::core::flags::FlagCatalog;
use comfy_table::{Cell, Table};

/// Lists the offered currencies with their display name and flag asset.
pub fn currencies_table(currencies: &[String], flags: &FlagCatalog, theme: Theme) -> Table {
    let mut table = ui::new_styled_table();
    table.set_header(vec![
        ui::header_cell("Currency", theme),
        ui::header_cell("Name", theme),
        ui::header_cell("Flag", theme),
    ]);

    for code in currencies {
        match flags.entry(code) {
            Some(entry) => table.add_row(vec![
                Cell::new(&entry.code),
                Cell::new(&entry.name),
                Cell::new(&entry.flag),
            ]),
            None => table.add_row(vec![
                Cell::new(code.to_uppercase()),
                ui::na_cell(false),
                ui::na_cell(false),
            ]),
        };
    }
    table
}

pub fn run(currencies: &[String], flags: &FlagCatalog, theme: Theme) {
    println!("{}", currencies_table(currencies, flags, theme));
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_currencies_table_marks_unknown_codes() {
        let flags = FlagCatalog::bundled().unwrap();
        let currencies = vec!["LKR".to_string(), "ABC".to_string()];

        let rendered = currencies_table(&currencies, &flags, Theme::Dark).to_string();
        assert!(rendered.contains("Sri Lankan Rupee"));
        assert!(rendered.contains("flagcdn.com/w40/lk.png"));
        assert!(rendered.contains("ABC"));
        assert!(rendered.contains("N/A"));
    }
}
