//! Text rendering of the conversion screen.

use super::ui::{self, StyleType};
use crate::core::driver::SessionSnapshot;
use crate::core::flags::FlagCatalog;
use crate::core::{Conversion, ConversionStatus, Theme};

pub const TITLE: &str = "CurrenZ";

fn currency_line(code: &str, value: &str, flags: &FlagCatalog, theme: Theme) -> String {
    let mut line = format!(
        "{}{}",
        ui::style_text(&format!("{code:<5}"), StyleType::Label, theme),
        ui::style_text(value, StyleType::Value, theme)
    );
    if let Some(flag) = flags.flag_for(code) {
        line.push_str(&format!(
            "  {}",
            ui::style_text(&format!("[{flag}]"), StyleType::Subtle, theme)
        ));
    }
    line
}

/// Renders a resolved conversion: both sides, the rate line and the table timestamp.
pub fn render_conversion(conversion: &Conversion, flags: &FlagCatalog, theme: Theme) -> String {
    let mut output = String::new();
    output.push_str(&currency_line(
        &conversion.base,
        &conversion.amount.to_string(),
        flags,
        theme,
    ));
    output.push_str("\n  ⇅\n");
    output.push_str(&currency_line(
        &conversion.target,
        &conversion.display_target_amount(),
        flags,
        theme,
    ));
    output.push_str("\n\n");
    output.push_str(&conversion.display_rate());
    if let Some(as_of) = conversion.as_of {
        output.push_str(&format!(
            "\n{}",
            ui::style_text(
                &format!("Rates as of {}", as_of.format("%Y-%m-%d %H:%M UTC")),
                StyleType::Subtle,
                theme
            )
        ));
    }
    output
}

/// Renders one frame of the interactive screen.
pub fn render_snapshot(state: &SessionSnapshot, flags: &FlagCatalog) -> String {
    let theme = state.theme;
    let mut output = format!("{}\n\n", ui::style_text(TITLE, StyleType::Title, theme));

    match &state.status {
        ConversionStatus::Idle => {
            output.push_str(&format!("{} → {}", state.base, state.target));
        }
        ConversionStatus::Loading => {
            output.push_str(&ui::style_text(
                "Fetching latest rates...",
                StyleType::Subtle,
                theme,
            ));
        }
        ConversionStatus::Failed(message) => {
            output.push_str(&ui::style_text(message, StyleType::Error, theme));
            output.push_str(&format!(
                "\n{}",
                ui::style_text("Type 'retry' to try again.", StyleType::Subtle, theme)
            ));
        }
        ConversionStatus::Ready(conversion) => {
            output.push_str(&render_conversion(conversion, flags, theme));
        }
    }
    output
}

#[cfg(test)]
mod tests {
    use super::*;

    fn conversion() -> Conversion {
        Conversion {
            base: "USD".to_string(),
            target: "GBP".to_string(),
            amount: 100.0,
            rate: 0.8,
            target_amount: 80.0,
            as_of: None,
        }
    }

    fn snapshot(status: ConversionStatus) -> SessionSnapshot {
        SessionSnapshot {
            base: "USD".to_string(),
            target: "GBP".to_string(),
            amount: 100.0,
            status,
            theme: Theme::Dark,
        }
    }

    #[test]
    fn test_render_conversion() {
        let flags = FlagCatalog::bundled().unwrap();
        let output = render_conversion(&conversion(), &flags, Theme::Light);
        assert!(output.contains("80.0000"));
        assert!(output.contains("1 USD = 0.80000000 GBP"));
        assert!(output.contains("flagcdn.com/w40/gb.png"));
    }

    #[test]
    fn test_render_without_flags() {
        let flags = FlagCatalog::default();
        let output = render_conversion(&conversion(), &flags, Theme::Light);
        assert!(output.contains("1 USD = 0.80000000 GBP"));
        assert!(!output.contains("flagcdn"));
    }

    #[test]
    fn test_error_replaces_conversion() {
        let flags = FlagCatalog::default();
        let output = render_snapshot(
            &snapshot(ConversionStatus::Failed("Failed to fetch".to_string())),
            &flags,
        );
        assert!(output.contains("Failed to fetch"));
        assert!(output.contains("retry"));
        assert!(!output.contains("1 USD ="));
    }

    #[test]
    fn test_loading_frame() {
        let flags = FlagCatalog::default();
        let output = render_snapshot(&snapshot(ConversionStatus::Loading), &flags);
        assert!(output.contains("Fetching latest rates..."));
    }
}
