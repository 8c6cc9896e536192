use super::{ui, view};
use crate::core::config::AppConfig;
use crate::core::driver::{SessionInput, SessionUpdate, run_session_actor};
use crate::core::flags::FlagCatalog;
use crate::core::{ConversionSession, ConversionStatus, RateTableProvider, Theme};
use anyhow::{Context, Result, bail};
use indicatif::ProgressBar;
use std::sync::Arc;
use tokio::io::{AsyncBufReadExt, BufReader};
use tokio::sync::mpsc::{self, Sender};
use tracing::debug;

const HELP: &str = "\
Commands:
  <amount>          set the amount to convert
  from <CODE>       set the base currency
  to <CODE>         set the target currency
  swap              exchange base and target
  retry             fetch rates again
  theme             toggle light/dark output
  help              show this message
  quit              leave";

#[derive(Debug, PartialEq)]
pub enum ReplCommand {
    Session(SessionInput),
    Help,
    Empty,
}

pub fn parse_command(line: &str) -> Result<ReplCommand> {
    let line = line.trim();
    let mut parts = line.splitn(2, char::is_whitespace);
    let head = parts.next().unwrap_or_default().to_lowercase();
    let arg = parts.next().map(str::trim).unwrap_or_default();

    let input = match head.as_str() {
        "" => return Ok(ReplCommand::Empty),
        "help" | "?" => return Ok(ReplCommand::Help),
        "quit" | "exit" | "q" => SessionInput::Quit,
        "swap" => SessionInput::Swap,
        "retry" => SessionInput::Retry,
        "theme" => SessionInput::ToggleTheme,
        "from" | "base" => SessionInput::Base(required(arg, &head)?),
        "to" | "target" => SessionInput::Target(required(arg, &head)?),
        "amount" => SessionInput::Amount(arg.to_string()),
        _ if head.starts_with(|c: char| c.is_ascii_digit() || c == '-' || c == '.') => {
            SessionInput::Amount(line.to_string())
        }
        _ => bail!("Unknown command: {}. Type 'help' for a list of commands.", line),
    };
    Ok(ReplCommand::Session(input))
}

fn required(arg: &str, command: &str) -> Result<String> {
    if arg.is_empty() {
        bail!("Usage: {} <CODE>", command);
    }
    Ok(arg.to_uppercase())
}

async fn read_commands(input_tx: Sender<SessionInput>) {
    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    while let Ok(Some(line)) = lines.next_line().await {
        match parse_command(&line) {
            Ok(ReplCommand::Session(input)) => {
                let quit = input == SessionInput::Quit;
                if input_tx.send(input).await.is_err() || quit {
                    return;
                }
            }
            Ok(ReplCommand::Help) => println!("{HELP}"),
            Ok(ReplCommand::Empty) => {}
            Err(e) => println!("{e}"),
        }
    }
    debug!("Input closed");
    let _ = input_tx.send(SessionInput::Quit).await;
}

pub async fn run<P>(
    provider: Arc<P>,
    config: &AppConfig,
    flags: &FlagCatalog,
    theme: Theme,
) -> Result<()>
where
    P: RateTableProvider + 'static,
{
    let (input_tx, input_rx) = mpsc::channel(32);
    let (update_tx, mut update_rx) = mpsc::channel(32);
    let session = ConversionSession::new(
        &config.base_currency,
        &config.target_currency,
        1.0,
        config.cache_ttl(),
    );

    let actor = tokio::spawn(run_session_actor(
        provider,
        session,
        theme,
        config.debounce(),
        input_rx,
        update_tx,
    ));

    let offered: Vec<&str> = flags
        .filtered(&config.currencies)
        .iter()
        .map(|entry| entry.code.as_str())
        .collect();
    println!("{HELP}\n\nCurrencies: {}", offered.join(", "));
    let reader = tokio::spawn(read_commands(input_tx));

    let mut theme = theme;
    let mut spinner: Option<ProgressBar> = None;
    while let Some(update) = update_rx.recv().await {
        match update {
            SessionUpdate::Notice(message) => {
                println!(
                    "{}",
                    ui::style_text(&message, ui::StyleType::Error, theme)
                );
            }
            SessionUpdate::State(state) => {
                theme = state.theme;
                if state.status == ConversionStatus::Loading {
                    spinner.get_or_insert_with(|| ui::new_spinner("Fetching latest rates..."));
                    continue;
                }
                if let Some(pb) = spinner.take() {
                    pb.finish_and_clear();
                }
                ui::print_separator();
                println!("{}", view::render_snapshot(&state, flags));
            }
        }
    }

    if let Some(pb) = spinner.take() {
        pb.finish_and_clear();
    }
    reader.abort();
    actor.await.context("Conversion session task failed")?;
    Ok(())
}
