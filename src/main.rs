use anyhow::Result;
use clap::{CommandFactory, Parser, Subcommand};
use currenz::core::Theme;
use currenz::core::log::init_logging;

#[derive(Parser)]
#[command(version, about)]
struct Cli {
    /// Enable verbose logging
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Path to optional configuration file
    #[arg(short, long, global = true)]
    config_path: Option<String>,

    /// Output theme (light or dark), overrides the configuration
    #[arg(short, long, global = true)]
    theme: Option<Theme>,

    #[command(subcommand)]
    command: Option<Commands>,
}

impl From<Commands> for currenz::AppCommand {
    fn from(cmd: Commands) -> currenz::AppCommand {
        match cmd {
            Commands::Convert { amount, from, to } => {
                currenz::AppCommand::Convert { amount, from, to }
            }
            Commands::Rates { base, amount } => currenz::AppCommand::Rates { base, amount },
            Commands::Currencies => currenz::AppCommand::Currencies,
            Commands::Interactive => currenz::AppCommand::Interactive,
            Commands::Setup => unreachable!("Setup command should be handled separately"),
        }
    }
}

#[derive(Subcommand)]
enum Commands {
    /// Create default configuration
    Setup,
    /// Convert an amount from one currency to another
    Convert {
        /// Amount in the base currency
        amount: String,
        /// Base currency code, defaults to the configured base
        from: Option<String>,
        /// Target currency code, defaults to the configured target
        to: Option<String>,
    },
    /// Show an amount converted into every configured currency
    Rates {
        /// Base currency code, defaults to the configured base
        #[arg(short, long)]
        base: Option<String>,
        /// Amount in the base currency
        #[arg(short, long, default_value = "1")]
        amount: String,
    },
    /// List configured currencies with their flags
    Currencies,
    /// Convert interactively, updating as inputs change
    Interactive,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    init_logging(cli.verbose);

    let options = currenz::RunOptions {
        config_path: cli.config_path.as_deref(),
        theme: cli.theme,
    };
    let result = match cli.command {
        Some(Commands::Setup) => currenz::cli::setup::setup(),
        Some(cmd) => currenz::run_command(cmd.into(), options).await,
        None => {
            Cli::command().print_help()?;
            Ok(())
        }
    };

    if let Err(e) = &result {
        tracing::error!(error = %e, "Application failed");
    }
    result
}
