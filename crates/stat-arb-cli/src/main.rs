mod commands;
mod input;
mod output;

use clap::{Parser, Subcommand, ValueEnum};
use colored::Colorize;
use std::process;
use tracing_subscriber::{fmt, EnvFilter};

use commands::backtest::BacktestArgs;
use commands::screening::ScreenArgs;
use commands::sweep::SweepArgs;

/// Pairs trading backtests with a rolling hedge ratio
#[derive(Parser)]
#[command(
    name = "statarb",
    version,
    about = "Pairs trading backtests with a rolling hedge ratio",
    long_about = "A CLI for backtesting mean-reversion pairs trading strategies with \
                  decimal precision. Fits a rolling OLS hedge ratio on log prices, trades \
                  the residual spread against a standard-error band, screens baskets for \
                  cointegrated pairs and sweeps strategy parameters in parallel."
)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Output format
    #[arg(long, default_value = "json", global = true)]
    output: OutputFormat,

    /// Log progress to stderr
    #[arg(long, short, global = true)]
    verbose: bool,

    /// Log per-window and per-trade detail to stderr
    #[arg(long, global = true)]
    debug: bool,
}

#[derive(Subcommand)]
enum Commands {
    /// Backtest the spread strategy on one pair
    Backtest(BacktestArgs),
    /// Screen every pair in a basket for cointegration
    Screen(ScreenArgs),
    /// Run a grid of strategy parameters in parallel
    Sweep(SweepArgs),
    /// Print version information
    Version,
}

#[derive(Debug, Clone, ValueEnum)]
pub enum OutputFormat {
    Json,
    Table,
    Csv,
    Minimal,
}

/// Install the stderr subscriber. `RUST_LOG` wins over the flags when set.
fn init_logging(verbose: bool, debug: bool) {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| {
        if debug {
            EnvFilter::new("debug")
        } else if verbose {
            EnvFilter::new("info")
        } else {
            EnvFilter::new("warn")
        }
    });

    fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

fn main() {
    let cli = Cli::parse();
    init_logging(cli.verbose, cli.debug);

    let result: Result<serde_json::Value, Box<dyn std::error::Error>> = match cli.command {
        Commands::Backtest(args) => commands::backtest::run_backtest(args),
        Commands::Screen(args) => commands::screening::run_screen(args),
        Commands::Sweep(args) => commands::sweep::run_sweep(args),
        Commands::Version => {
            println!("statarb {}", env!("CARGO_PKG_VERSION"));
            return;
        }
    };

    match result {
        Ok(value) => {
            output::format_output(&cli.output, &value);
            process::exit(0);
        }
        Err(e) => {
            eprintln!("{}: {}", "error".red().bold(), e);
            process::exit(1);
        }
    }
}
