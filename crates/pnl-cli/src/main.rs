mod commands;
mod input;
mod output;

use clap::{ArgAction, Parser, Subcommand, ValueEnum};
use colored::Colorize;
use std::process;
use tracing_subscriber::EnvFilter;

use commands::routes::RoutesArgs;
use commands::simulate::{BrandArgs, MonthsArgs, SimulateArgs};
use commands::validate::ValidateArgs;

/// Multi-level distribution P&L simulation
#[derive(Parser)]
#[command(
    name = "pnl",
    version,
    about = "Multi-level distribution P&L simulation",
    long_about = "A CLI for simulating brand P&L down the Brand → Operation → Zone → \
                  Municipality hierarchy with decimal precision. Cascades revenue by \
                  participation, costs logistics routes, prorates shared costs and \
                  reconciles ICA and income tax."
)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Output format
    #[arg(long, default_value = "json", global = true)]
    output: OutputFormat,

    /// Log verbosity on stderr (-v info, -vv debug, -vvv trace). RUST_LOG wins when set.
    #[arg(short, long, action = ArgAction::Count, global = true)]
    verbose: u8,
}

#[derive(Subcommand)]
enum Commands {
    /// Simulate every brand of a scenario
    Simulate(SimulateArgs),
    /// Simulate a single brand
    Brand(BrandArgs),
    /// Check participation percentages and references
    Validate(ValidateArgs),
    /// Cost routes and distribute vehicle fixed costs
    Routes(RoutesArgs),
    /// Twelve-month projection
    Months(MonthsArgs),
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

fn init_tracing(verbose: u8) {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| {
        EnvFilter::new(match verbose {
            0 => "warn",
            1 => "info",
            2 => "debug",
            _ => "trace",
        })
    });
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .init();
}

fn main() {
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    let result: Result<serde_json::Value, Box<dyn std::error::Error>> = match cli.command {
        Commands::Simulate(args) => commands::simulate::run_simulate(args),
        Commands::Brand(args) => commands::simulate::run_brand(args),
        Commands::Validate(args) => commands::validate::run_validate(args),
        Commands::Routes(args) => commands::routes::run_routes(args),
        Commands::Months(args) => commands::simulate::run_months(args),
        Commands::Version => {
            println!("pnl {}", env!("CARGO_PKG_VERSION"));
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
