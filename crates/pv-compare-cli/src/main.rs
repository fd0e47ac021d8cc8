mod commands;
mod input;
mod output;

use clap::{Parser, Subcommand, ValueEnum};
use colored::Colorize;
use std::process;
use tracing_subscriber::EnvFilter;

use commands::compare::{CompareArgs, SweepArgs};
use commands::rates::{BracketArgs, ConvertRateArgs};
use commands::schedule::{DiscountArgs, PresentValueArgs, ScheduleArgs};

/// Pay now or pay in installments? Present-value comparison calculator
#[derive(Parser)]
#[command(
    name = "pvc",
    version,
    about = "Compare paying in full against paying in installments",
    long_about = "Computes the present value of an installment plan and of paying now \
                  (optionally with a cash discount) under one effective monthly rate, \
                  converted from a SELIC/CDI annual rate or given directly. Installments \
                  can be grossed up for withholding tax on the foregone yield."
)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Output format
    #[arg(long, default_value = "json", global = true)]
    output: OutputFormat,

    /// Calculator configuration file (JSON, or YAML with a .yaml/.yml extension)
    #[arg(long, global = true)]
    config: Option<String>,

    /// Log pipeline details to stderr
    #[arg(short, long, global = true)]
    verbose: bool,
}

#[derive(Subcommand)]
enum Commands {
    /// Convert an annual or monthly rate into the effective monthly rate
    ConvertRate(ConvertRateArgs),
    /// Withholding tax rate for a holding period
    Bracket(BracketArgs),
    /// Reconcile a cash discount percentage with a discounted price
    Discount(DiscountArgs),
    /// Build the installment schedule
    Schedule(ScheduleArgs),
    /// Present value of an arbitrary cash-flow schedule
    PresentValue(PresentValueArgs),
    /// Compare installments against paying now
    Compare(CompareArgs),
    /// Compare every installment count up to a maximum
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

fn init_tracing(verbose: bool) {
    let filter = if verbose {
        EnvFilter::new("pv_compare_core=debug,pvc=debug")
    } else {
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"))
    };

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

fn main() {
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    let config = match input::config::load_config(cli.config.as_deref()) {
        Ok(config) => config,
        Err(e) => {
            eprintln!("{}: {}", "error".red().bold(), e);
            process::exit(1);
        }
    };

    let result: Result<serde_json::Value, Box<dyn std::error::Error>> = match cli.command {
        Commands::ConvertRate(args) => commands::rates::run_convert_rate(args, &config),
        Commands::Bracket(args) => commands::rates::run_bracket(args),
        Commands::Discount(args) => commands::schedule::run_discount(args),
        Commands::Schedule(args) => commands::schedule::run_schedule(args, &config),
        Commands::PresentValue(args) => commands::schedule::run_present_value(args, &config),
        Commands::Compare(args) => commands::compare::run_compare(args, &config),
        Commands::Sweep(args) => commands::compare::run_sweep(args, &config),
        Commands::Version => {
            println!("pvc {}", env!("CARGO_PKG_VERSION"));
            return;
        }
    };

    match result {
        Ok(value) => {
            output::format_output(&cli.output, &value);
            process::exit(0);
        }
        Err(e) => {
            tracing::debug!(error = %e, "command failed");
            eprintln!("{}: {}", "error".red().bold(), e);
            process::exit(1);
        }
    }
}
