mod commands;
mod input;
mod output;
mod server;

use chrono::NaiveDate;
use clap::{Args, Parser, Subcommand, ValueEnum};
use colored::Colorize;
use std::net::SocketAddr;
use std::process;
use tracing_subscriber::EnvFilter;

use commands::amortization::{AmortizeArgs, ElapsedArgs};
use commands::calculator::{CreditCalcArgs, MortgageCalcArgs};
use commands::early_payment::{CompareArgs, EarlyPaymentArgs, RecurringExtraArgs};
use commands::servicing::{MortgageSummaryArgs, PayArgs};

/// Loan amortization and early-payment calculations
#[derive(Parser)]
#[command(
    name = "loan",
    version,
    about = "Loan amortization and early-payment calculations",
    long_about = "Amortization schedules, elapsed-term reconstruction and early-payment \
                  simulations with decimal precision. Every command reads a JSON request \
                  from --input or stdin, or takes individual flags."
)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Output format
    #[arg(long, default_value = "json", global = true)]
    output: OutputFormat,

    /// Valuation date for elapsed-term calculations (defaults to today)
    #[arg(long, global = true)]
    as_of: Option<NaiveDate>,
}

#[derive(Subcommand)]
enum Commands {
    /// Build a full amortization schedule
    Amortize(AmortizeArgs),
    /// Reconstruct repayment progress at a date
    Elapsed(ElapsedArgs),
    /// Simulate a lump-sum early payment
    EarlyPayment(EarlyPaymentArgs),
    /// Compare shortening the term against lowering the payment
    Compare(CompareArgs),
    /// Simulate a recurring extra amount on every installment
    RecurringExtra(RecurringExtraArgs),
    /// Credit calculator (schedule, progress and strategies)
    CreditCalc(CreditCalcArgs),
    /// Mortgage calculator over the financed amount
    MortgageCalc(MortgageCalcArgs),
    /// Post a regular or extra payment against a loan
    Pay(PayArgs),
    /// Headline figures for a mortgage position
    MortgageSummary(MortgageSummaryArgs),
    /// Serve the calculators over HTTP
    Serve(ServeArgs),
    /// Print version information
    Version,
}

#[derive(Args)]
struct ServeArgs {
    /// Address to listen on
    #[arg(long, env = "LOAN_ENGINE_BIND", default_value = server::DEFAULT_BIND)]
    bind: SocketAddr,
}

#[derive(Debug, Clone, ValueEnum)]
pub enum OutputFormat {
    Json,
    Table,
    Csv,
    Minimal,
}

fn init_tracing() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

fn serve(args: ServeArgs) -> Result<(), Box<dyn std::error::Error>> {
    let runtime = tokio::runtime::Runtime::new()?;
    runtime.block_on(server::run_server(args.bind))?;
    Ok(())
}

fn main() {
    let cli = Cli::parse();
    init_tracing();
    let as_of = cli.as_of;

    let result: Result<serde_json::Value, Box<dyn std::error::Error>> = match cli.command {
        Commands::Amortize(args) => commands::amortization::run_amortize(args, as_of),
        Commands::Elapsed(args) => commands::amortization::run_elapsed(args, as_of),
        Commands::EarlyPayment(args) => commands::early_payment::run_early_payment(args),
        Commands::Compare(args) => commands::early_payment::run_compare(args),
        Commands::RecurringExtra(args) => commands::early_payment::run_recurring_extra(args, as_of),
        Commands::CreditCalc(args) => commands::calculator::run_credit_calc(args, as_of),
        Commands::MortgageCalc(args) => commands::calculator::run_mortgage_calc(args),
        Commands::Pay(args) => commands::servicing::run_pay(args),
        Commands::MortgageSummary(args) => commands::servicing::run_mortgage_summary(args, as_of),
        Commands::Serve(args) => match serve(args) {
            Ok(()) => return,
            Err(e) => Err(e),
        },
        Commands::Version => {
            println!("loan {}", env!("CARGO_PKG_VERSION"));
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
