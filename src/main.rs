use chrono::NaiveDate;
use clap::Parser;
use debt_schedule::{Debt, DebtError, ScheduleReporter};
use log::{info, LevelFilter};
use simple_logger::SimpleLogger;
use std::{collections::BTreeMap, process::ExitCode};

/// Amortization schedule of a fixed-rate loan with optional extraordinary payments.
#[derive(Parser, Debug)]
#[command(version, about)]
struct Cli {
    /// Amount borrowed
    #[arg(long, default_value_t = 20000.)]
    principal: f64,

    /// Interest per period as a percentage (3 means 3%)
    #[arg(long, default_value_t = 3.)]
    interest: f64,

    /// Number of periods to repay over
    #[arg(long, default_value_t = 24)]
    term: u32,

    /// Extraordinary payment as PERIOD=AMOUNT, repeatable
    #[arg(long = "extra", value_parser = parse_extra)]
    extra: Vec<(u32, f64)>,

    /// Decimal places shown in the table
    #[arg(long, default_value_t = 2)]
    decimals: usize,

    /// Date of the first payment (YYYY-MM-DD), adds a date column
    #[arg(long)]
    first_payment: Option<NaiveDate>,

    /// Log level: off, error, warn, info, debug or trace
    #[arg(long, default_value = "warn", value_parser = parse_level)]
    log_level: LevelFilter,
}

fn parse_extra(arg: &str) -> Result<(u32, f64), String> {
    let (period, amount) = arg
        .split_once('=')
        .ok_or_else(|| format!("expected PERIOD=AMOUNT, got `{}`", arg))?;
    let period = period
        .trim()
        .parse::<u32>()
        .map_err(|e| format!("bad period `{}`: {}", period, e))?;
    let amount = amount
        .trim()
        .parse::<f64>()
        .map_err(|e| format!("bad amount `{}`: {}", amount, e))?;
    Ok((period, amount))
}

fn parse_level(arg: &str) -> Result<LevelFilter, String> {
    arg.parse::<LevelFilter>()
        .map_err(|_| format!("unknown log level `{}`", arg))
}

fn run(cli: Cli) -> Result<(), DebtError> {
    let mut extraordinary_pmts = BTreeMap::new();
    for (period, amount) in cli.extra {
        if extraordinary_pmts.insert(period, amount).is_some() {
            return Err(DebtError::invalid(
                "extraordinary_payments",
                format!("period {} is scheduled more than once", period),
            ));
        }
    }

    let mut debt = Debt::new(cli.principal, cli.interest, cli.term, extraordinary_pmts)?;
    info!("fixed payment {:.4}", debt.initial_terms().fixed_payment);

    let mut reporter = ScheduleReporter::new(cli.decimals);
    if let Some(first) = cli.first_payment {
        reporter = reporter.with_first_payment_date(first);
    }
    let schedule = reporter.run(&mut debt)?;

    println!("{}", schedule.summary);
    println!();
    print!("{}", schedule.table);
    Ok(())
}

fn main() -> ExitCode {
    let cli = Cli::parse();
    if let Err(e) = SimpleLogger::new().with_level(cli.log_level).init() {
        eprintln!("logger: {}", e);
    }

    match run(cli) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("error: {}", e);
            ExitCode::FAILURE
        }
    }
}
