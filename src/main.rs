// tallybook - client CLI.
//
// Loads csvs into an in-process ledger and reports on it. Remote use goes
// through tallybook-server's HTTP API.

use std::collections::BTreeSet;
use std::path::PathBuf;

use anyhow::{bail, Context, Result};
use chrono::{Datelike, Local};
use clap::{Args, Parser, Subcommand};

use tallybook::account::AccountType;
use tallybook::budget::{load_budgets, Budget};
use tallybook::client::load_from_paths;
use tallybook::config::{parse_window, Config};
use tallybook::convert::{convert_files, converter, converters};
use tallybook::filters::TransactionFilter;
use tallybook::hints::Hints;
use tallybook::ledger::Ledger;
use tallybook::report::{reporter, reporters};
use tallybook::table::{Table, TableColumn};
use tallybook::transaction::parse_date;

#[derive(Parser)]
#[command(name = "tallybook", version, about = "Normalize and reconcile transaction exports")]
struct Cli {
    /// Path to a config file
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Command,
}

/// Options for loading csvs from the filesystem.
#[derive(Args, Clone)]
struct CsvOpts {
    /// Csvs or directories to load
    #[arg(long = "csvs", value_name = "CSV", num_args = 1..)]
    csvs: Vec<PathBuf>,

    /// Override the hints file paired with each csv
    #[arg(long)]
    hints: Option<PathBuf>,

    /// Day range in which duplicates are flagged; `off` disables
    #[arg(long, value_name = "DAYS")]
    duplicate_window: Option<String>,

    /// Silently drop invalid rows instead of failing the batch
    #[arg(long)]
    skip_invalid: bool,
}

/// Only use transactions that match a filter.
#[derive(Args, Clone, Default)]
struct FilterOpts {
    /// Keep transactions on or after this date
    #[arg(long)]
    start: Option<String>,

    /// Keep transactions on or before this date
    #[arg(long)]
    end: Option<String>,

    /// Filter for these account names
    #[arg(long, num_args = 1..)]
    accounts: Vec<String>,

    /// Filter for these currencies
    #[arg(long, num_args = 1..)]
    currencies: Vec<String>,

    /// Filter for these account types
    #[arg(long, num_args = 1..)]
    types: Vec<String>,

    /// Colon-separated tags; any overlap matches
    #[arg(long)]
    tags: Option<String>,
}

#[derive(Subcommand)]
enum Command {
    /// Load csvs and report what reconciled to what
    Load {
        #[command(flatten)]
        csv: CsvOpts,
    },

    /// Print filtered transactions as csv
    Dump {
        #[command(flatten)]
        csv: CsvOpts,
        #[command(flatten)]
        filter: FilterOpts,
    },

    /// Print account balances
    Balance {
        #[command(flatten)]
        csv: CsvOpts,
        #[command(flatten)]
        filter: FilterOpts,
    },

    /// Print income, expenses, and cash flow
    Expense {
        #[command(flatten)]
        csv: CsvOpts,
        #[command(flatten)]
        filter: FilterOpts,
    },

    /// Convert a bank's own export into canonical rows
    Convert {
        /// Converter preset; see --list
        #[arg(long, required_unless_present = "list")]
        converter: Option<String>,

        /// Csvs to convert
        #[arg(long = "csvs", value_name = "CSV", num_args = 1..)]
        csvs: Vec<PathBuf>,

        /// List available converters
        #[arg(long)]
        list: bool,
    },

    /// Run a report preset over loaded csvs
    Report {
        /// Reporter preset; see --list
        #[arg(long, required_unless_present = "list")]
        reporter: Option<String>,

        #[command(flatten)]
        csv: CsvOpts,

        #[command(flatten)]
        filter: FilterOpts,

        /// Budget files for the budget report
        #[arg(long = "budgets", value_name = "FILE", num_args = 1..)]
        budgets: Vec<PathBuf>,

        /// List available reporters
        #[arg(long)]
        list: bool,
    },
}

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "warn".into()),
        )
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    let config = Config::load(cli.config.as_deref())?;

    match cli.command {
        Command::Load { csv } => cmd_load(&config, &csv),
        Command::Dump { csv, filter } => {
            let ledger = build_ledger(&config, &csv)?;
            let filter = build_filter(&filter)?;
            print!("{}", ledger.dump(&filter)?);
            Ok(())
        }
        Command::Balance { csv, filter } => run_reporter(&config, &csv, &filter, "balance", &[]),
        Command::Expense { csv, filter } => {
            let mut filter = filter;
            if filter.types.is_empty() {
                filter.types = vec!["expense".to_string(), "income".to_string()];
            }
            if filter.start.is_none() && filter.end.is_none() {
                // default to the current month
                let today = Local::now().date_naive();
                filter.start = today.with_day(1).map(|d| d.to_string());
            }
            run_reporter(&config, &csv, &filter, "expense", &[])
        }
        Command::Convert {
            converter: name,
            csvs,
            list,
        } => cmd_convert(name.as_deref(), &csvs, list),
        Command::Report {
            reporter: name,
            csv,
            filter,
            budgets,
            list,
        } => {
            if list {
                for r in reporters() {
                    println!("{:<12} {}", r.name(), r.description());
                }
                return Ok(());
            }
            let name = name.unwrap_or_default();
            run_reporter(&config, &csv, &filter, &name, &budgets)
        }
    }
}

// ============================================================================
// SUBCOMMANDS
// ============================================================================

fn cmd_load(config: &Config, csv: &CsvOpts) -> Result<()> {
    let (ledger, ids) = build_ledger_with_ids(config, csv)?;

    println!(
        "{} transactions across {} accounts",
        ledger.len(),
        ledger.accounts().len()
    );

    let dupes = ledger.report_dupes(&ids);
    if dupes.is_empty() {
        return Ok(());
    }

    let mut table = Table::new(vec![
        TableColumn::left("Date"),
        TableColumn::left("Src"),
        TableColumn::left("Dest"),
        TableColumn::left("Amount"),
        TableColumn::left("Original"),
        TableColumn::left("Duplicate"),
    ]);
    for dupe in &dupes {
        let Some(t) = ledger.transaction(dupe.original) else {
            continue;
        };
        table.add_row(vec![
            t.date.to_string(),
            t.src.clone(),
            t.dest.clone(),
            t.amount.to_string(),
            label(&dupe.original_perspective),
            label(&dupe.perspective),
        ]);
    }
    println!("\n{} rows reconciled to already-known events:", dupes.len());
    println!("{}", table.render());
    Ok(())
}

fn label(perspective: &str) -> String {
    if perspective.is_empty() {
        "(unattributed)".to_string()
    } else {
        perspective.to_string()
    }
}

fn cmd_convert(name: Option<&str>, csvs: &[PathBuf], list: bool) -> Result<()> {
    if list {
        for c in converters() {
            println!("{:<18} {}", c.name(), c.description());
        }
        return Ok(());
    }

    let name = name.unwrap_or_default();
    let Some(conv) = converter(name) else {
        bail!(
            "no converter named `{}`; try one of: {}",
            name,
            converters()
                .iter()
                .map(|c| c.name())
                .collect::<Vec<_>>()
                .join(", ")
        );
    };
    if csvs.is_empty() {
        bail!("no files to convert; specify --csvs");
    }

    println!("{}", convert_files(csvs, conv.as_ref())?);
    Ok(())
}

fn run_reporter(
    config: &Config,
    csv: &CsvOpts,
    filter: &FilterOpts,
    name: &str,
    budget_files: &[PathBuf],
) -> Result<()> {
    let Some(rep) = reporter(name) else {
        bail!(
            "no reporter named `{}`; try one of: {}",
            name,
            reporters()
                .iter()
                .map(|r| r.name())
                .collect::<Vec<_>>()
                .join(", ")
        );
    };

    let ledger = build_ledger(config, csv)?;
    let filter = build_filter(filter)?;
    let ledger = ledger.filtered(&filter)?;

    let budget = if budget_files.is_empty() {
        Budget::new()
    } else {
        load_budgets(budget_files)?
    };

    print!("{}", rep.run(&ledger, &budget));
    Ok(())
}

// ============================================================================
// ASSEMBLY
// ============================================================================

fn build_ledger(config: &Config, csv: &CsvOpts) -> Result<Ledger> {
    Ok(build_ledger_with_ids(config, csv)?.0)
}

fn build_ledger_with_ids(
    config: &Config,
    csv: &CsvOpts,
) -> Result<(Ledger, Vec<tallybook::TxId>)> {
    let window = match &csv.duplicate_window {
        Some(s) => parse_window(s)?,
        None => config.duplicate_window,
    };

    let override_path = csv.hints.as_ref().or(config.hints.as_ref());
    let hints = match override_path {
        Some(path) => Some(
            Hints::from_file(path)
                .with_context(|| format!("could not read hints {}", path.display()))?,
        ),
        None => None,
    };

    load_from_paths(
        &csv.csvs,
        &config.primary_currency,
        window,
        hints.as_ref(),
        csv.skip_invalid,
    )
}

fn build_filter(opts: &FilterOpts) -> Result<TransactionFilter> {
    let mut filter = TransactionFilter::default();

    if let Some(start) = &opts.start {
        filter.start = Some(parse_date(start)?);
    }
    if let Some(end) = &opts.end {
        filter.end = Some(parse_date(end)?);
    }

    filter.accounts = opts.accounts.iter().cloned().collect();
    filter.currencies = opts.currencies.iter().cloned().collect();

    let mut types = BTreeSet::new();
    for t in &opts.types {
        types.insert(AccountType::from_keyword(t)?);
    }
    filter.types = types;

    if let Some(tags) = &opts.tags {
        filter.tags = tags
            .split(':')
            .map(str::trim)
            .filter(|t| !t.is_empty())
            .map(String::from)
            .collect();
    }

    Ok(filter)
}
