use anyhow::{bail, Context, Result};
use campuscard_analyze::{analyze_file, render_summary, write_report, AnalyzeOptions};
use campuscard_core::{latest_batch_file, time, QueryRange};
use campuscard_fetch::{fetch_to_file, Credentials, FetchOptions, PortalClient};
use chrono::NaiveDate;
use clap::{Parser, Subcommand};
use std::path::PathBuf;
use std::time::Duration;
use tracing_subscriber::EnvFilter;

mod config;
mod prompt;
mod state;

const VERSION: &str = concat!(env!("CARGO_PKG_VERSION"), " (", env!("CAMPUSCARD_BUILD_SHA"), ")");

#[derive(Parser, Debug)]
#[command(name = "campuscard", version = VERSION, about = "Fetch and analyze campus-card transactions")]
struct Cli {
    /// Debug logging on stderr (RUST_LOG overrides)
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Download transaction history to card_transactions_<account>_<range>.json
    Fetch {
        /// Account number to query
        account: String,

        /// Start date, YYYY-MM-DD (default: 60 days before the end date)
        #[arg(long, value_parser = parse_date)]
        start_date: Option<NaiveDate>,

        /// End date, YYYY-MM-DD (default: today, Beijing time)
        #[arg(long, value_parser = parse_date)]
        end_date: Option<NaiveDate>,

        /// Seconds between page requests
        #[arg(long)]
        delay: Option<f64>,

        /// Records per page
        #[arg(long)]
        rows: Option<u32>,

        /// Attempts per page
        #[arg(long)]
        retries: Option<u32>,

        /// Directory for the output file
        #[arg(long, default_value = ".")]
        out_dir: PathBuf,

        /// ASP.NETSessionId cookie (prompted for if absent)
        #[arg(long, env = "CAMPUSCARD_SESSION_ID", hide_env_values = true)]
        session_id: Option<String>,

        /// hallticket cookie (prompted for if absent)
        #[arg(long, env = "CAMPUSCARD_HALLTICKET", hide_env_values = true)]
        hall_ticket: Option<String>,
    },

    /// Summarize a fetched JSON file (default: newest card_transactions_*.json here)
    Analyze {
        path: Option<PathBuf>,

        /// Output directory for report files
        #[arg(short, long)]
        output: Option<PathBuf>,

        /// Merchants listed in the summary
        #[arg(long)]
        top: Option<usize>,

        /// Only count charges, shown as positive amounts
        #[arg(long)]
        spending_only: bool,

        /// Ignore records before this date (YYYY-MM-DD)
        #[arg(long, value_parser = parse_date)]
        since: Option<NaiveDate>,

        /// Ignore records after this date (YYYY-MM-DD)
        #[arg(long, value_parser = parse_date)]
        until: Option<NaiveDate>,

        /// Print the summary only; write no report files
        #[arg(long)]
        no_files: bool,
    },

    /// Manage ~/.campuscard/config.toml
    Config {
        #[command(subcommand)]
        command: ConfigCommand,
    },
}

#[derive(Subcommand, Debug)]
enum ConfigCommand {
    /// Write a default config if none exists
    Init,
    /// Print the effective config
    Show,
}

fn parse_date(s: &str) -> Result<NaiveDate, String> {
    time::parse_cli_date(s).map_err(|e| e.to_string())
}

fn init_tracing(verbose: bool) {
    let default = if verbose {
        "warn,campuscard=debug,campuscard_core=debug,campuscard_fetch=debug,campuscard_analyze=debug"
    } else {
        "warn,campuscard=info,campuscard_core=info,campuscard_fetch=info,campuscard_analyze=info"
    };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .init();
}

#[tokio::main(flavor = "current_thread")]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    match cli.command {
        Command::Fetch {
            account,
            start_date,
            end_date,
            delay,
            rows,
            retries,
            out_dir,
            session_id,
            hall_ticket,
        } => {
            let cfg = config::load_config()?;
            let range = QueryRange::resolve(start_date, end_date, time::portal_today())?;

            let delay_secs = delay.unwrap_or(cfg.portal.delay_secs);
            let opts = FetchOptions {
                rows: rows.unwrap_or(cfg.portal.rows),
                delay: Duration::try_from_secs_f64(delay_secs)
                    .map_err(|_| anyhow::anyhow!("invalid delay: {delay_secs}"))?,
                max_retries: retries.unwrap_or(cfg.portal.max_retries),
            };

            tracing::debug!(?range, ?opts, base_url = %cfg.portal.base_url, "fetch settings");

            let session_id = prompt::value_or_prompt(session_id, "Please enter your ASP.NETSessionId")?;
            let hall_ticket = prompt::value_or_prompt(hall_ticket, "Please enter your hallticket")?;
            let credentials = Credentials::new(&account, &session_id, &hall_ticket)?;

            println!("\nFetching transactions from {} to {}", range.sdate(), range.edate());
            println!("Using account: {}", credentials.account);
            println!("Using {:.1}s delay between requests...", opts.delay.as_secs_f64());

            let client = PortalClient::new(
                &cfg.portal.base_url,
                credentials.clone(),
                Duration::from_secs(cfg.portal.timeout_secs),
            )?;
            let (path, outcome) =
                fetch_to_file(&client, &credentials.account, range, opts, &out_dir).await?;

            println!("\nTransactions saved to {}", path.display());
            println!(
                "Total transactions fetched: {} (portal reported {}, {} pages)",
                outcome.transactions.len(),
                outcome.reported_total,
                outcome.pages
            );
        }

        Command::Analyze {
            path,
            output,
            top,
            spending_only,
            since,
            until,
            no_files,
        } => {
            let cfg = config::load_config()?;
            let input = match path {
                Some(p) => {
                    println!("Using specified file: {}", p.display());
                    p
                }
                None => {
                    let Some(p) = latest_batch_file(".")? else {
                        bail!("no card_transactions_*.json found in the current directory; pass a file path");
                    };
                    println!("Using most recent file: {}", p.display());
                    p
                }
            };

            let opts = AnalyzeOptions {
                spending_only,
                since,
                until,
            };
            let analysis = analyze_file(&input, &opts)
                .with_context(|| format!("analyzing {}", input.display()))?;

            let top = top.unwrap_or(cfg.analyze.top);
            let summary = render_summary(&analysis, top);

            if !no_files {
                let dir = output.unwrap_or_else(|| PathBuf::from(&cfg.analyze.output_dir));
                let files = write_report(&dir, &analysis, top)?;
                println!("\nAnalysis complete! Results saved in '{}' directory", files.dir.display());
            }
            println!("\nSummary:");
            println!("{summary}");
        }

        Command::Config { command } => match command {
            ConfigCommand::Init => config::init_config()?,
            ConfigCommand::Show => {
                let cfg = config::load_config()?;
                println!("# {}", config::config_path()?.display());
                print!("{}", config::render_config(&cfg)?);
            }
        },
    }

    Ok(())
}
