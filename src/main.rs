//! CLI entry point for owm-contract. Runs the fixture catalog against the
//! OpenWeatherMap API and reports a verdict per fixture.
//!
//! Exit codes:
//! - 0: every selected fixture passed
//! - 1: at least one fixture failed or aborted, or setup failed
//! - 2: argument validation error (clap handles this automatically)

use std::process::ExitCode;
use std::time::Duration;

use clap::Parser;
use tracing_subscriber::EnvFilter;

use owm_contract::catalog::{Catalog, FixtureGroup};
use owm_contract::config::{ContractConfig, DEFAULT_BASE_URL};
use owm_contract::executor::RequestExecutor;
use owm_contract::runner::{DEFAULT_CONCURRENCY, run_fixtures};

#[derive(Parser)]
#[command(version, about, long_about = None)]
struct Cli {
    /// Base URL of the upstream API.
    #[arg(long, env = "OWM_BASE_URL", default_value = DEFAULT_BASE_URL)]
    base_url: String,

    /// API key injected as `appid`. Prefer the APIKEY environment variable
    /// to keep the key out of process listings and shell history.
    #[arg(long, env = "APIKEY", hide_env_values = true)]
    api_key: Option<String>,

    /// Only run fixtures of this group (repeatable).
    #[arg(long = "group", value_name = "GROUP")]
    groups: Vec<FixtureGroup>,

    /// Only run the fixture with this identifier (repeatable).
    #[arg(long = "fixture", value_name = "ID")]
    fixtures: Vec<String>,

    /// Maximum number of requests in flight.
    #[arg(long, default_value_t = DEFAULT_CONCURRENCY)]
    concurrency: usize,

    /// Per-request timeout in seconds.
    #[arg(long, default_value_t = 30)]
    timeout_secs: u64,

    /// Print the run summary as JSON instead of text.
    #[arg(long)]
    json: bool,

    /// List the selected fixtures and exit without sending requests.
    #[arg(long)]
    list: bool,
}

#[tokio::main]
async fn main() -> ExitCode {
    let args = Cli::parse();

    let _ = tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .with_writer(std::io::stderr)
        .try_init();

    let catalog = Catalog::standard();
    let selected = catalog.select(&args.groups, &args.fixtures);

    // An explicit --fixture that matches nothing is almost certainly a typo.
    if let Some(missing) = args.fixtures.iter().find(|id| catalog.get(id).is_none()) {
        eprintln!("Error: unknown fixture id {missing:?}");
        return ExitCode::FAILURE;
    }

    if args.list {
        for fixture in &selected {
            println!("{:<40} {:<20} {}", fixture.id, fixture.group, fixture.expected);
        }
        return ExitCode::SUCCESS;
    }

    let config = match build_config(&args) {
        Ok(config) => config,
        Err(e) => {
            eprintln!("Error: {e}");
            return ExitCode::FAILURE;
        }
    };
    let executor = match RequestExecutor::new(config) {
        Ok(executor) => executor,
        Err(e) => {
            eprintln!("Error: {e}");
            return ExitCode::FAILURE;
        }
    };

    let summary = run_fixtures(&executor, &selected, args.concurrency).await;

    if args.json {
        match serde_json::to_string_pretty(&summary) {
            Ok(json) => println!("{json}"),
            Err(e) => {
                eprintln!("Error: could not render summary: {e}");
                return ExitCode::FAILURE;
            }
        }
    } else {
        println!("{summary}");
    }

    if summary.all_passed() {
        ExitCode::SUCCESS
    } else {
        ExitCode::FAILURE
    }
}

fn build_config(args: &Cli) -> owm_contract::error::Result<ContractConfig> {
    let mut config = ContractConfig::new(&args.base_url)?
        .with_timeout(Duration::from_secs(args.timeout_secs))?;
    if let Some(key) = args.api_key.as_deref().filter(|k| !k.is_empty()) {
        config = config.with_api_key(key);
    }
    Ok(config)
}
