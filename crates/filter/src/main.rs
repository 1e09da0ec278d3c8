//! Sieve command-line tool.
//!
//! Applies the filters configured for a resource to a query string (legacy
//! mode) or a JSON context (composable mode) and prints the resulting query.

use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{Context, Result};
use clap::Parser;
use serde_json::Value;
use tracing::{info, warn};
use tracing_subscriber::{EnvFilter, layer::SubscriberExt, util::SubscriberInitExt};

use sieve_filter::config::{Config, Definition};
use sieve_filter::diagnostics::TracingSink;
use sieve_filter::query::DefaultQueryNameGenerator;
use sieve_filter::{ApplyContext, FilterPass, FilterRegistry, RequestParameters};

#[derive(Debug, Parser)]
#[command(name = "sieve", version, about = "Apply request filters to a resource query")]
struct Cli {
    /// Filter definition file (overrides SIEVE_CONFIG).
    #[arg(long)]
    config: Option<PathBuf>,

    /// Root alias of the query (overrides SIEVE_ROOT_ALIAS).
    #[arg(long)]
    alias: Option<String>,

    /// Structured filter context, e.g. '{"age": [30, 31]}'.
    #[arg(long, conflicts_with = "describe")]
    json: Option<String>,

    /// Print the accepted query parameters instead of building a query.
    #[arg(long)]
    describe: bool,

    /// Resource to query.
    resource: String,

    /// URL query string, e.g. 'createdAt[after]=2023-01-01&age[]=30'.
    query: Option<String>,
}

fn main() -> Result<()> {
    // Load .env file if present
    dotenvy::dotenv().ok();

    init_tracing();

    let cli = Cli::parse();

    let mut config = Config::from_env().context("failed to load configuration")?;
    if let Some(path) = cli.config {
        config.definition_path = path;
    }
    if let Some(alias) = cli.alias {
        config.root_alias = alias;
    }

    let definition = Definition::load(&config.definition_path)?;
    let (registry, warnings) = FilterRegistry::from_definition(definition, Arc::new(TracingSink))
        .context("failed to build filter registry")?;
    for warning in &warnings {
        warn!("{warning}");
    }
    info!(
        path = %config.definition_path.display(),
        resource = %cli.resource,
        "filter definition loaded"
    );

    if cli.describe {
        let description = registry.describe(&cli.resource);
        println!("{}", serde_json::to_string_pretty(&description)?);
        return Ok(());
    }

    let mut query = registry
        .query_for(&cli.resource, &config.root_alias)
        .with_context(|| format!("unknown resource \"{}\"", cli.resource))?;
    let mut names = DefaultQueryNameGenerator::new();

    let filters: Option<Value> = cli
        .json
        .as_deref()
        .map(serde_json::from_str::<Value>)
        .transpose()
        .context("--json must be valid JSON")?;
    let request = RequestParameters::parse(cli.query.as_deref().unwrap_or_default());
    let context = ApplyContext {
        filters: filters.as_ref(),
        request: Some(&request),
    };

    let mut pass = FilterPass::new(&mut query, &mut names, &cli.resource);
    registry.apply(&mut pass, &context);

    println!("DQL:        {}", query.to_dql());
    println!("SQL:        {}", query.to_sql()?);
    println!(
        "Parameters: {}",
        serde_json::to_string_pretty(query.parameters())?
    );

    Ok(())
}

fn init_tracing() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));

    tracing_subscriber::registry()
        .with(filter)
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();
}
