use anyhow::{Context, Result};
use clap::{Args, Parser, Subcommand};
use colored::Colorize;
use std::path::{Path, PathBuf};
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

use sourcegen_catalog::{BigQueryAdapter, SnapshotProvider};
use sourcegen_cli::{reconcile, ReconcileOutcome, ReconcileRequest, ReconcileSummary};
use sourcegen_core::Config;
use sourcegen_dbt::YamlStore;

const DEFAULT_CONFIG: &str = "sourcegen.toml";

/// sourcegen - Create or update dbt source YAML from BigQuery
#[derive(Parser)]
#[command(name = "sourcegen")]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// Path to config file (default: sourcegen.toml)
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    /// Enable verbose output
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Create or update source YAML (auto-detects if file exists)
    Apply(ApplyArgs),
}

#[derive(Args, Debug)]
struct ApplyArgs {
    /// Google Cloud project ID (falls back to [warehouse].project_id)
    #[arg(long)]
    project_id: Option<String>,

    /// BigQuery dataset name
    #[arg(long, visible_alias = "schema")]
    dataset: String,

    /// Output YAML file path
    #[arg(short, long)]
    output: PathBuf,

    /// Table name pattern (e.g., 'stg_*')
    #[arg(long)]
    table_pattern: Option<String>,

    /// Exclude tables containing this string
    #[arg(long)]
    exclude: Option<String>,

    /// Sync column information
    #[arg(long)]
    sync_columns: bool,

    /// Remove tables/columns not in BigQuery
    #[arg(long)]
    remove_deleted: bool,

    /// Name of the dbt source to create or update
    #[arg(long)]
    source_name: Option<String>,

    /// Service account key file (ADC when omitted)
    #[arg(long)]
    credentials: Option<PathBuf>,

    /// Print the resulting YAML instead of writing it
    #[arg(long)]
    dry_run: bool,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    // A missing .env is fine
    let _ = dotenvy::dotenv();

    init_tracing(cli.verbose);

    let config = load_config(cli.config.as_deref())?;

    match cli.command {
        Commands::Apply(args) => apply_command(&config, args).await,
    }
}

fn init_tracing(verbose: bool) {
    let default_level = if verbose { "debug" } else { "info" };
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));

    tracing_subscriber::registry()
        .with(fmt::layer().with_writer(std::io::stderr))
        .with(filter)
        .init();
}

fn load_config(path: Option<&Path>) -> Result<Config> {
    if let Some(path) = path {
        return Config::from_file(path)
            .with_context(|| format!("Failed to load config {}", path.display()));
    }

    let default_path = Path::new(DEFAULT_CONFIG);
    if default_path.exists() {
        Config::from_file(default_path)
            .with_context(|| format!("Failed to load config {}", DEFAULT_CONFIG))
    } else {
        tracing::debug!("No config file found, using defaults");
        Ok(Config::default())
    }
}

/// Apply command - create or update the source file for one dataset
async fn apply_command(config: &Config, args: ApplyArgs) -> Result<()> {
    let project_id = args
        .project_id
        .or_else(|| config.project_id().map(str::to_string))
        .ok_or_else(|| {
            anyhow::anyhow!(
                "No project id given. Pass --project-id or set [warehouse].project_id in {}",
                DEFAULT_CONFIG
            )
        })?;

    let credentials = args.credentials.or_else(|| config.credentials());
    let adapter = match &credentials {
        Some(key_path) => {
            tracing::debug!("Authenticating with service account key {}", key_path.display());
            BigQueryAdapter::from_service_account_file(&project_id, key_path).await?
        }
        None => {
            tracing::debug!("Authenticating with Application Default Credentials");
            BigQueryAdapter::with_adc(&project_id).await?
        }
    };

    tracing::debug!("Testing warehouse connection...");
    adapter
        .test_connection()
        .await
        .map_err(|e| anyhow::anyhow!("Failed to connect to warehouse: {}", e))?;

    let mut request = ReconcileRequest::new(project_id, args.dataset, args.output)
        .with_sync_columns(args.sync_columns)
        .with_prune_absent(args.remove_deleted)
        .with_dry_run(args.dry_run);
    request.table_pattern = args.table_pattern;
    request.exclude = args.exclude;
    request.source_name = args.source_name;

    let store = YamlStore::new(config.format.clone());
    let outcome = reconcile(&adapter, &store, &request).await?;

    print_summary(&outcome);
    Ok(())
}

fn print_summary(outcome: &ReconcileOutcome) {
    let (action, summary) = match outcome {
        ReconcileOutcome::Created(summary) => ("Created", summary),
        ReconcileOutcome::Updated(summary) => ("Updated", summary),
        ReconcileOutcome::NothingToDo { dataset } => {
            println!("{} No tables found in {}, nothing written", "⚠".yellow(), dataset);
            return;
        }
    };

    if let Some(yaml) = &summary.rendered {
        print!("{}", yaml);
        println!();
        println!("{} {} (dry run, not written)", action.cyan().bold(), summary.output.display());
    } else {
        println!("{} {} {}", "✓".green(), action.green().bold(), summary.output.display());
    }

    print_changes(summary);
}

fn print_changes(summary: &ReconcileSummary) {
    let changes = &summary.changes;

    println!("  Source:          {}", summary.source_name.bold());
    println!("  Tables fetched:  {}", summary.remote_tables);

    if changes.is_empty() {
        println!("  {}", "No table or column changes".green());
    } else {
        println!("  Tables added:    {}", format!("{}", changes.added_tables.len()).green());
        println!("  Tables removed:  {}", format!("{}", changes.removed_tables.len()).red());
        println!("  Columns added:   {}", format!("{}", changes.added_column_count()).green());
        println!("  Columns removed: {}", format!("{}", changes.removed_column_count()).red());
        println!("  Type changes:    {}", format!("{}", changes.type_change_count()).yellow());

        for table in &changes.table_changes {
            for change in &table.type_changes {
                println!(
                    "    {}.{}: {} -> {}",
                    table.table,
                    change.column,
                    change.before.as_deref().unwrap_or("?"),
                    change.after.as_deref().unwrap_or("?")
                );
            }
        }
    }

    for name in &summary.ambiguous_sources {
        println!(
            "  {} source '{}' also matches this dataset and was left unchanged",
            "⚠".yellow(),
            name
        );
    }
}
