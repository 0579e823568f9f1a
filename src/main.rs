//! perf-report CLI - Performance report tables from the command line
//!
//! Loads report templates from a dashboard server or a JSON fixture and
//! prints each finished table.

use anyhow::{Context, Result};
use clap::{Args, Parser, Subcommand};
use std::path::PathBuf;
use std::sync::Arc;
use tracing::{debug, info, warn};

use perf_report::{
    http::HttpReportSource,
    orchestrator::{LoadOutcome, ReportStore},
    source::{FixtureReportSource, ReportSource},
};
use perf_report_core::{
    encode_route, render_markdown, restore_state, route_params, Action, MilestoneTable,
    ReportSectionState, Revision, RouteOptions, UnitRegistry, DEFAULT_NAME,
};

/// perf-report: Revision-to-revision performance report tables
#[derive(Parser, Debug)]
#[command(name = "perf-report")]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// Enable verbose output
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Load reports and print their tables
    Show(ShowArgs),

    /// Print the route query string for a selection
    Route(RouteArgs),

    /// Resolve a unit name and print its descriptor
    Unit(UnitArgs),
}

/// Which reports over which revisions
#[derive(Args, Debug)]
struct SelectionArgs {
    /// Report template name (repeatable)
    #[arg(short, long = "report", value_name = "NAME")]
    reports: Vec<String>,

    /// Baseline revision (integer or "latest")
    #[arg(long)]
    min_rev: Option<Revision>,

    /// Target revision (integer or "latest")
    #[arg(long)]
    max_rev: Option<Revision>,

    /// Milestone selecting the revision range when revisions are omitted
    #[arg(short, long)]
    milestone: Option<u32>,

    /// Route query string (e.g. "report=Speed&minRev=100&maxRev=200"); overrides the other options
    #[arg(long, conflicts_with_all = ["reports", "min_rev", "max_rev", "milestone"])]
    query: Option<String>,
}

impl SelectionArgs {
    fn route_options(&self, milestones: &MilestoneTable) -> RouteOptions {
        let query = match self.query {
            Some(ref query) => query.clone(),
            None => {
                let reports: Vec<&str> = self.reports.iter().map(String::as_str).collect();
                let mut query = encode_route(&reports, self.min_rev, self.max_rev);
                if let Some(milestone) = self.milestone {
                    if !query.is_empty() {
                        query.push('&');
                    }
                    query.push_str(&format!("m={}", milestone));
                }
                query
            }
        };
        debug!("Route query: {}", query);

        let mut options = RouteOptions::from_query(&query, milestones);
        if options.sources.is_empty() {
            options.sources.push(DEFAULT_NAME.to_string());
        }
        options
    }
}

#[derive(Parser, Debug)]
struct ShowArgs {
    /// Dashboard server base URL
    #[arg(long, env = "PERF_REPORT_URL")]
    url: Option<String>,

    /// JSON fixture with templates and reports, instead of a server
    #[arg(long, value_name = "FILE")]
    fixture: Option<PathBuf>,

    /// Owner for newly created templates
    #[arg(long, env = "PERF_REPORT_USER_EMAIL")]
    user_email: Option<String>,

    /// Output format (markdown, json)
    #[arg(long, default_value = "markdown")]
    format: String,

    #[command(flatten)]
    selection: SelectionArgs,
}

#[derive(Parser, Debug)]
struct RouteArgs {
    #[command(flatten)]
    selection: SelectionArgs,
}

#[derive(Parser, Debug)]
struct UnitArgs {
    /// Unit name as found in report rows
    name: String,

    /// Legacy unit name to consult when the name is not registered
    #[arg(long)]
    legacy: Option<String>,

    /// Improvement direction hint: 0 bigger is better, 1 smaller is better, 4 unknown
    #[arg(long, default_value = "4")]
    direction: i64,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    // Initialize logging
    let log_level = if cli.verbose { "debug" } else { "info" };
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(log_level)),
        )
        .with_writer(std::io::stderr)
        .init();

    match cli.command {
        Commands::Show(args) => show_command(args).await,
        Commands::Route(args) => route_command(args),
        Commands::Unit(args) => unit_command(args),
    }
}

/// Load the selected reports once and print them
async fn show_command(args: ShowArgs) -> Result<()> {
    let (source, origin): (Arc<dyn ReportSource>, String) = match (&args.fixture, &args.url) {
        (Some(path), _) => {
            info!("Loading reports from fixture {:?}", path);
            let source: Arc<dyn ReportSource> = Arc::new(
                FixtureReportSource::from_file(path)
                    .with_context(|| format!("Failed to load fixture: {:?}", path))?,
            );
            (source, String::new())
        }
        (None, Some(url)) => {
            info!("Loading reports from {}", url);
            let source: Arc<dyn ReportSource> = Arc::new(
                HttpReportSource::new(url)
                    .with_context(|| format!("Invalid report server URL: {}", url))?,
            );
            (source, url.trim_end_matches('/').to_string())
        }
        (None, None) => anyhow::bail!("Either --url or --fixture is required"),
    };

    let store = ReportStore::new(source)
        .with_origin(origin)
        .with_user_email(args.user_email.clone());

    let options = args.selection.route_options(store.milestones());
    store.dispatch(Action::RestoreState(options));

    let outcome = store
        .load_reports()
        .await
        .with_context(|| "Failed to load reports")?;

    match outcome {
        LoadOutcome::Skipped => {
            warn!("No revision range selected; pass --min-rev/--max-rev or --milestone");
            return Ok(());
        }
        LoadOutcome::Stale => warn!("Selection changed while loading"),
        LoadOutcome::Completed { errors } => {
            for error in errors {
                warn!("{}", error);
            }
        }
    }

    let state = store.snapshot();
    match args.format.as_str() {
        "json" => {
            println!("{}", serde_json::to_string_pretty(&state.tables)?);
        }
        "markdown" | _ => {
            for table in state.tables.iter().filter(|t| !t.is_placeholder()) {
                println!("{}", render_markdown(table));
            }
            for table in state.tables.iter().filter(|t| t.is_placeholder()) {
                println!("_{}: no data_\n", table.name);
            }
        }
    }

    Ok(())
}

/// Print the route for a selection after normalization
fn route_command(args: RouteArgs) -> Result<()> {
    let milestones = MilestoneTable::chromium();
    let options = args.selection.route_options(&milestones);
    let state = restore_state(&ReportSectionState::default(), &options, &milestones);

    println!("{}", route_params(&state));
    if let Some(milestone) = state.milestone {
        debug!("Milestone: M{}", milestone);
    }

    Ok(())
}

/// Resolve a unit name
fn unit_command(args: UnitArgs) -> Result<()> {
    let units = UnitRegistry::standard();
    let resolved = units.resolve(&args.name, args.legacy.as_deref(), args.direction);

    if units.get(&args.name).is_none() {
        debug!("'{}' is not a registered unit", args.name);
    }

    println!("{}", serde_json::to_string_pretty(&resolved.unit)?);
    println!("conversion factor: {}", resolved.conversion_factor);
    if let Some(prefix) = resolved.prefix {
        println!("display prefix: {}", prefix.symbol());
    }

    Ok(())
}
