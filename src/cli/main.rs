use anyhow::{Context, Result};
use clap::{Args, Parser, Subcommand};
use std::path::PathBuf;
use tesserae_client::api::SearchApi;
use tesserae_client::models::{
    FrequencySource, PaginationState, Parallel, SearchSelection, SortOrder, StoplistBasis,
    TextReference, UnitType,
};
use tesserae_client::state::{ChannelSink, StateUpdate};
use tesserae_client::transport::HttpTransport;
use tesserae_client::workflow::{PollPolicy, SearchOrchestrator, SearchRequest};
use tesserae_client::Config;
use tokio_util::sync::CancellationToken;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[derive(Parser)]
#[command(name = "tesserae")]
#[command(about = "Tesserae intertext search client", long_about = None, version)]
struct Cli {
    /// API base URL; overrides the configured `api.base_url`
    #[arg(short, long, env = "TESSERAE_ENDPOINT")]
    endpoint: Option<String>,

    /// Configuration file layered over the built-in defaults
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Print machine-readable JSON instead of tables
    #[arg(long, global = true)]
    json: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Run a search and print the first page of results
    Search(SearchArgs),

    /// Fetch a stoplist
    Stoplist {
        #[arg(short, long)]
        feature: Option<String>,

        #[arg(short, long)]
        size: Option<u32>,

        /// Language corpus to compute frequencies from
        #[arg(short, long, conflicts_with = "works")]
        language: Option<String>,

        /// Comma-separated text ids to compute frequencies from
        #[arg(short, long, value_delimiter = ',')]
        works: Vec<String>,
    },

    /// Check the status of a submitted search
    Status {
        #[arg(value_name = "SEARCH_ID")]
        id: String,
    },

    /// Fetch a page of results for a finished search
    Results {
        #[arg(value_name = "SEARCH_ID")]
        id: String,

        #[arg(short, long, default_value = "0")]
        page: u32,

        #[arg(short = 'n', long, default_value = "100")]
        per_page: u32,

        #[arg(short = 'S', long, default_value = "score")]
        sort_by: String,

        #[arg(short, long)]
        ascending: bool,
    },

    /// Print the effective configuration
    Config,
}

#[derive(Args)]
struct SearchArgs {
    /// Object id of the source text
    #[arg(short, long)]
    source: String,

    /// Object id of the target text
    #[arg(short, long)]
    target: String,

    #[arg(short, long)]
    language: Option<String>,

    #[arg(long)]
    feature: Option<String>,

    #[arg(long)]
    stoplist_size: Option<u32>,

    /// `corpus`, or anything else to use the two texts
    #[arg(long)]
    stoplist_basis: Option<StoplistBasis>,

    #[arg(long)]
    frequency_basis: Option<String>,

    #[arg(long)]
    max_distance: Option<i64>,

    #[arg(long)]
    distance_basis: Option<String>,

    #[arg(long)]
    score_basis: Option<String>,

    /// `line` or `phrase`
    #[arg(long)]
    unit: Option<UnitType>,

    /// Stop after this many status checks
    #[arg(long)]
    max_polls: Option<u32>,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    let mut config = match cli.config.as_deref() {
        Some(path) => Config::load_from(Some(path)),
        None => Config::load(),
    }
    .context("loading configuration")?;
    if let Some(endpoint) = cli.endpoint.clone() {
        config.api.base_url = endpoint;
        config.validate()?;
    }

    init_tracing(&config);

    let transport = HttpTransport::new(&config.api)?;

    match cli.command {
        Commands::Search(args) => run_search(&config, transport, args, cli.json).await?,

        Commands::Stoplist {
            feature,
            size,
            language,
            works,
        } => {
            let defaults = &config.search.parameters;
            let basis = if works.is_empty() {
                FrequencySource::Language(language.unwrap_or_else(|| config.search.language.clone()))
            } else {
                FrequencySource::Works(works)
            };

            let stopwords = SearchApi::new(transport)
                .fetch_stoplist(
                    feature.as_deref().unwrap_or(defaults.feature.as_str()),
                    size.unwrap_or(defaults.stoplist_size),
                    &basis,
                )
                .await?
                .value;

            if cli.json {
                println!("{}", serde_json::to_string_pretty(&stopwords)?);
            } else {
                println!("{}", stopwords.join(", "));
            }
        }

        Commands::Status { id } => {
            let report = SearchApi::new(transport).search_status(&id).await?.value;
            if cli.json {
                println!("{}", serde_json::to_string_pretty(&report.response.body)?);
            } else {
                let status = report
                    .status
                    .map(|s| s.to_string())
                    .unwrap_or_else(|| "<missing>".to_string());
                println!("{}: {}", id, status);
                if let Some(progress) = report.progress {
                    println!("progress: {}", progress);
                }
            }
        }

        Commands::Results {
            id,
            page,
            per_page,
            sort_by,
            ascending,
        } => {
            let pagination = PaginationState {
                current_page: page,
                rows_per_page: per_page,
                sort_header: sort_by,
                sort_order: if ascending {
                    SortOrder::Ascending
                } else {
                    SortOrder::Descending
                },
            };

            let results = SearchApi::new(transport)
                .fetch_results(&id, &pagination)
                .await?
                .value;

            if cli.json {
                println!("{}", serde_json::to_string_pretty(&results)?);
            } else {
                print_parallels(&results.parallels);
                println!(
                    "page {} of {} ({} parallels)",
                    pagination.current_page + 1,
                    pagination.page_count(results.total_count).max(1),
                    results.total_count
                );
            }
        }

        Commands::Config => {
            if cli.json {
                println!("{}", serde_json::to_string_pretty(&config)?);
            } else {
                println!("{}", toml::to_string_pretty(&config)?);
            }
        }
    }

    Ok(())
}

fn init_tracing(config: &Config) {
    let json = config.observability.json_logs;

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| config.observability.log_level.as_str().into()),
        )
        .with(json.then(|| {
            tracing_subscriber::fmt::layer()
                .json()
                .with_writer(std::io::stderr)
        }))
        .with((!json).then(|| tracing_subscriber::fmt::layer().with_writer(std::io::stderr)))
        .init();
}

async fn run_search(
    config: &Config,
    transport: HttpTransport,
    args: SearchArgs,
    json: bool,
) -> Result<()> {
    let mut params = config.search.parameters.clone();
    if let Some(feature) = args.feature {
        params.feature = feature;
    }
    if let Some(size) = args.stoplist_size {
        params.stoplist_size = size;
    }
    if let Some(basis) = args.stoplist_basis {
        params.stoplist_basis = basis;
    }
    if let Some(basis) = args.frequency_basis {
        params.frequency_basis = basis;
    }
    if let Some(distance) = args.max_distance {
        params.max_distance = distance;
    }
    if let Some(basis) = args.distance_basis {
        params.distance_basis = basis;
    }
    if let Some(basis) = args.score_basis {
        params.score_basis = basis;
    }
    if let Some(unit) = args.unit {
        params.unit_type = unit;
    }

    let selection = SearchSelection::new(
        TextReference::new(args.source),
        TextReference::new(args.target),
    );
    let language = args
        .language
        .unwrap_or_else(|| config.search.language.clone());
    let request = SearchRequest::new(language, &selection, params)?;

    let mut policy = PollPolicy::from(&config.polling);
    if let Some(max_polls) = args.max_polls {
        policy = policy.with_max_polls(max_polls);
    }

    let (sink, mut updates) = ChannelSink::new();
    let reporter = tokio::spawn(async move {
        let mut page = None;
        while let Some(update) = updates.recv().await {
            match update {
                StateUpdate::Stopwords(words) => {
                    tracing::info!(count = words.len(), "Stoplist resolved");
                }
                StateUpdate::SearchId(id) => {
                    tracing::info!(search_id = %id, "Search accepted");
                }
                StateUpdate::SearchStatus { status, progress } => {
                    tracing::info!(status = %status, progress = ?progress, "Search status");
                }
                StateUpdate::Results {
                    parallels,
                    total_count,
                } => page = Some((parallels, total_count)),
                StateUpdate::SearchInProgress(_) | StateUpdate::ChangingPage(_) => {}
            }
        }
        page
    });

    let cancel = CancellationToken::new();
    let watcher = {
        let cancel = cancel.clone();
        tokio::spawn(async move {
            tokio::select! {
                _ = tokio::signal::ctrl_c() => {
                    tracing::info!("Interrupt received, cancelling search");
                    cancel.cancel();
                }
                _ = cancel.cancelled() => {}
            }
        })
    };

    let orchestrator = SearchOrchestrator::new(transport, sink, policy);
    let result = orchestrator.run_search(&request, &cancel).await;
    cancel.cancel();
    let _ = watcher.await;

    // Closes the update channel so the reporter finishes
    drop(orchestrator);
    let page = reporter.await.context("update reporter panicked")?;

    let outcome = result?;
    let (parallels, total_count) = page.unwrap_or_default();

    if json {
        println!(
            "{}",
            serde_json::to_string_pretty(&serde_json::json!({
                "outcome": outcome,
                "total_count": total_count,
                "parallels": parallels,
            }))?
        );
    } else {
        print_parallels(&parallels);
        println!(
            "search {} finished after {} status checks: {} parallels",
            outcome.search_id, outcome.polls, total_count
        );
    }

    Ok(())
}

fn print_parallels(parallels: &[Parallel]) {
    for parallel in parallels {
        println!(
            "{:>3}  {} | {}  [{}]",
            parallel.score,
            parallel.source_tag,
            parallel.target_tag,
            parallel.matched_features.join(", ")
        );
        println!("       {}", parallel.source_snippet);
        println!("       {}", parallel.target_snippet);
        for other in &parallel.multiresults {
            println!(
                "       {:>3}  {}  {}",
                other.display_score(),
                other.tag,
                other.snippet
            );
        }
    }
}
