use clap::{Parser, Subcommand};
use corte_eleitoral::commands::{analyze, invalidate, profile, trending};
use corte_eleitoral::config::Config;
use corte_eleitoral::database::cache::AnalysisCache;
use corte_eleitoral::database::tracking::ViewTracker;
use corte_eleitoral::database::ServiceDatabase;
use corte_eleitoral::server::{start_server, state::AppState};
use corte_eleitoral::service::AnalysisService;
use corte_eleitoral::source::PostgrestSource;
use tracing::info;
use tracing_subscriber::{fmt, EnvFilter};

#[derive(Parser)]
struct Opts {
    /// PostgREST base URL, overrides POSTGREST_URL
    #[clap(long)]
    postgrest_url: Option<String>,
    /// SQLite URL of the cache database, overrides CACHE_DATABASE_URL
    #[clap(long)]
    cache_db: Option<String>,
    #[clap(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Analyze a candidate's cutoff-block history.
    Analyze {
        /// Candidate slug, e.g. "pe-maria-souza"
        slug: String,
        /// Print the raw JSON response
        #[clap(long)]
        json: bool,
        /// Recompute even when a cached analysis exists
        #[clap(long)]
        no_cache: bool,
    },
    /// Show a candidate's elections, vote map and career totals.
    Profile {
        /// Candidate slug, e.g. "pe-maria-souza"
        slug: String,
        /// Print the raw JSON response
        #[clap(long)]
        json: bool,
        /// Recompute even when a cached profile exists
        #[clap(long)]
        no_cache: bool,
    },
    /// Serve the HTTP API.
    Serve,
    /// Remove cached analyses and profiles.
    Invalidate {
        /// Candidate slug to drop
        slug: Option<String>,
        /// Drop every cached entry
        #[clap(long)]
        all: bool,
    },
    /// Show the most viewed candidates of a state.
    Trending {
        /// Two-letter state code
        uf: String,
    },
}

#[tokio::main]
async fn main() {
    fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .with_writer(std::io::stderr)
        .init();

    let opts = Opts::parse();

    if let Err(e) = run(opts).await {
        eprintln!("❌ {}", e);
        std::process::exit(1);
    }
}

async fn run(opts: Opts) -> Result<(), Box<dyn std::error::Error>> {
    let mut config = Config::load()?;
    if let Some(url) = opts.postgrest_url {
        config.postgrest_url = url;
    }
    if let Some(url) = opts.cache_db {
        config.cache_database_url = url;
    }

    let db = ServiceDatabase::new(&config.cache_database_url).await?;
    let source = PostgrestSource::new(&config.postgrest_url, config.http_timeout)?;
    info!(
        postgrest = source.base_url(),
        cache = %config.cache_database_url,
        "service ready"
    );
    let service = AnalysisService::new(
        source,
        AnalysisCache::new(&db, config.cache_max_age()),
        ViewTracker::new(&db),
    );

    match opts.command {
        Command::Analyze {
            slug,
            json,
            no_cache,
        } => analyze(&service, &slug, json, no_cache).await?,
        Command::Profile {
            slug,
            json,
            no_cache,
        } => profile(&service, &slug, json, no_cache).await?,
        Command::Serve => {
            let state = AppState::new(service, config.invalidate_token.clone());
            start_server(config.port, state).await?;
        }
        Command::Invalidate { slug, all } => invalidate(&service, slug.as_deref(), all).await?,
        Command::Trending { uf } => trending(&service, &uf).await?,
    }

    Ok(())
}
