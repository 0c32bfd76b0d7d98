//! reelcache - an offline-first command line browser for movie catalogs.
//!
//! Listings and details are served from the local store when available and
//! refreshed in the background, so repeated commands work without a network.

use std::io;
use std::sync::Arc;
use std::time::Duration;

use anyhow::{Context, Result};
use chrono::Utc;
use clap::{Parser, Subcommand};
use tracing::info;
use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

use reelcache_core::assets::AssetCacheOptions;
use reelcache_core::utils::{format_age, format_rating, format_release, truncate_string};
use reelcache_core::{ApiClient, AssetCache, CatalogRecord, Category, Config, LocalStore, RecordId, SyncOrchestrator};

// ============================================================================
// Constants
// ============================================================================

/// How long to keep the runtime alive for detached refreshes to land.
const BACKGROUND_SETTLE_MS: u64 = 1500;

/// Width of the title column in listings
const TITLE_WIDTH: usize = 40;

#[derive(Parser)]
#[command(name = "reelcache")]
#[command(version)]
#[command(about = "Offline-first command line browser for movie catalogs")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// List one page of a category (now_playing, popular, top_rated, upcoming)
    List {
        category: Category,

        #[arg(default_value_t = 1)]
        page: u32,
    },

    /// Show a single record
    Detail { id: RecordId },

    /// Records similar to another one
    Related { id: RecordId, page: Option<u32> },

    /// Cast and crew
    Credits { id: RecordId },

    /// Where to stream, rent or buy in the configured region
    Providers { id: RecordId },

    /// Toggle the favorite mark
    Favorite { id: RecordId },

    /// List favorites
    Favorites,

    /// Empty the image cache
    ClearImages,

    /// Save settings to the config file
    Configure {
        #[arg(long)]
        api_key: Option<String>,

        #[arg(long)]
        access_token: Option<String>,

        /// Two-letter region code for watch providers
        #[arg(long)]
        region: Option<String>,

        #[arg(long)]
        language: Option<String>,
    },
}

/// Initialize the tracing subscriber for logging
fn init_tracing() -> WorkerGuard {
    // Use RUST_LOG env var to control log level (e.g., RUST_LOG=debug)
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"));
    let (writer, guard) = tracing_appender::non_blocking(io::stderr());

    tracing_subscriber::registry()
        .with(fmt::layer().with_writer(writer))
        .with(filter)
        .init();
    guard
}

/// Everything a command needs, assembled from configuration.
struct Services {
    sync: SyncOrchestrator,
    assets: AssetCache,
}

impl Services {
    fn build(config: &Config) -> Result<Self> {
        let api = ApiClient::new(config).context("Failed to create API client")?;
        let store = Arc::new(
            LocalStore::open(config.catalog_dir()?).context("Failed to open catalog store")?,
        );
        let assets = AssetCache::new(
            config.images_dir()?,
            Arc::new(api.clone()),
            AssetCacheOptions::from(config),
        )
        .context("Failed to open image cache")?;

        let sync = SyncOrchestrator::new(Arc::new(api), store)
            .with_assets(assets.clone())
            .with_region(config.region());

        Ok(Self { sync, assets })
    }

    fn store(&self) -> &LocalStore {
        self.sync.store()
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    // Load .env file if present (silently ignore if not found)
    let _ = dotenvy::dotenv();
    let _log_guard = init_tracing();
    let cli = Cli::parse();

    let result = run(cli.command).await;
    if let Err(ref e) = result {
        let retryable = e
            .downcast_ref::<reelcache_core::Error>()
            .is_some_and(|e| e.is_retryable());
        if retryable {
            eprintln!("The catalog service is unreachable or busy; try again shortly.");
        }
    }
    result
}

async fn run(command: Commands) -> Result<()> {
    if let Commands::Configure { api_key, access_token, region, language } = command {
        return configure(api_key, access_token, region, language);
    }

    let config = Config::load().context("Failed to load config")?;
    if config.api_key.is_none() && config.access_token.is_none() {
        eprintln!("Warning: no REELCACHE_API_KEY or REELCACHE_ACCESS_TOKEN set; only cached data is available");
    }
    let services = Services::build(&config)?;
    info!("reelcache starting");

    match command {
        Commands::List { category, page } => {
            list(&services, category, page).await?;
            settle().await;
        }
        Commands::Detail { id } => {
            let record = services.sync.fetch_detail(id).await?;
            print_detail(&record);
            settle().await;
        }
        Commands::Related { id, page } => {
            let records = services.sync.fetch_related(id, page).await?;
            print_records(&records);
        }
        Commands::Credits { id } => {
            let credits = services.sync.fetch_credits(id).await?;
            for director in credits.directors() {
                println!("Director: {}", director.name);
            }
            for member in credits.top_billed(10) {
                println!("{:<30} {}", member.name, member.character.as_deref().unwrap_or(""));
            }
        }
        Commands::Providers { id } => match services.sync.fetch_providers(id).await? {
            Some(providers) if !providers.is_empty() => {
                for (kind, list) in [("stream", &providers.flatrate), ("rent", &providers.rent), ("buy", &providers.buy)] {
                    for provider in list {
                        println!("{:<8} {}", kind, provider.provider_name);
                    }
                }
            }
            _ => println!("No providers in {}", config.region()),
        },
        Commands::Favorite { id } => {
            services.sync.toggle_favorite(id).await?;
            let state = if services.sync.is_favorite(id).await { "marked" } else { "not marked" };
            println!("{} is {} as favorite", id, state);
        }
        Commands::Favorites => print_records(&services.store().favorites().await),
        Commands::ClearImages => {
            services.assets.clear();
            println!("Image cache cleared");
        }
        Commands::Configure { .. } => {}
    }

    Ok(())
}

/// Update the saved config file. Environment overrides are not written back.
fn configure(
    api_key: Option<String>,
    access_token: Option<String>,
    region: Option<String>,
    language: Option<String>,
) -> Result<()> {
    let mut config = Config::load_saved().context("Failed to load config")?;
    if let Some(key) = api_key {
        config.api_key = Some(key);
    }
    if let Some(token) = access_token {
        config.access_token = Some(token);
    }
    if let Some(region) = region {
        config.region = Some(region.to_ascii_uppercase());
    }
    if let Some(language) = language {
        config.language = language;
    }
    config.save().context("Failed to save config")?;
    println!("Config saved (region {}, language {})", config.region(), config.language);
    Ok(())
}

async fn list(services: &Services, category: Category, page: u32) -> Result<()> {
    let records = services.sync.fetch_page(page, category).await?;
    let age = services
        .store()
        .category_refreshed_at(category)
        .await
        .map(|at| format_age(at, Utc::now()))
        .unwrap_or_else(|| "never".to_string());
    println!("{} - page {} (cached {})", category.title(), page, age);
    print_records(&records);
    Ok(())
}

/// Give detached refresh and prefetch tasks a chance to finish.
async fn settle() {
    tokio::time::sleep(Duration::from_millis(BACKGROUND_SETTLE_MS)).await;
}

fn print_records(records: &[CatalogRecord]) {
    for record in records {
        println!(
            "{:>8} {} {:<width$} {:<14} {}",
            record.id,
            if record.is_favorite { '*' } else { ' ' },
            truncate_string(&record.title, TITLE_WIDTH),
            format_release(record),
            format_rating(record),
            width = TITLE_WIDTH,
        );
    }
}

fn print_detail(record: &CatalogRecord) {
    let year = record.release_year().map(|y| format!(" ({})", y)).unwrap_or_default();
    println!("{}{}{}", record.title, year, if record.is_favorite { " *" } else { "" });
    println!("Released: {}", format_release(record));
    println!("Rating:   {}", format_rating(record));
    if let Some(ref overview) = record.overview {
        println!();
        println!("{}", overview);
    }
}

#[cfg(test)]
mod tests {
    use clap::CommandFactory;

    use super::*;

    #[test]
    fn test_cli_definition_is_valid() {
        Cli::command().debug_assert();
    }

    #[test]
    fn test_list_parses_category_and_defaults_page() {
        let cli = Cli::try_parse_from(["reelcache", "list", "top-rated"]).unwrap();
        assert!(matches!(
            cli.command,
            Commands::List { category: Category::TopRated, page: 1 }
        ));
    }

    #[test]
    fn test_related_page_is_optional() {
        let cli = Cli::try_parse_from(["reelcache", "related", "550"]).unwrap();
        assert!(matches!(cli.command, Commands::Related { id: 550, page: None }));

        let cli = Cli::try_parse_from(["reelcache", "related", "550", "3"]).unwrap();
        assert!(matches!(cli.command, Commands::Related { id: 550, page: Some(3) }));
    }

    #[test]
    fn test_bad_arguments_are_rejected() {
        assert!(Cli::try_parse_from(["reelcache", "list", "trending"]).is_err());
        assert!(Cli::try_parse_from(["reelcache", "detail", "abc"]).is_err());
        assert!(Cli::try_parse_from(["reelcache", "favorite"]).is_err());
    }

    #[test]
    fn test_clear_images_is_kebab_case() {
        let cli = Cli::try_parse_from(["reelcache", "clear-images"]).unwrap();
        assert!(matches!(cli.command, Commands::ClearImages));
    }
}
