mod scrape;

use clap::{Parser, Subcommand};
use tracing_subscriber::EnvFilter;

#[derive(Debug, Parser)]
#[command(name = "vinpris-cli")]
#[command(about = "vinpris command line interface")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Debug, Subcommand)]
enum Commands {
    /// Run a full scrape pass: fetch every feed page, upsert records with
    /// derived prices, then archive records the feed stopped returning
    Scrape {
        /// First feed page to request
        #[arg(long, default_value_t = 0)]
        start_page: u32,

        /// Continue a crashed pass: keep the refreshed flags from the
        /// previous attempt and skip records already upserted
        #[arg(long)]
        resume: bool,

        /// Preview what a pass would do without fetching or writing
        #[arg(long)]
        dry_run: bool,
    },
    /// Archive stale records without running a pass
    Reconcile,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();
    let config = vinpris_core::load_app_config()?;
    let env_filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(config.log_level.clone()))?;
    tracing_subscriber::fmt().with_env_filter(env_filter).init();

    let cli = Cli::parse();

    match cli.command {
        Commands::Scrape {
            start_page,
            resume,
            dry_run,
        } => {
            if dry_run {
                scrape::print_dry_run(&config, start_page, resume);
                return Ok(());
            }

            let pool_config = vinpris_db::PoolConfig::from_app_config(&config);
            let pool = vinpris_db::connect_pool(&config.database_url, pool_config).await?;
            vinpris_db::run_migrations(&pool).await?;

            scrape::run_scrape(
                &pool,
                &config,
                scrape::ScrapeOptions { start_page, resume },
            )
            .await
        }
        Commands::Reconcile => {
            let pool_config = vinpris_db::PoolConfig::from_app_config(&config);
            let pool = vinpris_db::connect_pool(&config.database_url, pool_config).await?;
            vinpris_db::run_migrations(&pool).await?;

            scrape::run_reconcile(&pool, &config).await
        }
    }
}
