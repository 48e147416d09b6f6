use std::sync::Arc;
use std::time::Duration;

use anyhow::Result;
use clap::{Parser, Subcommand};
use colored::Colorize;
use tracing::info;

use grudge::burst::{self, BurstPlan};
use grudge::config::Config;
use grudge::db::{Database, SqliteDatabase};
use grudge::output::terminal;
use grudge::validate;

/// Grudge: dislike games, loudly, without flooding the server.
///
/// Clicks are applied optimistically and batched per game; the API
/// rate limits every client per endpoint.
#[derive(Parser)]
#[command(name = "grudge", version, about)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Initialize the database
    Init,

    /// Run the HTTP API
    #[cfg(feature = "web")]
    Serve {
        /// Port to listen on
        #[arg(long, default_value = "3000")]
        port: u16,

        /// Address to bind
        #[arg(long, default_value = "0.0.0.0")]
        bind: String,
    },

    /// Send a burst of dislike clicks for one or more games
    Dislike {
        /// Game ids (e.g. elden-ring)
        #[arg(required = true)]
        game_ids: Vec<String>,

        /// Clicks per game (default: 10)
        #[arg(long, default_value = "10")]
        clicks: u64,

        /// Milliseconds between clicks (default: 50)
        #[arg(long, default_value = "50")]
        spacing_ms: u64,
    },

    /// Send a burst of emoji reactions to a game
    React {
        game_id: String,

        /// Emoji shortcode without colons (e.g. skull)
        emoji: String,

        /// Clicks (default: 10)
        #[arg(long, default_value = "10")]
        clicks: u64,

        /// Milliseconds between clicks (default: 50)
        #[arg(long, default_value = "50")]
        spacing_ms: u64,
    },

    /// Show a game's dislikes and reactions
    Show { game_id: String },

    /// List the most disliked games
    Top {
        /// How many games to list (default: 10)
        #[arg(long, default_value = "10")]
        limit: u32,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    // Load .env file if present (silently ignore if missing)
    let _ = dotenvy::dotenv();

    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("grudge=info")),
        )
        .init();

    let cli = Cli::parse();
    let config = Config::load()?;

    match cli.command {
        Commands::Init => {
            info!("Initializing grudge database...");
            let db = init_database(&config)?;
            let table_count = db.table_count().await?;
            println!("Database initialized at: {}", config.db_path);
            println!("Tables created: {table_count}");
            println!("\nNext: run `grudge serve`, then `grudge dislike <game>`");
        }

        #[cfg(feature = "web")]
        Commands::Serve { port, bind } => {
            let db = init_database(&config)?;
            println!(
                "Limits per {}s window: dislike {}, reaction {}, read {}",
                config.limit_window.as_secs(),
                config.dislike_limit,
                config.reaction_limit,
                config.read_limit
            );
            grudge::web::run_server(config, db, port, &bind).await?;
        }

        Commands::Dislike {
            game_ids,
            clicks,
            spacing_ms,
        } => {
            for game_id in &game_ids {
                validate::require_game_id(game_id)?;
            }

            let plan = burst_plan(&config, clicks, spacing_ms);
            println!(
                "Disliking {} game(s) via {}...",
                game_ids.len(),
                config.api_url
            );

            let results = burst::dislike_bursts(&config.api_url, &game_ids, plan).await?;

            println!();
            for (game_id, outcome) in &results {
                terminal::display_burst_result(game_id, clicks, outcome);
            }
        }

        Commands::React {
            game_id,
            emoji,
            clicks,
            spacing_ms,
        } => {
            let emoji = emoji.trim_matches(':');
            validate::require_game_id(&game_id)?;
            if !validate::is_valid_emoji(emoji) {
                anyhow::bail!("Invalid emoji name: {emoji:?} (use a shortcode like skull)");
            }

            let plan = burst_plan(&config, clicks, spacing_ms);
            println!("Reacting :{emoji}: to {game_id} via {}...", config.api_url);

            let outcome = burst::reaction_burst(&config.api_url, &game_id, emoji, plan).await?;

            println!();
            terminal::display_burst_result(&format!("{game_id} :{emoji}:"), clicks, &outcome);
        }

        Commands::Show { game_id } => {
            validate::require_game_id(&game_id)?;
            let db = open_database(&config)?;
            let tally = db.get_tally(&game_id).await?;
            terminal::display_tally(&tally);
        }

        Commands::Top { limit } => {
            if limit == 0 {
                println!("{}", "Nothing to show for --limit 0.".dimmed());
                return Ok(());
            }
            let db = open_database(&config)?;
            let games = db.top_disliked(limit).await?;
            terminal::display_top(&games);
        }
    }

    Ok(())
}

fn burst_plan(config: &Config, clicks: u64, spacing_ms: u64) -> BurstPlan {
    BurstPlan {
        clicks,
        spacing: Duration::from_millis(spacing_ms),
        quiet_period: config.quiet_period,
    }
}

/// Create the database if needed.
fn init_database(config: &Config) -> Result<Arc<dyn Database>> {
    let conn = grudge::db::initialize(&config.db_path)?;
    Ok(Arc::new(SqliteDatabase::new(conn)))
}

/// Open an existing database, or bail telling the user to run `init`.
fn open_database(config: &Config) -> Result<Arc<dyn Database>> {
    let conn = grudge::db::open(&config.db_path)?;
    Ok(Arc::new(SqliteDatabase::new(conn)))
}
