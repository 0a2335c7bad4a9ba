//! chessmirror CLI
//!
//! Command-line interface for the game mirror:
//! - Load a player's history and print statistics
//! - Keep the mirror refreshed and reprint on change
//! - Generate a default config file

use chessmirror::config::{generate_default_config, Config, LoggingConfig};
use chessmirror::{Aggregate, ChessComClient, GameTracker, Selector};
use chrono::{DateTime, Months, NaiveDate, Utc};
use clap::{Args, Parser, Subcommand};
use std::path::PathBuf;
use std::sync::Arc;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[derive(Parser)]
#[command(name = "chessmirror")]
#[command(version = env!("CARGO_PKG_VERSION"))]
#[command(about = "Local mirror and statistics of a player's online chess games")]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    /// Config file (default: search the usual locations)
    #[arg(short, long, global = true)]
    pub config: Option<PathBuf>,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Load history and print statistics
    Stats(QueryArgs),

    /// Load history, then refresh periodically and print statistics on change
    Watch(QueryArgs),

    /// Generate default config file
    Config {
        /// Output path (default: stdout)
        #[arg(short, long)]
        output: Option<PathBuf>,
    },
}

#[derive(Args)]
pub struct QueryArgs {
    /// Player name
    nick: String,
    /// First day of history (YYYY-MM-DD, default: configured window)
    #[arg(short, long)]
    since: Option<NaiveDate>,
    /// Time class (bullet, blitz, rapid, daily) or auto
    #[arg(short, long, default_value = "auto")]
    time_class: String,
    /// Rule set (chess, chess960, bughouse, ...) or auto
    #[arg(short, long, default_value = "auto")]
    rules: String,
    /// Keep unrated games
    #[arg(long)]
    include_unrated: bool,
    /// Output format (table, json)
    #[arg(short, long, default_value = "table")]
    format: String,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();

    let config = match &cli.config {
        Some(path) => Config::load_with_env(path)?,
        None => Config::load_default(),
    };

    init_logging(&config.logging);

    match cli.command {
        Commands::Stats(args) => {
            let tracker = build_tracker(&config)?;
            let start = start_date(&args, &config);
            let include_unrated = args.include_unrated || config.sync.include_unrated;

            let report = tracker.load_history(&args.nick, start, include_unrated).await?;
            if !report.is_complete() {
                eprintln!("Warning: some months could not be fetched ({})", report);
            }

            print_stats(&tracker, &args).await?;
        }

        Commands::Watch(args) => {
            let tracker = build_tracker(&config)?;
            let start = start_date(&args, &config);
            let include_unrated = args.include_unrated || config.sync.include_unrated;

            tracker.load_history(&args.nick, start, include_unrated).await?;
            print_stats(&tracker, &args).await?;

            let period = std::time::Duration::from_secs(config.sync.refresh_interval_secs.max(1));
            let mut ticker = tokio::time::interval(period);

            // Skip the first immediate tick
            ticker.tick().await;

            loop {
                tokio::select! {
                    _ = ticker.tick() => {
                        let outcome = tracker.refresh(&args.nick, start, include_unrated).await?;
                        if outcome.changed {
                            tracing::info!(
                                inserted = outcome.inserted,
                                replaced = outcome.replaced.len(),
                                "New games found"
                            );
                            print_stats(&tracker, &args).await?;
                        }
                    }
                    _ = tokio::signal::ctrl_c() => {
                        tracing::info!("Shutting down...");
                        break;
                    }
                }
            }
        }

        Commands::Config { output } => {
            let content = generate_default_config();
            match output {
                Some(path) => {
                    std::fs::write(&path, content)?;
                    println!("Config written to {}", path.display());
                }
                None => print!("{}", content),
            }
        }
    }

    Ok(())
}

fn init_logging(logging: &LoggingConfig) {
    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(format!("chessmirror={}", logging.level)));

    let registry = tracing_subscriber::registry().with(filter);

    if logging.format == "json" {
        registry
            .with(tracing_subscriber::fmt::layer().json().with_writer(std::io::stderr))
            .init();
    } else {
        registry
            .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
            .init();
    }
}

fn build_tracker(config: &Config) -> Result<GameTracker, Box<dyn std::error::Error>> {
    let client = ChessComClient::new(config.fetch_config())?;
    Ok(GameTracker::new(Arc::new(client), config.sync_config()))
}

fn start_date(args: &QueryArgs, config: &Config) -> DateTime<Utc> {
    match args.since {
        Some(date) => date.and_time(chrono::NaiveTime::MIN).and_utc(),
        None => {
            let now = Utc::now();
            now.checked_sub_months(Months::new(config.sync.history_months))
                .unwrap_or(now)
        }
    }
}

async fn print_stats(tracker: &GameTracker, args: &QueryArgs) -> Result<(), Box<dyn std::error::Error>> {
    let time_class = Selector::from(args.time_class.as_str());
    let rules = Selector::from(args.rules.as_str());
    let stats = tracker.analyze(&args.nick, &time_class, &rules).await;

    match args.format.as_str() {
        "json" => println!("{}", serde_json::to_string_pretty(&stats)?),
        _ => print_table(&args.nick, &stats),
    }

    Ok(())
}

fn print_table(nick: &str, stats: &Aggregate) {
    println!(
        "{} - {} / {}",
        nick, stats.effective_time_class, stats.effective_rules
    );
    println!("{}", "-".repeat(40));
    println!("{:<16} {:>10}", "Games", stats.count);
    println!(
        "{:<16} {:>10} ({:.1}%)",
        "Wins",
        stats.win,
        stats.win_rate() * 100.0
    );
    println!(
        "{:<16} {:>10} ({:.1}%)",
        "Draws",
        stats.draw,
        stats.draw_rate() * 100.0
    );
    println!("{:<16} {:>10}", "Losses", stats.losses());
    println!("{:<16} {:>10}", "Play time", format_duration(stats.duration));
    if let Some(rating) = stats.last_rating() {
        println!("{:<16} {:>10}", "Rating", rating);
    }
}

fn format_duration(seconds: i64) -> String {
    let hours = seconds / 3600;
    let minutes = (seconds % 3600) / 60;

    if hours > 0 {
        format!("{}h {}m", hours, minutes)
    } else {
        format!("{}m {}s", minutes, seconds % 60)
    }
}
