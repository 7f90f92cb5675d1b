use clap::{Parser, Subcommand};
use client::{ApiClient, SessionContext, TokenPair};
use storage::dto::ranking::{MemberStats, RankingEntry};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[derive(Parser)]
#[command(name = "ranking-cli")]
#[command(about = "Member event ranking client", long_about = None)]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    #[arg(long, env = "RANKING_API_URL", default_value = "http://localhost:8080")]
    api_url: String,

    #[arg(long, env = "RANKING_ACCESS_TOKEN", requires = "refresh_token")]
    access_token: Option<String>,

    #[arg(long, env = "RANKING_REFRESH_TOKEN", requires = "access_token")]
    refresh_token: Option<String>,

    #[arg(short, long)]
    verbose: bool,
}

#[derive(Subcommand)]
enum Commands {
    /// Yearly ranking of all members
    Ranking {
        #[arg(short, long)]
        year: Option<i32>,
    },
    /// Statistics of the logged-in member
    Me {
        #[arg(short, long)]
        year: Option<i32>,
    },
    /// Points per event type and medal thresholds
    Points,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    dotenvy::dotenv().ok();

    let cli = Cli::parse();

    let log_level = if cli.verbose { "debug" } else { "warn" };
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| format!("ranking_cli={},client={}", log_level, log_level).into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let session = match (cli.access_token, cli.refresh_token) {
        (Some(access_token), Some(refresh_token)) => SessionContext::with_tokens(TokenPair {
            access_token,
            refresh_token,
        }),
        _ => SessionContext::new(),
    };
    let client = ApiClient::new(cli.api_url, session)?;

    match cli.command {
        Commands::Ranking { year } => {
            let ranking = client.get_ranking(year).await?;
            print_ranking(&ranking);
        }
        Commands::Me { year } => {
            let stats = client.get_my_stats(year).await?;
            print_stats(&stats);
        }
        Commands::Points => {
            let table = client.get_points_table().await?;
            println!("Points table version {}", table.version);
            for entry in &table.points {
                println!("  {:<22} {:>3}", entry.event_type.as_str(), entry.points);
            }
            println!("Medals:");
            for medal in &table.medals {
                println!("  {:<22} >= {:>3} ({})", medal.name, medal.min_points, medal.color);
            }
        }
    }

    Ok(())
}

fn print_ranking(ranking: &[RankingEntry]) {
    if ranking.is_empty() {
        println!("No attended events for this year");
        return;
    }

    println!(
        "{:>4}  {:<30} {:>7} {:>7} {:>9}  {}",
        "#", "Member", "Events", "Points", "Km", "Medal"
    );
    for entry in ranking {
        println!(
            "{:>4}  {:<30} {:>7} {:>7} {:>9}  {}",
            entry.position,
            entry.name,
            entry.total_events,
            entry.total_points,
            entry.total_kilometers,
            entry.medal.as_deref().unwrap_or("-")
        );
    }
}

fn print_stats(stats: &MemberStats) {
    println!("Year {}", stats.year);
    println!("  Events:     {}", stats.total_events);
    println!("  Points:     {}", stats.total_points);
    println!("  Kilometers: {}", stats.total_kilometers);
    println!("  Medal:      {}", stats.medal.as_deref().unwrap_or("-"));

    if !stats.by_type.is_empty() {
        println!("By event type:");
        for row in &stats.by_type {
            println!(
                "  {:<22} {:>3} events {:>4} points",
                row.event_type.as_str(),
                row.count,
                row.points
            );
        }
    }

    if !stats.recent_events.is_empty() {
        println!("Recent events:");
        for event in &stats.recent_events {
            println!(
                "  {}  {:<30} {:>6} km {:>3} pts",
                event.date, event.name, event.kilometers, event.points
            );
        }
    }
}
