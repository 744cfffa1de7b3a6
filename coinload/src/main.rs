use anyhow::Result;
use clap::Parser;
use coinload::LoadTest;
use std::time::Duration;
use tracing_subscriber::{EnvFilter, FmtSubscriber};

/// Fixed-population load generator for the merch-shop API.
#[derive(Parser, Debug)]
#[command(version, about)]
struct Cli {
    /// Target service base URL.
    #[arg(long, env = "COINLOAD_BASE_URL", default_value = "http://localhost:8080")]
    base_url: String,

    /// Number of concurrent virtual users.
    #[arg(long, env = "COINLOAD_USERS", default_value_t = coinload::constants::DEFAULT_USERS)]
    users: usize,

    /// Wall-clock run duration (e.g. "30s", "5m").
    #[arg(long, env = "COINLOAD_DURATION", value_parser = humantime::parse_duration, default_value = "30s")]
    duration: Duration,

    /// Idle interval between iterations of a single user (e.g. "1s").
    #[arg(long, env = "COINLOAD_PACING", value_parser = humantime::parse_duration, default_value = "1s")]
    pacing: Duration,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    FmtSubscriber::builder()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("coinload=info")),
        )
        .init();

    let report = LoadTest::new(&cli.base_url)
        .users(cli.users)
        .duration(cli.duration)
        .pacing(cli.pacing)
        .await?;

    println!("{report}");
    Ok(())
}
