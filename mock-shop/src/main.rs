use mock_shop::ShopConfig;
use std::net::SocketAddr;
use tracing_subscriber::{EnvFilter, FmtSubscriber};

#[tokio::main]
async fn main() {
    FmtSubscriber::builder()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("mock_shop=debug")),
        )
        .init();

    tokio::task::spawn(async { mock_shop::tps_measure_task().await });

    let max_tps = std::env::var("MOCK_SHOP_MAX_TPS")
        .ok()
        .and_then(|raw| raw.parse().ok());

    let addr: SocketAddr = "0.0.0.0:8080".parse().unwrap();
    mock_shop::run(addr, ShopConfig { max_tps }).await;
}
