use std::net::SocketAddr;
use std::sync::OnceLock;
use std::time::Duration;
use tracing::error;
use tracing_subscriber::{EnvFilter, FmtSubscriber};

#[allow(unused)]
pub fn init() {
    static ONCE_LOCK: OnceLock<()> = OnceLock::new();

    ONCE_LOCK.get_or_init(|| {
        let default_panic = std::panic::take_hook();
        std::panic::set_hook(Box::new(move |info| {
            default_panic(info);
            error!("Panic occurred: {info:?}");
            std::process::exit(1);
        }));

        FmtSubscriber::builder()
            .with_env_filter(EnvFilter::new("coinload=debug,mock_shop=debug"))
            .init();
    });
}

/// Spawns a mock shop on the current runtime and waits for it to come up.
/// Each test uses its own port so tests stay independent.
#[allow(unused)]
pub async fn spawn_shop(port: u16, config: mock_shop::ShopConfig) {
    let addr: SocketAddr = format!("0.0.0.0:{port}").parse().unwrap();
    tokio::spawn(async move { mock_shop::run(addr, config).await });
    tokio::time::sleep(Duration::from_millis(200)).await;
}
