use std::net::SocketAddr;
use tracing_subscriber::{EnvFilter, FmtSubscriber};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    FmtSubscriber::builder()
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new("mock_service=debug,tower_http=debug")),
        )
        .init();

    tokio::task::spawn(mock_service::tps_measure_task());

    let addr: SocketAddr = "0.0.0.0:3002".parse()?;
    tracing::info!("Mock service listening on {addr}");
    mock_service::run(addr).await
}
