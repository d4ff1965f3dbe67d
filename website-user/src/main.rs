use swarm::prelude::*;
use tracing_subscriber::{EnvFilter, FmtSubscriber};
use website_user::WebsiteUser;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    FmtSubscriber::builder()
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new("swarm=info,website_user=info")),
        )
        .with_writer(std::io::stderr)
        .init();

    let stats = WebsiteUser::swarm().with_args().await?;

    tracing::info!(
        "{} requests, {} failures",
        stats.total.num_requests,
        stats.total.num_failures
    );
    std::process::exit(stats.exit_code());
}
