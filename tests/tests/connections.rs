mod utils;
use utils::*;

use clap::Parser;
use swarm::prelude::*;
use swarm::SwarmCli;

#[derive(Default)]
struct Regular;

impl Regular {
    #[task]
    async fn ping(&mut self, client: &HttpClient) -> TaskResult {
        client.get("/").await?;
        Ok(())
    }
}

impl User for Regular {
    fn wait_time(&self) -> WaitTime {
        constant(1.)
    }

    fn tasks() -> Vec<Task<Self>> {
        vec![Task::new("ping", Self::ping)]
    }
}

#[tracing_test::traced_test]
#[tokio::test]
async fn every_user_opens_its_own_connection() -> anyhow::Result<()> {
    let server = connection_counter().await?;
    let cli = SwarmCli::try_parse_from([
        "regular", "-H", server.url.as_str(), "-u", "2", "-r", "2", "-i", "3",
    ])?;

    let stats = Regular::swarm().with_cli(cli).await?;

    assert_eq!(server.requests(), 6);
    assert_eq!(stats.total.num_requests, 6);
    // Requests never overlap, so a shared pool would reuse a single connection.
    assert_eq!(server.connections(), 2);
    assert!(logs_contain("All users stopped"));
    Ok(())
}
