mod utils;
use utils::*;

use std::num::NonZeroU64;
use clap::Parser;
use swarm::prelude::*;
use swarm::SwarmCli;

#[derive(Default)]
struct Mixed;

impl Mixed {
    #[task]
    async fn home(&mut self, client: &HttpClient) -> TaskResult {
        client.get("/").await?;
        Ok(())
    }

    #[task]
    async fn broken(&mut self, client: &HttpClient) -> TaskResult {
        let res = client.get("/status/500").await?;
        if res.status().is_server_error() {
            return Err(TaskError::Failed(format!("unexpected {}", res.status())));
        }
        Ok(())
    }
}

impl User for Mixed {
    fn wait_time(&self) -> WaitTime {
        constant(0.)
    }

    fn tasks() -> Vec<Task<Self>> {
        vec![
            Task::new("home", Self::home).weight(3),
            Task::new("broken", Self::broken),
        ]
    }
}

#[tokio::test]
#[ntest::timeout(30_000)]
async fn weighted_tasks_and_error_statuses() {
    init();
    let service = mock_service::spawn().await.unwrap();

    let stats = Mixed::swarm()
        .host(&service.url())
        .iterations(NonZeroU64::new(200).unwrap())
        .await
        .unwrap();

    let home = stats.entry("GET", "/").unwrap();
    let broken = stats.entry("GET", "/status/500").unwrap();

    assert_eq!(home.num_requests + broken.num_requests, 200);
    assert_eq!(home.num_failures, 0);
    assert_eq!(broken.num_failures, broken.num_requests);
    assert!(home.num_requests > broken.num_requests);

    assert_eq!(stats.task_runs, 200);
    assert_eq!(stats.task_failures, broken.num_requests);
    assert_eq!(stats.errors.len(), 1);
    assert_eq!(stats.errors[0].error, "500 Internal Server Error");
    assert_eq!(stats.exit_code(), 1);
    assert_eq!(service.hits().len(), 200);
}

#[derive(Default)]
struct Pinned;

impl Pinned {
    #[task]
    async fn visit(&mut self, client: &HttpClient) -> TaskResult {
        client.get("").await?;
        Err(TaskError::StopUser)
    }
}

impl User for Pinned {
    fn wait_time(&self) -> WaitTime {
        constant(0.)
    }

    fn tasks() -> Vec<Task<Self>> {
        vec![Task::new("visit", Self::visit)]
    }

    fn on_start<'a>(&'a mut self, client: &'a HttpClient) -> TaskFuture<'a> {
        Box::pin(async move {
            client.post("/", "hello").await?;
            TaskResult::Ok(())
        })
    }
}

#[tokio::test]
#[ntest::timeout(30_000)]
async fn cli_host_and_stop_user() {
    init();
    let service = mock_service::spawn().await.unwrap();
    let url = service.url();
    let cli = SwarmCli::try_parse_from(["pinned", "--host", url.as_str(), "-u", "2", "-r", "50"])
        .unwrap();

    let stats = Pinned::swarm().with_cli(cli).await.unwrap();

    let hits = service.hits();
    assert_eq!(hits.iter().filter(|h| h.method == "POST").count(), 2);
    assert_eq!(hits.iter().filter(|h| h.method == "GET").count(), 2);
    assert_eq!(stats.user_count, 2);
    assert_eq!(stats.task_runs, 2);
    assert_eq!(stats.exit_code(), 0);
}
