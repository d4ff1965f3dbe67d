//! A simulated visitor that keeps loading the front page of the host under test.
use swarm::prelude::*;

/// Requests the host's root and waits 1 to 5 seconds before the next visit.
#[derive(Debug, Default)]
pub struct WebsiteUser;

impl WebsiteUser {
    #[task]
    pub async fn index_page(&mut self, client: &HttpClient) -> TaskResult {
        client.get("").await?;
        Ok(())
    }
}

impl User for WebsiteUser {
    fn wait_time(&self) -> WaitTime {
        between(1., 5.)
    }

    fn tasks() -> Vec<Task<Self>> {
        vec![Task::new("index_page", Self::index_page)]
    }
}
