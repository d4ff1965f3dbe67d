use crate::client::RequestError;
use rand::distributions::WeightedError;
use swarm_core::WaitTimeError;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum SwarmError {
    #[error("No host configured. Use --host, SWARM_HOST or User::host().")]
    NoHost,

    #[error("Invalid host: {0}")]
    InvalidHost(#[source] RequestError),

    #[error("No tasks registered for the user type.")]
    NoTasks,

    #[error("Task {0} has a weight of zero.")]
    ZeroWeight(&'static str),

    #[error("Invalid task weights: {0}")]
    InvalidTaskWeights(#[from] WeightedError),

    #[error("Invalid wait time: {0}")]
    InvalidWaitTime(#[from] WaitTimeError),

    #[error("Stats interval must be greater than zero.")]
    ZeroStatsInterval,

    #[error("Failed to write the JSON report: {0}")]
    Report(#[from] serde_json::Error),
}
