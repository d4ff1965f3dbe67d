use crate::{DEFAULT_SPAWN_RATE, DEFAULT_STATS_INTERVAL, DEFAULT_STOP_TIMEOUT, DEFAULT_USERS};
use std::num::{NonZeroU32, NonZeroU64, NonZeroUsize};
use std::time::Duration;

#[doc(hidden)]
#[derive(Clone, Debug, PartialEq)]
pub struct RunConfig {
    pub name: String,
    pub host: Option<String>,
    pub users: NonZeroUsize,
    pub spawn_rate: NonZeroU32,
    pub run_time: Option<Duration>,
    /// Task executions per user before that user stops.
    pub iterations: Option<NonZeroU64>,
    pub stop_timeout: Duration,
    pub stats_interval: Duration,
    pub json: bool,
}

impl RunConfig {
    pub fn new(name: &str) -> Self {
        Self {
            name: name.to_string(),
            host: None,
            users: DEFAULT_USERS,
            spawn_rate: DEFAULT_SPAWN_RATE,
            run_time: None,
            iterations: None,
            stop_timeout: DEFAULT_STOP_TIMEOUT,
            stats_interval: DEFAULT_STATS_INTERVAL,
            json: false,
        }
    }

    /// The configured host wins over the user type's default.
    pub fn resolve_host(&self, user_default: Option<String>) -> Option<String> {
        self.host.clone().or(user_default)
    }
}
