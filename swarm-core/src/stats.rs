use crate::AGGREGATED_NAME;
use pdatastructs::tdigest::{TDigest, K1};
use serde::{Deserialize, Serialize};
use serde_with::{serde_as, DurationMilliSecondsWithFrac, DurationSecondsWithFrac};
use std::collections::BTreeMap;
use std::fmt;
use std::time::Duration;
use tracing::error;

const TDIGEST_BACKLOG_SIZE: usize = 100;

/// A single request as reported by the HTTP client.
#[derive(Debug, Clone, PartialEq)]
pub struct RequestEvent {
    pub method: String,
    pub name: String,
    pub response_time: Duration,
    pub content_length: u64,
    pub failure: Option<String>,
}

/// Running aggregate for one `(method, name)` pair.
#[derive(Debug, Clone)]
pub struct StatsEntry {
    method: String,
    name: String,
    num_requests: u64,
    num_failures: u64,
    total_response_time: Duration,
    min_response_time: Option<Duration>,
    max_response_time: Duration,
    total_content_length: u64,
    latency: TDigest<K1>,
}

impl StatsEntry {
    pub fn new(method: &str, name: &str) -> Self {
        Self {
            method: method.to_string(),
            name: name.to_string(),
            num_requests: 0,
            num_failures: 0,
            total_response_time: Duration::ZERO,
            min_response_time: None,
            max_response_time: Duration::ZERO,
            total_content_length: 0,
            latency: default_tdigest(),
        }
    }

    pub fn log(&mut self, response_time: Duration, content_length: u64, failed: bool) {
        self.num_requests += 1;
        if failed {
            self.num_failures += 1;
        }
        self.total_response_time += response_time;
        self.min_response_time = Some(
            self.min_response_time
                .map_or(response_time, |min| min.min(response_time)),
        );
        self.max_response_time = self.max_response_time.max(response_time);
        self.total_content_length += content_length;
        self.latency.insert(response_time.as_secs_f64());
    }

    pub fn num_requests(&self) -> u64 {
        self.num_requests
    }

    pub fn num_failures(&self) -> u64 {
        self.num_failures
    }

    pub fn min_response_time(&self) -> Duration {
        self.min_response_time.unwrap_or_default()
    }

    pub fn max_response_time(&self) -> Duration {
        self.max_response_time
    }

    pub fn avg_response_time(&self) -> Duration {
        if self.num_requests == 0 {
            return Duration::ZERO;
        }
        let avg = self.total_response_time.as_nanos() / u128::from(self.num_requests);
        Duration::from_nanos(u64::try_from(avg).unwrap_or(u64::MAX))
    }

    pub fn latency(&self, quantile: f64) -> Duration {
        if self.num_requests == 0 {
            return Duration::ZERO;
        }

        let secs = self.latency.quantile(quantile);

        // NOTE: TDigest can hand back NaN on tiny inputs.
        let secs = if secs.is_finite() && secs >= 0. {
            secs
        } else {
            error!("Non-finite latency quantile for {} {}.", self.method, self.name);
            0.
        };

        Duration::from_secs_f64(secs)
    }

    pub fn snapshot(&self, elapsed: Duration) -> EntrySnapshot {
        let secs = elapsed.as_secs_f64();
        let per_sec = |count: u64| if secs > 0. { count as f64 / secs } else { 0. };

        EntrySnapshot {
            method: self.method.clone(),
            name: self.name.clone(),
            num_requests: self.num_requests,
            num_failures: self.num_failures,
            avg_response_time: self.avg_response_time(),
            min_response_time: self.min_response_time(),
            max_response_time: self.max_response_time,
            latency_p50: self.latency(0.5),
            latency_p90: self.latency(0.9),
            latency_p99: self.latency(0.99),
            avg_content_length: self
                .total_content_length
                .checked_div(self.num_requests)
                .unwrap_or(0),
            requests_per_sec: per_sec(self.num_requests),
            failures_per_sec: per_sec(self.num_failures),
        }
    }
}

fn default_tdigest() -> TDigest<K1> {
    TDigest::new(K1::new(10.), TDIGEST_BACKLOG_SIZE)
}

/// Request statistics of a whole run, per endpoint and aggregated.
#[derive(Debug, Clone)]
pub struct StatsTable {
    entries: BTreeMap<(String, String), StatsEntry>,
    total: StatsEntry,
    errors: BTreeMap<(String, String, String), u64>,
}

impl Default for StatsTable {
    fn default() -> Self {
        Self::new()
    }
}

impl StatsTable {
    pub fn new() -> Self {
        Self {
            entries: BTreeMap::new(),
            total: StatsEntry::new("", AGGREGATED_NAME),
            errors: BTreeMap::new(),
        }
    }

    pub fn log(&mut self, event: &RequestEvent) {
        let failed = event.failure.is_some();

        self.entries
            .entry((event.name.clone(), event.method.clone()))
            .or_insert_with(|| StatsEntry::new(&event.method, &event.name))
            .log(event.response_time, event.content_length, failed);

        self.total
            .log(event.response_time, event.content_length, failed);

        if let Some(failure) = &event.failure {
            *self
                .errors
                .entry((event.method.clone(), event.name.clone(), failure.clone()))
                .or_default() += 1;
        }
    }

    pub fn entry(&self, method: &str, name: &str) -> Option<&StatsEntry> {
        self.entries.get(&(name.to_string(), method.to_string()))
    }

    pub fn total(&self) -> &StatsEntry {
        &self.total
    }

    pub fn entries_snapshot(&self, elapsed: Duration) -> Vec<EntrySnapshot> {
        self.entries
            .values()
            .map(|entry| entry.snapshot(elapsed))
            .collect()
    }

    pub fn errors_snapshot(&self) -> Vec<ErrorSnapshot> {
        self.errors
            .iter()
            .map(|((method, name, error), occurrences)| ErrorSnapshot {
                method: method.clone(),
                name: name.clone(),
                error: error.clone(),
                occurrences: *occurrences,
            })
            .collect()
    }
}

/// Point-in-time view of one stats row.
#[serde_as]
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EntrySnapshot {
    pub method: String,
    pub name: String,
    pub num_requests: u64,
    pub num_failures: u64,
    #[serde_as(as = "DurationMilliSecondsWithFrac<f64>")]
    pub avg_response_time: Duration,
    #[serde_as(as = "DurationMilliSecondsWithFrac<f64>")]
    pub min_response_time: Duration,
    #[serde_as(as = "DurationMilliSecondsWithFrac<f64>")]
    pub max_response_time: Duration,
    #[serde_as(as = "DurationMilliSecondsWithFrac<f64>")]
    pub latency_p50: Duration,
    #[serde_as(as = "DurationMilliSecondsWithFrac<f64>")]
    pub latency_p90: Duration,
    #[serde_as(as = "DurationMilliSecondsWithFrac<f64>")]
    pub latency_p99: Duration,
    pub avg_content_length: u64,
    pub requests_per_sec: f64,
    pub failures_per_sec: f64,
}

impl EntrySnapshot {
    pub fn failure_ratio(&self) -> f64 {
        if self.num_requests == 0 {
            0.
        } else {
            self.num_failures as f64 / self.num_requests as f64
        }
    }
}

impl fmt::Display for EntrySnapshot {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{:<7}{:<30} reqs={} fails={} ({:.2}%) avg={:?} min={:?} max={:?} p50={:?} p90={:?} p99={:?} req/s={:.2}",
            self.method,
            self.name,
            self.num_requests,
            self.num_failures,
            self.failure_ratio() * 100.,
            self.avg_response_time,
            self.min_response_time,
            self.max_response_time,
            self.latency_p50,
            self.latency_p90,
            self.latency_p99,
            self.requests_per_sec,
        )
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ErrorSnapshot {
    pub method: String,
    pub name: String,
    pub error: String,
    pub occurrences: u64,
}

/// Statistics for a finished run
///
/// Returned by awaiting a `Swarm`. Serializes to the JSON report printed with `--json`.
#[serde_as]
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RunStatistics {
    pub name: String,
    pub user_count: usize,
    #[serde_as(as = "DurationSecondsWithFrac<f64>")]
    pub elapsed: Duration,
    pub entries: Vec<EntrySnapshot>,
    pub total: EntrySnapshot,
    pub errors: Vec<ErrorSnapshot>,
    pub task_runs: u64,
    pub task_failures: u64,
}

impl RunStatistics {
    pub fn from_table(
        name: &str,
        user_count: usize,
        elapsed: Duration,
        table: &StatsTable,
        task_runs: u64,
        task_failures: u64,
    ) -> Self {
        Self {
            name: name.to_string(),
            user_count,
            elapsed,
            entries: table.entries_snapshot(elapsed),
            total: table.total().snapshot(elapsed),
            errors: table.errors_snapshot(),
            task_runs,
            task_failures,
        }
    }

    pub fn entry(&self, method: &str, name: &str) -> Option<&EntrySnapshot> {
        self.entries
            .iter()
            .find(|e| e.method == method && e.name == name)
    }

    /// `1` if any request or task failed, `0` otherwise.
    pub fn exit_code(&self) -> i32 {
        if self.total.num_failures > 0 || self.task_failures > 0 {
            1
        } else {
            0
        }
    }
}
