//! Command line flags shared by every swarm binary.
use clap::Parser;
use std::num::{NonZeroU32, NonZeroU64, NonZeroUsize};
use std::time::Duration;
use swarm_core::{RunConfig, DEFAULT_SPAWN_RATE, DEFAULT_USERS};

#[derive(Parser, Debug, Clone, PartialEq)]
#[command(version, about = "Run a swarm of simulated users against a host.")]
pub struct SwarmCli {
    /// Host to load test, e.g. `http://example.test`
    #[arg(short = 'H', long, env = "SWARM_HOST")]
    pub host: Option<String>,

    /// Number of concurrent simulated users
    #[arg(short, long, env = "SWARM_USERS", default_value_t = DEFAULT_USERS)]
    pub users: NonZeroUsize,

    /// Users started per second
    #[arg(short = 'r', long, env = "SWARM_SPAWN_RATE", default_value_t = DEFAULT_SPAWN_RATE)]
    pub spawn_rate: NonZeroU32,

    /// Stop after this long, e.g. `300s` or `1h30m`
    #[arg(short = 't', long, env = "SWARM_RUN_TIME", value_parser = humantime::parse_duration)]
    pub run_time: Option<Duration>,

    /// Stop each user after this many task executions
    #[arg(short, long, env = "SWARM_ITERATIONS")]
    pub iterations: Option<NonZeroU64>,

    /// Time stopping users get to run `on_stop` before being aborted
    #[arg(long, env = "SWARM_STOP_TIMEOUT", value_parser = humantime::parse_duration, default_value = "10s")]
    pub stop_timeout: Duration,

    /// Interval between stats lines in the log
    #[arg(long, env = "SWARM_STATS_INTERVAL", value_parser = parse_interval, default_value = "2s")]
    pub stats_interval: Duration,

    /// Print the final statistics as JSON on stdout
    #[arg(long, env = "SWARM_JSON")]
    pub json: bool,
}

fn parse_interval(arg: &str) -> Result<Duration, String> {
    match humantime::parse_duration(arg) {
        Ok(interval) if interval.is_zero() => Err("interval must be greater than zero".to_string()),
        Ok(interval) => Ok(interval),
        Err(err) => Err(err.to_string()),
    }
}

impl SwarmCli {
    pub fn apply(self, config: &mut RunConfig) {
        if self.host.is_some() {
            config.host = self.host;
        }
        config.users = self.users;
        config.spawn_rate = self.spawn_rate;
        config.run_time = self.run_time;
        config.iterations = self.iterations;
        config.stop_timeout = self.stop_timeout;
        config.stats_interval = self.stats_interval;
        config.json = self.json;
    }
}
