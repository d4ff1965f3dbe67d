use std::num::{NonZeroU32, NonZeroUsize};
use std::time::Duration;

/// Number of simulated users when none is configured
pub const DEFAULT_USERS: NonZeroUsize = NonZeroUsize::MIN;

/// Users spawned per second when no spawn rate is configured
pub const DEFAULT_SPAWN_RATE: NonZeroU32 = NonZeroU32::MIN;

/// How long stopping users get to finish their `on_stop` hook before being aborted
pub const DEFAULT_STOP_TIMEOUT: Duration = Duration::from_secs(10);

/// Interval between two stats lines in the log
pub const DEFAULT_STATS_INTERVAL: Duration = Duration::from_secs(2);

/// Name of the aggregated row of the stats table
pub const AGGREGATED_NAME: &str = "Aggregated";
