use rand::Rng;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::time::Duration;
use thiserror::Error;

/// Delay a simulated user observes between two task executions.
///
/// All values are in seconds. Use the constructor functions ([`between`], [`constant`],
/// [`constant_pacing`], [`constant_throughput`]) rather than building the variants directly.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub enum WaitTime {
    /// Uniformly random in the closed interval `[min, max]`.
    Between { min: f64, max: f64 },
    /// Always the same delay.
    Constant(f64),
    /// Delay so that a task starts every `n` seconds, whatever the task took.
    ConstantPacing(f64),
    /// At most `n` task executions per second.
    ConstantThroughput(f64),
}

/// Uniformly random wait between `min` and `max` seconds (inclusive).
///
/// # Example
/// ```
/// use swarm_core::between;
/// use std::time::Duration;
///
/// let wait = between(1.0, 5.0);
/// let delay = wait.sample(&mut rand::thread_rng(), Duration::ZERO);
/// assert!(delay >= Duration::from_secs(1) && delay <= Duration::from_secs(5));
/// ```
pub fn between(min: f64, max: f64) -> WaitTime {
    WaitTime::Between { min, max }
}

pub fn constant(secs: f64) -> WaitTime {
    WaitTime::Constant(secs)
}

pub fn constant_pacing(secs: f64) -> WaitTime {
    WaitTime::ConstantPacing(secs)
}

pub fn constant_throughput(tasks_per_sec: f64) -> WaitTime {
    WaitTime::ConstantThroughput(tasks_per_sec)
}

#[derive(Debug, Error, PartialEq)]
pub enum WaitTimeError {
    #[error("Wait time must be a finite, non-negative number of seconds (got {0}).")]
    OutOfRange(f64),

    #[error("Wait time lower bound {min} is greater than upper bound {max}.")]
    Inverted { min: f64, max: f64 },

    #[error("Throughput must be positive (got {0}).")]
    NonPositiveThroughput(f64),
}

impl WaitTime {
    pub fn validate(&self) -> Result<(), WaitTimeError> {
        match *self {
            WaitTime::Between { min, max } => {
                check_secs(min)?;
                check_secs(max)?;
                if min > max {
                    return Err(WaitTimeError::Inverted { min, max });
                }
                Ok(())
            }
            WaitTime::Constant(secs) | WaitTime::ConstantPacing(secs) => check_secs(secs),
            WaitTime::ConstantThroughput(tps) => {
                if tps.is_finite() && tps > 0. {
                    Ok(())
                } else {
                    Err(WaitTimeError::NonPositiveThroughput(tps))
                }
            }
        }
    }

    /// Draw the next delay. `task_elapsed` is how long the task that just finished took; only
    /// the pacing policies look at it.
    ///
    /// NOTE: Assumes the policy passed [`WaitTime::validate`]. Invalid policies yield zero.
    pub fn sample<R: Rng + ?Sized>(&self, rng: &mut R, task_elapsed: Duration) -> Duration {
        let secs = match *self {
            WaitTime::Between { min, max } => {
                if self.validate().is_err() {
                    return Duration::ZERO;
                }
                rng.gen_range(min..=max).clamp(min, max)
            }
            WaitTime::Constant(secs) => secs,
            WaitTime::ConstantPacing(secs) => secs - task_elapsed.as_secs_f64(),
            WaitTime::ConstantThroughput(tps) => 1. / tps - task_elapsed.as_secs_f64(),
        };

        Duration::try_from_secs_f64(secs.max(0.)).unwrap_or_default()
    }
}

impl fmt::Display for WaitTime {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            WaitTime::Between { min, max } => write!(f, "between({min}s, {max}s)"),
            WaitTime::Constant(secs) => write!(f, "constant({secs}s)"),
            WaitTime::ConstantPacing(secs) => write!(f, "constant_pacing({secs}s)"),
            WaitTime::ConstantThroughput(tps) => write!(f, "constant_throughput({tps}/s)"),
        }
    }
}

fn check_secs(secs: f64) -> Result<(), WaitTimeError> {
    if secs.is_finite() && secs >= 0. {
        Ok(())
    } else {
        Err(WaitTimeError::OutOfRange(secs))
    }
}
