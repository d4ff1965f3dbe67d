mod config;
mod constants;
mod metrics;
mod stats;
mod wait_time;

pub use config::*;
pub use constants::*;
pub use metrics::*;
pub use stats::*;
pub use wait_time::*;
