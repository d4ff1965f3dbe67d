#![cfg_attr(docsrs, feature(doc_cfg))]
//! A load testing engine for simulated HTTP users.
//!
//! Describe what one user does by implementing [`User`], mark its tasks with
//! [`#[task]`](macro@task), then `.await` a [`Swarm`] of them:
//!
//! ```no_run
//! use swarm::prelude::*;
//! use std::num::NonZeroUsize;
//! use std::time::Duration;
//!
//! #[derive(Default)]
//! struct Reader;
//!
//! impl Reader {
//!     #[task]
//!     async fn front_page(&mut self, client: &HttpClient) -> TaskResult {
//!         client.get("/").await?;
//!         Ok(())
//!     }
//! }
//!
//! impl User for Reader {
//!     fn wait_time(&self) -> WaitTime {
//!         between(1., 5.)
//!     }
//!
//!     fn tasks() -> Vec<Task<Self>> {
//!         vec![Task::new("front_page", Self::front_page)]
//!     }
//! }
//!
//! #[tokio::main]
//! async fn main() -> Result<(), SwarmError> {
//!     let stats = Reader::swarm()
//!         .host("http://example.test")
//!         .users(NonZeroUsize::new(10).unwrap())
//!         .run_time(Duration::from_secs(60))
//!         .await?;
//!
//!     println!("{} requests", stats.total.num_requests);
//!     Ok(())
//! }
//! ```

extern crate self as swarm;

mod atomics;
pub mod cli;
pub mod client;
mod error;
mod runner;
pub mod launch;
#[doc(hidden)]
pub mod task;
mod timer;
pub mod user;

pub use swarm_core as core;
pub use swarm_macros::task;

pub use cli::SwarmCli;
pub use client::{HttpClient, RequestError};
pub use error::SwarmError;
pub use launch::{ConfigurableSwarm, Swarm};
pub use swarm_core::{RunStatistics, WaitTime};
pub use task::{Task, TaskError, TaskFuture, TaskResult};
pub use user::User;

pub mod prelude {
    pub use crate::client::HttpClient;
    pub use crate::error::SwarmError;
    pub use crate::launch::{ConfigurableSwarm, Swarm};
    pub use crate::task::{Task, TaskError, TaskFuture, TaskResult};
    pub use crate::user::User;
    pub use swarm_core::{
        between, constant, constant_pacing, constant_throughput, RunStatistics, WaitTime,
    };
    pub use swarm_macros::task;
}
