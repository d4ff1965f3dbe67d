//! Swarm configuration and launch
use crate::cli::SwarmCli;
use crate::error::SwarmError;
use crate::runner::run_swarm;
use crate::user::User;
use clap::Parser;
use std::{
    future::Future,
    marker::PhantomData,
    num::{NonZeroU32, NonZeroU64, NonZeroUsize},
    pin::Pin,
    task::{Context, Poll},
    time::Duration,
};
use swarm_core::{RunConfig, RunStatistics};

/// A load test run: a population of simulated users of type `U`.
///
/// Configure it with the [`ConfigurableSwarm`] methods and `.await` it to run. Usually created
/// with [`User::swarm`].
#[pin_project::pin_project]
pub struct Swarm<U> {
    runner_fut: Option<Pin<Box<dyn Future<Output = Result<RunStatistics, SwarmError>> + Send>>>,
    config: RunConfig,
    _user: PhantomData<fn() -> U>,
}

impl<U: User + Default> Swarm<U> {
    pub fn new() -> Self {
        Self {
            runner_fut: None,
            config: RunConfig::new(user_name::<U>()),
            _user: PhantomData,
        }
    }

    #[doc(hidden)]
    pub fn config(&self) -> &RunConfig {
        &self.config
    }
}

impl<U: User + Default> Default for Swarm<U> {
    fn default() -> Self {
        Self::new()
    }
}

impl<U: User + Default> Future for Swarm<U> {
    type Output = Result<RunStatistics, SwarmError>;

    fn poll(mut self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Self::Output> {
        if self.runner_fut.is_none() {
            let config = self.config.clone();
            self.runner_fut = Some(Box::pin(run_swarm::<U>(config)));
        }

        if let Some(runner) = &mut self.runner_fut {
            runner.as_mut().poll(cx)
        } else {
            unreachable!()
        }
    }
}

pub trait ConfigurableSwarm<T: Send>: Future<Output = T> + Sized + Send {
    fn host(self, host: &str) -> Self;
    fn users(self, users: NonZeroUsize) -> Self;
    fn spawn_rate(self, spawn_rate: NonZeroU32) -> Self;
    fn run_time(self, run_time: Duration) -> Self;
    fn iterations(self, iterations: NonZeroU64) -> Self;
    fn stop_timeout(self, stop_timeout: Duration) -> Self;
    fn stats_interval(self, stats_interval: Duration) -> Self;
    fn json(self) -> Self;
    fn with_cli(self, cli: SwarmCli) -> Self;
    fn with_args(self) -> Self;
}

impl<U: User + Default> ConfigurableSwarm<Result<RunStatistics, SwarmError>> for Swarm<U> {
    /// Target host. Relative request paths are appended to it.
    ///
    /// # Example
    /// ```no_run
    /// # use swarm::prelude::*;
    /// # #[derive(Default)] struct MyUser;
    /// # impl User for MyUser {
    /// #     fn wait_time(&self) -> WaitTime { constant(1.) }
    /// #     fn tasks() -> Vec<Task<Self>> { vec![] }
    /// # }
    /// #[tokio::main]
    /// async fn main() {
    ///     let stats = MyUser::swarm()
    ///         .host("http://example.test")
    ///         .run_time(std::time::Duration::from_secs(60))
    ///         .await;
    /// }
    /// ```
    fn host(mut self, host: &str) -> Self {
        self.config.host = Some(host.to_string());
        self
    }

    /// Number of concurrent simulated users. Defaults to 1.
    fn users(mut self, users: NonZeroUsize) -> Self {
        self.config.users = users;
        self
    }

    /// Users started per second until `users` are running. Defaults to 1.
    fn spawn_rate(mut self, spawn_rate: NonZeroU32) -> Self {
        self.config.spawn_rate = spawn_rate;
        self
    }

    /// Stop the run after the given duration.
    ///
    /// NOTE: Without `.run_time()` or `.iterations()` the swarm runs until every user stops
    /// itself.
    fn run_time(mut self, run_time: Duration) -> Self {
        self.config.run_time = Some(run_time);
        self
    }

    /// Stop each user after it ran this many tasks. The run ends once every user stopped.
    fn iterations(mut self, iterations: NonZeroU64) -> Self {
        self.config.iterations = Some(iterations);
        self
    }

    fn stop_timeout(mut self, stop_timeout: Duration) -> Self {
        self.config.stop_timeout = stop_timeout;
        self
    }

    fn stats_interval(mut self, stats_interval: Duration) -> Self {
        self.config.stats_interval = stats_interval;
        self
    }

    /// Print the final statistics as JSON on stdout.
    fn json(mut self) -> Self {
        self.config.json = true;
        self
    }

    fn with_cli(mut self, cli: SwarmCli) -> Self {
        cli.apply(&mut self.config);
        self
    }

    /// Use the default command line flags (see [`SwarmCli`]).
    ///
    /// ```ignore
    /// $ ./my_load_test --host http://example.test -u 50 -r 5 -t 10m
    /// ```
    fn with_args(self) -> Self {
        self.with_cli(SwarmCli::parse())
    }
}

fn user_name<U>() -> &'static str {
    let full = std::any::type_name::<U>();
    full.rsplit("::").next().unwrap_or(full)
}
