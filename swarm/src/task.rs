use crate::client::{HttpClient, RequestError};
use crate::error::SwarmError;
use rand::distributions::{Distribution, WeightedError, WeightedIndex};
use rand::Rng;
use std::fmt;
use std::future::Future;
use std::pin::Pin;
use std::sync::{
    atomic::{AtomicU64, Ordering},
    Arc,
};
use swarm_core::TaskLabels;
use thiserror::Error;
use tokio::time::Instant;

pub type TaskResult = Result<(), TaskError>;

pub type TaskFuture<'a> = Pin<Box<dyn Future<Output = TaskResult> + Send + 'a>>;

/// Signature of a registrable task. The [`#[task]`](swarm_macros::task) macro produces these.
pub type TaskFn<U> = for<'a> fn(&'a mut U, &'a HttpClient) -> TaskFuture<'a>;

#[derive(Debug, Error)]
pub enum TaskError {
    #[error(transparent)]
    Request(#[from] RequestError),

    #[error("{0}")]
    Failed(String),

    /// Stops the simulated user that raised it. Not counted as a failure.
    #[error("User stopped")]
    StopUser,
}

/// Task hook used by the `#[task]` macro. Not intended to be used manually.
pub async fn task_hook<T, R>(labels: TaskLabels, func: T) -> T::Output
where
    T: Future<Output = Result<R, TaskError>>,
{
    if let Ok(hook) = TASK_HOOK.try_with(|v| v.clone()) {
        let start = Instant::now();
        let res = func.await;
        let elapsed = start.elapsed();

        #[cfg(feature = "metrics")]
        {
            metrics::describe_histogram!(labels.latency, metrics::Unit::Seconds, "");
            metrics::histogram!(labels.latency).record(elapsed.as_secs_f64());
        }
        #[cfg(not(feature = "metrics"))]
        let _ = (labels, elapsed);

        match &res {
            Ok(_) | Err(TaskError::StopUser) => {
                hook.success.fetch_add(1, Ordering::Relaxed);

                #[cfg(feature = "metrics")]
                metrics::counter!(labels.success).increment(1);
            }
            Err(_) => {
                hook.error.fetch_add(1, Ordering::Relaxed);

                #[cfg(feature = "metrics")]
                metrics::counter!(labels.error).increment(1);
            }
        }

        res
    } else {
        tracing::warn!("No hook available.");
        func.await
    }
}

#[derive(Clone)]
pub(crate) struct TaskData {
    pub success: Arc<AtomicU64>,
    pub error: Arc<AtomicU64>,
}

tokio::task_local! {
    pub(crate) static TASK_HOOK: TaskData;
}

/// A named, weighted unit of work registered against a [`User`](crate::User) type.
pub struct Task<U> {
    name: &'static str,
    weight: u32,
    func: TaskFn<U>,
}

impl<U> Task<U> {
    pub fn new(name: &'static str, func: TaskFn<U>) -> Self {
        Self {
            name,
            weight: 1,
            func,
        }
    }

    /// Relative likelihood of this task being picked. Defaults to 1.
    pub fn weight(mut self, weight: u32) -> Self {
        self.weight = weight;
        self
    }

    pub fn name(&self) -> &'static str {
        self.name
    }

    pub fn run<'a>(&self, user: &'a mut U, client: &'a HttpClient) -> TaskFuture<'a> {
        (self.func)(user, client)
    }
}

impl<U> Clone for Task<U> {
    fn clone(&self) -> Self {
        Self {
            name: self.name,
            weight: self.weight,
            func: self.func,
        }
    }
}

impl<U> fmt::Debug for Task<U> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Task")
            .field("name", &self.name)
            .field("weight", &self.weight)
            .finish()
    }
}

pub(crate) struct TaskSet<U> {
    tasks: Vec<Task<U>>,
    index: WeightedIndex<u32>,
}

impl<U> TaskSet<U> {
    pub fn new(tasks: Vec<Task<U>>) -> Result<Self, SwarmError> {
        if tasks.is_empty() {
            return Err(SwarmError::NoTasks);
        }

        if let Some(task) = tasks.iter().find(|t| t.weight == 0) {
            return Err(SwarmError::ZeroWeight(task.name));
        }

        if tasks
            .iter()
            .try_fold(0u32, |sum, t| sum.checked_add(t.weight))
            .is_none()
        {
            return Err(SwarmError::InvalidTaskWeights(WeightedError::InvalidWeight));
        }

        let index = WeightedIndex::new(tasks.iter().map(|t| t.weight))?;
        Ok(Self { tasks, index })
    }

    pub fn pick<R: Rng + ?Sized>(&self, rng: &mut R) -> &Task<U> {
        &self.tasks[self.index.sample(rng)]
    }

    pub fn len(&self) -> usize {
        self.tasks.len()
    }
}
