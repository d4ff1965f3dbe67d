//! The [`User`] trait and the loop every simulated user runs.
use crate::client::HttpClient;
use crate::launch::Swarm;
use crate::task::{Task, TaskError, TaskFuture, TaskResult, TaskSet};
use rand::rngs::SmallRng;
use rand::SeedableRng;
use std::future::Future;
use std::num::NonZeroU64;
use std::sync::Arc;
use swarm_core::WaitTime;
use tokio::sync::watch;
use tokio::time::Instant;
#[allow(unused_imports)]
use tracing::{debug, error, info, instrument, trace, warn};

/// Behavior of one simulated user.
///
/// The engine creates one instance per simulated user (through `Default`), runs
/// [`User::on_start`], then repeatedly picks one of [`User::tasks`], runs it and sleeps for
/// [`User::wait_time`], and finally runs [`User::on_stop`].
///
/// # Example
/// ```no_run
/// use swarm::prelude::*;
///
/// #[derive(Default)]
/// struct Visitor;
///
/// impl Visitor {
///     #[task]
///     async fn home(&mut self, client: &HttpClient) -> TaskResult {
///         client.get("/").await?;
///         Ok(())
///     }
/// }
///
/// impl User for Visitor {
///     fn wait_time(&self) -> WaitTime {
///         between(1., 5.)
///     }
///
///     fn tasks() -> Vec<Task<Self>> {
///         vec![Task::new("home", Self::home)]
///     }
/// }
///
/// #[tokio::main]
/// async fn main() -> Result<(), SwarmError> {
///     Visitor::swarm().with_args().await?;
///     Ok(())
/// }
/// ```
pub trait User: Send + Sized + 'static {
    fn wait_time(&self) -> WaitTime;

    fn tasks() -> Vec<Task<Self>>;

    /// Host used when none is given on the command line.
    fn host() -> Option<String> {
        None
    }

    fn on_start<'a>(&'a mut self, _client: &'a HttpClient) -> TaskFuture<'a> {
        Box::pin(async { TaskResult::Ok(()) })
    }

    fn on_stop<'a>(&'a mut self, _client: &'a HttpClient) -> TaskFuture<'a> {
        Box::pin(async { TaskResult::Ok(()) })
    }

    fn swarm() -> Swarm<Self>
    where
        Self: Default,
    {
        Swarm::new()
    }
}

pub(crate) struct UserContext<U> {
    pub id: usize,
    pub tasks: Arc<TaskSet<U>>,
    pub client: HttpClient,
    pub iterations: Option<NonZeroU64>,
    pub stop: watch::Receiver<bool>,
}

#[instrument(name = "user", skip_all, fields(id = ctx.id))]
pub(crate) async fn run_user<U: User + Default>(ctx: UserContext<U>) {
    let UserContext {
        tasks,
        client,
        iterations,
        mut stop,
        ..
    } = ctx;

    let mut user = U::default();
    let mut rng = SmallRng::from_entropy();
    debug!("User started");

    match until_stopped(&mut stop, user.on_start(&client)).await {
        None => return,
        Some(Err(TaskError::StopUser)) => {
            finish(&mut user, &client).await;
            return;
        }
        Some(Err(err)) => warn!("on_start failed: {err}"),
        Some(Ok(())) => {}
    }

    let mut count: u64 = 0;
    loop {
        let task = tasks.pick(&mut rng);
        trace!("Running task {}", task.name());

        let start = Instant::now();
        let res = until_stopped(&mut stop, task.run(&mut user, &client)).await;
        let task_elapsed = start.elapsed();

        match res {
            None => break,
            Some(Err(TaskError::StopUser)) => {
                debug!("Task {} stopped the user", task.name());
                break;
            }
            Some(Err(err)) => debug!("Task {} failed: {err}", task.name()),
            Some(Ok(())) => {}
        }

        count += 1;
        if iterations.is_some_and(|max| count >= max.get()) {
            debug!("Finished {count} iterations");
            break;
        }

        let wait = user.wait_time().sample(&mut rng, task_elapsed);
        trace!("Waiting {}", humantime::format_duration(wait));
        if until_stopped(&mut stop, tokio::time::sleep(wait))
            .await
            .is_none()
        {
            break;
        }
    }

    finish(&mut user, &client).await;
}

async fn finish<U: User>(user: &mut U, client: &HttpClient) {
    if let Err(err) = user.on_stop(client).await {
        warn!("on_stop failed: {err}");
    }
    debug!("User stopped");
}

/// Run `fut` unless the swarm is told to stop first.
async fn until_stopped<T>(
    stop: &mut watch::Receiver<bool>,
    fut: impl Future<Output = T>,
) -> Option<T> {
    if *stop.borrow() {
        return None;
    }

    tokio::select! {
        biased;
        _ = stop.changed() => None,
        res = fut => Some(res),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::atomics::RunAtomics;
    use crate::task::TASK_HOOK;
    use std::sync::atomic::{AtomicBool, Ordering};
    use std::time::Duration;
    use swarm_core::constant;

    #[derive(Default)]
    struct Counter;

    impl Counter {
        #[crate::task]
        async fn count(&mut self, _client: &HttpClient) -> TaskResult {
            Ok(())
        }
    }

    impl User for Counter {
        fn wait_time(&self) -> WaitTime {
            constant(1.)
        }

        fn tasks() -> Vec<Task<Self>> {
            vec![Task::new("count", Self::count)]
        }
    }

    fn context<U: User>(iterations: u64) -> (UserContext<U>, watch::Sender<bool>) {
        let (tx, stop) = watch::channel(false);
        let ctx = UserContext {
            id: 0,
            tasks: Arc::new(TaskSet::new(U::tasks()).unwrap()),
            client: HttpClient::new("http://example.test").unwrap(),
            iterations: NonZeroU64::new(iterations),
            stop,
        };
        (ctx, tx)
    }

    #[tokio::test(start_paused = true)]
    async fn runs_iteration_budget_with_waits() {
        let (ctx, _tx) = context::<Counter>(3);
        let atomics = RunAtomics::new();

        let start = Instant::now();
        TASK_HOOK
            .scope(atomics.clone_to_task_data(), run_user::<Counter>(ctx))
            .await;

        assert_eq!(atomics.task_runs(), 3);
        // No wait after the final iteration.
        let elapsed = start.elapsed();
        assert!(elapsed >= Duration::from_secs(2) && elapsed < Duration::from_secs(3));
    }

    #[tokio::test(start_paused = true)]
    async fn stop_interrupts_wait() {
        let (ctx, tx) = context::<Counter>(0);
        let handle = tokio::spawn(run_user::<Counter>(ctx));

        tokio::time::sleep(Duration::from_millis(1_500)).await;
        tx.send(true).unwrap();

        tokio::time::timeout(Duration::from_millis(10), handle)
            .await
            .expect("user did not stop")
            .unwrap();
    }

    static QUITTER_STOPPED: AtomicBool = AtomicBool::new(false);

    #[derive(Default)]
    struct Quitter;

    impl Quitter {
        #[crate::task]
        async fn quit(&mut self, _client: &HttpClient) -> TaskResult {
            Err(TaskError::StopUser)
        }
    }

    impl User for Quitter {
        fn wait_time(&self) -> WaitTime {
            constant(0.)
        }

        fn tasks() -> Vec<Task<Self>> {
            vec![Task::new("quit", Self::quit)]
        }

        fn on_stop<'a>(&'a mut self, _client: &'a HttpClient) -> TaskFuture<'a> {
            Box::pin(async move {
                QUITTER_STOPPED.store(true, Ordering::Relaxed);
                TaskResult::Ok(())
            })
        }
    }

    #[tokio::test]
    async fn stop_user_ends_only_this_user() {
        let (ctx, _tx) = context::<Quitter>(0);
        let atomics = RunAtomics::new();

        TASK_HOOK
            .scope(atomics.clone_to_task_data(), run_user::<Quitter>(ctx))
            .await;

        assert_eq!(atomics.task_runs(), 1);
        assert_eq!(atomics.task_failures(), 0);
        assert!(QUITTER_STOPPED.load(Ordering::Relaxed));
    }
}
