use crate::atomics::RunAtomics;
use crate::client::HttpClient;
use crate::error::SwarmError;
use crate::task::{TaskSet, TASK_HOOK};
use crate::timer::Timer;
use crate::user::{run_user, User, UserContext};
use governor::{Quota, RateLimiter};
use std::num::NonZeroU32;
use std::sync::Arc;
use std::time::Duration;
use swarm_core::{RunConfig, RunStatistics, StatsTable};
use tokio::sync::watch;
use tokio::task::JoinSet;
use tokio::time::{sleep_until, Instant};
#[allow(unused_imports)]
use tracing::{debug, error, info, instrument, trace, warn};

#[instrument(name = "swarm", skip_all, fields(name = config.name))]
pub(crate) async fn run_swarm<U: User + Default>(
    config: RunConfig,
) -> Result<RunStatistics, SwarmError> {
    info!("Running {} with config {:?}", config.name, &config);

    let host = config.resolve_host(U::host()).ok_or(SwarmError::NoHost)?;
    let tasks = Arc::new(TaskSet::new(U::tasks())?);
    let wait_time = U::default().wait_time();
    wait_time.validate()?;
    if config.stats_interval.is_zero() {
        return Err(SwarmError::ZeroStatsInterval);
    }

    let mut atomics = RunAtomics::new();
    let client = HttpClient::with_events(&host, reqwest::Client::new(), atomics.events())
        .map_err(SwarmError::InvalidHost)?;

    debug!(
        "{} task(s) registered, waiting {} between tasks",
        tasks.len(),
        wait_time
    );

    let (stop_tx, stop_rx) = watch::channel(false);
    let spawner = RateLimiter::direct(
        Quota::per_second(config.spawn_rate).allow_burst(NonZeroU32::MIN),
    );
    let target = config.users.get();
    let mut users = JoinSet::new();
    let mut spawned = 0;

    let start = Instant::now();
    let deadline = config.run_time.map(|run_time| start + run_time);
    let mut timer = Timer::new(config.stats_interval).await;
    debug!("Logging stats every {timer}");

    loop {
        tokio::select! {
            _ = spawner.until_ready(), if spawned < target => {
                let ctx = UserContext {
                    id: spawned,
                    tasks: tasks.clone(),
                    client: client.fork(),
                    iterations: config.iterations,
                    stop: stop_rx.clone(),
                };
                users.spawn(TASK_HOOK.scope(atomics.clone_to_task_data(), run_user::<U>(ctx)));
                spawned += 1;

                if spawned == target {
                    info!("All {target} users spawned");
                } else {
                    debug!("Spawned {spawned}/{target} users");
                }
            }
            Some(res) = users.join_next(), if !users.is_empty() => {
                if let Err(err) = res {
                    error!("User task failed: {err}");
                }

                if spawned == target && users.is_empty() {
                    info!("All users stopped");
                    break;
                }
            }
            elapsed = timer.tick() => {
                let count = atomics.collect();
                trace!("Collected {count} request events over {elapsed:?}");
                log_table(atomics.table(), start.elapsed());
            }
            _ = run_time_reached(deadline) => {
                info!("Run time limit reached");
                break;
            }
        }
    }

    let _ = stop_tx.send(true);
    stop_users(&mut users, config.stop_timeout).await;

    let elapsed = start.elapsed();
    atomics.collect();

    let stats = RunStatistics::from_table(
        &config.name,
        spawned,
        elapsed,
        atomics.table(),
        atomics.task_runs(),
        atomics.task_failures(),
    );

    log_table(atomics.table(), elapsed);
    for err in &stats.errors {
        warn!(
            "{} {}: {} ({} occurrences)",
            err.method, err.name, err.error, err.occurrences
        );
    }

    if config.json {
        println!("{}", serde_json::to_string_pretty(&stats)?);
    }

    info!("Swarm complete");
    Ok(stats)
}

async fn run_time_reached(deadline: Option<Instant>) {
    match deadline {
        Some(deadline) => sleep_until(deadline).await,
        None => std::future::pending().await,
    }
}

/// Give running users `timeout` to return from `on_stop`, then abort the rest.
async fn stop_users(users: &mut JoinSet<()>, timeout: Duration) {
    if users.is_empty() {
        return;
    }

    debug!("Stopping {} users", users.len());
    let drained = tokio::time::timeout(timeout, async {
        while let Some(res) = users.join_next().await {
            if let Err(err) = res {
                error!("User task failed: {err}");
            }
        }
    })
    .await;

    if drained.is_err() {
        warn!(
            "{} users did not stop within {}. Aborting.",
            users.len(),
            humantime::format_duration(timeout)
        );
        users.abort_all();
        while users.join_next().await.is_some() {}
    }
}

fn log_table(table: &StatsTable, elapsed: Duration) {
    for entry in table.entries_snapshot(elapsed) {
        info!("{entry}");
    }
    info!("{}", table.total().snapshot(elapsed));
}
