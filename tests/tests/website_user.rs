mod utils;
use utils::*;

use std::num::{NonZeroU32, NonZeroU64, NonZeroUsize};
use std::time::Duration;
use swarm::prelude::*;
use website_user::WebsiteUser;

#[tokio::test]
#[ntest::timeout(60_000)]
async fn one_user_issues_one_root_get_per_iteration() {
    init();
    let service = mock_service::spawn().await.unwrap();

    let stats = WebsiteUser::swarm()
        .host(&service.url())
        .iterations(NonZeroU64::new(4).unwrap())
        .await
        .unwrap();

    let hits = service.hits();
    assert_eq!(hits.len(), 4);
    assert!(hits.iter().all(|hit| hit.method == "GET" && hit.path == "/"));

    // Each gap is the wait time plus the latency of a local request.
    for pair in hits.windows(2) {
        let gap = pair[1].at - pair[0].at;
        assert!(gap >= Duration::from_secs(1), "{gap:?}");
        assert!(gap <= Duration::from_millis(5_500), "{gap:?}");
    }

    assert_eq!(stats.user_count, 1);
    assert_eq!(stats.task_runs, 4);
    assert_eq!(stats.task_failures, 0);
    assert_eq!(stats.total.num_requests, 4);
    assert_eq!(stats.total.num_failures, 0);
    assert_eq!(stats.exit_code(), 0);

    let root = stats.entry("GET", "/").unwrap();
    assert_eq!(root.num_requests, 4);
    assert_eq!(root.avg_content_length, 2);
}

#[tokio::test]
#[ntest::timeout(60_000)]
async fn run_time_bounds_several_users() {
    init();
    let service = mock_service::spawn().await.unwrap();

    let stats = WebsiteUser::swarm()
        .host(&service.url())
        .users(NonZeroUsize::new(3).unwrap())
        .spawn_rate(NonZeroU32::new(10).unwrap())
        .run_time(Duration::from_secs(3))
        .stop_timeout(Duration::from_secs(1))
        .await
        .unwrap();

    let hits = service.hits();
    // Every user visits once on start, and at most once more per second after that.
    assert!(hits.len() >= 3 && hits.len() <= 9, "{}", hits.len());
    assert_eq!(stats.user_count, 3);
    // A request cut off by the stop signal reaches the service but is never recorded.
    assert!(stats.total.num_requests <= hits.len() as u64);
    assert!(stats.total.num_requests >= 3);
    assert!(stats.elapsed >= Duration::from_secs(3));
}

#[tokio::test]
#[ntest::timeout(30_000)]
async fn unreachable_host_counts_failures() {
    init();

    let stats = WebsiteUser::swarm()
        .host("http://127.0.0.1:9")
        .iterations(NonZeroU64::new(1).unwrap())
        .json()
        .await
        .unwrap();

    assert_eq!(stats.total.num_requests, 1);
    assert_eq!(stats.total.num_failures, 1);
    assert_eq!(stats.task_failures, 1);
    assert_eq!(stats.errors.len(), 1);
    assert_eq!(stats.errors[0].name, "/");
    assert_eq!(stats.exit_code(), 1);

    let json = serde_json::to_value(&stats).unwrap();
    assert_eq!(json["total"]["num_failures"], 1);
}
