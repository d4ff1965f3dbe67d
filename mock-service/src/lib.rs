use axum::{
    debug_handler,
    extract::{Path, Request, State},
    http::StatusCode,
    middleware::{self, Next},
    response::Response,
    routing::get,
    Router,
};
use std::net::SocketAddr;
use std::sync::{
    atomic::{AtomicU64, Ordering},
    Arc, Mutex,
};
use std::time::Duration;
use tokio::net::TcpListener;
use tokio::time::Instant;
use tower_http::trace::TraceLayer;
use tracing::debug;

/// A request received by the mock service.
#[derive(Debug, Clone)]
pub struct Hit {
    pub method: String,
    pub path: String,
    pub at: Instant,
}

#[derive(Debug, Clone, Default)]
pub struct Hits(Arc<Mutex<Vec<Hit>>>);

impl Hits {
    fn push(&self, hit: Hit) {
        self.0.lock().unwrap_or_else(|e| e.into_inner()).push(hit);
    }

    pub fn snapshot(&self) -> Vec<Hit> {
        self.0.lock().unwrap_or_else(|e| e.into_inner()).clone()
    }
}

/// A mock service listening on a random local port.
pub struct MockService {
    addr: SocketAddr,
    hits: Hits,
}

impl MockService {
    pub fn addr(&self) -> SocketAddr {
        self.addr
    }

    /// Base URL, without a trailing slash.
    pub fn url(&self) -> String {
        format!("http://{}", self.addr)
    }

    pub fn hits(&self) -> Vec<Hit> {
        self.hits.snapshot()
    }
}

/// Bind to an ephemeral port on localhost and serve in the background.
pub async fn spawn() -> anyhow::Result<MockService> {
    let listener = TcpListener::bind("127.0.0.1:0").await?;
    let addr = listener.local_addr()?;
    let hits = Hits::default();
    let app = router(hits.clone());

    tokio::spawn(async move {
        if let Err(err) = axum::serve(listener, app).await {
            tracing::error!("Mock service stopped: {err}");
        }
    });

    debug!("Mock service listening on {addr}");
    Ok(MockService { addr, hits })
}

pub async fn run(addr: SocketAddr) -> anyhow::Result<()> {
    let listener = TcpListener::bind(&addr).await?;
    axum::serve(listener, router(Hits::default())).await?;
    Ok(())
}

pub fn router(hits: Hits) -> Router {
    Router::new()
        .route("/", get(index).post(index))
        .route("/status/:code", get(status))
        .route("/delay/ms/:delay_ms", get(delay))
        .layer(middleware::from_fn_with_state(hits, record))
        .layer(TraceLayer::new_for_http())
}

async fn record(State(hits): State<Hits>, req: Request, next: Next) -> Response {
    TPS_MEASURE.fetch_add(1, Ordering::Relaxed);
    hits.push(Hit {
        method: req.method().to_string(),
        path: req.uri().path().to_string(),
        at: Instant::now(),
    });
    next.run(req).await
}

#[debug_handler]
async fn index() -> &'static str {
    "ok"
}

#[debug_handler]
async fn status(Path(code): Path<u16>) -> StatusCode {
    StatusCode::from_u16(code).unwrap_or(StatusCode::BAD_REQUEST)
}

#[debug_handler]
async fn delay(Path(delay_ms): Path<u64>) {
    tokio::time::sleep(Duration::from_millis(delay_ms)).await;
}

/** TPS Printer **/

static TPS_MEASURE: AtomicU64 = AtomicU64::new(0);

pub async fn tps_measure_task() {
    loop {
        tokio::time::sleep(Duration::from_millis(1000)).await;
        let requests = TPS_MEASURE.swap(0, Ordering::Relaxed);
        println!("{requests} TPS");
    }
}
