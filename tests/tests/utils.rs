use std::sync::{
    atomic::{AtomicUsize, Ordering},
    Arc, OnceLock,
};
use tokio::io::{AsyncBufReadExt, AsyncWriteExt, BufReader};
use tokio::net::{TcpListener, TcpStream};
use tracing::{debug, error};
use tracing_subscriber::{EnvFilter, FmtSubscriber};

#[allow(unused)]
pub fn init() {
    static ONCE_LOCK: OnceLock<()> = OnceLock::new();

    ONCE_LOCK.get_or_init(|| {
        let default_panic = std::panic::take_hook();
        std::panic::set_hook(Box::new(move |info| {
            default_panic(info);
            error!("Panic occurred: {info:?}");
        }));

        let _ = FmtSubscriber::builder()
            .with_env_filter(EnvFilter::new(
                "swarm=debug,website_user=debug,mock_service=debug",
            ))
            .with_test_writer()
            .try_init();
    });
}

/// Keep-alive HTTP endpoint that answers `ok` to everything and counts accepted connections.
#[allow(unused)]
pub struct ConnectionCounter {
    pub url: String,
    connections: Arc<AtomicUsize>,
    requests: Arc<AtomicUsize>,
}

#[allow(unused)]
impl ConnectionCounter {
    pub fn connections(&self) -> usize {
        self.connections.load(Ordering::Relaxed)
    }

    pub fn requests(&self) -> usize {
        self.requests.load(Ordering::Relaxed)
    }
}

#[allow(unused)]
pub async fn connection_counter() -> anyhow::Result<ConnectionCounter> {
    let listener = TcpListener::bind("127.0.0.1:0").await?;
    let url = format!("http://{}", listener.local_addr()?);
    let connections = Arc::new(AtomicUsize::new(0));
    let requests = Arc::new(AtomicUsize::new(0));

    let (conns, reqs) = (connections.clone(), requests.clone());
    tokio::spawn(async move {
        while let Ok((stream, _)) = listener.accept().await {
            conns.fetch_add(1, Ordering::Relaxed);
            let reqs = reqs.clone();
            tokio::spawn(async move {
                if let Err(err) = answer_ok(stream, reqs).await {
                    debug!("Connection closed: {err}");
                }
            });
        }
    });

    Ok(ConnectionCounter {
        url,
        connections,
        requests,
    })
}

#[allow(unused)]
async fn answer_ok(stream: TcpStream, requests: Arc<AtomicUsize>) -> anyhow::Result<()> {
    let (read, mut write) = stream.into_split();
    let mut lines = BufReader::new(read).lines();
    let mut in_request = false;

    while let Some(line) = lines.next_line().await? {
        if !line.is_empty() {
            in_request = true;
        } else if in_request {
            in_request = false;
            requests.fetch_add(1, Ordering::Relaxed);
            write
                .write_all(b"HTTP/1.1 200 OK\r\ncontent-length: 2\r\n\r\nok")
                .await?;
        }
    }
    Ok(())
}
