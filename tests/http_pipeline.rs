//! End-to-end: a real server, a real client, and a downstream hop.

use http::StatusCode;
use tether::middleware::{AccessLog, BindContext, CorrelationPolicy};
use tether::{CORRELATION_ID_HEADER, Error, LogSink, MemoryBuffer, Request, Router, Server, outbound};
use tokio::net::TcpListener;
use tokio::sync::oneshot;
use tokio::task::JoinHandle;

struct Running {
    base: String,
    stop: oneshot::Sender<()>,
    task: JoinHandle<Result<(), Error>>,
}

impl Running {
    async fn start(router: Router) -> Self {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let base = format!("http://{}", listener.local_addr().unwrap());
        let (stop, stopped) = oneshot::channel::<()>();
        let task = tokio::spawn(Server::from_listener(listener).serve_with_shutdown(router, async {
            let _ = stopped.await;
        }));
        Self { base, stop, task }
    }

    async fn shutdown(self) {
        let _ = self.stop.send(());
        self.task.await.unwrap().unwrap();
    }
}

/// Idle pooled connections would hold graceful shutdown open.
fn http_client() -> reqwest::Client {
    reqwest::Client::builder().pool_max_idle_per_host(0).build().unwrap()
}

/// Replies with the correlation id it was called with.
fn downstream() -> Router {
    Router::new().get("/echo", |req: Request| async move {
        req.header(CORRELATION_ID_HEADER).unwrap_or("none").to_owned()
    })
}

/// Composite edge that forwards `/proxy` to `downstream_base`.
fn edge(sink: LogSink, downstream_base: String) -> Router {
    let url = format!("{downstream_base}/echo");
    Router::new()
        .layer(AccessLog::new(sink))
        .layer(CorrelationPolicy::composite())
        .layer(BindContext)
        .get("/proxy", move |req: Request| {
            let url = url.clone();
            async move {
                let client = outbound::Client::with_client(http_client());
                match client.get(req.context(), &url).await {
                    Ok(res) => res.text().await.unwrap_or_default(),
                    Err(e) => format!("error: {e}"),
                }
            }
        })
}

fn correlation_column(buffer: &MemoryBuffer) -> String {
    let lines = buffer.lines();
    assert_eq!(lines.len(), 1, "expected one line, got {lines:?}");
    lines[0].split('|').nth(1).unwrap().trim().to_owned()
}

#[tokio::test]
async fn generated_id_is_echoed_logged_and_propagated() {
    let down = Running::start(downstream()).await;
    let (sink, buffer) = LogSink::memory();
    let up = Running::start(edge(sink, down.base.clone())).await;

    let res = http_client().get(format!("{}/proxy", up.base)).send().await.unwrap();
    assert_eq!(res.status(), StatusCode::OK);
    let id = res.headers()[CORRELATION_ID_HEADER].to_str().unwrap().to_owned();
    assert!(uuid::Uuid::parse_str(&id).is_ok(), "not a uuid: {id}");

    let seen_downstream = res.text().await.unwrap();
    assert_eq!(seen_downstream, id);
    assert_eq!(correlation_column(&buffer), id);

    up.shutdown().await;
    down.shutdown().await;
}

#[tokio::test]
async fn caller_id_is_kept_end_to_end() {
    let down = Running::start(downstream()).await;
    let (sink, buffer) = LogSink::memory();
    let up = Running::start(edge(sink, down.base.clone())).await;

    let res = http_client()
        .get(format!("{}/proxy", up.base))
        .header(CORRELATION_ID_HEADER, "caller-42")
        .send()
        .await
        .unwrap();
    assert_eq!(res.headers()[CORRELATION_ID_HEADER], "caller-42");
    assert_eq!(res.text().await.unwrap(), "caller-42");

    let line = &buffer.lines()[0];
    assert!(line.contains("| caller-42 |"), "{line}");
    assert!(line.contains(" 127.0.0.1 |"), "{line}");

    up.shutdown().await;
    down.shutdown().await;
}

#[tokio::test]
async fn strict_edge_rejects_over_the_wire() {
    let (sink, buffer) = LogSink::memory();
    let app = Router::new()
        .layer(AccessLog::new(sink))
        .layer(CorrelationPolicy::strict())
        .get("/private", |_req: Request| async { "secret" });
    let server = Running::start(app).await;

    let res = http_client().get(format!("{}/private", server.base)).send().await.unwrap();
    assert_eq!(res.status(), StatusCode::BAD_REQUEST);
    let body: serde_json::Value = serde_json::from_slice(&res.bytes().await.unwrap()).unwrap();
    assert_eq!(body, serde_json::json!({"status":"fail","message":"X-Correlation-ID is missing"}));

    let line = &buffer.lines()[0];
    assert!(line.contains("| 400 |"), "{line}");

    server.shutdown().await;
}
