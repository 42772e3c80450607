//! Many requests and calls sharing one sink.

use std::collections::HashSet;
use std::sync::Arc;

use http::{Method, StatusCode};
use tether::middleware::{AccessLog, CorrelationPolicy};
use tether::rpc::{RpcAccessLog, serve_unary};
use tether::{CORRELATION_ID_METADATA_KEY, IgnoreSet, LogSink, Request, Router, health};

fn columns(line: &str) -> Vec<&str> {
    let cols: Vec<&str> = line.splitn(7, '|').map(str::trim).collect();
    assert_eq!(cols.len(), 7, "torn line: {line:?}");
    cols
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn concurrent_http_requests_get_whole_lines_and_distinct_ids() {
    let (sink, buffer) = LogSink::memory();
    let app = Arc::new(
        Router::new()
            .layer(AccessLog::new(sink).ignore(IgnoreSet::probes()))
            .layer(CorrelationPolicy::composite())
            .post("/orders", |_req: Request| async { StatusCode::CREATED })
            .get(health::LIVENESS_PATH, health::liveness),
    );

    let mut tasks = Vec::new();
    for i in 0..64 {
        let app = Arc::clone(&app);
        tasks.push(tokio::spawn(async move {
            let order = Request::builder()
                .method(Method::POST)
                .uri("/orders")
                .body(format!(r#"{{"n":{i},"password":"p{i}"}}"#))
                .build();
            let res = app.handle(order).await;
            assert_eq!(res.status_code(), StatusCode::CREATED);

            let probe = app.handle(Request::builder().uri(health::LIVENESS_PATH).build()).await;
            assert_eq!(probe.status_code(), StatusCode::OK);
        }));
    }
    for task in tasks {
        task.await.unwrap();
    }

    let lines = buffer.lines();
    assert_eq!(lines.len(), 64, "probes must not be logged");

    let mut ids = HashSet::new();
    for line in &lines {
        let cols = columns(line);
        assert!(cols[0].starts_with("[tether]"));
        assert_eq!(cols[2], "201");
        assert_eq!(cols[5], "POST    /orders");
        assert!(cols[6].contains(r#""password":"[HIDDEN_FIELD]""#), "{line}");
        ids.insert(cols[1].to_owned());
    }
    assert_eq!(ids.len(), 64);
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn concurrent_rpc_calls_are_all_logged_after_drain() {
    let (sink, buffer) = LogSink::memory();
    let log = Arc::new(RpcAccessLog::new(sink).ignore(IgnoreSet::new(["/grpc.health.v1.Health/Check"])));

    let mut tasks = Vec::new();
    for i in 0..32 {
        let log = Arc::clone(&log);
        tasks.push(tokio::spawn(async move {
            let mut req = tonic::Request::new(serde_json::json!({ "n": i }));
            req.metadata_mut()
                .insert(CORRELATION_ID_METADATA_KEY, format!("call-{i}").parse().unwrap());
            serve_unary(&log, "/orders.Orders/Get", req, |_req| async {
                Ok(tonic::Response::new(()))
            })
            .await
            .unwrap();

            serve_unary(&log, "/grpc.health.v1.Health/Check", tonic::Request::new(()), |_req| async {
                Ok(tonic::Response::new(()))
            })
            .await
            .unwrap();
        }));
    }
    for task in tasks {
        task.await.unwrap();
    }
    log.drain().await;

    let lines = buffer.lines();
    assert_eq!(lines.len(), 32);
    let ids: HashSet<String> = lines.iter().map(|l| columns(l)[1].to_owned()).collect();
    assert_eq!(ids.len(), 32);
    assert!(lines.iter().all(|l| columns(l)[2] == "OK"));
    assert_eq!(log.background().dropped(), 0);
}
