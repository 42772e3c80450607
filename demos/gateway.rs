//! An edge service that tags every request and forwards it downstream.
//!
//! ```text
//! TETHER_LOG_TAG=gateway TETHER_CENSORED_FIELDS=token cargo run --example gateway
//! curl -s -XPOST localhost:3000/orders -d '{"item":"book","token":"abc"}'
//! ```

use http::StatusCode;
use tether::middleware::{AccessLog, BindContext, CorrelationPolicy};
use tether::rpc::{RequireMetadata, RpcAccessLog, UnaryInterceptor, serve_unary};
use tether::{Config, IgnoreSet, LogSink, Request, Response, Router, Server, health, outbound};

const INVENTORY_URL: &str = "http://127.0.0.1:3001/reserve";

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::fmt::init();

    let config = Config::from_env()?;
    let app = Router::new()
        .layer(AccessLog::from_config(&config, LogSink::stdout()).ignore(IgnoreSet::probes()))
        .layer(CorrelationPolicy::composite())
        .layer(BindContext)
        .post("/orders", create_order)
        .get(health::LIVENESS_PATH, health::liveness)
        .get(health::READINESS_PATH, health::readiness);

    Server::bind("0.0.0.0:3000").serve(app).await?;
    Ok(())
}

async fn create_order(req: Request) -> Response {
    // Same id on the HTTP hop...
    let client = outbound::Client::new();
    let reserved = client
        .post(req.context(), INVENTORY_URL, Some("application/json"), req.body_bytes())
        .await
        .map(|res| res.status().is_success())
        .unwrap_or(false);

    // ...and on a gRPC hop, shown here against an in-process interceptor stack.
    let call = outbound::grpc_request(req.context(), serde_json::json!({ "reserved": reserved }));
    let interceptors = RequireMetadata.then(RpcAccessLog::new(LogSink::stdout()));
    let billed = serve_unary(&interceptors, "/billing.Billing/Charge", call, |_call| async {
        Ok(tonic::Response::new(()))
    })
    .await;

    match billed {
        Ok(_) => Response::status(StatusCode::ACCEPTED),
        Err(status) => Response::builder()
            .status(StatusCode::BAD_GATEWAY)
            .text(status.message().to_owned()),
    }
}
