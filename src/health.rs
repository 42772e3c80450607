//! Built-in Kubernetes health-check handlers.
//!
//! | Probe | Path | Question |
//! |---|---|---|
//! | **Liveness** | `/healthz` | Is the process alive? Failure → restart. |
//! | **Readiness** | `/readyz` | Can the pod serve traffic? Failure → pulled from load-balancer. |
//!
//! Probes fire every few seconds and would drown the access log, so
//! [`IgnoreSet::probes`](crate::IgnoreSet::probes) lists both paths:
//!
//! ```rust,no_run
//! use tether::{health, middleware::AccessLog, IgnoreSet, LogSink, Router};
//!
//! let app = Router::new()
//!     .layer(AccessLog::new(LogSink::stdout()).ignore(IgnoreSet::probes()))
//!     .get(health::LIVENESS_PATH, health::liveness)
//!     .get(health::READINESS_PATH, health::readiness);
//! ```

use crate::{Request, Response};

pub const LIVENESS_PATH: &str = "/healthz";
pub const READINESS_PATH: &str = "/readyz";

/// Liveness probe handler. Always `200 OK` with body `"ok"`.
pub async fn liveness(_req: Request) -> Response {
    Response::text("ok")
}

/// Readiness probe handler (default implementation).
///
/// Returns `200 OK` with body `"ready"`. Replace it with your own handler if
/// readiness depends on downstream services.
pub async fn readiness(_req: Request) -> Response {
    Response::text("ready")
}
