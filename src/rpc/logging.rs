//! Access logging for unary gRPC calls.

use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Instant;

use chrono::Local;
use serde::Serialize;
use serde_json::Value;
use tonic::metadata::MetadataMap;
use tonic::{Code, Request};

use super::{BackgroundLogger, RpcFuture, UnaryInfo, UnaryInterceptor, UnaryNext, code_name};
use crate::censor::CensorPolicy;
use crate::config::{Config, DEFAULT_MAX_PENDING_LOGS};
use crate::correlation::{CORRELATION_ID_METADATA_KEY, is_blank};
use crate::format::{LogFormat, LogRecord};
use crate::ignore::IgnoreSet;
use crate::logger::AccessLogger;
use crate::sink::LogSink;

const MISSING: &str = "-";

/// One access-log line per unary call, written in the background.
///
/// The handler takes ownership of the message, so it is converted to a
/// `serde_json::Value` on the call path just before the handler runs. That
/// conversion is the only logging work the caller waits for. Censoring,
/// rendering and the write happen on the blocking pool after the handler
/// returns. Ignored methods are neither converted nor logged.
///
/// Columns: correlation id from `x-correlation-id` metadata (`-` if absent),
/// the status code name, the peer address as `ip:port` (`-` if unknown), the
/// full method name and the censored request message.
#[derive(Clone)]
pub struct RpcAccessLog {
    logger: Arc<AccessLogger>,
    ignore: IgnoreSet,
    background: BackgroundLogger,
}

impl RpcAccessLog {
    pub fn new(sink: LogSink) -> Self {
        Self::with_logger(AccessLogger::new(sink))
    }

    pub fn with_logger(logger: AccessLogger) -> Self {
        Self {
            logger: Arc::new(logger),
            ignore: IgnoreSet::default(),
            background: BackgroundLogger::new(DEFAULT_MAX_PENDING_LOGS),
        }
    }

    pub fn from_config(config: &Config, sink: LogSink) -> Self {
        Self::with_logger(AccessLogger::from_config(config, sink))
            .ignore(config.ignore_set())
            .max_pending(config.max_pending_logs)
    }

    /// Full method names to skip, e.g. `/grpc.health.v1.Health/Check`.
    pub fn ignore(mut self, ignore: IgnoreSet) -> Self {
        self.ignore = ignore;
        self
    }

    pub fn censor(mut self, censor: CensorPolicy) -> Self {
        self.logger = Arc::new(AccessLogger::clone(&self.logger).with_censor(censor));
        self
    }

    pub fn format(mut self, format: LogFormat) -> Self {
        self.logger = Arc::new(AccessLogger::clone(&self.logger).with_format(format));
        self
    }

    pub fn max_pending(mut self, capacity: usize) -> Self {
        self.background = BackgroundLogger::new(capacity);
        self
    }

    pub fn background(&self) -> &BackgroundLogger {
        &self.background
    }

    /// Waits for every scheduled line to be written.
    pub async fn drain(&self) {
        self.background.drain().await;
    }
}

impl UnaryInterceptor for RpcAccessLog {
    fn intercept<'a, T, R>(
        &'a self,
        info: &'a UnaryInfo,
        req: Request<T>,
        next: UnaryNext<'a, T, R>,
    ) -> RpcFuture<'a, R>
    where
        T: Serialize + Send + 'a,
        R: Send + 'a,
    {
        if self.ignore.contains(info.full_method()) {
            return next.run(req);
        }

        Box::pin(async move {
            let start = Instant::now();
            let snapshot = Snapshot::take(&req);

            let result = next.run(req).await;
            let latency = start.elapsed();
            let code = match &result {
                Ok(_) => Code::Ok,
                Err(status) => status.code(),
            };

            let logger = Arc::clone(&self.logger);
            let operation = info.full_method().to_owned();
            self.background.spawn(move || {
                let record = LogRecord {
                    event_time: Local::now(),
                    correlation_id: snapshot.correlation_id(),
                    status: code_name(code).to_owned(),
                    latency,
                    client_address: snapshot.client_address(),
                    operation,
                    body: snapshot.body(logger.censor()),
                };
                logger.emit(&record);
            });

            result
        })
    }
}

/// What the log line needs from the request, captured before the handler
/// takes ownership of it.
struct Snapshot {
    metadata: MetadataMap,
    remote_addr: Option<SocketAddr>,
    message: Result<Value, serde_json::Error>,
}

impl Snapshot {
    fn take<T: Serialize>(req: &Request<T>) -> Self {
        Self {
            metadata: req.metadata().clone(),
            remote_addr: req.remote_addr(),
            message: serde_json::to_value(req.get_ref()),
        }
    }

    fn correlation_id(&self) -> String {
        self.metadata
            .get(CORRELATION_ID_METADATA_KEY)
            .and_then(|v| v.to_str().ok())
            .filter(|v| !is_blank(v))
            .unwrap_or(MISSING)
            .to_owned()
    }

    fn client_address(&self) -> String {
        client_column(self.remote_addr)
    }

    fn body(self, censor: &CensorPolicy) -> String {
        match self.message {
            Ok(value) => censor.summarize_value(value),
            Err(e) => {
                tracing::debug!(error = %e, "rpc message is not serializable");
                MISSING.to_owned()
            }
        }
    }
}

fn client_column(remote_addr: Option<SocketAddr>) -> String {
    remote_addr.map_or_else(|| MISSING.to_owned(), |addr| addr.to_string())
}
