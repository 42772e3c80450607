//! One access-log line per HTTP request.

use std::sync::Arc;
use std::time::Instant;

use chrono::Local;

use super::{Middleware, Next};
use crate::censor::CensorPolicy;
use crate::config::Config;
use crate::correlation::{CORRELATION_ID_HEADER, is_blank};
use crate::format::{LogFormat, LogRecord, http_operation};
use crate::handler::BoxFuture;
use crate::ignore::IgnoreSet;
use crate::logger::AccessLogger;
use crate::request::{Request, RequestHead};
use crate::response::Response;
use crate::sink::LogSink;

/// Logs every request whose path is not in the ignore set, after the rest of
/// the pipeline has produced the final response.
///
/// Latency spans everything registered after this layer plus the handler, so
/// register it first. The line is written before the response is returned
/// to the server, so it never races the next request on the connection.
///
/// The correlation column shows the request's `X-Correlation-ID`; when the
/// request had none, the value a downstream
/// [`CorrelationPolicy`](super::CorrelationPolicy) put on the response; else
/// it is empty.
#[derive(Clone)]
pub struct AccessLog {
    logger: Arc<AccessLogger>,
    ignore: IgnoreSet,
}

impl AccessLog {
    pub fn new(sink: LogSink) -> Self {
        Self::with_logger(AccessLogger::new(sink))
    }

    pub fn with_logger(logger: AccessLogger) -> Self {
        Self { logger: Arc::new(logger), ignore: IgnoreSet::default() }
    }

    /// Censor policy, tag and ignored paths from `config`.
    pub fn from_config(config: &Config, sink: LogSink) -> Self {
        Self::with_logger(AccessLogger::from_config(config, sink)).ignore(config.ignore_set())
    }

    pub fn ignore(mut self, ignore: IgnoreSet) -> Self {
        self.ignore = ignore;
        self
    }

    pub fn censor(mut self, censor: CensorPolicy) -> Self {
        let logger = AccessLogger::clone(&self.logger).with_censor(censor);
        self.logger = Arc::new(logger);
        self
    }

    pub fn format(mut self, format: LogFormat) -> Self {
        let logger = AccessLogger::clone(&self.logger).with_format(format);
        self.logger = Arc::new(logger);
        self
    }
}

impl Middleware for AccessLog {
    fn handle(&self, req: Request, next: Next) -> BoxFuture {
        if self.ignore.contains(req.path()) {
            return next.run(req);
        }

        let start = Instant::now();
        let head = Arc::clone(req.head());
        let body = req.body_bytes();
        let logger = Arc::clone(&self.logger);

        Box::pin(async move {
            let res = next.run(req).await;
            let latency = start.elapsed();

            let record = LogRecord {
                event_time: Local::now(),
                correlation_id: correlation_column(&head, &res),
                status: res.status_code().as_u16().to_string(),
                latency,
                client_address: head.client_ip().unwrap_or_default(),
                operation: http_operation(head.method().as_str(), &head.path_and_query()),
                body: logger.censor().summarize_body(&body),
            };
            logger.emit(&record);
            res
        })
    }
}

fn correlation_column(head: &RequestHead, res: &Response) -> String {
    [head.header(CORRELATION_ID_HEADER), res.header(CORRELATION_ID_HEADER)]
        .into_iter()
        .flatten()
        .find(|v| !is_blank(v))
        .unwrap_or_default()
        .to_owned()
}
