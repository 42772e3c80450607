//! The access logger shared by the HTTP and gRPC paths.

use crate::censor::CensorPolicy;
use crate::config::Config;
use crate::format::{LogFormat, LogRecord};
use crate::sink::LogSink;

/// Renders [`LogRecord`]s and appends them to a [`LogSink`], censoring bodies
/// on the way. Immutable once built; clone it into each layer.
#[derive(Clone)]
pub struct AccessLogger {
    sink: LogSink,
    censor: CensorPolicy,
    format: LogFormat,
}

impl AccessLogger {
    /// Default denylist and tag.
    pub fn new(sink: LogSink) -> Self {
        Self { sink, censor: CensorPolicy::default(), format: LogFormat::default() }
    }

    pub fn from_config(config: &Config, sink: LogSink) -> Self {
        Self { sink, censor: config.censor_policy(), format: config.log_format() }
    }

    pub fn with_censor(mut self, censor: CensorPolicy) -> Self {
        self.censor = censor;
        self
    }

    pub fn with_format(mut self, format: LogFormat) -> Self {
        self.format = format;
        self
    }

    pub fn censor(&self) -> &CensorPolicy {
        &self.censor
    }

    pub fn format(&self) -> &LogFormat {
        &self.format
    }

    pub fn emit(&self, record: &LogRecord) {
        self.sink.write_line(&self.format.render(record));
    }
}
