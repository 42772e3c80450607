//! Configuration for the logging layers.
//!
//! Values are plain data, read once at startup and turned into the immutable
//! [`CensorPolicy`], [`IgnoreSet`] and [`LogFormat`] handed to each layer.
//!
//! | Variable | Default | Meaning |
//! |---|---|---|
//! | `TETHER_LOG_TAG` | `tether` | bracketed tag opening every line |
//! | `TETHER_CENSORED_FIELDS` | *(none)* | comma list appended to the default denylist |
//! | `TETHER_IGNORED_OPERATIONS` | *(none)* | comma list of paths / gRPC methods not logged |
//! | `TETHER_MAX_PENDING_LOGS` | `1024` | cap on in-flight background RPC log writes |

use serde::Deserialize;

use crate::censor::CensorPolicy;
use crate::format::{DEFAULT_TAG, LogFormat};
use crate::ignore::IgnoreSet;

pub const ENV_PREFIX: &str = "TETHER_";

pub const DEFAULT_MAX_PENDING_LOGS: usize = 1024;

#[derive(Clone, Debug, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct Config {
    pub log_tag: String,
    pub censored_fields: Vec<String>,
    pub ignored_operations: Vec<String>,
    pub max_pending_logs: usize,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            log_tag: DEFAULT_TAG.to_owned(),
            censored_fields: Vec::new(),
            ignored_operations: Vec::new(),
            max_pending_logs: DEFAULT_MAX_PENDING_LOGS,
        }
    }
}

impl Config {
    /// Reads `TETHER_*` variables from the process environment.
    pub fn from_env() -> Result<Self, envy::Error> {
        Self::from_vars(std::env::vars())
    }

    /// Reads `TETHER_*` entries from any key/value source.
    pub fn from_vars<I>(vars: I) -> Result<Self, envy::Error>
    where
        I: IntoIterator<Item = (String, String)>,
    {
        envy::prefixed(ENV_PREFIX).from_iter(vars)
    }

    /// The default denylist extended with `censored_fields`.
    pub fn censor_policy(&self) -> CensorPolicy {
        CensorPolicy::default().extend(&self.censored_fields)
    }

    pub fn ignore_set(&self) -> IgnoreSet {
        IgnoreSet::new(self.ignored_operations.iter().cloned())
    }

    pub fn log_format(&self) -> LogFormat {
        LogFormat::new(self.log_tag.clone())
    }
}
