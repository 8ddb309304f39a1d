//! # Docket configuration
//!
//! A string key/value store with typed views on top. Keys are dotted
//! (`poll.max_attempts`, `s3.bucket`) and can be overridden from the
//! environment:
//!
//! ```rust
//! use docket_core::DocketConfig;
//!
//! let mut config = DocketConfig::new();
//! config.set("poll.max_attempts", "4");
//!
//! let poll = config.snapshot().poll_settings().unwrap();
//! assert_eq!(poll.max_attempts, 4);
//! ```
//!
//! `DOCKET__POLL__MAX_ATTEMPTS=4` has the same effect once
//! [`DocketConfig::load_env`] runs with prefix `DOCKET__`.

use std::collections::HashMap;
use std::time::Duration;

use crate::errors::{DocketError, DocketResult};
use crate::keys::UPLOAD_PREFIX;

pub const DEFAULT_WRITE_EXPIRY: Duration = Duration::from_secs(300);
pub const DEFAULT_READ_EXPIRY: Duration = Duration::from_secs(120);
pub const DEFAULT_UPLOAD_CONTENT_TYPE: &str = "application/pdf";
pub const DEFAULT_MAX_ATTEMPTS: u32 = 8;
pub const DEFAULT_POLL_INTERVAL: Duration = Duration::from_millis(2500);

#[derive(Debug, Default)]
pub struct DocketConfig {
    values: HashMap<String, String>,
}

impl DocketConfig {
    /// Create an empty config store.
    pub fn new() -> Self {
        Self {
            values: HashMap::new(),
        }
    }

    /// Set a configuration key to a string value.
    pub fn set<K, V>(&mut self, key: K, value: V)
    where
        K: Into<String>,
        V: Into<String>,
    {
        self.values.insert(key.into(), value.into());
    }

    /// Get a configuration value by key.
    pub fn get(&self, key: &str) -> Option<&str> {
        self.values.get(key).map(|s| s.as_str())
    }

    /// Check whether a key is present.
    pub fn has(&self, key: &str) -> bool {
        self.values.contains_key(key)
    }

    /// Copy every `PREFIX...` environment variable into the store.
    ///
    /// `DOCKET__S3__BUCKET` becomes `s3.bucket` for prefix `DOCKET__`.
    pub fn load_env(&mut self, prefix: &str) {
        self.load_vars(prefix, std::env::vars());
    }

    /// Same as [`load_env`](Self::load_env) over an explicit variable list.
    pub fn load_vars<I>(&mut self, prefix: &str, vars: I)
    where
        I: IntoIterator<Item = (String, String)>,
    {
        for (key, value) in vars {
            if let Some(stripped) = key.strip_prefix(prefix) {
                let normalized = stripped.to_lowercase().replace("__", ".");
                self.set(normalized, value);
            }
        }
    }

    pub fn snapshot(&self) -> DocketConfigSnapshot {
        DocketConfigSnapshot::new(self.values.clone())
    }
}

#[derive(Debug, Clone, Default)]
pub struct DocketConfigSnapshot {
    map: HashMap<String, String>,
}

impl DocketConfigSnapshot {
    pub(crate) fn new(map: HashMap<String, String>) -> Self {
        Self { map }
    }

    pub fn get(&self, key: &str) -> Option<&str> {
        self.map.get(key).map(|s| s.as_str())
    }

    pub fn get_string(&self, key: &str) -> Option<String> {
        self.map.get(key).cloned()
    }

    pub fn get_or(&self, key: &str, default: &str) -> String {
        self.get_string(key).unwrap_or_else(|| default.to_string())
    }

    pub fn get_bool(&self, key: &str) -> Option<bool> {
        self.get(key).and_then(|v| v.parse::<bool>().ok())
    }

    /// Parse a numeric value, failing loudly on garbage instead of falling back.
    pub fn get_u64(&self, key: &str) -> DocketResult<Option<u64>> {
        match self.get(key) {
            None => Ok(None),
            Some(raw) => raw
                .trim()
                .parse::<u64>()
                .map(Some)
                .map_err(|_| DocketError::config(format!("{key} must be an unsigned integer, got {raw:?}"))),
        }
    }

    pub fn broker_settings(&self) -> DocketResult<BrokerSettings> {
        let defaults = BrokerSettings::default();
        Ok(BrokerSettings {
            upload_prefix: self.get_or("broker.upload_prefix", &defaults.upload_prefix),
            write_expiry: self
                .get_u64("broker.write_expiry_secs")?
                .map(Duration::from_secs)
                .unwrap_or(defaults.write_expiry),
            read_expiry: self
                .get_u64("broker.read_expiry_secs")?
                .map(Duration::from_secs)
                .unwrap_or(defaults.read_expiry),
            upload_content_type: self.get_or("broker.upload_content_type", &defaults.upload_content_type),
        })
    }

    pub fn poll_settings(&self) -> DocketResult<PollSettings> {
        let max_attempts = match self.get_u64("poll.max_attempts")? {
            Some(n) => u32::try_from(n)
                .map_err(|_| DocketError::config("poll.max_attempts is out of range"))?,
            None => DEFAULT_MAX_ATTEMPTS,
        };
        let interval = self
            .get_u64("poll.interval_ms")?
            .map(Duration::from_millis)
            .unwrap_or(DEFAULT_POLL_INTERVAL);

        Ok(PollSettings {
            max_attempts,
            interval,
        })
    }
}

/// How the broker shapes capabilities.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BrokerSettings {
    pub upload_prefix: String,
    pub write_expiry: Duration,
    pub read_expiry: Duration,
    /// The one MIME type write capabilities are pinned to.
    pub upload_content_type: String,
}

impl Default for BrokerSettings {
    fn default() -> Self {
        Self {
            upload_prefix: UPLOAD_PREFIX.to_string(),
            write_expiry: DEFAULT_WRITE_EXPIRY,
            read_expiry: DEFAULT_READ_EXPIRY,
            upload_content_type: DEFAULT_UPLOAD_CONTENT_TYPE.to_string(),
        }
    }
}

/// Poll budget and spacing.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PollSettings {
    pub max_attempts: u32,
    pub interval: Duration,
}

impl Default for PollSettings {
    fn default() -> Self {
        Self {
            max_attempts: DEFAULT_MAX_ATTEMPTS,
            interval: DEFAULT_POLL_INTERVAL,
        }
    }
}

impl PollSettings {
    /// Upper bound of the polling window, `max_attempts × interval`.
    pub fn window(&self) -> Duration {
        self.interval.saturating_mul(self.max_attempts)
    }

    /// The whole polling window must fit inside the read capability's lifetime.
    pub fn validate_against(&self, read_expiry: Duration) -> DocketResult<()> {
        if self.max_attempts == 0 {
            return Err(DocketError::config("poll.max_attempts must be at least 1"));
        }
        let window = self.window();
        if window >= read_expiry {
            return Err(DocketError::config(format!(
                "poll window of {}ms ({} attempts x {}ms) must be shorter than the read capability expiry of {}s",
                window.as_millis(),
                self.max_attempts,
                self.interval.as_millis(),
                read_expiry.as_secs()
            )));
        }
        Ok(())
    }
}
