use crate::constants::{DEFAULT_MAX_INIT_WAIT, DEFAULT_POLL_INTERVAL};
use std::time::Duration;

/// Controls when the client downloads the config JSON.
#[derive(Debug, Clone, PartialEq)]
pub enum PollingMode {
    /// Downloads the config JSON periodically in the background.
    ///
    /// Evaluations made before the first download wait for it, but for no longer than `max_init_wait`.
    AutoPoll {
        /// Time between two downloads.
        poll_interval: Duration,
        /// Upper bound of waiting for the first download.
        max_init_wait: Duration,
    },
    /// Downloads the config JSON on demand, when an evaluation finds the cached one older than `cache_ttl`.
    LazyLoad {
        /// How long a downloaded config JSON is considered fresh.
        cache_ttl: Duration,
    },
    /// Downloads the config JSON only when [`crate::Client::refresh`] is called.
    Manual,
}

impl PollingMode {
    /// [`PollingMode::AutoPoll`] with the given interval and the default init wait (5 seconds).
    pub fn auto_poll(poll_interval: Duration) -> Self {
        PollingMode::AutoPoll {
            poll_interval,
            max_init_wait: DEFAULT_MAX_INIT_WAIT,
        }
    }

    /// [`PollingMode::LazyLoad`] with the given cache TTL.
    pub fn lazy_load(cache_ttl: Duration) -> Self {
        PollingMode::LazyLoad { cache_ttl }
    }

    pub(crate) fn mode_identifier(&self) -> &'static str {
        match self {
            PollingMode::AutoPoll { .. } => "a",
            PollingMode::LazyLoad { .. } => "l",
            PollingMode::Manual => "m",
        }
    }
}

impl Default for PollingMode {
    fn default() -> Self {
        PollingMode::auto_poll(DEFAULT_POLL_INTERVAL)
    }
}
