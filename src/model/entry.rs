use crate::model::config::{self, config_from_json, Config};
use chrono::{DateTime, Utc};
use std::sync::Arc;
use std::time::Duration;
use thiserror::Error;

/// Error of restoring a [`ConfigEntry`] from a cache payload.
#[derive(Error, Debug)]
pub enum EntryError {
    /// The payload's first line is not a millisecond timestamp.
    #[error("Invalid fetch time: '{0}'")]
    FetchTime(String),
    /// The payload's config JSON can't be parsed.
    #[error(transparent)]
    Config(#[from] config::Error),
}

/// An immutable, timestamped snapshot of a config JSON document.
///
/// A snapshot is empty when it holds no document. Empty snapshots still carry a fetch time,
/// which tells when the client last confirmed that nothing newer was available.
#[derive(Debug, Clone, Default)]
pub struct ConfigEntry {
    /// The parsed document.
    pub config: Option<Arc<Config>>,
    /// The raw document, exactly as it was downloaded.
    pub config_json: Option<String>,
    /// The ETag the CDN returned along with the document.
    pub etag: Option<String>,
    /// When the document was downloaded or last confirmed unchanged.
    pub fetch_time: DateTime<Utc>,
}

impl ConfigEntry {
    /// The empty snapshot, stamped with the Unix epoch.
    pub fn empty() -> Self {
        Self::default()
    }

    /// Parses `json` into a snapshot stamped with `fetch_time`. An empty `etag` is dropped.
    pub fn from_json(
        json: &str,
        etag: Option<String>,
        fetch_time: DateTime<Utc>,
    ) -> Result<Self, EntryError> {
        let config = config_from_json(json)?;
        Ok(Self {
            config: Some(Arc::new(config)),
            config_json: Some(json.to_owned()),
            etag: etag.filter(|tag| !tag.is_empty()),
            fetch_time,
        })
    }

    /// Reads a snapshot serialized with [`ConfigEntry::serialize`].
    pub fn from_cache_str(payload: &str) -> Result<Self, EntryError> {
        let mut parts = payload.splitn(3, '\n');
        let time_part = parts.next().unwrap_or_default();
        let fetch_time = time_part
            .trim()
            .parse::<i64>()
            .ok()
            .and_then(DateTime::from_timestamp_millis)
            .ok_or_else(|| EntryError::FetchTime(time_part.to_owned()))?;
        match (parts.next(), parts.next()) {
            (Some(etag), Some(json)) => {
                Self::from_json(json, Some(etag.to_owned()), fetch_time)
            }
            _ => Ok(Self::empty().with_time(fetch_time)),
        }
    }

    /// Encodes the snapshot as a cache payload: the fetch time in milliseconds, then the ETag
    /// and the raw JSON on separate lines. The empty snapshot is the timestamp alone.
    pub fn serialize(&self) -> String {
        let millis = self.fetch_time.timestamp_millis();
        match self.config_json.as_ref() {
            Some(json) => {
                let etag = self.etag.as_deref().unwrap_or_default();
                format!("{millis}\n{etag}\n{json}")
            }
            None => millis.to_string(),
        }
    }

    /// Re-stamps the snapshot, sharing the parsed document.
    pub fn with_time(&self, fetch_time: DateTime<Utc>) -> Self {
        Self {
            config: self.config.clone(),
            config_json: self.config_json.clone(),
            etag: self.etag.clone(),
            fetch_time,
        }
    }

    /// `true` when the snapshot holds no document.
    pub fn is_empty(&self) -> bool {
        self.config.is_none()
    }

    /// `true` when both snapshots hold a document and this one was stamped earlier, at the
    /// millisecond precision the cache payload keeps.
    pub fn is_older_than(&self, other: &ConfigEntry) -> bool {
        !self.is_empty()
            && !other.is_empty()
            && self.fetch_time.timestamp_millis() < other.fetch_time.timestamp_millis()
    }

    /// `true` when at least `threshold` elapsed since the fetch time.
    pub fn is_expired(&self, threshold: Duration) -> bool {
        match (Utc::now() - self.fetch_time).to_std() {
            Ok(age) => age >= threshold,
            Err(_) => false,
        }
    }

    /// Compares the ETags when both snapshots have one, the raw JSON texts otherwise.
    pub fn has_same_content(&self, other: &ConfigEntry) -> bool {
        match (self.etag.as_ref(), other.etag.as_ref()) {
            (Some(this), Some(that)) => this == that,
            _ => self.config_json == other.config_json,
        }
    }
}

impl PartialEq for ConfigEntry {
    fn eq(&self, other: &Self) -> bool {
        self.fetch_time.timestamp_millis() == other.fetch_time.timestamp_millis()
            && self.etag == other.etag
            && self.config_json == other.config_json
    }
}
