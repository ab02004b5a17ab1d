use crate::cache::CacheStore;
use crate::constants::{EU_CDN_URL, GLOBAL_CDN_URL};
use crate::fetch::transport::ConfigFetcher;
use crate::hooks::Hooks;
use crate::model::enums::DataGovernance;
use crate::modes::PollingMode;
use crate::r#override::{FlagOverrides, OptionalOverrides};
use crate::user::User;
use std::sync::Arc;
use std::time::Duration;

/// The immutable settings of a client, produced by [`crate::ClientBuilder`].
pub(crate) struct Options {
    pub(crate) sdk_key: String,
    pub(crate) offline: bool,
    pub(crate) base_url: Option<String>,
    pub(crate) data_governance: DataGovernance,
    pub(crate) http_timeout: Duration,
    pub(crate) cache: Option<CacheStore>,
    pub(crate) fetcher: Option<Arc<dyn ConfigFetcher>>,
    pub(crate) overrides: Option<FlagOverrides>,
    pub(crate) polling_mode: PollingMode,
    pub(crate) hooks: Arc<Hooks>,
    pub(crate) default_user: Option<User>,
}

impl Options {
    pub(crate) fn is_local_only(&self) -> bool {
        self.overrides.is_local()
    }

    /// The custom base URL, or the CDN selected by the data governance option.
    pub(crate) fn effective_base_url(&self) -> String {
        match self.base_url.as_ref() {
            Some(url) => url.trim_end_matches('/').to_owned(),
            None => match self.data_governance {
                DataGovernance::Global => GLOBAL_CDN_URL.to_owned(),
                DataGovernance::EU => EU_CDN_URL.to_owned(),
            },
        }
    }
}
