use crate::cache::{AsyncConfigCache, CacheStore, ConfigCache};
use crate::constants::{DEFAULT_HTTP_TIMEOUT, SDK_KEY_PROXY_PREFIX};
use crate::errors::{ClientError, ErrorKind, RefreshResult};
use crate::fetch::transport::ConfigFetcher;
use crate::hooks::Hooks;
use crate::model::config::Config;
use crate::model::enums::{ClientCacheState, DataGovernance};
use crate::modes::PollingMode;
use crate::options::Options;
use crate::r#override::{FlagOverrides, OptionalOverrides, OverrideBehavior, OverrideDataSource};
use crate::user::User;
use crate::Client;
use std::sync::Arc;
use std::time::Duration;

/// Builder to create a [`Client`].
///
/// # Examples
///
/// ```no_run
/// use std::time::Duration;
/// use configcat_core::{DataGovernance, Client, PollingMode};
///
/// # #[tokio::main]
/// # async fn main() {
/// let builder = Client::builder("configcat-sdk-1/PKDVCLf-Hq-h-kCzMp-L7Q/HhOWfwVtZ0mb30i9wi17GQ")
///     .polling_mode(PollingMode::auto_poll(Duration::from_secs(60)))
///     .data_governance(DataGovernance::EU);
///
/// let client = builder.build().unwrap();
/// # }
/// ```
pub struct ClientBuilder {
    sdk_key: String,
    base_url: Option<String>,
    data_governance: Option<DataGovernance>,
    http_timeout: Option<Duration>,
    cache: Option<CacheStore>,
    fetcher: Option<Arc<dyn ConfigFetcher>>,
    overrides: Option<FlagOverrides>,
    offline: bool,
    polling_mode: Option<PollingMode>,
    hooks: Hooks,
    default_user: Option<User>,
}

impl ClientBuilder {
    const SDK_KEY_PREFIX: &'static str = "configcat-sdk-1";
    const SDK_KEY_SECTION_LENGTH: usize = 22;

    pub(crate) fn new(sdk_key: &str) -> Self {
        Self {
            sdk_key: sdk_key.to_owned(),
            offline: false,
            http_timeout: None,
            base_url: None,
            cache: None,
            fetcher: None,
            polling_mode: None,
            data_governance: None,
            overrides: None,
            hooks: Hooks::default(),
            default_user: None,
        }
    }

    pub(crate) fn sdk_key(&self) -> &str {
        &self.sdk_key
    }

    /// Indicates whether the client should start in offline mode. Default value is `false`.
    pub fn offline(mut self, offline: bool) -> Self {
        self.offline = offline;
        self
    }

    /// Sets the HTTP request timeout. Default value is `30` seconds.
    pub fn http_timeout(mut self, timeout: Duration) -> Self {
        self.http_timeout = Some(timeout);
        self
    }

    /// Sets a custom base URL, e.g. the address of a ConfigCat Proxy.
    pub fn base_url(mut self, base_url: &str) -> Self {
        self.base_url = Some(base_url.to_owned());
        self
    }

    /// Sets the [`DataGovernance`] option. Default value is [`DataGovernance::Global`].
    pub fn data_governance(mut self, data_governance: DataGovernance) -> Self {
        self.data_governance = Some(data_governance);
        self
    }

    /// Sets a [`ConfigCache`] implementation used for caching.
    ///
    /// # Examples
    ///
    /// ```rust
    /// use configcat_core::{ConfigCache, Client};
    ///
    /// let builder = Client::builder("SDK_KEY")
    ///     .cache(Box::new(CustomCache{}));
    ///
    /// struct CustomCache {}
    ///
    /// impl ConfigCache for CustomCache {
    ///     fn read(&self, key: &str) -> Option<String> {
    ///         // read from cache
    ///         None
    ///     }
    ///
    ///     fn write(&self, key: &str, value: &str) {
    ///         // write to cache
    ///     }
    /// }
    /// ```
    pub fn cache(mut self, cache: Box<dyn ConfigCache>) -> Self {
        self.cache = Some(CacheStore::Sync(Arc::from(cache)));
        self
    }

    /// Sets an [`AsyncConfigCache`] implementation used for caching.
    pub fn async_cache(mut self, cache: Box<dyn AsyncConfigCache>) -> Self {
        self.cache = Some(CacheStore::Async(Arc::from(cache)));
        self
    }

    /// Replaces the HTTP transport used to download the config JSON.
    pub fn fetcher(mut self, fetcher: Arc<dyn ConfigFetcher>) -> Self {
        self.fetcher = Some(fetcher);
        self
    }

    /// Sets the [`PollingMode`] of the client.
    /// Default value is [`PollingMode::AutoPoll`] with `60` seconds poll interval.
    ///
    /// # Examples
    ///
    /// ```rust
    /// use std::time::Duration;
    /// use configcat_core::{Client, PollingMode};
    ///
    /// let builder = Client::builder("SDK_KEY")
    ///     .polling_mode(PollingMode::lazy_load(Duration::from_secs(120)));
    /// ```
    pub fn polling_mode(mut self, polling_mode: PollingMode) -> Self {
        self.polling_mode = Some(polling_mode);
        self
    }

    /// Sets feature flag and setting overrides.
    ///
    /// # Examples
    ///
    /// ```rust
    /// use configcat_core::{Client, MapDataSource, OverrideBehavior, Value};
    ///
    /// let builder = Client::builder("SDK_KEY")
    ///     .overrides(Box::new(MapDataSource::from([
    ///         ("flag", Value::Bool(true))
    ///     ])), OverrideBehavior::LocalOnly);
    /// ```
    pub fn overrides(
        mut self,
        source: Box<dyn OverrideDataSource>,
        behavior: OverrideBehavior,
    ) -> Self {
        self.overrides = Some(FlagOverrides::new(source, behavior));
        self
    }

    /// Sets the [`User`] used when an evaluation method is called without one.
    pub fn default_user(mut self, user: User) -> Self {
        self.default_user = Some(user);
        self
    }

    /// Replaces every registered event handler with the ones in `hooks`.
    pub fn hooks(mut self, hooks: Hooks) -> Self {
        self.hooks = hooks;
        self
    }

    /// Registers a handler for [`Hooks::add_on_client_ready`].
    pub fn on_client_ready(
        mut self,
        handler: impl Fn(ClientCacheState) + Send + Sync + 'static,
    ) -> Self {
        self.hooks.add_on_client_ready(handler);
        self
    }

    /// Registers a handler for [`Hooks::add_on_config_changed`].
    pub fn on_config_changed(
        mut self,
        handler: impl Fn(Arc<Config>) + Send + Sync + 'static,
    ) -> Self {
        self.hooks.add_on_config_changed(handler);
        self
    }

    /// Registers a handler for [`Hooks::add_on_config_fetched`].
    pub fn on_config_fetched(
        mut self,
        handler: impl Fn(&RefreshResult, bool) + Send + Sync + 'static,
    ) -> Self {
        self.hooks.add_on_config_fetched(handler);
        self
    }

    /// Creates a [`Client`] from the configuration made on the builder.
    ///
    /// Must be called within a tokio runtime: the client starts its background work immediately.
    ///
    /// # Errors
    ///
    /// This method fails if the given SDK key is empty or has an invalid format, or the HTTP client can't be initialized.
    pub fn build(self) -> Result<Client, ClientError> {
        Client::with_options(self.build_options()?)
    }

    pub(crate) fn build_options(self) -> Result<Options, ClientError> {
        if self.sdk_key.is_empty() {
            return Err(ClientError::new(
                ErrorKind::InvalidSdkKey,
                "SDK Key cannot be empty".to_owned(),
            ));
        }
        if !self.overrides.is_local()
            && !Self::is_sdk_key_valid(&self.sdk_key, self.base_url.is_some())
        {
            return Err(ClientError::new(
                ErrorKind::InvalidSdkKey,
                format!("SDK Key '{}' is invalid.", self.sdk_key),
            ));
        }
        Ok(Options {
            sdk_key: self.sdk_key,
            offline: self.offline,
            base_url: self.base_url,
            data_governance: self.data_governance.unwrap_or_default(),
            http_timeout: self.http_timeout.unwrap_or(DEFAULT_HTTP_TIMEOUT),
            cache: self.cache,
            fetcher: self.fetcher,
            overrides: self.overrides,
            polling_mode: self.polling_mode.unwrap_or_default(),
            hooks: Arc::new(self.hooks),
            default_user: self.default_user,
        })
    }

    fn is_sdk_key_valid(sdk_key: &str, is_custom_url: bool) -> bool {
        if is_custom_url
            && sdk_key.len() > SDK_KEY_PROXY_PREFIX.len()
            && sdk_key.starts_with(SDK_KEY_PROXY_PREFIX)
        {
            return true;
        }
        let comps: Vec<&str> = sdk_key.split('/').collect();
        match comps.as_slice() {
            [first, second] => {
                first.len() == Self::SDK_KEY_SECTION_LENGTH
                    && second.len() == Self::SDK_KEY_SECTION_LENGTH
            }
            [prefix, first, second] => {
                *prefix == Self::SDK_KEY_PREFIX
                    && first.len() == Self::SDK_KEY_SECTION_LENGTH
                    && second.len() == Self::SDK_KEY_SECTION_LENGTH
            }
            _ => false,
        }
    }
}

#[cfg(test)]
mod builder_tests {
    use crate::builder::ClientBuilder;
    use crate::errors::ErrorKind;
    use crate::model::enums::DataGovernance;
    use crate::modes::PollingMode;
    use crate::r#override::map::MapDataSource;
    use crate::r#override::OverrideBehavior;
    use crate::value::Value;
    use std::time::Duration;

    #[test]
    fn sdk_key_validation() {
        for (key, custom_url, valid) in [
            ("configcat-sdk-1/PKDVCLf-Hq-h-kCzMp-L7Q/HhOWfwVtZ0mb30i9wi17GQ", false, true),
            ("PKDVCLf-Hq-h-kCzMp-L7Q/HhOWfwVtZ0mb30i9wi17GQ", false, true),
            ("configcat-sdk-1/PKDVCLf-Hq-h-kCzMp-L7Q/HhOWfwVtZ0mb30i9wi17GQ1", false, false),
            ("configcat-sdk-2/PKDVCLf-Hq-h-kCzMp-L7Q/HhOWfwVtZ0mb30i9wi17GQ", false, false),
            ("PKDVCLf-Hq-h-kCzMp-L7Q", false, false),
            ("configcat-proxy/key", false, false),
            ("configcat-proxy/key", true, true),
            ("configcat-proxy/", true, false),
        ] {
            assert_eq!(ClientBuilder::is_sdk_key_valid(key, custom_url), valid, "{key}");
        }
    }

    #[test]
    fn invalid_key_fails() {
        let err = ClientBuilder::new("invalid").build_options().err().unwrap();
        assert_eq!(err.kind, ErrorKind::InvalidSdkKey);
        assert_eq!(err.message, "SDK Key 'invalid' is invalid.");

        let err = ClientBuilder::new("").build_options().err().unwrap();
        assert_eq!(err.message, "SDK Key cannot be empty");
    }

    #[test]
    fn local_only_skips_key_validation() {
        let options = ClientBuilder::new("local")
            .overrides(
                Box::new(MapDataSource::from([("flag", Value::Bool(true))])),
                OverrideBehavior::LocalOnly,
            )
            .build_options()
            .unwrap();
        assert!(options.is_local_only());
    }

    #[test]
    fn defaults() {
        let options = ClientBuilder::new("PKDVCLf-Hq-h-kCzMp-L7Q/HhOWfwVtZ0mb30i9wi17GQ")
            .build_options()
            .unwrap();
        assert_eq!(options.polling_mode, PollingMode::auto_poll(Duration::from_secs(60)));
        assert_eq!(options.data_governance, DataGovernance::Global);
        assert_eq!(options.http_timeout, Duration::from_secs(30));
        assert_eq!(options.effective_base_url(), "https://cdn-global.configcat.com");
        assert!(!options.offline);

        let options = ClientBuilder::new("PKDVCLf-Hq-h-kCzMp-L7Q/HhOWfwVtZ0mb30i9wi17GQ")
            .data_governance(DataGovernance::EU)
            .build_options()
            .unwrap();
        assert_eq!(options.effective_base_url(), "https://cdn-eu.configcat.com");

        let options = ClientBuilder::new("PKDVCLf-Hq-h-kCzMp-L7Q/HhOWfwVtZ0mb30i9wi17GQ")
            .base_url("https://proxy.example.com/")
            .build_options()
            .unwrap();
        assert_eq!(options.effective_base_url(), "https://proxy.example.com");
    }
}
