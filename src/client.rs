use crate::builder::ClientBuilder;
use crate::errors::{ClientError, ErrorKind, RefreshResult};
use crate::eval::details::{EvaluationDetails, EvaluationResult};
use crate::eval::evaluator::evaluate;
use crate::fetch::service::ConfigService;
use crate::model::config::Setting;
use crate::model::entry::ConfigEntry;
use crate::model::enums::ClientCacheState;
use crate::options::Options;
use crate::user::User;
use crate::value::{Value, ValuePrimitive};
use chrono::{DateTime, Utc};
use log::{error, warn};
use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;
use tokio::time::timeout;

/// The main component for evaluating feature flags and settings.
///
/// # Examples
///
/// ```no_run
/// use std::time::Duration;
/// use configcat_core::{Client, PollingMode, User};
///
/// #[tokio::main]
/// async fn main() {
///     let client = Client::builder("configcat-sdk-1/PKDVCLf-Hq-h-kCzMp-L7Q/HhOWfwVtZ0mb30i9wi17GQ")
///         .polling_mode(PollingMode::auto_poll(Duration::from_secs(60)))
///         .build()
///         .unwrap();
///
///     let user = User::new("user-id");
///     let is_flag_enabled = client.get_value("flag-key", Some(user), false).await;
/// }
/// ```
pub struct Client {
    options: Arc<Options>,
    service: ConfigService,
}

impl Client {
    pub(crate) fn with_options(options: Options) -> Result<Self, ClientError> {
        let options = Arc::new(options);
        let service = ConfigService::new(&options)?;
        Ok(Self { options, service })
    }

    /// Creates a new [`ClientBuilder`] used to build a [`Client`].
    pub fn builder(sdk_key: &str) -> ClientBuilder {
        ClientBuilder::new(sdk_key)
    }

    /// Creates a new [`Client`] with default options.
    ///
    /// # Errors
    ///
    /// This method fails if the given SDK key is empty or has an invalid format.
    pub fn new(sdk_key: &str) -> Result<Self, ClientError> {
        ClientBuilder::new(sdk_key).build()
    }

    /// Initiates a force refresh on the cached config JSON data.
    ///
    /// The returned [`RefreshResult`] tells whether the refresh failed, e.g. because the client is offline,
    /// it has [`crate::OverrideBehavior::LocalOnly`] overrides, or the HTTP request failed.
    ///
    /// # Examples
    ///
    /// ```no_run
    /// use configcat_core::Client;
    ///
    /// #[tokio::main]
    /// async fn main() {
    ///     let client = Client::new("configcat-sdk-1/PKDVCLf-Hq-h-kCzMp-L7Q/HhOWfwVtZ0mb30i9wi17GQ").unwrap();
    ///
    ///     let result = client.refresh().await;
    ///     assert!(result.is_success());
    /// }
    /// ```
    pub async fn refresh(&self) -> RefreshResult {
        self.service.refresh(true).await.0
    }

    /// Evaluates a feature flag or setting identified by the given `key`.
    ///
    /// Returns `default` if the flag doesn't exist, or there was an error during the evaluation.
    pub async fn get_value<T: ValuePrimitive + Clone>(
        &self,
        key: &str,
        user: Option<User>,
        default: T,
    ) -> T {
        self.get_value_details(key, user, default).await.value
    }

    /// The same as [`Client::get_value`] but returns an [`EvaluationDetails`] that
    /// contains additional information about the result of the evaluation process.
    pub async fn get_value_details<T: ValuePrimitive + Clone>(
        &self,
        key: &str,
        user: Option<User>,
        default: T,
    ) -> EvaluationDetails<T> {
        let entry = self.service.config().await;
        let user = self.eval_user(user);
        let default_value: Value = default.clone().into();
        let result = self.with_settings(&entry, |settings| {
            evaluate(settings, key, Some(&default_value), user.as_ref())
        });
        let value = result
            .value
            .as_ref()
            .and_then(T::from_value)
            .unwrap_or(default);
        EvaluationDetails::from_result(value, result, user, fetch_time(&entry))
    }

    /// Evaluates a feature flag identified by the given `key` without a typed default.
    ///
    /// The value is [`None`] when the evaluation failed.
    pub async fn get_flag_details(
        &self,
        key: &str,
        user: Option<User>,
    ) -> EvaluationDetails<Option<Value>> {
        let entry = self.service.config().await;
        let user = self.eval_user(user);
        let result = self.with_settings(&entry, |settings| {
            evaluate(settings, key, None, user.as_ref())
        });
        details_of(result, user, &entry)
    }

    /// Evaluates all feature flags and settings.
    ///
    /// Failed evaluations are left out of the returned [`HashMap`].
    pub async fn get_all_values(&self, user: Option<User>) -> HashMap<String, Value> {
        self.get_all_value_details(user)
            .await
            .into_iter()
            .filter_map(|details| details.value.map(|value| (details.key, value)))
            .collect()
    }

    /// The same as [`Client::get_all_values`] but returns the [`EvaluationDetails`] of each evaluation, ordered by key.
    pub async fn get_all_value_details(
        &self,
        user: Option<User>,
    ) -> Vec<EvaluationDetails<Option<Value>>> {
        let entry = self.service.config().await;
        let user = self.eval_user(user);
        let results = self.with_settings(&entry, |settings| {
            let Some(settings) = settings else {
                error!(event_id = 1000; "Config JSON is not present. Returning empty result.");
                return Vec::new();
            };
            let mut keys = settings.keys().collect::<Vec<&String>>();
            keys.sort();
            keys.into_iter()
                .map(|key| evaluate(Some(settings), key, None, user.as_ref()))
                .collect::<Vec<EvaluationResult>>()
        });
        results
            .into_iter()
            .map(|result| details_of(result, user.clone(), &entry))
            .collect()
    }

    /// Returns the keys of all feature flags and settings, ordered.
    ///
    /// If there's no config JSON to work on, this method returns an empty [`Vec`].
    pub async fn get_all_keys(&self) -> Vec<String> {
        let entry = self.service.config().await;
        self.with_settings(&entry, |settings| match settings {
            Some(settings) => {
                let mut keys = settings.keys().cloned().collect::<Vec<String>>();
                keys.sort();
                keys
            }
            None => {
                error!(event_id = 1000; "Config JSON is not present. Returning empty vector.");
                Vec::new()
            }
        })
    }

    /// Finds the key and value of the setting that can serve the given variation ID.
    pub async fn get_key_and_value(&self, variation_id: &str) -> Option<(String, Value)> {
        let entry = self.service.config().await;
        let found = self.with_settings(&entry, |settings| {
            let Some(settings) = settings else {
                error!(event_id = 1000; "Config JSON is not present. Returning None.");
                return None;
            };
            settings.iter().find_map(|(key, setting)| {
                value_of_variation(setting, variation_id).map(|value| (key.clone(), value))
            })
        });
        if found.is_none() {
            error!(event_id = 2011; "Could not find the setting for the specified variation ID: '{variation_id}'.");
        }
        found
    }

    /// Puts the [`Client`] into offline mode.
    ///
    /// In this mode the client is not allowed to initiate HTTP requests and works only from the configured cache.
    pub fn offline(&self) {
        self.service.set_offline();
    }

    /// Puts the [`Client`] into online mode.
    pub fn online(&self) {
        self.service.set_online();
    }

    /// Returns `true` when the client is configured not to initiate HTTP requests.
    pub fn is_offline(&self) -> bool {
        self.service.is_offline()
    }

    /// Waits for the initialization of the [`Client`] for a maximum duration specified in `wait_timeout`.
    ///
    /// # Errors
    ///
    /// This method fails if the initialization takes more time than the specified `wait_timeout`.
    ///
    /// # Examples
    ///
    /// ```no_run
    /// use configcat_core::{Client, ClientCacheState};
    /// use std::time::Duration;
    ///
    /// #[tokio::main]
    /// async fn main() {
    ///     let client = Client::new("configcat-sdk-1/PKDVCLf-Hq-h-kCzMp-L7Q/HhOWfwVtZ0mb30i9wi17GQ").unwrap();
    ///     let state = client.wait_for_ready(Duration::from_secs(5)).await.unwrap();
    ///
    ///     assert!(matches!(state, ClientCacheState::HasUpToDateFlagData));
    /// }
    /// ```
    pub async fn wait_for_ready(
        &self,
        wait_timeout: Duration,
    ) -> Result<ClientCacheState, ClientError> {
        match timeout(wait_timeout, self.service.wait_for_ready()).await {
            Ok(state) => Ok(state),
            Err(_) => {
                let err = ClientError::new(
                    ErrorKind::ClientInitTimedOut,
                    format!(
                        "Client initialization timed out after {}ms.",
                        wait_timeout.as_millis()
                    ),
                );
                warn!(event_id = 4200; "{err}");
                Err(err)
            }
        }
    }

    /// Time of the config JSON snapshot the client currently holds, [`None`] when it holds none.
    pub fn snapshot_fetch_time(&self) -> Option<DateTime<Utc>> {
        fetch_time(&self.service.snapshot())
    }

    /// Stops the background work of the client. Evaluations keep working from the last snapshot.
    pub fn close(&self) {
        self.service.close();
    }

    fn eval_user(&self, user: Option<User>) -> Option<User> {
        user.or_else(|| self.options.default_user.clone())
    }

    fn with_settings<R>(
        &self,
        entry: &ConfigEntry,
        f: impl FnOnce(Option<&HashMap<String, Setting>>) -> R,
    ) -> R {
        let remote = entry.config.as_ref().map(|config| &config.settings);
        match self.options.overrides.as_ref() {
            Some(overrides) => {
                let merged = overrides.apply(remote);
                f(Some(&*merged))
            }
            None => f(remote),
        }
    }
}

fn fetch_time(entry: &ConfigEntry) -> Option<DateTime<Utc>> {
    (!entry.is_empty()).then_some(entry.fetch_time)
}

fn details_of(
    result: EvaluationResult,
    user: Option<User>,
    entry: &ConfigEntry,
) -> EvaluationDetails<Option<Value>> {
    let value = result.value.clone();
    EvaluationDetails::from_result(value, result, user, fetch_time(entry))
}

fn value_of_variation(setting: &Setting, variation_id: &str) -> Option<Value> {
    let matches = |id: &Option<String>| id.as_deref() == Some(variation_id);
    if matches(&setting.variation_id) {
        return setting.value.as_val(&setting.setting_type);
    }
    for rule in setting.targeting_rules.iter().flatten() {
        if let Some(served) = rule.served_value.as_ref() {
            if matches(&served.variation_id) {
                return served.value.as_val(&setting.setting_type);
            }
        }
        for option in rule.percentage_options.iter().flatten() {
            if matches(&option.variation_id) {
                return option.served_value.as_val(&setting.setting_type);
            }
        }
    }
    setting
        .percentage_options
        .iter()
        .flatten()
        .find(|option| matches(&option.variation_id))
        .and_then(|option| option.served_value.as_val(&setting.setting_type))
}
