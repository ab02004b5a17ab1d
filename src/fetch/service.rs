use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use arc_swap::ArcSwap;
use chrono::Utc;
use futures::future::{BoxFuture, Shared};
use futures::FutureExt;
use log::{error, info, warn};
use tokio::sync::{watch, Mutex};
use tokio_util::sync::CancellationToken;

use crate::cache::CacheAdapter;
use crate::constants::{CONFIG_FILE_NAME, SERIALIZATION_FORMAT_VERSION};
use crate::errors::{ClientError, RefreshErrorCode, RefreshResult};
use crate::fetch::fetcher::{FetchOutcome, Fetcher};
use crate::fetch::polling;
use crate::fetch::transport::{ConfigFetcher, HttpConfigFetcher};
use crate::hooks::Hooks;
use crate::model::entry::ConfigEntry;
use crate::model::enums::ClientCacheState;
use crate::modes::PollingMode;
use crate::options::Options;
use crate::utils::sha1;

/// The result of a refresh attempt together with the snapshot the client should use afterwards.
pub(crate) type RefreshOutput = (RefreshResult, Arc<ConfigEntry>);

type SharedRefresh = Shared<BoxFuture<'static, RefreshOutput>>;

pub(crate) struct ServiceState {
    fetcher: Fetcher,
    cache: CacheAdapter,
    cache_key: String,
    hooks: Arc<Hooks>,
    pub(crate) mode: PollingMode,
    local_only: bool,
    offline: AtomicBool,
    snapshot: ArcSwap<ConfigEntry>,
    pending: Mutex<Option<SharedRefresh>>,
    ready: watch::Sender<Option<ClientCacheState>>,
}

impl ServiceState {
    pub(crate) fn is_offline(&self) -> bool {
        self.local_only || self.offline.load(Ordering::SeqCst)
    }

    pub(crate) fn snapshot(&self) -> Arc<ConfigEntry> {
        self.snapshot.load_full()
    }

    /// Reads the cache and adopts what it holds, notifying about content that is new to this
    /// instance. A snapshot older than the current one is never adopted.
    pub(crate) async fn sync_with_cache(&self) -> Arc<ConfigEntry> {
        let from_cache = self.cache.get(&self.cache_key).await;
        let previous = self.snapshot.rcu(|current| {
            if from_cache.is_older_than(current) {
                current.clone()
            } else {
                from_cache.clone()
            }
        });
        if from_cache.is_older_than(&previous) {
            return previous;
        }
        if !Arc::ptr_eq(&previous, &from_cache)
            && !from_cache.is_empty()
            && !from_cache.has_same_content(&previous)
        {
            if let Some(config) = from_cache.config.as_ref() {
                self.hooks.emit_config_changed(config);
            }
        }
        from_cache
    }

    async fn store(&self, entry: Arc<ConfigEntry>) {
        self.snapshot.store(entry.clone());
        self.cache.set(&self.cache_key, entry).await;
    }

    /// Settles the readiness state; only the first call has an effect.
    pub(crate) fn signal_ready(&self, state: ClientCacheState) {
        let first = self.ready.send_if_modified(|current| {
            if current.is_some() {
                return false;
            }
            *current = Some(state);
            true
        });
        if first {
            self.hooks.emit_client_ready(state);
        }
    }

    pub(crate) fn is_ready(&self) -> bool {
        self.ready.borrow().is_some()
    }

    pub(crate) fn ready_receiver(&self) -> watch::Receiver<Option<ClientCacheState>> {
        self.ready.subscribe()
    }
}

/// Keeps the config JSON snapshot fresh according to the configured [`PollingMode`].
pub(crate) struct ConfigService {
    state: Arc<ServiceState>,
    close_token: CancellationToken,
    poll_token: ArcSwap<CancellationToken>,
}

impl ConfigService {
    pub(crate) fn new(options: &Arc<Options>) -> Result<Self, ClientError> {
        let transport: Arc<dyn ConfigFetcher> = match options.fetcher.as_ref() {
            Some(fetcher) => fetcher.clone(),
            None => Arc::new(HttpConfigFetcher::new(
                options.polling_mode.mode_identifier(),
            )?),
        };
        let (ready, _) = watch::channel(None);
        let close_token = CancellationToken::new();
        let state = Arc::new(ServiceState {
            fetcher: Fetcher::new(
                transport,
                options.effective_base_url(),
                options.base_url.is_some(),
                &options.sdk_key,
                options.http_timeout,
            ),
            cache: CacheAdapter::new(options.cache.clone()),
            cache_key: cache_key(&options.sdk_key),
            hooks: options.hooks.clone(),
            mode: options.polling_mode.clone(),
            local_only: options.is_local_only(),
            offline: AtomicBool::new(options.offline),
            snapshot: ArcSwap::from_pointee(ConfigEntry::empty()),
            pending: Mutex::new(None),
            ready,
        });
        let service = Self {
            poll_token: ArcSwap::from_pointee(close_token.child_token()),
            state,
            close_token,
        };

        if service.state.local_only {
            service
                .state
                .signal_ready(ClientCacheState::HasLocalOverrideFlagDataOnly);
            return Ok(service);
        }
        match service.state.mode {
            PollingMode::AutoPoll {
                poll_interval,
                max_init_wait,
            } => {
                polling::start_init_timer(
                    service.state.clone(),
                    max_init_wait,
                    service.close_token.child_token(),
                );
                polling::start_poll(
                    service.state.clone(),
                    poll_interval,
                    service.poll_token.load_full().as_ref().clone(),
                );
            }
            _ => polling::signal_initial_state(service.state.clone()),
        }
        Ok(service)
    }

    /// Returns the snapshot the polling mode is willing to serve.
    pub(crate) async fn config(&self) -> Arc<ConfigEntry> {
        if self.state.local_only {
            return self.state.snapshot();
        }
        polling::get_config(&self.state).await
    }

    /// Fetches the config JSON unless the client is offline.
    pub(crate) async fn refresh(&self, user_initiated: bool) -> RefreshOutput {
        if self.state.local_only {
            let message = "The client uses local-only overrides, thus `.refresh()` has no effect.";
            warn!(event_id = RefreshErrorCode::LocalOnlyClient.event_id(); "{message}");
            return (
                RefreshResult::failure(RefreshErrorCode::LocalOnlyClient, message.to_owned(), None),
                self.state.snapshot(),
            );
        }
        if self.state.is_offline() {
            let message = "Client is in offline mode, it cannot initiate HTTP calls.";
            warn!(event_id = RefreshErrorCode::OfflineClient.event_id(); "{message}");
            let entry = self.state.sync_with_cache().await;
            return (
                RefreshResult::failure(RefreshErrorCode::OfflineClient, message.to_owned(), None),
                entry,
            );
        }
        refresh_single_flight(&self.state, user_initiated).await
    }

    pub(crate) fn set_online(&self) {
        if self.state.local_only || !self.state.offline.swap(false, Ordering::SeqCst) {
            return;
        }
        info!(event_id = 5200; "Switched to ONLINE mode.");
        if let PollingMode::AutoPoll { poll_interval, .. } = self.state.mode {
            let token = self.close_token.child_token();
            let previous = self.poll_token.swap(Arc::new(token.clone()));
            previous.cancel();
            polling::start_poll(self.state.clone(), poll_interval, token);
        }
    }

    pub(crate) fn set_offline(&self) {
        if self.state.local_only || self.state.offline.swap(true, Ordering::SeqCst) {
            return;
        }
        info!(event_id = 5200; "Switched to OFFLINE mode.");
    }

    pub(crate) fn is_offline(&self) -> bool {
        self.state.is_offline()
    }

    pub(crate) fn snapshot(&self) -> Arc<ConfigEntry> {
        self.state.snapshot()
    }

    pub(crate) async fn wait_for_ready(&self) -> ClientCacheState {
        let mut receiver = self.state.ready_receiver();
        let state = match receiver.wait_for(Option::is_some).await {
            Ok(state) => *state,
            Err(_) => None,
        };
        state.unwrap_or(ClientCacheState::NoFlagData)
    }

    pub(crate) fn close(&self) {
        self.close_token.cancel();
    }
}

impl Drop for ConfigService {
    fn drop(&mut self) {
        self.close();
    }
}

fn cache_key(sdk_key: &str) -> String {
    sha1(&format!(
        "{sdk_key}_{CONFIG_FILE_NAME}_{SERIALIZATION_FORMAT_VERSION}"
    ))
}

/// Runs at most one refresh at a time; concurrent callers share the result of the one in flight.
///
/// The fetch runs in its own task, so a caller that stops waiting does not cancel it.
pub(crate) async fn refresh_single_flight(
    state: &Arc<ServiceState>,
    user_initiated: bool,
) -> RefreshOutput {
    let shared = {
        let mut pending = state.pending.lock().await;
        match pending.as_ref() {
            Some(in_flight) => in_flight.clone(),
            None => {
                let task_state = state.clone();
                let task = tokio::spawn(async move {
                    let output = refresh_core(&task_state, user_initiated).await;
                    *task_state.pending.lock().await = None;
                    output
                });
                let fallback_state = state.clone();
                let shared = async move {
                    match task.await {
                        Ok(output) => output,
                        Err(join_err) => {
                            *fallback_state.pending.lock().await = None;
                            let message = format!(
                                "Unexpected error occurred while refreshing the config JSON. {join_err}"
                            );
                            error!(event_id = RefreshErrorCode::UnexpectedError.event_id(); "{message}");
                            (
                                RefreshResult::failure(
                                    RefreshErrorCode::UnexpectedError,
                                    message,
                                    Some(Arc::new(join_err)),
                                ),
                                fallback_state.snapshot(),
                            )
                        }
                    }
                }
                .boxed()
                .shared();
                *pending = Some(shared.clone());
                shared
            }
        }
    };
    shared.await
}

async fn refresh_core(state: &ServiceState, user_initiated: bool) -> RefreshOutput {
    let latest = state.sync_with_cache().await;
    let outcome = state.fetcher.fetch(latest.etag.as_deref()).await;
    let (result, entry) = match outcome {
        FetchOutcome::Fetched(fetched) => {
            let fetched = Arc::new(fetched);
            state.store(fetched.clone()).await;
            if !fetched.has_same_content(&latest) {
                if let Some(config) = fetched.config.as_ref() {
                    state.hooks.emit_config_changed(config);
                }
            }
            (RefreshResult::success(), fetched)
        }
        FetchOutcome::NotModified if latest.is_empty() => {
            let message = "Unexpected HTTP response was received when no config JSON was cached locally: 304 Not Modified".to_owned();
            let code = RefreshErrorCode::InvalidHttpResponseWhenLocalCacheIsEmpty;
            error!(event_id = code.event_id(); "{message}");
            (RefreshResult::failure(code, message, None), latest)
        }
        FetchOutcome::NotModified => {
            let restamped = Arc::new(latest.with_time(Utc::now()));
            state.store(restamped.clone()).await;
            (RefreshResult::success(), restamped)
        }
        FetchOutcome::Failed {
            code,
            message,
            cause,
        } => (RefreshResult::failure(code, message, cause), latest),
    };
    state.hooks.emit_config_fetched(&result, user_initiated);
    state.signal_ready(polling::cache_state(&state.mode, &entry));
    (result, entry)
}
