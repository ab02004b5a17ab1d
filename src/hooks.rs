use crate::errors::RefreshResult;
use crate::model::config::Config;
use crate::model::enums::ClientCacheState;
use std::sync::Arc;

type ReadyHandler = Box<dyn Fn(ClientCacheState) + Send + Sync>;
type ConfigChangedHandler = Box<dyn Fn(Arc<Config>) + Send + Sync>;
type ConfigFetchedHandler = Box<dyn Fn(&RefreshResult, bool) + Send + Sync>;

/// Event handlers notified about the client's lifecycle.
///
/// # Examples
///
/// ```rust
/// use configcat_core::Hooks;
///
/// let mut hooks = Hooks::default();
/// hooks
///     .add_on_client_ready(|state| println!("ready: {state:?}"))
///     .add_on_config_changed(|config| println!("{} settings", config.settings.len()));
/// ```
#[derive(Default)]
pub struct Hooks {
    on_client_ready: Vec<ReadyHandler>,
    on_config_changed: Vec<ConfigChangedHandler>,
    on_config_fetched: Vec<ConfigFetchedHandler>,
}

impl Hooks {
    /// Called once, when the client reaches its initial [`ClientCacheState`].
    pub fn add_on_client_ready(
        &mut self,
        handler: impl Fn(ClientCacheState) + Send + Sync + 'static,
    ) -> &mut Self {
        self.on_client_ready.push(Box::new(handler));
        self
    }

    /// Called after a config JSON with new content was written to the cache.
    pub fn add_on_config_changed(
        &mut self,
        handler: impl Fn(Arc<Config>) + Send + Sync + 'static,
    ) -> &mut Self {
        self.on_config_changed.push(Box::new(handler));
        self
    }

    /// Called after every fetch attempt with its result and whether it was initiated by the user.
    pub fn add_on_config_fetched(
        &mut self,
        handler: impl Fn(&RefreshResult, bool) + Send + Sync + 'static,
    ) -> &mut Self {
        self.on_config_fetched.push(Box::new(handler));
        self
    }

    pub(crate) fn emit_client_ready(&self, state: ClientCacheState) {
        for handler in &self.on_client_ready {
            handler(state);
        }
    }

    pub(crate) fn emit_config_changed(&self, config: &Arc<Config>) {
        for handler in &self.on_config_changed {
            handler(config.clone());
        }
    }

    pub(crate) fn emit_config_fetched(&self, result: &RefreshResult, user_initiated: bool) {
        for handler in &self.on_config_fetched {
            handler(result, user_initiated);
        }
    }
}
