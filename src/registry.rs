use crate::builder::ClientBuilder;
use crate::client::Client;
use crate::errors::ClientError;
use log::warn;
use std::collections::HashMap;
use std::sync::{Arc, Mutex, PoisonError};

/// Reference-counted set of live [`Client`]s, one per SDK key.
///
/// Every successful [`ClientRegistry::get_or_create`] must be paired with a
/// [`ClientRegistry::release`]. The client is closed and dropped from the registry
/// when its last reference is released.
///
/// # Examples
///
/// ```no_run
/// use configcat_core::{Client, ClientRegistry};
///
/// # #[tokio::main]
/// # async fn main() {
/// let registry = ClientRegistry::default();
/// let sdk_key = "configcat-sdk-1/PKDVCLf-Hq-h-kCzMp-L7Q/HhOWfwVtZ0mb30i9wi17GQ";
///
/// let client = registry.get_or_create(Client::builder(sdk_key)).unwrap();
/// let again = registry.get_or_create(Client::builder(sdk_key)).unwrap();
///
/// registry.release(sdk_key);
/// registry.release(sdk_key); // closes the client
/// # }
/// ```
#[derive(Default)]
pub struct ClientRegistry {
    clients: Mutex<HashMap<String, (Arc<Client>, usize)>>,
}

impl ClientRegistry {
    /// Returns the live client registered for the builder's SDK key, or builds and registers a new one.
    ///
    /// When a client already exists, the options carried by `builder` are ignored.
    ///
    /// # Errors
    ///
    /// Fails when a new client has to be built and [`ClientBuilder::build`] fails.
    pub fn get_or_create(&self, builder: ClientBuilder) -> Result<Arc<Client>, ClientError> {
        let mut clients = self.clients.lock().unwrap_or_else(PoisonError::into_inner);
        if let Some((client, count)) = clients.get_mut(builder.sdk_key()) {
            warn!(event_id = 3000; "There is an existing client instance for the specified SDK Key. No new client instance will be created and the specified options are ignored. Returning the existing client instance. SDK Key: '{}'.", builder.sdk_key());
            *count += 1;
            return Ok(client.clone());
        }
        let sdk_key = builder.sdk_key().to_owned();
        let client = Arc::new(builder.build()?);
        clients.insert(sdk_key, (client.clone(), 1));
        Ok(client)
    }

    /// Drops one reference of the client registered for `sdk_key`.
    ///
    /// Returns `true` when this was the last reference and the client got closed.
    pub fn release(&self, sdk_key: &str) -> bool {
        let mut clients = self.clients.lock().unwrap_or_else(PoisonError::into_inner);
        let Some((client, count)) = clients.get_mut(sdk_key) else {
            return false;
        };
        *count -= 1;
        if *count > 0 {
            return false;
        }
        client.close();
        clients.remove(sdk_key);
        true
    }

    /// Number of clients currently alive in the registry.
    pub fn len(&self) -> usize {
        self.clients
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .len()
    }

    /// Returns `true` when no client is registered.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}
