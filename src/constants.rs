use std::time::Duration;

pub const PKG_VERSION: &str = env!("CARGO_PKG_VERSION");

pub const SDK_KEY_PROXY_PREFIX: &str = "configcat-proxy/";
pub const CONFIG_FILE_NAME: &str = "config_v6.json";
pub const SERIALIZATION_FORMAT_VERSION: &str = "v2";

pub const GLOBAL_CDN_URL: &str = "https://cdn-global.configcat.com";
pub const EU_CDN_URL: &str = "https://cdn-eu.configcat.com";

pub const DEFAULT_POLL_INTERVAL: Duration = Duration::from_secs(60);
pub const DEFAULT_MAX_INIT_WAIT: Duration = Duration::from_secs(5);
pub const DEFAULT_HTTP_TIMEOUT: Duration = Duration::from_secs(30);

/// Subtracted from the poll interval before expiry checks so a fetch that finished a bit
/// late does not make the next tick look fresh.
pub const POLL_EXPIRATION_TOLERANCE: Duration = Duration::from_millis(500);

/// Number of data governance redirects followed in a single fetch.
pub const MAX_REDIRECTS: u8 = 2;
