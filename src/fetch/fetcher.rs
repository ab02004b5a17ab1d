use std::sync::Arc;
use std::time::Duration;

use arc_swap::ArcSwap;
use chrono::Utc;
use log::{debug, error, warn};

use crate::constants::{CONFIG_FILE_NAME, MAX_REDIRECTS, SDK_KEY_PROXY_PREFIX};
use crate::errors::ErrorCause;
use crate::errors::RefreshErrorCode::{
    self, HttpRequestFailure, HttpRequestTimeout, InvalidHttpResponseContent, InvalidSdkKey,
    UnexpectedHttpResponse,
};
use crate::fetch::transport::{ConfigFetcher, FetchError, FetchRequest};
use crate::model::entry::ConfigEntry;
use crate::model::enums::RedirectMode;

#[derive(Debug)]
pub(crate) enum FetchOutcome {
    Fetched(ConfigEntry),
    NotModified,
    Failed {
        code: RefreshErrorCode,
        message: String,
        cause: Option<ErrorCause>,
    },
}

impl FetchOutcome {
    fn failed(code: RefreshErrorCode, message: String, cause: Option<ErrorCause>) -> Self {
        error!(event_id = code.event_id(); "{message}");
        FetchOutcome::Failed {
            code,
            message,
            cause,
        }
    }
}

/// Downloads the config JSON and follows the data governance redirects it asks for.
pub(crate) struct Fetcher {
    transport: Arc<dyn ConfigFetcher>,
    base_url: ArcSwap<String>,
    is_custom_url: bool,
    sdk_key: String,
    timeout: Duration,
}

impl Fetcher {
    pub(crate) fn new(
        transport: Arc<dyn ConfigFetcher>,
        base_url: String,
        is_custom_url: bool,
        sdk_key: &str,
        timeout: Duration,
    ) -> Self {
        Self {
            transport,
            base_url: ArcSwap::from_pointee(base_url),
            is_custom_url,
            sdk_key: sdk_key.to_owned(),
            timeout,
        }
    }

    pub(crate) async fn fetch(&self, etag: Option<&str>) -> FetchOutcome {
        let mut etag = etag.map(str::to_owned);
        let mut redirects: u8 = 0;
        loop {
            let base_url = self.base_url.load_full();
            let outcome = self.fetch_once(&base_url, etag.take()).await;
            let Some((pref_url, redirect)) = redirect_target(&outcome) else {
                return outcome;
            };
            if pref_url == *base_url {
                return outcome;
            }
            if self.is_custom_url && redirect != RedirectMode::Force {
                return outcome;
            }
            if self.is_custom_url && self.sdk_key.starts_with(SDK_KEY_PROXY_PREFIX) {
                return FetchOutcome::failed(
                    UnexpectedHttpResponse,
                    format!("The config JSON asked for a forced redirect to '{pref_url}' while the client is configured to use a proxy at '{base_url}'. Please check the proxy and the data governance settings."),
                    None,
                );
            }

            self.base_url.store(Arc::new(pref_url));
            match redirect {
                RedirectMode::No => return outcome,
                RedirectMode::Should => {
                    warn!(event_id = 3002; "The `.data_governance()` parameter specified at the client initialization is not in sync with the preferences on the ConfigCat Dashboard. Read more: https://configcat.com/docs/advanced/data-governance")
                }
                RedirectMode::Force => {}
            }
            if redirects >= MAX_REDIRECTS {
                error!(event_id = 1104; "Redirection loop encountered while trying to fetch config JSON. Please contact us at https://configcat.com/support");
                return outcome;
            }
            redirects += 1;
        }
    }

    async fn fetch_once(&self, base_url: &str, etag: Option<String>) -> FetchOutcome {
        let request = FetchRequest {
            url: format!(
                "{base_url}/configuration-files/{sdk_key}/{CONFIG_FILE_NAME}",
                sdk_key = self.sdk_key
            ),
            etag,
            timeout: self.timeout,
        };
        let response = match self.transport.fetch(request).await {
            Ok(response) => response,
            Err(FetchError::Timeout) => {
                return FetchOutcome::failed(
                    HttpRequestTimeout,
                    format!(
                        "Request timed out while trying to fetch config JSON. Timeout value: {}ms",
                        self.timeout.as_millis()
                    ),
                    Some(Arc::new(FetchError::Timeout)),
                )
            }
            Err(FetchError::Failure(cause)) => {
                return FetchOutcome::failed(
                    HttpRequestFailure,
                    format!("Unexpected error occurred while trying to fetch config JSON. It is most likely due to a local network issue. Please make sure your application can reach the ConfigCat CDN servers (or your proxy server) over HTTP. {cause}"),
                    Some(cause),
                )
            }
        };

        match response.status_code {
            200 => {
                debug!("Fetch was successful: new config fetched");
                let body = response.body.unwrap_or_default();
                match ConfigEntry::from_json(&body, response.etag, Utc::now()) {
                    Ok(entry) => FetchOutcome::Fetched(entry),
                    Err(parse_error) => FetchOutcome::failed(
                        InvalidHttpResponseContent,
                        format!("Fetching config JSON was successful but the HTTP response content was invalid. {parse_error}"),
                        Some(Arc::new(parse_error)),
                    ),
                }
            }
            304 => {
                debug!("Fetch was successful: not modified");
                FetchOutcome::NotModified
            }
            code @ (403 | 404) => FetchOutcome::failed(
                InvalidSdkKey,
                format!("Your SDK Key seems to be wrong. You can find the valid SDK Key at https://app.configcat.com/sdkkey. Status code: {code}"),
                None,
            ),
            code => FetchOutcome::failed(
                UnexpectedHttpResponse,
                format!(
                    "Unexpected HTTP response was received while trying to fetch config JSON. Status code: {code} {}",
                    response.reason_phrase
                )
                .trim_end()
                .to_owned(),
                None,
            ),
        }
    }
}

fn redirect_target(outcome: &FetchOutcome) -> Option<(String, RedirectMode)> {
    let FetchOutcome::Fetched(entry) = outcome else {
        return None;
    };
    let pref = entry.config.as_ref()?.preferences.as_ref()?;
    let url = pref.url.clone()?;
    Some((url, pref.redirect.unwrap_or(RedirectMode::No)))
}


#[cfg(test)]
mod fetch_tests {
    use std::sync::Arc;
    use std::time::Duration;

    use reqwest::header::{ETAG, IF_NONE_MATCH};

    use crate::constants::test_constants::{MOCK_KEY, MOCK_PATH};
    use crate::errors::RefreshErrorCode;
    use crate::fetch::fetcher::{FetchOutcome, Fetcher};
    use crate::fetch::transport::HttpConfigFetcher;

    pub(super) fn http_fetcher(url: String, is_custom: bool, sdk_key: &str) -> Fetcher {
        Fetcher::new(
            Arc::new(HttpConfigFetcher::new("m").unwrap()),
            url,
            is_custom,
            sdk_key,
            Duration::from_secs(30),
        )
    }

    #[tokio::test]
    async fn fetch_http_etag() {
        let mut server = mockito::Server::new_async().await;
        let m1 = server
            .mock("GET", MOCK_PATH)
            .with_status(200)
            .with_header(ETAG.as_str(), "etag1")
            .with_body(r#"{"f": {}, "s": []}"#)
            .create_async()
            .await;

        let m2 = server
            .mock("GET", MOCK_PATH)
            .match_header(IF_NONE_MATCH.as_str(), "etag1")
            .with_status(304)
            .create_async()
            .await;

        let fetcher = http_fetcher(server.url(), false, MOCK_KEY);
        let etag = match fetcher.fetch(None).await {
            FetchOutcome::Fetched(entry) => entry.etag,
            other => panic!("{other:?}"),
        };
        assert_eq!(etag.as_deref(), Some("etag1"));

        let response = fetcher.fetch(etag.as_deref()).await;
        assert!(matches!(response, FetchOutcome::NotModified));

        m1.assert_async().await;
        m2.assert_async().await;
    }

    #[tokio::test]
    async fn fetch_http_failed() {
        let mut server = mockito::Server::new_async().await;
        let fetcher = http_fetcher(server.url(), false, MOCK_KEY);

        for (status, code, msg) in [
            (404, RefreshErrorCode::InvalidSdkKey, "Your SDK Key seems to be wrong. You can find the valid SDK Key at https://app.configcat.com/sdkkey. Status code: 404"),
            (403, RefreshErrorCode::InvalidSdkKey, "Your SDK Key seems to be wrong. You can find the valid SDK Key at https://app.configcat.com/sdkkey. Status code: 403"),
            (500, RefreshErrorCode::UnexpectedHttpResponse, "Unexpected HTTP response was received while trying to fetch config JSON. Status code: 500 Internal Server Error"),
        ] {
            let mock = server
                .mock("GET", MOCK_PATH)
                .with_status(status)
                .create_async()
                .await;
            match fetcher.fetch(None).await {
                FetchOutcome::Failed { code: c, message, .. } => {
                    assert_eq!(c, code);
                    assert_eq!(message, msg);
                }
                other => panic!("{other:?}"),
            }
            mock.remove_async().await;
        }
    }

    #[tokio::test]
    async fn fetch_http_body_error() {
        let mut server = mockito::Server::new_async().await;
        server
            .mock("GET", MOCK_PATH)
            .with_status(200)
            .with_body(r#"{"f": {}"#)
            .create_async()
            .await;

        let fetcher = http_fetcher(server.url(), false, MOCK_KEY);
        match fetcher.fetch(None).await {
            FetchOutcome::Failed { code, message, cause } => {
                assert_eq!(code, RefreshErrorCode::InvalidHttpResponseContent);
                assert_eq!(message, "Fetching config JSON was successful but the HTTP response content was invalid. JSON parsing failed. (EOF while parsing an object at line 1 column 8)");
                assert!(cause.is_some());
            }
            other => panic!("{other:?}"),
        }
    }

    #[tokio::test]
    async fn fetch_http_unreachable() {
        let fetcher = http_fetcher("http://127.0.0.1:1".to_owned(), true, MOCK_KEY);
        match fetcher.fetch(None).await {
            FetchOutcome::Failed { code, .. } => {
                assert_eq!(code, RefreshErrorCode::HttpRequestFailure)
            }
            other => panic!("{other:?}"),
        }
    }
}
