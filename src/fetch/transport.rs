use crate::constants::PKG_VERSION;
use crate::errors::{ClientError, ErrorCause, ErrorKind};
use async_trait::async_trait;
use reqwest::header::{HeaderMap, HeaderValue, ETAG, IF_NONE_MATCH};
use std::sync::Arc;
use std::time::Duration;
use thiserror::Error;

pub(crate) const CONFIGCAT_UA_HEADER: &str = "X-ConfigCat-UserAgent";

/// A conditional request for a config JSON document.
#[derive(Debug, Clone, PartialEq)]
pub struct FetchRequest {
    /// The full URL of the config JSON.
    pub url: String,
    /// The ETag of the last downloaded config JSON, sent as `If-None-Match`.
    pub etag: Option<String>,
    /// Upper bound of the whole request.
    pub timeout: Duration,
}

/// The raw response of a [`FetchRequest`].
#[derive(Debug, Clone, PartialEq, Default)]
pub struct FetchResponse {
    /// HTTP status code.
    pub status_code: u16,
    /// HTTP reason phrase.
    pub reason_phrase: String,
    /// The `ETag` response header.
    pub etag: Option<String>,
    /// Response body, for `200 OK` responses.
    pub body: Option<String>,
}

/// Transport-level failure of a [`FetchRequest`].
#[derive(Error, Debug)]
pub enum FetchError {
    /// The request did not complete within its timeout.
    #[error("Request timed out while trying to fetch config JSON.")]
    Timeout,
    /// The request failed before a response arrived.
    #[error("{0}")]
    Failure(ErrorCause),
}

/// The transport used to download the config JSON.
///
/// The default is an HTTP client built on [`reqwest`]; custom implementations can be
/// configured with [`crate::ClientBuilder::fetcher`].
#[async_trait]
pub trait ConfigFetcher: Send + Sync {
    /// Performs one request. Non-2xx responses are returned as [`Ok`], only transport problems are [`Err`].
    async fn fetch(&self, request: FetchRequest) -> Result<FetchResponse, FetchError>;
}

pub(crate) struct HttpConfigFetcher {
    http_client: reqwest::Client,
}

impl HttpConfigFetcher {
    pub(crate) fn new(mode_identifier: &str) -> Result<Self, ClientError> {
        let ua = format!("ConfigCat-Rust/{mode_identifier}-{PKG_VERSION}");
        let mut headers = HeaderMap::new();
        let header = HeaderValue::from_str(&ua).map_err(|err| {
            ClientError::new(
                ErrorKind::HttpClientInitFailure,
                format!("Invalid user agent header '{ua}'. ({err})"),
            )
        })?;
        headers.insert(CONFIGCAT_UA_HEADER, header);
        let http_client = reqwest::Client::builder()
            .default_headers(headers)
            .build()
            .map_err(|err| {
                ClientError::new(
                    ErrorKind::HttpClientInitFailure,
                    format!("Failed to initialize the HTTP client. ({err})"),
                )
            })?;
        Ok(Self { http_client })
    }
}

#[async_trait]
impl ConfigFetcher for HttpConfigFetcher {
    async fn fetch(&self, request: FetchRequest) -> Result<FetchResponse, FetchError> {
        let mut builder = self
            .http_client
            .get(request.url)
            .timeout(request.timeout);
        if let Some(etag) = request.etag {
            builder = builder.header(IF_NONE_MATCH, etag);
        }
        let response = builder.send().await.map_err(map_reqwest_error)?;

        let status = response.status();
        let etag = response
            .headers()
            .get(ETAG)
            .and_then(|header| header.to_str().ok())
            .map(str::to_owned);
        let body = if status.as_u16() == 200 {
            Some(response.text().await.map_err(map_reqwest_error)?)
        } else {
            None
        };
        Ok(FetchResponse {
            status_code: status.as_u16(),
            reason_phrase: status.canonical_reason().unwrap_or_default().to_owned(),
            etag,
            body,
        })
    }
}

fn map_reqwest_error(err: reqwest::Error) -> FetchError {
    if err.is_timeout() {
        FetchError::Timeout
    } else {
        FetchError::Failure(Arc::new(err))
    }
}

#[cfg(test)]
mod transport_tests {
    use crate::constants::test_constants::MOCK_PATH;
    use crate::constants::PKG_VERSION;
    use crate::fetch::transport::{
        ConfigFetcher, FetchError, FetchRequest, HttpConfigFetcher, CONFIGCAT_UA_HEADER,
    };
    use reqwest::header::{ETAG, IF_NONE_MATCH};
    use std::time::Duration;

    fn request(url: String, etag: Option<&str>) -> FetchRequest {
        FetchRequest {
            url: format!("{url}{MOCK_PATH}"),
            etag: etag.map(str::to_owned),
            timeout: Duration::from_secs(30),
        }
    }

    #[tokio::test]
    async fn sends_user_agent_and_etag() {
        let mut server = mockito::Server::new_async().await;
        let m = server
            .mock("GET", MOCK_PATH)
            .match_header(
                CONFIGCAT_UA_HEADER,
                format!("ConfigCat-Rust/m-{PKG_VERSION}").as_str(),
            )
            .match_header(IF_NONE_MATCH.as_str(), "etag1")
            .with_status(200)
            .with_header(ETAG.as_str(), "etag2")
            .with_body(r#"{"f": {}}"#)
            .create_async()
            .await;

        let fetcher = HttpConfigFetcher::new("m").unwrap();
        let response = fetcher
            .fetch(request(server.url(), Some("etag1")))
            .await
            .unwrap();
        assert_eq!(response.status_code, 200);
        assert_eq!(response.reason_phrase, "OK");
        assert_eq!(response.etag.as_deref(), Some("etag2"));
        assert_eq!(response.body.as_deref(), Some(r#"{"f": {}}"#));
        m.assert_async().await;
    }

    #[tokio::test]
    async fn non_success_is_not_an_error() {
        let mut server = mockito::Server::new_async().await;
        server
            .mock("GET", MOCK_PATH)
            .with_status(304)
            .create_async()
            .await;

        let fetcher = HttpConfigFetcher::new("m").unwrap();
        let response = fetcher.fetch(request(server.url(), None)).await.unwrap();
        assert_eq!(response.status_code, 304);
        assert!(response.body.is_none());
    }

    #[tokio::test]
    async fn unreachable_server() {
        let fetcher = HttpConfigFetcher::new("m").unwrap();
        let result = fetcher
            .fetch(request("http://127.0.0.1:1".to_owned(), None))
            .await;
        assert!(matches!(result, Err(FetchError::Failure(_))));
    }
}
