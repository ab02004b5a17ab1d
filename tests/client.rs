#![allow(dead_code)]

use crate::utils::{construct_bool_json_payload, construct_str_json_payload, produce_mock_path, rand_sdk_key, AsyncInMemoryCache, InMemoryCache};
use async_trait::async_trait;
use configcat_core::OverrideBehavior::LocalOnly;
use configcat_core::{
    Client, ClientBuilder, ClientCacheState, ConfigFetcher, ErrorKind, EvaluationErrorCode, FetchError, FetchRequest, FetchResponse, FileDataSource, PollingMode, RefreshErrorCode, User, Value,
};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;

mod utils;

const CACHED_SDK_KEY: &str = "configcat-sdk-1/PKDVCLf-Hq-h-kCzMp-L7Q/cachedcachedcachedcach";
const CACHED_SDK_KEY_CACHE_KEY: &str = "1978ab06d833a2081a5513488bc289a76ae9d819";

#[tokio::test]
async fn default_user_flag() {
    let client = client_builder().default_user(User::new("id1")).build().unwrap();
    let details_without_user = client.get_flag_details("disabledFeature", None).await;

    assert_eq!("id1", details_without_user.user.unwrap().identifier());

    let details = client.get_flag_details("disabledFeature", Some(User::new("id2"))).await;

    assert_eq!("id2", details.user.unwrap().identifier());
}

#[tokio::test]
async fn default_user_typed() {
    let client = client_builder().default_user(User::new("id1").email("a@matching.com")).build().unwrap();

    let details = client.get_value_details("disabledFeature", None, false).await;
    assert!(details.value);
    assert_eq!(details.variation_id.as_deref(), Some("v-disabled-match"));
    assert!(details.matched_targeting_rule.is_some());

    let details = client.get_value_details("disabledFeature", Some(User::new("id2")), false).await;
    assert!(!details.value);
    assert_eq!("id2", details.user.unwrap().identifier());
}

#[tokio::test]
async fn typed_values() {
    let client = client_builder().build().unwrap();

    assert!(client.get_value("enabledFeature", None, false).await);
    assert_eq!(client.get_value("stringSetting", None, String::default()).await, "test");
    assert_eq!(client.get_value("intSetting", None, 0i64).await, 5);
    assert_eq!(client.get_value("doubleSetting", None, 0.0).await, 1.2);
}

#[tokio::test]
async fn type_mismatch_returns_default() {
    let client = client_builder().build().unwrap();
    let details = client.get_value_details("stringSetting", None, 10i64).await;

    assert_eq!(details.value, 10);
    assert!(details.is_default_value);
    assert_eq!(details.error.unwrap().code, EvaluationErrorCode::SettingValueTypeMismatch);
}

#[tokio::test]
async fn missing_key_returns_default() {
    let client = client_builder().build().unwrap();
    let details = client.get_value_details("nonExisting", None, "fallback".to_owned()).await;

    assert_eq!(details.value, "fallback");
    assert!(details.is_default_value);
    assert_eq!(details.error.unwrap().code, EvaluationErrorCode::SettingKeyMissing);
}

#[tokio::test]
async fn get_all_keys() {
    let client = client_builder().build().unwrap();
    let keys = client.get_all_keys().await;

    assert_eq!(keys, vec!["disabledFeature", "doubleSetting", "enabledFeature", "intSetting", "stringSetting"]);
}

#[tokio::test]
async fn get_all_keys_empty() {
    let client = Client::builder(rand_sdk_key().as_str()).polling_mode(PollingMode::Manual).build().unwrap();
    let keys = client.get_all_keys().await;

    assert!(keys.is_empty());
}

#[tokio::test]
async fn get_all_values() {
    let client = client_builder().build().unwrap();
    let values = client.get_all_values(None).await;

    assert!(!values["disabledFeature"].as_bool().unwrap());
    assert!(values["enabledFeature"].as_bool().unwrap());
    assert_eq!(values["stringSetting"].as_str().unwrap(), "test");
    assert_eq!(values["intSetting"].as_int().unwrap(), 5);
    assert_eq!(values["doubleSetting"].as_float().unwrap(), 1.2);
}

#[tokio::test]
async fn get_all_values_with_user() {
    let client = client_builder().build().unwrap();
    let values = client.get_all_values(Some(User::new("id").email("a@matching.com"))).await;

    assert!(values["disabledFeature"].as_bool().unwrap());
}

#[tokio::test]
async fn get_all_value_details() {
    let client = client_builder().build().unwrap();
    let details = client.get_all_value_details(None).await;

    let keys = details.iter().map(|d| d.key.as_str()).collect::<Vec<&str>>();
    assert_eq!(keys, vec!["disabledFeature", "doubleSetting", "enabledFeature", "intSetting", "stringSetting"]);
    assert!(details.iter().all(|d| d.error.is_none() && !d.is_default_value));
    assert_eq!(details[2].variation_id.as_deref(), Some("v-enabled"));
}

#[tokio::test]
async fn get_key_and_value() {
    let client = client_builder().build().unwrap();

    assert_eq!(client.get_key_and_value("v-int").await, Some(("intSetting".to_owned(), Value::Int(5))));
    assert_eq!(client.get_key_and_value("v-disabled-match").await, Some(("disabledFeature".to_owned(), Value::Bool(true))));
    assert!(client.get_key_and_value("nonexisting").await.is_none());
}

#[tokio::test]
async fn local_only_refresh_fails() {
    let client = client_builder().build().unwrap();
    let result = client.refresh().await;

    assert!(!result.is_success());
    assert_eq!(result.error_code, RefreshErrorCode::LocalOnlyClient);
    assert_eq!(client.wait_for_ready(Duration::from_secs(1)).await.unwrap(), ClientCacheState::HasLocalOverrideFlagDataOnly);
}

#[tokio::test]
async fn auto_poll_fetches_on_start() {
    let mut server = mockito::Server::new_async().await;
    let (sdk_key, path) = produce_mock_path();
    let m = server.mock("GET", path.as_str()).with_status(200).with_header("ETag", "etag1").with_body(construct_bool_json_payload("flag", true)).create_async().await;

    let client = Client::builder(sdk_key.as_str()).base_url(server.url().as_str()).build().unwrap();

    let state = client.wait_for_ready(Duration::from_secs(5)).await.unwrap();
    assert_eq!(state, ClientCacheState::HasUpToDateFlagData);
    assert!(client.get_value("flag", None, false).await);
    assert!(client.snapshot_fetch_time().is_some());

    m.assert_async().await;
}

#[tokio::test]
async fn manual_poll_fetches_only_on_refresh() {
    let mut server = mockito::Server::new_async().await;
    let (sdk_key, path) = produce_mock_path();
    let m = server.mock("GET", path.as_str()).with_status(200).with_body(construct_str_json_payload("text", "fetched")).expect(1).create_async().await;

    let client = Client::builder(sdk_key.as_str()).base_url(server.url().as_str()).polling_mode(PollingMode::Manual).build().unwrap();

    assert_eq!(client.get_value("text", None, "default".to_owned()).await, "default");
    assert!(client.refresh().await.is_success());
    assert_eq!(client.get_value("text", None, "default".to_owned()).await, "fetched");

    m.assert_async().await;
}

#[tokio::test]
async fn etag_is_sent_and_not_modified_keeps_config() {
    let mut server = mockito::Server::new_async().await;
    let (sdk_key, path) = produce_mock_path();
    let first = server.mock("GET", path.as_str()).with_status(200).with_header("ETag", "etag1").with_body(construct_bool_json_payload("flag", true)).expect(1).create_async().await;

    let client = Client::builder(sdk_key.as_str()).base_url(server.url().as_str()).polling_mode(PollingMode::Manual).build().unwrap();
    assert!(client.refresh().await.is_success());
    first.assert_async().await;
    first.remove_async().await;

    let second = server.mock("GET", path.as_str()).match_header("If-None-Match", "etag1").with_status(304).expect(1).create_async().await;
    assert!(client.refresh().await.is_success());
    assert!(client.get_value("flag", None, false).await);

    second.assert_async().await;
}

#[tokio::test]
async fn invalid_sdk_key_response() {
    let mut server = mockito::Server::new_async().await;
    let (sdk_key, path) = produce_mock_path();
    let m = server.mock("GET", path.as_str()).with_status(404).create_async().await;

    let client = Client::builder(sdk_key.as_str()).base_url(server.url().as_str()).polling_mode(PollingMode::Manual).build().unwrap();
    let result = client.refresh().await;

    assert_eq!(result.error_code, RefreshErrorCode::InvalidSdkKey);
    assert!(result.error_message.unwrap().contains("Status code: 404"));
    assert!(!client.get_value("flag", None, false).await);

    m.assert_async().await;
}

#[tokio::test]
async fn failed_fetch_keeps_last_config() {
    let mut server = mockito::Server::new_async().await;
    let (sdk_key, path) = produce_mock_path();
    let ok = server.mock("GET", path.as_str()).with_status(200).with_body(construct_bool_json_payload("flag", true)).expect(1).create_async().await;

    let client = Client::builder(sdk_key.as_str()).base_url(server.url().as_str()).polling_mode(PollingMode::Manual).build().unwrap();
    assert!(client.refresh().await.is_success());
    ok.assert_async().await;
    ok.remove_async().await;

    let failing = server.mock("GET", path.as_str()).with_status(500).create_async().await;
    let result = client.refresh().await;

    assert_eq!(result.error_code, RefreshErrorCode::UnexpectedHttpResponse);
    assert!(client.get_value("flag", None, false).await);

    failing.assert_async().await;
}

#[tokio::test]
async fn invalid_body_is_reported() {
    let mut server = mockito::Server::new_async().await;
    let (sdk_key, path) = produce_mock_path();
    let m = server.mock("GET", path.as_str()).with_status(200).with_body("{invalid").create_async().await;

    let client = Client::builder(sdk_key.as_str()).base_url(server.url().as_str()).polling_mode(PollingMode::Manual).build().unwrap();
    let result = client.refresh().await;

    assert_eq!(result.error_code, RefreshErrorCode::InvalidHttpResponseContent);

    m.assert_async().await;
}

#[tokio::test]
async fn offline_client_does_not_fetch() {
    let mut server = mockito::Server::new_async().await;
    let (sdk_key, path) = produce_mock_path();
    let m = server.mock("GET", path.as_str()).with_status(200).with_body(construct_bool_json_payload("flag", true)).expect(1).create_async().await;

    let client = Client::builder(sdk_key.as_str()).base_url(server.url().as_str()).polling_mode(PollingMode::Manual).offline(true).build().unwrap();

    assert!(client.is_offline());
    let result = client.refresh().await;
    assert_eq!(result.error_code, RefreshErrorCode::OfflineClient);
    assert!(!client.get_value("flag", None, false).await);

    client.online();
    assert!(!client.is_offline());
    assert!(client.refresh().await.is_success());
    assert!(client.get_value("flag", None, false).await);

    client.offline();
    assert_eq!(client.refresh().await.error_code, RefreshErrorCode::OfflineClient);

    m.assert_async().await;
}

#[tokio::test]
async fn lazy_load_uses_ttl() {
    let mut server = mockito::Server::new_async().await;
    let (sdk_key, path) = produce_mock_path();
    let m = server.mock("GET", path.as_str()).with_status(200).with_body(construct_bool_json_payload("flag", true)).expect(1).create_async().await;

    let client = Client::builder(sdk_key.as_str()).base_url(server.url().as_str()).polling_mode(PollingMode::lazy_load(Duration::from_secs(60))).build().unwrap();

    assert!(client.get_value("flag", None, false).await);
    assert!(client.get_value("flag", None, false).await);

    m.assert_async().await;
}

#[tokio::test]
async fn cached_config_is_served_offline() {
    let json = construct_bool_json_payload("flag", true);
    let payload = format!("{}\netag-cached\n{json}", chrono::Utc::now().timestamp_millis());
    let cache = InMemoryCache::seeded(CACHED_SDK_KEY_CACHE_KEY, &payload);

    let client = Client::builder(CACHED_SDK_KEY).polling_mode(PollingMode::Manual).offline(true).cache(Box::new(cache)).build().unwrap();

    assert_eq!(client.wait_for_ready(Duration::from_secs(1)).await.unwrap(), ClientCacheState::HasCachedFlagDataOnly);
    assert!(client.get_value("flag", None, false).await);
}

#[tokio::test]
async fn fetched_config_is_written_to_cache() {
    let mut server = mockito::Server::new_async().await;
    let json = construct_bool_json_payload("flag", true);
    let m = server
        .mock("GET", format!("/configuration-files/{CACHED_SDK_KEY}/config_v6.json").as_str())
        .with_status(200)
        .with_header("ETag", "etag1")
        .with_body(json.as_str())
        .create_async()
        .await;
    let cache = InMemoryCache::default();

    let client = Client::builder(CACHED_SDK_KEY).base_url(server.url().as_str()).polling_mode(PollingMode::Manual).cache(Box::new(cache.clone())).build().unwrap();
    assert!(client.refresh().await.is_success());

    let payload = cache.payload(CACHED_SDK_KEY_CACHE_KEY).unwrap();
    let mut lines = payload.splitn(3, '\n');
    assert!(lines.next().unwrap().parse::<i64>().is_ok());
    assert_eq!(lines.next().unwrap(), "etag1");
    assert_eq!(lines.next().unwrap(), json);

    m.assert_async().await;
}

#[tokio::test]
async fn async_cache_is_read_and_written() {
    let mut server = mockito::Server::new_async().await;
    let stale = format!("{}\netag-old\n{}", chrono::Utc::now().timestamp_millis(), construct_bool_json_payload("flag", false));
    let cache = AsyncInMemoryCache(InMemoryCache::seeded(CACHED_SDK_KEY_CACHE_KEY, &stale));
    let m = server
        .mock("GET", format!("/configuration-files/{CACHED_SDK_KEY}/config_v6.json").as_str())
        .match_header("If-None-Match", "etag-old")
        .with_status(200)
        .with_header("ETag", "etag-new")
        .with_body(construct_bool_json_payload("flag", true))
        .create_async()
        .await;

    let client = Client::builder(CACHED_SDK_KEY).base_url(server.url().as_str()).polling_mode(PollingMode::Manual).async_cache(Box::new(cache.clone())).build().unwrap();
    assert!(!client.get_value("flag", None, true).await);

    assert!(client.refresh().await.is_success());
    assert!(client.get_value("flag", None, false).await);
    assert!(cache.0.payload(CACHED_SDK_KEY_CACHE_KEY).unwrap().contains("\netag-new\n"));

    m.assert_async().await;
}

#[tokio::test]
async fn hooks_are_notified() {
    let mut server = mockito::Server::new_async().await;
    let (sdk_key, path) = produce_mock_path();
    let m = server.mock("GET", path.as_str()).with_status(200).with_header("ETag", "etag1").with_body(construct_bool_json_payload("flag", true)).create_async().await;

    let ready = Arc::new(AtomicUsize::new(0));
    let changed = Arc::new(AtomicUsize::new(0));
    let fetched = Arc::new(AtomicUsize::new(0));
    let (r, c, f) = (ready.clone(), changed.clone(), fetched.clone());

    let client = Client::builder(sdk_key.as_str())
        .base_url(server.url().as_str())
        .polling_mode(PollingMode::Manual)
        .on_client_ready(move |_| {
            r.fetch_add(1, Ordering::SeqCst);
        })
        .on_config_changed(move |config| {
            assert!(config.settings.contains_key("flag"));
            c.fetch_add(1, Ordering::SeqCst);
        })
        .on_config_fetched(move |result, user_initiated| {
            assert!(result.is_success());
            assert!(user_initiated);
            f.fetch_add(1, Ordering::SeqCst);
        })
        .build()
        .unwrap();

    assert!(client.refresh().await.is_success());
    assert!(client.refresh().await.is_success());

    assert_eq!(ready.load(Ordering::SeqCst), 1);
    assert_eq!(changed.load(Ordering::SeqCst), 1);
    assert_eq!(fetched.load(Ordering::SeqCst), 2);

    m.assert_async().await;
}

struct HangingFetcher;

#[async_trait]
impl ConfigFetcher for HangingFetcher {
    async fn fetch(&self, _request: FetchRequest) -> Result<FetchResponse, FetchError> {
        tokio::time::sleep(Duration::from_secs(30)).await;
        Err(FetchError::Timeout)
    }
}

#[tokio::test]
async fn wait_for_ready_times_out() {
    let client = Client::builder(rand_sdk_key().as_str()).fetcher(Arc::new(HangingFetcher)).build().unwrap();

    let err = client.wait_for_ready(Duration::from_millis(100)).await.err().unwrap();

    assert_eq!(err.kind, ErrorKind::ClientInitTimedOut);
    assert_eq!(err.message, "Client initialization timed out after 100ms.");
}

#[tokio::test]
async fn first_auto_poll_read_gives_up_after_init_wait() {
    let client = Client::builder(rand_sdk_key().as_str())
        .fetcher(Arc::new(HangingFetcher))
        .polling_mode(PollingMode::AutoPoll { poll_interval: Duration::from_secs(60), max_init_wait: Duration::from_millis(200) })
        .build()
        .unwrap();

    let details = client.get_value_details("flag", None, true).await;

    assert!(details.value);
    assert_eq!(details.error.unwrap().code, EvaluationErrorCode::ConfigJsonNotAvailable);
    assert_eq!(client.wait_for_ready(Duration::from_millis(10)).await.unwrap(), ClientCacheState::NoFlagData);
}

#[tokio::test]
async fn invalid_sdk_keys_are_rejected() {
    let err = Client::new("").err().unwrap();
    assert_eq!(err.kind, ErrorKind::InvalidSdkKey);
    assert_eq!(err.message, "SDK Key cannot be empty");

    let err = Client::new("invalid").err().unwrap();
    assert_eq!(err.kind, ErrorKind::InvalidSdkKey);
    assert_eq!(err.message, "SDK Key 'invalid' is invalid.");
}

fn client_builder() -> ClientBuilder {
    Client::builder("local").overrides(Box::new(FileDataSource::new("tests/data/test_json_complex.json").unwrap()), LocalOnly)
}
