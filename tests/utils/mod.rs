#![allow(dead_code)]

use configcat_core::{AsyncConfigCache, ConfigCache, FetchError, FetchRequest, FetchResponse};
use log::kv::Key;
use log::{set_max_level, Level, Log, Metadata, Record};
use rand::distributions::{Alphanumeric, DistString};
use std::cell::RefCell;
use std::collections::HashMap;
use std::sync::{Arc, Mutex};

pub fn produce_mock_path() -> (String, String) {
    let sdk_key = rand_sdk_key();
    (sdk_key.clone(), format!("/configuration-files/{sdk_key}/config_v6.json"))
}

pub fn rand_sdk_key() -> String {
    format!("{}/{}", rand_str(22), rand_str(22))
}

pub fn construct_bool_json_payload(key: &str, val: bool) -> String {
    format!(r#"{{"f": {{"{key}":{{"t":0,"v":{{"b": {val}}}}}}}, "s": []}}"#)
}

pub fn construct_str_json_payload(key: &str, val: &str) -> String {
    format!(r#"{{"f": {{"{key}":{{"t":1,"v":{{"s": "{val}"}}}}}}, "s": []}}"#)
}

fn rand_str(len: usize) -> String {
    Alphanumeric.sample_string(&mut rand::thread_rng(), len)
}

/// Cache whose content is visible to every clone, used to seed and inspect cached payloads.
#[derive(Clone, Default)]
pub struct InMemoryCache {
    pub entries: Arc<Mutex<HashMap<String, String>>>,
}

impl InMemoryCache {
    pub fn seeded(key: &str, payload: &str) -> Self {
        let cache = Self::default();
        cache.entries.lock().unwrap().insert(key.to_owned(), payload.to_owned());
        cache
    }

    pub fn payload(&self, key: &str) -> Option<String> {
        self.entries.lock().unwrap().get(key).cloned()
    }
}

impl ConfigCache for InMemoryCache {
    fn read(&self, key: &str) -> Option<String> {
        self.payload(key)
    }

    fn write(&self, key: &str, value: &str) {
        self.entries.lock().unwrap().insert(key.to_owned(), value.to_owned());
    }
}

/// Same store behind the async cache interface.
#[derive(Clone, Default)]
pub struct AsyncInMemoryCache(pub InMemoryCache);

#[async_trait::async_trait]
impl AsyncConfigCache for AsyncInMemoryCache {
    async fn read(&self, key: &str) -> Option<String> {
        self.0.payload(key)
    }

    async fn write(&self, key: &str, value: &str) {
        ConfigCache::write(&self.0, key, value);
    }
}

/// Serves one response per request, from a queue; the last one repeats.
pub struct ScriptedFetcher {
    responses: Mutex<Vec<FetchResponse>>,
    pub requests: Mutex<Vec<FetchRequest>>,
}

impl ScriptedFetcher {
    pub fn new(responses: Vec<FetchResponse>) -> Arc<Self> {
        Arc::new(Self {
            responses: Mutex::new(responses),
            requests: Mutex::new(Vec::new()),
        })
    }

    pub fn request_count(&self) -> usize {
        self.requests.lock().unwrap().len()
    }
}

#[async_trait::async_trait]
impl configcat_core::ConfigFetcher for ScriptedFetcher {
    async fn fetch(&self, request: FetchRequest) -> Result<FetchResponse, FetchError> {
        self.requests.lock().unwrap().push(request);
        let mut responses = self.responses.lock().unwrap();
        if responses.len() > 1 {
            Ok(responses.remove(0))
        } else {
            Ok(responses[0].clone())
        }
    }
}

pub fn ok_response(body: &str, etag: &str) -> FetchResponse {
    FetchResponse {
        status_code: 200,
        reason_phrase: "OK".to_owned(),
        etag: Some(etag.to_owned()),
        body: Some(body.to_owned()),
    }
}

pub fn status_response(status_code: u16) -> FetchResponse {
    FetchResponse {
        status_code,
        reason_phrase: String::default(),
        etag: None,
        body: None,
    }
}

pub struct RecordingLogger {}

impl RecordingLogger {
    thread_local!(pub static LOGS: RefCell<String> = RefCell::new(String::default()));
}

impl Log for RecordingLogger {
    fn enabled(&self, metadata: &Metadata) -> bool {
        metadata.level() <= log::max_level() && metadata.target().contains("configcat")
    }

    fn log(&self, record: &Record) {
        if !self.enabled(record.metadata()) {
            return;
        }
        let level = match record.level() {
            Level::Error => "ERROR",
            Level::Warn => "WARNING",
            Level::Info => "INFO",
            Level::Debug => "DEBUG",
            Level::Trace => "TRACE",
        };
        let event_id = record
            .key_values()
            .get(Key::from("event_id"))
            .and_then(|id| id.to_i64())
            .unwrap_or_default();
        Self::LOGS.with_borrow_mut(|l| l.push_str(format!("{level} [{event_id}] {}\n", record.args()).as_str()));
    }

    fn flush(&self) {}
}

pub fn log_record_init() {
    set_max_level(log::LevelFilter::Info);
    _ = log::set_logger(&RecordingLogger {});
}
