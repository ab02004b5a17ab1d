use chrono::{DateTime, Utc};
use configcat_core::{
    evaluate, Client, ConfigCache, FileDataSource, OverrideDataSource, PollingMode, User,
};
use criterion::Criterion;
use criterion::{criterion_group, criterion_main};
use std::sync::Arc;
use tokio::runtime::Runtime;

struct SingleValueCache {
    value: String,
}

impl SingleValueCache {
    pub fn new(val: String) -> Self {
        Self { value: val }
    }
}

impl ConfigCache for SingleValueCache {
    fn read(&self, _: &str) -> Option<String> {
        Some(self.value.clone())
    }
    fn write(&self, _: &str, _: &str) {}
}

fn get_value_bench(c: &mut Criterion) {
    let rt = Runtime::new().unwrap();
    let client = Arc::new(rt.block_on(async {
        Client::builder("PKDVCLf-Hq-h-kCzMp-L7Q/HhOWfwVtZ0mb30i9wi17GQ")
            .polling_mode(PollingMode::Manual)
            // Served from the cache so no HTTP request is made.
            .cache(Box::new(SingleValueCache::new(construct_cache_payload(
                true,
                Utc::now(),
                "tag",
            ))))
            .build()
            .unwrap()
    }));
    c.bench_function("get_value", |b| {
        b.to_async(&rt).iter(|| async {
            let mut handles = Vec::new();
            for _ in 0..200 {
                let cl = client.clone();
                handles.push(tokio::spawn(async move {
                    cl.get_value("testKey", None, false).await;
                }));
            }
            for handle in handles {
                handle.await.unwrap();
            }
        });
    });
}

fn evaluate_bench(c: &mut Criterion) {
    let source = FileDataSource::new("tests/data/test_targeting_v6.json").unwrap();
    let user = User::new("bench-user")
        .email("joe@beta.com")
        .country("US")
        .custom("Version", "2.0.0");
    c.bench_function("evaluate_prerequisite_and_segments", |b| {
        b.iter(|| evaluate(Some(source.settings()), "dependentFeature", None, Some(&user)));
    });
    c.bench_function("evaluate_percentage_rule", |b| {
        b.iter(|| evaluate(Some(source.settings()), "rollout", None, Some(&user)));
    });
}

fn construct_cache_payload(val: bool, time: DateTime<Utc>, etag: &str) -> String {
    time.timestamp_millis().to_string() + "\n" + etag + "\n" + &construct_json_payload(val)
}

fn construct_json_payload(val: bool) -> String {
    format!(r#"{{"f": {{"testKey":{{"t":0,"v":{{"b": {val}}}}}}}, "s": []}}"#)
}

criterion_group!(benches, get_value_bench, evaluate_bench);
criterion_main!(benches);
