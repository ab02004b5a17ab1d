use configcat_core::*;
use log::kv::Key;
use log::{Level, LevelFilter, Log, Metadata, Record};
use std::time::Duration;

#[tokio::main]
async fn main() {
    // Info level shows the evaluation log of every flag.
    log::set_max_level(LevelFilter::Info);
    log::set_logger(&PrintLog {}).unwrap();

    let client = Client::builder("PKDVCLf-Hq-h-kCzMp-L7Q/HhOWfwVtZ0mb30i9wi17GQ")
        .polling_mode(PollingMode::auto_poll(Duration::from_secs(5)))
        .on_config_changed(|config| println!("config changed, {} settings", config.settings.len()))
        .build()
        .unwrap();

    match client.wait_for_ready(Duration::from_secs(5)).await {
        Ok(state) => println!("client ready: {state:?}"),
        Err(err) => println!("{err}"),
    }

    let is_awesome_enabled = client
        .get_value("isAwesomeFeatureEnabled", None, false)
        .await;

    println!("isAwesomeFeatureEnabled: {is_awesome_enabled}");

    let user = User::new("#SOME-USER-ID#").email("configcat@example.com");

    let details = client
        .get_value_details("isPOCFeatureEnabled", Some(user), false)
        .await;

    println!(
        "isPOCFeatureEnabled: {} (variation: {:?}, fetched: {:?})",
        details.value, details.variation_id, details.fetch_time
    );

    client.close();
}

// Example log implementation.
pub struct PrintLog {}

impl Log for PrintLog {
    fn enabled(&self, metadata: &Metadata) -> bool {
        metadata.level() <= log::max_level() && metadata.target().contains("configcat")
    }

    fn log(&self, record: &Record) {
        if !self.enabled(record.metadata()) {
            return;
        }
        let level = match record.level() {
            Level::Error => "ERROR",
            Level::Warn => "WARN",
            Level::Info => "INFO",
            Level::Debug => "DEBUG",
            Level::Trace => "TRACE",
        };
        match record.key_values().get(Key::from("event_id")) {
            Some(event_id) => println!("{level} [{event_id}] {}", record.args()),
            None => println!("{level} {}", record.args()),
        }
    }

    fn flush(&self) {}
}
