use std::cmp::min;
use std::sync::Arc;
use std::time::Duration;

use log::debug;
use tokio::time::MissedTickBehavior;
use tokio_util::sync::CancellationToken;

use crate::constants::POLL_EXPIRATION_TOLERANCE;
use crate::fetch::service::{refresh_single_flight, ServiceState};
use crate::model::entry::ConfigEntry;
use crate::model::enums::ClientCacheState;
use crate::modes::PollingMode;

/// Tells how much a snapshot can be trusted under the given polling mode.
pub(crate) fn cache_state(mode: &PollingMode, entry: &ConfigEntry) -> ClientCacheState {
    if entry.is_empty() {
        return ClientCacheState::NoFlagData;
    }
    let ttl = match mode {
        PollingMode::Manual => return ClientCacheState::HasCachedFlagDataOnly,
        PollingMode::AutoPoll { poll_interval, .. } => *poll_interval,
        PollingMode::LazyLoad { cache_ttl } => *cache_ttl,
    };
    if entry.is_expired(ttl) {
        ClientCacheState::HasCachedFlagDataOnly
    } else {
        ClientCacheState::HasUpToDateFlagData
    }
}

/// Picks the snapshot a read should see, fetching first when the mode asks for it.
pub(crate) async fn get_config(state: &Arc<ServiceState>) -> Arc<ConfigEntry> {
    match state.mode {
        PollingMode::AutoPoll { poll_interval, .. } => {
            let entry = state.sync_with_cache().await;
            if !entry.is_expired(poll_interval) || state.is_ready() {
                return entry;
            }
            let mut receiver = state.ready_receiver();
            _ = receiver.wait_for(Option::is_some).await;
            state.sync_with_cache().await
        }
        PollingMode::LazyLoad { cache_ttl } => {
            let entry = state.sync_with_cache().await;
            if !entry.is_expired(cache_ttl) || state.is_offline() {
                return entry;
            }
            refresh_single_flight(state, false).await.1
        }
        PollingMode::Manual => state.sync_with_cache().await,
    }
}

fn expiry_threshold(interval: Duration) -> Duration {
    interval.saturating_sub(min(POLL_EXPIRATION_TOLERANCE, interval / 2))
}

/// Refreshes the snapshot on every tick of `interval` until `token` is cancelled.
pub(crate) fn start_poll(state: Arc<ServiceState>, interval: Duration, token: CancellationToken) {
    let interval = interval.max(Duration::from_millis(1));
    let threshold = expiry_threshold(interval);
    tokio::spawn(async move {
        let mut ticker = tokio::time::interval(interval);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
        loop {
            tokio::select! {
                _ = ticker.tick() => poll_tick(&state, threshold).await,
                _ = token.cancelled() => {
                    debug!("Auto polling stopped");
                    return;
                }
            }
        }
    });
}

async fn poll_tick(state: &Arc<ServiceState>, threshold: Duration) {
    if state.is_offline() {
        let entry = state.sync_with_cache().await;
        if !entry.is_empty() {
            state.signal_ready(ClientCacheState::HasCachedFlagDataOnly);
        }
        return;
    }
    let entry = state.sync_with_cache().await;
    if entry.is_expired(threshold) {
        refresh_single_flight(state, false).await;
    } else {
        state.signal_ready(cache_state(&state.mode, &entry));
    }
}

/// Settles readiness with whatever is available once `max_init_wait` elapsed.
pub(crate) fn start_init_timer(
    state: Arc<ServiceState>,
    max_init_wait: Duration,
    token: CancellationToken,
) {
    tokio::spawn(async move {
        tokio::select! {
            _ = tokio::time::sleep(max_init_wait) => {
                if !state.is_ready() {
                    debug!("Max init wait time ({}ms) elapsed", max_init_wait.as_millis());
                    let entry = state.snapshot();
                    state.signal_ready(cache_state(&state.mode, &entry));
                }
            }
            _ = token.cancelled() => {}
        }
    });
}

/// Reads the cache once and reports the initial state for modes that don't poll.
pub(crate) fn signal_initial_state(state: Arc<ServiceState>) {
    tokio::spawn(async move {
        let entry = state.sync_with_cache().await;
        state.signal_ready(cache_state(&state.mode, &entry));
    });
}

#[cfg(test)]
mod polling_tests {
    use std::sync::Arc;
    use std::time::Duration;

    use chrono::{TimeDelta, Utc};

    use crate::fetch::fetcher::fetch_test_utils::CountingFetcher;
    use crate::fetch::polling::{cache_state, expiry_threshold};
    use crate::fetch::service::service_test_utils::{counting_hooks, service, SharedMapCache};
    use crate::hooks::Hooks;
    use crate::model::entry::ConfigEntry;
    use crate::model::enums::ClientCacheState;
    use crate::modes::PollingMode;
    use crate::ConfigCache;

    const JSON: &str = r#"{"f": {}}"#;

    #[test]
    fn states_by_mode() {
        let fresh = ConfigEntry::from_json(JSON, None, Utc::now()).unwrap();
        let old = fresh.with_time(Utc::now() - TimeDelta::seconds(120));
        let auto = PollingMode::auto_poll(Duration::from_secs(60));
        let lazy = PollingMode::lazy_load(Duration::from_secs(60));

        assert_eq!(
            cache_state(&auto, &ConfigEntry::empty()),
            ClientCacheState::NoFlagData
        );
        assert_eq!(cache_state(&auto, &fresh), ClientCacheState::HasUpToDateFlagData);
        assert_eq!(cache_state(&auto, &old), ClientCacheState::HasCachedFlagDataOnly);
        assert_eq!(cache_state(&lazy, &fresh), ClientCacheState::HasUpToDateFlagData);
        assert_eq!(cache_state(&lazy, &old), ClientCacheState::HasCachedFlagDataOnly);
        assert_eq!(
            cache_state(&PollingMode::Manual, &fresh),
            ClientCacheState::HasCachedFlagDataOnly
        );
    }

    #[test]
    fn threshold_tolerance() {
        assert_eq!(
            expiry_threshold(Duration::from_secs(60)),
            Duration::from_millis(59_500)
        );
        assert_eq!(
            expiry_threshold(Duration::from_millis(600)),
            Duration::from_millis(300)
        );
    }

    #[tokio::test]
    async fn auto_poll_notifies_on_every_new_config() {
        let fetcher = Arc::new(CountingFetcher::new(Duration::ZERO, true));
        let (hooks, counters) = counting_hooks();
        let service = service(
            PollingMode::auto_poll(Duration::from_secs(1)),
            &fetcher,
            None,
            hooks,
            false,
        );

        tokio::time::sleep(Duration::from_millis(2500)).await;
        assert_eq!(fetcher.calls(), 3);
        assert_eq!(counters.changed(), 3);
        assert_eq!(
            service.wait_for_ready().await,
            ClientCacheState::HasUpToDateFlagData
        );
    }

    #[tokio::test]
    async fn auto_poll_notifies_once_for_same_content() {
        let fetcher = Arc::new(CountingFetcher::new(Duration::ZERO, false));
        let (hooks, counters) = counting_hooks();
        let _service = service(
            PollingMode::auto_poll(Duration::from_secs(1)),
            &fetcher,
            None,
            hooks,
            false,
        );

        tokio::time::sleep(Duration::from_millis(2500)).await;
        assert_eq!(fetcher.calls(), 3);
        assert_eq!(counters.fetched(), 3);
        assert_eq!(counters.changed(), 1);
    }

    #[tokio::test]
    async fn auto_poll_first_read_waits_for_fetch() {
        let fetcher = Arc::new(CountingFetcher::new(Duration::from_millis(200), true));
        let service = service(
            PollingMode::AutoPoll {
                poll_interval: Duration::from_secs(60),
                max_init_wait: Duration::from_secs(5),
            },
            &fetcher,
            None,
            Hooks::default(),
            false,
        );

        let entry = service.config().await;
        assert_eq!(entry.etag.as_deref(), Some("etag1"));
    }

    #[tokio::test]
    async fn auto_poll_init_wait_elapses() {
        let fetcher = Arc::new(CountingFetcher::new(Duration::from_secs(2), true));
        let service = service(
            PollingMode::AutoPoll {
                poll_interval: Duration::from_secs(60),
                max_init_wait: Duration::from_millis(100),
            },
            &fetcher,
            None,
            Hooks::default(),
            false,
        );

        let start = std::time::Instant::now();
        assert!(service.config().await.is_empty());
        assert!(start.elapsed() < Duration::from_secs(1));
        assert_eq!(service.wait_for_ready().await, ClientCacheState::NoFlagData);
    }

    #[tokio::test]
    async fn offline_auto_poll_reads_cache_written_by_others() {
        let fetcher = Arc::new(CountingFetcher::new(Duration::ZERO, true));
        let cache = SharedMapCache::default();
        let (hooks, counters) = counting_hooks();
        let service = service(
            PollingMode::auto_poll(Duration::from_millis(200)),
            &fetcher,
            Some(cache.clone()),
            hooks,
            true,
        );

        let key = "f83ba5d45bceb4bb704410f51b704fb6dfa19942";
        let first = ConfigEntry::from_json(
            r#"{"f": {"key": {"t": 1, "v": {"s": "a"}}}}"#,
            Some("a".to_owned()),
            Utc::now(),
        )
        .unwrap();
        cache.write(key, &first.serialize());
        tokio::time::sleep(Duration::from_millis(500)).await;
        assert_eq!(counters.changed(), 1);
        assert_eq!(
            service.wait_for_ready().await,
            ClientCacheState::HasCachedFlagDataOnly
        );

        let second = ConfigEntry::from_json(
            r#"{"f": {"key": {"t": 1, "v": {"s": "b"}}}}"#,
            Some("b".to_owned()),
            Utc::now(),
        )
        .unwrap();
        cache.write(key, &second.serialize());
        tokio::time::sleep(Duration::from_millis(500)).await;
        assert_eq!(counters.changed(), 2);
        assert_eq!(service.snapshot().etag.as_deref(), Some("b"));
        assert_eq!(fetcher.calls(), 0);
    }

    #[tokio::test]
    async fn offline_auto_poll_skips_outdated_cache_writes() {
        let fetcher = Arc::new(CountingFetcher::new(Duration::ZERO, true));
        let cache = SharedMapCache::default();
        let (hooks, counters) = counting_hooks();
        let service = service(
            PollingMode::auto_poll(Duration::from_millis(100)),
            &fetcher,
            Some(cache.clone()),
            hooks,
            true,
        );

        let key = "f83ba5d45bceb4bb704410f51b704fb6dfa19942";
        let current = ConfigEntry::from_json(
            r#"{"f": {"key": {"t": 1, "v": {"s": "a"}}}}"#,
            Some("a".to_owned()),
            Utc::now(),
        )
        .unwrap();
        cache.write(key, &current.serialize());
        tokio::time::sleep(Duration::from_millis(300)).await;
        assert_eq!(counters.changed(), 1);

        let outdated = ConfigEntry::from_json(
            r#"{"f": {"key": {"t": 1, "v": {"s": "b"}}}}"#,
            Some("b".to_owned()),
            Utc::now() - TimeDelta::seconds(60),
        )
        .unwrap();
        cache.write(key, &outdated.serialize());
        tokio::time::sleep(Duration::from_millis(300)).await;
        assert_eq!(counters.changed(), 1);
        assert_eq!(service.snapshot().etag.as_deref(), Some("a"));
        assert_eq!(fetcher.calls(), 0);
    }

    #[tokio::test]
    async fn poll_stops_on_close() {
        let fetcher = Arc::new(CountingFetcher::new(Duration::ZERO, true));
        let service = service(
            PollingMode::auto_poll(Duration::from_millis(100)),
            &fetcher,
            None,
            Hooks::default(),
            false,
        );
        tokio::time::sleep(Duration::from_millis(250)).await;
        service.close();
        let calls = fetcher.calls();
        tokio::time::sleep(Duration::from_millis(300)).await;
        assert_eq!(fetcher.calls(), calls);
    }

    #[tokio::test]
    async fn going_online_restarts_polling() {
        let fetcher = Arc::new(CountingFetcher::new(Duration::ZERO, true));
        let service = service(
            PollingMode::auto_poll(Duration::from_millis(200)),
            &fetcher,
            None,
            Hooks::default(),
            true,
        );
        tokio::time::sleep(Duration::from_millis(300)).await;
        assert_eq!(fetcher.calls(), 0);

        service.set_online();
        tokio::time::sleep(Duration::from_millis(100)).await;
        assert_eq!(fetcher.calls(), 1);
        assert!(!service.is_offline());
    }
}
