use std::cell::RefCell;

use catalog::poi::{ApiLocation, Poi, into_pois};
use catalog::session::{
    CachedLocations, SessionError, SessionStore, clear_cached, read_cached, write_cached,
};
use foundation::time::{Clock, Millis};
use runtime::metrics::Metrics;
use tracing::{debug, warn};

use crate::fetch::{FetchError, LocationFetcher};
use crate::request::LoadTicket;

/// Cached records stay fresh for five minutes.
pub const DEFAULT_TTL_MS: u64 = 300_000;

pub const METRIC_CACHE_HIT: &str = "locations.cache_hit";
pub const METRIC_FETCH: &str = "locations.fetch";
pub const METRIC_FETCH_FAILED: &str = "locations.fetch_failed";
pub const METRIC_STALE_DISCARDED: &str = "locations.stale_discarded";
pub const METRIC_RECORDS: &str = "locations.records";

#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub struct StoreConfig {
    pub ttl_ms: u64,
}

impl Default for StoreConfig {
    fn default() -> Self {
        Self {
            ttl_ms: DEFAULT_TTL_MS,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct CacheEntry {
    pub records: Vec<Poi>,
    pub fetched_at: Millis,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LoadStatus {
    Idle,
    Loading(LoadTicket),
    Ready { count: usize },
    Failed(FetchError),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LoadError {
    Fetch(FetchError),
    /// A newer load started before this one finished; its result was dropped.
    Superseded,
}

impl std::fmt::Display for LoadError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            LoadError::Fetch(e) => write!(f, "{e}"),
            LoadError::Superseded => write!(f, "load superseded by a newer request"),
        }
    }
}

impl std::error::Error for LoadError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            LoadError::Fetch(e) => Some(e),
            LoadError::Superseded => None,
        }
    }
}

/// Outcome of starting a load.
#[derive(Debug, Clone, PartialEq)]
pub enum LoadStart {
    /// Served from a fresh cache entry; no request was issued.
    Cached(Vec<Poi>),
    /// The caller must fetch and hand the result to `complete`.
    Fetch(LoadTicket),
}

/// Point-of-interest list with a single TTL cache slot.
///
/// Loads are split into `begin_load` / `complete` so the network wait happens
/// outside any borrow of the store. Every fetch gets a ticket and every load,
/// cache hits included, advances the sequence; a completion whose ticket is
/// not the newest is discarded.
pub struct LocationStore {
    config: StoreConfig,
    clock: Box<dyn Clock>,
    session: Option<Box<dyn SessionStore>>,
    entry: Option<CacheEntry>,
    last_ticket: u64,
    status: LoadStatus,
    metrics: Metrics,
}

impl std::fmt::Debug for LocationStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("LocationStore")
            .field("config", &self.config)
            .field("entry", &self.entry)
            .field("last_ticket", &self.last_ticket)
            .field("status", &self.status)
            .finish_non_exhaustive()
    }
}

impl LocationStore {
    pub fn new(clock: impl Clock + 'static) -> Self {
        Self {
            config: StoreConfig::default(),
            clock: Box::new(clock),
            session: None,
            entry: None,
            last_ticket: 0,
            status: LoadStatus::Idle,
            metrics: Metrics::new(),
        }
    }

    pub fn with_config(mut self, config: StoreConfig) -> Self {
        self.config = config;
        self
    }

    /// Persists successful loads to `session` and adopts whatever an earlier
    /// page view left there.
    pub fn with_session(mut self, session: impl SessionStore + 'static) -> Self {
        match read_cached(&session) {
            Ok(Some(cached)) => {
                debug!(
                    records = cached.records.len(),
                    fetched_at = cached.fetched_at.0,
                    "hydrated location cache from session"
                );
                self.entry = Some(CacheEntry {
                    records: cached.records,
                    fetched_at: cached.fetched_at,
                });
            }
            Ok(None) => {}
            Err(SessionError::Corrupt(msg)) => {
                warn!("discarding corrupt session cache: {msg}");
                if let Err(e) = clear_cached(&session) {
                    warn!("failed to clear session cache: {e}");
                }
            }
            Err(e) => warn!("session cache unavailable: {e}"),
        }
        self.session = Some(Box::new(session));
        self
    }

    pub fn status(&self) -> &LoadStatus {
        &self.status
    }

    pub fn is_loading(&self) -> bool {
        matches!(self.status, LoadStatus::Loading(_))
    }

    pub fn metrics(&self) -> &Metrics {
        &self.metrics
    }

    /// Records to render right now.
    ///
    /// Empty unless the most recent load finished successfully, so nothing is
    /// interactive while a request is outstanding or after a failure.
    pub fn records(&self) -> &[Poi] {
        match (&self.status, &self.entry) {
            (LoadStatus::Ready { .. }, Some(entry)) => &entry.records,
            _ => &[],
        }
    }

    /// Last successful result regardless of age or current status.
    pub fn last_known_good(&self) -> Option<&CacheEntry> {
        self.entry.as_ref()
    }

    pub fn find(&self, id: &str) -> Option<&Poi> {
        self.records().iter().find(|p| p.id.as_str() == id)
    }

    fn fresh_entry(&self) -> Option<&CacheEntry> {
        let now = self.clock.now();
        self.entry
            .as_ref()
            .filter(|e| now.since(e.fetched_at) <= self.config.ttl_ms)
    }

    pub fn begin_load(&mut self, force_refresh: bool) -> LoadStart {
        if !force_refresh {
            if let Some(entry) = self.fresh_entry() {
                let records = entry.records.clone();
                debug!(records = records.len(), "location cache hit");
                // Supersedes any fetch still in flight.
                self.last_ticket += 1;
                self.metrics.inc(METRIC_CACHE_HIT);
                self.status = LoadStatus::Ready {
                    count: records.len(),
                };
                return LoadStart::Cached(records);
            }
        }

        self.last_ticket += 1;
        let ticket = LoadTicket(self.last_ticket);
        debug!(ticket = ticket.0, force_refresh, "fetching locations");
        self.metrics.inc(METRIC_FETCH);
        self.status = LoadStatus::Loading(ticket);
        LoadStart::Fetch(ticket)
    }

    pub fn complete(
        &mut self,
        ticket: LoadTicket,
        result: Result<Vec<ApiLocation>, FetchError>,
    ) -> Result<Vec<Poi>, LoadError> {
        if ticket.0 != self.last_ticket {
            warn!(
                ticket = ticket.0,
                newest = self.last_ticket,
                "discarding superseded location response"
            );
            self.metrics.inc(METRIC_STALE_DISCARDED);
            return Err(LoadError::Superseded);
        }

        match result {
            Ok(api) => {
                let records = into_pois(api);
                let fetched_at = self.clock.now();
                self.persist(&records, fetched_at);
                self.metrics.set_gauge(METRIC_RECORDS, records.len() as i64);
                self.status = LoadStatus::Ready {
                    count: records.len(),
                };
                self.entry = Some(CacheEntry {
                    records: records.clone(),
                    fetched_at,
                });
                Ok(records)
            }
            Err(e) => {
                warn!("location fetch failed: {e}");
                self.metrics.inc(METRIC_FETCH_FAILED);
                self.status = LoadStatus::Failed(e.clone());
                Err(LoadError::Fetch(e))
            }
        }
    }

    /// Drops the cache entry, in memory and in the session.
    pub fn invalidate(&mut self) {
        self.entry = None;
        if !self.is_loading() {
            self.status = LoadStatus::Idle;
        }
        if let Some(session) = &self.session {
            if let Err(e) = clear_cached(session.as_ref()) {
                warn!("failed to clear session cache: {e}");
            }
        }
    }

    fn persist(&self, records: &[Poi], fetched_at: Millis) {
        let Some(session) = &self.session else {
            return;
        };
        let cached = CachedLocations {
            records: records.to_vec(),
            fetched_at,
        };
        // The in-memory entry is authoritative; a failed write only costs a
        // refetch on the next page view.
        if let Err(e) = write_cached(session.as_ref(), &cached) {
            warn!("failed to persist location cache: {e}");
        }
    }
}

/// Serves from cache when fresh, otherwise fetches through `fetcher`.
///
/// The store is only borrowed before and after the fetch, so other loads may
/// start while this one waits.
pub async fn load<F: LocationFetcher>(
    store: &RefCell<LocationStore>,
    fetcher: &F,
    force_refresh: bool,
) -> Result<Vec<Poi>, LoadError> {
    let ticket = match store.borrow_mut().begin_load(force_refresh) {
        LoadStart::Cached(records) => return Ok(records),
        LoadStart::Fetch(ticket) => ticket,
    };
    let result = fetcher.fetch().await;
    store.borrow_mut().complete(ticket, result)
}

#[cfg(test)]
mod tests {
    use super::*;
    use catalog::poi::DEFAULT_THUMBNAIL;
    use catalog::session::{
        FEATURED_LOCATIONS_KEY, FEATURED_LOCATIONS_TIME_KEY, InMemorySessionStore,
    };
    use foundation::time::ManualClock;
    use pretty_assertions::assert_eq;
    use std::cell::Cell;
    use std::collections::VecDeque;

    fn api(id: u64, name: &str) -> ApiLocation {
        ApiLocation {
            id,
            user_id: None,
            name: name.to_string(),
            description: Some(format!("about {name}")),
            latitude: 48.85 + id as f64 * 0.001,
            longitude: 2.35,
            category: "cafe".to_string(),
            image_url: None,
            website_url: None,
            schedules: None,
            is_approved: true,
            created_at: "2024-01-01T00:00:00Z".to_string(),
        }
    }

    /// Replays scripted responses and counts calls.
    #[derive(Default)]
    struct ScriptedFetcher {
        responses: RefCell<VecDeque<Result<Vec<ApiLocation>, FetchError>>>,
        calls: Cell<usize>,
    }

    impl ScriptedFetcher {
        fn then(self, response: Result<Vec<ApiLocation>, FetchError>) -> Self {
            self.responses.borrow_mut().push_back(response);
            self
        }
    }

    impl LocationFetcher for ScriptedFetcher {
        async fn fetch(&self) -> Result<Vec<ApiLocation>, FetchError> {
            self.calls.set(self.calls.get() + 1);
            self.responses
                .borrow_mut()
                .pop_front()
                .unwrap_or(Err(FetchError::Network("no scripted response".into())))
        }
    }

    fn ids(records: &[Poi]) -> Vec<&str> {
        records.iter().map(|p| p.id.as_str()).collect()
    }

    #[test]
    fn fresh_cache_is_served_without_fetching() {
        let clock = ManualClock::new(1_000_000);
        let store = RefCell::new(LocationStore::new(clock.clone()));
        let fetcher = ScriptedFetcher::default()
            .then(Ok(vec![api(1, "a"), api(2, "b")]))
            .then(Ok(vec![api(3, "c")]));

        let first = pollster::block_on(load(&store, &fetcher, false)).unwrap();
        assert_eq!(fetcher.calls.get(), 1);

        clock.advance(300_000);
        let second = pollster::block_on(load(&store, &fetcher, false)).unwrap();
        assert_eq!(fetcher.calls.get(), 1);
        assert_eq!(second, first);

        clock.advance(1);
        let third = pollster::block_on(load(&store, &fetcher, false)).unwrap();
        assert_eq!(fetcher.calls.get(), 2);
        assert_eq!(ids(&third), vec!["3"]);

        let m = store.borrow();
        assert_eq!(m.metrics().counter(METRIC_CACHE_HIT), 1);
        assert_eq!(m.metrics().counter(METRIC_FETCH), 2);
    }

    #[test]
    fn force_refresh_bypasses_a_fresh_cache() {
        let store = RefCell::new(LocationStore::new(ManualClock::new(0)));
        let fetcher = ScriptedFetcher::default()
            .then(Ok(vec![api(1, "a")]))
            .then(Ok(vec![api(1, "a"), api(2, "b")]));

        pollster::block_on(load(&store, &fetcher, false)).unwrap();
        let refreshed = pollster::block_on(load(&store, &fetcher, true)).unwrap();
        assert_eq!(fetcher.calls.get(), 2);
        assert_eq!(ids(&refreshed), vec!["1", "2"]);
    }

    #[test]
    fn failure_keeps_last_known_good_and_allows_retry() {
        let clock = ManualClock::new(0);
        let store = RefCell::new(LocationStore::new(clock.clone()));
        let fetcher = ScriptedFetcher::default()
            .then(Ok(vec![api(1, "a")]))
            .then(Err(FetchError::Status(502)))
            .then(Ok(vec![api(2, "b")]));

        pollster::block_on(load(&store, &fetcher, false)).unwrap();
        clock.advance(400_000);

        let err = pollster::block_on(load(&store, &fetcher, false)).unwrap_err();
        assert_eq!(err, LoadError::Fetch(FetchError::Status(502)));
        {
            let s = store.borrow();
            assert_eq!(s.status(), &LoadStatus::Failed(FetchError::Status(502)));
            assert!(s.records().is_empty());
            let kept = s.last_known_good().unwrap();
            assert_eq!(ids(&kept.records), vec!["1"]);
            assert_eq!(kept.fetched_at, Millis(0));
        }

        let retried = pollster::block_on(load(&store, &fetcher, false)).unwrap();
        assert_eq!(ids(&retried), vec!["2"]);
        assert_eq!(store.borrow().metrics().counter(METRIC_FETCH_FAILED), 1);
    }

    #[test]
    fn first_load_failure_leaves_no_records() {
        let store = RefCell::new(LocationStore::new(ManualClock::new(0)));
        let fetcher =
            ScriptedFetcher::default().then(Err(FetchError::Network("offline".into())));

        assert!(pollster::block_on(load(&store, &fetcher, false)).is_err());
        let s = store.borrow();
        assert!(s.records().is_empty());
        assert!(s.last_known_good().is_none());
    }

    #[test]
    fn older_response_arriving_last_is_discarded() {
        let mut store = LocationStore::new(ManualClock::new(0));

        let LoadStart::Fetch(first) = store.begin_load(true) else {
            panic!("expected a fetch");
        };
        let LoadStart::Fetch(second) = store.begin_load(true) else {
            panic!("expected a fetch");
        };
        assert!(second > first);

        let newer = store.complete(second, Ok(vec![api(2, "new")])).unwrap();
        assert_eq!(ids(&newer), vec!["2"]);

        let older = store.complete(first, Ok(vec![api(1, "old")]));
        assert_eq!(older, Err(LoadError::Superseded));
        assert_eq!(ids(store.records()), vec!["2"]);
        assert_eq!(store.metrics().counter(METRIC_STALE_DISCARDED), 1);
    }

    #[test]
    fn older_response_arriving_first_is_also_discarded() {
        let mut store = LocationStore::new(ManualClock::new(0));
        let LoadStart::Fetch(first) = store.begin_load(true) else {
            panic!("expected a fetch");
        };
        let LoadStart::Fetch(second) = store.begin_load(true) else {
            panic!("expected a fetch");
        };

        assert_eq!(
            store.complete(first, Err(FetchError::Status(500))),
            Err(LoadError::Superseded)
        );
        assert!(store.is_loading());
        store.complete(second, Ok(vec![api(7, "x")])).unwrap();
        assert_eq!(store.status(), &LoadStatus::Ready { count: 1 });
    }

    #[test]
    fn cache_hit_supersedes_an_in_flight_refresh() {
        let mut store = LocationStore::new(ManualClock::new(0));
        let LoadStart::Fetch(initial) = store.begin_load(false) else {
            panic!("expected a fetch");
        };
        store.complete(initial, Ok(vec![api(1, "a")])).unwrap();

        let LoadStart::Fetch(refresh) = store.begin_load(true) else {
            panic!("expected a fetch");
        };
        let LoadStart::Cached(served) = store.begin_load(false) else {
            panic!("expected a cache hit");
        };
        assert_eq!(ids(&served), vec!["1"]);

        assert_eq!(
            store.complete(refresh, Err(FetchError::Status(500))),
            Err(LoadError::Superseded)
        );
        assert_eq!(store.status(), &LoadStatus::Ready { count: 1 });
        assert_eq!(ids(store.records()), vec!["1"]);
        assert_eq!(store.metrics().counter(METRIC_STALE_DISCARDED), 1);
    }

    #[test]
    fn nothing_is_exposed_while_loading() {
        let mut store = LocationStore::new(ManualClock::new(0));
        let LoadStart::Fetch(ticket) = store.begin_load(false) else {
            panic!("expected a fetch");
        };
        assert_eq!(store.status(), &LoadStatus::Loading(ticket));
        assert!(store.records().is_empty());
        assert!(store.find("1").is_none());

        store.complete(ticket, Ok(vec![api(1, "a")])).unwrap();
        assert_eq!(store.find("1").map(|p| p.name.as_str()), Some("a"));
    }

    #[test]
    fn empty_result_is_a_valid_ready_state() {
        let mut store = LocationStore::new(ManualClock::new(0));
        let LoadStart::Fetch(ticket) = store.begin_load(false) else {
            panic!("expected a fetch");
        };
        assert_eq!(store.complete(ticket, Ok(vec![])), Ok(vec![]));
        assert_eq!(store.status(), &LoadStatus::Ready { count: 0 });
        // An empty result still counts as a fresh cache entry.
        assert!(matches!(store.begin_load(false), LoadStart::Cached(r) if r.is_empty()));
    }

    #[test]
    fn duplicate_ids_are_collapsed_in_server_order() {
        let mut store = LocationStore::new(ManualClock::new(0));
        let LoadStart::Fetch(ticket) = store.begin_load(false) else {
            panic!("expected a fetch");
        };
        let records = store
            .complete(ticket, Ok(vec![api(5, "e"), api(1, "a"), api(5, "dup")]))
            .unwrap();
        assert_eq!(ids(&records), vec!["5", "1"]);
        assert_eq!(records[0].name, "e");
        assert_eq!(records[0].thumbnail_url, DEFAULT_THUMBNAIL);
    }

    #[test]
    fn session_cache_survives_a_new_store() {
        let clock = ManualClock::new(10_000);
        let session = InMemorySessionStore::new();
        let fetcher = ScriptedFetcher::default().then(Ok(vec![api(1, "a")]));

        let first = RefCell::new(LocationStore::new(clock.clone()).with_session(session.clone()));
        pollster::block_on(load(&first, &fetcher, false)).unwrap();
        assert_eq!(
            session.get_item(FEATURED_LOCATIONS_TIME_KEY).unwrap().as_deref(),
            Some("10000")
        );

        clock.advance(60_000);
        let second = RefCell::new(LocationStore::new(clock.clone()).with_session(session.clone()));
        let records = pollster::block_on(load(&second, &fetcher, false)).unwrap();
        assert_eq!(ids(&records), vec!["1"]);
        assert_eq!(fetcher.calls.get(), 1);
    }

    #[test]
    fn corrupt_session_cache_is_dropped() {
        let session = InMemorySessionStore::new();
        session.set_item(FEATURED_LOCATIONS_KEY, "[{").unwrap();
        session.set_item(FEATURED_LOCATIONS_TIME_KEY, "5").unwrap();

        let store = LocationStore::new(ManualClock::new(10)).with_session(session.clone());
        assert!(store.last_known_good().is_none());
        assert!(session.is_empty());
    }

    #[test]
    fn invalidate_clears_memory_and_session() {
        let session = InMemorySessionStore::new();
        let mut store = LocationStore::new(ManualClock::new(0)).with_session(session.clone());
        let LoadStart::Fetch(ticket) = store.begin_load(false) else {
            panic!("expected a fetch");
        };
        store.complete(ticket, Ok(vec![api(1, "a")])).unwrap();
        assert_eq!(session.len(), 2);

        store.invalidate();
        assert!(store.last_known_good().is_none());
        assert!(store.records().is_empty());
        assert!(session.is_empty());
        assert!(matches!(store.begin_load(false), LoadStart::Fetch(_)));
    }
}
