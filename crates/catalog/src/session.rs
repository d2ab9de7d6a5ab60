use std::cell::RefCell;
use std::collections::BTreeMap;
use std::rc::Rc;

use foundation::time::Millis;

use crate::poi::Poi;

pub const FEATURED_LOCATIONS_KEY: &str = "featured_locations";
pub const FEATURED_LOCATIONS_TIME_KEY: &str = "featured_locations_time";

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SessionError {
    StorageUnavailable,
    Corrupt(String),
    Io(String),
}

impl std::fmt::Display for SessionError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            SessionError::StorageUnavailable => write!(f, "session storage unavailable"),
            SessionError::Corrupt(msg) => write!(f, "session cache corrupt: {msg}"),
            SessionError::Io(msg) => write!(f, "session storage error: {msg}"),
        }
    }
}

impl std::error::Error for SessionError {}

/// Session-scoped string key/value storage.
pub trait SessionStore {
    fn get_item(&self, key: &str) -> Result<Option<String>, SessionError>;
    fn set_item(&self, key: &str, value: &str) -> Result<(), SessionError>;
    fn remove_item(&self, key: &str) -> Result<(), SessionError>;
}

/// In-process session storage. Clones share the same items, like two views
/// of one browser tab.
#[derive(Debug, Default, Clone)]
pub struct InMemorySessionStore {
    items: Rc<RefCell<BTreeMap<String, String>>>,
}

impl InMemorySessionStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.items.borrow().len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.borrow().is_empty()
    }
}

impl SessionStore for InMemorySessionStore {
    fn get_item(&self, key: &str) -> Result<Option<String>, SessionError> {
        Ok(self.items.borrow().get(key).cloned())
    }

    fn set_item(&self, key: &str, value: &str) -> Result<(), SessionError> {
        self.items
            .borrow_mut()
            .insert(key.to_string(), value.to_string());
        Ok(())
    }

    fn remove_item(&self, key: &str) -> Result<(), SessionError> {
        self.items.borrow_mut().remove(key);
        Ok(())
    }
}

/// Location records persisted for the rest of the browser session.
#[derive(Debug, Clone, PartialEq)]
pub struct CachedLocations {
    pub records: Vec<Poi>,
    pub fetched_at: Millis,
}

/// Reads the persisted location cache.
///
/// Both keys must be present; a half-written pair reads as a miss.
pub fn read_cached(store: &dyn SessionStore) -> Result<Option<CachedLocations>, SessionError> {
    let Some(raw_records) = store.get_item(FEATURED_LOCATIONS_KEY)? else {
        return Ok(None);
    };
    let Some(raw_time) = store.get_item(FEATURED_LOCATIONS_TIME_KEY)? else {
        return Ok(None);
    };

    let fetched_at = raw_time
        .trim()
        .parse::<u64>()
        .map_err(|e| SessionError::Corrupt(format!("invalid cache time: {e}")))?;
    let records = serde_json::from_str::<Vec<Poi>>(&raw_records)
        .map_err(|e| SessionError::Corrupt(e.to_string()))?;

    Ok(Some(CachedLocations {
        records,
        fetched_at: Millis(fetched_at),
    }))
}

pub fn write_cached(store: &dyn SessionStore, cached: &CachedLocations) -> Result<(), SessionError> {
    let raw = serde_json::to_string(&cached.records).map_err(|e| SessionError::Io(e.to_string()))?;
    store.set_item(FEATURED_LOCATIONS_KEY, &raw)?;
    store.set_item(FEATURED_LOCATIONS_TIME_KEY, &cached.fetched_at.0.to_string())?;
    Ok(())
}

pub fn clear_cached(store: &dyn SessionStore) -> Result<(), SessionError> {
    store.remove_item(FEATURED_LOCATIONS_KEY)?;
    store.remove_item(FEATURED_LOCATIONS_TIME_KEY)?;
    Ok(())
}

#[cfg(target_arch = "wasm32")]
mod browser {
    use super::{SessionError, SessionStore};

    /// `window.sessionStorage`.
    #[derive(Debug)]
    pub struct BrowserSessionStore {
        storage: web_sys::Storage,
    }

    impl BrowserSessionStore {
        pub fn new() -> Result<Self, SessionError> {
            let win = web_sys::window().ok_or(SessionError::StorageUnavailable)?;
            let storage = win
                .session_storage()
                .map_err(|e| SessionError::Io(format!("sessionStorage error: {:?}", e)))?
                .ok_or(SessionError::StorageUnavailable)?;
            Ok(Self { storage })
        }
    }

    impl SessionStore for BrowserSessionStore {
        fn get_item(&self, key: &str) -> Result<Option<String>, SessionError> {
            self.storage
                .get_item(key)
                .map_err(|e| SessionError::Io(format!("get_item({key}) failed: {:?}", e)))
        }

        fn set_item(&self, key: &str, value: &str) -> Result<(), SessionError> {
            // Quota errors land here; the in-memory cache still holds the data.
            self.storage
                .set_item(key, value)
                .map_err(|e| SessionError::Io(format!("set_item({key}) failed: {:?}", e)))
        }

        fn remove_item(&self, key: &str) -> Result<(), SessionError> {
            self.storage
                .remove_item(key)
                .map_err(|e| SessionError::Io(format!("remove_item({key}) failed: {:?}", e)))
        }
    }
}

#[cfg(target_arch = "wasm32")]
pub use browser::BrowserSessionStore;

#[cfg(not(target_arch = "wasm32"))]
#[derive(Debug)]
pub struct BrowserSessionStore;

#[cfg(not(target_arch = "wasm32"))]
impl BrowserSessionStore {
    pub fn new() -> Result<Self, SessionError> {
        Err(SessionError::StorageUnavailable)
    }
}

#[cfg(not(target_arch = "wasm32"))]
impl SessionStore for BrowserSessionStore {
    fn get_item(&self, _key: &str) -> Result<Option<String>, SessionError> {
        Err(SessionError::StorageUnavailable)
    }

    fn set_item(&self, _key: &str, _value: &str) -> Result<(), SessionError> {
        Err(SessionError::StorageUnavailable)
    }

    fn remove_item(&self, _key: &str) -> Result<(), SessionError> {
        Err(SessionError::StorageUnavailable)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::poi::{Category, DEFAULT_THUMBNAIL};
    use foundation::ids::PoiId;
    use pretty_assertions::assert_eq;

    fn poi(id: &str) -> Poi {
        Poi {
            id: PoiId::new(id),
            name: format!("place {id}"),
            latitude: 48.85,
            longitude: 2.35,
            category: Category::Cafe,
            description: String::new(),
            thumbnail_url: DEFAULT_THUMBNAIL.to_string(),
        }
    }

    #[test]
    fn write_then_read_uses_both_keys() {
        let store = InMemorySessionStore::new();
        let cached = CachedLocations {
            records: vec![poi("1"), poi("2")],
            fetched_at: Millis(1_700_000_000_000),
        };
        write_cached(&store, &cached).unwrap();

        assert_eq!(
            store.get_item(FEATURED_LOCATIONS_TIME_KEY).unwrap().as_deref(),
            Some("1700000000000")
        );
        assert_eq!(read_cached(&store).unwrap(), Some(cached));
    }

    #[test]
    fn missing_time_key_is_a_miss() {
        let store = InMemorySessionStore::new();
        store.set_item(FEATURED_LOCATIONS_KEY, "[]").unwrap();
        assert_eq!(read_cached(&store).unwrap(), None);
    }

    #[test]
    fn garbage_is_reported_as_corrupt() {
        let store = InMemorySessionStore::new();
        store.set_item(FEATURED_LOCATIONS_KEY, "{not json").unwrap();
        store.set_item(FEATURED_LOCATIONS_TIME_KEY, "123").unwrap();
        assert!(matches!(read_cached(&store), Err(SessionError::Corrupt(_))));

        store.set_item(FEATURED_LOCATIONS_KEY, "[]").unwrap();
        store.set_item(FEATURED_LOCATIONS_TIME_KEY, "yesterday").unwrap();
        assert!(matches!(read_cached(&store), Err(SessionError::Corrupt(_))));
    }

    #[test]
    fn clear_removes_both_keys() {
        let store = InMemorySessionStore::new();
        write_cached(
            &store,
            &CachedLocations {
                records: vec![],
                fetched_at: Millis(1),
            },
        )
        .unwrap();
        assert_eq!(store.len(), 2);
        clear_cached(&store).unwrap();
        assert!(store.is_empty());
    }

    #[test]
    fn clones_share_items() {
        let a = InMemorySessionStore::new();
        let b = a.clone();
        a.set_item("k", "v").unwrap();
        assert_eq!(b.get_item("k").unwrap().as_deref(), Some("v"));
    }

    #[cfg(not(target_arch = "wasm32"))]
    #[test]
    fn browser_store_is_unavailable_natively() {
        assert_eq!(
            BrowserSessionStore::new().unwrap_err(),
            SessionError::StorageUnavailable
        );
    }
}
