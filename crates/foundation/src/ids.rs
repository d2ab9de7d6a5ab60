use serde::{Deserialize, Serialize};

/// Identity of a point of interest.
///
/// The upstream API uses numeric ids; they are stringified once at the data
/// boundary and compared as opaque strings from then on.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct PoiId(String);

impl PoiId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl From<u64> for PoiId {
    fn from(n: u64) -> Self {
        Self(n.to_string())
    }
}

impl From<&str> for PoiId {
    fn from(s: &str) -> Self {
        Self(s.to_string())
    }
}

impl std::fmt::Display for PoiId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}
