use std::future::Future;

use catalog::poi::ApiLocation;

pub const LOCATIONS_PATH: &str = "/api/locations";

/// Builds `<base>/api/locations`, tolerating a trailing slash on `base`.
pub fn locations_url(base: &str) -> String {
    format!("{}{LOCATIONS_PATH}", base.trim_end_matches('/'))
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FetchError {
    /// Request never produced a response.
    Network(String),
    /// Response with a non-success status.
    Status(u16),
    /// Response body was not a location array.
    Decode(String),
}

impl std::fmt::Display for FetchError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            FetchError::Network(msg) => write!(f, "failed to fetch locations: {msg}"),
            FetchError::Status(code) => write!(f, "locations endpoint returned status {code}"),
            FetchError::Decode(msg) => write!(f, "invalid locations payload: {msg}"),
        }
    }
}

impl std::error::Error for FetchError {}

/// Capability to retrieve the raw location list.
pub trait LocationFetcher {
    fn fetch(&self) -> impl Future<Output = Result<Vec<ApiLocation>, FetchError>>;
}
