use catalog::poi::ApiLocation;
use gloo_net::http::Request;
use locations::fetch::{FetchError, LocationFetcher, locations_url};

/// Fetches the location list with the browser `fetch` API.
#[derive(Debug, Clone)]
pub struct GlooFetcher {
    url: String,
}

impl GlooFetcher {
    pub fn new(api_base: &str) -> Self {
        Self {
            url: locations_url(api_base),
        }
    }
}

impl LocationFetcher for GlooFetcher {
    async fn fetch(&self) -> Result<Vec<ApiLocation>, FetchError> {
        let resp = Request::get(&self.url)
            .send()
            .await
            .map_err(|e| FetchError::Network(e.to_string()))?;
        if !resp.ok() {
            return Err(FetchError::Status(resp.status()));
        }
        let text = resp
            .text()
            .await
            .map_err(|e| FetchError::Network(e.to_string()))?;
        serde_json::from_str(&text).map_err(|e| FetchError::Decode(e.to_string()))
    }
}
