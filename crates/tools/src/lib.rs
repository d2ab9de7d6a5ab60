//! Support code for the `freemap` command line tool.

use catalog::poi::{ApiLocation, Poi};
use layers::viewport::ViewportConfig;
use locations::fetch::{FetchError, LocationFetcher, locations_url};
use motion::phase::{Phase, PhaseAnimator};
use reqwest::Client;
use serde::Serialize;
use tracing::debug;

pub const DEFAULT_API_BASE: &str = "https://tma-ofm-react-template.vercel.app";
pub const API_BASE_ENV: &str = "FREEMAP_API_BASE";

/// Fetches the location list over HTTPS.
#[derive(Debug, Clone)]
pub struct ReqwestFetcher {
    client: Client,
    url: String,
}

impl ReqwestFetcher {
    pub fn new(client: Client, api_base: &str) -> Self {
        Self {
            client,
            url: locations_url(api_base),
        }
    }

    pub fn url(&self) -> &str {
        &self.url
    }
}

impl LocationFetcher for ReqwestFetcher {
    async fn fetch(&self) -> Result<Vec<ApiLocation>, FetchError> {
        debug!(url = %self.url, "GET locations");
        let resp = self
            .client
            .get(&self.url)
            .send()
            .await
            .map_err(|e| FetchError::Network(e.to_string()))?;
        let status = resp.status();
        if !status.is_success() {
            return Err(FetchError::Status(status.as_u16()));
        }
        resp.json::<Vec<ApiLocation>>()
            .await
            .map_err(|e| FetchError::Decode(e.to_string()))
    }
}

/// `steps + 1` evenly spaced progress values from 0 to 1.
pub fn sample_points(steps: u32) -> Vec<f64> {
    let steps = steps.max(1);
    (0..=steps).map(|i| i as f64 / steps as f64).collect()
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PhaseRow {
    pub progress: f64,
    pub map: f64,
    pub detail: f64,
    pub saved: f64,
    pub dominant: &'static str,
    /// `"map->detail"` style name of the transition band, if inside one.
    pub band: Option<String>,
}

pub fn phase_table(animator: &PhaseAnimator, steps: u32) -> Vec<PhaseRow> {
    sample_points(steps)
        .into_iter()
        .map(|p| PhaseRow {
            progress: p,
            map: animator.phase_state(Phase::Map, p).opacity,
            detail: animator.phase_state(Phase::Detail, p).opacity,
            saved: animator.phase_state(Phase::Saved, p).opacity,
            dominant: animator.dominant_phase(p).name(),
            band: animator
                .band_at(p)
                .map(|b| format!("{}->{}", b.from.name(), b.to.name())),
        })
        .collect()
}

pub fn render_phase_table(rows: &[PhaseRow]) -> String {
    let mut out = String::from("progress  map    detail saved  dominant  band\n");
    for r in rows {
        out.push_str(&format!(
            "{:<8.3}  {:<5.3}  {:<5.3}  {:<5.3}  {:<8}  {}\n",
            r.progress,
            r.map,
            r.detail,
            r.saved,
            r.dominant,
            r.band.as_deref().unwrap_or("-"),
        ));
    }
    out
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ViewportRow {
    pub progress: f64,
    pub lat: f64,
    pub lng: f64,
    pub zoom: f64,
}

pub fn viewport_path(config: &ViewportConfig, steps: u32) -> Vec<ViewportRow> {
    sample_points(steps)
        .into_iter()
        .map(|p| {
            let center = config.center_at(p);
            ViewportRow {
                progress: p,
                lat: center.lat,
                lng: center.lng,
                zoom: config.zoom_at(p),
            }
        })
        .collect()
}

pub fn render_viewport_path(rows: &[ViewportRow]) -> String {
    let mut out = String::from("progress  lat        lng          zoom\n");
    for r in rows {
        out.push_str(&format!(
            "{:<8.3}  {:<9.5}  {:<11.5}  {:.3}\n",
            r.progress, r.lat, r.lng, r.zoom
        ));
    }
    out
}

pub fn render_locations(records: &[Poi]) -> String {
    let mut out = format!("{}\n", layers::sync::list_header(records.len()));
    for p in records {
        out.push_str(&format!(
            "{:>5}  {:<15} {:<32} {:.5},{:.5}\n",
            p.id.as_str(),
            p.category.as_str(),
            p.name,
            p.latitude,
            p.longitude
        ));
    }
    out
}
