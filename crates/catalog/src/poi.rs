use std::collections::BTreeSet;

use foundation::geo::LatLng;
use foundation::ids::PoiId;
use serde::{Deserialize, Serialize};

/// Thumbnail assigned to records that arrive without an image.
pub const DEFAULT_THUMBNAIL: &str =
    "https://images.unsplash.com/photo-1502602898657-3e91760cbb34?w=200&h=150&fit=crop";

/// Closed category taxonomy. Anything unrecognised is `Other`.
#[derive(Debug, Copy, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum Category {
    Landmark,
    Cafe,
    Shopping,
    Restaurant,
    RestaurantBar,
    Grocery,
    Entertainment,
    Other,
}

impl Category {
    pub const ALL: [Category; 8] = [
        Category::Landmark,
        Category::Cafe,
        Category::Shopping,
        Category::Restaurant,
        Category::RestaurantBar,
        Category::Grocery,
        Category::Entertainment,
        Category::Other,
    ];

    pub fn parse(raw: &str) -> Self {
        match raw.trim().to_ascii_lowercase().as_str() {
            "landmark" => Category::Landmark,
            "cafe" => Category::Cafe,
            "shopping" => Category::Shopping,
            "restaurant" => Category::Restaurant,
            "restaurant-bar" => Category::RestaurantBar,
            "grocery" => Category::Grocery,
            "entertainment" => Category::Entertainment,
            _ => Category::Other,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Category::Landmark => "landmark",
            Category::Cafe => "cafe",
            Category::Shopping => "shopping",
            Category::Restaurant => "restaurant",
            Category::RestaurantBar => "restaurant-bar",
            Category::Grocery => "grocery",
            Category::Entertainment => "entertainment",
            Category::Other => "other",
        }
    }

    /// Human-readable label shown next to list rows.
    pub fn label(self) -> String {
        self.as_str().replace('-', " ")
    }
}

impl From<String> for Category {
    fn from(raw: String) -> Self {
        Category::parse(&raw)
    }
}

impl From<Category> for String {
    fn from(c: Category) -> Self {
        c.as_str().to_string()
    }
}

/// Point of interest as held by the location store.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Poi {
    pub id: PoiId,
    pub name: String,
    pub latitude: f64,
    pub longitude: f64,
    pub category: Category,
    pub description: String,
    pub thumbnail_url: String,
}

impl Poi {
    pub fn position(&self) -> LatLng {
        LatLng::new(self.latitude, self.longitude)
    }

    pub fn details_path(&self) -> String {
        format!("/locations/{}", self.id)
    }
}

/// Record as served by `GET /api/locations`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ApiLocation {
    pub id: u64,
    #[serde(default)]
    pub user_id: Option<u64>,
    pub name: String,
    #[serde(default)]
    pub description: Option<String>,
    pub latitude: f64,
    pub longitude: f64,
    #[serde(default)]
    pub category: String,
    #[serde(default)]
    pub image_url: Option<String>,
    #[serde(default)]
    pub website_url: Option<String>,
    #[serde(default)]
    pub schedules: Option<String>,
    #[serde(default)]
    pub is_approved: bool,
    #[serde(default)]
    pub created_at: String,
}

impl From<ApiLocation> for Poi {
    fn from(api: ApiLocation) -> Self {
        let thumbnail_url = match api.image_url {
            Some(url) if !url.trim().is_empty() => url,
            _ => DEFAULT_THUMBNAIL.to_string(),
        };
        Poi {
            id: PoiId::from(api.id),
            name: api.name,
            latitude: api.latitude,
            longitude: api.longitude,
            category: Category::parse(&api.category),
            description: api.description.unwrap_or_default(),
            thumbnail_url,
        }
    }
}

/// Converts an API payload into store records.
///
/// Server order is kept; a repeated id keeps its first occurrence.
pub fn into_pois(api: Vec<ApiLocation>) -> Vec<Poi> {
    dedup_by_id(api.into_iter().map(Poi::from))
}

pub fn dedup_by_id(records: impl IntoIterator<Item = Poi>) -> Vec<Poi> {
    let mut seen: BTreeSet<PoiId> = BTreeSet::new();
    records
        .into_iter()
        .filter(|p| seen.insert(p.id.clone()))
        .collect()
}
