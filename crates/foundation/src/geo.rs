/// Geographic position in decimal degrees.
#[derive(Debug, Copy, Clone, PartialEq)]
pub struct LatLng {
    pub lat: f64,
    pub lng: f64,
}

impl LatLng {
    pub const fn new(lat: f64, lng: f64) -> Self {
        Self { lat, lng }
    }

    pub fn is_finite(&self) -> bool {
        self.lat.is_finite() && self.lng.is_finite()
    }

    /// `[lat, lng]` pair in the order tile map libraries expect.
    pub fn to_array(self) -> [f64; 2] {
        [self.lat, self.lng]
    }
}

/// Displacement in decimal degrees.
#[derive(Debug, Copy, Clone, PartialEq, Default)]
pub struct GeoOffset {
    pub d_lat: f64,
    pub d_lng: f64,
}

impl GeoOffset {
    pub const fn new(d_lat: f64, d_lng: f64) -> Self {
        Self { d_lat, d_lng }
    }
}

impl std::ops::Add<GeoOffset> for LatLng {
    type Output = LatLng;

    fn add(self, offset: GeoOffset) -> Self::Output {
        LatLng::new(self.lat + offset.d_lat, self.lng + offset.d_lng)
    }
}

impl std::ops::Mul<f64> for GeoOffset {
    type Output = GeoOffset;

    fn mul(self, s: f64) -> Self::Output {
        GeoOffset::new(self.d_lat * s, self.d_lng * s)
    }
}
