use serde::{Deserialize, Serialize};

/// A screen-space position in logical pixels.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Point {
    pub x: f64,
    pub y: f64,
}

impl Point {
    pub fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }
}

/// A geographic position. Serialized as a `[lat, lng]` pair, which is the
/// shape stored in lane paths.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(from = "[f64; 2]", into = "[f64; 2]")]
pub struct Coordinate {
    pub lat: f64,
    pub lng: f64,
}

impl Coordinate {
    pub const fn new(lat: f64, lng: f64) -> Self {
        Self { lat, lng }
    }

    /// Whether both components are finite and inside the WGS84 ranges.
    pub fn is_valid(&self) -> bool {
        self.lat.is_finite()
            && self.lng.is_finite()
            && (-90.0..=90.0).contains(&self.lat)
            && (-180.0..=180.0).contains(&self.lng)
    }

    /// Planar distance in degrees. Only meant for picking nearby points on
    /// screen, not for measuring routes.
    pub fn degree_distance(&self, other: &Coordinate) -> f64 {
        (self.lat - other.lat).hypot(self.lng - other.lng)
    }
}

impl From<[f64; 2]> for Coordinate {
    fn from([lat, lng]: [f64; 2]) -> Self {
        Self { lat, lng }
    }
}

impl From<Coordinate> for [f64; 2] {
    fn from(c: Coordinate) -> Self {
        [c.lat, c.lng]
    }
}

/// The visible map window.
///
/// Uses a plain equirectangular projection: longitude maps linearly to x,
/// latitude linearly to y (north up). `lng_span` is the number of degrees of
/// longitude visible across `width`; the latitude span follows from the
/// aspect ratio.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct MapViewport {
    pub center: Coordinate,
    pub lng_span: f64,
    pub width: f64,
    pub height: f64,
}

impl MapViewport {
    pub fn lat_span(&self) -> f64 {
        if self.width <= 0.0 {
            return 0.0;
        }
        self.lng_span * self.height / self.width
    }

    /// Map a coordinate to screen space.
    pub fn project(&self, coord: Coordinate) -> Point {
        let west = self.center.lng - self.lng_span / 2.0;
        let north = self.center.lat + self.lat_span() / 2.0;
        let x = if self.lng_span > 0.0 {
            (coord.lng - west) * self.width / self.lng_span
        } else {
            0.0
        };
        let lat_span = self.lat_span();
        let y = if lat_span > 0.0 {
            (north - coord.lat) * self.height / lat_span
        } else {
            0.0
        };
        Point::new(x, y)
    }

    /// Map a screen position back to a coordinate.
    pub fn unproject(&self, point: Point) -> Coordinate {
        let west = self.center.lng - self.lng_span / 2.0;
        let north = self.center.lat + self.lat_span() / 2.0;
        let lng = if self.width > 0.0 {
            west + point.x * self.lng_span / self.width
        } else {
            self.center.lng
        };
        let lat = if self.height > 0.0 {
            north - point.y * self.lat_span() / self.height
        } else {
            self.center.lat
        };
        Coordinate::new(lat, lng)
    }

    pub fn contains(&self, point: Point) -> bool {
        (0.0..=self.width).contains(&point.x) && (0.0..=self.height).contains(&point.y)
    }
}
