//! Geographic to pixel projection

use crate::graph::Location;
use serde::{Deserialize, Serialize};
use std::f64::consts::PI;

/// Latitude limit of the spherical Mercator projection
pub const MAX_MERCATOR_LAT: f64 = 85.051_128_78;

/// Point in projected pixel space
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Point {
    pub x: f64,
    pub y: f64,
}

impl Point {
    pub fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }

    pub fn distance(&self, other: &Point) -> f64 {
        (self.x - other.x).hypot(self.y - other.y)
    }
}

/// Converts between geographic and pixel coordinates.
///
/// Supplied by the host map. Implementations must be pure; projection may run
/// on several threads at once.
pub trait Projector: Sync {
    fn project(&self, location: Location) -> Point;
    fn unproject(&self, point: Point) -> Location;
}

/// Plate carrée with a fixed number of pixels per degree. y grows southward.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Equirectangular {
    pub scale: f64,
}

impl Equirectangular {
    pub fn new(scale: f64) -> Self {
        Self { scale }
    }
}

impl Projector for Equirectangular {
    fn project(&self, location: Location) -> Point {
        Point::new(location.lng * self.scale, -location.lat * self.scale)
    }

    fn unproject(&self, point: Point) -> Location {
        Location::new(-point.y / self.scale, point.x / self.scale)
    }
}

/// Spherical Web Mercator at a given zoom level
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct WebMercator {
    pub zoom: f64,
    pub tile_size: f64,
}

impl WebMercator {
    pub fn new(zoom: f64) -> Self {
        Self { zoom, tile_size: 256.0 }
    }

    fn world_size(&self) -> f64 {
        self.tile_size * 2f64.powf(self.zoom)
    }
}

impl Projector for WebMercator {
    fn project(&self, location: Location) -> Point {
        let size = self.world_size();
        let lat = location.lat.clamp(-MAX_MERCATOR_LAT, MAX_MERCATOR_LAT);
        let sin_lat = lat.to_radians().sin();
        let x = (location.lng + 180.0) / 360.0 * size;
        let y = (0.5 - ((1.0 + sin_lat) / (1.0 - sin_lat)).ln() / (4.0 * PI)) * size;
        Point::new(x, y)
    }

    fn unproject(&self, point: Point) -> Location {
        let size = self.world_size();
        let lng = point.x / size * 360.0 - 180.0;
        let n = PI - 2.0 * PI * point.y / size;
        let lat = n.sinh().atan().to_degrees();
        Location::new(lat, lng)
    }
}
