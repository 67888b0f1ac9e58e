//! Polyline representation for route paths.
//!
//! Points are the stop coordinates of a route in visiting order. Encoding
//! to a compact wire format is left to whoever renders the map.

use serde::{Deserialize, Serialize};

use crate::haversine;

/// A route path as decoded (lat, lng) points.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Polyline {
    points: Vec<(f64, f64)>,
}

impl Polyline {
    pub fn new(points: Vec<(f64, f64)>) -> Self {
        Self { points }
    }

    pub fn points(&self) -> &[(f64, f64)] {
        &self.points
    }

    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }

    /// Straight-line length through every point, in kilometers.
    pub fn length_km(&self) -> f64 {
        haversine::path_length_km(&self.points)
    }
}
