//! Named pickup points for test catalogs.
//!
//! A fictional district laid out around one campus. Coordinates sit in a
//! small box so haversine legs stay in the low kilometers.

/// A named location with coordinates.
#[derive(Debug, Clone, Copy)]
pub struct Location {
    pub name: &'static str,
    pub lat: f64,
    pub lng: f64,
}

impl Location {
    pub const fn new(name: &'static str, lat: f64, lng: f64) -> Self {
        Self { name, lat, lng }
    }

    pub fn coords(&self) -> (f64, f64) {
        (self.lat, self.lng)
    }
}

pub const CAMPUS: Location = Location::new("Riverside High School", 36.1500, -115.1500);

// ============================================================================
// Depots (driver start locations)
// ============================================================================

pub const DEPOTS: &[Location] = &[
    Location::new("North Depot", 36.1900, -115.1450),
    Location::new("South Depot", 36.1100, -115.1550),
    Location::new("East Yard", 36.1520, -115.1000),
    Location::new("West Yard", 36.1480, -115.2000),
];

// ============================================================================
// Pickup points
// ============================================================================

pub const NORTH_PICKUPS: &[Location] = &[
    Location::new("Maple & 3rd", 36.1810, -115.1480),
    Location::new("Oak Park Gate", 36.1780, -115.1420),
    Location::new("Hillside Library", 36.1750, -115.1510),
    Location::new("Cedar Court", 36.1720, -115.1460),
    Location::new("Pine Ridge Loop", 36.1690, -115.1530),
    Location::new("Birch Lane", 36.1660, -115.1440),
];

pub const SOUTH_PICKUPS: &[Location] = &[
    Location::new("Harbor Plaza", 36.1210, -115.1540),
    Location::new("Dockside Rec Center", 36.1250, -115.1490),
    Location::new("Bayview Apartments", 36.1290, -115.1570),
    Location::new("Mill Street Stop", 36.1330, -115.1510),
    Location::new("Canal Walk", 36.1370, -115.1460),
    Location::new("Quarry Road", 36.1410, -115.1530),
];

/// Every pickup point, north first.
pub fn all_pickups() -> Vec<Location> {
    let mut all = Vec::with_capacity(NORTH_PICKUPS.len() + SOUTH_PICKUPS.len());
    all.extend_from_slice(NORTH_PICKUPS);
    all.extend_from_slice(SOUTH_PICKUPS);
    all
}
