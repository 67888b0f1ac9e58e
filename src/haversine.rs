//! Great-circle distances for route paths.
//!
//! Straight-line only; there is no road network behind the simulated routes.

/// Earth radius in kilometers.
const EARTH_RADIUS_KM: f64 = 6371.0;

/// Haversine distance between two (lat, lng) points in kilometers.
pub fn distance_km(from: (f64, f64), to: (f64, f64)) -> f64 {
    let (lat1, lng1) = from;
    let (lat2, lng2) = to;

    let lat1_rad = lat1.to_radians();
    let lat2_rad = lat2.to_radians();
    let delta_lat = (lat2 - lat1).to_radians();
    let delta_lng = (lng2 - lng1).to_radians();

    let a = (delta_lat / 2.0).sin().powi(2)
        + lat1_rad.cos() * lat2_rad.cos() * (delta_lng / 2.0).sin().powi(2);
    let c = 2.0 * a.sqrt().asin();

    EARTH_RADIUS_KM * c
}

/// Total length of a path visiting `points` in order.
pub fn path_length_km(points: &[(f64, f64)]) -> f64 {
    points
        .windows(2)
        .map(|leg| distance_km(leg[0], leg[1]))
        .sum()
}

/// Minutes needed to cover `km` at `speed_kmh`.
pub fn travel_minutes(km: f64, speed_kmh: f64) -> u32 {
    if speed_kmh <= 0.0 {
        return 0;
    }
    (km / speed_kmh * 60.0).round() as u32
}
