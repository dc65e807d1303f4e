//! Great-circle distance.

use crate::issue::Location;

/// Mean Earth radius in kilometers.
pub const EARTH_RADIUS_KM: f64 = 6371.0088;

/// Haversine distance between two points, in kilometers.
pub fn distance_km(a: Location, b: Location) -> f64 {
    let (lat1, lat2) = (a.latitude.to_radians(), b.latitude.to_radians());
    let dlat = lat2 - lat1;
    let dlon = (b.longitude - a.longitude).to_radians();
    let h = (dlat / 2.0).sin().powi(2) + lat1.cos() * lat2.cos() * (dlon / 2.0).sin().powi(2);
    2.0 * EARTH_RADIUS_KM * h.sqrt().min(1.0).asin()
}

/// `true` when `b` lies within `max_km` of `a`.
pub fn within_km(a: Location, b: Location, max_km: f64) -> bool {
    distance_km(a, b) <= max_km
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn zero_distance_to_self() {
        let p = Location::new(48.8566, 2.3522);
        assert!(distance_km(p, p).abs() < 1e-9);
    }

    #[test]
    fn paris_to_london() {
        let paris = Location::new(48.8566, 2.3522);
        let london = Location::new(51.5074, -0.1278);
        let d = distance_km(paris, london);
        assert!((d - 343.5).abs() < 2.0, "got {d}");
        assert!(within_km(paris, london, 350.0));
        assert!(!within_km(paris, london, 300.0));
    }
}
