use crate::models::TrialRecord;

const EARTH_RADIUS_KM: f64 = 6371.0;

/// A user latitude/longitude pair in degrees
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Coordinate {
    pub lat: f64,
    pub lon: f64,
}

/// Great-circle distance in kilometers between two points, spherical-earth
/// approximation (no ellipsoidal correction).
pub fn haversine_km(from: Coordinate, to: Coordinate) -> f64 {
    let d_lat = (to.lat - from.lat).to_radians();
    let d_lon = (to.lon - from.lon).to_radians();

    let a = (d_lat / 2.0).sin().powi(2)
        + from.lat.to_radians().cos() * to.lat.to_radians().cos() * (d_lon / 2.0).sin().powi(2);

    2.0 * EARTH_RADIUS_KM * a.sqrt().atan2((1.0 - a).sqrt())
}

/// Attach a distance from `user` to every trial carrying both coordinates.
/// Trials missing either coordinate get no distance.
pub fn annotate(trials: &mut [TrialRecord], user: Coordinate) {
    for trial in trials {
        trial.distance_km = match (trial.latitude, trial.longitude) {
            (Some(lat), Some(lon)) => Some(haversine_km(user, Coordinate { lat, lon })),
            _ => None,
        };
    }
}

/// Stable ascending sort by annotated distance; unknown-distance trials sort
/// last.
pub fn sort_by_distance(trials: &mut [TrialRecord]) {
    trials.sort_by(|a, b| {
        let da = a.distance_km.unwrap_or(f64::INFINITY);
        let db = b.distance_km.unwrap_or(f64::INFINITY);
        da.total_cmp(&db)
    });
}
