use crate::geo::{LocationSample, RouteStop};

const EARTH_RADIUS_M: f64 = 6_371_000.0;

/// Default radius inside which the next stop raises the stop alarm.
pub const STOP_ALARM_RADIUS_METERS: f64 = 50.0;

pub fn haversine_distance(lat1: f64, lon1: f64, lat2: f64, lon2: f64) -> f64 {
    let lat1_rad = lat1.to_radians();
    let lat2_rad = lat2.to_radians();
    let delta_lat = (lat2 - lat1).to_radians();
    let delta_lon = (lon2 - lon1).to_radians();

    let a = (delta_lat / 2.0).sin().powi(2)
        + lat1_rad.cos() * lat2_rad.cos() * (delta_lon / 2.0).sin().powi(2);
    let c = 2.0 * a.sqrt().asin();

    EARTH_RADIUS_M * c
}

pub fn sample_distance(a: &LocationSample, b: &LocationSample) -> f64 {
    haversine_distance(a.latitude, a.longitude, b.latitude, b.longitude)
}

pub fn distance_to_stop(latitude: f64, longitude: f64, stop: &RouteStop) -> f64 {
    haversine_distance(latitude, longitude, stop.latitude, stop.longitude)
}
