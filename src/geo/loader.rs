use crate::error::{Result, TrackerError};
use crate::geo::{LocationSample, RouteStop};
use chrono::{DateTime, Utc};
use std::io::Read;
use std::path::Path;
use tracing::info;

/// Load route stops from a CSV with header `location_name,latitude,longitude,note`.
pub fn load_route_stops(path: &Path) -> Result<Vec<RouteStop>> {
    let file = std::fs::File::open(path)?;
    let stops = parse_route_stops(file)?;
    info!(path = %path.display(), stops = stops.len(), "loaded route plan");
    Ok(stops)
}

pub fn parse_route_stops<R: Read>(reader: R) -> Result<Vec<RouteStop>> {
    let mut reader = csv::Reader::from_reader(reader);
    let mut stops = Vec::new();

    for result in reader.records() {
        let record = result?;
        let line = record.position().map(|p| p.line()).unwrap_or(0);

        let location_name = record.get(0).unwrap_or("").trim().to_string();
        if location_name.is_empty() {
            return Err(TrackerError::InvalidRecord {
                line,
                reason: "missing location_name".to_string(),
            });
        }
        let latitude = parse_coordinate(record.get(1), line, "latitude")?;
        let longitude = parse_coordinate(record.get(2), line, "longitude")?;
        let note = record
            .get(3)
            .map(str::trim)
            .filter(|n| !n.is_empty())
            .map(str::to_string);

        stops.push(RouteStop {
            location_name,
            latitude,
            longitude,
            note,
        });
    }

    Ok(stops)
}

/// Load a recorded track from a CSV with header `latitude,longitude,timestamp`.
/// Timestamps are RFC 3339.
pub fn load_track(path: &Path) -> Result<Vec<LocationSample>> {
    let file = std::fs::File::open(path)?;
    let samples = parse_track(file)?;
    info!(path = %path.display(), samples = samples.len(), "loaded track");
    Ok(samples)
}

pub fn parse_track<R: Read>(reader: R) -> Result<Vec<LocationSample>> {
    let mut reader = csv::Reader::from_reader(reader);
    let mut samples = Vec::new();

    for result in reader.records() {
        let record = result?;
        let line = record.position().map(|p| p.line()).unwrap_or(0);

        let latitude = parse_coordinate(record.get(0), line, "latitude")?;
        let longitude = parse_coordinate(record.get(1), line, "longitude")?;
        let raw_ts = record.get(2).unwrap_or("").trim();
        let timestamp = DateTime::parse_from_rfc3339(raw_ts)
            .map_err(|e| TrackerError::InvalidRecord {
                line,
                reason: format!("bad timestamp {raw_ts:?}: {e}"),
            })?
            .with_timezone(&Utc);

        samples.push(LocationSample::new(latitude, longitude, timestamp));
    }

    samples.sort_by_key(|s| s.timestamp);
    Ok(samples)
}

fn parse_coordinate(raw: Option<&str>, line: u64, field: &str) -> Result<f64> {
    let raw = raw.unwrap_or("").trim();
    let value: f64 = raw.parse().map_err(|_| TrackerError::InvalidRecord {
        line,
        reason: format!("bad {field} {raw:?}"),
    })?;
    let limit = if field == "latitude" { 90.0 } else { 180.0 };
    if !value.is_finite() || value.abs() > limit {
        return Err(TrackerError::InvalidRecord {
            line,
            reason: format!("{field} out of range: {value}"),
        });
    }
    Ok(value)
}
