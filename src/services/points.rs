//! Influx grouped-series payloads to heatmap points.

use serde::ser::{Serialize, Serializer};
use serde_json::Value as JsonValue;

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Point {
    pub latitude: f64,
    pub longitude: f64,
    pub weight: f64,
}

impl Point {
    pub fn new(latitude: f64, longitude: f64, weight: f64) -> Self {
        Self {
            latitude,
            longitude,
            weight,
        }
    }
}

// Leaflet.heat consumes `[lat, lon, intensity]` triples.
impl Serialize for Point {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        (self.latitude, self.longitude, self.weight).serialize(serializer)
    }
}

/// Never fails: a series with missing or unusable tags is skipped on its own
/// so one bad group cannot blank the map.
pub fn parse_points(payload: &JsonValue) -> Vec<Point> {
    let Some(series_list) = payload
        .get("results")
        .and_then(JsonValue::as_array)
        .and_then(|results| results.first())
        .and_then(|result| result.get("series"))
        .and_then(JsonValue::as_array)
    else {
        return Vec::new();
    };

    series_list.iter().filter_map(parse_series).collect()
}

fn parse_series(series: &JsonValue) -> Option<Point> {
    let tags = series.get("tags")?;
    let latitude = coerce_f64(tags.get("latitude")?)?;
    let longitude = coerce_f64(tags.get("longitude")?)?;

    // Grouped aggregates return one row per series: [time, hits].
    let hits = series
        .get("values")
        .and_then(JsonValue::as_array)
        .and_then(|rows| rows.first())
        .and_then(JsonValue::as_array)
        .and_then(|row| row.get(1))
        .and_then(coerce_f64)
        .unwrap_or(0.0);

    (hits > 0.0).then(|| Point::new(latitude, longitude, hits))
}

fn coerce_f64(value: &JsonValue) -> Option<f64> {
    match value {
        JsonValue::Number(number) => number.as_f64(),
        JsonValue::String(text) => text.trim().parse::<f64>().ok(),
        _ => None,
    }
}

/// Keeps the `max` heaviest points. `max <= 0` disables the cap. Ties at the
/// cut-off are resolved arbitrarily.
pub fn cap_points(mut points: Vec<Point>, max: i64) -> Vec<Point> {
    if max <= 0 {
        return points;
    }
    let max = usize::try_from(max).unwrap_or(usize::MAX);
    if points.len() <= max {
        return points;
    }
    points.sort_unstable_by(|a, b| b.weight.total_cmp(&a.weight));
    points.truncate(max);
    points
}
