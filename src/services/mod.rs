pub mod cache;
pub mod heatmap;
pub mod influx;
pub mod points;
pub mod query;
