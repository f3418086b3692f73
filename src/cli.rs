use clap::Parser;
use std::path::PathBuf;

#[derive(Parser, Debug, Clone)]
#[command(
    name = "geoip-heatmap",
    version,
    about = "GeoIP request heatmap served from InfluxDB"
)]
pub struct Args {
    #[arg(long, default_value = "0.0.0.0")]
    pub host: String,
    #[arg(long, default_value_t = 8000)]
    pub port: u16,
    /// Directory holding index.html and front-end assets.
    #[arg(long)]
    pub static_root: Option<PathBuf>,
}
