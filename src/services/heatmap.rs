use crate::config::HeatmapConfig;
use crate::error::FetchError;
use crate::services::cache::PointSource;
use crate::services::influx::InfluxClient;
use crate::services::points::{cap_points, parse_points, Point};
use crate::services::query::QuerySpec;

/// Query builder, Influx client, transformer and capper chained into one fetch.
#[derive(Clone)]
pub struct InfluxPointSource {
    client: InfluxClient,
    spec: QuerySpec,
    max_points: i64,
}

impl InfluxPointSource {
    pub fn new(client: InfluxClient, spec: QuerySpec, max_points: i64) -> Self {
        Self {
            client,
            spec,
            max_points,
        }
    }

    pub fn from_config(config: &HeatmapConfig, http: reqwest::Client) -> Self {
        Self::new(
            InfluxClient::from_config(config, http),
            QuerySpec::new(config.measurement.clone(), config.time_window.clone()),
            config.max_points,
        )
    }

    pub fn query(&self) -> String {
        self.spec.build()
    }
}

impl PointSource for InfluxPointSource {
    async fn fetch_points(&self) -> Result<Vec<Point>, FetchError> {
        let query = self.query();
        let payload = self.client.execute(&query).await?;
        let parsed = parse_points(&payload);
        let parsed_len = parsed.len();
        let points = cap_points(parsed, self.max_points);
        if points.len() < parsed_len {
            tracing::info!(
                parsed = parsed_len,
                kept = points.len(),
                "heatmap points capped"
            );
        }
        Ok(points)
    }
}
