use reqwest::Client;
use serde_json::Value as JsonValue;
use std::time::Duration;

use crate::config::HeatmapConfig;
use crate::error::FetchError;

pub const REQUEST_TIMEOUT: Duration = Duration::from_secs(10);
pub const BODY_EXCERPT_CHARS: usize = 2000;

#[derive(Clone)]
pub struct InfluxCredentials {
    pub username: String,
    pub password: String,
}

/// InfluxDB v1 `/query` endpoint client.
#[derive(Clone)]
pub struct InfluxClient {
    base_url: String,
    database: String,
    credentials: Option<InfluxCredentials>,
    http: Client,
}

impl InfluxClient {
    pub fn new(
        base_url: impl Into<String>,
        database: impl Into<String>,
        credentials: Option<InfluxCredentials>,
        http: Client,
    ) -> Self {
        Self {
            base_url: base_url.into().trim_end_matches('/').to_string(),
            database: database.into(),
            credentials,
            http,
        }
    }

    pub fn from_config(config: &HeatmapConfig, http: Client) -> Self {
        let credentials = config
            .influx_username
            .as_ref()
            .map(|username| InfluxCredentials {
                username: username.clone(),
                password: config.influx_password.clone(),
            });
        Self::new(
            config.influx_base_url(),
            config.influx_database.clone(),
            credentials,
            http,
        )
    }

    pub async fn execute(&self, query: &str) -> Result<JsonValue, FetchError> {
        let url = format!("{}/query", self.base_url);
        let mut request = self
            .http
            .get(&url)
            .query(&[("db", self.database.as_str()), ("q", query)])
            .timeout(REQUEST_TIMEOUT);
        if let Some(credentials) = &self.credentials {
            request = request.basic_auth(&credentials.username, Some(&credentials.password));
        }

        let resp = request
            .send()
            .await
            .map_err(|err| FetchError::Transport(describe_transport_error(err)))?;

        let status = resp.status();
        if !status.is_success() {
            let body = resp.text().await.unwrap_or_default();
            return Err(FetchError::UpstreamHttp {
                status_code: status.as_u16(),
                body_excerpt: excerpt(&body, BODY_EXCERPT_CHARS),
            });
        }

        let bytes = resp
            .bytes()
            .await
            .map_err(|err| FetchError::Transport(describe_transport_error(err)))?;
        serde_json::from_slice(&bytes).map_err(|err| FetchError::Decode(err.to_string()))
    }
}

fn describe_transport_error(err: reqwest::Error) -> String {
    if err.is_timeout() {
        return format!("request timed out after {}s", REQUEST_TIMEOUT.as_secs());
    }
    // The URL carries the query text; keep it out of logs and diagnostics.
    let err = err.without_url();
    match std::error::Error::source(&err) {
        Some(source) => format!("{err}: {source}"),
        None => err.to_string(),
    }
}

fn excerpt(body: &str, max_chars: usize) -> String {
    match body.char_indices().nth(max_chars) {
        Some((idx, _)) => body[..idx].to_string(),
        None => body.to_string(),
    }
}
