use crate::config::HeatmapConfig;
use crate::services::cache::HeatmapCache;
use crate::services::heatmap::InfluxPointSource;
use axum::extract::FromRef;
use std::sync::Arc;

pub type SharedCache = Arc<HeatmapCache<InfluxPointSource>>;

#[derive(Clone)]
pub struct AppState {
    pub config: Arc<HeatmapConfig>,
    pub cache: SharedCache,
}

impl AppState {
    pub fn new(config: HeatmapConfig, http: reqwest::Client) -> Self {
        let source = InfluxPointSource::from_config(&config, http);
        let cache = Arc::new(HeatmapCache::new(source, config.cache_seconds));
        Self {
            config: Arc::new(config),
            cache,
        }
    }
}

impl FromRef<AppState> for SharedCache {
    fn from_ref(state: &AppState) -> SharedCache {
        state.cache.clone()
    }
}

impl FromRef<AppState> for Arc<HeatmapConfig> {
    fn from_ref(state: &AppState) -> Arc<HeatmapConfig> {
        state.config.clone()
    }
}
