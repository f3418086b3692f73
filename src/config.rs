use std::fmt;
use std::path::{Path, PathBuf};

pub const DEFAULT_INFLUX_HOST: &str = "influxdb";
pub const DEFAULT_INFLUX_PORT: u16 = 8086;
pub const DEFAULT_INFLUX_DATABASE: &str = "geoip2influx";
pub const DEFAULT_MEASUREMENT: &str = "geoip2influx";
pub const DEFAULT_TIME_WINDOW: &str = "24h";
pub const DEFAULT_REFRESH_SECONDS: u64 = 30;
pub const DEFAULT_CACHE_SECONDS: i64 = 30;
pub const DEFAULT_MAX_POINTS: i64 = 20_000;
pub const DEFAULT_LOG_LEVEL: &str = "info";

#[derive(Clone)]
pub struct HeatmapConfig {
    pub influx_host: String,
    pub influx_port: u16,
    pub influx_database: String,
    pub influx_username: Option<String>,
    pub influx_password: String,
    pub measurement: String,
    pub time_window: String,
    pub refresh_seconds: u64,
    pub cache_seconds: i64,
    pub max_points: i64,
    pub title: String,
    pub debug: bool,
    pub static_root: Option<PathBuf>,
    pub log_level: String,
}

impl HeatmapConfig {
    pub fn from_env(cli_static_root: Option<PathBuf>) -> Self {
        let mut config = Self::from_lookup(env_lookup);
        if cli_static_root.is_some() {
            config.static_root = cli_static_root;
        }
        config
    }

    /// Builds the config from an arbitrary key lookup so tests never touch the
    /// process environment.
    pub fn from_lookup<F>(lookup: F) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        let vars = Vars(&lookup);

        let influx_password = resolve_password(
            vars.optional_string("INFLUX_PASS"),
            vars.optional_string("INFLUX_PASS_FILE").map(PathBuf::from),
        );

        Self {
            influx_host: vars.string("INFLUX_HOST", DEFAULT_INFLUX_HOST),
            influx_port: vars.u16("INFLUX_HOST_PORT", DEFAULT_INFLUX_PORT),
            influx_database: vars.string("INFLUX_DATABASE", DEFAULT_INFLUX_DATABASE),
            influx_username: vars.optional_string("INFLUX_USER"),
            influx_password,
            measurement: vars.string("GEO_MEASUREMENT", DEFAULT_MEASUREMENT),
            time_window: vars.string("HEATMAP_TIME_WINDOW", DEFAULT_TIME_WINDOW),
            refresh_seconds: vars.u64("HEATMAP_REFRESH_SECONDS", DEFAULT_REFRESH_SECONDS),
            cache_seconds: vars.i64("HEATMAP_CACHE_SECONDS", DEFAULT_CACHE_SECONDS),
            max_points: vars.i64("HEATMAP_MAX_POINTS", DEFAULT_MAX_POINTS),
            title: vars.optional_string("HEATMAP_TITLE").unwrap_or_default(),
            debug: vars.bool("HEATMAP_DEBUG", false),
            static_root: vars.optional_string("HEATMAP_STATIC_ROOT").map(PathBuf::from),
            log_level: vars.log_level(),
        }
    }

    pub fn influx_base_url(&self) -> String {
        format!("http://{}:{}", self.influx_host, self.influx_port)
    }
}

impl fmt::Debug for HeatmapConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("HeatmapConfig")
            .field("influx_host", &self.influx_host)
            .field("influx_port", &self.influx_port)
            .field("influx_database", &self.influx_database)
            .field("influx_username", &self.influx_username)
            .field("influx_password", &"<redacted>")
            .field("measurement", &self.measurement)
            .field("time_window", &self.time_window)
            .field("refresh_seconds", &self.refresh_seconds)
            .field("cache_seconds", &self.cache_seconds)
            .field("max_points", &self.max_points)
            .field("title", &self.title)
            .field("debug", &self.debug)
            .field("static_root", &self.static_root)
            .field("log_level", &self.log_level)
            .finish()
    }
}

/// Tracing starts before the rest of the config is loaded, so the level is
/// readable on its own.
pub fn log_level_from_env() -> String {
    Vars(&env_lookup).log_level()
}

fn env_lookup(key: &str) -> Option<String> {
    std::env::var(key).ok()
}

/// The direct value wins; an unreadable file is an empty password, not a
/// startup failure.
fn resolve_password(direct: Option<String>, file: Option<PathBuf>) -> String {
    if let Some(password) = direct {
        return password;
    }
    match file {
        Some(path) => read_password_file(&path),
        None => String::new(),
    }
}

fn read_password_file(path: &Path) -> String {
    match std::fs::read_to_string(path) {
        Ok(contents) => contents.trim().to_string(),
        Err(err) => {
            tracing::warn!(
                path = %path.display(),
                error = %err,
                "failed to read INFLUX_PASS_FILE; using empty password"
            );
            String::new()
        }
    }
}

struct Vars<'a, F>(&'a F);

impl<F> Vars<'_, F>
where
    F: Fn(&str) -> Option<String>,
{
    fn optional_string(&self, key: &str) -> Option<String> {
        (self.0)(key)
            .map(|value| value.trim().to_string())
            .filter(|value| !value.is_empty())
    }

    fn string(&self, key: &str, default: &str) -> String {
        self.optional_string(key)
            .unwrap_or_else(|| default.to_string())
    }

    fn log_level(&self) -> String {
        self.string("LOG_LEVEL", DEFAULT_LOG_LEVEL)
    }

    fn bool(&self, key: &str, default: bool) -> bool {
        match self.optional_string(key).map(|value| value.to_lowercase()) {
            Some(value) if matches!(value.as_str(), "1" | "true" | "yes" | "on") => true,
            Some(value) if matches!(value.as_str(), "0" | "false" | "no" | "off") => false,
            _ => default,
        }
    }

    fn u16(&self, key: &str, default: u16) -> u16 {
        self.parsed(key, default)
    }

    fn u64(&self, key: &str, default: u64) -> u64 {
        self.parsed(key, default)
    }

    fn i64(&self, key: &str, default: i64) -> i64 {
        self.parsed(key, default)
    }

    fn parsed<T>(&self, key: &str, default: T) -> T
    where
        T: std::str::FromStr + fmt::Display,
    {
        let Some(raw) = self.optional_string(key) else {
            return default;
        };
        match raw.parse::<T>() {
            Ok(value) => value,
            Err(_) => {
                tracing::warn!(key, value = %raw, default = %default, "invalid number; using default");
                default
            }
        }
    }
}
