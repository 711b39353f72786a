use figment::{
    providers::{Env, Format, Serialized, Toml},
    Figment,
};
use log::{debug, warn};
use serde::{Deserialize, Serialize};
use std::path::Path;

use crate::layout::registry::TrendFallback;

pub const DEFAULT_CONFIG_FILE: &str = "toolboard.toml";
pub const ENV_PREFIX: &str = "TOOLBOARD_";

#[derive(Clone, Debug, Default, Serialize, Deserialize)]
pub struct AppConfig {
    pub server: ServerConfig,
    pub api: ApiConfig,
    pub export: ExportConfig,
    pub render: RenderConfig,
}

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: "0.0.0.0".to_string(),
            port: 8080,
        }
    }
}

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct ApiConfig {
    /// Backend base URL, e.g. `http://localhost:3001/api`.
    pub base_url: String,
    pub request_timeout_secs: u64,
    /// Upper bound for one query re-execution during layout load.
    pub query_timeout_secs: u64,
}

impl Default for ApiConfig {
    fn default() -> Self {
        Self {
            base_url: "http://localhost:3001/api".to_string(),
            request_timeout_secs: 30,
            query_timeout_secs: 15,
        }
    }
}

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct ExportConfig {
    pub chart_cdn_url: String,
    pub default_title: String,
}

impl Default for ExportConfig {
    fn default() -> Self {
        Self {
            chart_cdn_url: "https://cdn.jsdelivr.net/npm/chart.js@4.4.1/dist/chart.umd.min.js"
                .to_string(),
            default_title: "Dashboard".to_string(),
        }
    }
}

#[derive(Clone, Debug, Default, Serialize, Deserialize)]
pub struct RenderConfig {
    pub metric_trend_fallback: TrendFallback,
}

impl AppConfig {
    /// Defaults, then `toolboard.toml` if present, then `TOOLBOARD_*` variables.
    pub fn load() -> Result<Self, figment::Error> {
        Self::load_from(Path::new(DEFAULT_CONFIG_FILE))
    }

    pub fn load_from(path: &Path) -> Result<Self, figment::Error> {
        let mut figment = Figment::from(Serialized::defaults(AppConfig::default()));
        if path.exists() {
            debug!("Reading configuration from {}", path.display());
            figment = figment.merge(Toml::file(path));
        }
        let config: AppConfig = figment
            .merge(Env::prefixed(ENV_PREFIX).split("__"))
            .extract()?;
        Ok(config.normalized())
    }

    fn normalized(mut self) -> Self {
        if self.api.query_timeout_secs == 0 {
            warn!("api.query_timeout_secs of 0 is not allowed, using 1 second");
            self.api.query_timeout_secs = 1;
        }
        if self.api.request_timeout_secs == 0 {
            warn!("api.request_timeout_secs of 0 is not allowed, using 1 second");
            self.api.request_timeout_secs = 1;
        }
        let trimmed = self.api.base_url.trim_end_matches('/').len();
        self.api.base_url.truncate(trimmed);
        self
    }

    pub fn bind_address(&self) -> String {
        format!("{}:{}", self.server.host, self.server.port)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn test_defaults_without_file() {
        let dir = tempfile::tempdir().unwrap();
        let config = AppConfig::load_from(&dir.path().join("missing.toml")).unwrap();
        assert_eq!(config.server.port, 8080);
        assert_eq!(config.api.query_timeout_secs, 15);
        assert_eq!(config.render.metric_trend_fallback, TrendFallback::Insufficient);
    }

    #[test]
    fn test_file_overrides_and_normalization() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(
            file,
            r#"
[server]
port = 9090

[api]
base_url = "http://backend:3001/api/"
query_timeout_secs = 0

[render]
metric_trend_fallback = "placeholder"
"#
        )
        .unwrap();

        let config = AppConfig::load_from(file.path()).unwrap();
        assert_eq!(config.server.port, 9090);
        assert_eq!(config.server.host, "0.0.0.0");
        assert_eq!(config.api.base_url, "http://backend:3001/api");
        assert_eq!(config.api.query_timeout_secs, 1);
        assert_eq!(config.render.metric_trend_fallback, TrendFallback::Placeholder);
        assert_eq!(config.bind_address(), "0.0.0.0:9090");
    }
}
