use axum::extract::DefaultBodyLimit;
use serde::{Deserialize, Serialize};

use formbind::{BindConfig, ConfigError};

/// Request decoding settings.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RequestConfig {
    /// Uploads larger than this many bytes are written to a temp file.
    #[serde(default = "default_spill_threshold")]
    pub spill_threshold: u64,

    #[serde(default = "default_max_body_bytes")]
    pub max_body_bytes: usize,

    #[serde(default)]
    pub bind: BindConfig,
}

fn default_spill_threshold() -> u64 {
    10 << 20
}

fn default_max_body_bytes() -> usize {
    64 << 20
}

impl Default for RequestConfig {
    fn default() -> Self {
        Self {
            spill_threshold: default_spill_threshold(),
            max_body_bytes: default_max_body_bytes(),
            bind: BindConfig::default(),
        }
    }
}

impl RequestConfig {
    /// Load configuration from a TOML file.
    pub fn load(path: &str) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path)
            .map_err(|source| ConfigError::Read { path: path.to_string(), source })?;
        Self::parse(&content)
    }

    /// Parse configuration from a TOML string.
    pub fn parse(toml_str: &str) -> Result<Self, ConfigError> {
        Ok(toml::from_str(toml_str)?)
    }

    /// Router layer that lifts axum's multipart body limit to `max_body_bytes`.
    ///
    /// ```ignore
    /// let app = Router::new()
    ///     .route("/upload", post(upload))
    ///     .layer(config.body_limit());
    /// ```
    pub fn body_limit(&self) -> DefaultBodyLimit {
        DefaultBodyLimit::max(self.max_body_bytes)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults() {
        let config = RequestConfig::parse("").unwrap();
        assert_eq!(config, RequestConfig::default());
        assert_eq!(config.spill_threshold, 10 * 1024 * 1024);
        assert_eq!(config.max_body_bytes, 64 * 1024 * 1024);
    }

    #[test]
    fn nested_bind_section() {
        let config = RequestConfig::parse(
            r#"
            spill_threshold = 1024

            [bind]
            time_formats = ["%d.%m.%Y"]
            "#,
        )
        .unwrap();
        assert_eq!(config.spill_threshold, 1024);
        assert_eq!(config.bind.time_formats.iter().collect::<Vec<_>>(), vec!["%d.%m.%Y"]);
        assert_eq!(config.bind.max_sequence_len, 10_000);
    }

    #[test]
    fn missing_file_is_a_read_error() {
        let err = RequestConfig::load("/nonexistent/formbind.toml").unwrap_err();
        assert!(matches!(err, ConfigError::Read { .. }));
    }
}
