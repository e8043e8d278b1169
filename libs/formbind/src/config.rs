use serde::{Deserialize, Serialize};

/// Accepted time layouts (chrono `strftime` syntax), tried in order.
///
/// Seeded with the SQL date and date+minute forms. Each `Binder` owns its
/// list; there is no process-wide copy to mutate.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct TimeFormats(Vec<String>);

impl Default for TimeFormats {
    fn default() -> Self {
        Self(vec!["%Y-%m-%d".to_string(), "%Y-%m-%d %H:%M".to_string()])
    }
}

impl TimeFormats {
    /// Append a layout; it is tried after every existing one.
    pub fn push(&mut self, layout: impl Into<String>) {
        self.0.push(layout.into());
    }

    pub fn iter(&self) -> impl Iterator<Item = &str> {
        self.0.iter().map(String::as_str)
    }

    pub fn as_slice(&self) -> &[String] {
        &self.0
    }
}

impl<S: Into<String>> FromIterator<S> for TimeFormats {
    fn from_iter<T: IntoIterator<Item = S>>(iter: T) -> Self {
        Self(iter.into_iter().map(Into::into).collect())
    }
}

/// Binder configuration, fixed at construction.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BindConfig {
    #[serde(default)]
    pub time_formats: TimeFormats,

    /// Indexed keys at or above this position are rejected.
    #[serde(default = "default_max_sequence_len")]
    pub max_sequence_len: usize,
}

fn default_max_sequence_len() -> usize {
    10_000
}

impl Default for BindConfig {
    fn default() -> Self {
        Self {
            time_formats: TimeFormats::default(),
            max_sequence_len: default_max_sequence_len(),
        }
    }
}

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("config ({path}): {source}")]
    Read { path: String, source: std::io::Error },

    #[error("config parse: {0}")]
    Parse(#[from] toml::de::Error),
}

impl BindConfig {
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

    pub fn with_time_format(mut self, layout: impl Into<String>) -> Self {
        self.time_formats.push(layout);
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_toml_gives_defaults() {
        assert_eq!(BindConfig::parse("").unwrap(), BindConfig::default());
    }

    #[test]
    fn custom_layouts_replace_the_seed() {
        let config = BindConfig::parse(
            r#"
            time_formats = ["%d.%m.%Y"]
            max_sequence_len = 16
            "#,
        )
        .unwrap();
        assert_eq!(config.time_formats.iter().collect::<Vec<_>>(), vec!["%d.%m.%Y"]);
        assert_eq!(config.max_sequence_len, 16);
    }

    #[test]
    fn with_time_format_appends() {
        let config = BindConfig::default().with_time_format("%m/%d/%Y");
        assert_eq!(config.time_formats.as_slice().len(), 3);
        assert_eq!(config.time_formats.iter().last(), Some("%m/%d/%Y"));
    }
}
