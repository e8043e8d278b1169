#[derive(Debug, thiserror::Error)]
pub enum CliError {
    #[error(transparent)]
    Config(#[from] formbind::ConfigError),

    #[error("key {key:?}: {source}")]
    Path { key: String, source: formbind::PathError },

    #[error("json: {0}")]
    Json(#[from] serde_json::Error),
}
