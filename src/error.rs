use thiserror::Error;

#[derive(Error, Debug)]
pub enum StageLensError {
    #[error("Invalid configuration: {0}")]
    Config(String),

    #[error("History source error: {0}")]
    Source(String),

    #[error("Network error: {0}")]
    Network(#[from] reqwest::Error),

    #[error("History API returned status {status}: {message}")]
    ApiError { status: u16, message: String },

    #[error("History API returned status {status} after {retries} retries")]
    ApiErrorAfterRetries { status: u16, retries: u32 },

    #[error("JSON serialization error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("YAML parse error: {0}")]
    Yaml(#[from] serde_yaml::Error),

    #[error("TOML parse error: {0}")]
    Toml(#[from] toml::de::Error),
}

pub type Result<T> = std::result::Result<T, StageLensError>;
