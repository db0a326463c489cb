use thiserror::Error;

#[derive(Debug, Error)]
pub enum ConfigError {
  #[error("failed to parse job definition: {0}")]
  Parse(#[from] serde_json::Error),

  #[error("password variable '{var}' for instance '{instance}' is not set")]
  MissingSecret { instance: String, var: String },
}
