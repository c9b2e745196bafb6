#[derive(thiserror::Error, Debug, serde::Deserialize, serde::Serialize)]
pub enum Error {
    #[error("Config file not found: {0}")]
    ConfigNotFound(String),

    #[error("Invalid config {path}: {reason}")]
    InvalidConfig { path: String, reason: String },

    #[error("Input directory not found: {0}")]
    InputDirNotFound(String),
}
