use thiserror::Error;

/// Unified error type for apilens.
///
/// The analysis pipeline itself never fails: malformed records are dropped.
/// These variants cover the edges around it (loading input documents and
/// configuration).
#[derive(Error, Debug)]
pub enum ApilensError {
    #[error("Config error: {0}")]
    ConfigError(String),

    #[error("Invalid input: {0}")]
    InvalidInput(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    Serde(#[from] serde_json::Error),
}

impl ApilensError {
    /// Process exit code for the CLI.
    pub fn exit_code(&self) -> i32 {
        match self {
            ApilensError::ConfigError(_) => 78,
            ApilensError::InvalidInput(_) | ApilensError::Serde(_) => 65,
            ApilensError::Io(_) => 74,
        }
    }

    /// JSON error body, written to stderr by the CLI.
    pub fn to_json_body(&self) -> String {
        serde_json::json!({ "error": self.to_string(), "code": self.exit_code() }).to_string()
    }
}
