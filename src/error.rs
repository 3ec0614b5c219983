use std::process::ExitCode;

/// Errors that cause stolenbot to exit with a specific code.
#[derive(Debug, thiserror::Error)]
pub enum ExitError {
    #[error("config error: {0}")]
    Config(String),

    #[error("credentials rejected: {0}")]
    Credentials(String),

    #[error("stream error: {0}")]
    Stream(String),
}

impl ExitError {
    pub fn exit_code(&self) -> ExitCode {
        match self {
            ExitError::Config(_) => ExitCode::from(2),
            ExitError::Credentials(_) => ExitCode::from(3),
            ExitError::Stream(_) => ExitCode::from(4),
        }
    }
}

/// The lookup service returned a record that violates the data contract:
/// replies are never built from partial records.
#[derive(Debug, thiserror::Error)]
pub enum ComposeError {
    #[error("bike {serial:?} is missing {field}")]
    MissingField { serial: String, field: &'static str },
}

/// Failures talking to the lookup service. The caller posts nothing derived
/// from data in these cases and surfaces the error for logging.
#[derive(Debug, thiserror::Error)]
pub enum LookupError {
    #[error("lookup request failed: {0}")]
    Http(String),

    #[error("lookup service returned HTTP {0}")]
    Status(u16),

    #[error("lookup response was not valid JSON: {0}")]
    Json(#[from] serde_json::Error),
}
