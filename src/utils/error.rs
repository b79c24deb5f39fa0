use thiserror::Error;

#[derive(Error, Debug)]
pub enum SiftError {
    #[error("IMAP operation failed: {0}")]
    ImapError(#[from] imap::error::Error),

    #[error("TLS setup failed: {0}")]
    TlsError(#[from] native_tls::Error),

    #[error("API request failed: {0}")]
    ApiError(#[from] reqwest::Error),

    #[error("API request failed with status {status}: {message}")]
    ApiStatusError { status: u16, message: String },

    #[error("Message parsing failed: {0}")]
    MailParseError(#[from] mailparse::MailParseError),

    #[error("Database error: {0}")]
    DbError(#[from] rusqlite::Error),

    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    SerializationError(#[from] serde_json::Error),

    #[error("Connection error: {message}")]
    ConnectionError { message: String },

    #[error("Configuration error in '{field}': {message}")]
    ConfigValidationError { field: String, message: String },

    #[error("Invalid value for '{field}' ({value}): {reason}")]
    InvalidConfigValueError {
        field: String,
        value: String,
        reason: String,
    },

    #[error("Missing required configuration field: {field}")]
    MissingConfigError { field: String },

    #[error("Analysis failed at {stage}: {details}")]
    AnalysisError { stage: String, details: String },

    #[error("Processing error: {message}")]
    ProcessingError { message: String },
}

/// 錯誤嚴重程度，決定 CLI 的退出碼
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorSeverity {
    Low,
    Medium,
    High,
    Critical,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorCategory {
    Network,
    Mail,
    Configuration,
    Processing,
    Storage,
    System,
}

impl SiftError {
    pub fn severity(&self) -> ErrorSeverity {
        match self {
            // Transient: connection and API failures are worth retrying
            SiftError::ImapError(_)
            | SiftError::TlsError(_)
            | SiftError::ApiError(_)
            | SiftError::ApiStatusError { .. }
            | SiftError::ConnectionError { .. } => ErrorSeverity::Medium,

            SiftError::MailParseError(_)
            | SiftError::SerializationError(_)
            | SiftError::AnalysisError { .. }
            | SiftError::ProcessingError { .. } => ErrorSeverity::High,

            SiftError::ConfigValidationError { .. }
            | SiftError::InvalidConfigValueError { .. }
            | SiftError::MissingConfigError { .. } => ErrorSeverity::High,

            SiftError::DbError(_) | SiftError::IoError(_) => ErrorSeverity::Critical,
        }
    }

    pub fn category(&self) -> ErrorCategory {
        match self {
            SiftError::TlsError(_)
            | SiftError::ApiError(_)
            | SiftError::ApiStatusError { .. }
            | SiftError::ConnectionError { .. } => ErrorCategory::Network,

            SiftError::ImapError(_) | SiftError::MailParseError(_) => ErrorCategory::Mail,

            SiftError::ConfigValidationError { .. }
            | SiftError::InvalidConfigValueError { .. }
            | SiftError::MissingConfigError { .. } => ErrorCategory::Configuration,

            SiftError::SerializationError(_)
            | SiftError::AnalysisError { .. }
            | SiftError::ProcessingError { .. } => ErrorCategory::Processing,

            SiftError::DbError(_) => ErrorCategory::Storage,

            SiftError::IoError(_) => ErrorCategory::System,
        }
    }

    pub fn recovery_suggestion(&self) -> String {
        match self {
            SiftError::ImapError(_) => {
                "Check the IMAP server address, account email and app password".to_string()
            }
            SiftError::TlsError(_) => {
                "Verify the server supports TLS on the configured port".to_string()
            }
            SiftError::ApiError(_) => {
                "Check network connectivity and the configured API base URL".to_string()
            }
            SiftError::ApiStatusError { status, .. } => format!(
                "The API rejected the request (HTTP {}); verify the API key and model name",
                status
            ),
            SiftError::MailParseError(_) => {
                "The message may be malformed; re-run to fetch it again".to_string()
            }
            SiftError::DbError(_) => {
                "Check that the database file is writable and not locked by another process"
                    .to_string()
            }
            SiftError::IoError(_) => "Check file paths and permissions".to_string(),
            SiftError::SerializationError(_) => {
                "A payload did not match the expected schema; re-run with --verbose".to_string()
            }
            SiftError::ConnectionError { .. } => {
                "Connect to the mail server before other mailbox operations".to_string()
            }
            SiftError::ConfigValidationError { field, .. }
            | SiftError::InvalidConfigValueError { field, .. }
            | SiftError::MissingConfigError { field } => {
                format!("Fix the '{}' entry in the configuration file", field)
            }
            SiftError::AnalysisError { .. } => {
                "The model may have returned malformed output; retrying usually helps".to_string()
            }
            SiftError::ProcessingError { .. } => {
                "Re-run with --verbose for more detail".to_string()
            }
        }
    }

    pub fn user_friendly_message(&self) -> String {
        match self {
            SiftError::ImapError(_) | SiftError::ConnectionError { .. } => {
                "Could not talk to the mail server.".to_string()
            }
            SiftError::TlsError(_) => "Could not establish a secure connection.".to_string(),
            SiftError::ApiError(_) | SiftError::ApiStatusError { .. } => {
                "The language model API call failed.".to_string()
            }
            SiftError::MailParseError(_) => "A fetched message could not be parsed.".to_string(),
            SiftError::DbError(_) => "The email archive could not be accessed.".to_string(),
            SiftError::IoError(_) => "A file operation failed.".to_string(),
            SiftError::SerializationError(_) => {
                "Data could not be encoded or decoded.".to_string()
            }
            SiftError::ConfigValidationError { .. }
            | SiftError::InvalidConfigValueError { .. }
            | SiftError::MissingConfigError { .. } => {
                format!("The configuration is invalid: {}", self)
            }
            SiftError::AnalysisError { stage, .. } => {
                format!("Email analysis failed during {}.", stage)
            }
            SiftError::ProcessingError { message } => format!("Processing failed: {}", message),
        }
    }
}

pub type Result<T> = std::result::Result<T, SiftError>;
