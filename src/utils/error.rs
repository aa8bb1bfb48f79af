use thiserror::Error;

#[derive(Error, Debug)]
pub enum CleanerError {
    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    SerializationError(#[from] serde_json::Error),

    #[error("TOML parsing error: {0}")]
    TomlParseError(#[from] toml::de::Error),

    #[error("Configuration error: {message}")]
    ConfigError { message: String },

    #[error("Invalid value for '{field}' ({value}): {reason}")]
    InvalidConfigValueError {
        field: String,
        value: String,
        reason: String,
    },

    #[error("Missing required configuration: {field}")]
    MissingConfigError { field: String },

    #[error("Preference storage error: {message}")]
    StorageError { message: String },

    #[error("Command delivery failed: {message}")]
    DeliveryError { message: String },

    #[error("Unknown command action: {action}")]
    UnknownAction { action: String },

    #[error("Mutation delivery did not settle after {rounds} rounds")]
    MutationLoop { rounds: usize },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorCategory {
    Configuration,
    Storage,
    Messaging,
    Runtime,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum ErrorSeverity {
    Low,
    Medium,
    High,
    Critical,
}

impl CleanerError {
    pub fn category(&self) -> ErrorCategory {
        match self {
            CleanerError::TomlParseError(_)
            | CleanerError::ConfigError { .. }
            | CleanerError::InvalidConfigValueError { .. }
            | CleanerError::MissingConfigError { .. } => ErrorCategory::Configuration,
            CleanerError::IoError(_)
            | CleanerError::SerializationError(_)
            | CleanerError::StorageError { .. } => ErrorCategory::Storage,
            CleanerError::DeliveryError { .. } | CleanerError::UnknownAction { .. } => {
                ErrorCategory::Messaging
            }
            CleanerError::MutationLoop { .. } => ErrorCategory::Runtime,
        }
    }

    pub fn severity(&self) -> ErrorSeverity {
        match self {
            // 訊息送達失敗由 popup 端回報，核心不需重試
            CleanerError::UnknownAction { .. } | CleanerError::DeliveryError { .. } => {
                ErrorSeverity::Low
            }
            CleanerError::StorageError { .. } | CleanerError::IoError(_) => ErrorSeverity::Medium,
            CleanerError::SerializationError(_)
            | CleanerError::TomlParseError(_)
            | CleanerError::ConfigError { .. }
            | CleanerError::InvalidConfigValueError { .. }
            | CleanerError::MissingConfigError { .. } => ErrorSeverity::High,
            CleanerError::MutationLoop { .. } => ErrorSeverity::Critical,
        }
    }

    pub fn recovery_suggestion(&self) -> &'static str {
        match self.category() {
            ErrorCategory::Configuration => {
                "Check the configuration file against the documented [selectors]/[styles]/[font]/[scroll] tables"
            }
            ErrorCategory::Storage => {
                "Make sure the preference file exists, is writable and contains valid JSON"
            }
            ErrorCategory::Messaging => "Refresh the page so the content script is injected again",
            ErrorCategory::Runtime => {
                "A handler keeps mutating what it observes; inspect the suppression and container selectors"
            }
        }
    }

    pub fn user_friendly_message(&self) -> String {
        match self {
            CleanerError::InvalidConfigValueError { field, reason, .. } => {
                format!("Setting '{}' is invalid: {}", field, reason)
            }
            CleanerError::MissingConfigError { field } => {
                format!("Setting '{}' is required", field)
            }
            CleanerError::DeliveryError { .. } => "Error: Refresh page!".to_string(),
            other => other.to_string(),
        }
    }
}

pub type Result<T> = std::result::Result<T, CleanerError>;
