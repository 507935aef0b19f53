//! Error Handling
//!
//! Error type definitions used in gh-label-sync

use thiserror::Error;

pub type Result<T> = std::result::Result<T, Error>;

/// Error types for gh-label-sync
#[derive(Error, Debug)]
pub enum Error {
    #[error("GitHub API error ({status}): {message}")]
    GitHubApi { status: u16, message: String },

    #[error("GitHub request failed: {0}")]
    Transport(octocrab::Error),

    #[error("JSON serialization error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("YAML parsing error: {0}")]
    Yaml(#[from] serde_yaml::Error),

    #[error("CSV parsing error: {0}")]
    Csv(#[from] csv::Error),

    #[error("Configuration validation error: {0}")]
    ConfigValidation(String),

    #[error("Label validation error: {0}")]
    LabelValidation(String),

    #[error("Repository not found: {0}")]
    RepositoryNotFound(String),

    #[error("Could not determine repository (use --repo flag): {0}")]
    RepositoryNotDetected(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Invalid repository format: {0} (expected 'owner/repo')")]
    InvalidRepositoryFormat(String),

    #[error("Invalid label color: {0} (expected 6-digit hex, optional leading #)")]
    InvalidLabelColor(String),

    #[error("Confirmation prompt failed: {0}")]
    Prompt(String),

    #[error("{0}")]
    Generic(String),
}

impl From<octocrab::Error> for Error {
    fn from(error: octocrab::Error) -> Self {
        match error {
            octocrab::Error::GitHub { source, .. } => {
                // e.g. `already_exists` on a 422
                let details: Vec<&str> = source
                    .errors
                    .iter()
                    .flatten()
                    .filter_map(|detail| {
                        detail
                            .get("code")
                            .or_else(|| detail.get("message"))
                            .and_then(|value| value.as_str())
                    })
                    .collect();

                let message = if details.is_empty() {
                    source.message.clone()
                } else {
                    format!("{} ({})", source.message, details.join(", "))
                };

                Error::GitHubApi {
                    status: source.status_code.as_u16(),
                    message,
                }
            }
            other => Error::Transport(other),
        }
    }
}

impl Error {
    /// Create a new configuration validation error
    pub fn config_validation<S: Into<String>>(message: S) -> Self {
        Error::ConfigValidation(message.into())
    }

    /// Create a new label validation error
    pub fn label_validation<S: Into<String>>(message: S) -> Self {
        Error::LabelValidation(message.into())
    }

    /// HTTP status of a GitHub API error response
    pub fn status(&self) -> Option<u16> {
        match self {
            Error::GitHubApi { status, .. } => Some(*status),
            _ => None,
        }
    }

    /// Create a new error from a plain message
    pub fn generic<S: Into<String>>(message: S) -> Self {
        Error::Generic(message.into())
    }
}
