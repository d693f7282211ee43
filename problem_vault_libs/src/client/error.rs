use std::path::PathBuf;
use thiserror::Error;

pub type Result<T> = std::result::Result<T, SyncError>;

#[derive(Debug, Error)]
pub enum SyncError {
    #[error("API key required")]
    ApiKeyRequired,
    #[error("failed to reach the backend: {0}")]
    Network(#[from] reqwest::Error),
    #[error("invalid backend url: {0}")]
    InvalidUrl(#[from] url::ParseError),
    #[error("backend url `{0}` cannot carry a path")]
    UnsupportedBaseUrl(String),
    #[error("{message}")]
    Api { status: u16, message: String },
    #[error("unexpected response from the backend: {0}")]
    Decode(#[from] serde_json::Error),
    #[error("backend response has no {0}")]
    MissingData(&'static str),
    #[error("couldn't determine the configuration directory")]
    ConfigDirUnavailable,
    #[error("failed to access client configuration at {}", path.display())]
    ConfigIo {
        path: PathBuf,
        source: std::io::Error,
    },
    #[error("failed to parse client configuration at {}", path.display())]
    ConfigParse {
        path: PathBuf,
        source: serde_json::Error,
    },
}

/// Outcome classes a front end shows to the user.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Outcome {
    Success,
    MissingCredential,
    RejectedCredential,
    ValidationFailure,
    NetworkFailure,
    ServerFailure,
}

impl SyncError {
    pub fn outcome(&self) -> Outcome {
        match self {
            SyncError::ApiKeyRequired => Outcome::MissingCredential,
            SyncError::Network(_) => Outcome::NetworkFailure,
            SyncError::Api { status, .. } => match status {
                401 | 403 => Outcome::RejectedCredential,
                429 => Outcome::ServerFailure,
                400..=499 => Outcome::ValidationFailure,
                _ => Outcome::ServerFailure,
            },
            SyncError::InvalidUrl(_)
            | SyncError::UnsupportedBaseUrl(_)
            | SyncError::ConfigDirUnavailable
            | SyncError::ConfigIo { .. }
            | SyncError::ConfigParse { .. } => Outcome::MissingCredential,
            SyncError::Decode(_) | SyncError::MissingData(_) => Outcome::ServerFailure,
        }
    }

    /// Status line for the user: the outcome class, plus the cause when it helps.
    pub fn status_line(&self) -> String {
        match self {
            SyncError::ApiKeyRequired => self.outcome().status_line().to_string(),
            SyncError::InvalidUrl(_)
            | SyncError::UnsupportedBaseUrl(_)
            | SyncError::ConfigDirUnavailable
            | SyncError::ConfigIo { .. }
            | SyncError::ConfigParse { .. } => format!("Configuration problem: {}", self),
            other => format!("{} {}", other.outcome().status_line(), other),
        }
    }
}

impl Outcome {
    pub fn status_line(&self) -> &'static str {
        match self {
            Outcome::Success => "Problem captured successfully!",
            Outcome::MissingCredential => "API key required. Please configure it first.",
            Outcome::RejectedCredential => "API key rejected:",
            Outcome::ValidationFailure => "Backend rejected the problem:",
            Outcome::NetworkFailure => "Backend unreachable:",
            Outcome::ServerFailure => "Backend save failed:",
        }
    }
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn classifies_api_errors_by_status() {
        let error = |status| SyncError::Api {
            status,
            message: String::from("boom"),
        };

        assert_eq!(error(400).outcome(), Outcome::ValidationFailure);
        assert_eq!(error(401).outcome(), Outcome::RejectedCredential);
        assert_eq!(error(403).outcome(), Outcome::RejectedCredential);
        assert_eq!(error(404).outcome(), Outcome::ValidationFailure);
        assert_eq!(error(429).outcome(), Outcome::ServerFailure);
        assert_eq!(error(500).outcome(), Outcome::ServerFailure);
    }

    #[test]
    fn missing_key_has_its_own_status_line() {
        let error = SyncError::ApiKeyRequired;
        assert_eq!(error.outcome(), Outcome::MissingCredential);
        assert_eq!(
            error.status_line(),
            "API key required. Please configure it first."
        );
    }

    #[test]
    fn status_line_carries_server_message() {
        let error = SyncError::Api {
            status: 403,
            message: String::from("The provided API key is invalid"),
        };
        assert_eq!(
            error.status_line(),
            "API key rejected: The provided API key is invalid"
        );
    }

    #[test]
    fn config_serialization_faults_are_configuration_problems() {
        let source = serde_json::from_str::<serde_json::Value>("{").unwrap_err();
        let error = SyncError::ConfigParse {
            path: PathBuf::from("/tmp/client.json"),
            source,
        };

        assert_eq!(
            error.status_line(),
            "Configuration problem: failed to parse client configuration at /tmp/client.json"
        );
        assert!(!error.status_line().contains("backend"));
    }
}
