// src/error.rs
use reqwest::StatusCode;
use thiserror::Error;

/// Failures talking to the cPanel UAPI.
#[derive(Debug, Error)]
pub enum CpanelError {
    /// Request construction or network failure.
    #[error("{operation} request failed: {source}")]
    Transport {
        operation: &'static str,
        #[source]
        source: reqwest::Error,
    },

    /// A request parameter could not be serialized.
    #[error("could not encode {operation} request: {source}")]
    Encode {
        operation: &'static str,
        #[source]
        source: serde_json::Error,
    },

    /// The body was not the JSON document UAPI promises.
    #[error("could not decode {operation} response (HTTP {status}): {source}")]
    Decode {
        operation: &'static str,
        status: StatusCode,
        #[source]
        source: serde_json::Error,
    },

    /// The body parsed but cPanel reported errors.
    #[error("{operation} reported errors: {}", .errors.join("; "))]
    Provider {
        operation: &'static str,
        errors: Vec<String>,
    },
}

impl CpanelError {
    pub fn transport(operation: &'static str) -> impl FnOnce(reqwest::Error) -> Self {
        move |source| CpanelError::Transport { operation, source }
    }

    /// Provider-reported error strings, if any.
    pub fn provider_errors(&self) -> &[String] {
        match self {
            CpanelError::Provider { errors, .. } => errors,
            _ => &[],
        }
    }
}

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("username field not present in secret")]
    MissingUsername,

    #[error("password or API token field not present in secret")]
    MissingCredentials,

    #[error("cpanelUrl wasn't provided")]
    MissingCpanelUrl,

    #[error("invalid cPanel URL '{0}': expected http:// or https://")]
    InvalidUrl(String),

    #[error("expected secretRef to be in the form namespace/name, got '{0}'")]
    InvalidSecretRef(String),

    #[error("invalid zone '{zone}': {reason}")]
    InvalidZone { zone: String, reason: String },

    #[error("error decoding solver config: {0}")]
    Json(#[from] serde_json::Error),

    #[error("could not read secret {path}: {source}")]
    SecretIo {
        path: String,
        #[source]
        source: std::io::Error,
    },
}

/// Errors surfaced to the issuance host from a solver call.
#[derive(Debug, Error)]
pub enum SolverError {
    #[error(transparent)]
    Config(#[from] ConfigError),

    #[error(transparent)]
    Cpanel(#[from] CpanelError),
}
