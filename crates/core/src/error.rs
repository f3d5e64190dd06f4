//! Error types for site data resolution

use thiserror::Error;

/// Errors raised while resolving a site.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SiteDataError {
    /// Caller misuse: both hostname and label given, unknown label, or an
    /// exact match was required and none was found.
    #[error("Invalid site data request: {0}")]
    InvalidRequest(String),

    /// The matched record is missing a required field or holds a value of
    /// the wrong shape. This is a deployment defect, not a bad request.
    #[error("Invalid site data for '{label}': {reason}")]
    InvalidConfiguration { label: String, reason: String },
}

impl SiteDataError {
    pub(crate) fn invalid_configuration(label: &str, reason: impl Into<String>) -> Self {
        SiteDataError::InvalidConfiguration {
            label: label.to_string(),
            reason: reason.into(),
        }
    }
}

/// Errors raised while loading the configuration table.
#[derive(Debug, Error)]
pub enum TableError {
    #[error("Failed to read site table {path}: {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to parse site table: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("Default site label '{0}' is not configured")]
    UnknownDefault(String),

    #[error("Field '{field}' is reserved and cannot be configured ({context})")]
    ReservedField { field: String, context: String },

    #[error("Unknown field '{field}' in site '{label}'; declare it in additional_fields")]
    UnknownField { label: String, field: String },
}

pub type SiteDataResult<T> = Result<T, SiteDataError>;
