//! Web error types and handling

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;
use sitedata_core::SiteDataError;

use crate::urlconf::NoReverseMatch;
use crate::views::ViewError;

/// Error type for the request boundary, presentation helpers and views
#[derive(Debug, thiserror::Error)]
pub enum WebError {
    // Request validation
    #[error("Invalid HTTP_HOST header: {0}")]
    DisallowedHost(String),

    // Resolution
    #[error(transparent)]
    Site(#[from] SiteDataError),
    #[error("Site data is not bound to this request")]
    SiteNotBound,

    // Routing
    #[error("URL configuration '{0}' is not registered")]
    UnknownUrlConf(String),

    // Presentation
    #[error(transparent)]
    NoReverseMatch(#[from] NoReverseMatch),
    #[error(transparent)]
    View(#[from] ViewError),
}

impl IntoResponse for WebError {
    fn into_response(self) -> Response {
        let (status, code, message) = match &self {
            WebError::DisallowedHost(_) => (StatusCode::BAD_REQUEST, "DISALLOWED_HOST", self.to_string()),

            WebError::Site(SiteDataError::InvalidRequest(msg)) => (StatusCode::BAD_REQUEST, "INVALID_SITE_REQUEST", msg.clone()),
            WebError::Site(SiteDataError::InvalidConfiguration { .. }) => (StatusCode::INTERNAL_SERVER_ERROR, "INVALID_SITE_CONFIGURATION", "Site configuration error".to_string()),
            WebError::SiteNotBound => (StatusCode::INTERNAL_SERVER_ERROR, "SITE_NOT_BOUND", self.to_string()),

            WebError::UnknownUrlConf(_) => (StatusCode::INTERNAL_SERVER_ERROR, "UNKNOWN_URLCONF", self.to_string()),

            WebError::NoReverseMatch(_) => (StatusCode::INTERNAL_SERVER_ERROR, "NO_REVERSE_MATCH", self.to_string()),
            WebError::View(_) => (StatusCode::INTERNAL_SERVER_ERROR, "VIEW_ERROR", self.to_string()),
        };

        if status.is_server_error() {
            tracing::error!(error = %self, code, "Request failed");
        } else {
            tracing::warn!(error = %self, code, "Request rejected");
        }

        let body = Json(json!({
            "error": {
                "code": code,
                "message": message,
            }
        }));

        (status, body).into_response()
    }
}

/// Result type alias for handlers
pub type WebResult<T> = Result<T, WebError>;
