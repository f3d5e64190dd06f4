//! Request extractors for the bound site and the reported scheme

use std::ops::Deref;
use std::sync::Arc;

use axum::{async_trait, extract::FromRequestParts, http::request::Parts};
use sitedata_core::{ResolvedSite, Scheme};

use crate::error::WebError;

/// The site bound to the request by the site data middleware.
#[derive(Debug, Clone)]
pub struct CurrentSite(pub Arc<ResolvedSite>);

impl Deref for CurrentSite {
    type Target = ResolvedSite;

    fn deref(&self) -> &Self::Target {
        &self.0
    }
}

#[async_trait]
impl<S> FromRequestParts<S> for CurrentSite
where
    S: Send + Sync,
{
    type Rejection = WebError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        parts
            .extensions
            .get::<CurrentSite>()
            .cloned()
            .ok_or(WebError::SiteNotBound)
    }
}

/// Request extension overriding the scheme reported by [`RequestScheme`].
///
/// Set by the middleware for exact matches on https sites, for deployments
/// where an upstream proxy terminates TLS.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ReportedScheme(pub Scheme);

/// Scheme the request should be treated as having arrived on.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RequestScheme(pub Scheme);

impl RequestScheme {
    pub fn from_parts(parts: &Parts) -> Self {
        if let Some(ReportedScheme(scheme)) = parts.extensions.get::<ReportedScheme>() {
            return Self(*scheme);
        }

        let scheme = parts
            .uri
            .scheme_str()
            .and_then(Scheme::parse)
            .unwrap_or_default();
        Self(scheme)
    }

    pub fn is_secure(&self) -> bool {
        self.0 == Scheme::Https
    }
}

#[async_trait]
impl<S> FromRequestParts<S> for RequestScheme
where
    S: Send + Sync,
{
    type Rejection = std::convert::Infallible;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        Ok(Self::from_parts(parts))
    }
}
