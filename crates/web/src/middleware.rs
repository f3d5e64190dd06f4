//! Site data middleware
//!
//! Binds the site matching the request's `Host` to the request before any
//! handler runs:
//! - `CurrentSite` request extension (and the task-local back-reference)
//! - `ActiveUrlConf` when the site is served by a non-root URL configuration
//! - `ReportedScheme` when an https site was matched exactly

use std::sync::Arc;

use axum::{
    body::Body,
    extract::State,
    http::{header, Request, Response},
    middleware::Next,
};
use sitedata_core::{split_domain_port, Scheme};

use crate::current;
use crate::error::WebError;
use crate::extract::{CurrentSite, ReportedScheme};
use crate::state::AppState;
use crate::urlconf::ActiveUrlConf;

/// Raw host of the request: the `Host` header, else the URI authority.
fn request_host(request: &Request<Body>) -> Option<String> {
    request
        .headers()
        .get(header::HOST)
        .and_then(|h| h.to_str().ok())
        .map(str::to_string)
        .or_else(|| request.uri().authority().map(|a| a.as_str().to_string()))
}

/// Middleware that resolves and binds the request's site
pub async fn sitedata_middleware(
    State(state): State<AppState>,
    mut request: Request<Body>,
    next: Next,
) -> Result<Response<Body>, WebError> {
    let host = request_host(&request).unwrap_or_default();
    let (domain, _port) = split_domain_port(&host);

    if domain.is_empty() {
        return Err(WebError::DisallowedHost(format!("'{}'", host)));
    }

    if !state.config.allowed_hosts.is_allowed(&domain) {
        return Err(WebError::DisallowedHost(format!(
            "'{}'. You may need to add '{}' to ALLOWED_HOSTS",
            host, domain
        )));
    }

    let site = Arc::new(
        state
            .resolver
            .by_hostname(&domain, state.config.require_exact_hostname)?,
    );

    tracing::debug!(
        host = %domain,
        label = %site.label(),
        exact_match_found = site.exact_match_found(),
        "Bound site to request"
    );

    let extensions = request.extensions_mut();
    extensions.insert(CurrentSite(Arc::clone(&site)));

    if site.urlconf() != state.resolver.table().root_urlconf() {
        extensions.insert(ActiveUrlConf(site.urlconf().to_string()));
    }

    if site.scheme() == Scheme::Https && site.exact_match_found() {
        extensions.insert(ReportedScheme(Scheme::Https));
    }

    Ok(current::scope(&site, next.run(request)).await)
}
