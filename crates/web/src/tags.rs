//! Presentation helpers
//!
//! String helpers for the rendering layer that qualify URLs and paths with
//! a site's scheme and host:
//! - `url_fqdn`: reverse a named route, then qualify it
//! - `with_fqdn`: qualify a known path
//! - `static_with_fqdn`: qualify a static asset path
//! - `sitedata_title`: format a page title
//!
//! The context site is the request's site when there is one, otherwise the
//! default site. Output is not HTML-escaped.

use std::sync::Arc;

use axum::{async_trait, extract::FromRequestParts, http::request::Parts};
use sitedata_core::ResolvedSite;

use crate::current::current_site;
use crate::error::{WebError, WebResult};
use crate::extract::CurrentSite;
use crate::state::AppState;
use crate::urlconf::encode_path;

/// Presentation helpers bound to the application state and, optionally,
/// the request's site.
#[derive(Clone)]
pub struct SiteTags {
    state: AppState,
    site: Option<Arc<ResolvedSite>>,
}

impl SiteTags {
    pub fn new(state: AppState, site: Option<Arc<ResolvedSite>>) -> Self {
        Self { state, site }
    }

    /// Helpers for code without access to the request: uses the task-local
    /// current site, if one is published.
    pub fn from_current(state: AppState) -> Self {
        Self::new(state, current_site())
    }

    /// Site used when no explicit label is given.
    pub fn context_site(&self) -> WebResult<Arc<ResolvedSite>> {
        match &self.site {
            Some(site) => Ok(Arc::clone(site)),
            None => Ok(Arc::new(self.state.resolver.default_site()?)),
        }
    }

    /// Reverse `route` and return it fully qualified.
    ///
    /// With `sitedata`, the named site's URL configuration, scheme and host
    /// are used instead of the context site's.
    pub fn url_fqdn(&self, route: &str, args: &[&str], sitedata: Option<&str>) -> WebResult<String> {
        let site = match sitedata {
            Some(label) => Arc::new(self.state.resolver.by_label(label)?),
            None => self.context_site()?,
        };

        let path = self.state.routes.reverse(Some(site.urlconf()), route, args)?;
        Ok(site.as_fqdn(&path))
    }

    /// Like [`SiteTags::url_fqdn`], but a route that cannot be reversed
    /// yields `None` instead of an error.
    pub fn url_fqdn_as(
        &self,
        route: &str,
        args: &[&str],
        sitedata: Option<&str>,
    ) -> WebResult<Option<String>> {
        match self.url_fqdn(route, args, sitedata) {
            Ok(url) => Ok(Some(url)),
            Err(WebError::NoReverseMatch(err)) => {
                tracing::debug!(error = %err, "Suppressed reverse failure");
                Ok(None)
            }
            Err(err) => Err(err),
        }
    }

    /// Qualify a path (or leave an already qualified URL alone).
    pub fn with_fqdn(&self, path: &str) -> WebResult<String> {
        Ok(self.context_site()?.as_fqdn(path))
    }

    /// Qualify a static asset path below `STATIC_URL`. The asset path is
    /// percent-encoded segment by segment.
    pub fn static_with_fqdn(&self, asset_path: &str) -> WebResult<String> {
        let path = format!(
            "{}{}",
            self.state.config.static_url,
            encode_path(asset_path.trim_start_matches('/'))
        );
        self.with_fqdn(&path)
    }

    /// Page title formatted with the site's title template.
    pub fn sitedata_title(&self, title: &str) -> WebResult<String> {
        Ok(self.context_site()?.format_title(title))
    }
}

#[async_trait]
impl FromRequestParts<AppState> for SiteTags {
    type Rejection = WebError;

    async fn from_request_parts(parts: &mut Parts, state: &AppState) -> Result<Self, Self::Rejection> {
        let site = parts.extensions.get::<CurrentSite>().map(|site| Arc::clone(&site.0));
        Ok(Self::new(state.clone(), site))
    }
}
