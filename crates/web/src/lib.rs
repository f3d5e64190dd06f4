//! Site data web layer
//!
//! Binds the site matching each request's host to the request, dispatches it
//! through the site's URL configuration, and provides the site-aware
//! presentation helpers and views.

pub mod config;
pub mod current;
pub mod error;
pub mod extract;
pub mod middleware;
pub mod routes;
pub mod state;
pub mod tags;
pub mod urlconf;
pub mod views;

#[cfg(any(test, feature = "test-utils"))]
pub mod testing;

pub use config::Config;
pub use current::current_site;
pub use error::{WebError, WebResult};
pub use extract::{CurrentSite, RequestScheme};
pub use routes::create_router;
pub use state::AppState;
pub use tags::SiteTags;
pub use urlconf::{NoReverseMatch, RouteTable, UrlConf, UrlConfs};
pub use views::{PageSize, SiteView, TemplateSource, ViewContext, ViewError};
