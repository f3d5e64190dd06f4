//! HTTP routes

pub mod debug;
pub mod health;
pub mod pages;

use axum::{body::Body, http::Request, middleware, routing::get, Router};
use tower_http::trace::TraceLayer;

use crate::{middleware::sitedata_middleware, state::AppState, urlconf::UrlConfs};

/// Path of the site data debug panel
pub const DEBUG_PANEL_PATH: &str = "/__sitedata__";

/// Create the application router
///
/// Every route except the health checks runs behind the site data
/// middleware; requests are then dispatched to the URL configuration of
/// their site.
pub fn create_router(state: AppState, urlconfs: UrlConfs) -> Router {
    // Health check routes (outside site binding for infrastructure monitoring)
    let health_routes = Router::new()
        .route("/health", get(health::health))
        .route("/health/live", get(health::liveness));

    let dispatcher = urlconfs.into_dispatcher(&state);

    let mut site_routes = Router::new();
    if state.config.enable_debug_panel {
        tracing::info!(path = DEBUG_PANEL_PATH, "Site data debug panel enabled");
        site_routes = site_routes.route(DEBUG_PANEL_PATH, get(debug::sitedata_panel));
    }

    let site_routes = site_routes
        .fallback(move |request: Request<Body>| dispatcher.clone().dispatch(request))
        .layer(middleware::from_fn_with_state(
            state.clone(),
            sitedata_middleware,
        ));

    Router::new()
        .merge(health_routes)
        .merge(site_routes)
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}
