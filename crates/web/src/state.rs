//! Shared application state

use std::sync::Arc;

use sitedata_core::{SiteResolver, SiteTable, TableError};

use crate::config::Config;
use crate::urlconf::RouteTable;

/// State shared by the middleware, handlers and presentation helpers
#[derive(Clone)]
pub struct AppState {
    pub config: Arc<Config>,
    pub resolver: SiteResolver,
    pub routes: Arc<RouteTable>,
}

impl AppState {
    pub fn new(config: Config, resolver: SiteResolver, routes: RouteTable) -> Self {
        let state = Self {
            config: Arc::new(config),
            resolver,
            routes: Arc::new(routes),
        };
        state.log_configuration_defects();
        state
    }

    /// Load the site table named by the configuration and build the state.
    pub fn from_config(config: Config, routes: RouteTable) -> Result<Self, TableError> {
        let mut table = SiteTable::from_path(&config.sitedata_file)?;
        if let Some(label) = &config.sitedata_default {
            table = table.with_default_label(label.clone())?;
        }
        Ok(Self::new(config, SiteResolver::new(table), routes))
    }

    /// Report sites that cannot be resolved or point at an unregistered URL
    /// configuration. Requests for them fail; the rest keep working.
    fn log_configuration_defects(&self) {
        let table = self.resolver.table();

        if self.routes.root() != table.root_urlconf() {
            tracing::warn!(
                table_root = %table.root_urlconf(),
                registered_root = %self.routes.root(),
                "Root URL configuration name differs from the site table"
            );
        }

        for error in self.resolver.check() {
            tracing::error!(error = %error, "Site configuration defect");
        }

        for label in table.labels() {
            if let Ok(site) = self.resolver.by_label(label) {
                if !self.routes.contains(site.urlconf()) {
                    tracing::error!(
                        label = %label,
                        urlconf = %site.urlconf(),
                        "Site uses an unregistered URL configuration"
                    );
                }
            }
        }
    }
}
