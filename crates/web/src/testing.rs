//! Test helpers
//!
//! Builds requests addressed to a configured site and runs checks once per
//! site, so handler tests exercise the same binding path as production.

#![allow(clippy::unwrap_used, clippy::expect_used)]

use std::sync::Arc;

use axum::{body::Body, http::Request, routing::get, Json};
use serde_json::{json, Value};
use sitedata_core::{ResolvedSite, SiteResolver, SiteTable};

use crate::config::Config;
use crate::current::{self, current_site};
use crate::extract::{CurrentSite, RequestScheme};
use crate::routes::pages;
use crate::state::AppState;
use crate::urlconf::UrlConfs;

/// Site table used throughout the crate's tests.
pub const SAMPLE_TABLE: &str = r#"
default = "catalysthunter"
additional_fields = ["articles_per_page"]

[sites.catalysthunter]
name = "Catalyst Hunter"
template_prefix = "ch"
hostname = "catalysthunter.com"
hostnames_other = ["www.catalysthunter.com"]
description = "Biotech catalysts"
title = "{} | Catalyst Hunter"
articles_per_page = 12

[sites.nextminingboom]
name = "Next Mining Boom"
template_prefix = "nmb"
hostname = "www.nextminingboom.com"
hostnames_other = ["nextminingboom.com"]
description = "Mining news"
title = "{} | Next Mining Boom"
articles_per_page = 20

[sites.nextinvestors]
name = "Next Investors"
template_prefix = "ni"
hostname = "www.nextinvestors.com"
hostnames_other = []
description = "Investor research"
title = "Next Investors: {}"
urlconf = "compact"
scheme = "https"
port = 8443
articles_per_page = 0
"#;

pub fn sample_resolver() -> SiteResolver {
    SiteResolver::new(SiteTable::from_toml_str(SAMPLE_TABLE).expect("sample table"))
}

/// The page URL configurations plus a `/whoami/` route reporting what the
/// handler sees.
pub fn sample_urlconfs() -> UrlConfs {
    UrlConfs::new(pages::urlconf("root").route("whoami", "/whoami/", get(whoami)))
        .with(pages::compact_urlconf("compact").route("whoami", "/whoami/", get(whoami)))
}

pub fn sample_state(config: Config) -> AppState {
    AppState::new(config, sample_resolver(), sample_urlconfs().route_table())
}

async fn whoami(CurrentSite(site): CurrentSite, scheme: RequestScheme) -> Json<Value> {
    Json(json!({
        "label": site.label(),
        "exact_match_found": site.exact_match_found(),
        "urlconf": site.urlconf(),
        "scheme": scheme.0,
        "task_local": current_site().map(|s| s.label().to_string()),
    }))
}

/// `GET uri` with the `Host` header of the site labelled `label`.
pub fn request_for_site(resolver: &SiteResolver, label: &str, uri: &str) -> Request<Body> {
    let site = resolver.by_label(label).expect("known label");
    Request::builder()
        .uri(uri)
        .header("host", site.host_with_port())
        .body(Body::empty())
        .unwrap()
}

/// Run `check` once per configured site, with the site published as the
/// current site.
pub fn for_each_site(resolver: &SiteResolver, mut check: impl FnMut(&ResolvedSite)) {
    for site in resolver.all().expect("resolvable sites") {
        let site = Arc::new(site);
        current::sync_scope(&site, || check(&site));
    }
}

/// Async variant of [`for_each_site`].
pub async fn for_each_site_async<F, Fut>(resolver: &SiteResolver, mut check: F)
where
    F: FnMut(Arc<ResolvedSite>) -> Fut,
    Fut: std::future::Future<Output = ()>,
{
    for site in resolver.all().expect("resolvable sites") {
        let site = Arc::new(site);
        current::scope(&site, check(Arc::clone(&site))).await;
    }
}
