//! Site data debug panel
//!
//! Shows every field of the site bound to the request. Only mounted when
//! `SITEDATA_DEBUG_PANEL` is enabled.

use axum::Json;
use serde_json::Value;

use crate::extract::CurrentSite;

pub async fn sitedata_panel(CurrentSite(site): CurrentSite) -> Json<Value> {
    Json(site.fields())
}
