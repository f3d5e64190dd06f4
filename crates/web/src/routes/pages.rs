//! Site pages
//!
//! Handlers are shared by every site; the bound site picks templates, page
//! sizes, titles and canonical URLs.

use axum::{
    extract::{Path, Query},
    routing::get,
    Json,
};
use serde::Deserialize;
use serde_json::{json, Value};

use crate::error::WebResult;
use crate::extract::CurrentSite;
use crate::tags::SiteTags;
use crate::urlconf::UrlConf;
use crate::views::{PageSize, SiteView, TemplateSource};

/// Extension field holding a site's article list page size
pub const ARTICLES_PER_PAGE_FIELD: &str = "articles_per_page";

/// Full page set
pub fn urlconf(name: &str) -> UrlConf {
    UrlConf::new(name)
        .route("home", "/", get(home))
        .route("search", "/search/", get(search))
        .route("article_list", "/articles/", get(article_list))
        .route("article", "/articles/:slug/", get(article))
}

/// Reduced page set with search under `/find/`
pub fn compact_urlconf(name: &str) -> UrlConf {
    UrlConf::new(name)
        .route("home", "/", get(home))
        .route("search", "/find/", get(search))
}

fn page(
    view: &SiteView,
    site: &CurrentSite,
    tags: &SiteTags,
    title: &str,
    canonical: String,
) -> WebResult<Json<Value>> {
    let context = view.context(&site.0)?;

    let mut body = context.to_json();
    body["title"] = json!(tags.sitedata_title(title)?);
    body["canonical_url"] = json!(canonical);
    Ok(Json(body))
}

pub async fn home(site: CurrentSite, tags: SiteTags) -> WebResult<Json<Value>> {
    let view = SiteView::new(TemplateSource::per_site("{template_prefix}/home.html"));
    let canonical = tags.url_fqdn("home", &[], None)?;
    page(&view, &site, &tags, site.name(), canonical)
}

#[derive(Debug, Deserialize)]
pub struct SearchQuery {
    #[serde(default)]
    pub q: String,
}

pub async fn search(
    site: CurrentSite,
    tags: SiteTags,
    Query(query): Query<SearchQuery>,
) -> WebResult<Json<Value>> {
    let view = SiteView::new(TemplateSource::Fixed("search.html".to_string()));
    let canonical = tags.url_fqdn("search", &[], None)?;

    let mut body = page(&view, &site, &tags, "Search", canonical)?;
    body.0["query"] = json!(query.q);
    Ok(body)
}

pub async fn article_list(site: CurrentSite, tags: SiteTags) -> WebResult<Json<Value>> {
    let view = SiteView::new(TemplateSource::per_site("{template_prefix}/article_list.html"))
        .paginate_by(PageSize::SiteField(ARTICLES_PER_PAGE_FIELD.to_string()));
    let canonical = tags.url_fqdn("article_list", &[], None)?;
    page(&view, &site, &tags, "Articles", canonical)
}

pub async fn article(
    site: CurrentSite,
    tags: SiteTags,
    Path(slug): Path<String>,
) -> WebResult<Json<Value>> {
    let view = SiteView::new(TemplateSource::per_site("{template_prefix}/article.html"));
    let canonical = tags.url_fqdn("article", &[slug.as_str()], None)?;

    let mut body = page(&view, &site, &tags, &slug, canonical)?;
    body.0["slug"] = json!(slug);
    body.0["share_image"] = json!(tags.static_with_fqdn("img/share.png")?);
    Ok(body)
}
