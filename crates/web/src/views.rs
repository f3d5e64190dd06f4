//! Site-aware view configuration
//!
//! A [`SiteView`] picks the template and page size for a request from the
//! site it is served for. Handlers call [`SiteView::context`] with the bound
//! site and hand the resulting [`ViewContext`] to the rendering layer.

use std::sync::Arc;

use serde::Serialize;
use serde_json::Value;
use sitedata_core::ResolvedSite;

/// Errors from deriving view settings from a site.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ViewError {
    #[error("Site '{label}' does not define field '{field}'")]
    MissingField { label: String, field: String },

    #[error("Site '{label}' field '{field}' is not a valid page size: {value}")]
    InvalidPageSize {
        label: String,
        field: String,
        value: String,
    },
}

/// Where a view's template name comes from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TemplateSource {
    /// Same template for every site.
    Fixed(String),
    /// Pattern containing `{template_prefix}`, filled in per site.
    PerSite(String),
}

impl TemplateSource {
    pub fn per_site(pattern: impl Into<String>) -> Self {
        Self::PerSite(pattern.into())
    }

    pub fn resolve(&self, site: &ResolvedSite) -> String {
        match self {
            TemplateSource::Fixed(name) => name.clone(),
            TemplateSource::PerSite(pattern) => site.template_name(pattern),
        }
    }
}

/// Where a paginated view's page size comes from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PageSize {
    Fixed(usize),
    /// Read from a declared extension field of the site.
    SiteField(String),
}

impl PageSize {
    pub fn resolve(&self, site: &ResolvedSite) -> Result<usize, ViewError> {
        let field = match self {
            PageSize::Fixed(size) => return Ok(*size),
            PageSize::SiteField(field) => field,
        };

        let value = site.field(field).ok_or_else(|| ViewError::MissingField {
            label: site.label().to_string(),
            field: field.clone(),
        })?;

        value
            .as_u64()
            .filter(|size| *size > 0)
            .and_then(|size| usize::try_from(size).ok())
            .ok_or_else(|| ViewError::InvalidPageSize {
                label: site.label().to_string(),
                field: field.clone(),
                value: value.to_string(),
            })
    }
}

/// Template and pagination settings of a view.
#[derive(Debug, Clone)]
pub struct SiteView {
    template: TemplateSource,
    page_size: Option<PageSize>,
}

impl SiteView {
    pub fn new(template: TemplateSource) -> Self {
        Self {
            template,
            page_size: None,
        }
    }

    pub fn paginate_by(mut self, page_size: PageSize) -> Self {
        self.page_size = Some(page_size);
        self
    }

    /// Settings for a request served for `site`.
    pub fn context(&self, site: &Arc<ResolvedSite>) -> Result<ViewContext, ViewError> {
        let page_size = self
            .page_size
            .as_ref()
            .map(|page_size| page_size.resolve(site))
            .transpose()?;

        Ok(ViewContext {
            site: Arc::clone(site),
            template_name: self.template.resolve(site),
            page_size,
        })
    }
}

/// Values handed to the rendering layer for one request.
#[derive(Debug, Clone)]
pub struct ViewContext {
    pub site: Arc<ResolvedSite>,
    pub template_name: String,
    pub page_size: Option<usize>,
}

impl ViewContext {
    /// Render context: the site's fields under `sitedata`.
    pub fn to_json(&self) -> Value {
        #[derive(Serialize)]
        struct Context<'a> {
            sitedata: Value,
            template_name: &'a str,
            page_size: Option<usize>,
        }

        serde_json::to_value(Context {
            sitedata: self.site.fields(),
            template_name: &self.template_name,
            page_size: self.page_size,
        })
        .unwrap_or(Value::Null)
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::testing::sample_resolver;

    fn site(label: &str) -> Arc<ResolvedSite> {
        Arc::new(sample_resolver().by_label(label).unwrap())
    }

    #[test]
    fn test_per_site_template() {
        let view = SiteView::new(TemplateSource::per_site("{template_prefix}/article_list.html"));

        let ctx = view.context(&site("nextminingboom")).unwrap();
        assert_eq!(ctx.template_name, "nmb/article_list.html");
        assert_eq!(ctx.page_size, None);

        let ctx = view.context(&site("catalysthunter")).unwrap();
        assert_eq!(ctx.template_name, "ch/article_list.html");
    }

    #[test]
    fn test_fixed_template() {
        let view = SiteView::new(TemplateSource::Fixed("robots.txt".to_string()));
        let ctx = view.context(&site("nextinvestors")).unwrap();
        assert_eq!(ctx.template_name, "robots.txt");
    }

    #[test]
    fn test_page_size_from_site_field() {
        let view = SiteView::new(TemplateSource::per_site("{template_prefix}/list.html"))
            .paginate_by(PageSize::SiteField("articles_per_page".to_string()));

        assert_eq!(view.context(&site("catalysthunter")).unwrap().page_size, Some(12));
        assert_eq!(view.context(&site("nextminingboom")).unwrap().page_size, Some(20));
    }

    #[test]
    fn test_fixed_page_size() {
        let view = SiteView::new(TemplateSource::Fixed("list.html".to_string()))
            .paginate_by(PageSize::Fixed(50));
        assert_eq!(view.context(&site("nextinvestors")).unwrap().page_size, Some(50));
    }

    #[test]
    fn test_page_size_errors() {
        let view = SiteView::new(TemplateSource::Fixed("list.html".to_string()))
            .paginate_by(PageSize::SiteField("not_declared".to_string()));
        assert!(matches!(
            view.context(&site("catalysthunter")),
            Err(ViewError::MissingField { .. })
        ));

        // nextinvestors sets articles_per_page = 0
        let view = SiteView::new(TemplateSource::Fixed("list.html".to_string()))
            .paginate_by(PageSize::SiteField("articles_per_page".to_string()));
        assert!(matches!(
            view.context(&site("nextinvestors")),
            Err(ViewError::InvalidPageSize { .. })
        ));
    }

    #[test]
    fn test_context_json() {
        let view = SiteView::new(TemplateSource::per_site("{template_prefix}/home.html"));
        let json = view.context(&site("nextminingboom")).unwrap().to_json();
        assert_eq!(json["template_name"], "nmb/home.html");
        assert_eq!(json["sitedata"]["label"], "nextminingboom");
        assert_eq!(json["sitedata"]["articles_per_page"], 20);
    }
}
