//! Resolved site: the per-call result of site resolution

use std::collections::{BTreeMap, BTreeSet};
use std::fmt;

use serde::{Deserialize, Serialize};
use serde_json::{json, Value};

/// Default locale when a site does not configure one.
pub const DEFAULT_LOCALE: &str = "en_US";

/// Placeholder substituted by [`ResolvedSite::format_title`].
pub const TITLE_PLACEHOLDER: &str = "{}";

/// Placeholder substituted by [`ResolvedSite::template_name`].
pub const TEMPLATE_PREFIX_PLACEHOLDER: &str = "{template_prefix}";

/// URL scheme a site is served on.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Scheme {
    #[default]
    Http,
    Https,
}

impl Scheme {
    pub fn as_str(&self) -> &'static str {
        match self {
            Scheme::Http => "http",
            Scheme::Https => "https",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s.to_lowercase().as_str() {
            "http" => Some(Scheme::Http),
            "https" => Some(Scheme::Https),
            _ => None,
        }
    }
}

impl fmt::Display for Scheme {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Metadata for one site, as resolved for a request or an explicit call.
///
/// Immutable once built; fields are exposed through getters only.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ResolvedSite {
    pub(crate) label: String,
    pub(crate) exact_match_found: bool,
    pub(crate) name: String,
    pub(crate) template_prefix: String,
    pub(crate) hostname: String,
    pub(crate) hostnames_other: BTreeSet<String>,
    pub(crate) description: String,
    pub(crate) title: String,
    pub(crate) urlconf: String,
    pub(crate) locale: String,
    pub(crate) scheme: Scheme,
    pub(crate) port: Option<u16>,
    #[serde(flatten)]
    pub(crate) extra: BTreeMap<String, Value>,
}

impl ResolvedSite {
    /// The table key this site was resolved to.
    pub fn label(&self) -> &str {
        &self.label
    }

    /// True when resolved by hostname or label, false on default fallback.
    pub fn exact_match_found(&self) -> bool {
        self.exact_match_found
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn template_prefix(&self) -> &str {
        &self.template_prefix
    }

    /// Primary hostname.
    pub fn hostname(&self) -> &str {
        &self.hostname
    }

    pub fn hostnames_other(&self) -> &BTreeSet<String> {
        &self.hostnames_other
    }

    pub fn description(&self) -> &str {
        &self.description
    }

    /// Title template, e.g. `"{} | Example"`.
    pub fn title(&self) -> &str {
        &self.title
    }

    /// Name of the URL configuration serving this site.
    pub fn urlconf(&self) -> &str {
        &self.urlconf
    }

    pub fn locale(&self) -> &str {
        &self.locale
    }

    pub fn scheme(&self) -> Scheme {
        self.scheme
    }

    pub fn port(&self) -> Option<u16> {
        self.port
    }

    /// Declared extension field, if configured for this site.
    pub fn field(&self, name: &str) -> Option<&Value> {
        self.extra.get(name)
    }

    /// Declared extension fields.
    pub fn extra_fields(&self) -> &BTreeMap<String, Value> {
        &self.extra
    }

    /// `:<port>` when a port is set, otherwise empty.
    pub fn port_suffix(&self) -> String {
        self.port.map(|port| format!(":{}", port)).unwrap_or_default()
    }

    /// Primary hostname with the port suffix, e.g. `example.com:8081`.
    pub fn host_with_port(&self) -> String {
        format!("{}{}", self.hostname, self.port_suffix())
    }

    /// Qualify a path with this site's scheme and host.
    ///
    /// Values that already contain `://` are returned unchanged.
    pub fn as_fqdn(&self, path: &str) -> String {
        fqdn_format(self.scheme, &self.host_with_port(), path)
    }

    /// Substitute `text` into the title template.
    ///
    /// ```
    /// # use sitedata_core::{SiteResolver, SiteTable};
    /// # let table = SiteTable::from_toml_str(r#"
    /// #     default = "ex"
    /// #     [sites.ex]
    /// #     name = "Example"
    /// #     template_prefix = "ex"
    /// #     hostname = "example.org"
    /// #     hostnames_other = []
    /// #     description = ""
    /// #     title = "{} | Example"
    /// # "#).unwrap();
    /// # let site = SiteResolver::new(table).default_site().unwrap();
    /// assert_eq!(site.format_title("Latest News"), "Latest News | Example");
    /// ```
    pub fn format_title(&self, text: &str) -> String {
        self.title.replacen(TITLE_PLACEHOLDER, text, 1)
    }

    /// Substitute `{template_prefix}` in a template-name pattern,
    /// e.g. `"{template_prefix}/article.html"`.
    pub fn template_name(&self, pattern: &str) -> String {
        pattern.replace(TEMPLATE_PREFIX_PLACEHOLDER, &self.template_prefix)
    }

    /// Every field, including `label` and `exact_match_found`, as a JSON object.
    pub fn fields(&self) -> Value {
        serde_json::to_value(self).unwrap_or_else(|_| json!({ "label": self.label }))
    }
}

impl fmt::Display for ResolvedSite {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.label)
    }
}

/// Build `<scheme>://<host><path>`, inserting a leading `/` when missing.
/// Paths that already contain `://` are returned unchanged.
pub fn fqdn_format(scheme: Scheme, host: &str, path: &str) -> String {
    if path.contains("://") {
        return path.to_string();
    }

    if path.starts_with('/') {
        format!("{}://{}{}", scheme, host, path)
    } else {
        format!("{}://{}/{}", scheme, host, path)
    }
}
