//! Hostname/label to site resolution
//!
//! Resolves a request hostname or an explicit label to a [`ResolvedSite`]:
//! - Label: must be configured, always an exact match
//! - Hostname: matched against primary and alternate hostnames
//! - Neither, or an unknown hostname: falls back to the default label
//!   unless an exact match is required

use std::collections::{BTreeMap, BTreeSet};
use std::sync::Arc;

use serde_json::Value;

use crate::error::{SiteDataError, SiteDataResult};
use crate::host::normalize_hostname;
use crate::site::{ResolvedSite, Scheme, DEFAULT_LOCALE, TITLE_PLACEHOLDER};
use crate::table::{SiteRecord, SiteTable};

/// Resolver over a shared, read-only site table.
#[derive(Debug, Clone)]
pub struct SiteResolver {
    table: Arc<SiteTable>,
}

impl SiteResolver {
    pub fn new(table: SiteTable) -> Self {
        Self {
            table: Arc::new(table),
        }
    }

    pub fn with_table(table: Arc<SiteTable>) -> Self {
        Self { table }
    }

    pub fn table(&self) -> &SiteTable {
        &self.table
    }

    /// Resolve a site from a hostname or a label (not both).
    ///
    /// Empty strings count as "not supplied". With neither supplied the
    /// default site is returned with `exact_match_found == false`.
    pub fn resolve(
        &self,
        hostname: Option<&str>,
        label: Option<&str>,
        require_exact_match: bool,
    ) -> SiteDataResult<ResolvedSite> {
        let hostname = hostname.filter(|h| !h.is_empty());
        let label = label.filter(|l| !l.is_empty());

        let (label, exact_match_found) = match (hostname, label) {
            (Some(_), Some(_)) => {
                return Err(SiteDataError::InvalidRequest(
                    "Both hostname and label specified for site data; only use one".to_string(),
                ));
            }
            (None, Some(label)) => {
                if !self.table.contains_label(label) {
                    return Err(SiteDataError::InvalidRequest(format!(
                        "Attempted to access a missing site data definition '{}'",
                        label
                    )));
                }
                (label, true)
            }
            (Some(hostname), None) => {
                let normalized = normalize_hostname(hostname);
                match self.table.label_for_hostname(&normalized) {
                    Some(label) => (label, true),
                    None => (self.fallback(Some(hostname), require_exact_match)?, false),
                }
            }
            (None, None) => (self.fallback(None, require_exact_match)?, false),
        };

        let site = self.build(label, exact_match_found)?;

        tracing::trace!(
            label = %site.label,
            exact_match_found = site.exact_match_found,
            "Resolved site"
        );

        Ok(site)
    }

    /// Resolve by hostname; a port suffix is ignored.
    pub fn by_hostname(
        &self,
        hostname: &str,
        require_exact_match: bool,
    ) -> SiteDataResult<ResolvedSite> {
        self.resolve(Some(hostname), None, require_exact_match)
    }

    /// Resolve a configured label.
    pub fn by_label(&self, label: &str) -> SiteDataResult<ResolvedSite> {
        self.resolve(None, Some(label), false)
    }

    /// Resolve the default site.
    pub fn default_site(&self) -> SiteDataResult<ResolvedSite> {
        self.resolve(None, None, false)
    }

    /// One resolved site per configured label, in table order.
    pub fn all(&self) -> SiteDataResult<Vec<ResolvedSite>> {
        self.table.labels().map(|label| self.by_label(label)).collect()
    }

    /// Resolve every label and collect configuration defects instead of
    /// stopping at the first one. Used for startup diagnostics.
    pub fn check(&self) -> Vec<SiteDataError> {
        self.table
            .labels()
            .filter_map(|label| self.by_label(label).err())
            .collect()
    }

    fn fallback(&self, hostname: Option<&str>, require_exact_match: bool) -> SiteDataResult<&str> {
        if require_exact_match {
            return Err(SiteDataError::InvalidRequest(format!(
                "Site data with require_exact_match enabled could not find a matching entry: {}",
                hostname.unwrap_or("<none>")
            )));
        }
        Ok(self.table.default_label())
    }

    fn build(&self, label: &str, exact_match_found: bool) -> SiteDataResult<ResolvedSite> {
        let record = self
            .table
            .record(label)
            .ok_or_else(|| SiteDataError::invalid_configuration(label, "no record"))?;
        let fields = Fields { label, record };

        let title = fields.string("title")?;
        if title.matches(TITLE_PLACEHOLDER).count() != 1 {
            return Err(SiteDataError::invalid_configuration(
                label,
                format!("title '{}' must contain exactly one {{}} placeholder", title),
            ));
        }

        let mut extra = BTreeMap::new();
        for field in self.table.additional_fields() {
            extra.insert(field.clone(), fields.required(field)?.clone());
        }

        Ok(ResolvedSite {
            label: label.to_string(),
            exact_match_found,
            name: fields.string("name")?,
            template_prefix: fields.string("template_prefix")?,
            hostname: fields.string("hostname")?.to_lowercase(),
            hostnames_other: fields.string_set("hostnames_other")?,
            description: fields.string("description")?,
            title,
            urlconf: fields
                .optional_string("urlconf")?
                .unwrap_or_else(|| self.table.root_urlconf().to_string()),
            locale: fields
                .optional_string("locale")?
                .unwrap_or_else(|| DEFAULT_LOCALE.to_string()),
            scheme: fields.scheme()?,
            port: fields.port()?,
            extra,
        })
    }
}

/// Typed access to one record's raw fields.
struct Fields<'a> {
    label: &'a str,
    record: &'a SiteRecord,
}

impl<'a> Fields<'a> {
    fn required(&self, field: &str) -> SiteDataResult<&'a Value> {
        self.record
            .get(field)
            .ok_or_else(|| SiteDataError::invalid_configuration(self.label, format!("missing field '{}'", field)))
    }

    fn present(&self, field: &str) -> Option<&'a Value> {
        self.record.get(field).filter(|v| !v.is_null())
    }

    fn mistyped(&self, field: &str, expected: &str) -> SiteDataError {
        SiteDataError::invalid_configuration(
            self.label,
            format!("field '{}' must be {}", field, expected),
        )
    }

    fn string(&self, field: &str) -> SiteDataResult<String> {
        self.required(field)?
            .as_str()
            .map(str::to_string)
            .ok_or_else(|| self.mistyped(field, "a string"))
    }

    fn optional_string(&self, field: &str) -> SiteDataResult<Option<String>> {
        match self.present(field) {
            None => Ok(None),
            Some(value) => value
                .as_str()
                .map(|s| Some(s.to_string()))
                .ok_or_else(|| self.mistyped(field, "a string")),
        }
    }

    fn string_set(&self, field: &str) -> SiteDataResult<BTreeSet<String>> {
        let values = self
            .required(field)?
            .as_array()
            .ok_or_else(|| self.mistyped(field, "a list of strings"))?;

        values
            .iter()
            .map(|v| {
                v.as_str()
                    .map(str::to_lowercase)
                    .ok_or_else(|| self.mistyped(field, "a list of strings"))
            })
            .collect()
    }

    fn scheme(&self) -> SiteDataResult<Scheme> {
        match self.optional_string("scheme")? {
            None => Ok(Scheme::default()),
            Some(s) => Scheme::parse(&s).ok_or_else(|| self.mistyped("scheme", "'http' or 'https'")),
        }
    }

    fn port(&self) -> SiteDataResult<Option<u16>> {
        match self.present("port") {
            None => Ok(None),
            Some(value) => value
                .as_u64()
                .and_then(|p| u16::try_from(p).ok())
                .filter(|p| *p != 0)
                .map(Some)
                .ok_or_else(|| self.mistyped("port", "an integer between 1 and 65535")),
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    const TABLE: &str = r#"
        default = "exampleorg"
        additional_fields = ["paginate_by"]

        [sites.exampleorg]
        name = "Example Org"
        template_prefix = "exampleorg"
        hostname = "example.org"
        hostnames_other = ["www.example.org", "old.example.org"]
        description = "The default site"
        title = "{} | Example Org"
        paginate_by = 10

        [sites.examplecom]
        name = "Example"
        template_prefix = "examplecom"
        hostname = "www.example.com"
        hostnames_other = []
        description = "The https site"
        title = "{} | Example"
        scheme = "https"
        locale = "en_AU"
        urlconf = "examplecom"
        paginate_by = 25

        [sites.dev]
        name = "Dev"
        template_prefix = "dev"
        hostname = "dev.local"
        hostnames_other = []
        description = "Local development"
        title = "[dev] {}"
        port = 8000
        paginate_by = 5
    "#;

    fn resolver() -> SiteResolver {
        SiteResolver::new(SiteTable::from_toml_str(TABLE).unwrap())
    }

    #[test]
    fn test_resolve_every_label() {
        let resolver = resolver();
        for label in ["exampleorg", "examplecom", "dev"] {
            let site = resolver.by_label(label).unwrap();
            assert_eq!(site.label(), label);
            assert!(site.exact_match_found());
        }
    }

    #[test]
    fn test_resolve_every_hostname() {
        let resolver = resolver();
        let cases = [
            ("example.org", "exampleorg"),
            ("www.example.org", "exampleorg"),
            ("old.example.org", "exampleorg"),
            ("www.example.com", "examplecom"),
            ("dev.local", "dev"),
        ];
        for (hostname, label) in cases {
            let site = resolver.by_hostname(hostname, true).unwrap();
            assert_eq!(site.label(), label, "hostname {}", hostname);
            assert!(site.exact_match_found());
        }
    }

    #[test]
    fn test_resolve_hostname_is_case_insensitive_and_ignores_port() {
        let resolver = resolver();
        let site = resolver.by_hostname("WWW.Example.COM", false).unwrap();
        assert_eq!(site.label(), "examplecom");

        let site = resolver.by_hostname("www.example.com:8443", true).unwrap();
        assert_eq!(site.label(), "examplecom");
        assert!(site.exact_match_found());
    }

    #[test]
    fn test_configured_hostname_with_trailing_dot_matches() {
        let table = TABLE.replace(r#"hostname = "dev.local""#, r#"hostname = "Dev.Local.""#);
        let resolver = SiteResolver::new(SiteTable::from_toml_str(&table).unwrap());

        let site = resolver.by_hostname("dev.local:8000", true).unwrap();
        assert_eq!(site.label(), "dev");
        assert!(site.exact_match_found());
    }

    #[test]
    fn test_resolve_default() {
        let site = resolver().resolve(None, None, false).unwrap();
        assert_eq!(site.label(), "exampleorg");
        assert!(!site.exact_match_found());
        assert_eq!(site.as_fqdn("/x"), "http://example.org/x");
    }

    #[test]
    fn test_resolve_default_with_exact_match_required() {
        let err = resolver().resolve(None, None, true).unwrap_err();
        assert!(matches!(err, SiteDataError::InvalidRequest(_)));
    }

    #[test]
    fn test_unknown_hostname() {
        let resolver = resolver();

        let err = resolver.by_hostname("unknown.example", true).unwrap_err();
        assert!(matches!(err, SiteDataError::InvalidRequest(_)));

        let site = resolver.by_hostname("unknown.example", false).unwrap();
        assert_eq!(site.label(), "exampleorg");
        assert!(!site.exact_match_found());
    }

    #[test]
    fn test_both_hostname_and_label_rejected() {
        let resolver = resolver();
        for (hostname, label) in [
            ("example.org", "exampleorg"),
            ("unknown.example", "nope"),
            ("www.example.com", "dev"),
        ] {
            let err = resolver
                .resolve(Some(hostname), Some(label), false)
                .unwrap_err();
            assert!(matches!(err, SiteDataError::InvalidRequest(_)));
        }
    }

    #[test]
    fn test_empty_arguments_count_as_missing() {
        let site = resolver().resolve(Some(""), Some(""), false).unwrap();
        assert_eq!(site.label(), "exampleorg");
        assert!(!site.exact_match_found());
    }

    #[test]
    fn test_unknown_label_rejected() {
        let err = resolver().by_label("missing").unwrap_err();
        assert!(matches!(err, SiteDataError::InvalidRequest(msg) if msg.contains("missing")));
    }

    #[test]
    fn test_optional_defaults() {
        let site = resolver().by_label("exampleorg").unwrap();
        assert_eq!(site.urlconf(), "root");
        assert_eq!(site.locale(), "en_US");
        assert_eq!(site.scheme(), Scheme::Http);
        assert_eq!(site.port(), None);
    }

    #[test]
    fn test_optional_overrides() {
        let resolver = resolver();

        let site = resolver.by_label("examplecom").unwrap();
        assert_eq!(site.urlconf(), "examplecom");
        assert_eq!(site.locale(), "en_AU");
        assert_eq!(site.scheme(), Scheme::Https);
        assert_eq!(site.as_fqdn("about/"), "https://www.example.com/about/");

        let site = resolver.by_label("dev").unwrap();
        assert_eq!(site.port(), Some(8000));
        assert_eq!(site.host_with_port(), "dev.local:8000");
        assert_eq!(site.format_title("Home"), "[dev] Home");
    }

    #[test]
    fn test_extension_fields() {
        let site = resolver().by_label("examplecom").unwrap();
        assert_eq!(site.field("paginate_by"), Some(&Value::from(25)));
        assert_eq!(site.field("og_image"), None);
    }

    #[test]
    fn test_all_in_label_order() {
        let labels: Vec<String> = resolver()
            .all()
            .unwrap()
            .into_iter()
            .map(|s| s.label().to_string())
            .collect();
        assert_eq!(labels, vec!["dev", "examplecom", "exampleorg"]);
    }

    #[test]
    fn test_missing_required_field() {
        let source = r#"
            default = "broken"
            [sites.broken]
            name = "Broken"
            template_prefix = "broken"
            hostname = "broken.example"
            hostnames_other = []
            title = "{} | Broken"
        "#;
        let resolver = SiteResolver::new(SiteTable::from_toml_str(source).unwrap());
        let err = resolver.default_site().unwrap_err();
        assert!(matches!(
            err,
            SiteDataError::InvalidConfiguration { ref label, ref reason }
                if label == "broken" && reason.contains("description")
        ));
        assert_eq!(resolver.check().len(), 1);
    }

    #[test]
    fn test_missing_extension_field() {
        let source = r#"
            default = "a"
            additional_fields = ["og_image"]
            [sites.a]
            name = "A"
            template_prefix = "a"
            hostname = "a.example"
            hostnames_other = []
            description = ""
            title = "{}"
        "#;
        let resolver = SiteResolver::new(SiteTable::from_toml_str(source).unwrap());
        assert!(matches!(
            resolver.by_label("a"),
            Err(SiteDataError::InvalidConfiguration { .. })
        ));
    }

    #[test]
    fn test_mistyped_fields() {
        let base = r#"
            default = "a"
            [sites.a]
            name = "A"
            template_prefix = "a"
            hostname = "a.example"
            description = ""
        "#;
        let cases = [
            "hostnames_other = \"a.example\"\ntitle = \"{}\"",
            "hostnames_other = []\ntitle = \"no placeholder\"",
            "hostnames_other = []\ntitle = \"{} {}\"",
            "hostnames_other = []\ntitle = \"{}\"\nscheme = \"ftp\"",
            "hostnames_other = []\ntitle = \"{}\"\nport = 70000",
            "hostnames_other = []\ntitle = \"{}\"\nport = \"80\"",
        ];
        for case in cases {
            let source = format!("{}\n{}", base, case);
            let resolver = SiteResolver::new(SiteTable::from_toml_str(&source).unwrap());
            assert!(
                matches!(
                    resolver.default_site(),
                    Err(SiteDataError::InvalidConfiguration { .. })
                ),
                "expected configuration error for: {}",
                case
            );
        }
    }
}
