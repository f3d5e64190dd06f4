//! Host header parsing and allow-list matching

use once_cell::sync::Lazy;
use regex::Regex;

/// A lowercase host: a DNS-ish name or a bracketed IPv6 literal, with an
/// optional numeric port.
#[allow(clippy::expect_used)]
static HOST_VALIDATION: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^([a-z0-9.-]+|\[[a-f0-9]*:[a-f0-9.:]+\])(:\d+)?$").expect("Invalid host regex")
});

/// Split a host header value into `(domain, port)`.
///
/// The domain is lowercased and loses a trailing dot. Returns empty strings
/// for a malformed host so callers can treat the result as "no hostname".
pub fn split_domain_port(host: &str) -> (String, String) {
    let host = host.trim().to_lowercase();

    if !HOST_VALIDATION.is_match(&host) {
        return (String::new(), String::new());
    }

    // IPv6 literal without a port
    if host.ends_with(']') {
        return (host, String::new());
    }

    let (domain, port) = match host.rsplit_once(':') {
        Some((domain, port)) => (domain.to_string(), port.to_string()),
        None => (host, String::new()),
    };

    let domain = domain.strip_suffix('.').map(str::to_string).unwrap_or(domain);
    (domain, port)
}

/// Normalize a hostname for table lookups: lowercase, port stripped.
pub fn normalize_hostname(host: &str) -> String {
    split_domain_port(host).0
}

/// Allow-list of hostnames a request may arrive on.
///
/// Patterns:
/// - `*` matches every host
/// - `.example.com` matches `example.com` and any subdomain of it
/// - anything else matches exactly (case-insensitive)
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct AllowedHosts {
    patterns: Vec<String>,
}

impl AllowedHosts {
    pub fn new<I, S>(patterns: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        Self {
            patterns: patterns
                .into_iter()
                .map(|p| p.as_ref().trim().to_lowercase())
                .filter(|p| !p.is_empty())
                .collect(),
        }
    }

    /// Parse a comma-separated list, e.g. the `ALLOWED_HOSTS` variable.
    pub fn parse(list: &str) -> Self {
        Self::new(list.split(','))
    }

    pub fn patterns(&self) -> &[String] {
        &self.patterns
    }

    /// Check a domain (already split from its port) against the allow-list.
    pub fn is_allowed(&self, domain: &str) -> bool {
        let domain = domain.to_lowercase();
        self.patterns
            .iter()
            .any(|pattern| pattern == "*" || is_same_domain(&domain, pattern))
    }
}

fn is_same_domain(host: &str, pattern: &str) -> bool {
    match pattern.strip_prefix('.') {
        Some(bare) => host == bare || host.ends_with(pattern),
        None => host == pattern,
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_split_domain_port() {
        assert_eq!(
            split_domain_port("Example.COM"),
            ("example.com".to_string(), String::new())
        );
        assert_eq!(
            split_domain_port("example.com:8080"),
            ("example.com".to_string(), "8080".to_string())
        );
        assert_eq!(
            split_domain_port("example.com.:443"),
            ("example.com".to_string(), "443".to_string())
        );
        assert_eq!(
            split_domain_port("[::1]:8000"),
            ("[::1]".to_string(), "8000".to_string())
        );
        assert_eq!(split_domain_port("[::1]"), ("[::1]".to_string(), String::new()));
    }

    #[test]
    fn test_split_domain_port_rejects_malformed() {
        assert_eq!(split_domain_port(""), (String::new(), String::new()));
        assert_eq!(split_domain_port("bad host"), (String::new(), String::new()));
        assert_eq!(split_domain_port("example.com:http"), (String::new(), String::new()));
        assert_eq!(split_domain_port("evil.com/path"), (String::new(), String::new()));
    }

    #[test]
    fn test_normalize_hostname() {
        assert_eq!(normalize_hostname("WWW.Example.org:8000"), "www.example.org");
        assert_eq!(normalize_hostname("example.org"), "example.org");
    }

    #[test]
    fn test_allowed_hosts_wildcard() {
        let allowed = AllowedHosts::parse("*");
        assert!(allowed.is_allowed("anything.example"));
    }

    #[test]
    fn test_allowed_hosts_subdomain_pattern() {
        let allowed = AllowedHosts::parse(".example.com, other.net");
        assert!(allowed.is_allowed("example.com"));
        assert!(allowed.is_allowed("www.example.com"));
        assert!(allowed.is_allowed("Deep.Www.Example.com"));
        assert!(allowed.is_allowed("other.net"));
        assert!(!allowed.is_allowed("www.other.net"));
        assert!(!allowed.is_allowed("notexample.com"));
    }

    #[test]
    fn test_allowed_hosts_empty_denies() {
        let allowed = AllowedHosts::parse("");
        assert!(allowed.patterns().is_empty());
        assert!(!allowed.is_allowed("localhost"));
    }
}
