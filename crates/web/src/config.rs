//! Application configuration

use std::env;
use std::path::PathBuf;

use sitedata_core::AllowedHosts;

/// Allow-list used when `ALLOWED_HOSTS` is unset (local development only)
const DEFAULT_ALLOWED_HOSTS: &str = ".localhost,127.0.0.1,[::1]";

/// Application configuration loaded from environment variables
#[derive(Debug, Clone)]
pub struct Config {
    // Server
    pub bind_address: String,

    // Site table
    pub sitedata_file: PathBuf,
    pub sitedata_default: Option<String>,
    pub require_exact_hostname: bool,

    // Request validation
    pub allowed_hosts: AllowedHosts,

    // Presentation
    pub static_url: String,

    // Feature flags
    pub enable_debug_panel: bool,
}

impl Config {
    /// Load configuration from environment variables
    pub fn from_env() -> Result<Self, ConfigError> {
        Ok(Self {
            // Server
            bind_address: env::var("BIND_ADDRESS").unwrap_or_else(|_| "0.0.0.0:8000".to_string()),

            // Site table
            sitedata_file: env::var("SITEDATA_FILE")
                .unwrap_or_else(|_| "sitedata.toml".to_string())
                .into(),
            sitedata_default: env::var("SITEDATA_DEFAULT")
                .ok()
                .filter(|label| !label.trim().is_empty()),
            require_exact_hostname: parse_bool("SITEDATA_REQUIRE_EXACT_HOSTNAME", false)?,

            // Request validation
            allowed_hosts: AllowedHosts::parse(
                &env::var("ALLOWED_HOSTS").unwrap_or_else(|_| DEFAULT_ALLOWED_HOSTS.to_string()),
            ),

            // Presentation
            static_url: {
                let url = env::var("STATIC_URL").unwrap_or_else(|_| "/static/".to_string());
                if !url.ends_with('/') {
                    return Err(ConfigError::Invalid(
                        "STATIC_URL",
                        "must end with a slash".to_string(),
                    ));
                }
                url
            },

            // Feature flags
            enable_debug_panel: parse_bool("SITEDATA_DEBUG_PANEL", false)?,
        })
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            bind_address: "0.0.0.0:8000".to_string(),
            sitedata_file: PathBuf::from("sitedata.toml"),
            sitedata_default: None,
            require_exact_hostname: false,
            allowed_hosts: AllowedHosts::parse(DEFAULT_ALLOWED_HOSTS),
            static_url: "/static/".to_string(),
            enable_debug_panel: false,
        }
    }
}

fn parse_bool(name: &'static str, default: bool) -> Result<bool, ConfigError> {
    match env::var(name) {
        Err(_) => Ok(default),
        Ok(value) => match value.trim().to_lowercase().as_str() {
            "1" | "true" | "yes" | "on" => Ok(true),
            "0" | "false" | "no" | "off" | "" => Ok(false),
            _ => Err(ConfigError::Invalid(name, value)),
        },
    }
}

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Invalid value for environment variable {0}: {1}")]
    Invalid(&'static str, String),
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use serial_test::serial;

    const VARS: &[&str] = &[
        "BIND_ADDRESS",
        "SITEDATA_FILE",
        "SITEDATA_DEFAULT",
        "SITEDATA_REQUIRE_EXACT_HOSTNAME",
        "ALLOWED_HOSTS",
        "STATIC_URL",
        "SITEDATA_DEBUG_PANEL",
    ];

    fn cleanup_config() {
        for var in VARS {
            env::remove_var(var);
        }
    }

    #[test]
    #[serial]
    fn test_defaults() {
        cleanup_config();

        let config = Config::from_env().unwrap();
        assert_eq!(config.bind_address, "0.0.0.0:8000");
        assert_eq!(config.sitedata_file, PathBuf::from("sitedata.toml"));
        assert_eq!(config.sitedata_default, None);
        assert!(!config.require_exact_hostname);
        assert!(config.allowed_hosts.is_allowed("localhost"));
        assert!(config.allowed_hosts.is_allowed("app.localhost"));
        assert!(!config.allowed_hosts.is_allowed("example.org"));
        assert_eq!(config.static_url, "/static/");
        assert!(!config.enable_debug_panel);
    }

    #[test]
    #[serial]
    fn test_overrides() {
        cleanup_config();
        env::set_var("SITEDATA_FILE", "/etc/sitedata/sites.toml");
        env::set_var("SITEDATA_DEFAULT", "examplecom");
        env::set_var("SITEDATA_REQUIRE_EXACT_HOSTNAME", "true");
        env::set_var("ALLOWED_HOSTS", ".example.org, www.example.com");
        env::set_var("STATIC_URL", "https://cdn.example.net/static/");
        env::set_var("SITEDATA_DEBUG_PANEL", "1");

        let config = Config::from_env().unwrap();
        assert_eq!(config.sitedata_file, PathBuf::from("/etc/sitedata/sites.toml"));
        assert_eq!(config.sitedata_default.as_deref(), Some("examplecom"));
        assert!(config.require_exact_hostname);
        assert!(config.allowed_hosts.is_allowed("news.example.org"));
        assert!(config.allowed_hosts.is_allowed("www.example.com"));
        assert!(!config.allowed_hosts.is_allowed("localhost"));
        assert_eq!(config.static_url, "https://cdn.example.net/static/");
        assert!(config.enable_debug_panel);

        cleanup_config();
    }

    #[test]
    #[serial]
    fn test_invalid_values() {
        cleanup_config();

        env::set_var("SITEDATA_REQUIRE_EXACT_HOSTNAME", "sometimes");
        assert!(matches!(
            Config::from_env(),
            Err(ConfigError::Invalid("SITEDATA_REQUIRE_EXACT_HOSTNAME", _))
        ));
        env::remove_var("SITEDATA_REQUIRE_EXACT_HOSTNAME");

        env::set_var("STATIC_URL", "/static");
        assert!(matches!(
            Config::from_env(),
            Err(ConfigError::Invalid("STATIC_URL", _))
        ));

        cleanup_config();
    }
}
