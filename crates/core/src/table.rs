//! Static site configuration table
//!
//! Loaded once at startup from a TOML file and never mutated afterwards.
//! Records are kept as raw field maps; typed extraction (and the
//! required-field contract) happens at resolution time, see
//! [`crate::resolver`].

use std::collections::hash_map::Entry;
use std::collections::{BTreeMap, HashMap};
use std::path::Path;

use serde::Deserialize;
use serde_json::Value;

use crate::error::TableError;
use crate::host::normalize_hostname;

/// Fields every site record must define.
pub const REQUIRED_FIELDS: &[&str] = &[
    "name",
    "template_prefix",
    "hostname",
    "hostnames_other",
    "description",
    "title",
];

/// Fields a site record may define; defaults apply otherwise.
pub const OPTIONAL_FIELDS: &[&str] = &["urlconf", "locale", "scheme", "port"];

/// Names carried by every resolved site that configuration may not use.
pub const RESERVED_FIELDS: &[&str] = &["label", "exact_match_found"];

/// Name of the root URL configuration when the table does not set one.
pub const DEFAULT_ROOT_URLCONF: &str = "root";

/// Raw fields of one configured site.
pub type SiteRecord = serde_json::Map<String, Value>;

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
struct TableFile {
    default: String,
    #[serde(default = "default_root_urlconf")]
    root_urlconf: String,
    #[serde(default)]
    additional_fields: Vec<String>,
    #[serde(default)]
    sites: BTreeMap<String, SiteRecord>,
}

fn default_root_urlconf() -> String {
    DEFAULT_ROOT_URLCONF.to_string()
}

/// Read-only mapping from label to site record.
#[derive(Debug, Clone)]
pub struct SiteTable {
    default_label: String,
    root_urlconf: String,
    additional_fields: Vec<String>,
    sites: BTreeMap<String, SiteRecord>,
    /// Normalized hostname (primary or alternate) -> label
    hostnames: HashMap<String, String>,
}

impl SiteTable {
    /// Build a table, validating field names and the default label.
    pub fn new(
        default_label: impl Into<String>,
        root_urlconf: impl Into<String>,
        additional_fields: Vec<String>,
        sites: BTreeMap<String, SiteRecord>,
    ) -> Result<Self, TableError> {
        let default_label = default_label.into();

        for field in &additional_fields {
            if RESERVED_FIELDS.contains(&field.as_str()) {
                return Err(TableError::ReservedField {
                    field: field.clone(),
                    context: "additional_fields".to_string(),
                });
            }
            if REQUIRED_FIELDS.contains(&field.as_str()) || OPTIONAL_FIELDS.contains(&field.as_str())
            {
                return Err(TableError::ReservedField {
                    field: field.clone(),
                    context: "additional_fields shadows a built-in field".to_string(),
                });
            }
        }

        for (label, record) in &sites {
            for key in record.keys() {
                if RESERVED_FIELDS.contains(&key.as_str()) {
                    return Err(TableError::ReservedField {
                        field: key.clone(),
                        context: format!("site '{}'", label),
                    });
                }
                let known = REQUIRED_FIELDS.contains(&key.as_str())
                    || OPTIONAL_FIELDS.contains(&key.as_str())
                    || additional_fields.iter().any(|f| f == key);
                if !known {
                    return Err(TableError::UnknownField {
                        label: label.clone(),
                        field: key.clone(),
                    });
                }
            }
        }

        if !sites.contains_key(&default_label) {
            return Err(TableError::UnknownDefault(default_label));
        }

        let hostnames = index_hostnames(&sites);

        Ok(Self {
            default_label,
            root_urlconf: root_urlconf.into(),
            additional_fields,
            sites,
            hostnames,
        })
    }

    /// Parse a table from TOML text.
    pub fn from_toml_str(source: &str) -> Result<Self, TableError> {
        let file: TableFile = toml::from_str(source)?;
        Self::new(
            file.default,
            file.root_urlconf,
            file.additional_fields,
            file.sites,
        )
    }

    /// Load a table from a TOML file on disk.
    pub fn from_path(path: impl AsRef<Path>) -> Result<Self, TableError> {
        let path = path.as_ref();
        let source = std::fs::read_to_string(path).map_err(|source| TableError::Io {
            path: path.display().to_string(),
            source,
        })?;
        let table = Self::from_toml_str(&source)?;

        tracing::info!(
            path = %path.display(),
            sites = table.len(),
            default_label = %table.default_label,
            "Loaded site table"
        );

        Ok(table)
    }

    /// Replace the default label (e.g. from `SITEDATA_DEFAULT`).
    pub fn with_default_label(mut self, label: impl Into<String>) -> Result<Self, TableError> {
        let label = label.into();
        if !self.sites.contains_key(&label) {
            return Err(TableError::UnknownDefault(label));
        }
        self.default_label = label;
        Ok(self)
    }

    pub fn default_label(&self) -> &str {
        &self.default_label
    }

    pub fn root_urlconf(&self) -> &str {
        &self.root_urlconf
    }

    pub fn additional_fields(&self) -> &[String] {
        &self.additional_fields
    }

    /// Base required fields followed by the declared extension fields.
    pub fn required_fields(&self) -> impl Iterator<Item = &str> {
        REQUIRED_FIELDS
            .iter()
            .copied()
            .chain(self.additional_fields.iter().map(String::as_str))
    }

    /// Labels in table order.
    pub fn labels(&self) -> impl Iterator<Item = &str> {
        self.sites.keys().map(String::as_str)
    }

    pub fn contains_label(&self, label: &str) -> bool {
        self.sites.contains_key(label)
    }

    pub fn record(&self, label: &str) -> Option<&SiteRecord> {
        self.sites.get(label)
    }

    /// Label whose primary or alternate hostnames contain `hostname`.
    /// Expects an already-normalized hostname.
    pub fn label_for_hostname(&self, hostname: &str) -> Option<&str> {
        self.hostnames.get(hostname).map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.sites.len()
    }

    pub fn is_empty(&self) -> bool {
        self.sites.is_empty()
    }
}

/// Index every primary and alternate hostname, normalized the same way as
/// request hosts. On collision the first record in label order keeps the
/// hostname.
fn index_hostnames(sites: &BTreeMap<String, SiteRecord>) -> HashMap<String, String> {
    let mut index: HashMap<String, String> = HashMap::new();

    for (label, record) in sites {
        let primary = record
            .get("hostname")
            .and_then(Value::as_str)
            .into_iter();
        let others = record
            .get("hostnames_other")
            .and_then(Value::as_array)
            .into_iter()
            .flatten()
            .filter_map(Value::as_str);

        for hostname in primary.chain(others) {
            let normalized = normalize_hostname(hostname);
            if normalized.is_empty() {
                tracing::warn!(hostname = %hostname, label = %label, "Ignoring malformed hostname");
                continue;
            }

            match index.entry(normalized) {
                Entry::Occupied(entry) => {
                    if entry.get() != label {
                        tracing::warn!(
                            hostname = %entry.key(),
                            owner = %entry.get(),
                            ignored = %label,
                            "Hostname configured for more than one site"
                        );
                    }
                }
                Entry::Vacant(entry) => {
                    entry.insert(label.clone());
                }
            }
        }
    }

    index
}
