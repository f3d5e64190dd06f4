//! Site table to site directory reconciliation
//!
//! For each configured site, in label order:
//! 1. entry with the same hostname, port and name: left alone
//! 2. entry with the same hostname: port and name updated
//! 3. entry with one of the alternate hostnames: promoted to the primary
//!    hostname, port and name updated
//! 4. otherwise a new entry attached to the default root resource
//!
//! Sites without a port are registered on port 80. Running it again on the
//! result changes nothing.

use std::fmt;
use std::path::Path;

use sitedata_core::{ResolvedSite, SiteResolver, SiteTable};

use crate::directory::{DirectoryEntry, SiteDirectory};
use crate::error::SyncResult;

/// Port recorded for sites that do not configure one
pub const DEFAULT_DIRECTORY_PORT: i32 = 80;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SyncAction {
    Unchanged,
    Updated,
    Promoted { from: String },
    Created,
}

/// What reconciliation did for one site
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SyncOutcome {
    pub label: String,
    pub hostname: String,
    pub port: i32,
    pub action: SyncAction,
}

impl SyncOutcome {
    pub fn is_change(&self) -> bool {
        self.action != SyncAction::Unchanged
    }
}

impl fmt::Display for SyncOutcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "Checking site '{}': {}:{}", self.label, self.hostname, self.port)?;
        match &self.action {
            SyncAction::Unchanged => write!(f, "Exact match found. Not updating."),
            SyncAction::Updated => write!(f, "Hostname found, port or site name different. Updating."),
            SyncAction::Promoted { from } => write!(
                f,
                "Alternate hostname '{}' found. Updating primary hostname.",
                from
            ),
            SyncAction::Created => write!(
                f,
                "No match found. Creating a new directory entry; attach it to a root resource if needed."
            ),
        }
    }
}

/// Load the site table and resolve every site, failing on the first site
/// with a configuration defect.
pub fn load_sites(path: impl AsRef<Path>) -> SyncResult<Vec<ResolvedSite>> {
    let table = SiteTable::from_path(path)?;
    Ok(SiteResolver::new(table).all()?)
}

/// Reconcile `directory` with `sites`.
pub fn reconcile(
    sites: &[ResolvedSite],
    directory: &mut SiteDirectory,
    default_root: Option<i64>,
) -> Vec<SyncOutcome> {
    sites
        .iter()
        .map(|site| reconcile_site(site, directory, default_root))
        .collect()
}

fn reconcile_site(
    site: &ResolvedSite,
    directory: &mut SiteDirectory,
    default_root: Option<i64>,
) -> SyncOutcome {
    let hostname = site.hostname();
    let port = site.port().map(i32::from).unwrap_or(DEFAULT_DIRECTORY_PORT);
    let name = site.name();

    let action = if directory.find_exact(hostname, port, name).is_some() {
        SyncAction::Unchanged
    } else if let Some(index) = directory.find_by_hostname(hostname, port) {
        directory.update(index, hostname, port, name);
        SyncAction::Updated
    } else if let Some(index) = directory.find_by_any_hostname(site.hostnames_other()) {
        let from = directory.entries()[index].hostname.clone();
        directory.update(index, hostname, port, name);
        SyncAction::Promoted { from }
    } else {
        directory.insert(DirectoryEntry::new(hostname, port, name, default_root));
        SyncAction::Created
    };

    tracing::debug!(label = %site.label(), hostname, port, action = ?action, "Reconciled site");

    SyncOutcome {
        label: site.label().to_string(),
        hostname: hostname.to_string(),
        port,
        action,
    }
}
