//! In-memory snapshot of the site directory
//!
//! Loaded from the `site_directory` table, changed by reconciliation, and
//! written back as a batch of updates and inserts.

use std::collections::{BTreeSet, HashSet};

/// One row of the site directory.
#[derive(Debug, Clone, PartialEq, Eq, sqlx::FromRow)]
pub struct DirectoryEntry {
    /// `None` until inserted.
    pub id: Option<i64>,
    pub hostname: String,
    pub port: i32,
    pub site_name: String,
    pub root_resource_id: Option<i64>,
}

impl DirectoryEntry {
    pub fn new(hostname: &str, port: i32, site_name: &str, root_resource_id: Option<i64>) -> Self {
        Self {
            id: None,
            hostname: hostname.to_string(),
            port,
            site_name: site_name.to_string(),
            root_resource_id,
        }
    }
}

/// Directory snapshot with change tracking.
#[derive(Debug, Clone, Default)]
pub struct SiteDirectory {
    entries: Vec<DirectoryEntry>,
    changed: HashSet<usize>,
}

impl SiteDirectory {
    pub fn new(entries: Vec<DirectoryEntry>) -> Self {
        Self {
            entries,
            changed: HashSet::new(),
        }
    }

    pub fn entries(&self) -> &[DirectoryEntry] {
        &self.entries
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn find_exact(&self, hostname: &str, port: i32, site_name: &str) -> Option<usize> {
        self.entries.iter().position(|entry| {
            entry.hostname == hostname && entry.port == port && entry.site_name == site_name
        })
    }

    /// Entry with `hostname`, preferring one that already has `port`.
    pub fn find_by_hostname(&self, hostname: &str, port: i32) -> Option<usize> {
        self.entries
            .iter()
            .position(|entry| entry.hostname == hostname && entry.port == port)
            .or_else(|| self.entries.iter().position(|entry| entry.hostname == hostname))
    }

    pub fn find_by_any_hostname(&self, hostnames: &BTreeSet<String>) -> Option<usize> {
        self.entries
            .iter()
            .position(|entry| hostnames.contains(&entry.hostname))
    }

    /// Point the entry at `index` to `hostname:port` named `site_name`.
    pub fn update(&mut self, index: usize, hostname: &str, port: i32, site_name: &str) {
        if let Some(entry) = self.entries.get_mut(index) {
            entry.hostname = hostname.to_string();
            entry.port = port;
            entry.site_name = site_name.to_string();
            self.changed.insert(index);
        }
    }

    pub fn insert(&mut self, entry: DirectoryEntry) {
        self.changed.insert(self.entries.len());
        self.entries.push(entry);
    }

    /// Entries to write back, in directory order. Entries without an id
    /// are new.
    pub fn changes(&self) -> Vec<&DirectoryEntry> {
        let mut indices: Vec<_> = self.changed.iter().copied().collect();
        indices.sort_unstable();
        indices
            .into_iter()
            .filter_map(|index| self.entries.get(index))
            .collect()
    }

    pub fn has_changes(&self) -> bool {
        !self.changed.is_empty()
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    fn entry(id: i64, hostname: &str, port: i32, name: &str) -> DirectoryEntry {
        DirectoryEntry {
            id: Some(id),
            ..DirectoryEntry::new(hostname, port, name, Some(1))
        }
    }

    #[test]
    fn test_lookups() {
        let directory = SiteDirectory::new(vec![
            entry(1, "example.org", 8080, "Example"),
            entry(2, "example.org", 80, "Old name"),
            entry(3, "legacy.example.com", 80, "Legacy"),
        ]);

        assert_eq!(directory.find_exact("example.org", 80, "Old name"), Some(1));
        assert_eq!(directory.find_exact("example.org", 80, "Example"), None);
        assert_eq!(directory.find_by_hostname("example.org", 80), Some(1));
        assert_eq!(directory.find_by_hostname("example.org", 443), Some(0));
        assert_eq!(directory.find_by_hostname("missing.example", 80), None);

        let others: BTreeSet<String> = ["legacy.example.com".to_string()].into();
        assert_eq!(directory.find_by_any_hostname(&others), Some(2));
        assert_eq!(directory.find_by_any_hostname(&BTreeSet::new()), None);
    }

    #[test]
    fn test_change_tracking() {
        let mut directory = SiteDirectory::new(vec![
            entry(1, "a.example", 80, "A"),
            entry(2, "b.example", 80, "B"),
        ]);
        assert!(!directory.has_changes());

        directory.update(1, "b.example", 8080, "B");
        directory.insert(DirectoryEntry::new("c.example", 80, "C", None));

        let changes = directory.changes();
        assert_eq!(changes.len(), 2);
        assert_eq!(changes[0].id, Some(2));
        assert_eq!(changes[0].port, 8080);
        assert_eq!(changes[1].id, None);
        assert_eq!(changes[1].hostname, "c.example");
    }
}
