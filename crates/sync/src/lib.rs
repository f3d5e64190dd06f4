//! Site directory synchronization
//!
//! Registers every site of the site table in the `site_directory` table,
//! updating entries whose port, name or hostname drifted.

pub mod db;
pub mod directory;
pub mod error;
pub mod reconcile;

pub use directory::{DirectoryEntry, SiteDirectory};
pub use error::{SyncError, SyncResult};
pub use reconcile::{load_sites, reconcile, SyncAction, SyncOutcome};
