//! Site data: per-request multi-tenant site metadata
//!
//! Maps a request hostname (or an explicit label) to a named site record from
//! a static configuration table, and formats the strings derived from it
//! (fully-qualified URLs, page titles).

pub mod error;
pub mod host;
pub mod resolver;
pub mod site;
pub mod table;

pub use error::{SiteDataError, SiteDataResult, TableError};
pub use host::{normalize_hostname, split_domain_port, AllowedHosts};
pub use resolver::SiteResolver;
pub use site::{fqdn_format, ResolvedSite, Scheme};
pub use table::{SiteRecord, SiteTable};
