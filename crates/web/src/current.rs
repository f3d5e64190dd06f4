//! Task-local "current site" back-reference
//!
//! The middleware publishes a weak reference to the request's site for the
//! duration of the request. Code that has no access to the request can look
//! it up with [`current_site`]; prefer passing the site explicitly.
//!
//! The slot is per task: tasks spawned from a handler do not inherit it, and
//! lookups outside a request return `None`.

use std::future::Future;
use std::sync::{Arc, Weak};

use sitedata_core::ResolvedSite;

tokio::task_local! {
    static CURRENT_SITE: Weak<ResolvedSite>;
}

/// Site of the request being served by this task, if any.
pub fn current_site() -> Option<Arc<ResolvedSite>> {
    CURRENT_SITE.try_with(Weak::upgrade).ok().flatten()
}

/// Run `future` with `site` published as the current site.
pub async fn scope<F: Future>(site: &Arc<ResolvedSite>, future: F) -> F::Output {
    CURRENT_SITE.scope(Arc::downgrade(site), future).await
}

/// Synchronous variant of [`scope`].
pub fn sync_scope<R>(site: &Arc<ResolvedSite>, f: impl FnOnce() -> R) -> R {
    CURRENT_SITE.sync_scope(Arc::downgrade(site), f)
}
