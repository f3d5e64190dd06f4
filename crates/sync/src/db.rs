//! Database utilities and site directory persistence

use std::{str::FromStr, time::Duration};

use sitedata_core::ResolvedSite;
use sqlx::postgres::{PgConnectOptions, PgPool, PgPoolOptions};
use sqlx::{Postgres, Transaction};

use crate::directory::{DirectoryEntry, SiteDirectory};
use crate::error::SyncResult;
use crate::reconcile::{reconcile, SyncOutcome};

/// Create a database connection pool
/// Note: Disables statement cache for PgBouncer compatibility
/// A single connection is enough: the sync runs in one transaction
pub async fn create_pool(database_url: &str) -> Result<PgPool, sqlx::Error> {
    let options = PgConnectOptions::from_str(database_url)?.statement_cache_capacity(0);

    PgPoolOptions::new()
        .max_connections(1)
        .min_connections(0)
        .acquire_timeout(Duration::from_secs(30))
        .idle_timeout(Duration::from_secs(30))
        .max_lifetime(Duration::from_secs(300))
        .connect_with(options)
        .await
}

/// Run database migrations
pub async fn run_migrations(pool: &PgPool) -> SyncResult<()> {
    sqlx::migrate!("./migrations").run(pool).await?;
    Ok(())
}

/// Load the whole directory, locking its rows for the transaction.
pub async fn load_directory(tx: &mut Transaction<'_, Postgres>) -> SyncResult<SiteDirectory> {
    let entries: Vec<DirectoryEntry> = sqlx::query_as(
        r#"
        SELECT id, hostname, port, site_name, root_resource_id
        FROM site_directory
        ORDER BY id
        FOR UPDATE
        "#,
    )
    .fetch_all(&mut **tx)
    .await?;

    Ok(SiteDirectory::new(entries))
}

/// Write changed entries back: updates for existing rows, inserts for new ones.
pub async fn save_directory(
    tx: &mut Transaction<'_, Postgres>,
    directory: &SiteDirectory,
) -> SyncResult<()> {
    for entry in directory.changes() {
        match entry.id {
            Some(id) => {
                sqlx::query(
                    r#"
                    UPDATE site_directory
                    SET hostname = $1, port = $2, site_name = $3, updated_at = NOW()
                    WHERE id = $4
                    "#,
                )
                .bind(&entry.hostname)
                .bind(entry.port)
                .bind(&entry.site_name)
                .bind(id)
                .execute(&mut **tx)
                .await?;
            }
            None => {
                sqlx::query(
                    r#"
                    INSERT INTO site_directory (hostname, port, site_name, root_resource_id)
                    VALUES ($1, $2, $3, $4)
                    "#,
                )
                .bind(&entry.hostname)
                .bind(entry.port)
                .bind(&entry.site_name)
                .bind(entry.root_resource_id)
                .execute(&mut **tx)
                .await?;
            }
        }
    }

    Ok(())
}

/// Reconcile the site directory with `sites` in a single transaction.
///
/// With `dry_run`, the outcomes are computed against the current directory
/// and the transaction is rolled back.
pub async fn run_sync(
    pool: &PgPool,
    sites: &[ResolvedSite],
    default_root: Option<i64>,
    dry_run: bool,
) -> SyncResult<Vec<SyncOutcome>> {
    let mut tx = pool.begin().await?;

    let mut directory = load_directory(&mut tx).await?;
    tracing::info!(entries = directory.len(), sites = sites.len(), "Loaded site directory");

    let outcomes = reconcile(sites, &mut directory, default_root);
    let changed = directory.changes().len();

    if dry_run {
        tx.rollback().await?;
        tracing::info!(changed, "Dry run, no changes written");
        return Ok(outcomes);
    }

    save_directory(&mut tx, &directory).await?;
    tx.commit().await?;
    tracing::info!(changed, "Site directory synchronized");

    Ok(outcomes)
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use super::*;
    use sitedata_core::{SiteResolver, SiteTable};

    #[tokio::test]
    #[ignore] // Requires database
    async fn test_sync_is_idempotent() {
        let url = std::env::var("DATABASE_URL").expect("DATABASE_URL required");
        let pool = create_pool(&url).await.expect("Failed to create pool");
        run_migrations(&pool).await.unwrap();

        let table = SiteTable::from_toml_str(
            r#"
            default = "synctest"
            [sites.synctest]
            name = "Sync Test"
            template_prefix = "st"
            hostname = "sync-test.invalid"
            hostnames_other = []
            description = ""
            title = "{}"
            "#,
        )
        .unwrap();
        let sites = SiteResolver::new(table).all().unwrap();

        run_sync(&pool, &sites, None, false).await.unwrap();
        let second = run_sync(&pool, &sites, None, false).await.unwrap();
        assert!(second.iter().all(|outcome| !outcome.is_change()));

        sqlx::query("DELETE FROM site_directory WHERE hostname = 'sync-test.invalid'")
            .execute(&pool)
            .await
            .unwrap();
    }
}
