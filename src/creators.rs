//! Creator resolver: idempotent upsert keyed on the unique email.

use crate::db::{self, Pool};
use crate::error::Result;
use crate::model::Creator;
use tracing::{info, instrument};

/// Find-or-create a creator by email. A repeat call with the same pair is
/// a pure read; a changed name refreshes the stored one. New creators get
/// the defaulted platform/status fields from the schema.
#[instrument(skip_all)]
pub async fn resolve(pool: &Pool, name: &str, email: &str) -> Result<Creator> {
    if let Some(existing) = db::fetch_creator_by_email(pool, email).await? {
        if existing.name != name {
            db::update_creator_name(pool, existing.id, name).await?;
            return Ok(Creator {
                name: name.to_string(),
                ..existing
            });
        }
        return Ok(existing);
    }

    let created = db::insert_creator(pool, name, email).await?;
    info!(creator_id = created.id, "created creator");
    Ok(created)
}

#[cfg(test)]
mod tests {
    use super::*;

    async fn setup_pool() -> Pool {
        let pool = sqlx::SqlitePool::connect("sqlite::memory:").await.unwrap();
        db::run_migrations(&pool).await.unwrap();
        pool
    }

    #[tokio::test]
    async fn repeated_resolve_creates_one_row() {
        let pool = setup_pool().await;

        let a = resolve(&pool, "Jane Doe", "jane@x.com").await.unwrap();
        let b = resolve(&pool, "Jane Doe", "jane@x.com").await.unwrap();
        assert_eq!(a.id, b.id);
        assert_eq!(b.platform, "TIKTOK");
        assert_eq!(b.status, "ONBOARDING");

        let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM creators")
            .fetch_one(&pool)
            .await
            .unwrap();
        assert_eq!(count, 1);
    }

    #[tokio::test]
    async fn changed_name_refreshes_without_duplicate() {
        let pool = setup_pool().await;

        let a = resolve(&pool, "Jane Doe", "jane@x.com").await.unwrap();
        let c = resolve(&pool, "Jane D.", "jane@x.com").await.unwrap();
        assert_eq!(a.id, c.id);
        assert_eq!(c.name, "Jane D.");

        let stored: String = sqlx::query_scalar("SELECT name FROM creators WHERE id = ?")
            .bind(a.id)
            .fetch_one(&pool)
            .await
            .unwrap();
        assert_eq!(stored, "Jane D.");

        let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM creators")
            .fetch_one(&pool)
            .await
            .unwrap();
        assert_eq!(count, 1);
    }
}
