//! Batch state machine: creation, free-form status advancement, trashing,
//! and per-brand listing with the TRASHED default filter.
//!
//! Staff may move a batch to any status — there is no transition table.
//! The one transition the system triggers on its own (the revision
//! loopback) lives in `items`, next to the item write that causes it.

use crate::db::{self, Pool};
use crate::error::{CoreError, Result};
use crate::model::{Batch, BatchStatus, BatchType, Priority};
use tracing::{info, instrument};

/// Creation payload. `angle_id` and `format_id` are the required
/// associations; everything else is optional staff input.
#[derive(Debug, Clone, Default)]
pub struct NewBatch {
    pub brand_id: i64,
    pub batch_type: Option<BatchType>,
    pub priority: Option<Priority>,
    pub angle_id: Option<i64>,
    pub format_id: Option<i64>,
    pub reference_ad_id: Option<i64>,
    pub editor_id: Option<i64>,
    pub strategist_id: Option<i64>,
    pub brief: Option<String>,
    pub idea: Option<String>,
    pub main_messaging: Option<String>,
    pub learnings: Option<String>,
}

/// COPYCAT batches skip ideation and start in creator briefing.
fn initial_status(batch_type: BatchType) -> BatchStatus {
    match batch_type {
        BatchType::Copycat => BatchStatus::CreatorBriefing,
        _ => BatchStatus::Ideation,
    }
}

#[instrument(skip_all)]
pub async fn create_batch(pool: &Pool, new: NewBatch) -> Result<Batch> {
    let batch_type = new
        .batch_type
        .ok_or_else(|| CoreError::validation("batch type is required"))?;
    let angle_id = new
        .angle_id
        .ok_or_else(|| CoreError::validation("angle is required"))?;
    let format_id = new
        .format_id
        .ok_or_else(|| CoreError::validation("format is required"))?;

    if !db::angle_exists(pool, angle_id).await? {
        return Err(CoreError::not_found("angle", angle_id));
    }
    if !db::format_exists(pool, format_id).await? {
        return Err(CoreError::not_found("format", format_id));
    }

    let status = initial_status(batch_type);
    let row = db::insert_batch(
        pool,
        new.brand_id,
        batch_type.as_str(),
        status.as_str(),
        new.priority.map(|p| p.as_str()),
        angle_id,
        format_id,
        new.reference_ad_id,
        new.editor_id,
        new.strategist_id,
        new.brief.as_deref(),
        new.idea.as_deref(),
        new.main_messaging.as_deref(),
        new.learnings.as_deref(),
    )
    .await?;
    info!(batch_id = row.id, status = status.as_str(), "created batch");
    row.into_domain()
}

/// Set a batch's status. The status string comes from outside the core and
/// is parsed against the closed enumeration; unknown values are rejected.
#[instrument(skip_all)]
pub async fn advance_batch(pool: &Pool, batch_id: i64, status: &str) -> Result<Batch> {
    let parsed = BatchStatus::parse(status)
        .ok_or_else(|| CoreError::validation(format!("unknown batch status {status:?}")))?;
    set_status(pool, batch_id, parsed).await
}

#[instrument(skip_all)]
pub async fn trash_batch(pool: &Pool, batch_id: i64) -> Result<Batch> {
    set_status(pool, batch_id, BatchStatus::Trashed).await
}

pub(crate) async fn set_status(
    pool: &Pool,
    batch_id: i64,
    status: BatchStatus,
) -> Result<Batch> {
    let affected = db::update_batch_status(pool, batch_id, status.as_str()).await?;
    if affected == 0 {
        return Err(CoreError::not_found("batch", batch_id));
    }
    let row = db::fetch_batch(pool, batch_id)
        .await?
        .ok_or_else(|| CoreError::not_found("batch", batch_id))?;
    info!(batch_id, status = status.as_str(), "batch status updated");
    row.into_domain()
}

#[instrument(skip_all)]
pub async fn get_batch(pool: &Pool, batch_id: i64) -> Result<Batch> {
    db::fetch_batch(pool, batch_id)
        .await?
        .ok_or_else(|| CoreError::not_found("batch", batch_id))?
        .into_domain()
}

/// List a brand's batches. Without an explicit status filter, TRASHED
/// batches are excluded; ARCHIVED ones stay queryable.
#[instrument(skip_all)]
pub async fn list_batches(
    pool: &Pool,
    brand_id: i64,
    status: Option<BatchStatus>,
) -> Result<Vec<Batch>> {
    let rows = match status {
        Some(s) => db::list_batches_with_status(pool, brand_id, s.as_str()).await?,
        None => {
            db::list_batches_excluding_status(pool, brand_id, BatchStatus::Trashed.as_str())
                .await?
        }
    };
    rows.into_iter().map(|r| r.into_domain()).collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db;

    async fn setup_pool() -> Pool {
        let pool = sqlx::SqlitePool::connect("sqlite::memory:").await.unwrap();
        db::run_migrations(&pool).await.unwrap();
        sqlx::query("INSERT INTO brands (name) VALUES ('Acme')")
            .execute(&pool)
            .await
            .unwrap();
        sqlx::query("INSERT INTO angles (brand_id, name) VALUES (1, 'UGC testimonial')")
            .execute(&pool)
            .await
            .unwrap();
        sqlx::query("INSERT INTO formats (name) VALUES ('9x16')")
            .execute(&pool)
            .await
            .unwrap();
        pool
    }

    fn new_batch(batch_type: BatchType) -> NewBatch {
        NewBatch {
            brand_id: 1,
            batch_type: Some(batch_type),
            angle_id: Some(1),
            format_id: Some(1),
            ..Default::default()
        }
    }

    #[tokio::test]
    async fn copycat_starts_in_creator_briefing() {
        let pool = setup_pool().await;
        let b = create_batch(&pool, new_batch(BatchType::Copycat)).await.unwrap();
        assert_eq!(b.status, BatchStatus::CreatorBriefing);
    }

    #[tokio::test]
    async fn other_types_start_in_ideation() {
        let pool = setup_pool().await;
        for t in [BatchType::NetNew, BatchType::Iteration] {
            let b = create_batch(&pool, new_batch(t)).await.unwrap();
            assert_eq!(b.status, BatchStatus::Ideation);
        }
    }

    #[tokio::test]
    async fn missing_angle_rejected() {
        let pool = setup_pool().await;
        let mut nb = new_batch(BatchType::NetNew);
        nb.angle_id = None;
        assert!(matches!(
            create_batch(&pool, nb).await,
            Err(CoreError::Validation(_))
        ));

        let mut nb = new_batch(BatchType::NetNew);
        nb.angle_id = Some(99);
        assert!(matches!(
            create_batch(&pool, nb).await,
            Err(CoreError::NotFound { entity: "angle", .. })
        ));
    }

    #[tokio::test]
    async fn advance_accepts_any_known_status_and_rejects_unknown() {
        let pool = setup_pool().await;
        let b = create_batch(&pool, new_batch(BatchType::NetNew)).await.unwrap();

        // Arbitrary jumps are allowed, forward or backward.
        let b2 = advance_batch(&pool, b.id, "REVIEW").await.unwrap();
        assert_eq!(b2.status, BatchStatus::Review);
        let b3 = advance_batch(&pool, b.id, "FILMING").await.unwrap();
        assert_eq!(b3.status, BatchStatus::Filming);

        assert!(matches!(
            advance_batch(&pool, b.id, "SHIPPED").await,
            Err(CoreError::Validation(_))
        ));
        assert!(matches!(
            advance_batch(&pool, 999, "REVIEW").await,
            Err(CoreError::NotFound { entity: "batch", .. })
        ));
    }

    #[tokio::test]
    async fn default_listing_excludes_trashed_only() {
        let pool = setup_pool().await;
        let a = create_batch(&pool, new_batch(BatchType::NetNew)).await.unwrap();
        let b = create_batch(&pool, new_batch(BatchType::NetNew)).await.unwrap();
        let c = create_batch(&pool, new_batch(BatchType::NetNew)).await.unwrap();

        advance_batch(&pool, a.id, "ARCHIVED").await.unwrap();
        trash_batch(&pool, b.id).await.unwrap();

        let visible = list_batches(&pool, 1, None).await.unwrap();
        let ids: Vec<i64> = visible.iter().map(|x| x.id).collect();
        assert_eq!(ids, vec![a.id, c.id]);

        // Trashed batches are still there when asked for explicitly.
        let trashed = list_batches(&pool, 1, Some(BatchStatus::Trashed)).await.unwrap();
        assert_eq!(trashed.len(), 1);
        assert_eq!(trashed[0].id, b.id);
    }
}
