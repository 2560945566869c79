//! Batch item tracker: per-deliverable status inside a batch, the revision
//! loopback into the parent batch, and creator assignment.

use crate::db::{self, Pool};
use crate::error::{CoreError, Result};
use crate::model::{BatchItem, BatchStatus, ItemStatus};
use tracing::{info, instrument};

/// Partial update payload; absent fields keep their stored value.
#[derive(Debug, Clone, Default)]
pub struct ItemUpdate {
    pub status: Option<ItemStatus>,
    pub hook_id: Option<i64>,
    pub notes: Option<String>,
    pub script: Option<String>,
    pub delivered_video_url: Option<String>,
}

/// Result of an item update. `loopback_fired` is true when the update
/// forced the parent batch back to EDITING.
#[derive(Debug, Clone)]
pub struct ItemOutcome {
    pub item: BatchItem,
    pub loopback_fired: bool,
}

#[instrument(skip_all)]
pub async fn add_item(
    pool: &Pool,
    batch_id: i64,
    hook_id: Option<i64>,
    notes: Option<&str>,
) -> Result<BatchItem> {
    if !db::batch_exists(pool, batch_id).await? {
        return Err(CoreError::not_found("batch", batch_id));
    }
    let row = db::insert_item(pool, batch_id, hook_id, notes).await?;
    info!(item_id = row.id, batch_id, "added item");
    row.into_domain()
}

/// Update an item, then evaluate the loopback rule against the item's new
/// status/notes pair. A PENDING item carrying reviewer notes is a redo
/// request: the parent batch is forced back to EDITING as a dependent
/// second write. The two writes are not one transaction; if the second
/// fails after the first committed, the caller gets `DependentWrite`
/// rather than a clean success.
#[instrument(skip_all)]
pub async fn update_item(pool: &Pool, item_id: i64, update: ItemUpdate) -> Result<ItemOutcome> {
    let affected = db::update_item_fields(
        pool,
        item_id,
        update.status.map(|s| s.as_str()),
        update.hook_id,
        update.notes.as_deref(),
        update.script.as_deref(),
        update.delivered_video_url.as_deref(),
    )
    .await?;
    if affected == 0 {
        return Err(CoreError::not_found("item", item_id));
    }

    let item = db::fetch_item(pool, item_id)
        .await?
        .ok_or_else(|| CoreError::not_found("item", item_id))?
        .into_domain()?;

    if !revision_requested(&item) {
        return Ok(ItemOutcome {
            item,
            loopback_fired: false,
        });
    }

    let batch_id = item.batch_id;
    match db::update_batch_status(pool, batch_id, BatchStatus::Editing.as_str()).await {
        Ok(n) if n > 0 => {
            info!(item_id, batch_id, "revision requested, batch forced to EDITING");
            Ok(ItemOutcome {
                item,
                loopback_fired: true,
            })
        }
        Ok(_) => Err(CoreError::DependentWrite {
            item_id,
            batch_id,
            source: sqlx::Error::RowNotFound,
        }),
        Err(source) => Err(CoreError::DependentWrite {
            item_id,
            batch_id,
            source,
        }),
    }
}

fn revision_requested(item: &BatchItem) -> bool {
    item.status == ItemStatus::Pending
        && item
            .notes
            .as_deref()
            .map(|n| !n.trim().is_empty())
            .unwrap_or(false)
}

#[instrument(skip_all)]
pub async fn delete_item(pool: &Pool, item_id: i64) -> Result<()> {
    let affected = db::delete_item(pool, item_id).await?;
    if affected == 0 {
        return Err(CoreError::not_found("item", item_id));
    }
    Ok(())
}

/// Point a creator's active batch at `batch_id`. The pointer lives on the
/// creator, so assigning to a new batch supersedes any prior assignment
/// without touching the old batch.
#[instrument(skip_all)]
pub async fn assign_creator(pool: &Pool, batch_id: i64, creator_id: i64) -> Result<()> {
    if !db::batch_exists(pool, batch_id).await? {
        return Err(CoreError::not_found("batch", batch_id));
    }
    let affected = db::set_creator_active_batch(pool, creator_id, Some(batch_id)).await?;
    if affected == 0 {
        return Err(CoreError::not_found("creator", creator_id));
    }
    info!(creator_id, batch_id, "creator assigned");
    Ok(())
}

#[instrument(skip_all)]
pub async fn unassign_creator(pool: &Pool, creator_id: i64) -> Result<()> {
    let affected = db::set_creator_active_batch(pool, creator_id, None).await?;
    if affected == 0 {
        return Err(CoreError::not_found("creator", creator_id));
    }
    info!(creator_id, "creator unassigned");
    Ok(())
}
