//! Tag propagator: identifier-driven relinking of creatives to creators,
//! and bulk add/remove of tags across a bunch.
//!
//! Both operations fan out one write per affected creative. Fan-out is
//! bounded so a large bunch cannot exhaust the store's connection limit.

use crate::db::{self, Pool};
use crate::error::{BulkReport, CoreError, EntityFailure, Result};
use crate::model::BulkAction;
use futures::stream::{self, StreamExt};
use tracing::{info, instrument, warn};

/// Tag name marking bunch membership for `group`.
pub fn bunch_tag(group: &str) -> String {
    format!("L1:{group}")
}

/// Relink every creative holding a tag that contains `cid` as a substring
/// to `creator_id`. Overwrite-on-match: a creative already linked to a
/// different creator is silently relinked, last writer wins. Returns the
/// number of matched creatives, so a rerun reports the same count.
#[instrument(skip_all)]
pub async fn link_by_identifier(
    pool: &Pool,
    creator_id: i64,
    cid: &str,
    concurrency: usize,
) -> Result<u64> {
    if db::fetch_creator(pool, creator_id).await?.is_none() {
        return Err(CoreError::not_found("creator", creator_id));
    }

    let ids = db::creative_ids_with_tag_like(pool, cid).await?;
    let report = fan_out(pool, ids, concurrency, |pool, creative_id| async move {
        relink_creative(&pool, creative_id, creator_id).await
    })
    .await;
    info!(cid, affected = report.affected, "linked creatives by identifier");
    report.into_result()
}

/// Apply `action` for every tag in `tags` to every creative in the bunch.
/// Idempotent in both directions: re-adding an existing tag and removing
/// an absent one are no-ops. An empty bunch short-circuits at zero
/// affected rows without touching the tag catalog.
#[instrument(skip_all)]
pub async fn bulk_tag(
    pool: &Pool,
    group: &str,
    tags: &[String],
    action: BulkAction,
    concurrency: usize,
) -> Result<u64> {
    let bunch = db::creative_ids_with_tag_exact(pool, &bunch_tag(group)).await?;
    if bunch.is_empty() {
        info!(group, "bunch is empty, nothing to tag");
        return Ok(0);
    }

    // Tag ids first: on add the catalog is upserted once per name, on
    // remove a name that was never created simply drops out.
    let mut tag_ids = Vec::with_capacity(tags.len());
    for name in tags {
        match action {
            BulkAction::Add => tag_ids.push(db::upsert_tag(pool, name).await?),
            BulkAction::Remove => {
                if let Some(tag) = db::fetch_tag_by_name(pool, name).await? {
                    tag_ids.push(tag.id);
                }
            }
        }
    }

    let tag_ids = std::sync::Arc::new(tag_ids);
    let report = fan_out(pool, bunch, concurrency, move |pool, creative_id| {
        let tag_ids = tag_ids.clone();
        async move {
            for &tag_id in tag_ids.iter() {
                match action {
                    BulkAction::Add => db::connect_tag(&pool, creative_id, tag_id).await?,
                    BulkAction::Remove => db::disconnect_tag(&pool, creative_id, tag_id).await?,
                }
            }
            Ok(())
        }
    })
    .await;
    info!(group, affected = report.affected, "bulk tag pass finished");
    report.into_result()
}

/// A creative deleted between the match query and the write updates zero
/// rows; that is a failed row in the report, not a silent success.
async fn relink_creative(
    pool: &Pool,
    creative_id: i64,
    creator_id: i64,
) -> std::result::Result<(), sqlx::Error> {
    let affected = db::set_creative_creator(pool, creative_id, creator_id).await?;
    if affected == 0 {
        return Err(sqlx::Error::RowNotFound);
    }
    Ok(())
}

/// Bounded fan-out of one write per creative, collecting a per-entity
/// outcome instead of failing the whole pass on the first error.
async fn fan_out<F, Fut>(pool: &Pool, ids: Vec<i64>, concurrency: usize, write: F) -> BulkReport
where
    F: Fn(Pool, i64) -> Fut,
    Fut: std::future::Future<Output = std::result::Result<(), sqlx::Error>>,
{
    let attempted = ids.len();
    let outcomes: Vec<(i64, std::result::Result<(), sqlx::Error>)> = stream::iter(ids)
        .map(|id| {
            let fut = write(pool.clone(), id);
            async move { (id, fut.await) }
        })
        .buffer_unordered(concurrency.max(1))
        .collect()
        .await;

    let mut report = BulkReport {
        attempted,
        ..Default::default()
    };
    for (id, outcome) in outcomes {
        match outcome {
            Ok(()) => report.affected += 1,
            Err(err) => {
                warn!(creative_id = id, ?err, "bulk write failed");
                report.failures.push(EntityFailure {
                    id,
                    message: err.to_string(),
                });
            }
        }
    }
    report
}
