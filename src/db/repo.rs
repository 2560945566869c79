use super::model::{BatchItemRow, BatchRow};
use crate::model::{Creator, Tag};
use sqlx::SqlitePool;
use tracing::instrument;

pub type Pool = SqlitePool;

pub async fn init_pool(database_url: &str) -> Result<Pool, sqlx::Error> {
    let normalized = prepare_sqlite_url(database_url);
    let pool = SqlitePool::connect(&normalized).await?;
    // WAL for concurrent readers, FK enforcement for the cascade policy.
    sqlx::query("PRAGMA journal_mode=WAL;").execute(&pool).await?;
    sqlx::query("PRAGMA foreign_keys=ON;").execute(&pool).await?;
    Ok(pool)
}

/// For file-backed SQLite URLs, expand a leading `~/` and make sure the
/// parent directory exists. In-memory URLs and other schemes pass through.
fn prepare_sqlite_url(url: &str) -> String {
    if !url.starts_with("sqlite:") || url.starts_with("sqlite::memory") {
        return url.to_string();
    }

    let rest = url["sqlite:".len()..].trim_start_matches("//");
    let (path_part, query_part) = match rest.split_once('?') {
        Some((p, q)) => (p, Some(q)),
        None => (rest, None),
    };
    if path_part.is_empty() {
        return url.to_string();
    }

    let expanded = match (path_part.strip_prefix("~/"), std::env::var("HOME")) {
        (Some(tail), Ok(home)) => format!("{}/{}", home.trim_end_matches('/'), tail),
        _ => path_part.to_string(),
    };

    if let Some(parent) = std::path::Path::new(&expanded).parent() {
        if !parent.as_os_str().is_empty() {
            let _ = std::fs::create_dir_all(parent);
        }
    }

    match query_part {
        Some(q) => format!("sqlite://{}?{}", expanded, q),
        None => format!("sqlite://{}", expanded),
    }
}

pub async fn run_migrations(pool: &Pool) -> Result<(), sqlx::migrate::MigrateError> {
    sqlx::migrate!("./migrations").run(pool).await
}

// ---- batches ----

#[allow(clippy::too_many_arguments)]
#[instrument(skip_all)]
pub async fn insert_batch(
    pool: &Pool,
    brand_id: i64,
    batch_type: &str,
    status: &str,
    priority: Option<&str>,
    angle_id: i64,
    format_id: i64,
    reference_ad_id: Option<i64>,
    editor_id: Option<i64>,
    strategist_id: Option<i64>,
    brief: Option<&str>,
    idea: Option<&str>,
    main_messaging: Option<&str>,
    learnings: Option<&str>,
) -> Result<BatchRow, sqlx::Error> {
    sqlx::query_as::<_, BatchRow>(
        "INSERT INTO batches (brand_id, batch_type, status, priority, angle_id, format_id, \
         reference_ad_id, editor_id, strategist_id, brief, idea, main_messaging, learnings) \
         VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?) RETURNING *",
    )
    .bind(brand_id)
    .bind(batch_type)
    .bind(status)
    .bind(priority)
    .bind(angle_id)
    .bind(format_id)
    .bind(reference_ad_id)
    .bind(editor_id)
    .bind(strategist_id)
    .bind(brief)
    .bind(idea)
    .bind(main_messaging)
    .bind(learnings)
    .fetch_one(pool)
    .await
}

#[instrument(skip_all)]
pub async fn fetch_batch(pool: &Pool, batch_id: i64) -> Result<Option<BatchRow>, sqlx::Error> {
    sqlx::query_as::<_, BatchRow>("SELECT * FROM batches WHERE id = ?")
        .bind(batch_id)
        .fetch_optional(pool)
        .await
}

#[instrument(skip_all)]
pub async fn update_batch_status(
    pool: &Pool,
    batch_id: i64,
    status: &str,
) -> Result<u64, sqlx::Error> {
    let res = sqlx::query("UPDATE batches SET status = ? WHERE id = ?")
        .bind(status)
        .bind(batch_id)
        .execute(pool)
        .await?;
    Ok(res.rows_affected())
}

#[instrument(skip_all)]
pub async fn list_batches_excluding_status(
    pool: &Pool,
    brand_id: i64,
    excluded: &str,
) -> Result<Vec<BatchRow>, sqlx::Error> {
    sqlx::query_as::<_, BatchRow>(
        "SELECT * FROM batches WHERE brand_id = ? AND status <> ? ORDER BY id",
    )
    .bind(brand_id)
    .bind(excluded)
    .fetch_all(pool)
    .await
}

#[instrument(skip_all)]
pub async fn list_batches_with_status(
    pool: &Pool,
    brand_id: i64,
    status: &str,
) -> Result<Vec<BatchRow>, sqlx::Error> {
    sqlx::query_as::<_, BatchRow>(
        "SELECT * FROM batches WHERE brand_id = ? AND status = ? ORDER BY id",
    )
    .bind(brand_id)
    .bind(status)
    .fetch_all(pool)
    .await
}

#[instrument(skip_all)]
pub async fn angle_exists(pool: &Pool, angle_id: i64) -> Result<bool, sqlx::Error> {
    let found = sqlx::query_scalar::<_, i64>("SELECT 1 FROM angles WHERE id = ?")
        .bind(angle_id)
        .fetch_optional(pool)
        .await?;
    Ok(found.is_some())
}

#[instrument(skip_all)]
pub async fn format_exists(pool: &Pool, format_id: i64) -> Result<bool, sqlx::Error> {
    let found = sqlx::query_scalar::<_, i64>("SELECT 1 FROM formats WHERE id = ?")
        .bind(format_id)
        .fetch_optional(pool)
        .await?;
    Ok(found.is_some())
}

#[instrument(skip_all)]
pub async fn batch_exists(pool: &Pool, batch_id: i64) -> Result<bool, sqlx::Error> {
    let found = sqlx::query_scalar::<_, i64>("SELECT 1 FROM batches WHERE id = ?")
        .bind(batch_id)
        .fetch_optional(pool)
        .await?;
    Ok(found.is_some())
}

// ---- batch items ----

#[instrument(skip_all)]
pub async fn insert_item(
    pool: &Pool,
    batch_id: i64,
    hook_id: Option<i64>,
    notes: Option<&str>,
) -> Result<BatchItemRow, sqlx::Error> {
    sqlx::query_as::<_, BatchItemRow>(
        "INSERT INTO batch_items (batch_id, status, hook_id, notes) \
         VALUES (?, 'PENDING', ?, ?) RETURNING *",
    )
    .bind(batch_id)
    .bind(hook_id)
    .bind(notes)
    .fetch_one(pool)
    .await
}

#[instrument(skip_all)]
pub async fn fetch_item(pool: &Pool, item_id: i64) -> Result<Option<BatchItemRow>, sqlx::Error> {
    sqlx::query_as::<_, BatchItemRow>("SELECT * FROM batch_items WHERE id = ?")
        .bind(item_id)
        .fetch_optional(pool)
        .await
}

/// Partial update: absent fields keep their stored value.
#[instrument(skip_all)]
pub async fn update_item_fields(
    pool: &Pool,
    item_id: i64,
    status: Option<&str>,
    hook_id: Option<i64>,
    notes: Option<&str>,
    script: Option<&str>,
    delivered_video_url: Option<&str>,
) -> Result<u64, sqlx::Error> {
    let res = sqlx::query(
        "UPDATE batch_items SET \
           status = COALESCE(?, status), \
           hook_id = COALESCE(?, hook_id), \
           notes = COALESCE(?, notes), \
           script = COALESCE(?, script), \
           delivered_video_url = COALESCE(?, delivered_video_url) \
         WHERE id = ?",
    )
    .bind(status)
    .bind(hook_id)
    .bind(notes)
    .bind(script)
    .bind(delivered_video_url)
    .bind(item_id)
    .execute(pool)
    .await?;
    Ok(res.rows_affected())
}

#[instrument(skip_all)]
pub async fn delete_item(pool: &Pool, item_id: i64) -> Result<u64, sqlx::Error> {
    let res = sqlx::query("DELETE FROM batch_items WHERE id = ?")
        .bind(item_id)
        .execute(pool)
        .await?;
    Ok(res.rows_affected())
}

// ---- creators ----

#[instrument(skip_all)]
pub async fn fetch_creator(pool: &Pool, creator_id: i64) -> Result<Option<Creator>, sqlx::Error> {
    sqlx::query_as::<_, Creator>("SELECT * FROM creators WHERE id = ?")
        .bind(creator_id)
        .fetch_optional(pool)
        .await
}

#[instrument(skip_all)]
pub async fn fetch_creator_by_email(
    pool: &Pool,
    email: &str,
) -> Result<Option<Creator>, sqlx::Error> {
    sqlx::query_as::<_, Creator>("SELECT * FROM creators WHERE email = ?")
        .bind(email)
        .fetch_optional(pool)
        .await
}

#[instrument(skip_all)]
pub async fn insert_creator(pool: &Pool, name: &str, email: &str) -> Result<Creator, sqlx::Error> {
    sqlx::query_as::<_, Creator>(
        "INSERT INTO creators (name, email) VALUES (?, ?) RETURNING *",
    )
    .bind(name)
    .bind(email)
    .fetch_one(pool)
    .await
}

#[instrument(skip_all)]
pub async fn update_creator_name(
    pool: &Pool,
    creator_id: i64,
    name: &str,
) -> Result<u64, sqlx::Error> {
    let res = sqlx::query("UPDATE creators SET name = ? WHERE id = ?")
        .bind(name)
        .bind(creator_id)
        .execute(pool)
        .await?;
    Ok(res.rows_affected())
}

#[instrument(skip_all)]
pub async fn set_creator_active_batch(
    pool: &Pool,
    creator_id: i64,
    batch_id: Option<i64>,
) -> Result<u64, sqlx::Error> {
    let res = sqlx::query("UPDATE creators SET active_batch_id = ? WHERE id = ?")
        .bind(batch_id)
        .bind(creator_id)
        .execute(pool)
        .await?;
    Ok(res.rows_affected())
}

// ---- creatives and tags ----

/// Creatives holding at least one tag whose name contains `needle` as a
/// substring. Substring, not exact match: the linking engine depends on it.
#[instrument(skip_all)]
pub async fn creative_ids_with_tag_like(
    pool: &Pool,
    needle: &str,
) -> Result<Vec<i64>, sqlx::Error> {
    sqlx::query_scalar::<_, i64>(
        "SELECT DISTINCT ct.creative_id FROM creative_tags ct \
         JOIN tags t ON t.id = ct.tag_id \
         WHERE instr(t.name, ?) > 0 ORDER BY ct.creative_id",
    )
    .bind(needle)
    .fetch_all(pool)
    .await
}

#[instrument(skip_all)]
pub async fn creative_ids_with_tag_exact(
    pool: &Pool,
    name: &str,
) -> Result<Vec<i64>, sqlx::Error> {
    sqlx::query_scalar::<_, i64>(
        "SELECT DISTINCT ct.creative_id FROM creative_tags ct \
         JOIN tags t ON t.id = ct.tag_id \
         WHERE t.name = ? ORDER BY ct.creative_id",
    )
    .bind(name)
    .fetch_all(pool)
    .await
}

#[instrument(skip_all)]
pub async fn set_creative_creator(
    pool: &Pool,
    creative_id: i64,
    creator_id: i64,
) -> Result<u64, sqlx::Error> {
    let res = sqlx::query("UPDATE creatives SET creator_id = ? WHERE id = ?")
        .bind(creator_id)
        .bind(creative_id)
        .execute(pool)
        .await?;
    Ok(res.rows_affected())
}

#[instrument(skip_all)]
pub async fn fetch_tag_by_name(pool: &Pool, name: &str) -> Result<Option<Tag>, sqlx::Error> {
    sqlx::query_as::<_, Tag>("SELECT id, name FROM tags WHERE name = ?")
        .bind(name)
        .fetch_optional(pool)
        .await
}

#[instrument(skip_all)]
pub async fn upsert_tag(pool: &Pool, name: &str) -> Result<i64, sqlx::Error> {
    // DO UPDATE instead of DO NOTHING so RETURNING yields the existing row.
    sqlx::query_scalar::<_, i64>(
        "INSERT INTO tags (name) VALUES (?) \
         ON CONFLICT(name) DO UPDATE SET name = excluded.name RETURNING id",
    )
    .bind(name)
    .fetch_one(pool)
    .await
}

#[instrument(skip_all)]
pub async fn connect_tag(
    pool: &Pool,
    creative_id: i64,
    tag_id: i64,
) -> Result<(), sqlx::Error> {
    sqlx::query("INSERT OR IGNORE INTO creative_tags (creative_id, tag_id) VALUES (?, ?)")
        .bind(creative_id)
        .bind(tag_id)
        .execute(pool)
        .await?;
    Ok(())
}

#[instrument(skip_all)]
pub async fn disconnect_tag(
    pool: &Pool,
    creative_id: i64,
    tag_id: i64,
) -> Result<(), sqlx::Error> {
    sqlx::query("DELETE FROM creative_tags WHERE creative_id = ? AND tag_id = ?")
        .bind(creative_id)
        .bind(tag_id)
        .execute(pool)
        .await?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn sqlite_url_passthrough() {
        assert_eq!(prepare_sqlite_url("sqlite::memory:"), "sqlite::memory:");
        assert_eq!(
            prepare_sqlite_url("postgres://x/y"),
            "postgres://x/y".to_string()
        );
    }

    #[tokio::test]
    async fn tag_upsert_is_idempotent() {
        let pool = SqlitePool::connect("sqlite::memory:").await.unwrap();
        run_migrations(&pool).await.unwrap();

        let a = upsert_tag(&pool, "CID-1234").await.unwrap();
        let b = upsert_tag(&pool, "CID-1234").await.unwrap();
        assert_eq!(a, b);

        let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM tags")
            .fetch_one(&pool)
            .await
            .unwrap();
        assert_eq!(count, 1);
    }

    #[tokio::test]
    async fn connect_disconnect_leave_rest_of_set() {
        let pool = SqlitePool::connect("sqlite::memory:").await.unwrap();
        run_migrations(&pool).await.unwrap();

        sqlx::query("INSERT INTO creatives (file_url) VALUES ('v1.mp4')")
            .execute(&pool)
            .await
            .unwrap();
        let t1 = upsert_tag(&pool, "L1:Batch7").await.unwrap();
        let t2 = upsert_tag(&pool, "CID-1234").await.unwrap();

        connect_tag(&pool, 1, t1).await.unwrap();
        connect_tag(&pool, 1, t2).await.unwrap();
        connect_tag(&pool, 1, t2).await.unwrap(); // no duplicate row

        let n: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM creative_tags WHERE creative_id = 1")
            .fetch_one(&pool)
            .await
            .unwrap();
        assert_eq!(n, 2);

        disconnect_tag(&pool, 1, t2).await.unwrap();
        disconnect_tag(&pool, 1, t2).await.unwrap(); // absent pair is a no-op

        let names: Vec<String> = sqlx::query_scalar(
            "SELECT t.name FROM creative_tags ct JOIN tags t ON t.id = ct.tag_id \
             WHERE ct.creative_id = 1",
        )
        .fetch_all(&pool)
        .await
        .unwrap();
        assert_eq!(names, vec!["L1:Batch7".to_string()]);
    }
}
