use creative_ops::batches::{self, NewBatch};
use creative_ops::items::{self, ItemUpdate};
use creative_ops::model::{BatchStatus, BatchType, BulkAction, ItemStatus};
use creative_ops::roster;
use creative_ops::tags;
use creative_ops::{creators, db};

async fn setup_pool() -> sqlx::SqlitePool {
    let pool = sqlx::SqlitePool::connect("sqlite::memory:").await.unwrap();
    db::run_migrations(&pool).await.unwrap();
    pool
}

async fn insert_creative(pool: &sqlx::SqlitePool, url: &str, tag_names: &[&str]) -> i64 {
    let id: i64 = sqlx::query_scalar("INSERT INTO creatives (file_url) VALUES (?) RETURNING id")
        .bind(url)
        .fetch_one(pool)
        .await
        .unwrap();
    for name in tag_names {
        let tag_id = db::upsert_tag(pool, name).await.unwrap();
        db::connect_tag(pool, id, tag_id).await.unwrap();
    }
    id
}

#[tokio::test]
async fn import_run_links_delivered_creatives() {
    let pool = setup_pool().await;

    let c1 = insert_creative(&pool, "jane_v1.mp4", &["L1:Batch7", "CID-1234"]).await;
    let c2 = insert_creative(&pool, "jane_v2.mp4", &["L1:Batch7", "CID-5678"]).await;
    let c3 = insert_creative(&pool, "mark_v1.mp4", &["L1:Batch7", "CID-9999"]).await;

    let text = "\
Jane Doe\tjane@x.com\tCID-1234, CID-1234, CID-5678\n\
Mark Webb\thttps://drive.google.com/file/d/x?usp=sharing@g\tCID-9999\n\
\tno-name@x.com\tCID-0000\n";

    let report = roster::run_import(&pool, text, 4).await.unwrap();
    assert_eq!(report.rows_imported, 2);
    assert_eq!(report.rows_skipped, 1);
    assert_eq!(report.creatives_linked, 3);
    assert!(report.failures.is_empty());

    let jane = db::fetch_creator_by_email(&pool, "jane@x.com")
        .await
        .unwrap()
        .unwrap();
    // No usable email on Mark's row: placeholder synthesized from the name.
    let mark = db::fetch_creator_by_email(&pool, "mark.webb@placeholder.com")
        .await
        .unwrap()
        .unwrap();

    let creator_of = |id: i64| {
        let pool = pool.clone();
        async move {
            sqlx::query_scalar::<_, Option<i64>>("SELECT creator_id FROM creatives WHERE id = ?")
                .bind(id)
                .fetch_one(&pool)
                .await
                .unwrap()
        }
    };
    assert_eq!(creator_of(c1).await, Some(jane.id));
    assert_eq!(creator_of(c2).await, Some(jane.id));
    assert_eq!(creator_of(c3).await, Some(mark.id));

    // Rerunning the identical import is a no-op on the creator table and
    // reports the same linked count.
    let report = roster::run_import(&pool, text, 4).await.unwrap();
    assert_eq!(report.creatives_linked, 3);
    let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM creators")
        .fetch_one(&pool)
        .await
        .unwrap();
    assert_eq!(count, 2);
}

#[tokio::test]
async fn production_cycle_with_review_loopback() {
    let pool = setup_pool().await;
    sqlx::query("INSERT INTO brands (name) VALUES ('Acme')")
        .execute(&pool)
        .await
        .unwrap();
    sqlx::query("INSERT INTO angles (brand_id, name) VALUES (1, 'Unboxing')")
        .execute(&pool)
        .await
        .unwrap();
    sqlx::query("INSERT INTO formats (name) VALUES ('9x16')")
        .execute(&pool)
        .await
        .unwrap();

    let batch = batches::create_batch(
        &pool,
        NewBatch {
            brand_id: 1,
            batch_type: Some(BatchType::Copycat),
            angle_id: Some(1),
            format_id: Some(1),
            brief: Some("Replicate the top performer from July".into()),
            ..Default::default()
        },
    )
    .await
    .unwrap();
    assert_eq!(batch.status, BatchStatus::CreatorBriefing);

    let creator = creators::resolve(&pool, "Jane Doe", "jane@x.com").await.unwrap();
    items::assign_creator(&pool, batch.id, creator.id).await.unwrap();

    let item = items::add_item(&pool, batch.id, None, None).await.unwrap();
    batches::advance_batch(&pool, batch.id, "REVIEW").await.unwrap();

    // Reviewer rejects the deliverable: batch loops back to editing.
    let outcome = items::update_item(
        &pool,
        item.id,
        ItemUpdate {
            status: Some(ItemStatus::Pending),
            notes: Some("logo covered by captions".into()),
            ..Default::default()
        },
    )
    .await
    .unwrap();
    assert!(outcome.loopback_fired);
    let batch = batches::get_batch(&pool, batch.id).await.unwrap();
    assert_eq!(batch.status, BatchStatus::Editing);

    // Second pass is accepted, batch moves on and gets archived.
    batches::advance_batch(&pool, batch.id, "REVIEW").await.unwrap();
    let outcome = items::update_item(
        &pool,
        item.id,
        ItemUpdate {
            status: Some(ItemStatus::Done),
            delivered_video_url: Some("https://cdn.example/final.mp4".into()),
            ..Default::default()
        },
    )
    .await
    .unwrap();
    assert!(!outcome.loopback_fired);

    batches::advance_batch(&pool, batch.id, "ARCHIVED").await.unwrap();
    let listed = batches::list_batches(&pool, 1, None).await.unwrap();
    assert_eq!(listed.len(), 1);
    assert_eq!(listed[0].status, BatchStatus::Archived);
}

#[tokio::test]
async fn bulk_tag_after_import() {
    let pool = setup_pool().await;

    insert_creative(&pool, "a.mp4", &["L1:Batch7", "CID-1234"]).await;
    insert_creative(&pool, "b.mp4", &["L1:Batch7", "CID-5678"]).await;

    let tag_names = vec!["BUNCH:Approved".to_string()];
    let affected = tags::bulk_tag(&pool, "Batch7", &tag_names, BulkAction::Add, 4)
        .await
        .unwrap();
    assert_eq!(affected, 2);

    let tagged: i64 = sqlx::query_scalar(
        "SELECT COUNT(*) FROM creative_tags ct JOIN tags t ON t.id = ct.tag_id \
         WHERE t.name = 'BUNCH:Approved'",
    )
    .fetch_one(&pool)
    .await
    .unwrap();
    assert_eq!(tagged, 2);

    let affected = tags::bulk_tag(&pool, "Batch7", &tag_names, BulkAction::Remove, 4)
        .await
        .unwrap();
    assert_eq!(affected, 2);
    let tagged: i64 = sqlx::query_scalar(
        "SELECT COUNT(*) FROM creative_tags ct JOIN tags t ON t.id = ct.tag_id \
         WHERE t.name = 'BUNCH:Approved'",
    )
    .fetch_one(&pool)
    .await
    .unwrap();
    assert_eq!(tagged, 0);
}
