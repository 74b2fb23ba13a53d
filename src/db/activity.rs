use sqlx::{PgExecutor, Row};
use uuid::Uuid;

use crate::error::Result;
use crate::models::{ActivityEntry, ActivityEvent};

pub async fn log<'e, E: PgExecutor<'e>>(
    executor: E,
    owner_id: Uuid,
    pakt_id: Option<Uuid>,
    event: ActivityEvent,
    detail: &str,
) -> Result<()> {
    sqlx::query(
        r#"
        INSERT INTO paktiq.activity_log (id, owner_id, pakt_id, event, detail)
        VALUES ($1, $2, $3, $4, $5)
        "#,
    )
    .bind(Uuid::new_v4())
    .bind(owner_id)
    .bind(pakt_id)
    .bind(event.as_str())
    .bind(detail)
    .execute(executor)
    .await?;
    Ok(())
}

pub async fn recent<'e, E: PgExecutor<'e>>(
    executor: E,
    owner_id: Uuid,
    limit: i64,
) -> Result<Vec<ActivityEntry>> {
    let rows = sqlx::query(
        r#"
        SELECT id, pakt_id, event, detail, occurred_at
        FROM paktiq.activity_log
        WHERE owner_id = $1
        ORDER BY occurred_at DESC
        LIMIT $2
        "#,
    )
    .bind(owner_id)
    .bind(limit)
    .fetch_all(executor)
    .await?;

    let mut entries = Vec::with_capacity(rows.len());
    for row in rows {
        entries.push(ActivityEntry {
            id: row.try_get("id")?,
            pakt_id: row.try_get("pakt_id")?,
            event: row.try_get("event")?,
            detail: row.try_get("detail")?,
            occurred_at: row.try_get("occurred_at")?,
        });
    }
    Ok(entries)
}
