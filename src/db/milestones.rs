use chrono::{DateTime, Duration, NaiveDate, Utc};
use sqlx::postgres::PgRow;
use sqlx::{PgExecutor, Postgres, Row, Transaction};
use tracing::info;
use uuid::Uuid;

use crate::error::{PaktError, Result};
use crate::models::{validate_importance, Milestone, MilestoneUpdate, NewMilestone};

const COLUMNS: &str = "m.id, m.pakt_id, m.name, m.due_date, m.notes, m.importance, \
                       m.completed, m.completed_at, m.order_index";

fn from_row(row: &PgRow) -> Result<Milestone> {
    Ok(Milestone {
        id: row.try_get("id")?,
        pakt_id: row.try_get("pakt_id")?,
        name: row.try_get("name")?,
        due_date: row.try_get("due_date")?,
        notes: row.try_get("notes")?,
        importance: row.try_get("importance")?,
        completed: row.try_get("completed")?,
        completed_at: row.try_get("completed_at")?,
        order_index: row.try_get("order_index")?,
    })
}

pub async fn list_for_pakt<'e, E: PgExecutor<'e>>(executor: E, pakt_id: Uuid) -> Result<Vec<Milestone>> {
    let rows = sqlx::query(&format!(
        "SELECT {COLUMNS} FROM paktiq.milestones m WHERE m.pakt_id = $1 \
         ORDER BY m.order_index, m.due_date"
    ))
    .bind(pakt_id)
    .fetch_all(executor)
    .await?;

    rows.iter().map(from_row).collect()
}

/// Every milestone the owner has across all pakts.
pub async fn list_for_owner<'e, E: PgExecutor<'e>>(executor: E, owner_id: Uuid) -> Result<Vec<Milestone>> {
    let rows = sqlx::query(&format!(
        "SELECT {COLUMNS} FROM paktiq.milestones m \
         JOIN paktiq.pakts p ON p.id = m.pakt_id \
         WHERE p.owner_id = $1 \
         ORDER BY m.pakt_id, m.order_index, m.due_date"
    ))
    .bind(owner_id)
    .fetch_all(executor)
    .await?;

    rows.iter().map(from_row).collect()
}

pub async fn get<'e, E: PgExecutor<'e>>(executor: E, owner_id: Uuid, id: Uuid) -> Result<Milestone> {
    let row = sqlx::query(&format!(
        "SELECT {COLUMNS} FROM paktiq.milestones m \
         JOIN paktiq.pakts p ON p.id = m.pakt_id \
         WHERE m.id = $1 AND p.owner_id = $2"
    ))
    .bind(id)
    .bind(owner_id)
    .fetch_optional(executor)
    .await?
    .ok_or_else(|| PaktError::not_found("milestone", id))?;

    from_row(&row)
}

pub async fn insert<'e, E: PgExecutor<'e>>(
    executor: E,
    pakt_id: Uuid,
    draft: &NewMilestone,
) -> Result<Milestone> {
    draft.validate()?;

    let row = sqlx::query(&format!(
        r#"
        INSERT INTO paktiq.milestones AS m
        (id, pakt_id, name, due_date, notes, importance, order_index)
        VALUES ($1, $2, $3, $4, $5, $6, $7)
        RETURNING {COLUMNS}
        "#
    ))
    .bind(Uuid::new_v4())
    .bind(pakt_id)
    .bind(draft.name.trim())
    .bind(draft.due_date)
    .bind(&draft.notes)
    .bind(draft.importance)
    .bind(draft.order_index)
    .fetch_one(executor)
    .await?;

    from_row(&row)
}

pub async fn next_order_index<'e, E: PgExecutor<'e>>(executor: E, pakt_id: Uuid) -> Result<i32> {
    let next = sqlx::query_scalar(
        "SELECT COALESCE(MAX(order_index) + 1, 0) FROM paktiq.milestones WHERE pakt_id = $1",
    )
    .bind(pakt_id)
    .fetch_one(executor)
    .await?;
    Ok(next)
}

/// Appends `drafts` after the pakt's last milestone, inside the caller's transaction.
pub async fn create_batch(
    tx: &mut Transaction<'_, Postgres>,
    pakt_id: Uuid,
    drafts: &[NewMilestone],
) -> Result<Vec<Milestone>> {
    for draft in drafts {
        draft.validate()?;
    }

    let next_index = next_order_index(&mut **tx, pakt_id).await?;

    let mut created = Vec::with_capacity(drafts.len());
    for (offset, draft) in drafts.iter().enumerate() {
        let numbered = NewMilestone {
            order_index: next_index + offset as i32,
            ..draft.clone()
        };
        created.push(insert(&mut **tx, pakt_id, &numbered).await?);
    }

    info!(pakt_id = %pakt_id, count = created.len(), "milestones created");
    Ok(created)
}

pub async fn update<'e, E: PgExecutor<'e>>(
    executor: E,
    owner_id: Uuid,
    id: Uuid,
    changes: &MilestoneUpdate,
) -> Result<Milestone> {
    if let Some(importance) = changes.importance {
        validate_importance(importance)?;
    }
    if changes.name.as_deref().is_some_and(|n| n.trim().is_empty()) {
        return Err(PaktError::validation("milestone name must not be empty"));
    }

    let row = sqlx::query(&format!(
        r#"
        UPDATE paktiq.milestones m
        SET name = COALESCE($3, m.name),
            due_date = COALESCE($4, m.due_date),
            notes = COALESCE($5, m.notes),
            importance = COALESCE($6, m.importance)
        FROM paktiq.pakts p
        WHERE m.id = $1 AND p.id = m.pakt_id AND p.owner_id = $2
        RETURNING {COLUMNS}
        "#
    ))
    .bind(id)
    .bind(owner_id)
    .bind(changes.name.as_deref().map(str::trim))
    .bind(changes.due_date)
    .bind(changes.notes.as_deref())
    .bind(changes.importance)
    .fetch_optional(executor)
    .await?
    .ok_or_else(|| PaktError::not_found("milestone", id))?;

    from_row(&row)
}

pub async fn set_completion<'e, E: PgExecutor<'e>>(
    executor: E,
    id: Uuid,
    completed: bool,
    completed_at: Option<DateTime<Utc>>,
) -> Result<Milestone> {
    let row = sqlx::query(&format!(
        r#"
        UPDATE paktiq.milestones m SET completed = $2, completed_at = $3
        WHERE m.id = $1
        RETURNING {COLUMNS}
        "#
    ))
    .bind(id)
    .bind(completed)
    .bind(completed_at)
    .fetch_optional(executor)
    .await?
    .ok_or_else(|| PaktError::not_found("milestone", id))?;

    from_row(&row)
}

pub async fn delete<'e, E: PgExecutor<'e>>(executor: E, owner_id: Uuid, id: Uuid) -> Result<Uuid> {
    let pakt_id: Option<Uuid> = sqlx::query_scalar(
        r#"
        DELETE FROM paktiq.milestones m
        USING paktiq.pakts p
        WHERE m.id = $1 AND p.id = m.pakt_id AND p.owner_id = $2
        RETURNING m.pakt_id
        "#,
    )
    .bind(id)
    .bind(owner_id)
    .fetch_optional(executor)
    .await?;

    pakt_id.ok_or_else(|| PaktError::not_found("milestone", id))
}

/// Incomplete milestones on active pakts due in the next `days` days.
pub async fn upcoming<'e, E: PgExecutor<'e>>(
    executor: E,
    owner_id: Uuid,
    today: NaiveDate,
    days: i64,
) -> Result<Vec<Milestone>> {
    let rows = sqlx::query(&format!(
        "SELECT {COLUMNS} FROM paktiq.milestones m \
         JOIN paktiq.pakts p ON p.id = m.pakt_id \
         WHERE p.owner_id = $1 AND p.status = 'active' AND NOT m.completed \
         AND m.due_date BETWEEN $2 AND $3 \
         ORDER BY m.due_date, m.importance DESC"
    ))
    .bind(owner_id)
    .bind(today)
    .bind(today + Duration::days(days))
    .fetch_all(executor)
    .await?;

    rows.iter().map(from_row).collect()
}

pub async fn overdue<'e, E: PgExecutor<'e>>(
    executor: E,
    owner_id: Uuid,
    today: NaiveDate,
) -> Result<Vec<Milestone>> {
    let rows = sqlx::query(&format!(
        "SELECT {COLUMNS} FROM paktiq.milestones m \
         JOIN paktiq.pakts p ON p.id = m.pakt_id \
         WHERE p.owner_id = $1 AND p.status = 'active' AND NOT m.completed \
         AND m.due_date < $2 \
         ORDER BY m.due_date"
    ))
    .bind(owner_id)
    .bind(today)
    .fetch_all(executor)
    .await?;

    rows.iter().map(from_row).collect()
}

/// `(total, completed)` for one pakt.
pub async fn counts_for_pakt<'e, E: PgExecutor<'e>>(executor: E, pakt_id: Uuid) -> Result<(i64, i64)> {
    let row = sqlx::query(
        "SELECT COUNT(*) AS total, COUNT(*) FILTER (WHERE completed) AS done \
         FROM paktiq.milestones WHERE pakt_id = $1",
    )
    .bind(pakt_id)
    .fetch_one(executor)
    .await?;

    Ok((row.try_get("total")?, row.try_get("done")?))
}

pub async fn completed_count<'e, E: PgExecutor<'e>>(executor: E, owner_id: Uuid) -> Result<i64> {
    let count = sqlx::query_scalar(
        "SELECT COUNT(*) FROM paktiq.milestones m \
         JOIN paktiq.pakts p ON p.id = m.pakt_id \
         WHERE p.owner_id = $1 AND m.completed",
    )
    .bind(owner_id)
    .fetch_one(executor)
    .await?;
    Ok(count)
}

pub async fn completion_times<'e, E: PgExecutor<'e>>(
    executor: E,
    owner_id: Uuid,
) -> Result<Vec<DateTime<Utc>>> {
    let times = sqlx::query_scalar(
        "SELECT m.completed_at FROM paktiq.milestones m \
         JOIN paktiq.pakts p ON p.id = m.pakt_id \
         WHERE p.owner_id = $1 AND m.completed_at IS NOT NULL",
    )
    .bind(owner_id)
    .fetch_all(executor)
    .await?;
    Ok(times)
}
