use sqlx::postgres::PgRow;
use sqlx::{PgExecutor, Row};
use tracing::debug;
use uuid::Uuid;

use crate::error::{PaktError, Result};
use crate::models::{NewPakt, Pakt, PaktStatus, PaktUpdate};

const COLUMNS: &str = "id, owner_id, name, description, target_outcome, category, \
                       target_date, status, progress, created_at, updated_at";

fn from_row(row: &PgRow) -> Result<Pakt> {
    let status: String = row.try_get("status")?;
    Ok(Pakt {
        id: row.try_get("id")?,
        owner_id: row.try_get("owner_id")?,
        name: row.try_get("name")?,
        description: row.try_get("description")?,
        target_outcome: row.try_get("target_outcome")?,
        category: row.try_get("category")?,
        target_date: row.try_get("target_date")?,
        status: status.parse()?,
        progress: row.try_get("progress")?,
        created_at: row.try_get("created_at")?,
        updated_at: row.try_get("updated_at")?,
    })
}

pub async fn list<'e, E: PgExecutor<'e>>(
    executor: E,
    owner_id: Uuid,
    status: Option<PaktStatus>,
) -> Result<Vec<Pakt>> {
    let mut query = format!("SELECT {COLUMNS} FROM paktiq.pakts WHERE owner_id = $1");
    if status.is_some() {
        query.push_str(" AND status = $2");
    }
    query.push_str(" ORDER BY target_date, created_at");

    let mut rows = sqlx::query(&query).bind(owner_id);
    if let Some(status) = status {
        rows = rows.bind(status.as_str());
    }

    let records = rows.fetch_all(executor).await?;
    records.iter().map(from_row).collect()
}

pub async fn get<'e, E: PgExecutor<'e>>(executor: E, owner_id: Uuid, id: Uuid) -> Result<Pakt> {
    let row = sqlx::query(&format!(
        "SELECT {COLUMNS} FROM paktiq.pakts WHERE id = $1 AND owner_id = $2"
    ))
    .bind(id)
    .bind(owner_id)
    .fetch_optional(executor)
    .await?
    .ok_or_else(|| PaktError::not_found("pakt", id))?;

    from_row(&row)
}

pub fn validate(new_pakt: &NewPakt) -> Result<()> {
    if new_pakt.name.trim().is_empty() {
        return Err(PaktError::validation("pakt name must not be empty"));
    }
    if new_pakt.category.trim().is_empty() {
        return Err(PaktError::validation("pakt category must not be empty"));
    }
    Ok(())
}

pub async fn insert<'e, E: PgExecutor<'e>>(executor: E, new_pakt: &NewPakt) -> Result<Pakt> {
    validate(new_pakt)?;

    let row = sqlx::query(&format!(
        r#"
        INSERT INTO paktiq.pakts
        (id, owner_id, name, description, target_outcome, category, target_date)
        VALUES ($1, $2, $3, $4, $5, $6, $7)
        RETURNING {COLUMNS}
        "#
    ))
    .bind(Uuid::new_v4())
    .bind(new_pakt.owner_id)
    .bind(new_pakt.name.trim())
    .bind(&new_pakt.description)
    .bind(&new_pakt.target_outcome)
    .bind(new_pakt.category.trim().to_ascii_lowercase())
    .bind(new_pakt.target_date)
    .fetch_one(executor)
    .await?;

    let pakt = from_row(&row)?;
    debug!(pakt_id = %pakt.id, "pakt inserted");
    Ok(pakt)
}

pub async fn update<'e, E: PgExecutor<'e>>(
    executor: E,
    owner_id: Uuid,
    id: Uuid,
    changes: &PaktUpdate,
) -> Result<Pakt> {
    if changes.name.as_deref().is_some_and(|n| n.trim().is_empty()) {
        return Err(PaktError::validation("pakt name must not be empty"));
    }

    let row = sqlx::query(&format!(
        r#"
        UPDATE paktiq.pakts
        SET name = COALESCE($3, name),
            description = COALESCE($4, description),
            target_outcome = COALESCE($5, target_outcome),
            category = COALESCE($6, category),
            target_date = COALESCE($7, target_date),
            updated_at = now()
        WHERE id = $1 AND owner_id = $2
        RETURNING {COLUMNS}
        "#
    ))
    .bind(id)
    .bind(owner_id)
    .bind(changes.name.as_deref().map(str::trim))
    .bind(changes.description.as_deref())
    .bind(changes.target_outcome.as_deref())
    .bind(changes.category.as_deref().map(|c| c.trim().to_ascii_lowercase()))
    .bind(changes.target_date)
    .fetch_optional(executor)
    .await?
    .ok_or_else(|| PaktError::not_found("pakt", id))?;

    from_row(&row)
}

pub async fn set_status<'e, E: PgExecutor<'e>>(
    executor: E,
    owner_id: Uuid,
    id: Uuid,
    status: PaktStatus,
) -> Result<Pakt> {
    let row = sqlx::query(&format!(
        r#"
        UPDATE paktiq.pakts SET status = $3, updated_at = now()
        WHERE id = $1 AND owner_id = $2
        RETURNING {COLUMNS}
        "#
    ))
    .bind(id)
    .bind(owner_id)
    .bind(status.as_str())
    .fetch_optional(executor)
    .await?
    .ok_or_else(|| PaktError::not_found("pakt", id))?;

    from_row(&row)
}

pub async fn set_progress<'e, E: PgExecutor<'e>>(executor: E, id: Uuid, progress: u8) -> Result<()> {
    sqlx::query("UPDATE paktiq.pakts SET progress = $2, updated_at = now() WHERE id = $1")
        .bind(id)
        .bind(i32::from(progress.min(100)))
        .execute(executor)
        .await?;
    Ok(())
}

pub async fn delete<'e, E: PgExecutor<'e>>(executor: E, owner_id: Uuid, id: Uuid) -> Result<()> {
    let result = sqlx::query("DELETE FROM paktiq.pakts WHERE id = $1 AND owner_id = $2")
        .bind(id)
        .bind(owner_id)
        .execute(executor)
        .await?;

    if result.rows_affected() == 0 {
        return Err(PaktError::not_found("pakt", id));
    }
    Ok(())
}

pub async fn count_by_status<'e, E: PgExecutor<'e>>(
    executor: E,
    owner_id: Uuid,
    status: PaktStatus,
) -> Result<i64> {
    let count = sqlx::query_scalar(
        "SELECT COUNT(*) FROM paktiq.pakts WHERE owner_id = $1 AND status = $2",
    )
    .bind(owner_id)
    .bind(status.as_str())
    .fetch_one(executor)
    .await?;
    Ok(count)
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    fn draft(name: &str, category: &str) -> NewPakt {
        NewPakt {
            owner_id: Uuid::new_v4(),
            name: name.to_string(),
            description: String::new(),
            target_outcome: String::new(),
            category: category.to_string(),
            target_date: NaiveDate::from_ymd_opt(2026, 6, 1).unwrap(),
        }
    }

    #[test]
    fn validate_requires_name_and_category() {
        assert!(validate(&draft("Learn Spanish", "learning")).is_ok());
        assert!(validate(&draft("  ", "learning")).is_err());
        assert!(validate(&draft("Learn Spanish", "")).is_err());
    }
}
