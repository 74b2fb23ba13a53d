use sqlx::postgres::PgRow;
use sqlx::{PgExecutor, Row};
use uuid::Uuid;

use crate::error::{PaktError, Result};
use crate::models::{NewReminder, Reminder};
use crate::reminders::validate;

const COLUMNS: &str = "r.id, r.pakt_id, r.frequency, r.time_of_day, r.days_of_week, r.enabled";

fn from_row(row: &PgRow) -> Result<Reminder> {
    let frequency: String = row.try_get("frequency")?;
    Ok(Reminder {
        id: row.try_get("id")?,
        pakt_id: row.try_get("pakt_id")?,
        frequency: frequency.parse()?,
        time_of_day: row.try_get("time_of_day")?,
        days_of_week: row.try_get("days_of_week")?,
        enabled: row.try_get("enabled")?,
    })
}

pub async fn get_for_pakt<'e, E: PgExecutor<'e>>(executor: E, pakt_id: Uuid) -> Result<Option<Reminder>> {
    let row = sqlx::query(&format!(
        "SELECT {COLUMNS} FROM paktiq.reminders r WHERE r.pakt_id = $1"
    ))
    .bind(pakt_id)
    .fetch_optional(executor)
    .await?;

    row.as_ref().map(from_row).transpose()
}

/// Creates the pakt's reminder or replaces its schedule. Re-enables it either way.
pub async fn upsert<'e, E: PgExecutor<'e>>(
    executor: E,
    pakt_id: Uuid,
    reminder: &NewReminder,
) -> Result<Reminder> {
    validate(reminder)?;

    let mut days = reminder.days_of_week.clone();
    days.sort_unstable();
    days.dedup();

    let row = sqlx::query(&format!(
        r#"
        INSERT INTO paktiq.reminders AS r
        (id, pakt_id, frequency, time_of_day, days_of_week, enabled)
        VALUES ($1, $2, $3, $4, $5, TRUE)
        ON CONFLICT (pakt_id) DO UPDATE
        SET frequency = EXCLUDED.frequency,
            time_of_day = EXCLUDED.time_of_day,
            days_of_week = EXCLUDED.days_of_week,
            enabled = TRUE
        RETURNING {COLUMNS}
        "#
    ))
    .bind(Uuid::new_v4())
    .bind(pakt_id)
    .bind(reminder.frequency.as_str())
    .bind(reminder.time_of_day)
    .bind(&days)
    .fetch_one(executor)
    .await?;

    from_row(&row)
}

pub async fn set_enabled<'e, E: PgExecutor<'e>>(
    executor: E,
    owner_id: Uuid,
    pakt_id: Uuid,
    enabled: bool,
) -> Result<Reminder> {
    let row = sqlx::query(&format!(
        r#"
        UPDATE paktiq.reminders r SET enabled = $3
        FROM paktiq.pakts p
        WHERE r.pakt_id = $1 AND p.id = r.pakt_id AND p.owner_id = $2
        RETURNING {COLUMNS}
        "#
    ))
    .bind(pakt_id)
    .bind(owner_id)
    .bind(enabled)
    .fetch_optional(executor)
    .await?
    .ok_or_else(|| PaktError::not_found("reminder for pakt", pakt_id))?;

    from_row(&row)
}

pub async fn delete<'e, E: PgExecutor<'e>>(executor: E, owner_id: Uuid, pakt_id: Uuid) -> Result<()> {
    let result = sqlx::query(
        r#"
        DELETE FROM paktiq.reminders r
        USING paktiq.pakts p
        WHERE r.pakt_id = $1 AND p.id = r.pakt_id AND p.owner_id = $2
        "#,
    )
    .bind(pakt_id)
    .bind(owner_id)
    .execute(executor)
    .await?;

    if result.rows_affected() == 0 {
        return Err(PaktError::not_found("reminder for pakt", pakt_id));
    }
    Ok(())
}

/// Enabled reminders on active pakts, paired with the pakt name.
pub async fn list_enabled<'e, E: PgExecutor<'e>>(
    executor: E,
    owner_id: Uuid,
) -> Result<Vec<(String, Reminder)>> {
    let rows = sqlx::query(&format!(
        "SELECT p.name AS pakt_name, {COLUMNS} FROM paktiq.reminders r \
         JOIN paktiq.pakts p ON p.id = r.pakt_id \
         WHERE p.owner_id = $1 AND p.status = 'active' AND r.enabled \
         ORDER BY r.time_of_day"
    ))
    .bind(owner_id)
    .fetch_all(executor)
    .await?;

    rows.iter()
        .map(|row| -> Result<(String, Reminder)> {
            Ok((row.try_get("pakt_name")?, from_row(row)?))
        })
        .collect()
}

/// No-op when the pakt never had a reminder.
pub async fn disable_for_pakt<'e, E: PgExecutor<'e>>(executor: E, pakt_id: Uuid) -> Result<()> {
    sqlx::query("UPDATE paktiq.reminders SET enabled = FALSE WHERE pakt_id = $1")
        .bind(pakt_id)
        .execute(executor)
        .await?;
    Ok(())
}
