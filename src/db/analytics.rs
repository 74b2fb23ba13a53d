use chrono::NaiveDate;
use sqlx::{PgExecutor, Row};
use uuid::Uuid;

use crate::error::{PaktError, Result};
use crate::models::DailyAnalytics;

/// Narrows a counter to the INTEGER columns of `daily_analytics`.
fn to_column(value: u32, what: &str) -> Result<i32> {
    i32::try_from(value).map_err(|_| PaktError::validation(format!("{what} {value} is too large")))
}

/// Bumps today's completion counter and records the streak as of now.
pub async fn record_completion<'e, E: PgExecutor<'e>>(
    executor: E,
    owner_id: Uuid,
    day: NaiveDate,
    streak_days: u32,
) -> Result<()> {
    let streak_days = to_column(streak_days, "streak of")?;
    sqlx::query(
        r#"
        INSERT INTO paktiq.daily_analytics (owner_id, day, milestones_completed, streak_days)
        VALUES ($1, $2, 1, $3)
        ON CONFLICT (owner_id, day) DO UPDATE
        SET milestones_completed = paktiq.daily_analytics.milestones_completed + 1,
            streak_days = EXCLUDED.streak_days
        "#,
    )
    .bind(owner_id)
    .bind(day)
    .bind(streak_days)
    .execute(executor)
    .await?;
    Ok(())
}

/// Undoes one completion for `day` when a milestone is reopened.
pub async fn record_reopen<'e, E: PgExecutor<'e>>(
    executor: E,
    owner_id: Uuid,
    day: NaiveDate,
) -> Result<()> {
    sqlx::query(
        r#"
        UPDATE paktiq.daily_analytics
        SET milestones_completed = GREATEST(milestones_completed - 1, 0)
        WHERE owner_id = $1 AND day = $2
        "#,
    )
    .bind(owner_id)
    .bind(day)
    .execute(executor)
    .await?;
    Ok(())
}

pub async fn add_time_spent<'e, E: PgExecutor<'e>>(
    executor: E,
    owner_id: Uuid,
    day: NaiveDate,
    minutes: u32,
) -> Result<()> {
    let minutes = to_column(minutes, "minutes")?;
    sqlx::query(
        r#"
        INSERT INTO paktiq.daily_analytics (owner_id, day, time_spent_minutes)
        VALUES ($1, $2, $3)
        ON CONFLICT (owner_id, day) DO UPDATE
        SET time_spent_minutes = paktiq.daily_analytics.time_spent_minutes + EXCLUDED.time_spent_minutes
        "#,
    )
    .bind(owner_id)
    .bind(day)
    .bind(minutes)
    .execute(executor)
    .await?;
    Ok(())
}

pub async fn list<'e, E: PgExecutor<'e>>(
    executor: E,
    owner_id: Uuid,
    since: NaiveDate,
) -> Result<Vec<DailyAnalytics>> {
    let rows = sqlx::query(
        r#"
        SELECT day, milestones_completed, time_spent_minutes, streak_days
        FROM paktiq.daily_analytics
        WHERE owner_id = $1 AND day >= $2
        ORDER BY day
        "#,
    )
    .bind(owner_id)
    .bind(since)
    .fetch_all(executor)
    .await?;

    let mut days = Vec::with_capacity(rows.len());
    for row in rows {
        days.push(DailyAnalytics {
            day: row.try_get("day")?,
            milestones_completed: row.try_get("milestones_completed")?,
            time_spent_minutes: row.try_get("time_spent_minutes")?,
            streak_days: row.try_get("streak_days")?,
        });
    }
    Ok(days)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn counters_beyond_integer_range_are_rejected() {
        assert_eq!(to_column(90, "minutes").unwrap(), 90);
        assert_eq!(to_column(i32::MAX as u32, "minutes").unwrap(), i32::MAX);
        assert!(matches!(
            to_column(3_000_000_000, "minutes"),
            Err(PaktError::Validation(_))
        ));
    }

    #[tokio::test]
    async fn oversized_time_entry_fails_before_touching_the_database() {
        let pool = sqlx::postgres::PgPoolOptions::new()
            .connect_lazy("postgres://localhost/paktiq_unused")
            .unwrap();
        let day = NaiveDate::from_ymd_opt(2026, 3, 10).unwrap();
        let result = add_time_spent(&pool, Uuid::new_v4(), day, 3_000_000_000).await;
        assert!(matches!(result, Err(PaktError::Validation(_))));
    }
}
