use std::future::Future;
use std::time::Duration as StdDuration;

use chrono::{Duration, NaiveTime, Utc};
use sqlx::PgPool;
use tracing::{info, warn};
use uuid::Uuid;

use crate::error::Result;
use crate::flows;
use crate::models::{NewMilestone, NewPakt, NewPaktPlan, NewReminder, ReminderFrequency};

pub mod achievements;
pub mod activity;
pub mod analytics;
pub mod milestones;
pub mod pakts;
pub mod reminders;
pub mod transfer;

const MAX_ATTEMPTS: u32 = 3;

pub async fn init_db(pool: &PgPool) -> Result<()> {
    sqlx::migrate!("./migrations").run(pool).await?;
    info!("schema migrations applied");
    Ok(())
}

/// Runs an idempotent operation again when it fails with a transient error.
pub async fn with_retry<T, F, Fut>(label: &str, mut op: F) -> Result<T>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = Result<T>>,
{
    let mut attempt = 1;
    loop {
        match op().await {
            Err(err) if err.is_retryable() && attempt < MAX_ATTEMPTS => {
                warn!(operation = label, attempt, error = %err, "transient failure, retrying");
                tokio::time::sleep(StdDuration::from_millis(200 * u64::from(attempt))).await;
                attempt += 1;
            }
            result => return result,
        }
    }
}

/// Loads a demo pakt for `owner_id` unless one already exists.
pub async fn seed(pool: &PgPool, owner_id: Uuid) -> Result<bool> {
    const NAME: &str = "Run a half marathon";

    let exists: bool = sqlx::query_scalar(
        "SELECT EXISTS (SELECT 1 FROM paktiq.pakts WHERE owner_id = $1 AND name = $2)",
    )
    .bind(owner_id)
    .bind(NAME)
    .fetch_one(pool)
    .await?;

    if exists {
        info!(owner = %owner_id, "seed data already present");
        return Ok(false);
    }

    let today = Utc::now().date_naive();
    let plan = NewPaktPlan {
        pakt: NewPakt {
            owner_id,
            name: NAME.to_string(),
            description: "Train up from 5k runs to a full half marathon".to_string(),
            target_outcome: "Finish 21.1 km under 2 hours".to_string(),
            category: "fitness".to_string(),
            target_date: today + Duration::weeks(14),
        },
        milestones: vec![
            NewMilestone {
                name: "Run 5k without stopping".to_string(),
                due_date: today + Duration::weeks(2),
                notes: "Easy pace is fine".to_string(),
                importance: 3,
                order_index: 0,
            },
            NewMilestone {
                name: "Run 10k".to_string(),
                due_date: today + Duration::weeks(6),
                notes: String::new(),
                importance: 4,
                order_index: 1,
            },
            NewMilestone {
                name: "Long run of 18k".to_string(),
                due_date: today + Duration::weeks(11),
                notes: "Test race-day nutrition".to_string(),
                importance: 5,
                order_index: 2,
            },
        ],
        reminder: Some(NewReminder {
            frequency: ReminderFrequency::Custom,
            time_of_day: NaiveTime::from_hms_opt(7, 0, 0).unwrap_or(NaiveTime::MIN),
            days_of_week: vec![1, 3, 6],
        }),
    };

    flows::create_pakt_plan(pool, plan).await?;
    Ok(true)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::PaktError;
    use std::sync::atomic::{AtomicU32, Ordering};

    #[tokio::test]
    async fn retries_transient_errors_until_success() {
        let calls = AtomicU32::new(0);
        let result = with_retry("test", || {
            let n = calls.fetch_add(1, Ordering::SeqCst);
            async move {
                if n < 2 {
                    Err(PaktError::Transient("connection reset".to_string()))
                } else {
                    Ok(n)
                }
            }
        })
        .await;

        assert_eq!(result.unwrap(), 2);
        assert_eq!(calls.load(Ordering::SeqCst), 3);
    }

    #[tokio::test]
    async fn permanent_errors_are_not_retried() {
        let calls = AtomicU32::new(0);
        let result: Result<()> = with_retry("test", || {
            calls.fetch_add(1, Ordering::SeqCst);
            async { Err(PaktError::validation("bad")) }
        })
        .await;

        assert!(result.is_err());
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn gives_up_after_max_attempts() {
        let calls = AtomicU32::new(0);
        let result: Result<()> = with_retry("test", || {
            calls.fetch_add(1, Ordering::SeqCst);
            async { Err(PaktError::Transient("down".to_string())) }
        })
        .await;

        assert!(result.unwrap_err().is_retryable());
        assert_eq!(calls.load(Ordering::SeqCst), MAX_ATTEMPTS);
    }
}
