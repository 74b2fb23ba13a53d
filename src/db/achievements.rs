use sqlx::postgres::PgRow;
use sqlx::{PgExecutor, Row};
use uuid::Uuid;

use crate::error::Result;
use crate::models::{Achievement, NewAchievement};

const COLUMNS: &str = "id, owner_id, type_tag, title, description, icon, earned_at, metadata";

fn from_row(row: &PgRow) -> Result<Achievement> {
    Ok(Achievement {
        id: row.try_get("id")?,
        owner_id: row.try_get("owner_id")?,
        type_tag: row.try_get("type_tag")?,
        title: row.try_get("title")?,
        description: row.try_get("description")?,
        icon: row.try_get("icon")?,
        earned_at: row.try_get("earned_at")?,
        metadata: row.try_get("metadata")?,
    })
}

pub async fn list<'e, E: PgExecutor<'e>>(executor: E, owner_id: Uuid) -> Result<Vec<Achievement>> {
    let rows = sqlx::query(&format!(
        "SELECT {COLUMNS} FROM paktiq.achievements WHERE owner_id = $1 ORDER BY earned_at"
    ))
    .bind(owner_id)
    .fetch_all(executor)
    .await?;

    rows.iter().map(from_row).collect()
}

pub async fn held_tags<'e, E: PgExecutor<'e>>(executor: E, owner_id: Uuid) -> Result<Vec<String>> {
    let tags = sqlx::query_scalar("SELECT type_tag FROM paktiq.achievements WHERE owner_id = $1")
        .bind(owner_id)
        .fetch_all(executor)
        .await?;
    Ok(tags)
}

/// Returns `None` when the owner already holds this achievement.
pub async fn award<'e, E: PgExecutor<'e>>(
    executor: E,
    owner_id: Uuid,
    badge: &NewAchievement,
) -> Result<Option<Achievement>> {
    let row = sqlx::query(&format!(
        r#"
        INSERT INTO paktiq.achievements
        (id, owner_id, type_tag, title, description, icon, metadata)
        VALUES ($1, $2, $3, $4, $5, $6, $7)
        ON CONFLICT (owner_id, type_tag) DO NOTHING
        RETURNING {COLUMNS}
        "#
    ))
    .bind(Uuid::new_v4())
    .bind(owner_id)
    .bind(&badge.type_tag)
    .bind(&badge.title)
    .bind(&badge.description)
    .bind(&badge.icon)
    .bind(&badge.metadata)
    .fetch_optional(executor)
    .await?;

    row.as_ref().map(from_row).transpose()
}
