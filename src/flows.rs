//! Multi-table operations that must succeed or fail as a whole.

use chrono::{DateTime, Utc};
use sqlx::PgPool;
use tracing::{debug, info};
use uuid::Uuid;

use crate::achievements::earned_achievements;
use crate::db::{achievements, activity, analytics, milestones, pakts, reminders};
use crate::error::{PaktError, Result};
use crate::models::{
    Achievement, ActivityEvent, Milestone, NewMilestone, NewPaktPlan, NewReminder, Pakt,
    PaktStatus, PaktUpdate, Reminder,
};
use crate::progress::{completion_percentage, day_streak};

#[derive(Debug)]
pub struct CreatedPlan {
    pub pakt: Pakt,
    pub milestones: Vec<Milestone>,
    pub reminder: Option<Reminder>,
}

/// Where a pakt stands after its set of milestones changed.
#[derive(Debug)]
pub struct PaktRefresh {
    pub progress: u8,
    pub status: PaktStatus,
    pub earned: Vec<Achievement>,
}

#[derive(Debug)]
pub struct MilestoneOutcome {
    pub milestone: Milestone,
    pub pakt: PaktRefresh,
}

#[derive(Debug)]
pub struct ImportOutcome {
    pub milestones: Vec<Milestone>,
    pub pakt: PaktRefresh,
}

/// Validates everything a plan contains before any row is written.
pub fn validate_plan(plan: &NewPaktPlan, today: chrono::NaiveDate) -> Result<()> {
    pakts::validate(&plan.pakt)?;
    if plan.pakt.target_date <= today {
        return Err(PaktError::validation(format!(
            "target date {} must be in the future",
            plan.pakt.target_date
        )));
    }
    for draft in &plan.milestones {
        draft.validate()?;
    }
    if let Some(reminder) = &plan.reminder {
        crate::reminders::validate(reminder)?;
    }
    Ok(())
}

/// Creates a pakt with its milestones and reminder in a single transaction.
pub async fn create_pakt_plan(pool: &PgPool, plan: NewPaktPlan) -> Result<CreatedPlan> {
    validate_plan(&plan, Utc::now().date_naive())?;

    let mut tx = pool.begin().await?;

    let pakt = pakts::insert(&mut *tx, &plan.pakt).await?;

    let mut created = Vec::with_capacity(plan.milestones.len());
    for draft in &plan.milestones {
        created.push(milestones::insert(&mut *tx, pakt.id, draft).await?);
    }

    let reminder = match &plan.reminder {
        Some(schedule) => Some(reminders::upsert(&mut *tx, pakt.id, schedule).await?),
        None => None,
    };

    activity::log(
        &mut *tx,
        pakt.owner_id,
        Some(pakt.id),
        ActivityEvent::PaktCreated,
        &format!("{} ({} milestones)", pakt.name, created.len()),
    )
    .await?;

    tx.commit().await?;

    info!(
        pakt_id = %pakt.id,
        milestones = created.len(),
        reminder = reminder.is_some(),
        "pakt created"
    );

    Ok(CreatedPlan {
        pakt,
        milestones: created,
        reminder,
    })
}

/// Flips a milestone and brings progress, status, analytics and achievements in line.
pub async fn toggle_milestone(
    pool: &PgPool,
    owner_id: Uuid,
    milestone_id: Uuid,
    now: DateTime<Utc>,
) -> Result<MilestoneOutcome> {
    let mut tx = pool.begin().await?;

    let mut milestone = milestones::get(&mut *tx, owner_id, milestone_id).await?;
    let previous_completion = milestone.completed_at;
    milestone.toggle(now);
    let milestone =
        milestones::set_completion(&mut *tx, milestone.id, milestone.completed, milestone.completed_at)
            .await?;

    let pakt = pakts::get(&mut *tx, owner_id, milestone.pakt_id).await?;

    let today = now.date_naive();
    if milestone.completed {
        activity::log(&mut *tx, owner_id, Some(pakt.id), ActivityEvent::MilestoneCompleted, &milestone.name)
            .await?;
        let completions = milestones::completion_times(&mut *tx, owner_id).await?;
        analytics::record_completion(&mut *tx, owner_id, today, day_streak(completions, today)).await?;
    } else {
        activity::log(&mut *tx, owner_id, Some(pakt.id), ActivityEvent::MilestoneReopened, &milestone.name)
            .await?;
        if let Some(previous) = previous_completion {
            analytics::record_reopen(&mut *tx, owner_id, previous.date_naive()).await?;
        }
    }

    let mut refreshed = refresh_pakt(&mut tx, &pakt).await?;
    if milestone.completed {
        // Milestone badges; a no-op when the refresh already awarded them.
        refreshed.earned.extend(award_achievements(&mut tx, owner_id).await?);
    }

    tx.commit().await?;

    debug!(
        milestone_id = %milestone.id,
        completed = milestone.completed,
        progress = refreshed.progress,
        "milestone toggled"
    );

    Ok(MilestoneOutcome {
        milestone,
        pakt: refreshed,
    })
}

async fn award_achievements(
    tx: &mut sqlx::Transaction<'_, sqlx::Postgres>,
    owner_id: Uuid,
) -> Result<Vec<Achievement>> {
    let completed_milestones = milestones::completed_count(&mut **tx, owner_id).await?;
    let completed_pakts = pakts::count_by_status(&mut **tx, owner_id, PaktStatus::Completed).await?;
    let held = achievements::held_tags(&mut **tx, owner_id).await?;

    let mut earned = Vec::new();
    for badge in earned_achievements(completed_milestones as u32, completed_pakts as u32, &held) {
        if let Some(achievement) = achievements::award(&mut **tx, owner_id, &badge).await? {
            activity::log(&mut **tx, owner_id, None, ActivityEvent::AchievementEarned, &achievement.title)
                .await?;
            info!(owner = %owner_id, achievement = %achievement.type_tag, "achievement earned");
            earned.push(achievement);
        }
    }
    Ok(earned)
}

/// Adds one milestone to an existing pakt and refreshes its progress and status.
pub async fn add_milestone(
    pool: &PgPool,
    owner_id: Uuid,
    pakt_id: Uuid,
    draft: NewMilestone,
) -> Result<MilestoneOutcome> {
    let mut tx = pool.begin().await?;
    let pakt = pakts::get(&mut *tx, owner_id, pakt_id).await?;

    let next_index = milestones::next_order_index(&mut *tx, pakt.id).await?;

    let milestone = milestones::insert(
        &mut *tx,
        pakt.id,
        &NewMilestone {
            order_index: next_index,
            ..draft
        },
    )
    .await?;

    activity::log(&mut *tx, owner_id, Some(pakt.id), ActivityEvent::MilestoneAdded, &milestone.name)
        .await?;
    let refreshed = refresh_pakt(&mut tx, &pakt).await?;
    tx.commit().await?;

    Ok(MilestoneOutcome {
        milestone,
        pakt: refreshed,
    })
}

/// Appends a batch of milestones to a pakt, all or nothing.
pub async fn import_milestones(
    pool: &PgPool,
    owner_id: Uuid,
    pakt_id: Uuid,
    drafts: &[NewMilestone],
) -> Result<ImportOutcome> {
    let mut tx = pool.begin().await?;
    let pakt = pakts::get(&mut *tx, owner_id, pakt_id).await?;

    let created = milestones::create_batch(&mut tx, pakt.id, drafts).await?;
    for milestone in &created {
        activity::log(&mut *tx, owner_id, Some(pakt.id), ActivityEvent::MilestoneAdded, &milestone.name)
            .await?;
    }
    let refreshed = refresh_pakt(&mut tx, &pakt).await?;
    tx.commit().await?;

    info!(pakt_id = %pakt.id, imported = created.len(), "milestones imported");
    Ok(ImportOutcome {
        milestones: created,
        pakt: refreshed,
    })
}

/// Removes a milestone and refreshes the parent pakt's progress and status.
pub async fn delete_milestone(pool: &PgPool, owner_id: Uuid, milestone_id: Uuid) -> Result<PaktRefresh> {
    let mut tx = pool.begin().await?;
    let pakt_id = milestones::delete(&mut *tx, owner_id, milestone_id).await?;
    let pakt = pakts::get(&mut *tx, owner_id, pakt_id).await?;
    let refreshed = refresh_pakt(&mut tx, &pakt).await?;
    tx.commit().await?;
    Ok(refreshed)
}

/// Recomputes progress from the pakt's milestones and moves it between
/// active and completed to match. Archived pakts keep their status.
async fn refresh_pakt(
    tx: &mut sqlx::Transaction<'_, sqlx::Postgres>,
    pakt: &Pakt,
) -> Result<PaktRefresh> {
    let (total, done) = milestones::counts_for_pakt(&mut **tx, pakt.id).await?;
    let progress = completion_percentage(total as usize, done as usize);
    pakts::set_progress(&mut **tx, pakt.id, progress).await?;

    let all_done = total > 0 && done == total;
    let status = match (pakt.status, all_done) {
        (PaktStatus::Active, true) => {
            pakts::set_status(&mut **tx, pakt.owner_id, pakt.id, PaktStatus::Completed).await?;
            activity::log(&mut **tx, pakt.owner_id, Some(pakt.id), ActivityEvent::PaktCompleted, &pakt.name)
                .await?;
            PaktStatus::Completed
        }
        (PaktStatus::Completed, false) => {
            pakts::set_status(&mut **tx, pakt.owner_id, pakt.id, PaktStatus::Active).await?;
            activity::log(&mut **tx, pakt.owner_id, Some(pakt.id), ActivityEvent::PaktReopened, &pakt.name)
                .await?;
            PaktStatus::Active
        }
        (status, _) => status,
    };

    let earned = if status == PaktStatus::Completed && pakt.status != PaktStatus::Completed {
        award_achievements(tx, pakt.owner_id).await?
    } else {
        Vec::new()
    };

    Ok(PaktRefresh {
        progress,
        status,
        earned,
    })
}

pub async fn archive_pakt(pool: &PgPool, owner_id: Uuid, pakt_id: Uuid) -> Result<Pakt> {
    let mut tx = pool.begin().await?;
    let pakt = pakts::set_status(&mut *tx, owner_id, pakt_id, PaktStatus::Archived).await?;
    reminders::disable_for_pakt(&mut *tx, pakt.id).await?;
    activity::log(&mut *tx, owner_id, Some(pakt.id), ActivityEvent::PaktArchived, &pakt.name).await?;
    tx.commit().await?;
    Ok(pakt)
}

pub async fn update_pakt(
    pool: &PgPool,
    owner_id: Uuid,
    pakt_id: Uuid,
    changes: &PaktUpdate,
) -> Result<Pakt> {
    if changes.is_empty() {
        return pakts::get(pool, owner_id, pakt_id).await;
    }

    let mut tx = pool.begin().await?;
    let pakt = pakts::update(&mut *tx, owner_id, pakt_id, changes).await?;
    activity::log(&mut *tx, owner_id, Some(pakt.id), ActivityEvent::PaktUpdated, &pakt.name).await?;
    tx.commit().await?;
    Ok(pakt)
}

pub async fn set_reminder(
    pool: &PgPool,
    owner_id: Uuid,
    pakt_id: Uuid,
    schedule: &NewReminder,
) -> Result<Reminder> {
    let mut tx = pool.begin().await?;
    let pakt = pakts::get(&mut *tx, owner_id, pakt_id).await?;
    let reminder = reminders::upsert(&mut *tx, pakt.id, schedule).await?;
    activity::log(
        &mut *tx,
        owner_id,
        Some(pakt.id),
        ActivityEvent::ReminderSet,
        &crate::reminders::describe(&reminder),
    )
    .await?;
    tx.commit().await?;
    Ok(reminder)
}
