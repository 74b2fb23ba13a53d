use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, NaiveDate, NaiveTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::error::PaktError;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, clap::ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum PaktStatus {
    Active,
    Completed,
    Archived,
}

impl PaktStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            PaktStatus::Active => "active",
            PaktStatus::Completed => "completed",
            PaktStatus::Archived => "archived",
        }
    }
}

impl fmt::Display for PaktStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for PaktStatus {
    type Err = PaktError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value {
            "active" => Ok(PaktStatus::Active),
            "completed" => Ok(PaktStatus::Completed),
            "archived" => Ok(PaktStatus::Archived),
            other => Err(PaktError::validation(format!("unknown pakt status '{other}'"))),
        }
    }
}

/// A user-defined commitment with a deadline.
#[derive(Debug, Clone, Serialize)]
pub struct Pakt {
    pub id: Uuid,
    pub owner_id: Uuid,
    pub name: String,
    pub description: String,
    pub target_outcome: String,
    pub category: String,
    pub target_date: NaiveDate,
    pub status: PaktStatus,
    /// Always recomputed from milestones, 0..=100.
    pub progress: i32,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone)]
pub struct NewPakt {
    pub owner_id: Uuid,
    pub name: String,
    pub description: String,
    pub target_outcome: String,
    pub category: String,
    pub target_date: NaiveDate,
}

#[derive(Debug, Clone, Default)]
pub struct PaktUpdate {
    pub name: Option<String>,
    pub description: Option<String>,
    pub target_outcome: Option<String>,
    pub category: Option<String>,
    pub target_date: Option<NaiveDate>,
}

impl PaktUpdate {
    pub fn is_empty(&self) -> bool {
        self.name.is_none()
            && self.description.is_none()
            && self.target_outcome.is_none()
            && self.category.is_none()
            && self.target_date.is_none()
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct Milestone {
    pub id: Uuid,
    pub pakt_id: Uuid,
    pub name: String,
    pub due_date: NaiveDate,
    pub notes: String,
    /// 1 (nice to have) to 5 (critical).
    pub importance: i16,
    pub completed: bool,
    pub completed_at: Option<DateTime<Utc>>,
    pub order_index: i32,
}

impl Milestone {
    /// Flips the completion flag, stamping or clearing `completed_at`.
    pub fn toggle(&mut self, now: DateTime<Utc>) {
        self.completed = !self.completed;
        self.completed_at = if self.completed { Some(now) } else { None };
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewMilestone {
    pub name: String,
    pub due_date: NaiveDate,
    pub notes: String,
    pub importance: i16,
    pub order_index: i32,
}

pub fn default_importance() -> i16 {
    3
}

impl NewMilestone {
    pub fn validate(&self) -> Result<(), PaktError> {
        if self.name.trim().is_empty() {
            return Err(PaktError::validation("milestone name must not be empty"));
        }
        validate_importance(self.importance)
    }
}

pub fn validate_importance(importance: i16) -> Result<(), PaktError> {
    if !(1..=5).contains(&importance) {
        return Err(PaktError::validation(format!(
            "importance must be between 1 and 5, got {importance}"
        )));
    }
    Ok(())
}

#[derive(Debug, Clone, Default)]
pub struct MilestoneUpdate {
    pub name: Option<String>,
    pub due_date: Option<NaiveDate>,
    pub notes: Option<String>,
    pub importance: Option<i16>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, clap::ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum ReminderFrequency {
    Daily,
    Weekly,
    Custom,
}

impl ReminderFrequency {
    pub fn as_str(&self) -> &'static str {
        match self {
            ReminderFrequency::Daily => "daily",
            ReminderFrequency::Weekly => "weekly",
            ReminderFrequency::Custom => "custom",
        }
    }
}

impl fmt::Display for ReminderFrequency {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ReminderFrequency {
    type Err = PaktError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value {
            "daily" => Ok(ReminderFrequency::Daily),
            "weekly" => Ok(ReminderFrequency::Weekly),
            "custom" => Ok(ReminderFrequency::Custom),
            other => Err(PaktError::validation(format!(
                "unknown reminder frequency '{other}'"
            ))),
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct Reminder {
    pub id: Uuid,
    pub pakt_id: Uuid,
    pub frequency: ReminderFrequency,
    pub time_of_day: NaiveTime,
    /// 0 = Sunday .. 6 = Saturday.
    pub days_of_week: Vec<i16>,
    pub enabled: bool,
}

#[derive(Debug, Clone)]
pub struct NewReminder {
    pub frequency: ReminderFrequency,
    pub time_of_day: NaiveTime,
    pub days_of_week: Vec<i16>,
}

#[derive(Debug, Clone, Serialize)]
pub struct Achievement {
    pub id: Uuid,
    pub owner_id: Uuid,
    pub type_tag: String,
    pub title: String,
    pub description: String,
    pub icon: String,
    pub earned_at: DateTime<Utc>,
    pub metadata: serde_json::Value,
}

#[derive(Debug, Clone, PartialEq)]
pub struct NewAchievement {
    pub type_tag: String,
    pub title: String,
    pub description: String,
    pub icon: String,
    pub metadata: serde_json::Value,
}

#[derive(Debug, Clone, Serialize)]
pub struct DailyAnalytics {
    pub day: NaiveDate,
    pub milestones_completed: i32,
    pub time_spent_minutes: i32,
    pub streak_days: i32,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ActivityEvent {
    PaktCreated,
    PaktUpdated,
    PaktCompleted,
    PaktReopened,
    PaktArchived,
    MilestoneAdded,
    MilestoneCompleted,
    MilestoneReopened,
    ReminderSet,
    AchievementEarned,
}

impl ActivityEvent {
    pub fn as_str(&self) -> &'static str {
        match self {
            ActivityEvent::PaktCreated => "pakt_created",
            ActivityEvent::PaktUpdated => "pakt_updated",
            ActivityEvent::PaktCompleted => "pakt_completed",
            ActivityEvent::PaktReopened => "pakt_reopened",
            ActivityEvent::PaktArchived => "pakt_archived",
            ActivityEvent::MilestoneAdded => "milestone_added",
            ActivityEvent::MilestoneCompleted => "milestone_completed",
            ActivityEvent::MilestoneReopened => "milestone_reopened",
            ActivityEvent::ReminderSet => "reminder_set",
            ActivityEvent::AchievementEarned => "achievement_earned",
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct ActivityEntry {
    pub id: Uuid,
    pub pakt_id: Option<Uuid>,
    /// Stored as free text so older event names still load.
    pub event: String,
    pub detail: String,
    pub occurred_at: DateTime<Utc>,
}

#[derive(Debug, Clone)]
pub struct PaktWithMilestones {
    pub pakt: Pakt,
    pub milestones: Vec<Milestone>,
}

/// Everything created together when a user finishes the setup flow.
#[derive(Debug, Clone)]
pub struct NewPaktPlan {
    pub pakt: NewPakt,
    pub milestones: Vec<NewMilestone>,
    pub reminder: Option<NewReminder>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct CategoryShare {
    pub category: String,
    pub count: usize,
    pub percentage: f64,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct ProgressOverview {
    pub total_pakts: usize,
    pub active_pakts: usize,
    pub completed_pakts: usize,
    pub archived_pakts: usize,
    pub total_milestones: usize,
    pub completed_milestones: usize,
    pub overdue_milestones: usize,
    pub completion_rate: u8,
    pub current_streak: u32,
    pub longest_streak: u32,
}
