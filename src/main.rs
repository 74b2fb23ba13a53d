use std::collections::HashMap;
use std::path::PathBuf;

use anyhow::Context;
use chrono::{NaiveDate, NaiveTime, Utc};
use clap::{Parser, Subcommand};
use sqlx::postgres::PgPoolOptions;
use sqlx::PgPool;
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;
use uuid::Uuid;

mod achievements;
mod config;
mod db;
mod error;
mod flows;
mod models;
mod progress;
mod projection;
mod reminders;
mod report;
mod suggestions;

use config::Config;
use db::with_retry;
use models::{
    MilestoneUpdate, NewMilestone, NewPakt, NewPaktPlan, NewReminder, PaktStatus, PaktUpdate,
    PaktWithMilestones, ReminderFrequency,
};

#[derive(Parser)]
#[command(name = "paktiq")]
#[command(about = "Track pakts, their milestones and your progress", long_about = None)]
struct Cli {
    /// Act as this user instead of PAKTIQ_USER_ID
    #[arg(long, global = true)]
    user: Option<Uuid>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Create or upgrade the database schema
    InitDb,
    /// List the categories that have milestone suggestions
    Categories,
    /// Show suggested milestones for a category, projected onto a timeline
    Suggest {
        category: String,
        #[arg(long)]
        target: Option<NaiveDate>,
        /// Start of the timeline, defaults to today
        #[arg(long)]
        start: Option<NaiveDate>,
    },
    #[command(flatten)]
    Data(DataCommand),
}

/// Commands that act on one owner's data.
#[derive(Subcommand)]
enum DataCommand {
    /// Load a demo pakt for the current user
    Seed,
    /// Create a pakt, optionally with suggested milestones and a reminder
    Create {
        #[arg(long)]
        name: String,
        #[arg(long)]
        category: String,
        #[arg(long)]
        target: NaiveDate,
        #[arg(long, default_value = "")]
        description: String,
        #[arg(long, default_value = "")]
        outcome: String,
        /// Add the category's suggested milestones
        #[arg(long)]
        suggested: bool,
        #[arg(long, value_enum)]
        remind: Option<ReminderFrequency>,
        #[arg(long, value_parser = parse_time, default_value = "09:00")]
        at: NaiveTime,
        /// Days of week, 0 = Sunday
        #[arg(long, value_delimiter = ',')]
        days: Vec<i16>,
    },
    /// List pakts
    List {
        #[arg(long, value_enum)]
        status: Option<PaktStatus>,
        #[arg(long)]
        json: bool,
    },
    /// Show one pakt with its milestones and reminder
    Show {
        id: Uuid,
        #[arg(long)]
        json: bool,
    },
    /// Change a pakt's details
    Update {
        id: Uuid,
        #[arg(long)]
        name: Option<String>,
        #[arg(long)]
        description: Option<String>,
        #[arg(long)]
        outcome: Option<String>,
        #[arg(long)]
        category: Option<String>,
        #[arg(long)]
        target: Option<NaiveDate>,
    },
    /// Archive a pakt and silence its reminder
    Archive { id: Uuid },
    /// Delete a pakt and everything under it
    Delete { id: Uuid },
    /// Work with milestones
    #[command(subcommand)]
    Milestone(MilestoneCommand),
    /// Work with reminders
    #[command(subcommand)]
    Reminder(ReminderCommand),
    /// List earned achievements
    Achievements {
        #[arg(long)]
        json: bool,
    },
    /// Record minutes spent working on pakts today
    Track { minutes: u32 },
    /// Print progress, streaks and category breakdown
    Insights {
        /// Days of daily analytics to show
        #[arg(long, default_value_t = 14)]
        days: i64,
    },
    /// Show recent activity
    Activity {
        #[arg(long, default_value_t = 20)]
        limit: i64,
    },
    /// Generate a markdown insights report
    Report {
        #[arg(long, default_value = "insights.md")]
        out: PathBuf,
    },
    /// Import milestones into a pakt from a CSV file
    Import {
        #[arg(long)]
        pakt: Uuid,
        #[arg(long)]
        csv: PathBuf,
    },
    /// Export a pakt's milestones to CSV
    Export {
        #[arg(long)]
        pakt: Uuid,
        #[arg(long, default_value = "milestones.csv")]
        out: PathBuf,
    },
}

#[derive(Subcommand)]
enum MilestoneCommand {
    /// Add a milestone to a pakt
    Add {
        pakt: Uuid,
        #[arg(long)]
        name: String,
        #[arg(long)]
        due: NaiveDate,
        #[arg(long, default_value_t = 3)]
        importance: i16,
        #[arg(long, default_value = "")]
        notes: String,
    },
    /// Mark a milestone done, or undo it
    Toggle { id: Uuid },
    /// Change a milestone's details
    Edit {
        id: Uuid,
        #[arg(long)]
        name: Option<String>,
        #[arg(long)]
        due: Option<NaiveDate>,
        #[arg(long)]
        importance: Option<i16>,
        #[arg(long)]
        notes: Option<String>,
    },
    /// Delete a milestone
    Delete { id: Uuid },
    /// Milestones due soon
    Upcoming {
        #[arg(long, default_value_t = 7)]
        days: i64,
    },
    /// Milestones past their due date
    Overdue,
}

#[derive(Subcommand)]
enum ReminderCommand {
    /// Create or replace a pakt's reminder
    Set {
        pakt: Uuid,
        #[arg(long, value_enum)]
        frequency: ReminderFrequency,
        #[arg(long, value_parser = parse_time)]
        at: NaiveTime,
        #[arg(long, value_delimiter = ',')]
        days: Vec<i16>,
    },
    Enable { pakt: Uuid },
    Disable { pakt: Uuid },
    /// Remove a pakt's reminder
    Remove { pakt: Uuid },
    /// When each enabled reminder fires next
    Next,
}

fn parse_time(value: &str) -> Result<NaiveTime, String> {
    NaiveTime::parse_from_str(value, "%H:%M")
        .map_err(|err| format!("expected HH:MM, got '{value}': {err}"))
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let _ = dotenvy::dotenv();

    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();

    let command = match cli.command {
        Commands::Categories => {
            for category in suggestions::known_categories() {
                println!("{category}");
            }
            return Ok(());
        }
        Commands::Suggest {
            category,
            target,
            start,
        } => return print_suggestions(&category, start, target),
        Commands::InitDb => None,
        Commands::Data(command) => Some(command),
    };

    let config = Config::from_env()?;
    let pool = PgPoolOptions::new()
        .max_connections(config.max_connections)
        .connect(&config.database_url)
        .await
        .context("failed to connect to Postgres")?;

    match command {
        None => {
            db::init_db(&pool).await?;
            println!("Schema ready.");
            Ok(())
        }
        Some(command) => {
            let owner = config.owner(cli.user)?;
            run(&pool, owner, command).await
        }
    }
}

fn print_suggestions(
    category: &str,
    start: Option<NaiveDate>,
    target: Option<NaiveDate>,
) -> anyhow::Result<()> {
    if !suggestions::is_known_category(category) {
        warn!(category, "unknown category, showing generic suggestions");
    }
    let start = start.unwrap_or_else(|| Utc::now().date_naive());

    for suggestion in suggestions::milestone_suggestions(category) {
        match target {
            Some(target) => {
                let due = projection::project_milestone_date(start, target, suggestion.suggested_week)?;
                println!("- {} (week {}, {due}): {}", suggestion.title, suggestion.suggested_week, suggestion.description);
            }
            None => println!(
                "- {} (week {}): {}",
                suggestion.title, suggestion.suggested_week, suggestion.description
            ),
        }
    }
    Ok(())
}

async fn run(pool: &PgPool, owner: Uuid, command: DataCommand) -> anyhow::Result<()> {
    match command {
        DataCommand::Seed => {
            if db::seed(pool, owner).await? {
                println!("Seed data inserted.");
            } else {
                println!("Seed data already present.");
            }
        }
        DataCommand::Create {
            name,
            category,
            target,
            description,
            outcome,
            suggested,
            remind,
            at,
            days,
        } => {
            if !suggestions::is_known_category(&category) {
                warn!(category = %category, "category has no dedicated suggestions");
            }
            let today = Utc::now().date_naive();
            let milestones = if suggested {
                projection::plan_from_suggestions(&category, today, target)?
            } else {
                Vec::new()
            };
            let plan = NewPaktPlan {
                pakt: NewPakt {
                    owner_id: owner,
                    name,
                    description,
                    target_outcome: outcome,
                    category,
                    target_date: target,
                },
                milestones,
                reminder: remind.map(|frequency| NewReminder {
                    frequency,
                    time_of_day: at,
                    days_of_week: days,
                }),
            };

            let created = flows::create_pakt_plan(pool, plan).await?;
            println!(
                "Created pakt {} ({}) with {} milestones.",
                created.pakt.name,
                created.pakt.id,
                created.milestones.len()
            );
            if let Some(reminder) = &created.reminder {
                println!("Reminder: {}", reminders::describe(reminder));
            }
        }
        DataCommand::List { status, json } => {
            let pakts = with_retry("list pakts", || db::pakts::list(pool, owner, status)).await?;
            if json {
                println!("{}", serde_json::to_string_pretty(&pakts)?);
                return Ok(());
            }
            if pakts.is_empty() {
                println!("No pakts found.");
                return Ok(());
            }
            let now = Utc::now();
            for pakt in pakts {
                println!(
                    "- {} [{}] {} ({}) {}% done, {} left",
                    pakt.id,
                    pakt.status,
                    pakt.name,
                    pakt.category,
                    pakt.progress,
                    progress::days_label(progress::days_left(pakt.target_date, now))
                );
            }
        }
        DataCommand::Show { id, json } => {
            let pakt = with_retry("get pakt", || db::pakts::get(pool, owner, id)).await?;
            let milestones =
                with_retry("list milestones", || db::milestones::list_for_pakt(pool, pakt.id)).await?;
            let reminder = db::reminders::get_for_pakt(pool, pakt.id).await?;

            if json {
                let body = serde_json::json!({
                    "pakt": pakt,
                    "milestones": milestones,
                    "reminder": reminder,
                });
                println!("{}", serde_json::to_string_pretty(&body)?);
                return Ok(());
            }

            println!("{} [{}]", pakt.name, pakt.status);
            println!("Category: {}", pakt.category);
            if !pakt.description.is_empty() {
                println!("Description: {}", pakt.description);
            }
            if !pakt.target_outcome.is_empty() {
                println!("Outcome: {}", pakt.target_outcome);
            }
            println!(
                "Target: {} ({} left), {}% complete",
                pakt.target_date,
                progress::days_label(progress::days_left(pakt.target_date, Utc::now())),
                progress::pakt_completion(&milestones)
            );
            match reminder {
                Some(reminder) => println!("Reminder: {}", reminders::describe(&reminder)),
                None => println!("Reminder: none"),
            }
            println!("Milestones:");
            if milestones.is_empty() {
                println!("  none yet");
            }
            for milestone in milestones {
                let mark = if milestone.completed { "x" } else { " " };
                println!(
                    "  [{mark}] {} due {} (importance {}) {}",
                    milestone.name, milestone.due_date, milestone.importance, milestone.id
                );
            }
        }
        DataCommand::Update {
            id,
            name,
            description,
            outcome,
            category,
            target,
        } => {
            let changes = PaktUpdate {
                name,
                description,
                target_outcome: outcome,
                category,
                target_date: target,
            };
            let pakt = flows::update_pakt(pool, owner, id, &changes).await?;
            println!("Updated {} ({}).", pakt.name, pakt.id);
        }
        DataCommand::Archive { id } => {
            let pakt = flows::archive_pakt(pool, owner, id).await?;
            println!("Archived {}.", pakt.name);
        }
        DataCommand::Delete { id } => {
            db::pakts::delete(pool, owner, id).await?;
            info!(pakt_id = %id, "pakt deleted");
            println!("Deleted pakt {id}.");
        }
        DataCommand::Milestone(command) => run_milestone(pool, owner, command).await?,
        DataCommand::Reminder(command) => run_reminder(pool, owner, command).await?,
        DataCommand::Achievements { json } => {
            let earned = with_retry("list achievements", || db::achievements::list(pool, owner)).await?;
            if json {
                println!("{}", serde_json::to_string_pretty(&earned)?);
                return Ok(());
            }
            if earned.is_empty() {
                println!("No achievements yet.");
            }
            for achievement in earned {
                println!(
                    "- [{}] {}: {} ({})",
                    achievement.icon,
                    achievement.title,
                    achievement.description,
                    achievement.earned_at.date_naive()
                );
            }
        }
        DataCommand::Insights { days } => {
            let now = Utc::now();
            let pakts = load_pakts_with_milestones(pool, owner).await?;
            let overview = progress::overview(&pakts, now);
            let plain: Vec<_> = pakts.iter().map(|p| p.pakt.clone()).collect();

            println!(
                "Pakts: {} total, {} active, {} completed, {} archived",
                overview.total_pakts,
                overview.active_pakts,
                overview.completed_pakts,
                overview.archived_pakts
            );
            println!(
                "Milestones: {}/{} done ({}%), {} overdue",
                overview.completed_milestones,
                overview.total_milestones,
                overview.completion_rate,
                overview.overdue_milestones
            );
            println!(
                "Streak: {} (best {})",
                progress::days_label(overview.current_streak.into()),
                progress::days_label(overview.longest_streak.into())
            );
            println!("Categories:");
            for share in progress::category_breakdown(&plain) {
                println!("  {}: {} ({:.0}%)", share.category, share.count, share.percentage);
            }

            let since = now.date_naive() - chrono::Duration::days(days.max(1));
            let daily = db::analytics::list(pool, owner, since).await?;
            if !daily.is_empty() {
                println!("Daily:");
                for day in daily {
                    println!(
                        "  {}: {} completed, {} min, streak {}",
                        day.day, day.milestones_completed, day.time_spent_minutes, day.streak_days
                    );
                }
            }
        }
        DataCommand::Track { minutes } => {
            let today = Utc::now().date_naive();
            db::analytics::add_time_spent(pool, owner, today, minutes).await?;
            println!("Logged {minutes} minutes for {today}.");
        }
        DataCommand::Activity { limit } => {
            let entries = db::activity::recent(pool, owner, limit.max(1)).await?;
            if entries.is_empty() {
                println!("No activity recorded.");
            }
            for entry in entries {
                println!(
                    "{} {:<20} {}",
                    entry.occurred_at.format("%Y-%m-%d %H:%M"),
                    entry.event,
                    entry.detail
                );
            }
        }
        DataCommand::Report { out } => {
            let pakts = load_pakts_with_milestones(pool, owner).await?;
            let achievements = db::achievements::list(pool, owner).await?;
            let activity = db::activity::recent(pool, owner, 10).await?;
            let report = report::build_report(
                &report::Insights {
                    pakts: &pakts,
                    achievements: &achievements,
                    activity: &activity,
                },
                Utc::now(),
            );
            std::fs::write(&out, report)?;
            println!("Report written to {}.", out.display());
        }
        DataCommand::Import { pakt, csv } => {
            let imported = db::transfer::import_milestones_csv(pool, owner, pakt, &csv).await?;
            println!(
                "Imported {} milestones from {}; pakt now {}% complete ({}).",
                imported.milestones.len(),
                csv.display(),
                imported.pakt.progress,
                imported.pakt.status
            );
        }
        DataCommand::Export { pakt, out } => {
            let written = db::transfer::export_milestones_csv(pool, owner, pakt, &out).await?;
            println!("Exported {written} milestones to {}.", out.display());
        }
    }

    Ok(())
}

async fn run_milestone(pool: &PgPool, owner: Uuid, command: MilestoneCommand) -> anyhow::Result<()> {
    match command {
        MilestoneCommand::Add {
            pakt,
            name,
            due,
            importance,
            notes,
        } => {
            let draft = NewMilestone {
                name,
                due_date: due,
                notes,
                importance,
                order_index: 0,
            };
            let added = flows::add_milestone(pool, owner, pakt, draft).await?;
            println!(
                "Added milestone {} ({}); pakt now {}% complete ({}).",
                added.milestone.name, added.milestone.id, added.pakt.progress, added.pakt.status
            );
        }
        MilestoneCommand::Toggle { id } => {
            let outcome = flows::toggle_milestone(pool, owner, id, Utc::now()).await?;
            let state = if outcome.milestone.completed { "done" } else { "open" };
            println!(
                "{} is now {state}; pakt at {}% ({}).",
                outcome.milestone.name, outcome.pakt.progress, outcome.pakt.status
            );
            for achievement in outcome.pakt.earned {
                println!("Achievement unlocked: {} - {}", achievement.title, achievement.description);
            }
        }
        MilestoneCommand::Edit {
            id,
            name,
            due,
            importance,
            notes,
        } => {
            let changes = MilestoneUpdate {
                name,
                due_date: due,
                notes,
                importance,
            };
            let milestone = db::milestones::update(pool, owner, id, &changes).await?;
            println!("Updated milestone {}.", milestone.name);
        }
        MilestoneCommand::Delete { id } => {
            let refreshed = flows::delete_milestone(pool, owner, id).await?;
            println!(
                "Deleted milestone {id}; pakt now {}% complete ({}).",
                refreshed.progress, refreshed.status
            );
            for achievement in refreshed.earned {
                println!("Achievement unlocked: {} - {}", achievement.title, achievement.description);
            }
        }
        MilestoneCommand::Upcoming { days } => {
            let today = Utc::now().date_naive();
            let due = with_retry("upcoming milestones", || {
                db::milestones::upcoming(pool, owner, today, days.max(0))
            })
            .await?;
            if due.is_empty() {
                println!("Nothing due in the next {}.", progress::days_label(days));
            }
            for milestone in due {
                println!(
                    "- {} due {} (importance {}) {}",
                    milestone.name, milestone.due_date, milestone.importance, milestone.id
                );
            }
        }
        MilestoneCommand::Overdue => {
            let today = Utc::now().date_naive();
            let late = with_retry("overdue milestones", || db::milestones::overdue(pool, owner, today)).await?;
            if late.is_empty() {
                println!("Nothing overdue.");
            }
            for milestone in late {
                println!(
                    "- {} was due {} ({} ago) {}",
                    milestone.name,
                    milestone.due_date,
                    progress::days_label((today - milestone.due_date).num_days()),
                    milestone.id
                );
            }
        }
    }
    Ok(())
}

async fn run_reminder(pool: &PgPool, owner: Uuid, command: ReminderCommand) -> anyhow::Result<()> {
    match command {
        ReminderCommand::Set {
            pakt,
            frequency,
            at,
            days,
        } => {
            let schedule = NewReminder {
                frequency,
                time_of_day: at,
                days_of_week: days,
            };
            let reminder = flows::set_reminder(pool, owner, pakt, &schedule).await?;
            println!("Reminder set: {}.", reminders::describe(&reminder));
        }
        ReminderCommand::Enable { pakt } => {
            let reminder = db::reminders::set_enabled(pool, owner, pakt, true).await?;
            println!("Reminder enabled: {}.", reminders::describe(&reminder));
        }
        ReminderCommand::Disable { pakt } => {
            db::reminders::set_enabled(pool, owner, pakt, false).await?;
            println!("Reminder disabled.");
        }
        ReminderCommand::Remove { pakt } => {
            db::reminders::delete(pool, owner, pakt).await?;
            println!("Reminder removed.");
        }
        ReminderCommand::Next => {
            let enabled = db::reminders::list_enabled(pool, owner).await?;
            if enabled.is_empty() {
                println!("No enabled reminders.");
            }
            let now = chrono::Local::now().naive_local();
            for (pakt_name, reminder) in enabled {
                match reminders::next_occurrence(&reminder, now) {
                    Some(next) => println!("- {pakt_name}: {}", next.format("%a %Y-%m-%d %H:%M")),
                    None => println!("- {pakt_name}: never"),
                }
            }
        }
    }
    Ok(())
}

async fn load_pakts_with_milestones(pool: &PgPool, owner: Uuid) -> anyhow::Result<Vec<PaktWithMilestones>> {
    let pakts = with_retry("list pakts", || db::pakts::list(pool, owner, None)).await?;
    let milestones = with_retry("list milestones", || db::milestones::list_for_owner(pool, owner)).await?;

    let mut by_pakt: HashMap<Uuid, Vec<models::Milestone>> = HashMap::new();
    for milestone in milestones {
        by_pakt.entry(milestone.pakt_id).or_default().push(milestone);
    }

    Ok(pakts
        .into_iter()
        .map(|pakt| PaktWithMilestones {
            milestones: by_pakt.remove(&pakt.id).unwrap_or_default(),
            pakt,
        })
        .collect())
}
