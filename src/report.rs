use std::fmt::Write;

use chrono::{DateTime, Utc};

use crate::models::{Achievement, ActivityEntry, PaktStatus, PaktWithMilestones};
use crate::progress;

pub struct Insights<'a> {
    pub pakts: &'a [PaktWithMilestones],
    pub achievements: &'a [Achievement],
    pub activity: &'a [ActivityEntry],
}

pub fn build_report(insights: &Insights<'_>, now: DateTime<Utc>) -> String {
    let today = now.date_naive();
    let overview = progress::overview(insights.pakts, now);
    let plain: Vec<_> = insights.pakts.iter().map(|p| p.pakt.clone()).collect();
    let shares = progress::category_breakdown(&plain);

    let mut output = String::new();

    let _ = writeln!(output, "# PaktIQ Insights");
    let _ = writeln!(output, "Generated on {today}");
    let _ = writeln!(output);
    let _ = writeln!(output, "## Overview");
    let _ = writeln!(
        output,
        "- Pakts: {} active, {} completed, {} archived",
        overview.active_pakts, overview.completed_pakts, overview.archived_pakts
    );
    let _ = writeln!(
        output,
        "- Milestones: {}/{} done ({}%), {} overdue",
        overview.completed_milestones,
        overview.total_milestones,
        overview.completion_rate,
        overview.overdue_milestones
    );
    let _ = writeln!(
        output,
        "- Streak: {} (best {})",
        progress::days_label(overview.current_streak.into()),
        progress::days_label(overview.longest_streak.into())
    );

    let _ = writeln!(output);
    let _ = writeln!(output, "## Active Pakts");
    let active: Vec<&PaktWithMilestones> = insights
        .pakts
        .iter()
        .filter(|p| p.pakt.status == PaktStatus::Active)
        .collect();

    if active.is_empty() {
        let _ = writeln!(output, "No active pakts.");
    } else {
        for entry in active {
            let days = progress::days_left(entry.pakt.target_date, now);
            let when = if days < 0 {
                format!("{} overdue", progress::days_label(-days))
            } else {
                format!("{} left", progress::days_label(days))
            };
            let _ = writeln!(
                output,
                "- {} ({}): {}% complete, {}",
                entry.pakt.name,
                entry.pakt.category,
                progress::pakt_completion(&entry.milestones),
                when
            );
        }
    }

    let _ = writeln!(output);
    let _ = writeln!(output, "## Category Mix");
    if shares.is_empty() {
        let _ = writeln!(output, "No pakts yet.");
    } else {
        for share in &shares {
            let _ = writeln!(
                output,
                "- {}: {} pakts ({:.0}%)",
                share.category, share.count, share.percentage
            );
        }
    }

    let live: Vec<_> = insights
        .pakts
        .iter()
        .filter(|p| p.pakt.status == PaktStatus::Active)
        .flat_map(|p| p.milestones.iter().cloned())
        .collect();

    let _ = writeln!(output);
    let _ = writeln!(output, "## Next 7 Days");
    let upcoming = progress::upcoming_milestones(&live, today, 7);
    if upcoming.is_empty() {
        let _ = writeln!(output, "Nothing due this week.");
    } else {
        for milestone in upcoming {
            let _ = writeln!(
                output,
                "- {} due {} (importance {})",
                milestone.name, milestone.due_date, milestone.importance
            );
        }
    }

    let overdue = progress::overdue_milestones(&live, today);
    if !overdue.is_empty() {
        let _ = writeln!(output);
        let _ = writeln!(output, "## Overdue");
        for milestone in overdue {
            let _ = writeln!(output, "- {} (was due {})", milestone.name, milestone.due_date);
        }
    }

    let _ = writeln!(output);
    let _ = writeln!(output, "## Achievements");
    if insights.achievements.is_empty() {
        let _ = writeln!(output, "No achievements yet.");
    } else {
        for achievement in insights.achievements {
            let _ = writeln!(
                output,
                "- {}: {} (earned {})",
                achievement.title,
                achievement.description,
                achievement.earned_at.date_naive()
            );
        }
    }

    let _ = writeln!(output);
    let _ = writeln!(output, "## Recent Activity");
    if insights.activity.is_empty() {
        let _ = writeln!(output, "No activity recorded.");
    } else {
        for entry in insights.activity.iter().take(10) {
            let _ = writeln!(
                output,
                "- {} {}: {}",
                entry.occurred_at.format("%Y-%m-%d %H:%M"),
                entry.event,
                entry.detail
            );
        }
    }

    output
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{Milestone, Pakt};
    use chrono::{NaiveDate, TimeZone};
    use uuid::Uuid;

    fn sample(now: DateTime<Utc>) -> Vec<PaktWithMilestones> {
        let pakt_id = Uuid::new_v4();
        let pakt = Pakt {
            id: pakt_id,
            owner_id: Uuid::nil(),
            name: "Learn Spanish".to_string(),
            description: String::new(),
            target_outcome: "Hold a 10 minute conversation".to_string(),
            category: "learning".to_string(),
            target_date: NaiveDate::from_ymd_opt(2026, 3, 20).unwrap(),
            status: PaktStatus::Active,
            progress: 50,
            created_at: now,
            updated_at: now,
        };
        let step = |name: &str, due: NaiveDate, done: bool| Milestone {
            id: Uuid::new_v4(),
            pakt_id,
            name: name.to_string(),
            due_date: due,
            notes: String::new(),
            importance: 3,
            completed: done,
            completed_at: done.then_some(now),
            order_index: 0,
        };
        vec![PaktWithMilestones {
            pakt,
            milestones: vec![
                step("Choose Resources", NaiveDate::from_ymd_opt(2026, 3, 1).unwrap(), true),
                step("Finish the Fundamentals", NaiveDate::from_ymd_opt(2026, 3, 12).unwrap(), false),
                step("Old homework", NaiveDate::from_ymd_opt(2026, 3, 5).unwrap(), false),
                step("Practice project", NaiveDate::from_ymd_opt(2026, 3, 6).unwrap(), true),
            ],
        }]
    }

    #[test]
    fn report_lists_sections() {
        let now = Utc.with_ymd_and_hms(2026, 3, 10, 12, 0, 0).unwrap();
        let pakts = sample(now);
        let report = build_report(
            &Insights {
                pakts: &pakts,
                achievements: &[],
                activity: &[],
            },
            now,
        );

        assert!(report.starts_with("# PaktIQ Insights"));
        assert!(report.contains("- Milestones: 2/4 done (50%), 1 overdue"));
        assert!(report.contains("- Streak: 1 day (best 1 day)"));
        assert!(report.contains("- Learn Spanish (learning): 50% complete, 10 days left"));
        assert!(report.contains("- learning: 1 pakts (100%)"));
        assert!(report.contains("- Finish the Fundamentals due 2026-03-12"));
        assert!(report.contains("- Old homework (was due 2026-03-05)"));
        assert!(report.contains("No achievements yet."));
    }

    #[test]
    fn empty_report_has_placeholders() {
        let now = Utc.with_ymd_and_hms(2026, 3, 10, 12, 0, 0).unwrap();
        let report = build_report(
            &Insights {
                pakts: &[],
                achievements: &[],
                activity: &[],
            },
            now,
        );
        assert!(report.contains("No active pakts."));
        assert!(report.contains("No pakts yet."));
        assert!(report.contains("Nothing due this week."));
        assert!(!report.contains("## Overdue"));
    }
}
