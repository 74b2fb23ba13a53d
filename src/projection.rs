use chrono::{Duration, NaiveDate};

use crate::error::{PaktError, Result};
use crate::models::{default_importance, NewMilestone};
use crate::suggestions::milestone_suggestions;

/// Fraction of the timeline, in tenths, past which suggestions are pulled in.
const CLAMP_TENTHS: i64 = 9;

/// Calendar date for a milestone suggested `suggested_week` weeks into a pakt.
///
/// Offsets beyond 90% of the timeline are clamped so the milestone never lands
/// on or after the deadline.
pub fn project_milestone_date(
    created_at: NaiveDate,
    target_date: NaiveDate,
    suggested_week: u32,
) -> Result<NaiveDate> {
    let span_days = (target_date - created_at).num_days();
    if span_days <= 0 {
        return Err(PaktError::validation(format!(
            "target date {target_date} must be after the start date {created_at}"
        )));
    }

    let requested_days = i64::from(suggested_week) * 7;
    let max_days = span_days * CLAMP_TENTHS / 10;
    let offset = requested_days.min(max_days);

    Ok(created_at + Duration::days(offset))
}

/// Drafts the category's suggested milestones against a concrete timeline.
pub fn plan_from_suggestions(
    category: &str,
    created_at: NaiveDate,
    target_date: NaiveDate,
) -> Result<Vec<NewMilestone>> {
    milestone_suggestions(category)
        .iter()
        .enumerate()
        .map(|(index, suggestion)| {
            Ok(NewMilestone {
                name: suggestion.title.to_string(),
                due_date: project_milestone_date(created_at, target_date, suggestion.suggested_week)?,
                notes: suggestion.description.to_string(),
                importance: default_importance(),
                order_index: index as i32,
            })
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    #[test]
    fn first_health_suggestion_lands_one_week_in() {
        let projected = project_milestone_date(date(2026, 1, 1), date(2026, 4, 1), 1).unwrap();
        assert_eq!(projected, date(2026, 1, 8));
    }

    #[test]
    fn weeks_past_the_deadline_are_clamped() {
        // 90 day span, clamp to 81 days.
        let projected = project_milestone_date(date(2026, 1, 1), date(2026, 4, 1), 20).unwrap();
        assert_eq!(projected, date(2026, 3, 23));
        assert!(projected < date(2026, 4, 1));
    }

    #[test]
    fn target_on_or_before_start_is_rejected() {
        let start = date(2026, 1, 1);
        assert!(matches!(
            project_milestone_date(start, start, 1),
            Err(PaktError::Validation(_))
        ));
        assert!(project_milestone_date(start, date(2025, 12, 1), 1).is_err());
    }

    #[test]
    fn one_day_timeline_stays_on_start() {
        let start = date(2026, 1, 1);
        assert_eq!(project_milestone_date(start, date(2026, 1, 2), 3).unwrap(), start);
    }

    #[test]
    fn projection_is_monotonic_in_week() {
        let start = date(2026, 1, 1);
        let target = date(2026, 12, 31);
        let mut previous = start;
        for week in 0..60 {
            let projected = project_milestone_date(start, target, week).unwrap();
            assert!(projected >= previous, "week {week} went backwards");
            assert!(projected < target);
            previous = projected;
        }
    }

    #[test]
    fn plan_keeps_suggestion_order() {
        let plan = plan_from_suggestions("health", date(2026, 1, 1), date(2026, 4, 1)).unwrap();
        assert_eq!(plan.len(), milestone_suggestions("health").len());
        assert_eq!(plan[0].name, "Initial Health Assessment");
        assert_eq!(plan[0].due_date, date(2026, 1, 8));
        assert!(plan.iter().enumerate().all(|(i, m)| m.order_index == i as i32));
        assert!(plan.iter().all(|m| m.importance == 3));
    }

    #[test]
    fn plan_rejects_inverted_timeline() {
        assert!(plan_from_suggestions("career", date(2026, 5, 1), date(2026, 4, 1)).is_err());
    }
}
