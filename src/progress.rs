use std::collections::{BTreeSet, HashMap};

use chrono::{DateTime, Duration, NaiveDate, NaiveTime, Utc};

use crate::models::{
    CategoryShare, Milestone, Pakt, PaktStatus, PaktWithMilestones, ProgressOverview,
};

pub fn completion_percentage(total: usize, completed: usize) -> u8 {
    if total == 0 {
        return 0;
    }
    let completed = completed.min(total);
    ((completed as f64 * 100.0 / total as f64).round()) as u8
}

pub fn pakt_completion(milestones: &[Milestone]) -> u8 {
    let completed = milestones.iter().filter(|m| m.completed).count();
    completion_percentage(milestones.len(), completed)
}

/// Whole days until `target_date` (midnight UTC), rounded up. Negative when overdue.
pub fn days_left(target_date: NaiveDate, now: DateTime<Utc>) -> i64 {
    let deadline = target_date.and_time(NaiveTime::MIN).and_utc();
    let seconds = (deadline - now).num_seconds();
    let day = 86_400;
    // ceil for both signs
    if seconds > 0 {
        (seconds + day - 1) / day
    } else {
        seconds / day
    }
}

/// Consecutive days ending today with at least one completion.
pub fn day_streak<I>(completions: I, today: NaiveDate) -> u32
where
    I: IntoIterator<Item = DateTime<Utc>>,
{
    let days: BTreeSet<NaiveDate> = completions.into_iter().map(|ts| ts.date_naive()).collect();
    let mut streak = 0;
    let mut cursor = today;
    while days.contains(&cursor) {
        streak += 1;
        cursor -= Duration::days(1);
    }
    streak
}

pub fn longest_streak<I>(completions: I) -> u32
where
    I: IntoIterator<Item = DateTime<Utc>>,
{
    let days: BTreeSet<NaiveDate> = completions.into_iter().map(|ts| ts.date_naive()).collect();
    let mut best = 0;
    let mut run = 0;
    let mut previous: Option<NaiveDate> = None;

    for day in days {
        run = match previous {
            Some(prev) if day - prev == Duration::days(1) => run + 1,
            _ => 1,
        };
        best = best.max(run);
        previous = Some(day);
    }

    best
}

/// "1 day", "3 days".
pub fn days_label(days: i64) -> String {
    if days == 1 {
        "1 day".to_string()
    } else {
        format!("{days} days")
    }
}

pub fn category_breakdown(pakts: &[Pakt]) -> Vec<CategoryShare> {
    let mut counts: HashMap<&str, usize> = HashMap::new();
    for pakt in pakts {
        *counts.entry(pakt.category.as_str()).or_insert(0) += 1;
    }

    let total = pakts.len();
    let mut shares: Vec<CategoryShare> = counts
        .into_iter()
        .map(|(category, count)| CategoryShare {
            category: category.to_string(),
            count,
            percentage: if total == 0 {
                0.0
            } else {
                count as f64 * 100.0 / total as f64
            },
        })
        .collect();

    shares.sort_by(|a, b| b.count.cmp(&a.count).then_with(|| a.category.cmp(&b.category)));
    shares
}

/// Incomplete milestones due within `window_days` of `today`, soonest first.
pub fn upcoming_milestones(
    milestones: &[Milestone],
    today: NaiveDate,
    window_days: i64,
) -> Vec<&Milestone> {
    let horizon = today + Duration::days(window_days);
    let mut upcoming: Vec<&Milestone> = milestones
        .iter()
        .filter(|m| !m.completed && m.due_date >= today && m.due_date <= horizon)
        .collect();
    upcoming.sort_by(|a, b| a.due_date.cmp(&b.due_date).then(b.importance.cmp(&a.importance)));
    upcoming
}

pub fn overdue_milestones(milestones: &[Milestone], today: NaiveDate) -> Vec<&Milestone> {
    let mut overdue: Vec<&Milestone> = milestones
        .iter()
        .filter(|m| !m.completed && m.due_date < today)
        .collect();
    overdue.sort_by(|a, b| a.due_date.cmp(&b.due_date));
    overdue
}

pub fn overview(pakts: &[PaktWithMilestones], now: DateTime<Utc>) -> ProgressOverview {
    let today = now.date_naive();
    let mut summary = ProgressOverview {
        total_pakts: pakts.len(),
        ..Default::default()
    };

    for entry in pakts {
        match entry.pakt.status {
            PaktStatus::Active => summary.active_pakts += 1,
            PaktStatus::Completed => summary.completed_pakts += 1,
            PaktStatus::Archived => summary.archived_pakts += 1,
        }
        summary.total_milestones += entry.milestones.len();
        summary.completed_milestones += entry.milestones.iter().filter(|m| m.completed).count();
        if entry.pakt.status != PaktStatus::Archived {
            summary.overdue_milestones += overdue_milestones(&entry.milestones, today).len();
        }
    }

    let completions: Vec<DateTime<Utc>> = pakts
        .iter()
        .flat_map(|entry| entry.milestones.iter().filter_map(|m| m.completed_at))
        .collect();

    summary.completion_rate =
        completion_percentage(summary.total_milestones, summary.completed_milestones);
    summary.current_streak = day_streak(completions.iter().copied(), today);
    summary.longest_streak = longest_streak(completions);
    summary
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;
    use uuid::Uuid;

    fn at(y: i32, m: u32, d: u32, h: u32) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(y, m, d, h, 0, 0).unwrap()
    }

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    fn milestone(due: NaiveDate, completed_at: Option<DateTime<Utc>>) -> Milestone {
        Milestone {
            id: Uuid::new_v4(),
            pakt_id: Uuid::nil(),
            name: "step".to_string(),
            due_date: due,
            notes: String::new(),
            importance: 3,
            completed: completed_at.is_some(),
            completed_at,
            order_index: 0,
        }
    }

    fn pakt(category: &str, status: PaktStatus) -> Pakt {
        Pakt {
            id: Uuid::new_v4(),
            owner_id: Uuid::nil(),
            name: format!("{category} pakt"),
            description: String::new(),
            target_outcome: String::new(),
            category: category.to_string(),
            target_date: date(2026, 12, 31),
            status,
            progress: 0,
            created_at: at(2026, 1, 1, 0),
            updated_at: at(2026, 1, 1, 0),
        }
    }

    #[test]
    fn zero_milestones_is_zero_percent() {
        assert_eq!(completion_percentage(0, 0), 0);
        assert_eq!(pakt_completion(&[]), 0);
    }

    #[test]
    fn percentage_matches_rounded_ratio() {
        for total in 1..=12usize {
            for completed in 0..=total {
                let expected = (100.0 * completed as f64 / total as f64).round() as u8;
                assert_eq!(completion_percentage(total, completed), expected);
            }
        }
        assert_eq!(completion_percentage(3, 1), 33);
        assert_eq!(completion_percentage(3, 2), 67);
    }

    #[test]
    fn days_left_rounds_up_and_goes_negative() {
        let now = at(2026, 3, 1, 12);
        assert_eq!(days_left(date(2026, 3, 2), now), 1);
        assert_eq!(days_left(date(2026, 3, 10), now), 9);
        assert_eq!(days_left(date(2026, 3, 1), now), 0);
        assert_eq!(days_left(date(2026, 2, 27), now), -2);
        assert_eq!(days_left(date(2026, 3, 5), at(2026, 3, 1, 0)), 4);
    }

    #[test]
    fn streak_counts_back_from_today() {
        let today = date(2026, 3, 10);
        let unbroken = vec![at(2026, 3, 10, 8), at(2026, 3, 9, 22), at(2026, 3, 8, 7)];
        assert_eq!(day_streak(unbroken, today), 3);

        let gap = vec![at(2026, 3, 10, 8), at(2026, 3, 8, 7)];
        assert_eq!(day_streak(gap, today), 1);
    }

    #[test]
    fn streak_is_zero_without_completion_today() {
        let today = date(2026, 3, 10);
        assert_eq!(day_streak(vec![at(2026, 3, 9, 8)], today), 0);
        assert_eq!(day_streak(Vec::new(), today), 0);
    }

    #[test]
    fn several_completions_on_one_day_count_once() {
        let today = date(2026, 3, 10);
        let same_day = vec![at(2026, 3, 10, 1), at(2026, 3, 10, 5), at(2026, 3, 10, 23)];
        assert_eq!(day_streak(same_day, today), 1);
    }

    #[test]
    fn longest_streak_finds_best_run() {
        let completions = vec![
            at(2026, 1, 1, 9),
            at(2026, 1, 2, 9),
            at(2026, 1, 5, 9),
            at(2026, 1, 6, 9),
            at(2026, 1, 7, 9),
            at(2026, 1, 7, 18),
        ];
        assert_eq!(longest_streak(completions), 3);
        assert_eq!(longest_streak(Vec::new()), 0);
    }

    #[test]
    fn category_breakdown_counts_and_sorts() {
        let pakts = vec![
            pakt("health", PaktStatus::Active),
            pakt("career", PaktStatus::Active),
            pakt("health", PaktStatus::Completed),
            pakt("finance", PaktStatus::Archived),
        ];
        let shares = category_breakdown(&pakts);
        assert_eq!(shares[0].category, "health");
        assert_eq!(shares[0].count, 2);
        assert!((shares[0].percentage - 50.0).abs() < f64::EPSILON);
        assert_eq!(shares[1].category, "career");
        assert_eq!(shares[2].category, "finance");
        assert!(category_breakdown(&[]).is_empty());
    }

    #[test]
    fn upcoming_and_overdue_split_on_today() {
        let today = date(2026, 3, 10);
        let milestones = vec![
            milestone(date(2026, 3, 12), None),
            milestone(date(2026, 3, 5), None),
            milestone(date(2026, 3, 11), None),
            milestone(date(2026, 4, 30), None),
            milestone(date(2026, 3, 1), Some(at(2026, 3, 1, 10))),
        ];

        let upcoming = upcoming_milestones(&milestones, today, 7);
        assert_eq!(upcoming.len(), 2);
        assert_eq!(upcoming[0].due_date, date(2026, 3, 11));

        let overdue = overdue_milestones(&milestones, today);
        assert_eq!(overdue.len(), 1);
        assert_eq!(overdue[0].due_date, date(2026, 3, 5));
    }

    #[test]
    fn overview_aggregates_everything() {
        let now = at(2026, 3, 10, 12);
        let pakts = vec![
            PaktWithMilestones {
                pakt: pakt("health", PaktStatus::Active),
                milestones: vec![
                    milestone(date(2026, 3, 1), Some(at(2026, 3, 9, 8))),
                    milestone(date(2026, 3, 2), Some(at(2026, 3, 10, 8))),
                    milestone(date(2026, 3, 3), None),
                ],
            },
            PaktWithMilestones {
                pakt: pakt("career", PaktStatus::Archived),
                milestones: vec![milestone(date(2026, 2, 1), None)],
            },
        ];

        let summary = overview(&pakts, now);
        assert_eq!(summary.total_pakts, 2);
        assert_eq!(summary.active_pakts, 1);
        assert_eq!(summary.archived_pakts, 1);
        assert_eq!(summary.total_milestones, 4);
        assert_eq!(summary.completed_milestones, 2);
        assert_eq!(summary.completion_rate, 50);
        assert_eq!(summary.overdue_milestones, 1);
        assert_eq!(summary.current_streak, 2);
        assert_eq!(summary.longest_streak, 2);
    }

    #[test]
    fn day_counts_are_pluralised() {
        assert_eq!(days_label(0), "0 days");
        assert_eq!(days_label(1), "1 day");
        assert_eq!(days_label(12), "12 days");
    }
}
