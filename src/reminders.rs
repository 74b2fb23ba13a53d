use chrono::{Datelike, Duration, NaiveDateTime};

use crate::error::{PaktError, Result};
use crate::models::{NewReminder, Reminder, ReminderFrequency};

pub fn validate(reminder: &NewReminder) -> Result<()> {
    if let Some(day) = reminder.days_of_week.iter().find(|d| !(0..=6).contains(*d)) {
        return Err(PaktError::validation(format!(
            "day of week must be 0 (Sunday) to 6 (Saturday), got {day}"
        )));
    }
    match reminder.frequency {
        ReminderFrequency::Daily => {}
        ReminderFrequency::Weekly if reminder.days_of_week.len() != 1 => {
            return Err(PaktError::validation(
                "weekly reminders need exactly one day of the week",
            ));
        }
        ReminderFrequency::Custom if reminder.days_of_week.is_empty() => {
            return Err(PaktError::validation(
                "custom reminders need at least one day of the week",
            ));
        }
        _ => {}
    }
    Ok(())
}

/// Next time the reminder fires strictly after `after`, in the user's local time.
/// Weekly and custom reminders without a stored day never fire.
pub fn next_occurrence(reminder: &Reminder, after: NaiveDateTime) -> Option<NaiveDateTime> {
    if !reminder.enabled {
        return None;
    }

    let weekly_day = reminder.days_of_week.first().copied();

    (0..=7).find_map(|offset| {
        let day = after.date() + Duration::days(offset);
        let candidate = day.and_time(reminder.time_of_day);
        let weekday = day.weekday().num_days_from_sunday() as i16;
        let fires = match reminder.frequency {
            ReminderFrequency::Daily => true,
            ReminderFrequency::Weekly => weekly_day == Some(weekday),
            ReminderFrequency::Custom => reminder.days_of_week.contains(&weekday),
        };
        (fires && candidate > after).then_some(candidate)
    })
}

pub fn describe(reminder: &Reminder) -> String {
    const NAMES: [&str; 7] = ["Sun", "Mon", "Tue", "Wed", "Thu", "Fri", "Sat"];
    let days: Vec<&str> = reminder
        .days_of_week
        .iter()
        .filter_map(|d| NAMES.get(*d as usize).copied())
        .collect();
    let time = reminder.time_of_day.format("%H:%M");
    let state = if reminder.enabled { "" } else { " (disabled)" };

    match reminder.frequency {
        ReminderFrequency::Daily => format!("daily at {time}{state}"),
        _ => format!("{} on {} at {time}{state}", reminder.frequency, days.join(", ")),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{NaiveDate, NaiveTime};
    use uuid::Uuid;

    fn reminder(frequency: ReminderFrequency, days: Vec<i16>) -> Reminder {
        Reminder {
            id: Uuid::new_v4(),
            pakt_id: Uuid::new_v4(),
            frequency,
            time_of_day: NaiveTime::from_hms_opt(9, 0, 0).unwrap(),
            days_of_week: days,
            enabled: true,
        }
    }

    // 2026-03-11 is a Wednesday.
    fn wednesday(h: u32, m: u32) -> NaiveDateTime {
        NaiveDate::from_ymd_opt(2026, 3, 11)
            .unwrap()
            .and_hms_opt(h, m, 0)
            .unwrap()
    }

    #[test]
    fn daily_fires_today_or_tomorrow() {
        let daily = reminder(ReminderFrequency::Daily, vec![]);
        assert_eq!(next_occurrence(&daily, wednesday(8, 0)), Some(wednesday(9, 0)));
        assert_eq!(
            next_occurrence(&daily, wednesday(9, 0)),
            Some(wednesday(9, 0) + Duration::days(1))
        );
    }

    #[test]
    fn weekly_uses_first_listed_day() {
        let weekly = reminder(ReminderFrequency::Weekly, vec![1]);
        let next = next_occurrence(&weekly, wednesday(10, 0)).unwrap();
        assert_eq!(next.date(), NaiveDate::from_ymd_opt(2026, 3, 16).unwrap());
    }

    #[test]
    fn weekly_fires_on_its_day_whenever_asked() {
        let weekly = reminder(ReminderFrequency::Weekly, vec![3]);
        assert_eq!(next_occurrence(&weekly, wednesday(8, 0)), Some(wednesday(9, 0)));
        let next_week = Some(wednesday(9, 0) + Duration::days(7));
        assert_eq!(next_occurrence(&weekly, wednesday(10, 0)), next_week);
        assert_eq!(next_occurrence(&weekly, wednesday(10, 0) + Duration::days(2)), next_week);
    }

    #[test]
    fn weekly_without_a_day_never_fires() {
        let weekly = reminder(ReminderFrequency::Weekly, vec![]);
        assert_eq!(next_occurrence(&weekly, wednesday(8, 0)), None);
    }

    #[test]
    fn custom_picks_nearest_listed_day() {
        let custom = reminder(ReminderFrequency::Custom, vec![5, 2]);
        let next = next_occurrence(&custom, wednesday(10, 0)).unwrap();
        assert_eq!(next.date(), NaiveDate::from_ymd_opt(2026, 3, 13).unwrap());
    }

    #[test]
    fn disabled_or_empty_custom_never_fires() {
        let mut daily = reminder(ReminderFrequency::Daily, vec![]);
        daily.enabled = false;
        assert_eq!(next_occurrence(&daily, wednesday(8, 0)), None);

        let custom = reminder(ReminderFrequency::Custom, vec![]);
        assert_eq!(next_occurrence(&custom, wednesday(8, 0)), None);
    }

    #[test]
    fn validation_rejects_bad_days() {
        let time = NaiveTime::from_hms_opt(7, 30, 0).unwrap();
        let bad_day = NewReminder {
            frequency: ReminderFrequency::Weekly,
            time_of_day: time,
            days_of_week: vec![7],
        };
        assert!(validate(&bad_day).is_err());

        let empty_custom = NewReminder {
            frequency: ReminderFrequency::Custom,
            time_of_day: time,
            days_of_week: vec![],
        };
        assert!(validate(&empty_custom).is_err());

        let empty_weekly = NewReminder {
            frequency: ReminderFrequency::Weekly,
            time_of_day: time,
            days_of_week: vec![],
        };
        assert!(matches!(validate(&empty_weekly), Err(PaktError::Validation(_))));

        let two_day_weekly = NewReminder {
            frequency: ReminderFrequency::Weekly,
            time_of_day: time,
            days_of_week: vec![1, 4],
        };
        assert!(validate(&two_day_weekly).is_err());

        let ok = NewReminder {
            frequency: ReminderFrequency::Custom,
            time_of_day: time,
            days_of_week: vec![1, 3, 5],
        };
        assert!(validate(&ok).is_ok());
    }

    #[test]
    fn describe_names_days() {
        let custom = reminder(ReminderFrequency::Custom, vec![1, 3]);
        assert_eq!(describe(&custom), "custom on Mon, Wed at 09:00");
        assert_eq!(
            describe(&reminder(ReminderFrequency::Weekly, vec![5])),
            "weekly on Fri at 09:00"
        );
        assert_eq!(describe(&reminder(ReminderFrequency::Daily, vec![])), "daily at 09:00");
    }
}
