use serde_json::json;

use crate::models::NewAchievement;

pub const MILESTONE_THRESHOLDS: [u32; 5] = [1, 10, 25, 50, 100];
pub const PAKT_THRESHOLDS: [u32; 4] = [1, 5, 10, 25];

fn milestone_badge(threshold: u32) -> NewAchievement {
    let (title, icon) = match threshold {
        1 => ("First Step", "footprints"),
        10 => ("Momentum", "rocket"),
        25 => ("Committed", "flame"),
        50 => ("Unstoppable", "mountain"),
        _ => ("Centurion", "crown"),
    };
    NewAchievement {
        type_tag: format!("milestones_{threshold}"),
        title: title.to_string(),
        description: if threshold == 1 {
            "Completed your first milestone".to_string()
        } else {
            format!("Completed {threshold} milestones")
        },
        icon: icon.to_string(),
        metadata: json!({ "kind": "milestones", "threshold": threshold }),
    }
}

fn pakt_badge(threshold: u32) -> NewAchievement {
    let (title, icon) = match threshold {
        1 => ("Promise Kept", "handshake"),
        5 => ("Goal Getter", "target"),
        10 => ("Closer", "trophy"),
        _ => ("Legend", "star"),
    };
    NewAchievement {
        type_tag: format!("pakts_{threshold}"),
        title: title.to_string(),
        description: if threshold == 1 {
            "Completed your first pakt".to_string()
        } else {
            format!("Completed {threshold} pakts")
        },
        icon: icon.to_string(),
        metadata: json!({ "kind": "pakts", "threshold": threshold }),
    }
}

/// Achievements unlocked by the given totals that the user does not hold yet.
pub fn earned_achievements(
    completed_milestones: u32,
    completed_pakts: u32,
    already_held: &[String],
) -> Vec<NewAchievement> {
    let milestones = MILESTONE_THRESHOLDS
        .iter()
        .filter(|&&t| completed_milestones >= t)
        .map(|&t| milestone_badge(t));
    let pakts = PAKT_THRESHOLDS
        .iter()
        .filter(|&&t| completed_pakts >= t)
        .map(|&t| pakt_badge(t));

    milestones
        .chain(pakts)
        .filter(|badge| !already_held.iter().any(|tag| *tag == badge.type_tag))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn tags(badges: &[NewAchievement]) -> Vec<&str> {
        badges.iter().map(|b| b.type_tag.as_str()).collect()
    }

    #[test]
    fn nothing_before_first_completion() {
        assert!(earned_achievements(0, 0, &[]).is_empty());
    }

    #[test]
    fn crossing_thresholds_unlocks_every_lower_tier() {
        let badges = earned_achievements(26, 5, &[]);
        assert_eq!(
            tags(&badges),
            vec!["milestones_1", "milestones_10", "milestones_25", "pakts_1", "pakts_5"]
        );
    }

    #[test]
    fn held_achievements_are_not_awarded_twice() {
        let held = vec!["milestones_1".to_string(), "milestones_10".to_string()];
        let badges = earned_achievements(10, 0, &held);
        assert!(badges.is_empty());

        let badges = earned_achievements(100, 25, &held);
        assert_eq!(badges.len(), 3 + 4);
        assert_eq!(badges[0].type_tag, "milestones_25");
    }

    #[test]
    fn metadata_records_threshold() {
        let badges = earned_achievements(1, 0, &[]);
        assert_eq!(badges[0].metadata["threshold"], 1);
        assert_eq!(badges[0].title, "First Step");
    }
}
