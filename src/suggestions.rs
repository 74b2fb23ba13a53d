//! Template milestones offered when a user builds out a new pakt.

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MilestoneSuggestion {
    pub title: &'static str,
    pub description: &'static str,
    /// Weeks after the pakt is created.
    pub suggested_week: u32,
}

const fn s(title: &'static str, description: &'static str, suggested_week: u32) -> MilestoneSuggestion {
    MilestoneSuggestion {
        title,
        description,
        suggested_week,
    }
}

const HEALTH: &[MilestoneSuggestion] = &[
    s("Initial Health Assessment", "Record a baseline: weight, sleep, energy and any checkup results", 1),
    s("Build a Weekly Routine", "Schedule fixed slots for exercise, meal prep and rest", 2),
    s("First Habit Check-in", "Review how consistently the routine held up and adjust", 4),
    s("Mid-point Health Review", "Compare against the baseline and reset targets if needed", 8),
    s("Sustain and Celebrate", "Lock in the habits that worked and plan the next goal", 12),
];

const FITNESS: &[MilestoneSuggestion] = &[
    s("Fitness Baseline Test", "Measure current strength, endurance and mobility", 1),
    s("Pick a Training Plan", "Choose a program that fits the schedule and the goal", 1),
    s("Complete First Training Block", "Finish four weeks of the plan without skipping sessions", 4),
    s("Progress Re-test", "Repeat the baseline test and compare", 8),
    s("Goal Attempt", "Attempt the target distance, weight or time", 12),
];

const CAREER: &[MilestoneSuggestion] = &[
    s("Define the Target Role", "Write down the role, level and companies to aim for", 1),
    s("Update CV and Profiles", "Refresh the CV, portfolio and professional profiles", 2),
    s("Skill Gap Plan", "List missing skills and pick one course or project per gap", 3),
    s("Reach Out to Five Contacts", "Ask for referrals, advice or informational interviews", 5),
    s("Apply and Interview", "Send targeted applications and prepare for interviews", 8),
];

const LEARNING: &[MilestoneSuggestion] = &[
    s("Choose Resources", "Pick the course, book or tutor to learn from", 1),
    s("Finish the Fundamentals", "Work through the introductory material", 3),
    s("Build a Practice Project", "Apply what was learned to something concrete", 6),
    s("Self Assessment", "Take a test or teach the topic to someone else", 9),
    s("Share the Result", "Publish, present or certify the new skill", 12),
];

const FINANCE: &[MilestoneSuggestion] = &[
    s("Track Every Expense", "Log spending for a full month to find the baseline", 1),
    s("Set a Budget", "Split income into needs, wants and savings", 4),
    s("Automate Savings", "Set up an automatic transfer on payday", 5),
    s("Build the Emergency Fund", "Reach one month of expenses in savings", 10),
    s("Quarterly Money Review", "Review progress and adjust the budget", 13),
];

const RELATIONSHIPS: &[MilestoneSuggestion] = &[
    s("List Important People", "Write down who to invest more time in", 1),
    s("Plan Regular Contact", "Put recurring calls or meetups on the calendar", 2),
    s("Plan a Shared Experience", "Organise a trip, dinner or activity together", 6),
    s("Reflect and Reconnect", "Review which relationships grew and reach out again", 10),
];

const CREATIVITY: &[MilestoneSuggestion] = &[
    s("Define the Project", "Decide on scope, medium and what done looks like", 1),
    s("Daily Creative Practice", "Create something small every day for two weeks", 2),
    s("First Draft", "Finish a complete rough version", 6),
    s("Feedback Round", "Show the draft to trusted people and collect notes", 8),
    s("Release", "Publish, exhibit or share the finished work", 12),
];

const PERSONAL: &[MilestoneSuggestion] = &[
    s("Write Down the Why", "Describe why this change matters", 1),
    s("First Small Win", "Complete the smallest meaningful step", 2),
    s("Remove One Obstacle", "Identify and deal with the biggest blocker", 4),
    s("Progress Reflection", "Journal on what changed so far", 8),
];

const OTHER: &[MilestoneSuggestion] = &[
    s("Get Started", "Take the first concrete step toward the goal", 1),
    s("Make a Plan", "Break the goal down into smaller steps", 2),
    s("Check Progress", "Review where things stand and adjust", 4),
    s("Push Through", "Work on the hardest remaining part", 8),
    s("Final Review", "Wrap up and reflect on the outcome", 12),
];

const TABLE: &[(&str, &[MilestoneSuggestion])] = &[
    ("health", HEALTH),
    ("fitness", FITNESS),
    ("career", CAREER),
    ("learning", LEARNING),
    ("finance", FINANCE),
    ("relationships", RELATIONSHIPS),
    ("creativity", CREATIVITY),
    ("personal", PERSONAL),
    ("other", OTHER),
];

/// Suggestions for `category`, falling back to the generic list.
pub fn milestone_suggestions(category: &str) -> &'static [MilestoneSuggestion] {
    let key = category.trim().to_ascii_lowercase();
    TABLE
        .iter()
        .find(|(name, _)| *name == key)
        .map(|(_, list)| *list)
        .unwrap_or(OTHER)
}

pub fn is_known_category(category: &str) -> bool {
    let key = category.trim().to_ascii_lowercase();
    TABLE.iter().any(|(name, _)| *name == key)
}

pub fn known_categories() -> impl Iterator<Item = &'static str> {
    TABLE.iter().map(|(name, _)| *name)
}
