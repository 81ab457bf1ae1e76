use chrono::NaiveDate;
use serde::Serialize;

use crate::prediction::offset_days;

/// Weeks from conception to the due date.
pub const PREGNANCY_WEEKS: u32 = 40;

#[derive(Debug, Clone, Copy, Serialize, PartialEq, Eq)]
pub struct Milestone {
    pub week: u32,
    pub title: &'static str,
    pub description: &'static str,
}

pub static MILESTONES: [Milestone; 10] = [
    Milestone {
        week: 4,
        title: "Implantation",
        description: "Your embryo has implanted in your uterus.",
    },
    Milestone {
        week: 8,
        title: "Embryo Development",
        description: "All essential organs have begun to form.",
    },
    Milestone {
        week: 12,
        title: "First Trimester Complete",
        description: "Risk of miscarriage decreases significantly.",
    },
    Milestone {
        week: 16,
        title: "Gender Reveal",
        description: "You may be able to find out the sex of your baby.",
    },
    Milestone {
        week: 20,
        title: "Halfway Point",
        description: "You're halfway through your pregnancy!",
    },
    Milestone {
        week: 24,
        title: "Viability",
        description: "Your baby has a chance of survival if born now.",
    },
    Milestone {
        week: 28,
        title: "Third Trimester Begins",
        description: "Your baby's brain is developing rapidly.",
    },
    Milestone {
        week: 32,
        title: "Lung Development",
        description: "Your baby's lungs are almost fully developed.",
    },
    Milestone {
        week: 36,
        title: "Full Term Approaching",
        description: "Your baby is considered early term.",
    },
    Milestone {
        week: 40,
        title: "Due Date",
        description: "Your baby is ready to be born!",
    },
];

/// Where a pregnancy stands on a given day.
#[derive(Debug, Clone, Copy, Serialize, PartialEq, Eq)]
pub struct PregnancyStatus {
    pub due_date: NaiveDate,
    pub conception_date: NaiveDate,
    pub current_week: u32,
    /// Percent of the 40 weeks elapsed, 0..=100.
    pub progress: u32,
    /// Zero once the due week is reached.
    pub weeks_remaining: u32,
    pub next_milestone: Milestone,
}

/// Conception is dated 40 weeks before the due date.
pub fn conception_date(due_date: NaiveDate) -> NaiveDate {
    offset_days(due_date, -i64::from(PREGNANCY_WEEKS) * 7)
}

/// 1-based pregnancy week, capped at 40.
///
/// Counts whole weeks from conception by absolute distance, so a `today`
/// before conception still yields a positive week.
pub fn current_week(due_date: NaiveDate, today: NaiveDate) -> u32 {
    let days = (today - conception_date(due_date)).num_days().unsigned_abs();
    let week = days / 7 + 1;
    week.min(u64::from(PREGNANCY_WEEKS)) as u32
}

/// First milestone at or after `week`, or the due date once all are past.
pub fn next_milestone(week: u32) -> &'static Milestone {
    MILESTONES
        .iter()
        .find(|m| m.week >= week)
        .unwrap_or(&MILESTONES[MILESTONES.len() - 1])
}

pub fn pregnancy_status(due_date: NaiveDate, today: NaiveDate) -> PregnancyStatus {
    let week = current_week(due_date, today);
    PregnancyStatus {
        due_date,
        conception_date: conception_date(due_date),
        current_week: week,
        progress: (week * 100 / PREGNANCY_WEEKS).min(100),
        weeks_remaining: PREGNANCY_WEEKS.saturating_sub(week),
        next_milestone: *next_milestone(week),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn d(s: &str) -> NaiveDate {
        NaiveDate::parse_from_str(s, "%Y-%m-%d").unwrap()
    }

    #[test]
    fn conception_is_280_days_before_due() {
        assert_eq!(conception_date(d("2024-10-06")), d("2023-12-31"));
    }

    #[test]
    fn week_counts_from_conception() {
        let due = d("2024-10-06");
        assert_eq!(current_week(due, d("2023-12-31")), 1);
        assert_eq!(current_week(due, d("2024-01-06")), 1);
        assert_eq!(current_week(due, d("2024-01-07")), 2);
        assert_eq!(current_week(due, d("2024-03-24")), 13);
    }

    #[test]
    fn week_capped_at_forty() {
        let due = d("2024-10-06");
        assert_eq!(current_week(due, d("2024-09-29")), 40);
        assert_eq!(current_week(due, due), 40);
        assert_eq!(current_week(due, d("2025-03-01")), 40);
    }

    #[test]
    fn milestone_lookup() {
        assert_eq!(next_milestone(1).week, 4);
        assert_eq!(next_milestone(4).title, "Implantation");
        assert_eq!(next_milestone(13).title, "Gender Reveal");
        assert_eq!(next_milestone(37).week, 40);
        assert_eq!(next_milestone(40).title, "Due Date");
    }

    #[test]
    fn milestone_past_the_end_falls_back_to_due_date() {
        assert_eq!(next_milestone(41).week, 40);
        assert_eq!(next_milestone(u32::MAX).title, "Due Date");
    }

    #[test]
    fn status_progress_and_remaining() {
        let status = pregnancy_status(d("2024-10-06"), d("2024-05-19"));
        assert_eq!(status.current_week, 21);
        assert_eq!(status.progress, 52);
        assert_eq!(status.weeks_remaining, 19);
        assert_eq!(status.next_milestone.title, "Viability");

        let done = pregnancy_status(d("2024-10-06"), d("2024-10-20"));
        assert_eq!(done.progress, 100);
        assert_eq!(done.weeks_remaining, 0);
    }
}
