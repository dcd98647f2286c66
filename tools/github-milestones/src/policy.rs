//! Overdue milestone selection

use chrono::{DateTime, Utc};

use crate::types::{Milestone, MilestoneState};

/// Whether `milestone` should be closed at `now`
///
/// A milestone is overdue when it is open, has a well-formed due date, and
/// `now` is strictly later than that date.
pub fn is_overdue(milestone: &Milestone, now: DateTime<Utc>) -> bool {
    if milestone.state != MilestoneState::Open {
        return false;
    }

    match milestone.due_at() {
        Some(due_at) => now > due_at,
        None => false,
    }
}

/// Select overdue milestones, preserving input order
pub fn select_overdue(milestones: &[Milestone], now: DateTime<Utc>) -> Vec<&Milestone> {
    milestones
        .iter()
        .filter(|milestone| is_overdue(milestone, now))
        .collect()
}
