// 🐷 Savings goal progress

use crate::ratio::percent_of;
use crate::records::SavingsGoal;
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

/// Rounded progress at which a goal counts as reached
pub const COMPLETED_THRESHOLD: i64 = 100;
/// Rounded progress at which a goal is on track
pub const ON_TRACK_THRESHOLD: i64 = 75;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum GoalStatus {
    InProgress,
    OnTrack,
    Completed,
}

impl GoalStatus {
    pub fn from_progress(progress: i64) -> Self {
        if progress >= COMPLETED_THRESHOLD {
            GoalStatus::Completed
        } else if progress >= ON_TRACK_THRESHOLD {
            GoalStatus::OnTrack
        } else {
            GoalStatus::InProgress
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            GoalStatus::InProgress => "in_progress",
            GoalStatus::OnTrack => "on_track",
            GoalStatus::Completed => "completed",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GoalProgress {
    pub goal_id: String,
    pub goal_name: String,
    pub target_amount: f64,
    pub current_amount: f64,
    /// current / target in percent, never negative, may exceed 100
    pub progress: i64,
    pub remaining: f64,
    pub status: GoalStatus,
    /// Same as `status == Completed`
    pub completed: bool,
    pub deadline: Option<NaiveDate>,
}

impl GoalProgress {
    pub fn bar_width(&self) -> i64 {
        self.progress.min(100)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct SavingsTotals {
    pub total_saved: f64,
    pub total_target: f64,
}

impl SavingsTotals {
    pub fn progress(&self) -> i64 {
        percent_of(self.total_saved, self.total_target).max(0)
    }
}

pub fn goal_progress(goal: &SavingsGoal) -> GoalProgress {
    let progress = percent_of(goal.current_amount, goal.target_amount).max(0);
    let status = GoalStatus::from_progress(progress);
    GoalProgress {
        goal_id: goal.id.clone(),
        goal_name: goal.goal_name.clone(),
        target_amount: goal.target_amount,
        current_amount: goal.current_amount,
        progress,
        remaining: (goal.target_amount - goal.current_amount).max(0.0),
        status,
        completed: status == GoalStatus::Completed,
        deadline: goal.deadline,
    }
}

pub fn savings_totals(goals: &[SavingsGoal]) -> SavingsTotals {
    goals.iter().fold(SavingsTotals::default(), |mut acc, goal| {
        acc.total_saved += goal.current_amount;
        acc.total_target += goal.target_amount;
        acc
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_goal_progress() {
        let goal = SavingsGoal::new("u1", "Emergency Fund", 10000.0, 6000.0);
        let progress = goal_progress(&goal);
        assert_eq!(progress.progress, 60);
        assert_eq!(progress.remaining, 4000.0);
        assert_eq!(progress.status, GoalStatus::InProgress);
        assert!(!progress.completed);
    }

    #[test]
    fn test_status_follows_rounded_progress() {
        let nearly = goal_progress(&SavingsGoal::new("u1", "Bike", 1000.0, 995.0));
        assert_eq!(nearly.progress, 100);
        assert_eq!(nearly.status, GoalStatus::Completed);
        assert!(nearly.completed);
        assert_eq!(nearly.remaining, 5.0);

        let short = goal_progress(&SavingsGoal::new("u1", "Bike", 1000.0, 994.0));
        assert_eq!(short.progress, 99);
        assert_eq!(short.status, GoalStatus::OnTrack);
        assert!(!short.completed);
    }

    #[test]
    fn test_status_boundaries() {
        assert_eq!(GoalStatus::from_progress(0), GoalStatus::InProgress);
        assert_eq!(GoalStatus::from_progress(74), GoalStatus::InProgress);
        assert_eq!(GoalStatus::from_progress(75), GoalStatus::OnTrack);
        assert_eq!(GoalStatus::from_progress(99), GoalStatus::OnTrack);
        assert_eq!(GoalStatus::from_progress(100), GoalStatus::Completed);
        assert_eq!(GoalStatus::from_progress(125), GoalStatus::Completed);
    }

    #[test]
    fn test_over_saving_is_clamped_for_display_only() {
        let goal = SavingsGoal::new("u1", "Laptop", 1000.0, 1250.0);
        let progress = goal_progress(&goal);
        assert_eq!(progress.progress, 125);
        assert_eq!(progress.bar_width(), 100);
        assert_eq!(progress.remaining, 0.0);
        assert_eq!(progress.status, GoalStatus::Completed);
        assert!(progress.completed);
    }

    #[test]
    fn test_savings_totals() {
        let goals = vec![
            SavingsGoal::new("u1", "Emergency Fund", 10000.0, 6000.0),
            SavingsGoal::new("u1", "Vacation Fund", 5000.0, 2500.0),
            SavingsGoal::new("u1", "New Equipment", 3000.0, 1200.0),
        ];
        let totals = savings_totals(&goals);
        assert_eq!(totals.total_saved, 9700.0);
        assert_eq!(totals.total_target, 18000.0);
        assert_eq!(totals.progress(), 54);
    }

    #[test]
    fn test_empty_totals() {
        let totals = savings_totals(&[]);
        assert_eq!(totals, SavingsTotals::default());
        assert_eq!(totals.progress(), 0);
    }
}
