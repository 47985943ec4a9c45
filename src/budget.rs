// 🎯 Budget Progress - spend vs limit for the current month

use crate::period::YearMonth;
use crate::ratio::percent_of;
use crate::records::{Budget, Expense};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Progress above this is shown as a warning
pub const WARNING_THRESHOLD: i64 = 60;

/// Progress above this is shown as critical
pub const CRITICAL_THRESHOLD: i64 = 80;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum BudgetSeverity {
    Ok,
    Warning,
    Critical,
}

impl BudgetSeverity {
    pub fn from_progress(progress: i64) -> Self {
        if progress > CRITICAL_THRESHOLD {
            BudgetSeverity::Critical
        } else if progress > WARNING_THRESHOLD {
            BudgetSeverity::Warning
        } else {
            BudgetSeverity::Ok
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            BudgetSeverity::Ok => "ok",
            BudgetSeverity::Warning => "warning",
            BudgetSeverity::Critical => "critical",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BudgetProgress {
    pub budget_id: String,
    pub category: String,
    pub budget_limit: f64,
    pub spent: f64,
    /// Percent of the limit used; exceeds 100 when over budget
    pub progress: i64,
    pub remaining: f64,
    pub severity: BudgetSeverity,
}

impl BudgetProgress {
    /// Width of the progress bar, 0..=100
    pub fn bar_width(&self) -> i64 {
        self.progress.clamp(0, 100)
    }

    pub fn is_over_budget(&self) -> bool {
        self.spent > self.budget_limit
    }

    /// Amount spent past the limit; 0 while within budget
    pub fn overspend(&self) -> f64 {
        (self.spent - self.budget_limit).max(0.0)
    }
}

/// Expenses in `category` dated in the month of `now`
pub fn spent_this_month(category: &str, expenses: &[Expense], now: DateTime<Utc>) -> f64 {
    let month = YearMonth::containing(now);
    expenses
        .iter()
        .filter(|e| e.category == category && month.contains(e.date))
        .map(|e| e.amount)
        .sum()
}

/// `budget_limit > 0` is guaranteed by record validation
pub fn evaluate_budget(budget: &Budget, expenses: &[Expense], now: DateTime<Utc>) -> BudgetProgress {
    let spent = spent_this_month(&budget.category, expenses, now);
    let progress = percent_of(spent, budget.budget_limit);

    BudgetProgress {
        budget_id: budget.id.clone(),
        category: budget.category.clone(),
        budget_limit: budget.budget_limit,
        spent,
        progress,
        remaining: (budget.budget_limit - spent).max(0.0),
        severity: BudgetSeverity::from_progress(progress),
    }
}

pub fn evaluate_budgets(budgets: &[Budget], expenses: &[Expense], now: DateTime<Utc>) -> Vec<BudgetProgress> {
    budgets
        .iter()
        .map(|budget| evaluate_budget(budget, expenses, now))
        .collect()
}

// ============================================================================
// TESTS
// ============================================================================
