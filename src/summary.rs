// 📊 Financial summary - headline totals for the dashboard and reports

use crate::ratio::{percent_of, round_half_up};
use crate::records::{total, Expense, Income, Investment, SavingsGoal};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FinancialSummary {
    pub total_income: f64,
    pub total_expenses: f64,
    pub total_investments: f64,
    /// Sum of current amounts across savings goals
    pub total_savings: f64,
    pub net_worth: f64,
    /// (income - expenses) / income in percent; 0 without income
    pub savings_rate: i64,
    pub avg_monthly_income: i64,
    pub avg_monthly_expenses: i64,
    pub months: usize,
    pub health: FinancialHealth,
}

impl FinancialSummary {
    /// `months` is the report window the averages are spread over
    pub fn from_records(
        income: &[Income],
        expenses: &[Expense],
        investments: &[Investment],
        goals: &[SavingsGoal],
        months: usize,
    ) -> Self {
        let total_income = total(income);
        let total_expenses = total(expenses);
        let total_investments = total(investments);
        let total_savings: f64 = goals.iter().map(|g| g.current_amount).sum();
        let net_worth = total_income - total_expenses + total_investments + total_savings;
        let rate = savings_rate(total_income, total_expenses);

        FinancialSummary {
            total_income,
            total_expenses,
            total_investments,
            total_savings,
            net_worth,
            savings_rate: rate,
            avg_monthly_income: monthly_average(total_income, months),
            avg_monthly_expenses: monthly_average(total_expenses, months),
            months,
            health: FinancialHealth {
                savings: SavingsRating::from_rate(rate),
                portfolio: PortfolioRating::assess(total_investments, total_expenses),
                net_worth: NetWorthRating::from_net_worth(net_worth),
            },
        }
    }
}

// ============================================================================
// HEALTH RATINGS
// ============================================================================

/// Savings rate at or above this is excellent
pub const EXCELLENT_SAVINGS_RATE: i64 = 20;
/// Savings rate at or above this is good
pub const GOOD_SAVINGS_RATE: i64 = 10;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SavingsRating {
    Excellent,
    Good,
    NeedsImprovement,
}

impl SavingsRating {
    pub fn from_rate(rate: i64) -> Self {
        if rate >= EXCELLENT_SAVINGS_RATE {
            SavingsRating::Excellent
        } else if rate >= GOOD_SAVINGS_RATE {
            SavingsRating::Good
        } else {
            SavingsRating::NeedsImprovement
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            SavingsRating::Excellent => "Excellent",
            SavingsRating::Good => "Good",
            SavingsRating::NeedsImprovement => "Needs Improvement",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PortfolioRating {
    /// More invested than spent
    Strong,
    Growing,
}

impl PortfolioRating {
    pub fn assess(investments: f64, expenses: f64) -> Self {
        if investments > expenses {
            PortfolioRating::Strong
        } else {
            PortfolioRating::Growing
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            PortfolioRating::Strong => "Strong",
            PortfolioRating::Growing => "Growing",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum NetWorthRating {
    Positive,
    Building,
}

impl NetWorthRating {
    pub fn from_net_worth(net_worth: f64) -> Self {
        if net_worth > 0.0 {
            NetWorthRating::Positive
        } else {
            NetWorthRating::Building
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            NetWorthRating::Positive => "Positive",
            NetWorthRating::Building => "Building",
        }
    }
}

/// The three headline ratings on the reports page
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct FinancialHealth {
    pub savings: SavingsRating,
    pub portfolio: PortfolioRating,
    pub net_worth: NetWorthRating,
}

pub fn savings_rate(income: f64, expenses: f64) -> i64 {
    if income > 0.0 {
        percent_of(income - expenses, income)
    } else {
        0
    }
}

fn monthly_average(amount: f64, months: usize) -> i64 {
    if months == 0 {
        return 0;
    }
    round_half_up(amount / months as f64)
}
