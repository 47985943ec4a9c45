// 🎭 Demo data - what visitors see before they sign up
//
// Six trailing months of income and expenses ending at the month of `now`,
// spread over four expense categories in a fixed 40/30/20/10 split.

use crate::entitlement::Subscription;
use crate::period::{trailing_months, DEFAULT_WINDOW};
use crate::records::{Budget, Expense, Income, Investment, SavingsGoal};
use crate::source::DataSource;
use anyhow::Result;
use chrono::{DateTime, NaiveDate, Utc};

pub const DEMO_USER: &str = "demo";

/// (income, expenses) per month, oldest first
const MONTHLY_FIGURES: [(f64, f64); DEFAULT_WINDOW] = [
    (4200.0, 2800.0),
    (4800.0, 3200.0),
    (5200.0, 2900.0),
    (4600.0, 3100.0),
    (5500.0, 3400.0),
    (5000.0, 2000.0),
];

/// (category, vendor, share of the month's expenses, day of month)
const EXPENSE_SPLIT: [(&str, &str, f64, u32); 4] = [
    ("Marketing", "AdWorks", 0.4, 5),
    ("Travel", "SkyJet Airlines", 0.3, 12),
    ("Supplies", "Office Depot", 0.2, 18),
    ("Software", "CloudSuite", 0.1, 24),
];

pub struct FixtureSource {
    income: Vec<Income>,
    expenses: Vec<Expense>,
    investments: Vec<Investment>,
    savings_goals: Vec<SavingsGoal>,
    budgets: Vec<Budget>,
}

impl FixtureSource {
    pub fn new(now: DateTime<Utc>) -> Self {
        let months = trailing_months(now, DEFAULT_WINDOW);
        let mut income = Vec::new();
        let mut expenses = Vec::new();

        for (label, (month_income, month_expenses)) in months.iter().zip(MONTHLY_FIGURES) {
            let ym = label.month;
            if let Some(date) = NaiveDate::from_ymd_opt(ym.year, ym.month, 1) {
                income.push(
                    Income::new(DEMO_USER, month_income, date, "Client payments")
                        .with_category("Consulting"),
                );
            }
            for (category, vendor, share, day) in EXPENSE_SPLIT {
                if let Some(date) = NaiveDate::from_ymd_opt(ym.year, ym.month, day) {
                    expenses.push(Expense::new(DEMO_USER, month_expenses * share, date, vendor, category));
                }
            }
        }

        let current = months.last().map(|l| l.month);
        let first_of_month = current
            .and_then(|ym| NaiveDate::from_ymd_opt(ym.year, ym.month, 1))
            .unwrap_or_else(|| now.date_naive());

        let investments = vec![
            Investment::new(DEMO_USER, 600.0, first_of_month, "Stocks", "Vanguard"),
            Investment::new(DEMO_USER, 400.0, first_of_month, "Crypto", "Coinbase"),
        ];

        let mut emergency = SavingsGoal::new(DEMO_USER, "Emergency Fund", 10000.0, 6000.0);
        emergency.deadline = NaiveDate::from_ymd_opt(2025, 12, 31);
        emergency.notes = Some("Six months of expenses".to_string());
        let mut vacation = SavingsGoal::new(DEMO_USER, "Vacation Fund", 5000.0, 2500.0);
        vacation.deadline = NaiveDate::from_ymd_opt(2025, 8, 15);
        vacation.notes = Some("Trip to Europe".to_string());
        let mut equipment = SavingsGoal::new(DEMO_USER, "New Equipment", 3000.0, 1200.0);
        equipment.notes = Some("Laptop and camera upgrade".to_string());

        let budgets = vec![
            Budget::new(DEMO_USER, "Marketing", 1000.0, first_of_month),
            Budget::new(DEMO_USER, "Software", 300.0, first_of_month),
            Budget::new(DEMO_USER, "Travel", 800.0, first_of_month),
        ];

        FixtureSource {
            income,
            expenses,
            investments,
            savings_goals: vec![emergency, vacation, equipment],
            budgets,
        }
    }
}

impl DataSource for FixtureSource {
    fn income(&self, _user_id: &str) -> Result<Vec<Income>> {
        Ok(self.income.clone())
    }

    fn expenses(&self, _user_id: &str) -> Result<Vec<Expense>> {
        Ok(self.expenses.clone())
    }

    fn investments(&self, _user_id: &str) -> Result<Vec<Investment>> {
        Ok(self.investments.clone())
    }

    fn savings_goals(&self, _user_id: &str) -> Result<Vec<SavingsGoal>> {
        Ok(self.savings_goals.clone())
    }

    fn budgets(&self, _user_id: &str) -> Result<Vec<Budget>> {
        Ok(self.budgets.clone())
    }

    /// Demo visitors never hold a subscription
    fn subscription(&self, _user_id: &str) -> Result<Option<Subscription>> {
        Ok(None)
    }

    fn is_demo(&self) -> bool {
        true
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::category::aggregate_by_category;
    use crate::period::monthly_series;
    use crate::records::Record;
    use chrono::TimeZone;

    fn now() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2025, 1, 20, 10, 0, 0).unwrap()
    }

    #[test]
    fn test_demo_monthly_series() {
        let source = FixtureSource::new(now());
        let income = source.income(DEMO_USER).unwrap();
        let expenses = source.expenses(DEMO_USER).unwrap();

        let series = monthly_series(&income, &expenses, &trailing_months(now(), DEFAULT_WINDOW));
        let months: Vec<&str> = series.iter().map(|p| p.month.as_str()).collect();
        assert_eq!(months, vec!["Aug", "Sep", "Oct", "Nov", "Dec", "Jan"]);
        assert_eq!(series[0].income, 4200.0);
        assert_eq!(series[5].income, 5000.0);
        assert!((series[5].expenses - 2000.0).abs() < 1e-9);
    }

    #[test]
    fn test_demo_category_split() {
        let source = FixtureSource::new(now());
        let shares = aggregate_by_category(&source.expenses(DEMO_USER).unwrap());
        let percentages: Vec<(&str, i64)> = shares
            .iter()
            .map(|s| (s.category.as_str(), s.percentage))
            .collect();
        assert_eq!(
            percentages,
            vec![("Marketing", 40), ("Travel", 30), ("Supplies", 20), ("Software", 10)]
        );
    }

    #[test]
    fn test_demo_records_pass_validation() {
        let source = FixtureSource::new(now());
        assert!(source.income(DEMO_USER).unwrap().iter().all(|r| r.validate().is_ok()));
        assert!(source.expenses(DEMO_USER).unwrap().iter().all(|r| r.validate().is_ok()));
        assert!(source.budgets(DEMO_USER).unwrap().iter().all(|r| r.validate().is_ok()));
        assert!(source.savings_goals(DEMO_USER).unwrap().iter().all(|r| r.validate().is_ok()));
        assert!(source.is_demo());
        assert!(source.subscription(DEMO_USER).unwrap().is_none());
    }
}
