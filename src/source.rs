// 🔌 Data sources - where record snapshots come from
//
// Live data and demo data are two implementations of the same capability;
// callers pick one explicitly and pass it down.

use crate::entitlement::Subscription;
use crate::records::{Budget, Expense, Income, Investment, SavingsGoal};
use anyhow::Result;
use tracing::{debug, warn};

pub trait DataSource {
    fn income(&self, user_id: &str) -> Result<Vec<Income>>;
    fn expenses(&self, user_id: &str) -> Result<Vec<Expense>>;
    fn investments(&self, user_id: &str) -> Result<Vec<Investment>>;
    fn savings_goals(&self, user_id: &str) -> Result<Vec<SavingsGoal>>;
    fn budgets(&self, user_id: &str) -> Result<Vec<Budget>>;
    fn subscription(&self, user_id: &str) -> Result<Option<Subscription>>;

    /// Canned data for visitors who have not signed up
    fn is_demo(&self) -> bool {
        false
    }
}

/// Everything one user's views are derived from
#[derive(Debug, Clone, Default)]
pub struct Snapshot {
    pub user_id: String,
    pub demo: bool,
    pub income: Vec<Income>,
    pub expenses: Vec<Expense>,
    pub investments: Vec<Investment>,
    pub savings_goals: Vec<SavingsGoal>,
    pub budgets: Vec<Budget>,
    pub subscription: Option<Subscription>,
}

impl Snapshot {
    /// Fetch every collection; a failed fetch leaves that collection empty
    /// so the rest of the view still renders.
    pub fn load(source: &dyn DataSource, user_id: &str) -> Snapshot {
        let snapshot = Snapshot {
            user_id: user_id.to_string(),
            demo: source.is_demo(),
            income: or_empty("income", source.income(user_id)),
            expenses: or_empty("expenses", source.expenses(user_id)),
            investments: or_empty("investments", source.investments(user_id)),
            savings_goals: or_empty("savings_goals", source.savings_goals(user_id)),
            budgets: or_empty("budgets", source.budgets(user_id)),
            subscription: source.subscription(user_id).unwrap_or_else(|e| {
                warn!(user_id, error = %e, "failed to load subscription, treating as absent");
                None
            }),
        };

        debug!(
            user_id,
            income = snapshot.income.len(),
            expenses = snapshot.expenses.len(),
            investments = snapshot.investments.len(),
            savings_goals = snapshot.savings_goals.len(),
            budgets = snapshot.budgets.len(),
            "snapshot loaded"
        );

        snapshot
    }
}

fn or_empty<T>(collection: &str, result: Result<Vec<T>>) -> Vec<T> {
    match result {
        Ok(records) => records,
        Err(e) => {
            warn!(collection, error = %e, "fetch failed, continuing with an empty collection");
            Vec::new()
        }
    }
}
