// 🧭 Dashboard view model - everything the main screen renders, in one value

use crate::budget::{evaluate_budgets, BudgetProgress};
use crate::category::{aggregate_by_category, CategoryShare};
use crate::entitlement::Entitlement;
use crate::gate::{FeatureGate, PremiumFeature};
use crate::period::{monthly_series, trailing_months, MonthlyPoint};
use crate::savings::{goal_progress, savings_totals, GoalProgress, SavingsTotals};
use crate::source::Snapshot;
use crate::summary::FinancialSummary;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FeatureAccess {
    pub feature: PremiumFeature,
    pub gate: FeatureGate,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub hint: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DashboardView {
    pub user_id: String,
    pub demo: bool,
    pub generated_at: DateTime<Utc>,
    pub summary: FinancialSummary,
    pub monthly: Vec<MonthlyPoint>,
    pub expense_categories: Vec<CategoryShare>,
    pub investment_categories: Vec<CategoryShare>,
    pub budgets: Vec<BudgetProgress>,
    pub savings: Vec<GoalProgress>,
    pub savings_totals: SavingsTotals,
    pub entitlement: Entitlement,
    pub features: Vec<FeatureAccess>,
}

impl DashboardView {
    pub fn build(snapshot: &Snapshot, now: DateTime<Utc>, months: usize) -> Self {
        let labels = trailing_months(now, months);
        let entitlement = Entitlement::evaluate(snapshot.subscription.as_ref(), now);

        DashboardView {
            user_id: snapshot.user_id.clone(),
            demo: snapshot.demo,
            generated_at: now,
            summary: FinancialSummary::from_records(
                &snapshot.income,
                &snapshot.expenses,
                &snapshot.investments,
                &snapshot.savings_goals,
                months,
            ),
            monthly: monthly_series(&snapshot.income, &snapshot.expenses, &labels),
            expense_categories: aggregate_by_category(&snapshot.expenses),
            investment_categories: aggregate_by_category(&snapshot.investments),
            budgets: evaluate_budgets(&snapshot.budgets, &snapshot.expenses, now),
            savings: snapshot.savings_goals.iter().map(goal_progress).collect(),
            savings_totals: savings_totals(&snapshot.savings_goals),
            features: feature_access(entitlement.has_premium_access, snapshot.demo),
            entitlement,
        }
    }

    pub fn gate(&self, feature: PremiumFeature) -> FeatureGate {
        self.features
            .iter()
            .find(|f| f.feature == feature)
            .map(|f| f.gate)
            .unwrap_or(FeatureGate::UpgradeRequired)
    }
}

pub fn feature_access(has_access: bool, demo: bool) -> Vec<FeatureAccess> {
    let gate = FeatureGate::evaluate(has_access, demo);
    PremiumFeature::ALL
        .iter()
        .map(|&feature| FeatureAccess {
            feature,
            gate,
            hint: gate.hint().map(str::to_string),
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::budget::BudgetSeverity;
    use crate::entitlement::Subscription;
    use crate::fixtures::{FixtureSource, DEMO_USER};
    use chrono::{Duration, TimeZone};

    fn now() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2025, 1, 20, 10, 0, 0).unwrap()
    }

    #[test]
    fn test_demo_dashboard() {
        let snapshot = Snapshot::load(&FixtureSource::new(now()), DEMO_USER);
        let view = DashboardView::build(&snapshot, now(), 6);

        assert!(view.demo);
        assert_eq!(view.monthly.len(), 6);
        assert_eq!(view.monthly[5].month, "Jan");
        assert_eq!(view.expense_categories.len(), 4);
        assert_eq!(view.summary.total_income, 29300.0);
        assert_eq!(view.summary.total_investments, 1000.0);
        assert_eq!(view.savings.len(), 3);
        assert_eq!(view.savings_totals.total_saved, 9700.0);

        let marketing = view.budgets.iter().find(|b| b.category == "Marketing").unwrap();
        assert_eq!(marketing.progress, 80);
        assert_eq!(marketing.severity, BudgetSeverity::Warning);

        assert!(!view.entitlement.has_premium_access);
        assert_eq!(view.gate(PremiumFeature::DeleteEntries), FeatureGate::SignUpRequired);
    }

    #[test]
    fn test_trial_user_gets_features() {
        let mut snapshot = Snapshot::default();
        snapshot.user_id = "alice".to_string();
        snapshot.subscription = Some(Subscription::free_trial("alice", now() - Duration::days(2), 7));

        let view = DashboardView::build(&snapshot, now(), 6);
        assert!(view.entitlement.has_premium_access);
        assert_eq!(view.entitlement.days_remaining, 5);
        assert!(view.features.iter().all(|f| f.gate == FeatureGate::Allowed && f.hint.is_none()));
        assert!(view.expense_categories.is_empty());
        assert!(view.monthly.iter().all(|p| p.income == 0.0 && p.expenses == 0.0));
    }

    #[test]
    fn test_expired_user_must_upgrade() {
        let mut snapshot = Snapshot::default();
        snapshot.user_id = "bob".to_string();
        snapshot.subscription = Some(Subscription::free_trial("bob", now() - Duration::days(30), 14));

        let view = DashboardView::build(&snapshot, now(), 6);
        assert!(view.entitlement.trial_ended);
        assert_eq!(view.gate(PremiumFeature::ExportData), FeatureGate::UpgradeRequired);
    }
}
