// FinTrack - Core Library
// Exposes all modules for use in CLI, API server, and tests

pub mod error;
pub mod ratio;
pub mod records;
pub mod period;
pub mod category;
pub mod budget;
pub mod savings;
pub mod summary;
pub mod entitlement;
pub mod gate;
pub mod source;
pub mod fixtures;
pub mod db;
pub mod import;
pub mod config;
pub mod logging;
pub mod dashboard;

#[cfg(feature = "server")]
pub mod api;

// Re-export commonly used types
pub use error::ValidationError;
pub use ratio::{percent_of, round_half_up};
pub use records::{total, Budget, Expense, Income, Investment, Ledger, Record, RecordKind, SavingsGoal};
pub use period::{
    aggregate_by_month, monthly_series, total_in_month, trailing_months,
    MonthLabel, MonthlyPoint, MonthlyTotal, YearMonth, DEFAULT_WINDOW,
};
pub use category::{aggregate_by_category, category_totals, sorted_by_amount, CategoryShare};
pub use budget::{evaluate_budget, evaluate_budgets, spent_this_month, BudgetProgress, BudgetSeverity};
pub use savings::{goal_progress, savings_totals, GoalProgress, GoalStatus, SavingsTotals};
pub use summary::{savings_rate, FinancialHealth, FinancialSummary, NetWorthRating, PortfolioRating, SavingsRating};
pub use entitlement::{
    days_remaining, has_premium_access, integrity_warning, is_trial_ended, trial_end_display, upgrade,
    Entitlement, IntegrityWarning, Plan, Subscription, SubscriptionStatus, TrialState,
};
pub use gate::{FeatureGate, PremiumFeature};
pub use source::{DataSource, Snapshot};
pub use fixtures::{FixtureSource, DEMO_USER};
pub use db::{setup_database, AuditAction, AuditEntry, SqliteStore};
pub use import::{import_file, load_csv, ImportSummary};
pub use crate::config::{resolve_settings, Settings};
pub use dashboard::{DashboardView, FeatureAccess};

/// Library version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
