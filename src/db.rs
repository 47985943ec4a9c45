// 🗄️ SQLite store - the live DataSource
//
// One table per record kind, keyed by user_id, plus an append-only audit log of
// what happened to each user's data. Records are validated on the way in. On the
// way out every row is read on its own: one that cannot be decoded or fails
// validation is skipped with a warning and the rest of the collection still loads.

use crate::entitlement::{self, Plan, Subscription, SubscriptionStatus};
use crate::records::{Budget, Expense, Income, Investment, Record, RecordKind, SavingsGoal};
use crate::source::DataSource;
use anyhow::{anyhow, Context, Result};
use chrono::{DateTime, Utc};
use rusqlite::{params, Connection, OptionalExtension};
use serde::{Deserialize, Serialize};
use std::path::Path;
use tracing::{debug, info, warn};

// ============================================================================
// AUDIT LOG
// ============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AuditAction {
    RecordAdded,
    RecordDeleted,
    TrialStarted,
    SubscriptionUpgraded,
}

impl AuditAction {
    pub fn as_str(&self) -> &'static str {
        match self {
            AuditAction::RecordAdded => "record_added",
            AuditAction::RecordDeleted => "record_deleted",
            AuditAction::TrialStarted => "trial_started",
            AuditAction::SubscriptionUpgraded => "subscription_upgraded",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "record_added" => Some(AuditAction::RecordAdded),
            "record_deleted" => Some(AuditAction::RecordDeleted),
            "trial_started" => Some(AuditAction::TrialStarted),
            "subscription_upgraded" => Some(AuditAction::SubscriptionUpgraded),
            _ => None,
        }
    }
}

/// One change to a user's data
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AuditEntry {
    pub user_id: String,
    pub action: AuditAction,
    /// Record kind, or "subscription"
    pub subject: String,
    pub subject_id: String,
    pub detail: serde_json::Value,
    pub recorded_at: DateTime<Utc>,
}

impl AuditEntry {
    fn new(user_id: &str, action: AuditAction, subject: &str, subject_id: &str, detail: serde_json::Value) -> Self {
        AuditEntry {
            user_id: user_id.to_string(),
            action,
            subject: subject.to_string(),
            subject_id: subject_id.to_string(),
            detail,
            recorded_at: Utc::now(),
        }
    }
}

// ============================================================================
// SCHEMA
// ============================================================================

pub fn setup_database(conn: &Connection) -> Result<()> {
    // Enable WAL mode for crash recovery
    conn.pragma_update(None, "journal_mode", "WAL")?;

    conn.execute_batch(
        "CREATE TABLE IF NOT EXISTS income (
            id TEXT PRIMARY KEY,
            user_id TEXT NOT NULL,
            amount REAL NOT NULL,
            date TEXT NOT NULL,
            source TEXT NOT NULL,
            category TEXT NOT NULL DEFAULT '',
            notes TEXT,
            created_at TEXT NOT NULL
        );

        CREATE TABLE IF NOT EXISTS expenses (
            id TEXT PRIMARY KEY,
            user_id TEXT NOT NULL,
            amount REAL NOT NULL,
            date TEXT NOT NULL,
            vendor TEXT NOT NULL DEFAULT '',
            category TEXT NOT NULL,
            notes TEXT,
            created_at TEXT NOT NULL
        );

        CREATE TABLE IF NOT EXISTS investments (
            id TEXT PRIMARY KEY,
            user_id TEXT NOT NULL,
            amount REAL NOT NULL,
            date TEXT NOT NULL,
            type TEXT NOT NULL,
            platform TEXT NOT NULL DEFAULT '',
            notes TEXT,
            created_at TEXT NOT NULL
        );

        CREATE TABLE IF NOT EXISTS savings_goals (
            id TEXT PRIMARY KEY,
            user_id TEXT NOT NULL,
            goal_name TEXT NOT NULL,
            target_amount REAL NOT NULL,
            current_amount REAL NOT NULL DEFAULT 0,
            deadline TEXT,
            notes TEXT,
            created_at TEXT NOT NULL
        );

        CREATE TABLE IF NOT EXISTS budgets (
            id TEXT PRIMARY KEY,
            user_id TEXT NOT NULL,
            category TEXT NOT NULL,
            budget_limit REAL NOT NULL,
            start_date TEXT NOT NULL,
            created_at TEXT NOT NULL
        );

        CREATE TABLE IF NOT EXISTS subscriptions (
            user_id TEXT PRIMARY KEY,
            plan TEXT NOT NULL,
            status TEXT NOT NULL,
            trial_end_date TEXT,
            created_at TEXT NOT NULL,
            updated_at TEXT NOT NULL
        );

        CREATE TABLE IF NOT EXISTS audit_log (
            seq INTEGER PRIMARY KEY AUTOINCREMENT,
            user_id TEXT NOT NULL,
            action TEXT NOT NULL,
            subject TEXT NOT NULL,
            subject_id TEXT NOT NULL,
            detail TEXT NOT NULL,
            recorded_at TEXT NOT NULL
        );

        CREATE INDEX IF NOT EXISTS idx_income_user ON income(user_id, date);
        CREATE INDEX IF NOT EXISTS idx_expenses_user ON expenses(user_id, date);
        CREATE INDEX IF NOT EXISTS idx_investments_user ON investments(user_id, date);
        CREATE INDEX IF NOT EXISTS idx_savings_user ON savings_goals(user_id);
        CREATE INDEX IF NOT EXISTS idx_budgets_user ON budgets(user_id);
        CREATE INDEX IF NOT EXISTS idx_audit_user ON audit_log(user_id, seq);",
    )?;

    Ok(())
}

// ============================================================================
// STORE
// ============================================================================

pub struct SqliteStore {
    conn: Connection,
}

impl SqliteStore {
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let conn = Connection::open(path)
            .with_context(|| format!("Failed to open database: {}", path.display()))?;
        setup_database(&conn)?;
        info!(path = %path.display(), "database opened");
        Ok(SqliteStore { conn })
    }

    pub fn open_in_memory() -> Result<Self> {
        let conn = Connection::open_in_memory()?;
        setup_database(&conn)?;
        Ok(SqliteStore { conn })
    }

    pub fn connection(&self) -> &Connection {
        &self.conn
    }

    // ------------------------------------------------------------------------
    // Audit log
    // ------------------------------------------------------------------------

    /// A failed audit write never fails the change it describes
    fn audit(&self, entry: AuditEntry) {
        let written = serde_json::to_string(&entry.detail)
            .map_err(anyhow::Error::from)
            .and_then(|detail| {
                self.conn
                    .execute(
                        "INSERT INTO audit_log (user_id, action, subject, subject_id, detail, recorded_at)
                         VALUES (?1, ?2, ?3, ?4, ?5, ?6)",
                        params![
                            entry.user_id,
                            entry.action.as_str(),
                            entry.subject,
                            entry.subject_id,
                            detail,
                            entry.recorded_at.to_rfc3339(),
                        ],
                    )
                    .map_err(anyhow::Error::from)
            });

        if let Err(e) = written {
            warn!(action = entry.action.as_str(), subject_id = %entry.subject_id, error = %e, "failed to write audit entry");
        }
    }

    /// Everything recorded for `user_id`, newest first
    pub fn audit_trail(&self, user_id: &str) -> Result<Vec<AuditEntry>> {
        let mut stmt = self.conn.prepare(
            "SELECT user_id, action, subject, subject_id, detail, recorded_at
             FROM audit_log WHERE user_id = ?1 ORDER BY seq DESC",
        )?;
        let rows = stmt.query_map(params![user_id], |row| {
            Ok((
                row.get::<_, String>(0)?,
                row.get::<_, String>(1)?,
                row.get::<_, String>(2)?,
                row.get::<_, String>(3)?,
                row.get::<_, String>(4)?,
                row.get::<_, String>(5)?,
            ))
        })?;

        let mut trail = Vec::new();
        for row in rows {
            let (user_id, action, subject, subject_id, detail, recorded_at) = row?;
            let Some(action) = AuditAction::parse(&action) else {
                warn!(action = %action, "skipping audit entry with unknown action");
                continue;
            };
            trail.push(AuditEntry {
                user_id,
                action,
                subject,
                subject_id,
                detail: serde_json::from_str(&detail).context("Bad audit detail")?,
                recorded_at: parse_timestamp(&recorded_at)?,
            });
        }
        Ok(trail)
    }

    // ------------------------------------------------------------------------
    // Inserts
    // ------------------------------------------------------------------------

    pub fn insert_income(&self, income: &Income) -> Result<()> {
        income.validate()?;
        self.conn.execute(
            "INSERT INTO income (id, user_id, amount, date, source, category, notes, created_at)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8)",
            params![
                income.id,
                income.user_id,
                income.amount,
                income.date,
                income.source,
                income.category,
                income.notes,
                income.created_at,
            ],
        )?;
        self.log_added(income, &income.user_id, income.amount);
        Ok(())
    }

    pub fn insert_expense(&self, expense: &Expense) -> Result<()> {
        expense.validate()?;
        self.conn.execute(
            "INSERT INTO expenses (id, user_id, amount, date, vendor, category, notes, created_at)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8)",
            params![
                expense.id,
                expense.user_id,
                expense.amount,
                expense.date,
                expense.vendor,
                expense.category,
                expense.notes,
                expense.created_at,
            ],
        )?;
        self.log_added(expense, &expense.user_id, expense.amount);
        Ok(())
    }

    pub fn insert_investment(&self, investment: &Investment) -> Result<()> {
        investment.validate()?;
        self.conn.execute(
            "INSERT INTO investments (id, user_id, amount, date, type, platform, notes, created_at)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8)",
            params![
                investment.id,
                investment.user_id,
                investment.amount,
                investment.date,
                investment.investment_type,
                investment.platform,
                investment.notes,
                investment.created_at,
            ],
        )?;
        self.log_added(investment, &investment.user_id, investment.amount);
        Ok(())
    }

    pub fn insert_savings_goal(&self, goal: &SavingsGoal) -> Result<()> {
        goal.validate()?;
        self.conn.execute(
            "INSERT INTO savings_goals
                (id, user_id, goal_name, target_amount, current_amount, deadline, notes, created_at)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8)",
            params![
                goal.id,
                goal.user_id,
                goal.goal_name,
                goal.target_amount,
                goal.current_amount,
                goal.deadline,
                goal.notes,
                goal.created_at,
            ],
        )?;
        self.log_added(goal, &goal.user_id, goal.target_amount);
        Ok(())
    }

    pub fn insert_budget(&self, budget: &Budget) -> Result<()> {
        budget.validate()?;
        self.conn.execute(
            "INSERT INTO budgets (id, user_id, category, budget_limit, start_date, created_at)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6)",
            params![
                budget.id,
                budget.user_id,
                budget.category,
                budget.budget_limit,
                budget.start_date,
                budget.created_at,
            ],
        )?;
        self.log_added(budget, &budget.user_id, budget.budget_limit);
        Ok(())
    }

    fn log_added<R: Record>(&self, record: &R, user_id: &str, amount: f64) {
        self.audit(AuditEntry::new(
            user_id,
            AuditAction::RecordAdded,
            R::KIND.as_str(),
            record.id(),
            serde_json::json!({ "amount": amount }),
        ));
    }

    /// Delete one record owned by `user_id`. Returns false when nothing matched.
    pub fn delete_record(&self, kind: RecordKind, user_id: &str, id: &str) -> Result<bool> {
        let sql = format!("DELETE FROM {} WHERE id = ?1 AND user_id = ?2", kind.table());
        let deleted = self.conn.execute(&sql, params![id, user_id])?;

        if deleted > 0 {
            self.audit(AuditEntry::new(
                user_id,
                AuditAction::RecordDeleted,
                kind.as_str(),
                id,
                serde_json::Value::Null,
            ));
        }
        Ok(deleted > 0)
    }

    // ------------------------------------------------------------------------
    // Subscriptions
    // ------------------------------------------------------------------------

    pub fn upsert_subscription(&self, subscription: &Subscription) -> Result<()> {
        self.conn.execute(
            "INSERT INTO subscriptions (user_id, plan, status, trial_end_date, created_at, updated_at)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6)
             ON CONFLICT(user_id) DO UPDATE SET
                plan = excluded.plan,
                status = excluded.status,
                trial_end_date = excluded.trial_end_date,
                updated_at = excluded.updated_at",
            params![
                subscription.user_id,
                subscription.plan.as_str(),
                subscription.status.as_str(),
                subscription.trial_end_date.map(|d| d.to_rfc3339()),
                subscription.created_at.to_rfc3339(),
                subscription.updated_at.to_rfc3339(),
            ],
        )?;
        Ok(())
    }

    /// New user: free plan with a trial ending `trial_days` from `now`.
    /// Returns None when the user already has a subscription.
    pub fn start_trial(&self, user_id: &str, now: DateTime<Utc>, trial_days: i64) -> Result<Option<Subscription>> {
        if self.load_subscription(user_id)?.is_some() {
            return Ok(None);
        }

        let subscription = Subscription::free_trial(user_id, now, trial_days);
        self.upsert_subscription(&subscription)?;
        self.audit(AuditEntry::new(
            user_id,
            AuditAction::TrialStarted,
            "subscription",
            user_id,
            serde_json::json!({ "trial_days": trial_days }),
        ));
        info!(user_id, trial_days, "trial started");

        Ok(Some(subscription))
    }

    /// Payment succeeded: flip the user to premium and clear the trial.
    /// Returns None when the user has no subscription record.
    pub fn upgrade_subscription(&self, user_id: &str, now: DateTime<Utc>) -> Result<Option<Subscription>> {
        let Some(current) = self.load_subscription(user_id)? else {
            warn!(user_id, "upgrade requested for a user without a subscription");
            return Ok(None);
        };

        let upgraded = entitlement::upgrade(&current, now);
        self.upsert_subscription(&upgraded)?;
        self.audit(AuditEntry::new(
            user_id,
            AuditAction::SubscriptionUpgraded,
            "subscription",
            user_id,
            serde_json::json!({ "from": current.plan.as_str(), "to": upgraded.plan.as_str() }),
        ));
        info!(user_id, "subscription upgraded to premium");

        Ok(Some(upgraded))
    }

    fn load_subscription(&self, user_id: &str) -> Result<Option<Subscription>> {
        let row = self
            .conn
            .query_row(
                "SELECT user_id, plan, status, trial_end_date, created_at, updated_at
                 FROM subscriptions WHERE user_id = ?1",
                params![user_id],
                |row| {
                    Ok((
                        row.get::<_, String>(0)?,
                        row.get::<_, String>(1)?,
                        row.get::<_, String>(2)?,
                        row.get::<_, Option<String>>(3)?,
                        row.get::<_, String>(4)?,
                        row.get::<_, String>(5)?,
                    ))
                },
            )
            .optional()?;

        let Some((user_id, plan, status, trial_end, created_at, updated_at)) = row else {
            return Ok(None);
        };

        let subscription = Subscription {
            plan: Plan::parse(&plan).ok_or_else(|| anyhow!("Unknown plan '{}' for {}", plan, user_id))?,
            status: SubscriptionStatus::parse(&status)
                .ok_or_else(|| anyhow!("Unknown status '{}' for {}", status, user_id))?,
            trial_end_date: match trial_end {
                Some(s) => Some(
                    entitlement::parse_trial_end(&s)
                        .ok_or_else(|| anyhow!("Bad trial_end_date '{}' for {}", s, user_id))?,
                ),
                None => None,
            },
            created_at: parse_timestamp(&created_at)?,
            updated_at: parse_timestamp(&updated_at)?,
            user_id,
        };

        Ok(Some(subscription))
    }

    // ------------------------------------------------------------------------
    // Reads
    // ------------------------------------------------------------------------

    pub fn get_income(&self, user_id: &str) -> Result<Vec<Income>> {
        let mut stmt = self.conn.prepare(
            "SELECT id, user_id, amount, date, source, category, notes, created_at
             FROM income WHERE user_id = ?1 ORDER BY date DESC",
        )?;
        let rows = stmt
            .query_map(params![user_id], |row| {
                Ok(Income {
                    id: row.get(0)?,
                    user_id: row.get(1)?,
                    amount: row.get(2)?,
                    date: row.get(3)?,
                    source: row.get(4)?,
                    category: row.get(5)?,
                    notes: row.get(6)?,
                    created_at: row.get(7)?,
                })
            })?;
        Ok(keep_valid(rows))
    }

    pub fn get_expenses(&self, user_id: &str) -> Result<Vec<Expense>> {
        let mut stmt = self.conn.prepare(
            "SELECT id, user_id, amount, date, vendor, category, notes, created_at
             FROM expenses WHERE user_id = ?1 ORDER BY date DESC",
        )?;
        let rows = stmt
            .query_map(params![user_id], |row| {
                Ok(Expense {
                    id: row.get(0)?,
                    user_id: row.get(1)?,
                    amount: row.get(2)?,
                    date: row.get(3)?,
                    vendor: row.get(4)?,
                    category: row.get(5)?,
                    notes: row.get(6)?,
                    created_at: row.get(7)?,
                })
            })?;
        Ok(keep_valid(rows))
    }

    pub fn get_investments(&self, user_id: &str) -> Result<Vec<Investment>> {
        let mut stmt = self.conn.prepare(
            "SELECT id, user_id, amount, date, type, platform, notes, created_at
             FROM investments WHERE user_id = ?1 ORDER BY date DESC",
        )?;
        let rows = stmt
            .query_map(params![user_id], |row| {
                Ok(Investment {
                    id: row.get(0)?,
                    user_id: row.get(1)?,
                    amount: row.get(2)?,
                    date: row.get(3)?,
                    investment_type: row.get(4)?,
                    platform: row.get(5)?,
                    notes: row.get(6)?,
                    created_at: row.get(7)?,
                })
            })?;
        Ok(keep_valid(rows))
    }

    pub fn get_savings_goals(&self, user_id: &str) -> Result<Vec<SavingsGoal>> {
        let mut stmt = self.conn.prepare(
            "SELECT id, user_id, goal_name, target_amount, current_amount, deadline, notes, created_at
             FROM savings_goals WHERE user_id = ?1 ORDER BY created_at",
        )?;
        let rows = stmt
            .query_map(params![user_id], |row| {
                Ok(SavingsGoal {
                    id: row.get(0)?,
                    user_id: row.get(1)?,
                    goal_name: row.get(2)?,
                    target_amount: row.get(3)?,
                    current_amount: row.get(4)?,
                    deadline: row.get(5)?,
                    notes: row.get(6)?,
                    created_at: row.get(7)?,
                })
            })?;
        Ok(keep_valid(rows))
    }

    pub fn get_budgets(&self, user_id: &str) -> Result<Vec<Budget>> {
        let mut stmt = self.conn.prepare(
            "SELECT id, user_id, category, budget_limit, start_date, created_at
             FROM budgets WHERE user_id = ?1 ORDER BY created_at",
        )?;
        let rows = stmt
            .query_map(params![user_id], |row| {
                Ok(Budget {
                    id: row.get(0)?,
                    user_id: row.get(1)?,
                    category: row.get(2)?,
                    budget_limit: row.get(3)?,
                    start_date: row.get(4)?,
                    created_at: row.get(5)?,
                })
            })?;
        Ok(keep_valid(rows))
    }

    pub fn count(&self, kind: RecordKind, user_id: &str) -> Result<i64> {
        let sql = format!("SELECT COUNT(*) FROM {} WHERE user_id = ?1", kind.table());
        let count = self.conn.query_row(&sql, params![user_id], |row| row.get(0))?;
        Ok(count)
    }
}

fn parse_timestamp(s: &str) -> Result<DateTime<Utc>> {
    Ok(DateTime::parse_from_rfc3339(s)
        .with_context(|| format!("Bad timestamp: {}", s))?
        .with_timezone(&Utc))
}

/// Drop rows that cannot be decoded or violate record invariants; the
/// aggregators only ever see valid data
fn keep_valid<R: Record>(rows: impl Iterator<Item = rusqlite::Result<R>>) -> Vec<R> {
    let mut total = 0;
    let mut valid = Vec::new();
    for row in rows {
        total += 1;
        match row {
            Ok(record) => match record.validate() {
                Ok(()) => valid.push(record),
                Err(e) => warn!(kind = R::KIND.as_str(), id = record.id(), error = %e, "skipping invalid row"),
            },
            Err(e) => warn!(kind = R::KIND.as_str(), error = %e, "skipping unreadable row"),
        }
    }
    debug!(kind = R::KIND.as_str(), total, kept = valid.len(), "rows loaded");
    valid
}

impl DataSource for SqliteStore {
    fn income(&self, user_id: &str) -> Result<Vec<Income>> {
        self.get_income(user_id)
    }

    fn expenses(&self, user_id: &str) -> Result<Vec<Expense>> {
        self.get_expenses(user_id)
    }

    fn investments(&self, user_id: &str) -> Result<Vec<Investment>> {
        self.get_investments(user_id)
    }

    fn savings_goals(&self, user_id: &str) -> Result<Vec<SavingsGoal>> {
        self.get_savings_goals(user_id)
    }

    fn budgets(&self, user_id: &str) -> Result<Vec<Budget>> {
        self.get_budgets(user_id)
    }

    fn subscription(&self, user_id: &str) -> Result<Option<Subscription>> {
        self.load_subscription(user_id)
    }
}

// ============================================================================
// TESTS
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::source::Snapshot;
    use chrono::{Duration, NaiveDate, TimeZone};

    fn date(s: &str) -> NaiveDate {
        NaiveDate::parse_from_str(s, "%Y-%m-%d").unwrap()
    }

    fn now() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2025, 1, 10, 8, 0, 0).unwrap()
    }

    #[test]
    fn test_round_trip_per_user() {
        let store = SqliteStore::open_in_memory().unwrap();

        store.insert_income(&Income::new("alice", 4000.0, date("2025-01-01"), "Salary")).unwrap();
        store.insert_expense(&Expense::new("alice", 45.5, date("2025-01-03"), "Cafe", "Dining")).unwrap();
        store.insert_expense(&Expense::new("bob", 999.0, date("2025-01-03"), "Shop", "Misc")).unwrap();
        store
            .insert_investment(&Investment::new("alice", 300.0, date("2025-01-04"), "Stocks", "Vanguard"))
            .unwrap();

        let mut goal = SavingsGoal::new("alice", "Car", 8000.0, 1000.0);
        goal.deadline = Some(date("2025-12-01"));
        store.insert_savings_goal(&goal).unwrap();
        store.insert_budget(&Budget::new("alice", "Dining", 200.0, date("2025-01-01"))).unwrap();

        let expenses = store.get_expenses("alice").unwrap();
        assert_eq!(expenses.len(), 1);
        assert_eq!(expenses[0].vendor, "Cafe");
        assert_eq!(expenses[0].date, date("2025-01-03"));

        let goals = store.get_savings_goals("alice").unwrap();
        assert_eq!(goals[0].deadline, Some(date("2025-12-01")));

        let investments = store.get_investments("alice").unwrap();
        assert_eq!(investments[0].investment_type, "Stocks");

        assert_eq!(store.count(RecordKind::Expense, "bob").unwrap(), 1);
        assert_eq!(store.get_income("bob").unwrap().len(), 0);
    }

    #[test]
    fn test_invalid_records_are_rejected_on_insert() {
        let store = SqliteStore::open_in_memory().unwrap();
        let bad = Expense::new("alice", -10.0, date("2025-01-03"), "Cafe", "Dining");
        assert!(store.insert_expense(&bad).is_err());
        assert_eq!(store.count(RecordKind::Expense, "alice").unwrap(), 0);
    }

    #[test]
    fn test_invalid_rows_are_skipped_on_read() {
        let store = SqliteStore::open_in_memory().unwrap();
        store.insert_budget(&Budget::new("alice", "Travel", 500.0, date("2025-01-01"))).unwrap();
        store
            .connection()
            .execute(
                "INSERT INTO budgets (id, user_id, category, budget_limit, start_date, created_at)
                 VALUES ('broken', 'alice', 'Food', 0, '2025-01-01', '2025-01-01T00:00:00Z')",
                [],
            )
            .unwrap();

        let budgets = store.get_budgets("alice").unwrap();
        assert_eq!(budgets.len(), 1);
        assert_eq!(budgets[0].category, "Travel");
    }

    #[test]
    fn test_unreadable_row_does_not_hide_the_rest() {
        let store = SqliteStore::open_in_memory().unwrap();
        store.insert_expense(&Expense::new("alice", 20.0, date("2025-01-05"), "Cafe", "Dining")).unwrap();
        store.insert_expense(&Expense::new("alice", 30.0, date("2025-01-02"), "Bus", "Transport")).unwrap();
        store
            .connection()
            .execute(
                "INSERT INTO expenses (id, user_id, amount, date, vendor, category, notes, created_at)
                 VALUES ('garbled', 'alice', 10.0, 'not-a-date', 'Shop', 'Misc', NULL, '2025-01-01T00:00:00Z')",
                [],
            )
            .unwrap();

        let expenses = store.get_expenses("alice").unwrap();
        assert_eq!(expenses.len(), 2);
        assert!(expenses.iter().all(|e| e.id != "garbled"));
        assert_eq!(store.count(RecordKind::Expense, "alice").unwrap(), 3);
    }

    #[test]
    fn test_start_trial_once() {
        let store = SqliteStore::open_in_memory().unwrap();
        let started = store.start_trial("carol", now(), 14).unwrap().unwrap();
        assert_eq!(started.plan, Plan::Free);
        assert_eq!(store.subscription("carol").unwrap(), Some(started));

        assert!(store.start_trial("carol", now(), 30).unwrap().is_none());

        let trail = store.audit_trail("carol").unwrap();
        assert_eq!(trail.len(), 1);
        assert_eq!(trail[0].action, AuditAction::TrialStarted);
        assert_eq!(trail[0].detail["trial_days"], 14);
    }

    #[test]
    fn test_audit_action_names() {
        for action in [
            AuditAction::RecordAdded,
            AuditAction::RecordDeleted,
            AuditAction::TrialStarted,
            AuditAction::SubscriptionUpgraded,
        ] {
            assert_eq!(AuditAction::parse(action.as_str()), Some(action));
        }
        assert_eq!(AuditAction::parse("shredded"), None);
    }

    #[test]
    fn test_delete_is_scoped_to_owner() {
        let store = SqliteStore::open_in_memory().unwrap();
        let expense = Expense::new("alice", 12.0, date("2025-01-03"), "Cafe", "Dining");
        store.insert_expense(&expense).unwrap();

        assert!(!store.delete_record(RecordKind::Expense, "bob", &expense.id).unwrap());
        assert!(store.delete_record(RecordKind::Expense, "alice", &expense.id).unwrap());
        assert!(store.get_expenses("alice").unwrap().is_empty());

        let trail = store.audit_trail("alice").unwrap();
        let actions: Vec<AuditAction> = trail.iter().map(|e| e.action).collect();
        assert_eq!(actions, vec![AuditAction::RecordDeleted, AuditAction::RecordAdded]);
        assert!(trail.iter().all(|e| e.subject == "expense" && e.subject_id == expense.id));
        assert_eq!(trail[1].detail["amount"], 12.0);
        assert!(store.audit_trail("bob").unwrap().is_empty());
    }

    #[test]
    fn test_upgrade_subscription() {
        let store = SqliteStore::open_in_memory().unwrap();
        let trial = Subscription::free_trial("alice", now() - Duration::days(20), 14);
        store.upsert_subscription(&trial).unwrap();

        let loaded = store.subscription("alice").unwrap().unwrap();
        assert_eq!(loaded.plan, Plan::Free);
        assert!(entitlement::is_trial_ended(Some(&loaded), now()));

        let upgraded = store.upgrade_subscription("alice", now()).unwrap().unwrap();
        assert_eq!(upgraded.plan, Plan::Premium);

        let reloaded = store.subscription("alice").unwrap().unwrap();
        assert_eq!(reloaded.plan, Plan::Premium);
        assert_eq!(reloaded.status, SubscriptionStatus::Active);
        assert_eq!(reloaded.trial_end_date, None);
        assert_eq!(reloaded.updated_at, now());
        assert!(entitlement::has_premium_access(Some(&reloaded), now()));

        let trail = store.audit_trail("alice").unwrap();
        assert_eq!(trail.len(), 1);
        assert_eq!(trail[0].action, AuditAction::SubscriptionUpgraded);
        assert_eq!(trail[0].detail["from"], "free");
        assert_eq!(trail[0].detail["to"], "premium");
    }

    #[test]
    fn test_upgrade_without_subscription() {
        let store = SqliteStore::open_in_memory().unwrap();
        assert!(store.upgrade_subscription("nobody", now()).unwrap().is_none());
        assert!(store.subscription("nobody").unwrap().is_none());
    }

    #[test]
    fn test_snapshot_from_store() {
        let store = SqliteStore::open_in_memory().unwrap();
        store.insert_income(&Income::new("alice", 100.0, date("2025-01-01"), "Gift")).unwrap();

        let snapshot = Snapshot::load(&store, "alice");
        assert!(!snapshot.demo);
        assert_eq!(snapshot.income.len(), 1);
        assert!(snapshot.subscription.is_none());
    }
}
