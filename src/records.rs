// 📒 Financial records - typed view of the hosted tables
//
// Income, expenses and investments share one shape: a non-negative amount on a
// calendar date. Direction is implied by the collection a record lives in,
// never by a sign. Savings goals and budgets carry their own fields.

use crate::error::{check_non_negative, check_positive, check_present, ValidationError};
use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

// ============================================================================
// RECORD KIND
// ============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RecordKind {
    Income,
    Expense,
    Investment,
    SavingsGoal,
    Budget,
}

impl RecordKind {
    pub const ALL: [RecordKind; 5] = [
        RecordKind::Income,
        RecordKind::Expense,
        RecordKind::Investment,
        RecordKind::SavingsGoal,
        RecordKind::Budget,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            RecordKind::Income => "income",
            RecordKind::Expense => "expense",
            RecordKind::Investment => "investment",
            RecordKind::SavingsGoal => "savings_goal",
            RecordKind::Budget => "budget",
        }
    }

    /// Backing table name in the store
    pub fn table(&self) -> &'static str {
        match self {
            RecordKind::Income => "income",
            RecordKind::Expense => "expenses",
            RecordKind::Investment => "investments",
            RecordKind::SavingsGoal => "savings_goals",
            RecordKind::Budget => "budgets",
        }
    }
}

impl fmt::Display for RecordKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for RecordKind {
    type Err = ValidationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "income" => Ok(RecordKind::Income),
            "expense" | "expenses" => Ok(RecordKind::Expense),
            "investment" | "investments" => Ok(RecordKind::Investment),
            "savings" | "savings_goal" | "savings_goals" => Ok(RecordKind::SavingsGoal),
            "budget" | "budgets" => Ok(RecordKind::Budget),
            other => Err(ValidationError::UnknownKind(other.to_string())),
        }
    }
}

// ============================================================================
// TRAITS
// ============================================================================

/// A dated, categorized amount. Everything the aggregators need.
pub trait Ledger {
    fn date(&self) -> NaiveDate;
    fn amount(&self) -> f64;
    fn category(&self) -> &str;
}

/// Identity and boundary validation shared by every stored record
pub trait Record {
    const KIND: RecordKind;

    fn id(&self) -> &str;

    /// Attach the owner and mint an id when the record has none
    fn assign_identity(&mut self, user_id: &str);

    fn validate(&self) -> Result<(), ValidationError>;
}

fn new_id() -> String {
    uuid::Uuid::new_v4().to_string()
}

// ============================================================================
// INCOME
// ============================================================================

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Income {
    #[serde(default)]
    pub id: String,
    #[serde(default)]
    pub user_id: String,
    pub amount: f64,
    pub date: NaiveDate,
    pub source: String,
    #[serde(default)]
    pub category: String,
    #[serde(default)]
    pub notes: Option<String>,
    #[serde(default = "Utc::now")]
    pub created_at: DateTime<Utc>,
}

impl Income {
    pub fn new(user_id: &str, amount: f64, date: NaiveDate, source: &str) -> Self {
        Income {
            id: new_id(),
            user_id: user_id.to_string(),
            amount,
            date,
            source: source.to_string(),
            category: String::new(),
            notes: None,
            created_at: Utc::now(),
        }
    }

    pub fn with_category(mut self, category: &str) -> Self {
        self.category = category.to_string();
        self
    }
}

impl Ledger for Income {
    fn date(&self) -> NaiveDate {
        self.date
    }

    fn amount(&self) -> f64 {
        self.amount
    }

    /// Income without a category is bucketed under its source
    fn category(&self) -> &str {
        if self.category.is_empty() {
            &self.source
        } else {
            &self.category
        }
    }
}

impl Record for Income {
    const KIND: RecordKind = RecordKind::Income;

    fn id(&self) -> &str {
        &self.id
    }

    fn assign_identity(&mut self, user_id: &str) {
        self.user_id = user_id.to_string();
        if self.id.is_empty() {
            self.id = new_id();
        }
    }

    fn validate(&self) -> Result<(), ValidationError> {
        check_present("user_id", &self.user_id)?;
        check_non_negative("amount", self.amount)?;
        check_present("source", &self.source)
    }
}

// ============================================================================
// EXPENSE
// ============================================================================

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Expense {
    #[serde(default)]
    pub id: String,
    #[serde(default)]
    pub user_id: String,
    pub amount: f64,
    pub date: NaiveDate,
    #[serde(default)]
    pub vendor: String,
    pub category: String,
    #[serde(default)]
    pub notes: Option<String>,
    #[serde(default = "Utc::now")]
    pub created_at: DateTime<Utc>,
}

impl Expense {
    pub fn new(user_id: &str, amount: f64, date: NaiveDate, vendor: &str, category: &str) -> Self {
        Expense {
            id: new_id(),
            user_id: user_id.to_string(),
            amount,
            date,
            vendor: vendor.to_string(),
            category: category.to_string(),
            notes: None,
            created_at: Utc::now(),
        }
    }
}

impl Ledger for Expense {
    fn date(&self) -> NaiveDate {
        self.date
    }

    fn amount(&self) -> f64 {
        self.amount
    }

    fn category(&self) -> &str {
        &self.category
    }
}

impl Record for Expense {
    const KIND: RecordKind = RecordKind::Expense;

    fn id(&self) -> &str {
        &self.id
    }

    fn assign_identity(&mut self, user_id: &str) {
        self.user_id = user_id.to_string();
        if self.id.is_empty() {
            self.id = new_id();
        }
    }

    fn validate(&self) -> Result<(), ValidationError> {
        check_present("user_id", &self.user_id)?;
        check_non_negative("amount", self.amount)?;
        check_present("category", &self.category)
    }
}

// ============================================================================
// INVESTMENT
// ============================================================================

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Investment {
    #[serde(default)]
    pub id: String,
    #[serde(default)]
    pub user_id: String,
    pub amount: f64,
    pub date: NaiveDate,
    /// Asset class, e.g. "Stocks" or "Crypto"
    #[serde(rename = "type")]
    pub investment_type: String,
    #[serde(default)]
    pub platform: String,
    #[serde(default)]
    pub notes: Option<String>,
    #[serde(default = "Utc::now")]
    pub created_at: DateTime<Utc>,
}

impl Investment {
    pub fn new(
        user_id: &str,
        amount: f64,
        date: NaiveDate,
        investment_type: &str,
        platform: &str,
    ) -> Self {
        Investment {
            id: new_id(),
            user_id: user_id.to_string(),
            amount,
            date,
            investment_type: investment_type.to_string(),
            platform: platform.to_string(),
            notes: None,
            created_at: Utc::now(),
        }
    }
}

impl Ledger for Investment {
    fn date(&self) -> NaiveDate {
        self.date
    }

    fn amount(&self) -> f64 {
        self.amount
    }

    fn category(&self) -> &str {
        &self.investment_type
    }
}

impl Record for Investment {
    const KIND: RecordKind = RecordKind::Investment;

    fn id(&self) -> &str {
        &self.id
    }

    fn assign_identity(&mut self, user_id: &str) {
        self.user_id = user_id.to_string();
        if self.id.is_empty() {
            self.id = new_id();
        }
    }

    fn validate(&self) -> Result<(), ValidationError> {
        check_present("user_id", &self.user_id)?;
        check_non_negative("amount", self.amount)?;
        check_present("type", &self.investment_type)
    }
}

// ============================================================================
// SAVINGS GOAL
// ============================================================================

/// `current_amount` may exceed `target_amount`; over-saving is allowed.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SavingsGoal {
    #[serde(default)]
    pub id: String,
    #[serde(default)]
    pub user_id: String,
    pub goal_name: String,
    pub target_amount: f64,
    #[serde(default)]
    pub current_amount: f64,
    #[serde(default)]
    pub deadline: Option<NaiveDate>,
    #[serde(default)]
    pub notes: Option<String>,
    #[serde(default = "Utc::now")]
    pub created_at: DateTime<Utc>,
}

impl SavingsGoal {
    pub fn new(user_id: &str, goal_name: &str, target_amount: f64, current_amount: f64) -> Self {
        SavingsGoal {
            id: new_id(),
            user_id: user_id.to_string(),
            goal_name: goal_name.to_string(),
            target_amount,
            current_amount,
            deadline: None,
            notes: None,
            created_at: Utc::now(),
        }
    }
}

impl Record for SavingsGoal {
    const KIND: RecordKind = RecordKind::SavingsGoal;

    fn id(&self) -> &str {
        &self.id
    }

    fn assign_identity(&mut self, user_id: &str) {
        self.user_id = user_id.to_string();
        if self.id.is_empty() {
            self.id = new_id();
        }
    }

    fn validate(&self) -> Result<(), ValidationError> {
        check_present("user_id", &self.user_id)?;
        check_present("goal_name", &self.goal_name)?;
        check_positive("target_amount", self.target_amount)?;
        check_non_negative("current_amount", self.current_amount)
    }
}

// ============================================================================
// BUDGET
// ============================================================================

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Budget {
    #[serde(default)]
    pub id: String,
    #[serde(default)]
    pub user_id: String,
    pub category: String,
    pub budget_limit: f64,
    pub start_date: NaiveDate,
    #[serde(default = "Utc::now")]
    pub created_at: DateTime<Utc>,
}

impl Budget {
    pub fn new(user_id: &str, category: &str, budget_limit: f64, start_date: NaiveDate) -> Self {
        Budget {
            id: new_id(),
            user_id: user_id.to_string(),
            category: category.to_string(),
            budget_limit,
            start_date,
            created_at: Utc::now(),
        }
    }
}

impl Record for Budget {
    const KIND: RecordKind = RecordKind::Budget;

    fn id(&self) -> &str {
        &self.id
    }

    fn assign_identity(&mut self, user_id: &str) {
        self.user_id = user_id.to_string();
        if self.id.is_empty() {
            self.id = new_id();
        }
    }

    fn validate(&self) -> Result<(), ValidationError> {
        check_present("user_id", &self.user_id)?;
        check_present("category", &self.category)?;
        check_positive("budget_limit", self.budget_limit)
    }
}

/// Sum of amounts, no filtering
pub fn total<R: Ledger>(records: &[R]) -> f64 {
    records.iter().map(Ledger::amount).sum()
}

// ============================================================================
// TESTS
// ============================================================================
