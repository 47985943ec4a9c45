// 👑 Entitlement Evaluator - trial / premium access
//
// Every check here fails closed: a missing or incomplete subscription never
// grants premium access, and nothing in this module returns an error.
//
// All predicates derive from one classification (`TrialState`) so they cannot
// disagree about what a subscription means.

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Deserializer, Serialize};
use tracing::warn;

const DAY_MS: i64 = 24 * 60 * 60 * 1000;

// ============================================================================
// SUBSCRIPTION
// ============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Plan {
    Free,
    Premium,
}

impl Plan {
    pub fn as_str(&self) -> &'static str {
        match self {
            Plan::Free => "free",
            Plan::Premium => "premium",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "free" => Some(Plan::Free),
            "premium" => Some(Plan::Premium),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SubscriptionStatus {
    Active,
    Inactive,
}

impl SubscriptionStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            SubscriptionStatus::Active => "active",
            SubscriptionStatus::Inactive => "inactive",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "active" => Some(SubscriptionStatus::Active),
            "inactive" => Some(SubscriptionStatus::Inactive),
            _ => None,
        }
    }
}

/// One per user
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Subscription {
    pub user_id: String,
    pub plan: Plan,
    pub status: SubscriptionStatus,
    /// Only meaningful on the free plan
    #[serde(default, deserialize_with = "deserialize_trial_end")]
    pub trial_end_date: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Subscription {
    /// Free plan with a trial ending `trial_days` from `now`
    pub fn free_trial(user_id: &str, now: DateTime<Utc>, trial_days: i64) -> Self {
        Subscription {
            user_id: user_id.to_string(),
            plan: Plan::Free,
            status: SubscriptionStatus::Active,
            trial_end_date: Some(now + chrono::Duration::days(trial_days)),
            created_at: now,
            updated_at: now,
        }
    }
}

/// Trial ends arrive either as full timestamps or as bare dates.
/// A bare date means midnight UTC of that day.
fn deserialize_trial_end<'de, D>(deserializer: D) -> Result<Option<DateTime<Utc>>, D::Error>
where
    D: Deserializer<'de>,
{
    let raw: Option<String> = Option::deserialize(deserializer)?;
    match raw.as_deref().map(str::trim) {
        None | Some("") => Ok(None),
        Some(s) => parse_trial_end(s)
            .map(Some)
            .ok_or_else(|| serde::de::Error::custom(format!("invalid trial_end_date: {}", s))),
    }
}

pub fn parse_trial_end(s: &str) -> Option<DateTime<Utc>> {
    if let Ok(dt) = DateTime::parse_from_rfc3339(s) {
        return Some(dt.with_timezone(&Utc));
    }
    NaiveDate::parse_from_str(s, "%Y-%m-%d")
        .ok()
        .and_then(|d| d.and_hms_opt(0, 0, 0))
        .map(|naive| naive.and_utc())
}

// ============================================================================
// TRIAL STATE
// ============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "state", rename_all = "snake_case")]
pub enum TrialState {
    /// No subscription record
    Missing,
    /// Paid and active
    Premium,
    /// Free plan inside its trial window
    Trialing { ends_at: DateTime<Utc> },
    /// Free plan past its trial end
    Expired { ended_at: DateTime<Utc> },
    /// Active free plan with no trial end: needs backfill
    Incomplete,
    /// Deactivated subscription
    Inactive,
}

impl TrialState {
    pub fn classify(subscription: Option<&Subscription>, now: DateTime<Utc>) -> Self {
        let Some(sub) = subscription else {
            return TrialState::Missing;
        };

        match (sub.plan, sub.status, sub.trial_end_date) {
            (Plan::Premium, SubscriptionStatus::Active, _) => TrialState::Premium,
            (Plan::Premium, SubscriptionStatus::Inactive, _) => TrialState::Inactive,
            (Plan::Free, _, Some(end)) if now > end => TrialState::Expired { ended_at: end },
            (Plan::Free, SubscriptionStatus::Active, Some(end)) => TrialState::Trialing { ends_at: end },
            (Plan::Free, SubscriptionStatus::Active, None) => TrialState::Incomplete,
            (Plan::Free, SubscriptionStatus::Inactive, _) => TrialState::Inactive,
        }
    }

    pub fn grants_premium(&self) -> bool {
        matches!(self, TrialState::Premium | TrialState::Trialing { .. })
    }

    pub fn label(&self) -> &'static str {
        match self {
            TrialState::Missing => "missing",
            TrialState::Premium => "premium",
            TrialState::Trialing { .. } => "trialing",
            TrialState::Expired { .. } => "expired",
            TrialState::Incomplete => "incomplete",
            TrialState::Inactive => "inactive",
        }
    }
}

// ============================================================================
// PREDICATES
// ============================================================================

pub fn has_premium_access(subscription: Option<&Subscription>, now: DateTime<Utc>) -> bool {
    let state = TrialState::classify(subscription, now);
    if state == TrialState::Incomplete {
        if let Some(sub) = subscription {
            warn!(user_id = %sub.user_id, "active free plan has no trial end date, denying premium access");
        }
    }
    state.grants_premium()
}

pub fn is_trial_ended(subscription: Option<&Subscription>, now: DateTime<Utc>) -> bool {
    matches!(TrialState::classify(subscription, now), TrialState::Expired { .. })
}

/// Whole days left in the trial, rounded up; 0 once ended or without a trial end
pub fn days_remaining(subscription: Option<&Subscription>, now: DateTime<Utc>) -> i64 {
    let Some(end) = subscription.and_then(|s| s.trial_end_date) else {
        return 0;
    };
    let ms = (end - now).num_milliseconds();
    if ms <= 0 {
        0
    } else {
        (ms + DAY_MS - 1) / DAY_MS
    }
}

/// Trial end as shown to users, e.g. "January 5, 2025"; empty without one
pub fn trial_end_display(subscription: Option<&Subscription>) -> String {
    subscription
        .and_then(|s| s.trial_end_date)
        .map(|end| end.format("%B %-d, %Y").to_string())
        .unwrap_or_default()
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum IntegrityWarning {
    /// Active free plan with no trial end
    MissingTrialEnd { user_id: String },
    /// Premium plan still carrying a trial end
    StaleTrialEnd { user_id: String },
}

impl IntegrityWarning {
    pub fn message(&self) -> String {
        match self {
            IntegrityWarning::MissingTrialEnd { user_id } => {
                format!("subscription for {} is on the free plan without a trial end date", user_id)
            }
            IntegrityWarning::StaleTrialEnd { user_id } => {
                format!("premium subscription for {} still has a trial end date", user_id)
            }
        }
    }
}

pub fn integrity_warning(subscription: Option<&Subscription>) -> Option<IntegrityWarning> {
    let sub = subscription?;
    match (sub.plan, sub.status, sub.trial_end_date) {
        (Plan::Free, SubscriptionStatus::Active, None) => Some(IntegrityWarning::MissingTrialEnd {
            user_id: sub.user_id.clone(),
        }),
        (Plan::Premium, _, Some(_)) => Some(IntegrityWarning::StaleTrialEnd {
            user_id: sub.user_id.clone(),
        }),
        _ => None,
    }
}

/// Payment succeeded: premium, active, trial cleared
pub fn upgrade(subscription: &Subscription, now: DateTime<Utc>) -> Subscription {
    Subscription {
        plan: Plan::Premium,
        status: SubscriptionStatus::Active,
        trial_end_date: None,
        updated_at: now,
        ..subscription.clone()
    }
}

// ============================================================================
// ENTITLEMENT VIEW
// ============================================================================

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Entitlement {
    pub state: TrialState,
    pub has_premium_access: bool,
    pub trial_ended: bool,
    pub days_remaining: i64,
    pub trial_ends_on: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub warning: Option<String>,
}

impl Entitlement {
    pub fn evaluate(subscription: Option<&Subscription>, now: DateTime<Utc>) -> Self {
        Entitlement {
            state: TrialState::classify(subscription, now),
            has_premium_access: has_premium_access(subscription, now),
            trial_ended: is_trial_ended(subscription, now),
            days_remaining: days_remaining(subscription, now),
            trial_ends_on: trial_end_display(subscription),
            warning: integrity_warning(subscription).map(|w| w.message()),
        }
    }
}

// ============================================================================
// TESTS
// ============================================================================
