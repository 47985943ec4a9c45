// 🌐 REST API - JSON view models over a DataSource
//
// Handlers move the store work onto tokio's blocking pool, where it takes the
// backend lock, loads a snapshot and derives the view; the reply uses the
// `ApiResponse` envelope. Writes (upgrade, delete) are only possible
// against the live store.

use crate::budget::{evaluate_budgets, BudgetProgress};
use crate::dashboard::DashboardView;
use crate::db::SqliteStore;
use crate::entitlement::{has_premium_access, Entitlement, Subscription};
use crate::fixtures::FixtureSource;
use crate::gate::{FeatureGate, PremiumFeature};
use crate::records::RecordKind;
use crate::savings::{goal_progress, savings_totals, GoalProgress, SavingsTotals};
use crate::source::{DataSource, Snapshot};
use crate::summary::FinancialSummary;
use axum::{
    extract::{Path, State},
    http::StatusCode,
    response::{IntoResponse, Json, Response},
    routing::{delete, get, post},
    Router,
};
use chrono::Utc;
use serde::Serialize;
use std::sync::{Arc, Mutex, MutexGuard};
use tower_http::cors::CorsLayer;
use tracing::error;

/// Where the server reads from
pub enum Backend {
    Live(SqliteStore),
    Demo(FixtureSource),
}

impl Backend {
    pub fn source(&self) -> &dyn DataSource {
        match self {
            Backend::Live(store) => store,
            Backend::Demo(fixtures) => fixtures,
        }
    }
}

/// Shared application state
#[derive(Clone)]
pub struct AppState {
    backend: Arc<Mutex<Backend>>,
    months: usize,
}

impl AppState {
    pub fn new(backend: Backend, months: usize) -> Self {
        AppState {
            backend: Arc::new(Mutex::new(backend)),
            months,
        }
    }

    fn backend(&self) -> MutexGuard<'_, Backend> {
        // A panicked handler cannot leave the store half-written: every write is one statement
        self.backend.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    fn snapshot(&self, user_id: &str) -> Snapshot {
        Snapshot::load(self.backend().source(), user_id)
    }
}

/// API Response wrapper
#[derive(Serialize)]
pub struct ApiResponse<T> {
    pub success: bool,
    pub data: Option<T>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl<T: Serialize> ApiResponse<T> {
    fn ok(data: T) -> Response {
        (
            StatusCode::OK,
            Json(ApiResponse {
                success: true,
                data: Some(data),
                error: None,
            }),
        )
            .into_response()
    }
}

fn failure(status: StatusCode, message: impl Into<String>) -> Response {
    (
        status,
        Json(ApiResponse::<()> {
            success: false,
            data: None,
            error: Some(message.into()),
        }),
    )
        .into_response()
}

#[derive(Serialize)]
struct BudgetsResponse {
    budgets: Vec<BudgetProgress>,
    can_create: FeatureGate,
}

#[derive(Serialize)]
struct SavingsResponse {
    goals: Vec<GoalProgress>,
    totals: SavingsTotals,
}

#[derive(Serialize)]
struct SubscriptionResponse {
    #[serde(skip_serializing_if = "Option::is_none")]
    subscription: Option<Subscription>,
    entitlement: Entitlement,
    benefits: Vec<&'static str>,
}

// ============================================================================
// API Handlers
// ============================================================================

/// GET /api/health
async fn health_check() -> Response {
    ApiResponse::ok("OK")
}

/// Store calls are synchronous; run them on the blocking pool, never on an async worker
async fn run_blocking<F>(state: AppState, work: F) -> Response
where
    F: FnOnce(&AppState) -> Response + Send + 'static,
{
    match tokio::task::spawn_blocking(move || work(&state)).await {
        Ok(response) => response,
        Err(e) => {
            error!(error = %e, "store task failed");
            failure(StatusCode::INTERNAL_SERVER_ERROR, "Internal error")
        }
    }
}

/// GET /api/users/:user/dashboard
async fn get_dashboard(State(state): State<AppState>, Path(user_id): Path<String>) -> Response {
    run_blocking(state, move |state| {
        let snapshot = state.snapshot(&user_id);
        ApiResponse::ok(DashboardView::build(&snapshot, Utc::now(), state.months))
    })
    .await
}

/// GET /api/users/:user/budgets
async fn get_budgets(State(state): State<AppState>, Path(user_id): Path<String>) -> Response {
    run_blocking(state, move |state| {
        let now = Utc::now();
        let snapshot = state.snapshot(&user_id);
        let access = has_premium_access(snapshot.subscription.as_ref(), now);

        ApiResponse::ok(BudgetsResponse {
            budgets: evaluate_budgets(&snapshot.budgets, &snapshot.expenses, now),
            can_create: FeatureGate::evaluate(access, snapshot.demo),
        })
    })
    .await
}

/// GET /api/users/:user/savings
async fn get_savings(State(state): State<AppState>, Path(user_id): Path<String>) -> Response {
    run_blocking(state, move |state| {
        let snapshot = state.snapshot(&user_id);
        ApiResponse::ok(SavingsResponse {
            goals: snapshot.savings_goals.iter().map(goal_progress).collect(),
            totals: savings_totals(&snapshot.savings_goals),
        })
    })
    .await
}

/// GET /api/users/:user/report
async fn get_report(State(state): State<AppState>, Path(user_id): Path<String>) -> Response {
    run_blocking(state, move |state| {
        let snapshot = state.snapshot(&user_id);
        ApiResponse::ok(FinancialSummary::from_records(
            &snapshot.income,
            &snapshot.expenses,
            &snapshot.investments,
            &snapshot.savings_goals,
            state.months,
        ))
    })
    .await
}

/// GET /api/users/:user/subscription
async fn get_subscription(State(state): State<AppState>, Path(user_id): Path<String>) -> Response {
    run_blocking(state, move |state| {
        let subscription = state.snapshot(&user_id).subscription;
        ApiResponse::ok(SubscriptionResponse {
            entitlement: Entitlement::evaluate(subscription.as_ref(), Utc::now()),
            subscription,
            benefits: PremiumFeature::ALL.iter().map(|f| f.benefit()).collect(),
        })
    })
    .await
}

/// POST /api/users/:user/subscription/upgrade - called after the payment widget reports success
async fn upgrade_subscription(State(state): State<AppState>, Path(user_id): Path<String>) -> Response {
    run_blocking(state, move |state| {
        let backend = state.backend();
        let Backend::Live(store) = &*backend else {
            return failure(StatusCode::FORBIDDEN, "Sign up to start a subscription");
        };

        match store.upgrade_subscription(&user_id, Utc::now()) {
            Ok(Some(upgraded)) => ApiResponse::ok(upgraded),
            Ok(None) => failure(StatusCode::NOT_FOUND, "No subscription for this user"),
            Err(e) => {
                error!(user_id = %user_id, error = %e, "upgrade failed");
                failure(StatusCode::INTERNAL_SERVER_ERROR, "Failed to activate subscription")
            }
        }
    })
    .await
}

/// DELETE /api/users/:user/records/:kind/:id - premium only
async fn delete_record(
    State(state): State<AppState>,
    Path((user_id, kind, id)): Path<(String, String, String)>,
) -> Response {
    let kind: RecordKind = match kind.parse() {
        Ok(kind) => kind,
        Err(e) => return failure(StatusCode::BAD_REQUEST, format!("{}", e)),
    };

    run_blocking(state, move |state| {
        let backend = state.backend();
        let Backend::Live(store) = &*backend else {
            return failure(StatusCode::FORBIDDEN, FeatureGate::SignUpRequired.hint().unwrap_or_default());
        };

        let subscription = match store.subscription(&user_id) {
            Ok(subscription) => subscription,
            Err(e) => {
                error!(user_id = %user_id, error = %e, "failed to load subscription");
                None
            }
        };
        let gate = FeatureGate::evaluate(has_premium_access(subscription.as_ref(), Utc::now()), false);
        if !gate.is_allowed() {
            return failure(StatusCode::FORBIDDEN, gate.hint().unwrap_or_default());
        }

        match store.delete_record(kind, &user_id, &id) {
            Ok(true) => ApiResponse::ok(id),
            Ok(false) => failure(StatusCode::NOT_FOUND, "Record not found"),
            Err(e) => {
                error!(user_id = %user_id, id = %id, error = %e, "delete failed");
                failure(StatusCode::INTERNAL_SERVER_ERROR, "Failed to delete record")
            }
        }
    })
    .await
}

pub fn router(state: AppState) -> Router {
    let api_routes = Router::new()
        .route("/health", get(health_check))
        .route("/users/:user/dashboard", get(get_dashboard))
        .route("/users/:user/budgets", get(get_budgets))
        .route("/users/:user/savings", get(get_savings))
        .route("/users/:user/report", get(get_report))
        .route("/users/:user/subscription", get(get_subscription))
        .route("/users/:user/subscription/upgrade", post(upgrade_subscription))
        .route("/users/:user/records/:kind/:id", delete(delete_record))
        .with_state(state);

    Router::new()
        .nest("/api", api_routes)
        .layer(CorsLayer::permissive())
}

// ============================================================================
// TESTS
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::records::Expense;
    use axum::body::{to_bytes, Body};
    use axum::http::{Method, Request};
    use chrono::{Duration, NaiveDate};
    use tower::ServiceExt;

    async fn call(app: Router, method: Method, uri: &str) -> (StatusCode, serde_json::Value) {
        let response = app
            .oneshot(Request::builder().method(method).uri(uri).body(Body::empty()).unwrap())
            .await
            .unwrap();
        let status = response.status();
        let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        (status, serde_json::from_slice(&bytes).unwrap())
    }

    fn live_state() -> (AppState, String) {
        let store = SqliteStore::open_in_memory().unwrap();
        let today = Utc::now().date_naive();
        let expense = Expense::new("alice", 40.0, today, "Cafe", "Dining");
        let id = expense.id.clone();
        store.insert_expense(&expense).unwrap();
        (AppState::new(Backend::Live(store), 6), id)
    }

    #[tokio::test]
    async fn test_health() {
        let app = router(AppState::new(Backend::Demo(FixtureSource::new(Utc::now())), 6));
        let (status, body) = call(app, Method::GET, "/api/health").await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["data"], "OK");
    }

    #[tokio::test]
    async fn test_demo_dashboard() {
        let app = router(AppState::new(Backend::Demo(FixtureSource::new(Utc::now())), 6));
        let (status, body) = call(app, Method::GET, "/api/users/demo/dashboard").await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["success"], true);
        assert_eq!(body["data"]["demo"], true);
        assert_eq!(body["data"]["monthly"].as_array().unwrap().len(), 6);
    }

    #[tokio::test]
    async fn test_demo_cannot_upgrade() {
        let app = router(AppState::new(Backend::Demo(FixtureSource::new(Utc::now())), 6));
        let (status, body) = call(app, Method::POST, "/api/users/demo/subscription/upgrade").await;
        assert_eq!(status, StatusCode::FORBIDDEN);
        assert_eq!(body["success"], false);
    }

    #[tokio::test]
    async fn test_delete_requires_premium() {
        let (state, id) = live_state();
        let app = router(state);
        let (status, body) = call(app, Method::DELETE, &format!("/api/users/alice/records/expense/{}", id)).await;
        assert_eq!(status, StatusCode::FORBIDDEN);
        assert_eq!(body["error"], "Upgrade to premium to use this feature");
    }

    #[tokio::test]
    async fn test_upgrade_then_delete() {
        let (state, id) = live_state();
        {
            let backend = state.backend();
            if let Backend::Live(store) = &*backend {
                let trial = Subscription::free_trial("alice", Utc::now() - Duration::days(30), 14);
                store.upsert_subscription(&trial).unwrap();
            }
        }

        let (status, body) = call(router(state.clone()), Method::POST, "/api/users/alice/subscription/upgrade").await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["data"]["plan"], "premium");

        let (status, _) = call(router(state.clone()), Method::DELETE, &format!("/api/users/alice/records/expenses/{}", id)).await;
        assert_eq!(status, StatusCode::OK);

        let (status, _) = call(router(state), Method::DELETE, &format!("/api/users/alice/records/expenses/{}", id)).await;
        assert_eq!(status, StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn test_budgets_endpoint() {
        let (state, _) = live_state();
        {
            let backend = state.backend();
            if let Backend::Live(store) = &*backend {
                let start = NaiveDate::from_ymd_opt(2025, 1, 1).unwrap();
                store
                    .insert_budget(&crate::records::Budget::new("alice", "Dining", 50.0, start))
                    .unwrap();
            }
        }

        let (status, body) = call(router(state), Method::GET, "/api/users/alice/budgets").await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["data"]["budgets"][0]["spent"], 40.0);
        assert_eq!(body["data"]["budgets"][0]["progress"], 80);
        assert_eq!(body["data"]["can_create"], "upgrade_required");
    }

    #[tokio::test]
    async fn test_unknown_kind_is_bad_request() {
        let (state, _) = live_state();
        let (status, _) = call(router(state), Method::DELETE, "/api/users/alice/records/loans/123").await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
    }
}
