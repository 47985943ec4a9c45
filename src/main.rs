use anyhow::{bail, Context, Result};
use chrono::Utc;
use clap::{Parser, Subcommand};
use std::path::PathBuf;

use fintrack::config::resolve_settings;
use fintrack::entitlement::{has_premium_access, Entitlement, TrialState};
use fintrack::logging::init_tracing;
use fintrack::{
    evaluate_budgets, import_file, DashboardView, DataSource, FeatureGate, FixtureSource, GoalStatus, PremiumFeature,
    RecordKind, Settings, Snapshot, SqliteStore,
};

const RULE: &str = "━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━";

#[derive(Parser, Debug)]
#[command(name = "fintrack", version, about = "Personal finance tracker: records, budgets and trial access.")]
struct Cli {
    /// Settings file (defaults to ./fintrack.json when present)
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    /// Use the canned demo data instead of the database
    #[arg(long, global = true)]
    demo: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Import records of one kind from a CSV file
    Import {
        kind: RecordKind,
        file: PathBuf,
        #[arg(short, long)]
        user: String,
    },
    /// Summary, monthly chart data and category breakdown
    Dashboard {
        #[arg(short, long, default_value = fintrack::DEMO_USER)]
        user: String,
        /// Print the whole view as JSON
        #[arg(long)]
        json: bool,
    },
    /// Budget progress for the current month
    Budgets {
        #[arg(short, long, default_value = fintrack::DEMO_USER)]
        user: String,
    },
    /// Subscription and trial status
    Status {
        #[arg(short, long)]
        user: String,
    },
    /// Start a free trial for a new user
    Signup {
        #[arg(short, long)]
        user: String,
        #[arg(long, default_value_t = 14)]
        trial_days: i64,
    },
    /// Switch a user to the premium plan
    Upgrade {
        #[arg(short, long)]
        user: String,
    },
    /// What changed for a user, newest first
    History {
        #[arg(short, long)]
        user: String,
    },
    /// Delete one record (premium)
    Delete {
        kind: RecordKind,
        id: String,
        #[arg(short, long)]
        user: String,
    },
}

fn main() -> Result<()> {
    init_tracing();
    let cli = Cli::parse();

    let mut settings = resolve_settings(cli.config.as_deref())?;
    if cli.demo {
        settings.demo_mode = true;
    }

    match cli.command {
        Command::Import { kind, file, user } => run_import(&settings, kind, file, &user),
        Command::Dashboard { user, json } => run_dashboard(&settings, &user, json),
        Command::Budgets { user } => run_budgets(&settings, &user),
        Command::Status { user } => run_status(&settings, &user),
        Command::Signup { user, trial_days } => run_signup(&settings, &user, trial_days),
        Command::Upgrade { user } => run_upgrade(&settings, &user),
        Command::History { user } => run_history(&settings, &user),
        Command::Delete { kind, id, user } => run_delete(&settings, kind, &id, &user),
    }
}

/// Writes always go to the database; demo mode has nothing to write to
fn open_store(settings: &Settings) -> Result<SqliteStore> {
    if settings.demo_mode {
        bail!("demo mode is read-only, sign up to save data");
    }
    SqliteStore::open(&settings.database_path)
        .with_context(|| format!("Opening database {}", settings.database_path.display()))
}

fn load_snapshot(settings: &Settings, user: &str) -> Result<Snapshot> {
    if settings.demo_mode {
        return Ok(Snapshot::load(&FixtureSource::new(Utc::now()), user));
    }
    let store = open_store(settings)?;
    Ok(Snapshot::load(&store, user))
}

fn run_import(settings: &Settings, kind: RecordKind, file: PathBuf, user: &str) -> Result<()> {
    println!("📥 Import {} → {}", kind, settings.database_path.display());
    println!("{}", RULE);

    let store = open_store(settings)?;
    let summary = import_file(&store, kind, &file, user)?;

    println!("✓ Inserted {} rows from {}", summary.inserted, file.display());
    if summary.skipped > 0 {
        println!("⚠️  Skipped {} invalid rows (see log)", summary.skipped);
    }
    println!("✓ {} now holds {} {} records", user, store.count(kind, user)?, kind);
    Ok(())
}

fn run_dashboard(settings: &Settings, user: &str, json: bool) -> Result<()> {
    let snapshot = load_snapshot(settings, user)?;
    let view = DashboardView::build(&snapshot, Utc::now(), settings.trailing_months);

    if json {
        println!("{}", serde_json::to_string_pretty(&view)?);
        return Ok(());
    }

    let title = if view.demo { "📊 Dashboard (demo)" } else { "📊 Dashboard" };
    println!("{} - {}", title, view.user_id);
    println!("{}", RULE);

    let s = &view.summary;
    println!("Income:       {:>12.2}", s.total_income);
    println!("Expenses:     {:>12.2}", s.total_expenses);
    println!("Investments:  {:>12.2}", s.total_investments);
    println!("Savings:      {:>12.2}", s.total_savings);
    println!("Net worth:    {:>12.2}", s.net_worth);
    println!("Savings rate: {:>11}%", s.savings_rate);
    println!(
        "Health:       savings {}, portfolio {}, net worth {}",
        s.health.savings.label(),
        s.health.portfolio.label(),
        s.health.net_worth.label()
    );

    println!("\n📅 Last {} months", view.monthly.len());
    for point in &view.monthly {
        println!("  {:<4} in {:>10.2}  out {:>10.2}  net {:>10.2}", point.month, point.income, point.expenses, point.net());
    }

    if !view.expense_categories.is_empty() {
        println!("\n🏷️  Expenses by category");
        for share in &view.expense_categories {
            println!("  {:<16} {:>10.2}  {:>3}%", share.category, share.amount, share.percentage);
        }
    }

    if !view.savings.is_empty() {
        println!("\n🐷 Savings goals ({}% of target)", view.savings_totals.progress());
        for goal in &view.savings {
            let done = match goal.status {
                GoalStatus::Completed => " ✅",
                GoalStatus::OnTrack => " (on track)",
                GoalStatus::InProgress => "",
            };
            println!("  {:<16} {:>10.2} / {:<10.2} {:>3}%{}", goal.goal_name, goal.current_amount, goal.target_amount, goal.progress, done);
        }
    }

    print_entitlement(&view.entitlement);
    Ok(())
}

fn run_budgets(settings: &Settings, user: &str) -> Result<()> {
    let now = Utc::now();
    let snapshot = load_snapshot(settings, user)?;
    let budgets = evaluate_budgets(&snapshot.budgets, &snapshot.expenses, now);

    println!("💰 Budgets - {}", now.format("%B %Y"));
    println!("{}", RULE);

    if budgets.is_empty() {
        println!("No budgets yet.");
    }
    for b in &budgets {
        let bar_len = (b.bar_width() / 5) as usize;
        println!(
            "  {:<12} [{:<20}] {:>3}%  {:>8.2} / {:<8.2} {}",
            b.category,
            "█".repeat(bar_len),
            b.progress,
            b.spent,
            b.budget_limit,
            b.severity.as_str()
        );
        if b.is_over_budget() {
            println!("  {:<12} over by {:.2}", "", b.overspend());
        }
    }

    let gate = FeatureGate::evaluate(has_premium_access(snapshot.subscription.as_ref(), now), snapshot.demo);
    if let Some(hint) = gate.hint() {
        println!("\n🔒 Creating budgets: {}", hint);
    }
    Ok(())
}

fn run_status(settings: &Settings, user: &str) -> Result<()> {
    let snapshot = load_snapshot(settings, user)?;
    println!("👑 Subscription - {}", user);
    println!("{}", RULE);

    match &snapshot.subscription {
        Some(sub) => {
            println!("Plan:   {}", sub.plan.as_str());
            println!("Status: {}", sub.status.as_str());
        }
        None => println!("No subscription on record"),
    }
    print_entitlement(&Entitlement::evaluate(snapshot.subscription.as_ref(), Utc::now()));

    if !matches!(snapshot.subscription.as_ref().map(|s| s.plan), Some(fintrack::Plan::Premium)) {
        println!("\nPremium includes:");
        for feature in PremiumFeature::ALL {
            println!("  • {}", feature.benefit());
        }
    }
    Ok(())
}

fn print_entitlement(entitlement: &Entitlement) {
    println!("\n🔑 Access: {}", entitlement.state.label());
    match entitlement.state {
        TrialState::Trialing { .. } => println!(
            "   {} days left, trial ends {}",
            entitlement.days_remaining, entitlement.trial_ends_on
        ),
        TrialState::Expired { .. } => println!("   Trial ended {}, upgrade to keep premium features", entitlement.trial_ends_on),
        _ => {}
    }
    if let Some(warning) = &entitlement.warning {
        println!("⚠️  {}", warning);
    }
}

fn run_signup(settings: &Settings, user: &str, trial_days: i64) -> Result<()> {
    if trial_days <= 0 {
        bail!("trial length must be at least one day, got {}", trial_days);
    }
    let store = open_store(settings)?;
    let Some(subscription) = store.start_trial(user, Utc::now(), trial_days)? else {
        bail!("{} already has a subscription", user);
    };

    println!("🎉 Welcome {}! Your free trial ends {}", user, fintrack::trial_end_display(Some(&subscription)));
    Ok(())
}

fn run_upgrade(settings: &Settings, user: &str) -> Result<()> {
    let store = open_store(settings)?;
    match store.upgrade_subscription(user, Utc::now())? {
        Some(sub) => {
            println!("✅ {} is now on the {} plan", user, sub.plan.as_str());
            Ok(())
        }
        None => bail!("{} has no subscription, run `fintrack signup` first", user),
    }
}

fn run_history(settings: &Settings, user: &str) -> Result<()> {
    let store = open_store(settings)?;
    let trail = store.audit_trail(user)?;

    println!("📜 History - {}", user);
    println!("{}", RULE);
    if trail.is_empty() {
        println!("Nothing recorded yet.");
    }
    for entry in &trail {
        println!(
            "  {}  {:<22} {:<12} {}",
            entry.recorded_at.format("%Y-%m-%d %H:%M"),
            entry.action.as_str(),
            entry.subject,
            entry.subject_id
        );
    }
    Ok(())
}

fn run_delete(settings: &Settings, kind: RecordKind, id: &str, user: &str) -> Result<()> {
    let store = open_store(settings)?;
    let gate = FeatureGate::evaluate(has_premium_access(store.subscription(user)?.as_ref(), Utc::now()), false);
    if let Some(hint) = gate.hint() {
        bail!("{}", hint);
    }

    if store.delete_record(kind, user, id)? {
        println!("🗑️  Deleted {} {}", kind, id);
        Ok(())
    } else {
        bail!("no {} with id {} for {}", kind, id, user)
    }
}
