// FinTrack - Web Server
// REST API with Axum over the live store or the demo fixtures

use anyhow::{Context, Result};
use chrono::Utc;
use fintrack::api::{router, AppState, Backend};
use fintrack::config::resolve_settings;
use fintrack::logging::init_tracing;
use fintrack::{FixtureSource, SqliteStore};
use std::path::PathBuf;
use tracing::info;

#[tokio::main]
async fn main() -> Result<()> {
    init_tracing();

    println!("🌐 FinTrack - Web Server");
    println!("━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━");

    let config_path = std::env::args().nth(1).map(PathBuf::from);
    let settings = resolve_settings(config_path.as_deref())?;

    let backend = if settings.demo_mode {
        println!("✓ Demo mode: serving fixture data");
        Backend::Demo(FixtureSource::new(Utc::now()))
    } else {
        let store = SqliteStore::open(&settings.database_path)
            .with_context(|| format!("Opening database {}", settings.database_path.display()))?;
        println!("✓ Database opened: {}", settings.database_path.display());
        Backend::Live(store)
    };

    let app = router(AppState::new(backend, settings.trailing_months));

    let listener = tokio::net::TcpListener::bind(&settings.bind_addr)
        .await
        .with_context(|| format!("Failed to bind to {}", settings.bind_addr))?;

    info!(addr = %settings.bind_addr, "server listening");
    println!("\n🚀 Server running on http://{}", settings.bind_addr);
    println!("   API: http://{}/api/users/<user>/dashboard", settings.bind_addr);
    println!("\n   Press Ctrl+C to stop\n");

    axum::serve(listener, app).await.context("Server error")?;
    Ok(())
}
