// GGCU Revenue Reports - Web Server
// Serves the reporting contract over HTTP GET

use axum::{
    extract::{Query, State},
    http::{header, StatusCode},
    response::{IntoResponse, Json},
    routing::get,
    Router,
};
use serde::Deserialize;
use std::path::PathBuf;
use std::sync::Arc;
use tower_http::cors::CorsLayer;

use ggcu_reports::{
    open_read_only, parse_date_param, run_report, DateRange, ReportError, ReportKind,
    ReportResponse,
};

/// Shared application state
///
/// Holds the database path, not a connection: every request opens its own
/// scoped read-only connection and releases it on exit.
#[derive(Clone)]
struct AppState {
    db_path: Arc<PathBuf>,
}

/// Query parameters for GET /api/reports
#[derive(Deserialize)]
struct ReportQuery {
    #[serde(default)]
    report: String,
    #[serde(default)]
    start: String,
    #[serde(default)]
    end: String,
}

// ============================================================================
// API Handlers
// ============================================================================

/// GET /api/health - Health check
async fn health_check() -> impl IntoResponse {
    Json(serde_json::json!({ "success": true, "data": "OK" }))
}

/// GET /api/reports?report=revenue&start=YYYY-MM-DD&end=YYYY-MM-DD
///
/// Always answers 200 with the JSON envelope; failures ride in
/// `{success:false, error}` rather than in the status code, which is what
/// the deployed endpoint did and what the front-end expects.
async fn get_report(State(state): State<AppState>, Query(query): Query<ReportQuery>) -> impl IntoResponse {
    let envelope = match build_report(&state, &query) {
        Ok(rows) => ReportResponse::ok(rows),
        Err(e) => {
            eprintln!("Report request failed: {:?}", e);
            ReportResponse::err(&e)
        }
    };

    (
        StatusCode::OK,
        [(header::CONTENT_TYPE, "application/json; charset=utf-8")],
        Json(envelope),
    )
}

fn build_report(
    state: &AppState,
    query: &ReportQuery,
) -> Result<Vec<ggcu_reports::RevenueRow>, ReportError> {
    let kind = ReportKind::parse(&query.report)?;

    // Empty strings are absent; both-or-neither decides whether to filter
    let start = parse_date_param(&query.start)?;
    let end = parse_date_param(&query.end)?;
    let range = DateRange::from_bounds(start, end);

    let conn = open_read_only(&state.db_path)?;
    run_report(&conn, kind, range)
}

// ============================================================================
// Main Server
// ============================================================================

#[tokio::main]
async fn main() {
    println!("🌐 GGCU Revenue Reports - Web Server");
    println!("━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━");

    let db_path = std::env::args()
        .nth(1)
        .unwrap_or_else(|| "ggcu.db".to_string());
    let db_path = PathBuf::from(db_path);

    if !db_path.exists() {
        eprintln!("❌ Database not found at {:?}", db_path);
        eprintln!("   Run: cargo run seed");
        eprintln!("   to create a demo database first.");
        std::process::exit(1);
    }

    println!("✓ Database: {:?}", db_path);

    let state = AppState {
        db_path: Arc::new(db_path),
    };

    // Build API routes
    let api_routes = Router::new()
        .route("/health", get(health_check))
        .route("/reports", get(get_report))
        .with_state(state);

    let app = Router::new()
        .nest("/api", api_routes)
        .layer(CorsLayer::permissive());

    // Start server
    let addr = "0.0.0.0:3000";
    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .expect("Failed to bind to address");

    println!("\n🚀 Server running on http://localhost:3000");
    println!("   API: http://localhost:3000/api/reports?report=revenue");
    println!("\n   Press Ctrl+C to stop\n");

    axum::serve(listener, app)
        .await
        .expect("Failed to start server");
}
