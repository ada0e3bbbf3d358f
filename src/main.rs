use axum::http::{header, Method};
use axum::routing::{get, post};
use axum::Router;
use serde_json::{json, Value};
use tower_http::{cors::{Any, CorsLayer}, trace::TraceLayer};

use eduportal_api::error::ApiError;
use eduportal_api::{config, database, handlers, middleware};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load .env if present so cargo run picks up DATABASE_URL, JWT_SECRET, etc.
    let _ = dotenvy::dotenv();

    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "eduportal_api=info,tower_http=info".into()),
        )
        .init();

    let config = config::config();
    tracing::info!("Starting eduportal-api in {:?} mode", config.environment);

    // Missing signing secret is fatal; nothing issued without it is safe.
    if let Err(reason) = config.validate() {
        anyhow::bail!("invalid configuration: {}", reason);
    }

    database::connect_and_migrate().await?;

    // Idempotent: creates the configured admin only when absent, logs and
    // continues when configuration is missing.
    handlers::admin_auth::initialize_admin().await?;

    let app = app();

    let port = std::env::var("PORT")
        .ok()
        .and_then(|s| s.parse::<u16>().ok())
        .unwrap_or(10000);

    let bind_addr = format!("0.0.0.0:{}", port);
    let listener = tokio::net::TcpListener::bind(&bind_addr).await?;
    tracing::info!("eduportal-api listening on http://{}", bind_addr);

    axum::serve(listener, app).await?;
    Ok(())
}

fn app() -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods([Method::GET, Method::POST, Method::PUT, Method::DELETE, Method::OPTIONS])
        .allow_headers([header::CONTENT_TYPE, header::AUTHORIZATION]);

    Router::new()
        // Public
        .route("/", get(root))
        .route("/api/health", get(health))
        // Auth realms
        .nest("/api/student/auth", student_auth_routes())
        .nest("/api/admin/auth", admin_auth_routes())
        // Unknown routes get the same JSON envelope as everything else
        .fallback(|| async { ApiError::not_found("Route not found") })
        // Global middleware
        .layer(cors)
        .layer(TraceLayer::new_for_http())
}

fn student_auth_routes() -> Router {
    use handlers::{student_auth, student_papers};

    let public = Router::new()
        .route("/register", post(student_auth::register))
        .route("/login", post(student_auth::login))
        .route("/send-otp", post(student_auth::send_otp))
        .route("/verify-otp", post(student_auth::verify_otp));

    let protected = Router::new()
        .route("/profile", get(student_auth::profile))
        .route("/save-paper/:paper_id", post(student_papers::save_paper))
        .route("/saved-papers", get(student_papers::saved_papers))
        .route("/downloads/:paper_id", post(student_papers::record_download))
        .route("/downloads", get(student_papers::download_history))
        .layer(axum::middleware::from_fn(middleware::student_auth_middleware));

    public.merge(protected)
}

fn admin_auth_routes() -> Router {
    use handlers::admin_auth;

    let public = Router::new()
        .route("/login", post(admin_auth::login))
        .route("/forgot-password", post(admin_auth::forgot_password));

    let protected = Router::new()
        .route("/profile", get(admin_auth::profile))
        .layer(axum::middleware::from_fn(middleware::admin_auth_middleware));

    public.merge(protected)
}

async fn root() -> axum::response::Json<Value> {
    axum::response::Json(json!({
        "success": true,
        "message": "Student Education Portal Backend is Live",
        "version": env!("CARGO_PKG_VERSION"),
    }))
}

async fn health() -> impl axum::response::IntoResponse {
    let now = chrono::Utc::now();

    match database::health_check().await {
        Ok(_) => (
            axum::http::StatusCode::OK,
            axum::response::Json(json!({
                "success": true,
                "message": "Student Education Portal API is running",
                "timestamp": now,
                "database": "ok"
            })),
        ),
        Err(e) => (
            axum::http::StatusCode::SERVICE_UNAVAILABLE,
            axum::response::Json(json!({
                "success": false,
                "message": "database unavailable",
                "timestamp": now,
                "database_error": e.to_string()
            })),
        ),
    }
}
