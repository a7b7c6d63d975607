//! services/api/src/bin/api.rs

use api_lib::{
    adapters::{AnalysisHttpGateway, LmsHttpGateway, SqliteStore},
    config::Config,
    error::ApiError,
    web::{
        auth::{login_handler, register_handler},
        middleware::require_auth,
        records, rest,
        rest::ApiDoc,
        state::AppState,
    },
};
use axum::{
    middleware as axum_middleware,
    routing::{get, post},
    Router,
};
use checker_core::{CredentialBroker, ServiceAccount, SubmissionPipeline};
use sqlx::sqlite::{SqliteConnectOptions, SqlitePoolOptions};
use std::str::FromStr;
use std::sync::Arc;
use tower_http::cors::CorsLayer;
use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};
use utoipa::OpenApi;
use utoipa_swagger_ui::SwaggerUi;

#[tokio::main]
async fn main() -> Result<(), ApiError> {
    // --- 1. Load Configuration & Set Up Logging ---
    let config = Arc::new(Config::from_env()?);
    tracing_subscriber::registry()
        .with(tracing_subscriber::EnvFilter::new(config.log_level.to_string()))
        .with(tracing_subscriber::fmt::layer())
        .init();
    info!("Configuration loaded. Starting server...");

    // --- 2. Connect to Database & Create Schema ---
    info!("Connecting to database...");
    let connect_options =
        SqliteConnectOptions::from_str(&config.database_url)?.create_if_missing(true);
    let pool = SqlitePoolOptions::new()
        .max_connections(5)
        .connect_with(connect_options)
        .await?;
    let store = Arc::new(SqliteStore::new(pool));
    info!("Creating database schema...");
    store.init_schema().await?;
    info!("Database schema ready.");

    // --- 3. Initialize Gateways, Broker and Pipeline ---
    let http_client = reqwest::Client::new();
    let lms = Arc::new(LmsHttpGateway::new(
        http_client.clone(),
        config.lms_base_url.clone(),
        config.lms_service.clone(),
    ));
    let analysis = Arc::new(AnalysisHttpGateway::new(
        http_client,
        config.analysis_base_url.clone(),
    ));

    let account = ServiceAccount {
        username: config.lms_username.clone(),
        password: config.lms_password.clone(),
        user_id: config.lms_user_id,
    };
    let broker = CredentialBroker::new(store.clone(), lms, account);
    let pipeline = SubmissionPipeline::new(store.clone(), analysis, broker.clone());

    // --- 4. Build the Shared AppState ---
    let app_state = Arc::new(AppState {
        store,
        broker,
        pipeline,
        config: config.clone(),
    });

    // --- 5. Create the Web Router ---
    // Public routes (no auth required)
    let public_routes = Router::new()
        .route("/register", post(register_handler))
        .route("/auth/login", post(login_handler));

    // Protected routes (bearer token required)
    let protected_routes = Router::new()
        .route("/api/session", post(rest::create_session_handler))
        .route("/api/courses", get(rest::list_upstream_courses_handler))
        .route("/api/submit", post(rest::submit_handler))
        .route("/api/results/{submissionId}", get(rest::results_handler))
        .route(
            "/courses",
            post(records::create_course_handler).get(records::list_courses_handler),
        )
        .route("/assignments", post(records::create_assignment_handler))
        .route("/submissions", post(records::create_submission_handler))
        .route("/courses/{id}/full", get(records::course_full_handler))
        .route("/courses/all/nested", get(records::all_nested_handler))
        .layer(axum_middleware::from_fn_with_state(
            app_state.clone(),
            require_auth,
        ));

    // Combine API routes
    let api_router = Router::new()
        .merge(public_routes)
        .merge(protected_routes)
        .layer(CorsLayer::permissive())
        .with_state(app_state);

    // Merge the API router with the Swagger UI router for a complete application.
    let app = Router::new()
        .merge(api_router)
        .merge(SwaggerUi::new("/swagger-ui").url("/api-docs/openapi.json", ApiDoc::openapi()));

    // --- 6. Start the Server ---
    info!("Starting server on {}", config.bind_address);
    info!(
        "Swagger UI available at http://{}/swagger-ui",
        config.bind_address
    );
    let listener = tokio::net::TcpListener::bind(&config.bind_address).await?;
    axum::serve(listener, app).await?;

    Ok(())
}
