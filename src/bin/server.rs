use axum::{
    Json, Router,
    http::StatusCode,
    routing::{get, post},
};
use stock_cutter::job::{CutJob, CutPlan};
use tower_http::trace::{DefaultMakeSpan, DefaultOnResponse, TraceLayer};
use tracing::Level;

async fn optimize(
    Json(job): Json<CutJob>,
) -> Result<Json<CutPlan>, (StatusCode, String)> {
    tracing::info!(
        body = serde_json::to_string(&job).unwrap_or_default(),
        "POST /optimize"
    );

    job.validate()
        .map_err(|e| (StatusCode::BAD_REQUEST, e.to_string()))?;

    let plan = tokio::task::spawn_blocking(move || job.plan())
        .await
        .map_err(|e| (StatusCode::INTERNAL_SERVER_ERROR, e.to_string()))?
        .map_err(|e| (StatusCode::BAD_REQUEST, e.to_string()))?;

    tracing::info!(
        status = %plan.status,
        sticks = plan.stick_count(),
        "plan ready"
    );
    Ok(Json(plan))
}

fn app() -> Router {
    Router::new()
        .route("/up", get(|| async { "ok" }))
        .route("/optimize", post(optimize))
        .layer(
            TraceLayer::new_for_http()
                .make_span_with(DefaultMakeSpan::new().level(Level::INFO))
                .on_response(DefaultOnResponse::new().level(Level::INFO)),
        )
}

#[tokio::main]
async fn main() -> std::io::Result<()> {
    let _sentry = std::env::var("SENTRY_DSN").ok().map(|dsn| {
        sentry::init((
            dsn,
            sentry::ClientOptions {
                release: sentry::release_name!(),
                ..Default::default()
            },
        ))
    });

    let log_file = std::fs::OpenOptions::new()
        .create(true)
        .append(true)
        .open("development.log")?;

    tracing_subscriber::fmt()
        .with_writer(log_file)
        .with_target(false)
        .with_ansi(false)
        .with_max_level(Level::INFO)
        .init();

    let port = std::env::var("PORT").unwrap_or_else(|_| "3001".to_string());
    let addr = format!("0.0.0.0:{port}");

    let listener = tokio::net::TcpListener::bind(&addr).await?;
    eprintln!("Listening on {addr}");
    axum::serve(listener, app()).await
}
