use axum::{
    Json, Router,
    http::StatusCode,
    routing::{get, post},
};
use serde::Serialize;
use sheet_nester::NestError;
use sheet_nester::config::NestJob;
use sheet_nester::solver::Solver;
use sheet_nester::types::PlanReport;
use tower_http::trace::{DefaultMakeSpan, DefaultOnResponse, TraceLayer};
use tracing::Level;

#[derive(Debug, Serialize)]
struct ErrorResponse {
    error: &'static str,
    message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    item: Option<ItemRef>,
}

#[derive(Debug, Serialize)]
struct ItemRef {
    id: String,
    name: String,
    width: f64,
    height: f64,
}

type ApiError = (StatusCode, Json<ErrorResponse>);

fn nest_error(err: NestError) -> ApiError {
    let status = match err {
        NestError::InvalidMaterial { .. } => StatusCode::BAD_REQUEST,
        NestError::InfeasibleItem { .. } => StatusCode::UNPROCESSABLE_ENTITY,
        NestError::ItemCeilingExceeded { .. } => StatusCode::PAYLOAD_TOO_LARGE,
        NestError::InternalPackingInvariantViolation { .. } => StatusCode::INTERNAL_SERVER_ERROR,
    };
    let item = match &err {
        NestError::InfeasibleItem {
            part_id,
            name,
            width,
            height,
        } => Some(ItemRef {
            id: part_id.clone(),
            name: name.clone(),
            width: *width,
            height: *height,
        }),
        _ => None,
    };
    (
        status,
        Json(ErrorResponse {
            error: err.kind(),
            message: err.to_string(),
            item,
        }),
    )
}

async fn nest(Json(job): Json<NestJob>) -> Result<Json<PlanReport>, ApiError> {
    tracing::info!(
        body = serde_json::to_string(&job).unwrap_or_default(),
        "POST /nest"
    );

    let solver = Solver::new(job.sheet, job.config, job.parts);
    let plan = tokio::task::spawn_blocking(move || solver.solve())
        .await
        .map_err(|e| {
            tracing::error!(error = %e, "nesting task failed");
            (
                StatusCode::INTERNAL_SERVER_ERROR,
                Json(ErrorResponse {
                    error: "internal_error",
                    message: "nesting task failed".to_string(),
                    item: None,
                }),
            )
        })?
        .map_err(nest_error)?;

    Ok(Json(plan.into()))
}

fn app() -> Router {
    Router::new()
        .route("/up", get(|| async { "ok" }))
        .route("/nest", post(nest))
        .layer(
            TraceLayer::new_for_http()
                .make_span_with(DefaultMakeSpan::new().level(Level::INFO))
                .on_response(DefaultOnResponse::new().level(Level::INFO)),
        )
}

async fn serve() -> std::io::Result<()> {
    let port = std::env::var("PORT").unwrap_or_else(|_| "3001".to_string());
    let addr = format!("0.0.0.0:{port}");

    let listener = tokio::net::TcpListener::bind(&addr).await?;
    eprintln!("Listening on {addr}");
    axum::serve(listener, app()).await
}

fn main() -> std::io::Result<()> {
    let _sentry = sentry::init((
        std::env::var("SENTRY_DSN").ok(),
        sentry::ClientOptions {
            release: sentry::release_name!(),
            ..Default::default()
        },
    ));

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

    tokio::runtime::Builder::new_multi_thread()
        .enable_all()
        .build()?
        .block_on(serve())
}
