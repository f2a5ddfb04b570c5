mod config;
mod llm;

use anyhow::Context as _;
use axum::{
    Router,
    extract::State,
    http::{HeaderMap, HeaderValue, Method, Request, StatusCode, header},
    middleware::{Next, from_fn},
    response::Json,
    routing::{get, post},
};
use fnol_flow::{
    ClaimForm, ClaimPipeline, FlowError, GatewayError, InferenceGateway, LossSubmission,
    PipelineConfig, Question, QuestionCatalog,
};
use serde::Serialize;
use std::sync::Arc;
use tower::ServiceBuilder;
use tower_http::{cors::CorsLayer, trace::TraceLayer};
use tracing::{Instrument, error, info};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};
use uuid::Uuid;

use crate::{config::ServiceConfig, llm::RigInferenceGateway};

const CORRELATION_HEADER: &str = "x-correlation-id";

#[derive(Clone)]
struct AppState {
    pipeline: Arc<ClaimPipeline>,
}

#[derive(Debug, Serialize)]
struct ErrorResponse {
    detail: String,
}

type ApiError = (StatusCode, Json<ErrorResponse>);

fn api_error(status: StatusCode, message: impl Into<String>) -> ApiError {
    (
        status,
        Json(ErrorResponse {
            detail: message.into(),
        }),
    )
}

/// Initialize structured JSON tracing based on environment variables
fn init_tracing() {
    let log_format = std::env::var("LOG_FORMAT").unwrap_or_else(|_| "json".to_string());
    let env_filter = tracing_subscriber::EnvFilter::try_from_default_env().unwrap_or_else(|_| {
        "fnol_claims_service=debug,fnol_flow=debug,tower_http=debug".into()
    });

    match log_format.as_str() {
        "pretty" => {
            tracing_subscriber::registry()
                .with(env_filter)
                .with(tracing_subscriber::fmt::layer().pretty())
                .init();
        }
        _ => {
            tracing_subscriber::registry()
                .with(env_filter)
                .with(
                    tracing_subscriber::fmt::layer()
                        .json()
                        .with_target(true)
                        .with_level(true),
                )
                .init();
        }
    }
}

/// Tag every request with a correlation id header and tracing span
async fn correlation_id_middleware(
    mut request: Request<axum::body::Body>,
    next: Next,
) -> axum::response::Response {
    let correlation_id = Uuid::new_v4().to_string();

    if let Ok(value) = HeaderValue::from_str(&correlation_id) {
        request.headers_mut().insert(CORRELATION_HEADER, value);
    }

    let span = tracing::info_span!("http_request", correlation_id = %correlation_id);
    next.run(request).instrument(span).await
}

fn correlation_id(headers: &HeaderMap) -> String {
    headers
        .get(CORRELATION_HEADER)
        .and_then(|v| v.to_str().ok())
        .unwrap_or("unknown")
        .to_string()
}

fn build_router(state: AppState, cors: CorsLayer) -> Router {
    Router::new()
        .route("/health", get(health_check))
        .route("/questions", get(list_questions))
        .route("/claim", post(submit_claim))
        .route("/api/form", post(submit_claim))
        .layer(from_fn(correlation_id_middleware))
        .with_state(state)
        .layer(
            ServiceBuilder::new()
                .layer(TraceLayer::new_for_http())
                .layer(cors),
        )
}

fn cors_layer(allowed_origin: &str) -> anyhow::Result<CorsLayer> {
    let origin: HeaderValue = allowed_origin
        .parse()
        .with_context(|| format!("invalid FNOL_ALLOWED_ORIGIN '{allowed_origin}'"))?;
    Ok(CorsLayer::new()
        .allow_origin(origin)
        .allow_methods([Method::GET, Method::POST])
        .allow_headers([header::CONTENT_TYPE])
        .allow_credentials(true))
}

fn build_pipeline(
    gateway: Arc<dyn InferenceGateway>,
    config: PipelineConfig,
) -> anyhow::Result<ClaimPipeline> {
    let catalog = QuestionCatalog::auto_policy().context("question catalog is invalid")?;
    Ok(ClaimPipeline::new(Arc::new(catalog), gateway, config))
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    init_tracing();

    let config = match ServiceConfig::from_env() {
        Ok(config) => config,
        Err(e) => {
            error!(error = %e, "Invalid configuration");
            std::process::exit(1);
        }
    };

    let gateway: Arc<dyn InferenceGateway> = Arc::new(RigInferenceGateway::new(
        &config.openrouter_api_key,
        config.model.clone(),
    ));
    let pipeline = build_pipeline(gateway, config.pipeline_config())?;

    info!(
        model = %config.model,
        max_concurrency = config.max_concurrency,
        call_timeout_secs = config.call_timeout.as_secs(),
        questions = pipeline.catalog().len(),
        "Claim pipeline ready"
    );

    let state = AppState {
        pipeline: Arc::new(pipeline),
    };
    let app = build_router(state, cors_layer(&config.allowed_origin)?);

    let listener = tokio::net::TcpListener::bind(&config.bind_addr)
        .await
        .with_context(|| format!("failed to bind {}", config.bind_addr))?;

    info!("Server running on http://{}", config.bind_addr);
    info!("Available endpoints:");
    info!("  GET  /health     - Health check");
    info!("  GET  /questions  - Question catalog");
    info!("  POST /claim      - Submit a loss description");

    axum::serve(listener, app).await?;

    Ok(())
}

async fn health_check() -> &'static str {
    "OK"
}

async fn list_questions(State(state): State<AppState>) -> Json<Vec<Question>> {
    Json(state.pipeline.catalog().questions().to_vec())
}

fn status_for(error: &FlowError) -> StatusCode {
    match error {
        FlowError::Classification(GatewayError::Timeout)
        | FlowError::AnswerFetch {
            source: GatewayError::Timeout,
            ..
        } => StatusCode::GATEWAY_TIMEOUT,
        FlowError::Classification(_) | FlowError::AnswerFetch { .. } => StatusCode::BAD_GATEWAY,
        FlowError::CatalogIntegrity(_) => StatusCode::INTERNAL_SERVER_ERROR,
    }
}

async fn submit_claim(
    State(state): State<AppState>,
    headers: HeaderMap,
    Json(submission): Json<LossSubmission>,
) -> Result<Json<ClaimForm>, ApiError> {
    let correlation_id = correlation_id(&headers);

    info!(
        correlation_id = %correlation_id,
        description_length = submission.description.len(),
        context_keys = submission.context.len(),
        "Processing claim submission"
    );

    if submission.description.trim().is_empty() {
        return Err(api_error(
            StatusCode::BAD_REQUEST,
            "description must not be empty",
        ));
    }

    match state.pipeline.submit(submission).await {
        Ok(form) => {
            info!(
                correlation_id = %correlation_id,
                claim_id = %form.claim_id,
                event_type = %form.event_type,
                "Claim submission completed"
            );
            Ok(Json(form))
        }
        Err(e) => {
            error!(
                correlation_id = %correlation_id,
                error = %e,
                "Claim submission failed"
            );
            Err(api_error(status_for(&e), e.to_string()))
        }
    }
}
