use crate::{
    app::App,
    detection::{
        AnalysisMetadata, DetectionError, ErrorKind, MultiLevelResult, PreviewPair,
        SimilarityReport,
    },
    embeddings::ModelStatus,
    similarity::{SimilarityMatrix, SimilarityStatistics},
};
use axum::{
    extract::{DefaultBodyLimit, State},
    http::{HeaderValue, StatusCode},
    response::IntoResponse,
    routing::{get, post},
    Json, Router,
};
use serde::{Deserialize, Serialize};
use serde_json::json;
use std::{collections::BTreeMap, sync::Arc};
use tokio::signal;
use tower_http::cors::{AllowOrigin, Any, CorsLayer};

const API_VERSION: &str = env!("CARGO_PKG_VERSION");

#[derive(Clone)]
pub struct SharedState {
    app: App,
}

async fn shutdown_signal(app: App) {
    let ctrl_c = async {
        signal::ctrl_c()
            .await
            .expect("failed to install Ctrl+C handler");
    };

    #[cfg(unix)]
    let terminate = async {
        signal::unix::signal(signal::unix::SignalKind::terminate())
            .expect("failed to install signal handler")
            .recv()
            .await;
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }

    log::warn!("shutting down, releasing cached models");
    app.provider().release_all();
}

/// Build the API router. Separate from `start_app` so tests can drive it
/// without binding a socket.
pub fn router(app: App) -> Router {
    let cors = cors_layer(&app.config.cors_origins);
    let shared_state = Arc::new(SharedState { app });

    Router::new()
        .route("/", get(root))
        .route("/api/v1/health", get(health))
        .route("/api/v1/models", get(models))
        .route("/api/v1/analyze", post(analyze))
        .route("/api/v1/analyze/detailed", post(analyze_detailed))
        .route("/api/v1/compare", post(compare))
        .layer(DefaultBodyLimit::max(10 * 1024 * 1024))
        .layer(cors)
        .layer(
            tower_http::trace::TraceLayer::new_for_http()
                .make_span_with(
                    tower_http::trace::DefaultMakeSpan::new().level(tracing::Level::INFO),
                )
                .on_response(
                    tower_http::trace::DefaultOnResponse::new().level(tracing::Level::INFO),
                ),
        )
        .with_state(shared_state)
}

fn cors_layer(origins: &[String]) -> CorsLayer {
    let layer = CorsLayer::new().allow_methods(Any).allow_headers(Any);

    if origins.iter().any(|o| o == "*") {
        return layer.allow_origin(Any);
    }

    let origins: Vec<HeaderValue> = origins
        .iter()
        .filter_map(|origin| match origin.parse::<HeaderValue>() {
            Ok(value) => Some(value),
            Err(_) => {
                log::warn!("ignoring invalid cors origin {origin:?}");
                None
            }
        })
        .collect();

    layer.allow_origin(AllowOrigin::list(origins))
}

async fn start_app(app: App, host: String, port: u16) -> anyhow::Result<()> {
    log::info!("Starting dupfind API {API_VERSION}");
    log::info!(
        "Default model: {}, default threshold: {}",
        app.config.default_model,
        app.config.default_threshold
    );

    let signal = shutdown_signal(app.clone());
    let router = router(app);

    let addr = format!("{host}:{port}");
    let listener = tokio::net::TcpListener::bind(&addr).await?;
    log::info!("listening on {addr}");

    axum::serve(listener, router)
        .with_graceful_shutdown(signal)
        .await?;

    log::info!("API shutdown completed");
    Ok(())
}

pub fn start_daemon(app: App, host: String, port: u16) -> anyhow::Result<()> {
    tokio::runtime::Builder::new_multi_thread()
        .enable_all()
        .build()?
        .block_on(start_app(app, host, port))
}

#[derive(Debug)]
struct HttpError(DetectionError);

// Tell axum how to convert `DetectionError` into a response.
impl IntoResponse for HttpError {
    fn into_response(self) -> axum::response::Response {
        let status = match self.0.kind() {
            ErrorKind::Validation | ErrorKind::UnknownModel => {
                log::warn!("rejected request: {}", self.0);
                StatusCode::BAD_REQUEST
            }
            ErrorKind::EmbeddingFailure | ErrorKind::Internal => {
                log::error!("{self:?}");
                StatusCode::INTERNAL_SERVER_ERROR
            }
        };

        (status, Json(json!({"error": self.0.to_string()}))).into_response()
    }
}

impl<E> From<E> for HttpError
where
    E: Into<DetectionError>,
{
    fn from(err: E) -> Self {
        Self(err.into())
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct AnalyzeRequest {
    pub texts: Vec<String>,
    pub model_key: Option<String>,
    /// Similarity threshold; for detailed analysis, the moderate tier
    pub threshold: Option<f32>,
}

#[derive(Debug, Serialize)]
pub struct AnalyzeResponse {
    pub similarity_matrix: SimilarityMatrix,
    pub plagiarized_pairs: Vec<PreviewPair>,
    pub model_used: String,
    pub threshold_used: f32,
    pub total_comparisons: usize,
    pub execution_time: f64,
    pub similarity_stats: SimilarityStatistics,
}

#[derive(Debug, Clone, Deserialize)]
pub struct CompareRequest {
    pub text1: String,
    pub text2: String,
    pub model_key: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct ModelsResponse {
    pub available_models: Vec<String>,
    pub default_model: String,
    pub model_descriptions: BTreeMap<String, ModelStatus>,
}

#[derive(Debug, Serialize)]
pub struct HealthResponse {
    pub status: &'static str,
    pub version: &'static str,
    pub models_loaded: bool,
}

impl SharedState {
    fn model_key(&self, requested: Option<String>) -> String {
        requested.unwrap_or_else(|| self.app.config.default_model.clone())
    }

    fn validate_texts(&self, texts: &[String]) -> Result<(), HttpError> {
        let max_texts = self.app.config.max_texts;

        if texts.is_empty() {
            return Err(DetectionError::validation("at least one text is required").into());
        }
        if texts.len() > max_texts {
            return Err(DetectionError::validation(format!(
                "at most {max_texts} texts are accepted, got {}",
                texts.len()
            ))
            .into());
        }
        if let Some(index) = texts.iter().position(|t| t.trim().is_empty()) {
            return Err(DetectionError::validation(format!("text {index} is empty")).into());
        }
        Ok(())
    }
}

async fn root() -> impl IntoResponse {
    Json(json!({
        "message": "dupfind API",
        "version": API_VERSION,
        "health": "/api/v1/health",
        "models": "/api/v1/models",
    }))
}

async fn health(State(state): State<Arc<SharedState>>) -> Json<HealthResponse> {
    let app = state.app.clone();

    let models_loaded = tokio::task::block_in_place(move || {
        match app.provider().ensure_loaded(&app.config.default_model) {
            Ok(()) => true,
            Err(err) => {
                log::warn!("health check could not load default model: {err}");
                false
            }
        }
    });

    Json(HealthResponse {
        status: "healthy",
        version: API_VERSION,
        models_loaded,
    })
}

async fn models(State(state): State<Arc<SharedState>>) -> Json<ModelsResponse> {
    let statuses = state.app.provider().models();

    Json(ModelsResponse {
        available_models: statuses.iter().map(|m| m.info.key.to_string()).collect(),
        default_model: state.app.config.default_model.clone(),
        model_descriptions: statuses
            .into_iter()
            .map(|m| (m.info.key.to_string(), m))
            .collect(),
    })
}

async fn analyze(
    State(state): State<Arc<SharedState>>,
    Json(payload): Json<AnalyzeRequest>,
) -> Result<Json<AnalyzeResponse>, HttpError> {
    log::info!("Received analysis request for {} texts", payload.texts.len());
    state.validate_texts(&payload.texts)?;

    let model = state.model_key(payload.model_key);
    let threshold = payload
        .threshold
        .unwrap_or(state.app.config.default_threshold);
    let service = state.app.service.clone();

    tokio::task::block_in_place(move || {
        let result = service.analyze(&payload.texts, &model, threshold)?;
        let AnalysisMetadata {
            model_used,
            threshold_used,
            total_comparisons,
            execution_time,
            similarity_stats,
        } = result.metadata;

        Ok(Json(AnalyzeResponse {
            similarity_matrix: result.similarity_matrix,
            plagiarized_pairs: result.pairs,
            model_used,
            threshold_used,
            total_comparisons,
            execution_time,
            similarity_stats,
        }))
    })
}

async fn analyze_detailed(
    State(state): State<Arc<SharedState>>,
    Json(payload): Json<AnalyzeRequest>,
) -> Result<Json<MultiLevelResult>, HttpError> {
    log::info!(
        "Received detailed analysis request for {} texts",
        payload.texts.len()
    );
    state.validate_texts(&payload.texts)?;

    let model = state.model_key(payload.model_key);
    let strict = state.app.config.strict_threshold;
    let moderate = payload
        .threshold
        .unwrap_or(state.app.config.default_threshold);
    let service = state.app.service.clone();

    tokio::task::block_in_place(move || {
        service
            .detect_multi_level(&payload.texts, &model, strict, moderate)
            .map(Json)
            .map_err(Into::into)
    })
}

async fn compare(
    State(state): State<Arc<SharedState>>,
    Json(payload): Json<CompareRequest>,
) -> Result<Json<SimilarityReport>, HttpError> {
    log::info!("Received request to compare two texts");

    let model = state.model_key(payload.model_key);
    let service = state.app.service.clone();

    tokio::task::block_in_place(move || {
        service
            .compare_two_documents(&payload.text1, &payload.text2, &model)
            .map(Json)
            .map_err(Into::into)
    })
}
