use crate::config::RelayConfig;
use crate::models::{ErrorResponse, GenerationRequest, GenerationResponse};
use crate::provider::{ImageGenerationService, StabilityClient};
use crate::Result;
use axum::{
    extract::{rejection::JsonRejection, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::post,
    Json, Router,
};
use std::net::SocketAddr;
use std::sync::Arc;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;
use tracing::{error, info, info_span, warn, Instrument};
use uuid::Uuid;

/// The only error message callers ever see.
pub const GENERATION_FAILED: &str = "Image generation failed";

#[derive(Clone)]
pub struct RelayState {
    provider: Arc<dyn ImageGenerationService>,
}

impl RelayState {
    pub fn new(provider: Arc<dyn ImageGenerationService>) -> Self {
        Self { provider }
    }
}

/// Every failure collapses into one 500 response.
struct GenerationFailed;

impl IntoResponse for GenerationFailed {
    fn into_response(self) -> Response {
        (
            StatusCode::INTERNAL_SERVER_ERROR,
            Json(ErrorResponse {
                error: GENERATION_FAILED.to_string(),
            }),
        )
            .into_response()
    }
}

pub fn router(state: RelayState) -> Router {
    Router::new()
        .route("/generate-image", post(generate_image_handler))
        .layer(TraceLayer::new_for_http())
        .layer(
            CorsLayer::new()
                .allow_origin(Any)
                .allow_methods(Any)
                .allow_headers(Any),
        )
        .with_state(state)
}

type GenerationPayload = std::result::Result<Json<GenerationRequest>, JsonRejection>;

/// POST /generate-image
async fn generate_image_handler(
    State(state): State<RelayState>,
    payload: GenerationPayload,
) -> std::result::Result<Json<GenerationResponse>, GenerationFailed> {
    let request_id = Uuid::new_v4();

    generate_image(state, payload)
        .instrument(info_span!("generate", %request_id))
        .await
}

async fn generate_image(
    state: RelayState,
    payload: GenerationPayload,
) -> std::result::Result<Json<GenerationResponse>, GenerationFailed> {
    let Json(request) = payload.map_err(|rejection| {
        warn!("Rejected generation request body: {}", rejection);
        GenerationFailed
    })?;

    if request.prompt.trim().is_empty() {
        warn!("Rejected generation request with blank prompt");
        return Err(GenerationFailed);
    }

    info!(
        "Generation request received: prompt_len={}",
        request.prompt.len()
    );

    let images = state
        .provider
        .generate_images(&request.prompt)
        .await
        .map_err(|e| {
            error!("Image generation failed: {}", e);
            GenerationFailed
        })?;

    info!("Returning {} image(s)", images.len());

    Ok(Json(GenerationResponse { images }))
}

/// Bind the relay on `0.0.0.0:<port>` and serve until the process exits.
pub async fn serve(config: RelayConfig) -> Result<()> {
    let provider =
        StabilityClient::new(config.stability_api_key).with_base_url(config.stability_base_url);
    let app = router(RelayState::new(Arc::new(provider)));

    let addr = SocketAddr::from(([0, 0, 0, 0], config.port));
    let listener = tokio::net::TcpListener::bind(addr).await?;

    info!("Relay listening on {}", addr);

    axum::serve(listener, app).await?;

    Ok(())
}
