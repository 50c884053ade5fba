//! Embedding trigger: `POST /functions/v1/generate-embeddings`.

use axum::{body::Bytes, extract::State, http::StatusCode, response::IntoResponse, Json};
use serde::Deserialize;
use serde_json::json;
use tracing::{instrument, warn};

use contentai_core::{EmbeddingSource, Error};

use crate::AppState;

#[derive(Debug, Deserialize)]
struct EmbeddingTrigger {
    record: EmbeddingSource,
}

/// Regenerate the embedding chunks of `record`.
///
/// Every failure, including a malformed body, answers `400 { error }`.
#[instrument(skip(state, body), fields(subsystem = "api", component = "embeddings", op = "generate"))]
pub async fn generate_embeddings(State(state): State<AppState>, body: Bytes) -> impl IntoResponse {
    let result = match serde_json::from_slice::<EmbeddingTrigger>(&body) {
        Ok(trigger) => state.generator.generate(&trigger.record).await,
        Err(e) => Err(Error::InvalidInput(format!("Invalid trigger payload: {}", e))),
    };

    match result {
        Ok(count) => (
            StatusCode::OK,
            Json(json!({ "message": format!("Generated {} embeddings.", count) })),
        ),
        Err(e) => {
            warn!(error = %e, "Embedding generation failed");
            (StatusCode::BAD_REQUEST, Json(json!({ "error": e.to_string() })))
        }
    }
}
