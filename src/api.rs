//! HTTP API endpoints for playing rounds.
//!
//! Gameplay mistakes (wrong answer, unknown or expired round) always come
//! back as a `200` verdict. Only infrastructure failures produce an error
//! status, and those are all retryable.

use axum::{
    extract::{rejection::JsonRejection, State},
    http::{HeaderMap, StatusCode},
    response::{IntoResponse, Response},
    routing::{get, post},
    Json, Router,
};
use std::sync::Arc;
use tower::ServiceBuilder;
use tower_http::{cors::CorsLayer, trace::TraceLayer};

use crate::engine::{generic_loss, EngineError, RoundEngine};
use crate::protocol::{ErrorBody, RoundPublicView, SubmitAnswerRequest, IDEMPOTENCY_HEADER};
use crate::types::ScoreVerdict;

/// Engine failures as HTTP responses
#[derive(Debug)]
pub struct ApiError(EngineError);

impl From<EngineError> for ApiError {
    fn from(err: EngineError) -> Self {
        Self(err)
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let error = match &self.0 {
            EngineError::CandidateUnavailable(_) => "candidates unavailable",
            EngineError::StoreUnavailable(_) => "round store unavailable",
        };
        tracing::error!("Request failed: {}", self.0);

        let body = ErrorBody {
            error: error.to_string(),
            retryable: true,
        };
        (StatusCode::SERVICE_UNAVAILABLE, Json(body)).into_response()
    }
}

/// Build the game router around a shared engine
pub fn router(engine: Arc<RoundEngine>) -> Router {
    Router::new()
        .route("/api/round", get(create_round))
        .route("/api/answer", post(submit_answer))
        .route("/healthz", get(health))
        .layer(
            ServiceBuilder::new()
                .layer(TraceLayer::new_for_http())
                .layer(CorsLayer::permissive()),
        )
        .with_state(engine)
}

/// Create a round.
///
/// GET /api/round
pub async fn create_round(
    State(engine): State<Arc<RoundEngine>>,
) -> Result<Json<RoundPublicView>, ApiError> {
    let view = engine.create_round().await?;
    Ok(Json(view))
}

/// Submit an answer for a round.
///
/// POST /api/answer
///
/// The idempotency key may come in the body or the `Idempotency-Key`
/// header; the body wins when both are set. A body that is not a valid
/// answer is judged as a loss like any other unscorable submission.
pub async fn submit_answer(
    State(engine): State<Arc<RoundEngine>>,
    headers: HeaderMap,
    payload: Result<Json<SubmitAnswerRequest>, JsonRejection>,
) -> Result<Json<ScoreVerdict>, ApiError> {
    let request = match payload {
        Ok(Json(request)) => request,
        Err(rejection) => {
            tracing::debug!(
                status = %rejection.status(),
                "Unreadable answer body: {}",
                rejection.body_text()
            );
            return Ok(Json(generic_loss()));
        }
    };

    let header_key = headers
        .get(IDEMPOTENCY_HEADER)
        .and_then(|v| v.to_str().ok())
        .map(str::to_string);
    let key = request.idempotency_key.or(header_key);

    let verdict = engine
        .submit_answer(&request.id, &request.answer, key)
        .await?;
    Ok(Json(verdict))
}

async fn health() -> &'static str {
    "ok"
}
