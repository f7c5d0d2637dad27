use crate::state::{Fields, Origin, WorldStore};
use axum::{
    body::Bytes,
    extract::{Path, State},
    http::StatusCode,
    response::{IntoResponse, Json, Response},
    routing::get,
    Router,
};
use serde::Serialize;
use std::sync::Arc;
use tracing::info;

/// Shared state for the entity API.
#[derive(Clone)]
pub struct EntityAppState {
    pub store: Arc<WorldStore>,
    /// Request bodies above this size are rejected with 413.
    pub max_body_bytes: usize,
}

/// Error response
#[derive(Serialize)]
struct ErrorResponse {
    error: String,
}

/// Create the entity router. Methods other than GET/POST/PUT on
/// `/entity/:id` get 405 from the method router.
pub fn create_entity_router(state: Arc<EntityAppState>) -> Router {
    Router::new()
        .route(
            "/entity/:id",
            get(get_entity).post(merge_entity).put(replace_entity),
        )
        .with_state(state)
}

/// GET /entity/:id - current record, empty if the entity is absent.
async fn get_entity(
    State(state): State<Arc<EntityAppState>>,
    Path(id): Path<String>,
) -> Json<Fields> {
    Json(state.store.get(&id))
}

/// POST /entity/:id - merge fields into the entity; 201 when this request
/// created it, 204 otherwise.
async fn merge_entity(
    State(state): State<Arc<EntityAppState>>,
    Path(id): Path<String>,
    body: Bytes,
) -> Result<StatusCode, AppError> {
    let fields = parse_record(&state, &body)?;

    info!(entity = %id, fields = fields.len(), "merging entity fields");
    let created = state.store.merge_fields(Origin::System, &id, fields);

    Ok(if created {
        StatusCode::CREATED
    } else {
        StatusCode::NO_CONTENT
    })
}

/// PUT /entity/:id - replace the entity wholesale; returns the resulting
/// record.
async fn replace_entity(
    State(state): State<Arc<EntityAppState>>,
    Path(id): Path<String>,
    body: Bytes,
) -> Result<Json<Fields>, AppError> {
    let fields = parse_record(&state, &body)?;

    info!(entity = %id, "replacing entity");
    let record = state.store.set(Origin::System, &id, fields);

    Ok(Json(record))
}

/// Decode a request body as a JSON object of fields, enforcing the
/// configured size cap.
fn parse_record(state: &EntityAppState, body: &Bytes) -> Result<Fields, AppError> {
    if body.len() > state.max_body_bytes {
        return Err(AppError::PayloadTooLarge);
    }
    serde_json::from_slice(body).map_err(|e| AppError::Validation(e.to_string()))
}

/// Entity API error types
enum AppError {
    Validation(String),
    PayloadTooLarge,
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, error_message) = match self {
            AppError::Validation(msg) => (StatusCode::BAD_REQUEST, msg),
            AppError::PayloadTooLarge => {
                (StatusCode::PAYLOAD_TOO_LARGE, "payload too large".to_string())
            }
        };
        let body = Json(ErrorResponse {
            error: error_message,
        });
        (status, body).into_response()
    }
}
