use crate::error::{ApiError, ErrorResponse};
use crate::models::{endpoint_url, EndpointSummary, EntryQuery, ManagementView, UpdateResponse};
use crate::router::{self, Outcome, RouteRequest};
use crate::routes;
use crate::state::AppState;
use axum::{
    body::Bytes,
    extract::{Path, Query, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use uuid::Uuid;

/// GET / handler - Serve a document (`?endpoint=<name>`) or the management view
#[utoipa::path(
    get,
    path = routes::ROOT,
    params(EntryQuery),
    responses(
        (status = 200, description = "Stored document, or the management view when no endpoint is given", body = ManagementView),
        (status = 404, description = "Endpoint not found", body = ErrorResponse)
    ),
    tag = "data"
)]
pub async fn entry_get_handler(
    State(state): State<AppState>,
    Query(query): Query<EntryQuery>,
) -> Response {
    respond(&state, RouteRequest::get(query.endpoint), query.notice.as_deref()).await
}

/// POST / handler - Merge a JSON object into `?endpoint=<name>`
#[utoipa::path(
    post,
    path = routes::ROOT,
    params(EntryQuery),
    request_body = serde_json::Value,
    responses(
        (status = 200, description = "Document updated", body = UpdateResponse),
        (status = 400, description = "Malformed JSON or non-object document", body = ErrorResponse),
        (status = 404, description = "Endpoint not found", body = ErrorResponse),
        (status = 500, description = "Storage error", body = ErrorResponse)
    ),
    tag = "data"
)]
pub async fn entry_post_handler(
    State(state): State<AppState>,
    Query(query): Query<EntryQuery>,
    body: Bytes,
) -> Response {
    respond(&state, RouteRequest::post(query.endpoint, body), query.notice.as_deref()).await
}

/// GET /{name} handler - Serve a stored document
#[utoipa::path(
    get,
    path = routes::ENDPOINT_ITEM,
    params(
        ("name" = String, Path, description = "Endpoint name")
    ),
    responses(
        (status = 200, description = "Stored document", body = serde_json::Value),
        (status = 404, description = "Endpoint not found", body = ErrorResponse)
    ),
    tag = "data"
)]
pub async fn endpoint_get_handler(
    State(state): State<AppState>,
    Path(name): Path<String>,
) -> Response {
    respond(&state, RouteRequest::get(Some(name)), None).await
}

/// POST /{name} handler - Merge a JSON object into a stored document
#[utoipa::path(
    post,
    path = routes::ENDPOINT_ITEM,
    params(
        ("name" = String, Path, description = "Endpoint name")
    ),
    request_body = serde_json::Value,
    responses(
        (status = 200, description = "Document updated", body = UpdateResponse),
        (status = 400, description = "Malformed JSON or non-object document", body = ErrorResponse),
        (status = 404, description = "Endpoint not found", body = ErrorResponse),
        (status = 500, description = "Storage error", body = ErrorResponse)
    ),
    tag = "data"
)]
pub async fn endpoint_post_handler(
    State(state): State<AppState>,
    Path(name): Path<String>,
    body: Bytes,
) -> Response {
    respond(&state, RouteRequest::post(Some(name), body), None).await
}

/// Classify, dispatch, and answer directly: data requests never fall through
/// into the management view.
async fn respond(state: &AppState, request: RouteRequest, notice_token: Option<&str>) -> Response {
    let action = router::classify(&request);
    match router::dispatch(&state.registry, action).await {
        Outcome::ManagementView(entries) => {
            let view = management_view(state, entries, notice_token);
            (StatusCode::OK, Json(view)).into_response()
        }
        Outcome::Document(document) => (StatusCode::OK, Json(document)).into_response(),
        Outcome::Updated { name, document } => {
            tracing::info!(
                "Endpoint '{}' updated via data API, now {} top-level keys",
                name,
                document.as_object().map_or(0, |o| o.len())
            );
            (
                StatusCode::OK,
                Json(UpdateResponse {
                    status: "success".to_string(),
                    message: format!("Endpoint '{}' updated.", name),
                }),
            )
                .into_response()
        }
        Outcome::NotFound => ApiError::EndpointNotFound.into_response(),
        Outcome::BadRequest(msg) => ApiError::BadRequest(msg).into_response(),
        Outcome::StorageFailure(msg) => ApiError::Storage(msg).into_response(),
    }
}

pub(crate) fn summarize(
    base_url: &str,
    entries: Vec<(String, serde_json::Value)>,
) -> Vec<EndpointSummary> {
    entries
        .into_iter()
        .map(|(name, document)| EndpointSummary {
            url: endpoint_url(base_url, &name),
            name,
            document,
        })
        .collect()
}

fn management_view(
    state: &AppState,
    entries: Vec<(String, serde_json::Value)>,
    notice_token: Option<&str>,
) -> ManagementView {
    let notice = notice_token
        .and_then(|token| Uuid::parse_str(token).ok())
        .and_then(|token| state.notices.take(&token));

    ManagementView {
        base_url: state.config.public_base_url.clone(),
        base_url_configured: state.config.base_url_configured,
        endpoints: summarize(&state.config.public_base_url, entries),
        notice,
    }
}
