use crate::error::{ApiError, ErrorResponse};
use crate::handlers::entry::summarize;
use crate::models::{endpoint_url, DeleteResponse, EndpointForm, ListResponse, SaveResponse};
use crate::notice::Notice;
use crate::registry::EndpointName;
use crate::router::{self, Outcome, RouteRequest};
use crate::routes;
use crate::state::AppState;
use axum::{
    body::Bytes,
    extract::{rejection::JsonRejection, Path, State},
    http::StatusCode,
    response::Redirect,
    Json,
};

/// GET /manage/endpoints handler - List all endpoints with their callable URLs
#[utoipa::path(
    get,
    path = routes::MANAGE_ENDPOINTS,
    responses(
        (status = 200, description = "Endpoints in stored order", body = ListResponse)
    ),
    tag = "manage"
)]
pub async fn list_handler(State(state): State<AppState>) -> (StatusCode, Json<ListResponse>) {
    let data = summarize(&state.config.public_base_url, state.registry.list().await);
    let total_count = data.len();

    tracing::debug!("Listed {} endpoints", total_count);
    (StatusCode::OK, Json(ListResponse { data, total_count }))
}

/// POST /manage/endpoints handler - Create or replace an endpoint from form input
#[utoipa::path(
    post,
    path = routes::MANAGE_ENDPOINTS,
    request_body = EndpointForm,
    responses(
        (status = 200, description = "Endpoint saved", body = SaveResponse),
        (status = 400, description = "Missing name or body, or invalid JSON", body = ErrorResponse),
        (status = 500, description = "Storage error", body = ErrorResponse)
    ),
    tag = "manage"
)]
pub async fn create_handler(
    State(state): State<AppState>,
    payload: Result<Json<EndpointForm>, JsonRejection>,
) -> Result<(StatusCode, Json<SaveResponse>), ApiError> {
    let Json(form) = payload.map_err(|rejection| {
        ApiError::InvalidSubmission(format!("Invalid submission: {}", rejection.body_text()))
    })?;

    if form.name.trim().is_empty() || form.body.trim().is_empty() {
        return Err(ApiError::InvalidSubmission(
            "Please provide both an endpoint name and JSON data.".to_string(),
        ));
    }

    let name = state.registry.create_from_text(&form.name, &form.body).await?;

    Ok((
        StatusCode::OK,
        Json(SaveResponse {
            url: endpoint_url(&state.config.public_base_url, name.as_str()),
            message: format!("Endpoint '{}' saved successfully!", name),
            name: name.to_string(),
        }),
    ))
}

/// DELETE /manage/endpoints/{name} handler - Remove an endpoint
#[utoipa::path(
    delete,
    path = routes::MANAGE_ENDPOINT_ITEM,
    params(
        ("name" = String, Path, description = "Endpoint name")
    ),
    responses(
        (status = 200, description = "Endpoint deleted", body = DeleteResponse),
        (status = 404, description = "Endpoint not found", body = ErrorResponse),
        (status = 500, description = "Storage error", body = ErrorResponse)
    ),
    tag = "manage"
)]
pub async fn delete_handler(
    State(state): State<AppState>,
    Path(name): Path<String>,
) -> Result<(StatusCode, Json<DeleteResponse>), ApiError> {
    let name = EndpointName::parse(&name).map_err(|_| ApiError::EndpointNotFound)?;

    if !state.registry.delete(name.as_str()).await? {
        return Err(ApiError::EndpointNotFound);
    }

    Ok((
        StatusCode::OK,
        Json(DeleteResponse {
            name: name.to_string(),
            deleted: true,
        }),
    ))
}

/// POST /manage/test-update handler - Apply an update from the management UI
///
/// Unlike the data API this never answers with the update result itself: the
/// outcome is stashed as a notice and the caller is sent back to the
/// management view, which shows it once.
#[utoipa::path(
    post,
    path = routes::MANAGE_TEST_UPDATE,
    request_body = EndpointForm,
    responses(
        (status = 303, description = "Redirect to the management view carrying a notice token")
    ),
    tag = "manage"
)]
pub async fn test_update_handler(
    State(state): State<AppState>,
    payload: Result<Json<EndpointForm>, JsonRejection>,
) -> Redirect {
    let notice = match payload {
        Ok(Json(form)) => staged_update_notice(&state, form).await,
        Err(rejection) => {
            tracing::info!(error = %rejection, "Rejected test-update submission");
            Notice::error(format!("Invalid submission: {}", rejection.body_text()))
        }
    };
    let token = state.notices.stash(notice);
    Redirect::to(&format!("{}?notice={}", routes::ROOT, token))
}

async fn staged_update_notice(state: &AppState, form: EndpointForm) -> Notice {
    if form.name.trim().is_empty() || form.body.trim().is_empty() {
        return Notice::error(
            "Please provide both an endpoint name and the JSON data for the update.",
        );
    }

    let display_name = EndpointName::parse(&form.name)
        .map(|n| n.to_string())
        .unwrap_or_else(|_| form.name.trim().to_string());

    let request = RouteRequest::post(Some(form.name), Bytes::from(form.body));
    match router::dispatch(&state.registry, router::classify(&request)).await {
        Outcome::Updated { name, .. } => Notice::success(format!("Endpoint '{}' updated.", name)),
        Outcome::NotFound => Notice::error(format!("Endpoint '{}' not found.", display_name)),
        Outcome::BadRequest(msg) => Notice::error(msg),
        Outcome::StorageFailure(msg) => {
            Notice::error(format!("Update could not be saved: {}", msg))
        }
        other => {
            tracing::warn!("Unexpected outcome for staged update: {:?}", other);
            Notice::error("Update was not applied.")
        }
    }
}
