// Route path constants - single source of truth for all API paths

use axum::{
    routing::{delete, get, post},
    Router,
};
use tower_http::trace::TraceLayer;
use utoipa::OpenApi;
use utoipa_swagger_ui::SwaggerUi;

use crate::api_doc::ApiDoc;
use crate::handlers;
use crate::state::AppState;

pub const ROOT: &str = "/";
pub const HEALTH: &str = "/health";
pub const ENDPOINT_ITEM: &str = "/{name}";
pub const MANAGE_ENDPOINTS: &str = "/manage/endpoints";
pub const MANAGE_ENDPOINT_ITEM: &str = "/manage/endpoints/{name}";
pub const MANAGE_TEST_UPDATE: &str = "/manage/test-update";
pub const SWAGGER_UI: &str = "/swagger-ui";
pub const OPENAPI_JSON: &str = "/api-docs/openapi.json";

/// Assemble the full application router.
///
/// Static paths take priority over `ENDPOINT_ITEM`, so an endpoint whose name
/// collides with one of them is only reachable through `/?endpoint=<name>`.
pub fn build_router(state: AppState) -> Router {
    Router::new()
        .route(
            ROOT,
            get(handlers::entry_get_handler).post(handlers::entry_post_handler),
        )
        .route(HEALTH, get(handlers::health_handler))
        .route(
            MANAGE_ENDPOINTS,
            get(handlers::list_handler).post(handlers::create_handler),
        )
        .route(MANAGE_ENDPOINT_ITEM, delete(handlers::delete_handler))
        .route(MANAGE_TEST_UPDATE, post(handlers::test_update_handler))
        .route(
            ENDPOINT_ITEM,
            get(handlers::endpoint_get_handler).post(handlers::endpoint_post_handler),
        )
        .merge(SwaggerUi::new(SWAGGER_UI).url(OPENAPI_JSON, ApiDoc::openapi()))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}
