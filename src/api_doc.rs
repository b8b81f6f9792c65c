use utoipa::OpenApi;

use crate::error::{ErrorResponse, HealthResponse, UnhealthyResponse};
use crate::handlers;
use crate::models::{
    DeleteResponse, EndpointForm, EndpointSummary, ListResponse, ManagementView, SaveResponse,
    UpdateResponse,
};
use crate::notice::{Notice, NoticeLevel};

/// OpenAPI documentation
#[derive(OpenApi)]
#[openapi(
    info(
        title = "live-endpoints API",
        version = "1.0.0",
        description = "Named JSON endpoints: read with GET, shallow-merge with POST, managed over HTTP"
    ),
    paths(
        handlers::health::health_handler,
        handlers::entry::entry_get_handler,
        handlers::entry::entry_post_handler,
        handlers::entry::endpoint_get_handler,
        handlers::entry::endpoint_post_handler,
        handlers::manage::list_handler,
        handlers::manage::create_handler,
        handlers::manage::delete_handler,
        handlers::manage::test_update_handler
    ),
    components(
        schemas(
            UpdateResponse,
            ManagementView,
            EndpointSummary,
            ListResponse,
            EndpointForm,
            SaveResponse,
            DeleteResponse,
            Notice,
            NoticeLevel,
            ErrorResponse,
            HealthResponse,
            UnhealthyResponse
        )
    ),
    tags(
        (name = "health", description = "Health check operations"),
        (name = "data", description = "Reading and updating endpoint documents"),
        (name = "manage", description = "Creating, listing and deleting endpoints")
    )
)]
pub struct ApiDoc;
