use serde::{Deserialize, Serialize};
use serde_json::Value as JsonValue;

use crate::notice::Notice;

/// Callable URL for an endpoint, as shown in the management view.
///
/// The name is form-encoded so that `+`, `&`, `#` or `%` in it survive the
/// round trip through the `endpoint` query parameter.
pub fn endpoint_url(base_url: &str, name: &str) -> String {
    let encoded: String = form_urlencoded::byte_serialize(name.as_bytes()).collect();
    format!("{}?endpoint={}", base_url, encoded)
}

/// Query parameters accepted on the combined entry point
#[derive(Debug, Default, Deserialize, utoipa::IntoParams)]
#[into_params(parameter_in = Query)]
pub struct EntryQuery {
    /// Target endpoint name; absent means the management view
    pub endpoint: Option<String>,
    /// Correlation token from a UI-initiated update
    pub notice: Option<String>,
}

/// Response type for a successful data-API update
#[derive(Serialize, Deserialize, utoipa::ToSchema)]
pub struct UpdateResponse {
    pub status: String,
    pub message: String,
}

/// One endpoint as listed by the management surface
#[derive(Debug, Serialize, Deserialize, utoipa::ToSchema)]
pub struct EndpointSummary {
    pub name: String,
    pub url: String,
    pub document: JsonValue,
}

/// Read-only snapshot handed to whatever renders the management UI
#[derive(Debug, Serialize, Deserialize, utoipa::ToSchema)]
pub struct ManagementView {
    pub base_url: String,
    /// False when the base URL is the localhost fallback
    pub base_url_configured: bool,
    pub endpoints: Vec<EndpointSummary>,
    pub notice: Option<Notice>,
}

/// Response type for the endpoint list
#[derive(Serialize, Deserialize, utoipa::ToSchema)]
pub struct ListResponse {
    pub data: Vec<EndpointSummary>,
    pub total_count: usize,
}

/// Management form submission: an endpoint name plus JSON text
#[derive(Debug, Default, Serialize, Deserialize, utoipa::ToSchema)]
pub struct EndpointForm {
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub body: String,
}

/// Response type for a successful create-or-replace
#[derive(Serialize, Deserialize, utoipa::ToSchema)]
pub struct SaveResponse {
    pub name: String,
    pub url: String,
    pub message: String,
}

/// Response type for a successful delete
#[derive(Serialize, Deserialize, utoipa::ToSchema)]
pub struct DeleteResponse {
    pub name: String,
    pub deleted: bool,
}
