//! Request classification for the combined data/management entry point.
//!
//! One address serves three purposes: the management view (no target),
//! reading a stored document (target, GET) and merging an update into it
//! (target, POST). `classify` is a pure function of the request; `dispatch`
//! performs the single terminal action it selects.

use axum::body::Bytes;
use serde_json::Value as JsonValue;

use crate::registry::{EndpointName, EndpointRegistry, RegistryError};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RequestMethod {
    Get,
    Post,
}

#[derive(Debug, Clone)]
pub struct RouteRequest {
    pub target: Option<String>,
    pub method: RequestMethod,
    /// Raw body; only meaningful for `Post`
    pub body: Bytes,
}

impl RouteRequest {
    pub fn get(target: Option<String>) -> Self {
        Self {
            target,
            method: RequestMethod::Get,
            body: Bytes::new(),
        }
    }

    pub fn post(target: Option<String>, body: Bytes) -> Self {
        Self {
            target,
            method: RequestMethod::Post,
            body,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Action {
    RenderManagementView,
    ServeDocument { name: String },
    ApplyUpdate { name: String, payload: Bytes },
}

#[derive(Debug, Clone, PartialEq)]
pub enum Outcome {
    ManagementView(Vec<(String, JsonValue)>),
    Document(JsonValue),
    NotFound,
    Updated { name: String, document: JsonValue },
    BadRequest(String),
    StorageFailure(String),
}

pub fn classify(request: &RouteRequest) -> Action {
    let target = request
        .target
        .as_deref()
        .map(str::trim)
        .filter(|t| !t.is_empty());

    match (target, request.method) {
        (None, _) => Action::RenderManagementView,
        (Some(name), RequestMethod::Post) => Action::ApplyUpdate {
            name: name.to_string(),
            payload: request.body.clone(),
        },
        (Some(name), RequestMethod::Get) => Action::ServeDocument {
            name: name.to_string(),
        },
    }
}

pub async fn dispatch(registry: &EndpointRegistry, action: Action) -> Outcome {
    match action {
        Action::RenderManagementView => Outcome::ManagementView(registry.list().await),
        Action::ServeDocument { name } => match registry.get(&name).await {
            Some(document) => {
                tracing::debug!(endpoint = %name, "Serving endpoint document");
                Outcome::Document(document)
            }
            None => {
                tracing::debug!(endpoint = %name, "Endpoint not found");
                Outcome::NotFound
            }
        },
        Action::ApplyUpdate { name, payload } => apply_update(registry, &name, &payload).await,
    }
}

async fn apply_update(registry: &EndpointRegistry, name: &str, payload: &[u8]) -> Outcome {
    let Ok(name) = EndpointName::parse(name) else {
        return Outcome::NotFound;
    };

    let partial: JsonValue = match serde_json::from_slice(payload) {
        Ok(partial) => partial,
        Err(err) => {
            // An unknown endpoint is reported as such even when the payload is also broken.
            if registry.get(name.as_str()).await.is_none() {
                return Outcome::NotFound;
            }
            tracing::info!(endpoint = %name, error = %err, "Rejected malformed update payload");
            return Outcome::BadRequest("Bad Request: Invalid JSON format.".to_string());
        }
    };

    match registry.merge_update(name.as_str(), partial).await {
        Ok(document) => Outcome::Updated {
            name: name.to_string(),
            document,
        },
        Err(RegistryError::NotFound(_) | RegistryError::InvalidName(_)) => Outcome::NotFound,
        Err(RegistryError::BadDocument(msg)) => {
            tracing::info!(endpoint = %name, "Rejected update: {}", msg);
            Outcome::BadRequest(format!("Bad Request: {}", msg))
        }
        Err(RegistryError::Storage(err)) => {
            tracing::error!(endpoint = %name, error = %err, "Failed to persist update");
            Outcome::StorageFailure(err.to_string())
        }
    }
}
