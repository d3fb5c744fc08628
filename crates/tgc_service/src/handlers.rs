//! Request handlers.

use axum::body::Bytes;
use axum::extract::{Path, State};
use axum::http::header::CONTENT_TYPE;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde::Serialize;
use tgc_catalog::{TemplateDescriptor, TemplateStatus, Version};
use tgc_packager::{normalize_config, Packager, PackagerError, Selection};
use tracing::{debug, info};

use crate::error::{ServiceError, ServiceResult};
use crate::state::ServiceState;

const DIALOG_FLOW: &str = "trustgraph-flow.yaml";
const CONFIG_PREPARE: &str = "trustgraph-output.jsonata";
const DOCS_MANIFEST: &str = "trustgraph-docs.yaml";
const DOCS_DIR: &str = "docs";

/// Template name and version pair.
#[derive(Debug, Serialize)]
pub struct LatestResponse {
    pub template: String,
    pub version: Version,
}

impl From<&TemplateDescriptor> for LatestResponse {
    fn from(descriptor: &TemplateDescriptor) -> Self {
        Self {
            template: descriptor.name.clone(),
            version: descriptor.version.clone(),
        }
    }
}

/// One catalog row.
#[derive(Debug, Serialize)]
pub struct VersionEntry {
    pub template: String,
    pub version: Version,
    pub description: String,
    pub status: TemplateStatus,
}

pub async fn generate(
    State(state): State<ServiceState>,
    Path((platform, template)): Path<(String, String)>,
    body: Bytes,
) -> ServiceResult<Response> {
    info!("Generating for platform={} template={}", platform, template);

    // Caller input is untrusted: only canonical JSON goes further
    let config = std::str::from_utf8(&body)
        .map_err(|_| ServiceError::BadRequest("body is not UTF-8".to_string()))
        .and_then(|text| {
            normalize_config(text).map_err(|e| {
                info!("Bad JSON");
                ServiceError::BadRequest(e.to_string())
            })
        })?;
    debug!("Config: {}", config);

    let data = tokio::task::spawn_blocking(move || -> Result<Vec<u8>, PackagerError> {
        let selection = Selection::new(platform).with_template(template);
        let packager = Packager::new(&selection, &state.index, &state.layout, state.engine.clone())?;
        packager.generate(&config)
    })
    .await??;

    Ok(([(CONTENT_TYPE, "application/octet-stream")], data).into_response())
}

pub async fn generate_without_template(Path(platform): Path<String>) -> ServiceError {
    ServiceError::BadRequest(format!("no template given for platform {}", platform))
}

pub async fn latest(State(state): State<ServiceState>) -> ServiceResult<Json<LatestResponse>> {
    Ok(Json(state.index.latest()?.into()))
}

pub async fn latest_stable(State(state): State<ServiceState>) -> ServiceResult<Json<LatestResponse>> {
    Ok(Json(state.index.latest_stable()?.into()))
}

pub async fn versions(State(state): State<ServiceState>) -> Json<Vec<VersionEntry>> {
    let entries = state
        .index
        .templates()
        .iter()
        .map(|t| VersionEntry {
            template: t.name.clone(),
            version: t.version.clone(),
            description: t.description.clone(),
            status: t.status.clone(),
        })
        .collect();
    Json(entries)
}

pub async fn dialog_flow(State(state): State<ServiceState>) -> ServiceResult<Response> {
    dialog_resource(&state, DIALOG_FLOW, "application/x-yaml").await
}

pub async fn config_prepare(State(state): State<ServiceState>) -> ServiceResult<Response> {
    dialog_resource(&state, CONFIG_PREPARE, "text/plain").await
}

pub async fn docs_manifest(State(state): State<ServiceState>) -> ServiceResult<Response> {
    dialog_resource(&state, DOCS_MANIFEST, "application/x-yaml").await
}

pub async fn docs_fragment(
    State(state): State<ServiceState>,
    Path(path): Path<String>,
) -> ServiceResult<Response> {
    if path.contains("..") {
        return Err(ServiceError::NotFound(path));
    }
    let relative = format!("{}/{}", DOCS_DIR, path.trim_start_matches('/'));
    dialog_resource(&state, &relative, "text/markdown").await
}

async fn dialog_resource(
    state: &ServiceState,
    relative: &str,
    content_type: &'static str,
) -> ServiceResult<Response> {
    let path = state.layout.dialog_dir().join(relative);
    let content = tokio::fs::read_to_string(&path)
        .await
        .map_err(|_| ServiceError::NotFound(relative.to_string()))?;
    Ok(([(CONTENT_TYPE, content_type)], content).into_response())
}
