use super::errors::ApiError;
use super::AppState;
use crate::diag::{self, Diagnostics};
use crate::error::{Result as ShiftResult, ShiftError};
use crate::generate::{BundleInfo, RunHandle, RunState, StagedRun};
use crate::model::ConfigDocument;
use crate::store::{validate_name, STAGING_NAME};
use crate::validate::{review, ValidationReport, Violation, Warning};
use axum::body::Bytes;
use axum::extract::{Path, State};
use axum::http::header;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct StageRequest {
    source_name: String,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct GenerateRequest {
    run_token: String,
}

#[derive(Debug, Serialize)]
pub(crate) struct SaveResponse {
    name: String,
    violations: Vec<Violation>,
    warnings: Vec<Warning>,
}

async fn blocking<T, F>(work: F) -> Result<T, ApiError>
where
    F: FnOnce() -> ShiftResult<T> + Send + 'static,
    T: Send + 'static,
{
    tokio::task::spawn_blocking(work)
        .await
        .map_err(|err| ApiError::Internal(format!("blocking task failed: {err}")))?
        .map_err(ApiError::from)
}

pub(crate) async fn list_documents(
    State(state): State<AppState>,
) -> Result<Json<Vec<String>>, ApiError> {
    let store = state.store();
    let names = blocking(move || store.list()).await?;
    Ok(Json(names))
}

pub(crate) async fn get_document(
    State(state): State<AppState>,
    Path(name): Path<String>,
) -> Result<Json<ConfigDocument>, ApiError> {
    let store = state.store();
    let doc = blocking(move || store.load(&name)).await?;
    Ok(Json(doc))
}

pub(crate) async fn put_document(
    State(state): State<AppState>,
    Path(name): Path<String>,
    body: Bytes,
) -> Result<Json<SaveResponse>, ApiError> {
    validate_name(&name)?;
    if name == STAGING_NAME {
        return Err(ShiftError::InvalidName {
            name,
            reason: "the staging slot is written by /stage",
        }
        .into());
    }
    let doc = ConfigDocument::from_json_slice(&body)?;
    let store = state.store();
    let report = blocking(move || {
        store.save(&name, &doc)?;
        let report = review(&doc);
        tracing::info!(
            name = %name,
            violations = report.violations.len(),
            warnings = report.warnings.len(),
            "saved document"
        );
        Ok((name, report))
    })
    .await?;
    let (name, ValidationReport { violations, warnings }) = report;
    Ok(Json(SaveResponse {
        name,
        violations,
        warnings,
    }))
}

pub(crate) async fn delete_document(
    State(state): State<AppState>,
    Path(name): Path<String>,
) -> Result<Json<Value>, ApiError> {
    let store = state.store();
    let deleted = name.clone();
    blocking(move || store.delete(&name)).await?;
    tracing::info!(name = %deleted, "deleted document");
    Ok(Json(json!({ "deleted": deleted })))
}

pub(crate) async fn document_validation(
    State(state): State<AppState>,
    Path(name): Path<String>,
) -> Result<Json<ValidationReport>, ApiError> {
    let store = state.store();
    let report = blocking(move || store.load(&name).map(|doc| review(&doc))).await?;
    Ok(Json(report))
}

pub(crate) async fn stage(
    State(state): State<AppState>,
    body: Bytes,
) -> Result<Json<StagedRun>, ApiError> {
    let request: StageRequest = serde_json::from_slice(&body)?;
    let generator = state.generator();
    let staged = blocking(move || generator.stage(&request.source_name)).await?;
    Ok(Json(staged))
}

pub(crate) async fn generate(
    State(state): State<AppState>,
    body: Bytes,
) -> Result<Json<RunHandle>, ApiError> {
    let request: GenerateRequest = serde_json::from_slice(&body)?;
    let generator = state.generator();
    let handle = blocking(move || generator.run(&request.run_token)).await?;
    Ok(Json(handle))
}

pub(crate) async fn list_bundles(
    State(state): State<AppState>,
) -> Result<Json<Vec<BundleInfo>>, ApiError> {
    let generator = state.generator();
    let bundles = blocking(move || generator.list_bundles()).await?;
    Ok(Json(bundles))
}

pub(crate) async fn fetch_bundle(
    State(state): State<AppState>,
    Path(bundle_id): Path<String>,
) -> Result<Response, ApiError> {
    let generator = state.generator();
    let disposition = content_disposition(&bundle_id);
    let archive = blocking(move || generator.fetch(&bundle_id)).await?;
    let headers = [
        (header::CONTENT_TYPE, "application/gzip".to_string()),
        (header::CONTENT_DISPOSITION, disposition),
    ];
    Ok((headers, archive).into_response())
}

pub(crate) async fn status(State(state): State<AppState>) -> Result<Json<RunState>, ApiError> {
    let generator = state.generator();
    let run_state = blocking(move || Ok(generator.status())).await?;
    Ok(Json(run_state))
}

pub(crate) async fn diag(State(state): State<AppState>) -> Result<Json<Diagnostics>, ApiError> {
    let generator = state.generator();
    let report = blocking(move || diag::collect(&generator)).await?;
    Ok(Json(report))
}

/// Bundle ids embed document names, which need not be ASCII.
fn content_disposition(bundle_id: &str) -> String {
    let keep = |byte: u8| byte.is_ascii_alphanumeric() || matches!(byte, b'_' | b'-' | b'.');
    let fallback: String = bundle_id
        .bytes()
        .map(|byte| if keep(byte) { byte as char } else { '_' })
        .collect();
    let mut encoded = String::new();
    for byte in bundle_id.bytes() {
        if keep(byte) {
            encoded.push(byte as char);
        } else {
            encoded.push_str(&format!("%{byte:02X}"));
        }
    }
    format!("attachment; filename=\"{fallback}.tar.gz\"; filename*=UTF-8''{encoded}.tar.gz")
}
