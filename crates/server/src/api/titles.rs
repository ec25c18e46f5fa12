//! Download API handlers.
//!
//! One handler per output kind, all funneling into the same pipeline
//! invocation and outcome mapping. Successful downloads carry the
//! suggested filename in the disposition header and a compact
//! `X-Metadata` JSON header exposed to cross-origin readers.

use axum::{
    body::Body,
    extract::{Path, State},
    http::{header, HeaderValue, StatusCode},
    response::{IntoResponse, Response},
    Json,
};
use serde::Serialize;
use std::sync::Arc;
use tracing::error;

use titlegate_core::{OutputKind, PackageError, PackagedOutput, TitleRequest};

use crate::metrics::DOWNLOADS_TOTAL;
use crate::state::AppState;

/// Header carrying `{tid, version}` for the frontend.
const METADATA_HEADER: &str = "x-metadata";

/// Structured error payload for classified outcomes.
#[derive(Debug, Serialize)]
pub struct DownloadErrorBody {
    pub message: String,
    pub code: &'static str,
}

pub async fn download_wad(
    State(state): State<Arc<AppState>>,
    Path((tid, ver)): Path<(String, String)>,
) -> Response {
    download(state, tid, ver, OutputKind::NativePackage).await
}

pub async fn download_enc(
    State(state): State<Arc<AppState>>,
    Path((tid, ver)): Path<(String, String)>,
) -> Response {
    download(state, tid, ver, OutputKind::EncryptedArchive).await
}

pub async fn download_dec(
    State(state): State<Arc<AppState>>,
    Path((tid, ver)): Path<(String, String)>,
) -> Response {
    download(state, tid, ver, OutputKind::DecryptedArchive).await
}

pub async fn download_tad(
    State(state): State<Arc<AppState>>,
    Path((tid, ver)): Path<(String, String)>,
) -> Response {
    download(state, tid, ver, OutputKind::HandheldPackage).await
}

async fn download(state: Arc<AppState>, tid: String, ver: String, kind: OutputKind) -> Response {
    let request = TitleRequest::new(&tid, &ver);

    match state.engine().package(&request, kind).await {
        Ok(output) => {
            DOWNLOADS_TOTAL
                .with_label_values(&[kind.as_str(), "success"])
                .inc();
            success_response(&tid, output)
        }
        Err(err) => {
            let outcome = err.code().unwrap_or("error");
            DOWNLOADS_TOTAL
                .with_label_values(&[kind.as_str(), outcome])
                .inc();
            error_response(&state, &tid, kind, err)
        }
    }
}

fn success_response(tid: &str, output: PackagedOutput) -> Response {
    let metadata = serde_json::json!({
        "tid": tid,
        "version": output.final_version,
    })
    .to_string();

    let disposition = format!("attachment; filename=\"{}\"", output.suggested_filename);

    let headers = [
        (header::CONTENT_TYPE, output.content_type.mime().to_string()),
        (header::CONTENT_DISPOSITION, disposition),
        (header::ACCESS_CONTROL_EXPOSE_HEADERS, METADATA_HEADER.to_string()),
    ];

    let mut response = Response::new(Body::from(output.bytes));
    for (name, value) in headers {
        match HeaderValue::from_str(&value) {
            Ok(value) => {
                response.headers_mut().insert(name, value);
            }
            Err(_) => return internal_error(),
        }
    }
    match HeaderValue::from_str(&metadata) {
        Ok(value) => {
            response.headers_mut().insert(METADATA_HEADER, value);
        }
        // A title id with non-header-safe bytes ends up here.
        Err(_) => return internal_error(),
    }

    response
}

fn error_response(state: &AppState, tid: &str, kind: OutputKind, err: PackageError) -> Response {
    match &err {
        PackageError::TitleNotFound(_) => (
            StatusCode::NOT_FOUND,
            Json(DownloadErrorBody {
                message: err.to_string(),
                code: "title.notfound",
            }),
        )
            .into_response(),
        PackageError::NoLicense(_) => (
            state.no_license_status(),
            Json(DownloadErrorBody {
                message: err.to_string(),
                code: "title.notik",
            }),
        )
            .into_response(),
        // Unclassified failures: log the detail, leak nothing.
        _ => {
            error!(
                title_id = tid,
                kind = kind.as_str(),
                error = %err,
                "Packaging pipeline failed"
            );
            internal_error()
        }
    }
}

fn internal_error() -> Response {
    (
        StatusCode::INTERNAL_SERVER_ERROR,
        Json(DownloadErrorBody {
            message: "Internal server error.".to_string(),
            code: "internal.error",
        }),
    )
        .into_response()
}
