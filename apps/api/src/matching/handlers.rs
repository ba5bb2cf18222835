//! Axum route handlers for the Match API.

use std::sync::Arc;
use std::time::Duration;

use anyhow::anyhow;
use axum::{
    extract::{rejection::JsonRejection, Multipart, Path, Query, State},
    Json,
};
use bytes::Bytes;
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::documents::{DocumentTextProvider, PlainTextProvider};
use crate::errors::AppError;
use crate::matching::engine::MatchOutcome;
use crate::models::match_record::MatchRecord;
use crate::state::AppState;

const DEFAULT_PAGE_SIZE: i64 = 50;
const MAX_PAGE_SIZE: i64 = 200;

// ────────────────────────────────────────────────────────────────────────────
// Request / Response types
// ────────────────────────────────────────────────────────────────────────────

#[derive(Debug, Deserialize)]
pub struct MatchRequest {
    pub jd_text: String,
    pub cv_text: String,
    /// Overrides `MATCH_THRESHOLD` for this request only.
    #[serde(default)]
    pub threshold: Option<f64>,
}

#[derive(Debug, Deserialize)]
pub struct ListParams {
    pub limit: Option<i64>,
    pub offset: Option<i64>,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct MatchListResponse {
    pub total: i64,
    pub matches: Vec<MatchRecord>,
}

/// One uploaded document awaiting text extraction.
struct Upload {
    field: String,
    data: Bytes,
    plain_text: bool,
}

// ────────────────────────────────────────────────────────────────────────────
// Handlers
// ────────────────────────────────────────────────────────────────────────────

/// POST /api/v1/match
///
/// Scores raw CV text against raw JD text and records the outcome.
/// Body rejections (missing fields, bad JSON) go through `AppError` like every other failure.
pub async fn handle_match(
    State(state): State<AppState>,
    payload: Result<Json<MatchRequest>, JsonRejection>,
) -> Result<Json<MatchOutcome>, AppError> {
    let Json(request) = payload?;
    let threshold = request.threshold.unwrap_or(state.config.match_threshold);
    let outcome = state
        .engine
        .perform_match(&request.jd_text, &request.cv_text, threshold)
        .await?;
    Ok(Json(outcome))
}

/// POST /api/v1/match/pdf
///
/// Multipart upload with `jd_file`, `cv_file` and an optional `threshold` field.
/// PDFs go through the configured document provider; `text/plain` uploads are read as-is.
pub async fn handle_match_upload(
    State(state): State<AppState>,
    mut multipart: Multipart,
) -> Result<Json<MatchOutcome>, AppError> {
    let mut jd_upload = None;
    let mut cv_upload = None;
    let mut threshold = None;

    while let Some(field) = multipart.next_field().await? {
        let name = field.name().unwrap_or_default().to_string();
        match name.as_str() {
            "jd_file" | "cv_file" => {
                let plain_text = is_plain_text(field.content_type(), field.file_name());
                let data = field.bytes().await?;
                let upload = Upload {
                    field: name.clone(),
                    data,
                    plain_text,
                };
                if name == "jd_file" {
                    jd_upload = Some(upload);
                } else {
                    cv_upload = Some(upload);
                }
            }
            "threshold" => {
                let raw = field.text().await?;
                let value = raw.trim().parse::<f64>().map_err(|_| {
                    AppError::Validation(format!("threshold must be a number, got '{raw}'"))
                })?;
                threshold = Some(value);
            }
            other => debug!("Ignoring unexpected multipart field '{other}'"),
        }
    }

    let jd_upload =
        jd_upload.ok_or_else(|| AppError::Validation("jd_file is required".to_string()))?;
    let cv_upload =
        cv_upload.ok_or_else(|| AppError::Validation("cv_file is required".to_string()))?;

    let timeout = Duration::from_secs(state.config.extraction_timeout_secs);
    let jd_text = extract_upload(&state.documents, jd_upload, timeout).await?;
    let cv_text = extract_upload(&state.documents, cv_upload, timeout).await?;

    if jd_text.trim().is_empty() || cv_text.trim().is_empty() {
        return Err(AppError::Validation(
            "Could not extract text from one or both files.".to_string(),
        ));
    }

    let threshold = threshold.unwrap_or(state.config.match_threshold);
    let outcome = state
        .engine
        .perform_match(&jd_text, &cv_text, threshold)
        .await?;
    Ok(Json(outcome))
}

/// GET /api/v1/matches
///
/// Pages through recorded matches in id order.
pub async fn handle_list_matches(
    State(state): State<AppState>,
    Query(params): Query<ListParams>,
) -> Result<Json<MatchListResponse>, AppError> {
    let limit = params
        .limit
        .unwrap_or(DEFAULT_PAGE_SIZE)
        .clamp(1, MAX_PAGE_SIZE);
    let offset = params.offset.unwrap_or(0).max(0);

    let store = state.engine.store();
    let total = store.count().await?;
    let matches = store.list(limit, offset).await?;

    Ok(Json(MatchListResponse { total, matches }))
}

/// GET /api/v1/matches/:id
pub async fn handle_get_match(
    State(state): State<AppState>,
    Path(id): Path<i64>,
) -> Result<Json<MatchRecord>, AppError> {
    let record = state
        .engine
        .store()
        .get(id)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("Match {id} not found")))?;
    Ok(Json(record))
}

// ────────────────────────────────────────────────────────────────────────────
// Helpers
// ────────────────────────────────────────────────────────────────────────────

fn is_plain_text(content_type: Option<&str>, file_name: Option<&str>) -> bool {
    content_type.is_some_and(|ct| ct.starts_with("text/plain"))
        || file_name.is_some_and(|name| name.to_lowercase().ends_with(".txt"))
}

/// Extracts text on a blocking thread, bounded by `timeout`.
/// Unreadable documents are client errors; timeouts are server errors.
async fn extract_upload(
    pdf: &Arc<dyn DocumentTextProvider>,
    upload: Upload,
    timeout: Duration,
) -> Result<String, AppError> {
    let Upload {
        field,
        data,
        plain_text,
    } = upload;
    let provider: Arc<dyn DocumentTextProvider> = if plain_text {
        Arc::new(PlainTextProvider)
    } else {
        Arc::clone(pdf)
    };

    let task = tokio::task::spawn_blocking(move || provider.extract_text(&data));
    match tokio::time::timeout(timeout, task).await {
        Ok(Ok(Ok(text))) => {
            debug!("Extracted {} chars from {field}", text.len());
            Ok(text)
        }
        Ok(Ok(Err(e))) => Err(AppError::Validation(format!("{field}: {e}"))),
        Ok(Err(join)) if join.is_panic() => Err(AppError::Validation(format!(
            "{field}: document could not be parsed"
        ))),
        Ok(Err(join)) => Err(AppError::Internal(anyhow!(
            "{field}: extraction task failed: {join}"
        ))),
        Err(_) => Err(AppError::Internal(anyhow!(
            "{field}: text extraction timed out after {}s",
            timeout.as_secs()
        ))),
    }
}
