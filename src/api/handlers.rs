//! HTTPハンドラー
//!
//! - `GET /` 死活確認
//! - `POST /api/analyze` 画像アップロード解析
//! - `GET /api/history` 最近の解析結果
//! - `GET /api/analysis/:id` 解析結果1件

use axum::extract::multipart::{MultipartError, MultipartRejection};
use axum::extract::rejection::QueryRejection;
use axum::extract::{Multipart, Path, Query, State};
use axum::http::StatusCode;
use axum::Json;
use serde::{Deserialize, Serialize};

use super::error::ApiError;
use super::router::MAX_UPLOAD_BYTES;
use super::AppState;
use crate::analyzer::{AnalysisResult, Upload};

/// 履歴の既定件数
pub const DEFAULT_HISTORY_LIMIT: usize = 10;

#[derive(Serialize)]
pub struct RootMessage {
    pub message: &'static str,
}

#[derive(Serialize)]
pub struct AnalysisResponse {
    pub success: bool,
    pub message: String,
    pub analysis: Option<AnalysisResult>,
}

#[derive(Deserialize)]
pub struct HistoryParams {
    pub limit: Option<usize>,
}

pub async fn root() -> Json<RootMessage> {
    Json(RootMessage {
        message: "Defect Detective API is running",
    })
}

pub async fn analyze(
    State(state): State<AppState>,
    multipart: Result<Multipart, MultipartRejection>,
) -> Result<Json<AnalysisResponse>, ApiError> {
    let mut multipart = multipart.map_err(|e| ApiError::BadRequest(e.body_text()))?;
    let mut upload: Option<Upload> = None;

    loop {
        let field = match multipart.next_field().await {
            Ok(Some(field)) => field,
            Ok(None) => break,
            Err(e) => return Err(multipart_error(e)),
        };

        if field.name() != Some("file") {
            continue;
        }

        let filename = field.file_name().unwrap_or("upload").to_string();
        let content_type = field.content_type().map(str::to_string);
        let bytes = field.bytes().await.map_err(multipart_error)?;

        upload = Some(Upload {
            filename,
            content_type,
            bytes: bytes.to_vec(),
        });
    }

    let upload = upload.ok_or_else(|| ApiError::BadRequest("No file provided".to_string()))?;

    let result = state
        .pipeline
        .run(upload)
        .await
        .map_err(|e| ApiError::from_defect(e, "Analysis failed"))?;

    Ok(Json(AnalysisResponse {
        success: true,
        message: format!("Analysis complete. Found {} defects.", result.total_defects),
        analysis: Some(result),
    }))
}

pub async fn history(
    State(state): State<AppState>,
    params: Result<Query<HistoryParams>, QueryRejection>,
) -> Result<Json<Vec<AnalysisResult>>, ApiError> {
    let Query(params) = params.map_err(|e| ApiError::BadRequest(e.body_text()))?;
    let limit = params.limit.unwrap_or(DEFAULT_HISTORY_LIMIT);
    let results = state
        .pipeline
        .history(limit)
        .await
        .map_err(|e| ApiError::from_defect(e, "Failed to fetch history"))?;
    Ok(Json(results))
}

pub async fn analysis(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<AnalysisResult>, ApiError> {
    let result = state
        .pipeline
        .find(id)
        .await
        .map_err(|e| ApiError::from_defect(e, "Failed to fetch analysis"))?;
    Ok(Json(result))
}

/// 上限超過は 413、それ以外は 400
fn multipart_error(err: MultipartError) -> ApiError {
    if err.status() == StatusCode::PAYLOAD_TOO_LARGE {
        return ApiError::PayloadTooLarge(format!(
            "Upload exceeds the {} MiB limit",
            MAX_UPLOAD_BYTES / (1024 * 1024)
        ));
    }
    ApiError::BadRequest(format!("Invalid multipart body: {}", err.body_text()))
}
