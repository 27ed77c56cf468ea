use std::sync::Arc;

use axum::{
    body::Bytes,
    extract::{Multipart, State},
    Json,
};
use serde::{Deserialize, Serialize};
use serde_json::json;
use tracing::{error, info, warn};

use crate::{
    auth::RequireApiKey,
    error::ApiError,
    model::AnalysisResult,
    storage::generate_image_id,
    validators::{validate_file_upload, validate_image_async},
    AppState,
};

const UPLOAD_FIELD: &str = "file";

#[derive(Debug, Serialize, Deserialize)]
pub struct UploadResponse {
    pub image_id: String,
    pub filename: String,
    pub size: usize,
    pub message: String,
}

#[derive(Debug, Deserialize)]
pub struct AnalysisRequest {
    pub image_id: String,
}

pub async fn upload_handler(
    State(state): State<Arc<AppState>>,
    _auth: RequireApiKey,
    mut multipart: Multipart,
) -> Result<Json<UploadResponse>, ApiError> {
    let (filename, contents) = read_file_field(&mut multipart)
        .await?
        .ok_or(ApiError::BadRequest("No file uploaded"))?;

    info!("Upload request received for file: {}", filename);

    let file_size = contents.len();
    let extension = validate_file_upload(&state.settings, &filename, file_size)?;

    let image_id = generate_image_id();
    let path = state
        .store
        .write(&image_id, &extension, &contents)
        .await
        .map_err(|err| {
            error!("Upload failed: could not write {}: {}", image_id, err);
            ApiError::Internal {
                operation: "process upload",
            }
        })?;

    if let Err(err) = validate_image_async(path.clone()).await {
        if let Err(cleanup) = state.store.remove(&path).await {
            warn!("Could not remove rejected upload {}: {}", path.display(), cleanup);
        }
        return Err(err);
    }

    info!("File uploaded successfully: {} ({})", image_id, filename);

    Ok(Json(UploadResponse {
        image_id,
        filename,
        size: file_size,
        message: "Image uploaded successfully".to_string(),
    }))
}

async fn read_file_field(multipart: &mut Multipart) -> Result<Option<(String, Bytes)>, ApiError> {
    while let Some(field) = multipart.next_field().await? {
        if field.name() == Some(UPLOAD_FIELD) {
            let filename = field.file_name().unwrap_or_default().to_string();
            let contents = field.bytes().await?;
            return Ok(Some((filename, contents)));
        }
    }
    Ok(None)
}

pub async fn analyze_handler(
    State(state): State<Arc<AppState>>,
    _auth: RequireApiKey,
    Json(request): Json<AnalysisRequest>,
) -> Result<Json<AnalysisResult>, ApiError> {
    info!("Analysis request received for image: {}", request.image_id);

    let exists = state.store.exists(&request.image_id).await.map_err(|err| {
        error!("Analysis failed for {}: {}", request.image_id, err);
        ApiError::Internal {
            operation: "analyze image",
        }
    })?;

    if !exists {
        warn!("Image not found: {}", request.image_id);
        return Err(ApiError::NotFound {
            image_id: request.image_id,
        });
    }

    let result = state.analyzer.lock().await.analyze(&request.image_id);
    info!("Analysis completed for {}", request.image_id);

    Ok(Json(result))
}

pub async fn root() -> Json<serde_json::Value> {
    info!("Health check request received");
    Json(json!({
        "message": "Image Analysis API is running",
        "version": env!("CARGO_PKG_VERSION"),
        "endpoints": {
            "upload": "POST /api/upload",
            "analyze": "POST /api/analyze",
            "health": "GET /"
        }
    }))
}

pub async fn health_check() -> Json<serde_json::Value> {
    info!("Health check endpoint called");
    Json(json!({ "status": "healthy" }))
}
