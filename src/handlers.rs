use crate::{
    error::{ApiError, ApiResult},
    ingest,
    models::{UploadResponse, Video, VideoDraft},
};
use axum::{
    body::Body,
    extract::{Path, Request, State},
    http::{header::CONTENT_TYPE, StatusCode},
    response::Json,
};
use serde_json::{json, Value};
use std::{path::PathBuf, sync::Arc};
use tracing::{debug, info, warn};

use crate::models::AppState;

/// List every video, newest first
pub async fn list_videos_handler(State(state): State<Arc<AppState>>) -> Json<Vec<Video>> {
    let videos = state.store.list_all();
    debug!("[GET /api/v1/videos] {} videos", videos.len());
    Json(videos)
}

/// Fetch one video and count the view in the background
pub async fn get_video_handler(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
) -> ApiResult<Json<Video>> {
    let video = state
        .store
        .get(&id)
        .ok_or_else(|| ApiError::not_found("Video not found"))?;

    state.views.record(&id);

    Ok(Json(video))
}

/// Upload video file
pub async fn upload_handler(
    State(state): State<Arc<AppState>>,
    request: Request<Body>,
) -> ApiResult<(StatusCode, Json<UploadResponse>)> {
    // Get content type
    let content_type = request
        .headers()
        .get(CONTENT_TYPE)
        .and_then(|v| v.to_str().ok())
        .ok_or_else(|| ApiError::bad_request("Missing Content-Type header"))?;

    // Parse boundary from content type
    let boundary = multer::parse_boundary(content_type).map_err(|e| {
        warn!("Failed to parse boundary: {}", e);
        ApiError::bad_request(format!("Error parsing form: {}", e))
    })?;

    info!("[POST /api/v1/videos] ⏱️  START");

    let body = request.into_body().into_data_stream();
    let video = ingest::ingest(&state.store, &state.config, body, boundary)
        .await
        .map_err(|e| {
            warn!("[POST /api/v1/videos] ❌ {}", e);
            ApiError::from(e)
        })?;

    info!(
        "[POST /api/v1/videos] ✅ SUCCESS - Video ID: {} ({} videos stored)",
        video.id,
        state.store.len()
    );

    Ok((
        StatusCode::CREATED,
        Json(UploadResponse {
            id: video.id,
            message: "Video uploaded successfully".to_string(),
        }),
    ))
}

/// Register a canned record for smoke-testing a deployment
pub async fn demo_video_handler(State(state): State<Arc<AppState>>) -> ApiResult<Json<Value>> {
    let draft = VideoDraft {
        title: "Test video".to_string(),
        description: "This is a test video".to_string(),
        author: "Test author".to_string(),
        file_path: PathBuf::from("uploads/videos/test.mp4"),
        thumbnail: crate::models::DEFAULT_THUMBNAIL.to_string(),
        duration: "5:30".to_string(),
    };

    let video = state.store.create(draft)?;
    info!("[GET /api/v1/test] Created test video {}", video.id);

    Ok(Json(json!({
        "message": "Test video created",
        "id": video.id,
    })))
}
