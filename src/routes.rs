use axum::{
    extract::DefaultBodyLimit,
    routing::get,
    Router,
};
use std::sync::Arc;
use tower_http::{
    cors::CorsLayer,
    services::{ServeDir, ServeFile},
    trace::TraceLayer,
};

use crate::handlers::{demo_video_handler, get_video_handler, list_videos_handler, upload_handler};
use crate::models::AppState;

pub fn build_router(state: Arc<AppState>) -> Router {
    let config = &state.config;

    let api = Router::new()
        .route("/videos", get(list_videos_handler).post(upload_handler))
        .route("/videos/:id", get(get_video_handler))
        .route("/test", get(demo_video_handler))
        // Uploads are size-checked while streaming
        .layer(DefaultBodyLimit::disable());

    Router::new()
        .nest("/api/v1", api)
        .nest_service("/static", ServeDir::new(&config.static_dir))
        .nest_service("/uploads", ServeDir::new(&config.upload_dir))
        .route_service("/", ServeFile::new(&config.index_file))
        .layer(CorsLayer::permissive())
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}
