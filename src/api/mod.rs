use axum::Router;
use axum::extract::DefaultBodyLimit;
use axum::routing::{get, post};
use tower_http::cors::CorsLayer;

pub mod error;
pub mod handlers;
pub mod models;
pub mod state;

use state::AppState;

// 组装路由，测试和main共用
pub fn app(state: AppState) -> Router {
    // multipart本身有封装开销，请求体上限在文件上限基础上留一点余量
    let body_limit = state.config.max_file_size as usize + 64 * 1024;

    Router::new()
        .route("/", get(handlers::root))
        .route("/upload", post(handlers::upload))
        .route("/status/{task_id}", get(handlers::status))
        .route("/download/{task_id}", get(handlers::download))
        .route("/style-config", get(handlers::style_config))
        .layer(DefaultBodyLimit::max(body_limit))
        // 生产环境应该收紧为前端域名
        .layer(CorsLayer::permissive())
        .with_state(state)
}
