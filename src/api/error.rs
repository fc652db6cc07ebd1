use axum::Json;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use thiserror::Error;

use super::models::ErrorResponse;

#[derive(Debug, Error)]
pub enum ApiError {
    #[error("不支持的文件类型，{kind} 只接受 {expected}")]
    UnsupportedFileType { kind: String, expected: String },

    #[error("无效的转换类型: {0}")]
    InvalidConversionKind(String),

    #[error("缺少必要的表单字段: {0}")]
    MissingField(&'static str),

    #[error("无效的multipart请求: {0}")]
    InvalidMultipart(String),

    #[error("文件大小超过限制（最大{0}MB）")]
    FileTooLarge(u64),

    #[error("任务不存在: {0}")]
    TaskNotFound(String),

    #[error("任务尚未完成")]
    TaskNotFinished,

    #[error("输出文件不存在")]
    OutputMissing,

    #[error("转换队列已满，请稍后重试")]
    QueueFull,

    #[error("IO错误: {0}")]
    Io(#[from] std::io::Error),
}

impl ApiError {
    fn status_code(&self) -> StatusCode {
        match self {
            ApiError::UnsupportedFileType { .. }
            | ApiError::InvalidConversionKind(_)
            | ApiError::MissingField(_)
            | ApiError::InvalidMultipart(_)
            | ApiError::TaskNotFinished => StatusCode::BAD_REQUEST,
            ApiError::FileTooLarge(_) => StatusCode::PAYLOAD_TOO_LARGE,
            ApiError::TaskNotFound(_) | ApiError::OutputMissing => StatusCode::NOT_FOUND,
            ApiError::QueueFull => StatusCode::SERVICE_UNAVAILABLE,
            ApiError::Io(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status_code();
        let body = Json(ErrorResponse {
            error: self.to_string(),
        });
        (status, body).into_response()
    }
}
