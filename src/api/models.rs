use serde::{Deserialize, Serialize};

use crate::task::models::TaskStatus;

// 上传成功的响应
#[derive(Debug, Serialize, Deserialize)]
pub struct UploadResponse {
    pub task_id: String,
    pub status: TaskStatus,
    pub message: String,
}

// 统一的错误响应体
#[derive(Debug, Serialize, Deserialize)]
pub struct ErrorResponse {
    pub error: String,
}
