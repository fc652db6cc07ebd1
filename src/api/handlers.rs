use axum::Json;
use axum::body::Body;
use axum::extract::{Multipart, Path, State};
use axum::http::header;
use axum::response::Response;
use serde_json::{Value, json};
use tokio_util::io::ReaderStream;
use tracing::{info, warn};
use uuid::Uuid;

use crate::common::file_utils;
use crate::converter::style::{StyleConfig, parse_style_config};
use crate::task::models::{ConversionJob, ConversionKind, TaskRecord, TaskStatus};

use super::error::ApiError;
use super::models::UploadResponse;
use super::state::AppState;

// Word文档的固定媒体类型
const WORD_MEDIA_TYPE: &str =
    "application/vnd.openxmlformats-officedocument.wordprocessingml.document";

// 服务存活探测
pub async fn root() -> Json<Value> {
    Json(json!({ "message": "文档转Word API服务正在运行" }))
}

// 默认样式配置，仅供前端展示，不强制参与转换流程
pub async fn style_config() -> Json<StyleConfig> {
    Json(StyleConfig::default())
}

// 上传文件并创建转换任务，转换在后台进行，立即返回task_id
pub async fn upload(
    State(state): State<AppState>,
    mut multipart: Multipart,
) -> Result<Json<UploadResponse>, ApiError> {
    let mut filename: Option<String> = None;
    let mut file_bytes: Option<Vec<u8>> = None;
    let mut conversion_type: Option<String> = None;
    let mut style_raw: Option<String> = None;

    while let Some(mut field) = multipart
        .next_field()
        .await
        .map_err(|e| ApiError::InvalidMultipart(e.to_string()))?
    {
        let name = field.name().unwrap_or_default().to_string();
        match name.as_str() {
            "file" => {
                filename = field.file_name().map(|n| n.to_string());
                // 边读边计数，超限立刻拒绝，此时还没有任何落盘内容
                let mut buf: Vec<u8> = Vec::new();
                while let Some(chunk) = field
                    .chunk()
                    .await
                    .map_err(|e| ApiError::InvalidMultipart(e.to_string()))?
                {
                    if (buf.len() + chunk.len()) as u64 > state.config.max_file_size {
                        return Err(ApiError::FileTooLarge(state.config.max_file_size_mb()));
                    }
                    buf.extend_from_slice(&chunk);
                }
                file_bytes = Some(buf);
            }
            "conversion_type" => {
                conversion_type = Some(
                    field
                        .text()
                        .await
                        .map_err(|e| ApiError::InvalidMultipart(e.to_string()))?,
                );
            }
            "style_config" => {
                style_raw = Some(
                    field
                        .text()
                        .await
                        .map_err(|e| ApiError::InvalidMultipart(e.to_string()))?,
                );
            }
            _ => {}
        }
    }

    let file_bytes = file_bytes.ok_or(ApiError::MissingField("file"))?;
    let filename = filename.ok_or(ApiError::MissingField("file"))?;
    let conversion_type = conversion_type.ok_or(ApiError::MissingField("conversion_type"))?;
    let kind = ConversionKind::parse(&conversion_type)
        .ok_or_else(|| ApiError::InvalidConversionKind(conversion_type.clone()))?;

    // 扩展名必须和转换类型匹配，不匹配直接拒绝，不创建任何任务和目录
    if !kind.accepts_filename(&filename) {
        return Err(ApiError::UnsupportedFileType {
            kind: kind.to_string(),
            expected: kind.allowed_extensions().join("/"),
        });
    }

    let style = parse_style_config(style_raw.as_deref());

    // 会话ID和任务ID各自独立生成
    let session_id = Uuid::new_v4().to_string();
    let task_id = Uuid::new_v4().to_string();

    let session_dir = state.session_dir(&session_id);
    tokio::fs::create_dir_all(&session_dir).await?;

    let input_path = session_dir.join(file_utils::input_filename(&filename));
    tokio::fs::write(&input_path, &file_bytes).await?;

    let output_filename = file_utils::generate_output_filename(&filename);
    let output_path = session_dir.join(&output_filename);

    let record = TaskRecord::new(
        task_id.clone(),
        session_id.clone(),
        filename.clone(),
        kind,
    );
    state.store.insert(record);

    let job = ConversionJob {
        task_id: task_id.clone(),
        kind,
        input_path,
        output_path,
        session_dir: session_dir.clone(),
        style,
    };

    // 队列满说明积压的转换已达上限，回滚本次会话再报错
    if state.job_tx.try_send(job).is_err() {
        warn!("转换队列已满，拒绝任务: {}", task_id);
        state.store.remove(&task_id);
        crate::cleanup::remove_session_dir(&session_dir).await;
        return Err(ApiError::QueueFull);
    }

    info!("文件已上传，创建任务: {}, 类型: {}", task_id, kind);

    Ok(Json(UploadResponse {
        task_id,
        status: TaskStatus::Pending,
        message: "文件已上传，开始转换".to_string(),
    }))
}

// 查询转换任务状态，记录原样返回
pub async fn status(
    State(state): State<AppState>,
    Path(task_id): Path<String>,
) -> Result<Json<TaskRecord>, ApiError> {
    match state.store.get(&task_id).await {
        Some(record) => Ok(Json(record)),
        None => {
            warn!("任务不存在: {}", task_id);
            Err(ApiError::TaskNotFound(task_id))
        }
    }
}

// 下载转换产物，成功后调度延迟清理
pub async fn download(
    State(state): State<AppState>,
    Path(task_id): Path<String>,
) -> Result<Response, ApiError> {
    let record = state
        .store
        .get(&task_id)
        .await
        .ok_or_else(|| {
            warn!("任务不存在: {}", task_id);
            ApiError::TaskNotFound(task_id.clone())
        })?;

    if record.status != TaskStatus::Completed {
        return Err(ApiError::TaskNotFinished);
    }
    let output_filename = record.output_filename.ok_or(ApiError::OutputMissing)?;

    let session_dir = state.session_dir(&record.session_id);
    let output_path = session_dir.join(&output_filename);
    // 防御检查，正常情况下完成的任务产物一定在盘上
    if !output_path.exists() {
        warn!("输出文件不存在: {}", output_path.display());
        return Err(ApiError::OutputMissing);
    }

    state.store.mark_downloaded(&task_id).await;

    // 清理延迟执行，给传输留出时间，绝不阻塞本次响应
    state.cleanup.schedule(
        session_dir,
        Some(task_id.clone()),
        state.config.cleanup_delay,
    );

    let file = tokio::fs::File::open(&output_path).await?;
    let body = Body::from_stream(ReaderStream::new(file));

    // 文件名可能含非ASCII字符，放进filename*扩展参数，普通参数给个安全值
    let ascii_name = if output_filename.is_ascii() {
        output_filename.replace('"', "_")
    } else {
        "download.docx".to_string()
    };
    let disposition = format!(
        "attachment; filename=\"{}\"; filename*=UTF-8''{}",
        ascii_name,
        urlencoding::encode(&output_filename)
    );

    let response = Response::builder()
        .header(header::CONTENT_TYPE, WORD_MEDIA_TYPE)
        .header(header::CONTENT_DISPOSITION, disposition)
        .body(body)
        .map_err(|e| ApiError::Io(std::io::Error::other(e.to_string())))?;
    Ok(response)
}
