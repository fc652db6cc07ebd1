use std::path::Path;
use std::time::Duration;

use axum::Router;
use axum::body::Body;
use axum::http::{Request, StatusCode, header};
use serde_json::Value;
use tower::ServiceExt;

use doc2word::api::{self, state::AppState};
use doc2word::config::Config;

fn test_config(temp_dir: &Path) -> Config {
    Config {
        temp_dir: temp_dir.to_path_buf(),
        max_file_size: 1024 * 1024,
        cleanup_delay: Duration::from_millis(200),
        workers: 2,
        queue_size: 8,
        progress_step: Duration::from_millis(1),
        ..Config::default()
    }
}

fn test_app(temp_dir: &Path) -> Router {
    api::app(AppState::new(test_config(temp_dir)))
}

// 手工构造multipart请求体
fn upload_request(
    filename: &str,
    file_content: &[u8],
    conversion_type: &str,
    style_config: Option<&str>,
) -> Request<Body> {
    let boundary = "x-doc2word-test-boundary";
    let mut body: Vec<u8> = Vec::new();
    body.extend_from_slice(
        format!(
            "--{boundary}\r\nContent-Disposition: form-data; name=\"file\"; filename=\"{filename}\"\r\nContent-Type: application/octet-stream\r\n\r\n"
        )
        .as_bytes(),
    );
    body.extend_from_slice(file_content);
    body.extend_from_slice(
        format!(
            "\r\n--{boundary}\r\nContent-Disposition: form-data; name=\"conversion_type\"\r\n\r\n{conversion_type}"
        )
        .as_bytes(),
    );
    if let Some(style) = style_config {
        body.extend_from_slice(
            format!(
                "\r\n--{boundary}\r\nContent-Disposition: form-data; name=\"style_config\"\r\n\r\n{style}"
            )
            .as_bytes(),
        );
    }
    body.extend_from_slice(format!("\r\n--{boundary}--\r\n").as_bytes());

    Request::builder()
        .method("POST")
        .uri("/upload")
        .header(
            header::CONTENT_TYPE,
            format!("multipart/form-data; boundary={boundary}"),
        )
        .body(Body::from(body))
        .unwrap()
}

async fn json_body(response: axum::response::Response) -> Value {
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    serde_json::from_slice(&bytes).unwrap()
}

async fn get(app: &Router, uri: &str) -> axum::response::Response {
    app.clone()
        .oneshot(Request::builder().uri(uri).body(Body::empty()).unwrap())
        .await
        .unwrap()
}

// 轮询任务直到进入终态，返回最后一次的状态JSON
async fn poll_until_terminal(app: &Router, task_id: &str, timeout: Duration) -> Value {
    let deadline = tokio::time::Instant::now() + timeout;
    loop {
        let response = get(app, &format!("/status/{task_id}")).await;
        assert_eq!(response.status(), StatusCode::OK);
        let body = json_body(response).await;
        let status = body["status"].as_str().unwrap().to_string();
        if status == "completed" || status == "failed" {
            return body;
        }
        assert!(
            tokio::time::Instant::now() < deadline,
            "任务 {} 超时仍未进入终态",
            task_id
        );
        tokio::time::sleep(Duration::from_millis(50)).await;
    }
}

fn session_dir_count(temp_dir: &Path) -> usize {
    std::fs::read_dir(temp_dir)
        .map(|rd| rd.filter_map(|e| e.ok()).filter(|e| e.path().is_dir()).count())
        .unwrap_or(0)
}

#[tokio::test]
async fn test_root_alive() {
    let tmp = tempfile::tempdir().unwrap();
    let app = test_app(tmp.path());

    let response = get(&app, "/").await;
    assert_eq!(response.status(), StatusCode::OK);
    let body = json_body(response).await;
    assert!(body["message"].as_str().unwrap().contains("运行"));
}

#[tokio::test]
async fn test_style_config_defaults() {
    let tmp = tempfile::tempdir().unwrap();
    let app = test_app(tmp.path());

    let response = get(&app, "/style-config").await;
    assert_eq!(response.status(), StatusCode::OK);
    let body = json_body(response).await;
    assert_eq!(body["font_mappings"]["default"], "微软雅黑");
    assert_eq!(body["preserve_images"], true);
    assert_eq!(body["code_highlight"], true);
}

#[tokio::test]
async fn test_upload_wrong_extension_rejected() {
    let tmp = tempfile::tempdir().unwrap();
    let app = test_app(tmp.path());

    // 扩展名和转换类型不匹配，必须立即400，不创建任何会话目录
    let response = app
        .clone()
        .oneshot(upload_request("notes.md", b"# hello", "pdf-to-word", None))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    let body = json_body(response).await;
    assert!(!body["error"].as_str().unwrap().is_empty());
    assert_eq!(session_dir_count(tmp.path()), 0);
}

#[tokio::test]
async fn test_upload_unknown_conversion_kind_rejected() {
    let tmp = tempfile::tempdir().unwrap();
    let app = test_app(tmp.path());

    let response = app
        .clone()
        .oneshot(upload_request("notes.md", b"# hello", "md-to-pdf", None))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    assert_eq!(session_dir_count(tmp.path()), 0);
}

#[tokio::test]
async fn test_upload_missing_conversion_type_rejected() {
    let tmp = tempfile::tempdir().unwrap();
    let app = test_app(tmp.path());

    let boundary = "x-doc2word-test-boundary";
    let body = format!(
        "--{boundary}\r\nContent-Disposition: form-data; name=\"file\"; filename=\"a.md\"\r\n\r\n# hi\r\n--{boundary}--\r\n"
    );
    let request = Request::builder()
        .method("POST")
        .uri("/upload")
        .header(
            header::CONTENT_TYPE,
            format!("multipart/form-data; boundary={boundary}"),
        )
        .body(Body::from(body))
        .unwrap();

    let response = app.clone().oneshot(request).await.unwrap();
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_upload_oversized_rejected() {
    let tmp = tempfile::tempdir().unwrap();
    let app = test_app(tmp.path());

    // 上限1MB，传2MB必须在创建任务之前被拒绝
    let big = vec![b'x'; 2 * 1024 * 1024];
    let response = app
        .clone()
        .oneshot(upload_request("big.md", &big, "markdown-to-word", None))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::PAYLOAD_TOO_LARGE);
    assert_eq!(session_dir_count(tmp.path()), 0);
}

#[tokio::test]
async fn test_status_unknown_task_404() {
    let tmp = tempfile::tempdir().unwrap();
    let app = test_app(tmp.path());

    let response = get(&app, "/status/no-such-task").await;
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
    let body = json_body(response).await;
    assert!(body["error"].as_str().unwrap().contains("no-such-task"));
}

#[tokio::test]
async fn test_download_unknown_task_404() {
    let tmp = tempfile::tempdir().unwrap();
    let app = test_app(tmp.path());

    let response = get(&app, "/download/no-such-task").await;
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_download_before_completion_400() {
    let tmp = tempfile::tempdir().unwrap();
    // 放慢模拟进度，保证下载请求落在processing窗口内
    let mut config = test_config(tmp.path());
    config.progress_step = Duration::from_millis(200);
    let app = api::app(AppState::new(config));

    let response = app
        .clone()
        .oneshot(upload_request("notes.md", b"# hello\n", "markdown-to-word", None))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let body = json_body(response).await;
    let task_id = body["task_id"].as_str().unwrap().to_string();

    let response = get(&app, &format!("/download/{task_id}")).await;
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_progress_monotone_until_terminal() {
    let tmp = tempfile::tempdir().unwrap();
    let mut config = test_config(tmp.path());
    config.progress_step = Duration::from_millis(20);
    let app = api::app(AppState::new(config));

    let response = app
        .clone()
        .oneshot(upload_request("notes.md", b"# hello\n", "markdown-to-word", None))
        .await
        .unwrap();
    let body = json_body(response).await;
    let task_id = body["task_id"].as_str().unwrap().to_string();

    let mut last_progress = 0u64;
    let deadline = tokio::time::Instant::now() + Duration::from_secs(30);
    loop {
        let response = get(&app, &format!("/status/{task_id}")).await;
        let body = json_body(response).await;
        let progress = body["progress"].as_u64().unwrap();
        assert!(
            progress >= last_progress,
            "进度出现回退: {} -> {}",
            last_progress,
            progress
        );
        last_progress = progress;
        let status = body["status"].as_str().unwrap();
        if status == "completed" || status == "failed" {
            break;
        }
        assert!(tokio::time::Instant::now() < deadline);
        tokio::time::sleep(Duration::from_millis(10)).await;
    }
}

#[tokio::test]
async fn test_empty_markdown_fails_with_error() {
    let tmp = tempfile::tempdir().unwrap();
    let app = test_app(tmp.path());

    // 空白内容不依赖外部工具即可确定性失败
    let response = app
        .clone()
        .oneshot(upload_request("blank.md", b"   \n", "markdown-to-word", None))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let body = json_body(response).await;
    let task_id = body["task_id"].as_str().unwrap().to_string();

    let record = poll_until_terminal(&app, &task_id, Duration::from_secs(10)).await;
    assert_eq!(record["status"], "failed");
    assert!(!record["error"].as_str().unwrap().is_empty());
    assert_eq!(record["output_filename"], Value::Null);

    // 失败的任务不允许下载
    let response = get(&app, &format!("/download/{task_id}")).await;
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_markdown_round_trip() {
    let tmp = tempfile::tempdir().unwrap();
    let app = test_app(tmp.path());

    // 无效的style_config只应被忽略，不影响上传
    let response = app
        .clone()
        .oneshot(upload_request(
            "notes.md",
            b"# Title\n\nhello world\n",
            "markdown-to-word",
            Some("{not valid json"),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let body = json_body(response).await;
    let task_id = body["task_id"].as_str().unwrap().to_string();
    assert_eq!(body["status"], "pending");

    let record = poll_until_terminal(&app, &task_id, Duration::from_secs(60)).await;

    match record["status"].as_str().unwrap() {
        "completed" => {
            let output_filename = record["output_filename"].as_str().unwrap();
            let pattern = regex::Regex::new(r"^notes_[A-Za-z0-9]{5}\.docx$").unwrap();
            assert!(
                pattern.is_match(output_filename),
                "输出文件名不符合预期: {}",
                output_filename
            );
            assert_eq!(record["progress"], 100);

            let response = get(&app, &format!("/download/{task_id}")).await;
            assert_eq!(response.status(), StatusCode::OK);
            assert_eq!(
                response.headers().get(header::CONTENT_TYPE).unwrap(),
                "application/vnd.openxmlformats-officedocument.wordprocessingml.document"
            );
            let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
                .await
                .unwrap();
            assert!(!bytes.is_empty());

            // 下载后会话目录应在延迟清理触发后消失，任务记录一并移除
            tokio::time::sleep(Duration::from_secs(1)).await;
            assert_eq!(session_dir_count(tmp.path()), 0);
            let response = get(&app, &format!("/status/{task_id}")).await;
            assert_eq!(response.status(), StatusCode::NOT_FOUND);
            println!("✅ Markdown转Word全流程成功");
        }
        "failed" => {
            // CI环境可能没有pandoc，这里不做硬断言
            println!(
                "⚠️ 转换失败（可能缺少pandoc）: {:?}",
                record["error"].as_str()
            );
            assert!(!record["error"].as_str().unwrap().is_empty());
            let response = get(&app, &format!("/download/{task_id}")).await;
            assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        }
        other => panic!("意外的终态: {}", other),
    }
}
