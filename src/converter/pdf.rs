use std::path::{Path, PathBuf};

use async_trait::async_trait;
use tokio::process::Command;
use tracing::{info, warn};

use super::error::ConvertError;
use super::style::StyleConfig;
use super::{DocumentConverter, pandoc};

// PDF转Word适配器
// 文本提取优先走pdftotext（保留版面），失败时退回进程内的pdf-extract，
// 提取结果再交给pandoc生成docx
pub struct PdfConverter;

#[async_trait]
impl DocumentConverter for PdfConverter {
    async fn convert(
        &self,
        input: &Path,
        output: &Path,
        session_dir: &Path,
        style: Option<&StyleConfig>,
    ) -> Result<(), ConvertError> {
        info!("开始转换: {} -> {}", input.display(), output.display());

        let meta = tokio::fs::metadata(input)
            .await
            .map_err(|_| ConvertError::InputMissing(input.to_path_buf()))?;
        info!("PDF文件大小: {} 字节", meta.len());
        if meta.len() == 0 {
            return Err(ConvertError::InputEmpty(input.to_path_buf()));
        }

        let text = extract_text(input).await?;

        // 提取出的文本落盘到会话临时目录，再走统一的pandoc管线
        let temp_dir = session_dir.join("temp");
        tokio::fs::create_dir_all(&temp_dir).await?;
        let extracted = temp_dir.join("extracted.md");
        tokio::fs::write(&extracted, text).await?;

        let media_dir = temp_dir.join("images");
        tokio::fs::create_dir_all(&media_dir).await?;

        pandoc::markdown_to_docx(&extracted, output, &media_dir, style).await
    }
}

async fn extract_text(input: &Path) -> Result<String, ConvertError> {
    match extract_with_pdftotext(input).await {
        Ok(text) => Ok(text),
        Err(primary_err) => {
            warn!("pdftotext提取失败，退回pdf-extract: {}", primary_err);
            extract_with_pdf_extract(input.to_path_buf())
                .await
                .map_err(|fallback_err| {
                    ConvertError::ExtractFailed(format!(
                        "pdftotext: {}; pdf-extract: {}",
                        primary_err, fallback_err
                    ))
                })
        }
    }
}

// 主路径: poppler的pdftotext，-layout尽量保留排版
async fn extract_with_pdftotext(input: &Path) -> Result<String, ConvertError> {
    let result = Command::new("pdftotext")
        .arg("-layout")
        .arg("-enc")
        .arg("UTF-8")
        .arg(input)
        .arg("-")
        .output()
        .await
        .map_err(|e| {
            if e.kind() == std::io::ErrorKind::NotFound {
                ConvertError::ToolNotFound("pdftotext".to_string())
            } else {
                ConvertError::Io(e)
            }
        })?;

    if !result.status.success() {
        return Err(ConvertError::ToolFailed {
            tool: "pdftotext".to_string(),
            detail: format!("退出状态 {}", result.status),
        });
    }

    String::from_utf8(result.stdout).map_err(|_| ConvertError::ToolFailed {
        tool: "pdftotext".to_string(),
        detail: "输出不是有效的UTF-8".to_string(),
    })
}

// 兜底路径: 进程内pdf-extract，解析是同步的放到阻塞线程执行
async fn extract_with_pdf_extract(input: PathBuf) -> Result<String, String> {
    tokio::task::spawn_blocking(move || {
        // pdf-extract解析时会往stdout/stderr打印大量噪音，屏蔽掉
        let _gag_out = gag::Gag::stdout().ok();
        let _gag_err = gag::Gag::stderr().ok();
        pdf_extract::extract_text(&input).map_err(|e| e.to_string())
    })
    .await
    .map_err(|e| e.to_string())?
}
