use std::path::Path;

use tokio::process::Command;
use tracing::{debug, info};

use super::error::ConvertError;
use super::style::StyleConfig;

// 调用pandoc把Markdown转成docx
// 工作目录设为输入文件所在目录，保证相对图片路径能被解析
pub async fn markdown_to_docx(
    input: &Path,
    output: &Path,
    media_dir: &Path,
    style: Option<&StyleConfig>,
) -> Result<(), ConvertError> {
    let mut cmd = Command::new("pandoc");
    cmd.arg(input)
        .arg("-f")
        .arg("markdown")
        .arg("-t")
        .arg("docx")
        .arg("-o")
        .arg(output)
        .arg("--standalone")
        .arg("--toc")
        .arg("--toc-depth")
        .arg("3")
        .arg("--wrap")
        .arg("auto")
        .arg("--extract-media")
        .arg(media_dir);

    // 样式配置只影响非关键开关，不提供时全部按默认开启
    let code_highlight = style.map(|s| s.code_highlight).unwrap_or(true);
    if code_highlight {
        cmd.arg("--highlight-style").arg("tango");
    } else {
        cmd.arg("--no-highlight");
    }
    let math_support = style.map(|s| s.math_support).unwrap_or(true);
    if math_support {
        cmd.arg("--mathml");
    }

    if let Some(dir) = input.parent() {
        cmd.current_dir(dir);
    }

    debug!("执行命令: {:?}", cmd.as_std());

    let result = cmd.output().await.map_err(|e| {
        if e.kind() == std::io::ErrorKind::NotFound {
            ConvertError::ToolNotFound("pandoc".to_string())
        } else {
            ConvertError::Io(e)
        }
    })?;

    if !result.status.success() {
        let stderr = String::from_utf8_lossy(&result.stderr).trim().to_string();
        return Err(ConvertError::ToolFailed {
            tool: "pandoc".to_string(),
            detail: stderr,
        });
    }

    info!("pandoc转换成功: {}", output.display());
    Ok(())
}
