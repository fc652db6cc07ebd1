use std::path::Path;
use std::time::Duration;

use async_trait::async_trait;
use lazy_static::lazy_static;
use regex::Regex;
use tracing::{debug, info, warn};

use super::error::ConvertError;
use super::style::StyleConfig;
use super::{DocumentConverter, pandoc};

lazy_static! {
    // Markdown图片语法 ![alt](url)
    static ref IMAGE_RE: Regex = Regex::new(r"!\[(.*?)\]\((.*?)\)").unwrap();
}

// Markdown转Word适配器
// 先把远程/本地图片物化到会话缓存目录并改写引用，再交给pandoc
pub struct MarkdownConverter;

#[async_trait]
impl DocumentConverter for MarkdownConverter {
    async fn convert(
        &self,
        input: &Path,
        output: &Path,
        session_dir: &Path,
        style: Option<&StyleConfig>,
    ) -> Result<(), ConvertError> {
        info!("开始转换Markdown到Word: {} -> {}", input.display(), output.display());

        let content = tokio::fs::read_to_string(input)
            .await
            .map_err(|_| ConvertError::InputMissing(input.to_path_buf()))?;
        if content.trim().is_empty() {
            return Err(ConvertError::InputEmpty(input.to_path_buf()));
        }
        debug!("Markdown字符数: {}", content.len());

        let temp_dir = session_dir.join("temp");
        let image_cache_dir = temp_dir.join("images");
        tokio::fs::create_dir_all(&image_cache_dir).await?;

        let preserve_images = style.map(|s| s.preserve_images).unwrap_or(true);
        let processed = if preserve_images {
            process_images(&content, session_dir, &image_cache_dir).await
        } else {
            content
        };

        // 处理后的内容写到临时文件，pandoc以临时目录为工作目录
        let processed_md = temp_dir.join("processed.md");
        tokio::fs::write(&processed_md, processed).await?;

        pandoc::markdown_to_docx(&processed_md, output, &image_cache_dir, style).await
    }
}

// 下载远程图片、复制本地图片到缓存目录，并把引用改写为相对缓存的路径
// 单张图片失败只告警并保留原引用，不中断整个转换
async fn process_images(content: &str, session_dir: &Path, cache_dir: &Path) -> String {
    let mut result = content.to_string();

    for (index, caps) in IMAGE_RE.captures_iter(content).enumerate() {
        let whole = caps.get(0).map(|m| m.as_str()).unwrap_or_default();
        let alt_text = caps.get(1).map(|m| m.as_str()).unwrap_or_default();
        let image_url = caps.get(2).map(|m| m.as_str()).unwrap_or_default().trim();
        if image_url.is_empty() {
            continue;
        }

        match materialize_image(image_url, index, session_dir, cache_dir).await {
            Ok(cache_name) => {
                let replacement = format!("![{}](images/{})", alt_text, cache_name);
                result = result.replace(whole, &replacement);
            }
            Err(e) => {
                warn!("处理图片失败: {}, {}", image_url, e);
            }
        }
    }

    result
}

async fn materialize_image(
    image_url: &str,
    index: usize,
    session_dir: &Path,
    cache_dir: &Path,
) -> Result<String, String> {
    // 网络图片下载到缓存
    if let Ok(parsed) = url::Url::parse(image_url) {
        if parsed.scheme() == "http" || parsed.scheme() == "https" {
            let cache_name = parsed
                .path_segments()
                .and_then(|mut s| s.next_back())
                .filter(|name| !name.is_empty())
                .map(|name| name.to_string())
                .unwrap_or_else(|| format!("image_{}.png", index));
            let cache_path = cache_dir.join(&cache_name);
            if cache_path.exists() {
                return Ok(cache_name);
            }

            let client = reqwest::Client::builder()
                .timeout(Duration::from_secs(10))
                .build()
                .map_err(|e| e.to_string())?;
            let response = client
                .get(parsed)
                .send()
                .await
                .and_then(|r| r.error_for_status())
                .map_err(|e| format!("下载图片失败: {}", e))?;
            let bytes = response.bytes().await.map_err(|e| e.to_string())?;
            tokio::fs::write(&cache_path, &bytes)
                .await
                .map_err(|e| e.to_string())?;
            debug!("图片已缓存: {}", cache_path.display());
            return Ok(cache_name);
        }
    }

    // 本地图片，相对路径相对会话目录解析
    let local_path = {
        let p = Path::new(image_url);
        if p.is_absolute() {
            p.to_path_buf()
        } else {
            session_dir.join(p)
        }
    };
    if !local_path.exists() {
        return Err(format!("本地图片不存在: {}", local_path.display()));
    }
    let cache_name = local_path
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_else(|| format!("image_{}.png", index));
    let cache_path = cache_dir.join(&cache_name);
    tokio::fs::copy(&local_path, &cache_path)
        .await
        .map_err(|e| e.to_string())?;
    Ok(cache_name)
}
