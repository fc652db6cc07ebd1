use std::path::Path;

use async_trait::async_trait;

use crate::task::models::ConversionKind;

pub mod error;
pub mod markdown;
pub mod pandoc;
pub mod pdf;
pub mod style;

use error::ConvertError;
use style::StyleConfig;

// 定义一个trait，封装具体的格式转换实现
// 每种转换类型一个实现，按conversion_type选择
#[async_trait]
pub trait DocumentConverter: Send + Sync {
    async fn convert(
        &self,
        input: &Path,
        output: &Path,
        session_dir: &Path,
        style: Option<&StyleConfig>,
    ) -> Result<(), ConvertError>;
}

pub fn converter_for(kind: ConversionKind) -> Box<dyn DocumentConverter> {
    match kind {
        ConversionKind::PdfToWord => Box::new(pdf::PdfConverter),
        ConversionKind::MarkdownToWord => Box::new(markdown::MarkdownConverter),
    }
}
