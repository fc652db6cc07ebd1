use std::path::PathBuf;

use thiserror::Error;

#[derive(Debug, Error)]
pub enum ConvertError {
    #[error("输入文件不存在: {0}")]
    InputMissing(PathBuf),

    #[error("输入文件为空: {0}")]
    InputEmpty(PathBuf),

    #[error("未找到外部转换工具: {0}，请先安装")]
    ToolNotFound(String),

    #[error("{tool} 执行失败: {detail}")]
    ToolFailed { tool: String, detail: String },

    #[error("PDF文本提取失败: {0}")]
    ExtractFailed(String),

    #[error("文件转换失败，未生成有效的Word文档")]
    OutputInvalid,

    #[error("IO错误: {0}")]
    Io(#[from] std::io::Error),
}
