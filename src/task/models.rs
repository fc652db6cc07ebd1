use std::path::PathBuf;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::converter::style::StyleConfig;

// --------------------------------------------------------------------
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum TaskStatus {
    Pending,
    Processing,
    Completed,
    Failed,
}

impl TaskStatus {
    // 终态之后不允许再变化
    pub fn is_terminal(&self) -> bool {
        matches!(self, TaskStatus::Completed | TaskStatus::Failed)
    }
}

// 支持的转换类型，封闭集合
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub enum ConversionKind {
    #[serde(rename = "pdf-to-word")]
    PdfToWord,
    #[serde(rename = "markdown-to-word")]
    MarkdownToWord,
}

impl ConversionKind {
    pub fn parse(value: &str) -> Option<Self> {
        match value {
            "pdf-to-word" => Some(ConversionKind::PdfToWord),
            "markdown-to-word" => Some(ConversionKind::MarkdownToWord),
            _ => None,
        }
    }

    // 每种转换类型接受的输入扩展名
    pub fn allowed_extensions(&self) -> &'static [&'static str] {
        match self {
            ConversionKind::PdfToWord => &["pdf"],
            ConversionKind::MarkdownToWord => &["md", "markdown"],
        }
    }

    pub fn accepts_filename(&self, filename: &str) -> bool {
        let ext = std::path::Path::new(filename)
            .extension()
            .and_then(|e| e.to_str())
            .map(|e| e.to_lowercase());
        match ext {
            Some(ext) => self.allowed_extensions().contains(&ext.as_str()),
            None => false,
        }
    }
}

impl std::fmt::Display for ConversionKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ConversionKind::PdfToWord => write!(f, "pdf-to-word"),
            ConversionKind::MarkdownToWord => write!(f, "markdown-to-word"),
        }
    }
}

// 一次转换任务的完整状态，/status 直接原样返回
#[derive(Debug, Clone, Serialize)]
pub struct TaskRecord {
    pub task_id: String,
    pub session_id: String,
    pub status: TaskStatus,
    pub progress: u8,
    pub input_filename: String,
    pub conversion_type: ConversionKind,
    pub output_filename: Option<String>,
    pub error: Option<String>,
    pub downloaded: bool,
    pub created_at: DateTime<Utc>,
}

impl TaskRecord {
    pub fn new(
        task_id: String,
        session_id: String,
        input_filename: String,
        conversion_type: ConversionKind,
    ) -> Self {
        Self {
            task_id,
            session_id,
            status: TaskStatus::Pending,
            progress: 0,
            input_filename,
            conversion_type,
            output_filename: None,
            error: None,
            downloaded: false,
            created_at: Utc::now(),
        }
    }
}

// 投递给工作协程的转换作业
#[derive(Debug, Clone)]
pub struct ConversionJob {
    pub task_id: String,
    pub kind: ConversionKind,
    pub input_path: PathBuf,
    pub output_path: PathBuf,
    pub session_dir: PathBuf,
    pub style: Option<StyleConfig>,
}
