use std::collections::HashMap;

use serde::{Deserialize, Serialize};
use tracing::warn;

// 样式配置，随上传以JSON字符串传入
// 解析失败只记日志不报错，缺省字段取默认值
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StyleConfig {
    #[serde(default = "default_font_mappings")]
    pub font_mappings: HashMap<String, String>,
    #[serde(default = "default_true")]
    pub preserve_images: bool,
    #[serde(default = "default_true")]
    pub preserve_tables: bool,
    #[serde(default = "default_true")]
    pub preserve_hyperlinks: bool,
    #[serde(default = "default_true")]
    pub code_highlight: bool,
    #[serde(default = "default_true")]
    pub math_support: bool,
}

impl Default for StyleConfig {
    fn default() -> Self {
        Self {
            font_mappings: default_font_mappings(),
            preserve_images: true,
            preserve_tables: true,
            preserve_hyperlinks: true,
            code_highlight: true,
            math_support: true,
        }
    }
}

fn default_true() -> bool {
    true
}

fn default_font_mappings() -> HashMap<String, String> {
    HashMap::from([
        ("default".to_string(), "微软雅黑".to_string()),
        ("serif".to_string(), "宋体".to_string()),
        ("sans-serif".to_string(), "微软雅黑".to_string()),
        ("monospace".to_string(), "Consolas".to_string()),
    ])
}

// 尽力解析样式配置，解析失败视为未提供
pub fn parse_style_config(raw: Option<&str>) -> Option<StyleConfig> {
    let raw = raw?;
    if raw.trim().is_empty() {
        return None;
    }
    match serde_json::from_str::<StyleConfig>(raw) {
        Ok(config) => Some(config),
        Err(e) => {
            warn!("样式配置解析失败，使用默认样式: {}", e);
            None
        }
    }
}
