use std::path::Path;

use rand::Rng;

// 生成唯一的输出文件名: 原始文件名主干 + 5位随机后缀 + .docx
pub fn generate_output_filename(original_name: &str) -> String {
    let base_name = Path::new(original_name)
        .file_stem()
        .and_then(|s| s.to_str())
        .unwrap_or("output");

    let random_suffix: String = rand::rng()
        .sample_iter(rand::distr::Alphanumeric)
        .take(5)
        .map(char::from)
        .collect();

    format!("{}_{}.docx", base_name, random_suffix)
}

// 输入文件统一保存为 input.<原扩展名小写>
pub fn input_filename(original_name: &str) -> String {
    let ext = Path::new(original_name)
        .extension()
        .and_then(|e| e.to_str())
        .map(|e| e.to_lowercase())
        .unwrap_or_else(|| "bin".to_string());
    format!("input.{}", ext)
}
