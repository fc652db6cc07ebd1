use clap::Parser;
use std::path::PathBuf;

/// 文档转Word服务
#[derive(Parser, Debug)]
#[command(name = "doc2word")]
#[command(version = "0.1")]
#[command(author = "rpeng252@gmail.com")]
#[command(about = "一个简单的文档转Word服务 (PDF/Markdown -> docx)", long_about = None)]
pub struct Cli {
    /// 监听地址
    #[arg(long, value_name = "HOST")]
    #[arg(default_value = "0.0.0.0")]
    pub host: String,

    /// 监听端口
    #[arg(long, value_name = "PORT")]
    #[arg(default_value_t = 8000)]
    pub port: u16,

    /// 临时文件根目录
    #[arg(long, value_name = "DIR")]
    #[arg(default_value = "temp")]
    #[arg(value_hint = clap::ValueHint::DirPath)]
    pub temp_dir: PathBuf,

    /// 上传文件大小上限 (MB)
    #[arg(long, value_name = "MB")]
    #[arg(default_value_t = 100)]
    pub max_file_size_mb: u64,

    /// 下载后延迟清理的秒数
    #[arg(long, value_name = "SECS")]
    #[arg(default_value_t = 5)]
    pub cleanup_delay_secs: u64,

    /// 定期清理的扫描间隔（秒）
    #[arg(long, value_name = "SECS")]
    #[arg(default_value_t = 3600)]
    pub sweep_interval_secs: u64,

    /// 会话目录最长保留时间（小时）
    #[arg(long, value_name = "HOURS")]
    #[arg(default_value_t = 24)]
    pub retention_hours: u64,

    #[arg(long, value_name = "转换工作协程数", default_value_t = 4)]
    pub workers: usize,
    #[arg(long, value_name = "转换队列容量", default_value_t = 64)]
    pub queue_size: usize,
}
