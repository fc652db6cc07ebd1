use std::path::PathBuf;
use std::time::Duration;

use crate::cli::Cli;

// 服务运行配置，全部可通过命令行覆盖
// 上传大小上限和清理延迟在不同部署里口径不一致，所以都做成配置项
#[derive(Debug, Clone)]
pub struct Config {
    pub host: String,
    pub port: u16,
    // 临时文件根目录，每个会话一个子目录
    pub temp_dir: PathBuf,
    // 上传文件大小上限（字节）
    pub max_file_size: u64,
    // 下载成功后延迟多久删除会话目录
    pub cleanup_delay: Duration,
    // 定期清理的扫描间隔
    pub sweep_interval: Duration,
    // 会话目录最长保留时间，超过即被定期清理删除
    pub retention: Duration,
    // 转换工作协程数量
    pub workers: usize,
    // 转换队列容量，队列满时上传返回503
    pub queue_size: usize,
    // 模拟进度的步进间隔
    pub progress_step: Duration,
}

impl Config {
    pub fn from_cli(cli: &Cli) -> Self {
        Self {
            host: cli.host.clone(),
            port: cli.port,
            temp_dir: cli.temp_dir.clone(),
            max_file_size: cli.max_file_size_mb * 1024 * 1024,
            cleanup_delay: Duration::from_secs(cli.cleanup_delay_secs),
            sweep_interval: Duration::from_secs(cli.sweep_interval_secs),
            retention: Duration::from_secs(cli.retention_hours * 3600),
            workers: cli.workers,
            queue_size: cli.queue_size,
            progress_step: Duration::from_millis(500),
        }
    }

    pub fn max_file_size_mb(&self) -> u64 {
        self.max_file_size / 1024 / 1024
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            host: "0.0.0.0".to_string(),
            port: 8000,
            temp_dir: PathBuf::from("temp"),
            max_file_size: 100 * 1024 * 1024,
            cleanup_delay: Duration::from_secs(5),
            sweep_interval: Duration::from_secs(3600),
            retention: Duration::from_secs(24 * 3600),
            workers: 4,
            queue_size: 64,
            progress_step: Duration::from_millis(500),
        }
    }
}
