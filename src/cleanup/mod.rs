use std::cmp::Reverse;
use std::collections::BinaryHeap;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use tokio::sync::Notify;
use tokio::time::Instant;
use tracing::{error, info, warn};

use crate::task::store::TaskStore;

// 一条延迟清理记录，按到期时间排序
#[derive(Debug)]
struct CleanupEntry {
    due: Instant,
    session_dir: PathBuf,
    // 会话对应的任务记录在目录删除时一并移除
    task_id: Option<String>,
}

impl PartialEq for CleanupEntry {
    fn eq(&self, other: &Self) -> bool {
        self.due == other.due
    }
}

impl Eq for CleanupEntry {}

impl PartialOrd for CleanupEntry {
    fn partial_cmp(&self, other: &Self) -> Option<std::cmp::Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for CleanupEntry {
    fn cmp(&self, other: &Self) -> std::cmp::Ordering {
        self.due.cmp(&other.due)
    }
}

// 延迟清理队列
// 所有待删除目录进同一个最小堆，由单个janitor协程统一处理，
// 不必为每个会话挂一个睡眠任务
#[derive(Clone)]
pub struct CleanupQueue {
    entries: Arc<Mutex<BinaryHeap<Reverse<CleanupEntry>>>>,
    notify: Arc<Notify>,
}

impl CleanupQueue {
    pub fn new() -> Self {
        Self {
            entries: Arc::new(Mutex::new(BinaryHeap::new())),
            notify: Arc::new(Notify::new()),
        }
    }

    // 计划在delay之后删除会话目录，立即返回，不阻塞调用方
    pub fn schedule(&self, session_dir: PathBuf, task_id: Option<String>, delay: Duration) {
        info!(
            "计划在 {} 秒后清理临时文件: {}",
            delay.as_secs(),
            session_dir.display()
        );
        let entry = CleanupEntry {
            due: Instant::now() + delay,
            session_dir,
            task_id,
        };
        self.entries
            .lock()
            .expect("清理队列锁中毒")
            .push(Reverse(entry));
        self.notify.notify_one();
    }

    fn next_due(&self) -> Option<Instant> {
        self.entries
            .lock()
            .expect("清理队列锁中毒")
            .peek()
            .map(|Reverse(e)| e.due)
    }

    fn pop_due(&self, now: Instant) -> Option<CleanupEntry> {
        let mut entries = self.entries.lock().expect("清理队列锁中毒");
        let due = entries.peek().map(|Reverse(e)| e.due)?;
        if due <= now {
            entries.pop().map(|Reverse(e)| e)
        } else {
            None
        }
    }
}

impl Default for CleanupQueue {
    fn default() -> Self {
        Self::new()
    }
}

// 启动janitor协程，循环等待最近的到期项
pub fn spawn_janitor(queue: CleanupQueue, store: TaskStore) {
    tokio::spawn(async move {
        loop {
            match queue.next_due() {
                Some(due) => {
                    tokio::select! {
                        _ = tokio::time::sleep_until(due) => {}
                        // 有更早的新项入队时重新计算等待时间
                        _ = queue.notify.notified() => continue,
                    }
                }
                None => {
                    queue.notify.notified().await;
                    continue;
                }
            }

            let now = Instant::now();
            while let Some(entry) = queue.pop_due(now) {
                remove_session_dir(&entry.session_dir).await;
                if let Some(task_id) = entry.task_id {
                    store.remove(&task_id);
                    info!("已移除任务记录: {}", task_id);
                }
            }
        }
    });
}

// 启动定期清理协程，按固定间隔扫描过期会话目录
pub fn spawn_sweeper(temp_dir: PathBuf, interval: Duration, retention: Duration) {
    tokio::spawn(async move {
        let mut ticker = tokio::time::interval(interval);
        // 第一跳立即触发，跳过它让扫描从一个完整间隔之后开始
        ticker.tick().await;
        loop {
            ticker.tick().await;
            info!("开始定期清理临时文件");
            sweep_expired(&temp_dir, retention).await;
        }
    });
}

// 删除所有修改时间超过保留期的会话目录，不管任务处于什么状态
pub async fn sweep_expired(temp_dir: &Path, retention: Duration) {
    let mut read_dir = match tokio::fs::read_dir(temp_dir).await {
        Ok(rd) => rd,
        Err(e) => {
            warn!("读取临时目录失败: {}, {}", temp_dir.display(), e);
            return;
        }
    };

    while let Ok(Some(entry)) = read_dir.next_entry().await {
        let path = entry.path();
        let Ok(meta) = entry.metadata().await else {
            continue;
        };
        if !meta.is_dir() {
            continue;
        }
        let expired = meta
            .modified()
            .ok()
            .and_then(|mtime| mtime.elapsed().ok())
            .map(|age| age >= retention)
            .unwrap_or(false);
        if expired {
            info!("删除旧会话目录: {}", path.display());
            remove_session_dir(&path).await;
        }
    }
}

// 尽力删除会话目录
// 先尝试整体递归删除，失败再自底向上逐个删，删不掉的只告警
pub async fn remove_session_dir(session_dir: &Path) {
    if !session_dir.exists() {
        return;
    }
    match tokio::fs::remove_dir_all(session_dir).await {
        Ok(()) => {
            info!("已删除会话目录: {}", session_dir.display());
        }
        Err(e) => {
            warn!("删除会话目录时出错: {}, {}", session_dir.display(), e);
            if let Err(e) = fallback_remove(session_dir).await {
                error!("遍历删除文件时出错: {}", e);
            }
        }
    }
}

// 自底向上逐项删除，单个文件失败不中断
fn fallback_remove(
    dir: &Path,
) -> std::pin::Pin<Box<dyn std::future::Future<Output = std::io::Result<()>> + Send + '_>> {
    Box::pin(async move {
        let mut read_dir = tokio::fs::read_dir(dir).await?;
        while let Some(entry) = read_dir.next_entry().await? {
            let path = entry.path();
            let is_dir = entry.file_type().await.map(|t| t.is_dir()).unwrap_or(false);
            if is_dir {
                if let Err(e) = fallback_remove(&path).await {
                    warn!("删除目录时出错: {}, {}", path.display(), e);
                }
            } else if let Err(e) = tokio::fs::remove_file(&path).await {
                warn!("删除文件时出错: {}, {}", path.display(), e);
            }
        }
        tokio::fs::remove_dir(dir).await?;
        Ok(())
    })
}
