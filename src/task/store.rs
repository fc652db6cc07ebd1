use std::sync::Arc;

use dashmap::DashMap;
use tokio::sync::Mutex;
use tracing::warn;

use super::models::{TaskRecord, TaskStatus};

// 进程内任务表，task_id -> 记录
// 每条记录从创建到终态只由一个工作协程写入，请求侧只读或改 downloaded 标记
#[derive(Clone)]
pub struct TaskStore {
    tasks: Arc<DashMap<String, Arc<Mutex<TaskRecord>>>>,
}

impl TaskStore {
    pub fn new() -> Self {
        Self {
            tasks: Arc::new(DashMap::new()),
        }
    }

    pub fn insert(&self, record: TaskRecord) {
        self.tasks
            .insert(record.task_id.clone(), Arc::new(Mutex::new(record)));
    }

    pub fn remove(&self, task_id: &str) {
        self.tasks.remove(task_id);
    }

    pub fn len(&self) -> usize {
        self.tasks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tasks.is_empty()
    }

    // 取记录快照，不存在返回None
    pub async fn get(&self, task_id: &str) -> Option<TaskRecord> {
        let entry = self.entry(task_id)?;
        Some(entry.lock().await.clone())
    }

    pub async fn set_status(&self, task_id: &str, status: TaskStatus) {
        if let Some(entry) = self.entry(task_id) {
            let mut task = entry.lock().await;
            // 终态单向，不允许回退
            if task.status.is_terminal() {
                warn!("任务 {} 已处于终态，忽略状态变更: {:?}", task_id, status);
                return;
            }
            task.status = status;
        }
    }

    // 进度只增不减
    pub async fn set_progress(&self, task_id: &str, progress: u8) {
        if let Some(entry) = self.entry(task_id) {
            let mut task = entry.lock().await;
            if task.status.is_terminal() {
                return;
            }
            task.progress = task.progress.max(progress.min(100));
        }
    }

    pub async fn mark_completed(&self, task_id: &str, output_filename: String) {
        if let Some(entry) = self.entry(task_id) {
            let mut task = entry.lock().await;
            if task.status.is_terminal() {
                warn!("任务 {} 已处于终态，忽略完成标记", task_id);
                return;
            }
            task.status = TaskStatus::Completed;
            task.progress = 100;
            task.output_filename = Some(output_filename);
        }
    }

    pub async fn mark_failed(&self, task_id: &str, error: String) {
        if let Some(entry) = self.entry(task_id) {
            let mut task = entry.lock().await;
            if task.status.is_terminal() {
                warn!("任务 {} 已处于终态，忽略失败标记", task_id);
                return;
            }
            task.status = TaskStatus::Failed;
            task.error = Some(error);
        }
    }

    pub async fn mark_downloaded(&self, task_id: &str) {
        if let Some(entry) = self.entry(task_id) {
            entry.lock().await.downloaded = true;
        }
    }

    // 先克隆Arc再解锁，避免跨await持有分片锁
    fn entry(&self, task_id: &str) -> Option<Arc<Mutex<TaskRecord>>> {
        self.tasks.get(task_id).map(|e| Arc::clone(e.value()))
    }
}

impl Default for TaskStore {
    fn default() -> Self {
        Self::new()
    }
}
