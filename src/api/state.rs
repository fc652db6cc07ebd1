use std::sync::Arc;

use tokio::sync::mpsc;

use crate::cleanup::{self, CleanupQueue};
use crate::config::Config;
use crate::task::models::ConversionJob;
use crate::task::store::TaskStore;
use crate::task::worker;

// 服务级共享状态，注入到所有handler和后台协程
#[derive(Clone)]
pub struct AppState {
    pub config: Arc<Config>,
    pub store: TaskStore,
    pub job_tx: mpsc::Sender<ConversionJob>,
    pub cleanup: CleanupQueue,
}

impl AppState {
    // 组装任务表、工作协程池、janitor和定期清理
    pub fn new(config: Config) -> Self {
        let config = Arc::new(config);
        let store = TaskStore::new();
        let cleanup = CleanupQueue::new();

        let (job_tx, job_rx) = mpsc::channel::<ConversionJob>(config.queue_size);
        worker::spawn_workers(config.workers, job_rx, store.clone(), Arc::clone(&config));
        cleanup::spawn_janitor(cleanup.clone(), store.clone());
        cleanup::spawn_sweeper(
            config.temp_dir.clone(),
            config.sweep_interval,
            config.retention,
        );

        Self {
            config,
            store,
            job_tx,
            cleanup,
        }
    }

    pub fn session_dir(&self, session_id: &str) -> std::path::PathBuf {
        self.config.temp_dir.join(session_id)
    }
}
