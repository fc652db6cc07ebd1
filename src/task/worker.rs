use std::sync::Arc;

use tokio::sync::{Mutex, mpsc};
use tracing::{error, info};

use crate::config::Config;
use crate::converter::{DocumentConverter, converter_for};

use super::models::{ConversionJob, TaskStatus};
use super::store::TaskStore;

// 启动固定数量的工作协程，共享同一个有界队列
// 队列容量在上传侧形成背压（队列满 -> 503）
pub fn spawn_workers(
    count: usize,
    receiver: mpsc::Receiver<ConversionJob>,
    store: TaskStore,
    config: Arc<Config>,
) {
    let receiver = Arc::new(Mutex::new(receiver));
    for worker_id in 0..count {
        let receiver = Arc::clone(&receiver);
        let store = store.clone();
        let config = Arc::clone(&config);
        tokio::spawn(async move {
            loop {
                // 只在取任务时持锁，处理期间释放给其他工作协程
                let job = { receiver.lock().await.recv().await };
                match job {
                    Some(job) => process_conversion(&store, &config, job).await,
                    None => {
                        info!("转换队列已关闭，工作协程 {} 退出", worker_id);
                        break;
                    }
                }
            }
        });
    }
}

// 任务状态机: pending -> processing -> completed / failed
// 转换调用没有超时，外部工具卡死只会阻塞该任务自身
pub async fn process_conversion(store: &TaskStore, config: &Config, job: ConversionJob) {
    let task_id = job.task_id.clone();
    info!("开始处理任务: {}", task_id);
    info!("输入文件路径: {}", job.input_path.display());
    info!("输出文件路径: {}", job.output_path.display());

    store.set_status(&task_id, TaskStatus::Processing).await;

    // 模拟进度更新，外部转换工具不提供真实进度回调
    for step in 1..10u8 {
        store.set_progress(&task_id, step * 10).await;
        tokio::time::sleep(config.progress_step).await;
    }

    let converter = converter_for(job.kind);
    let result = converter
        .convert(
            &job.input_path,
            &job.output_path,
            &job.session_dir,
            job.style.as_ref(),
        )
        .await;

    match result {
        Ok(()) => {
            // 适配器成功也要验证产物，空文件按失败处理
            match tokio::fs::metadata(&job.output_path).await {
                Ok(meta) if meta.len() > 0 => {
                    let output_filename = job
                        .output_path
                        .file_name()
                        .map(|n| n.to_string_lossy().into_owned())
                        .unwrap_or_default();
                    info!(
                        "文件成功生成: {}, 大小: {} 字节",
                        job.output_path.display(),
                        meta.len()
                    );
                    store.mark_completed(&task_id, output_filename).await;
                    info!("✅ 任务 {} 完成", task_id);
                }
                Ok(_) => {
                    error!("❌ 任务 {} 失败: 输出文件为空", task_id);
                    store
                        .mark_failed(&task_id, "文件转换失败，输出文件为空".to_string())
                        .await;
                }
                Err(_) => {
                    error!("❌ 任务 {} 失败: 未生成输出文件", task_id);
                    store
                        .mark_failed(&task_id, "文件转换失败，未生成输出文件".to_string())
                        .await;
                }
            }
        }
        Err(e) => {
            error!("❌ 任务 {} 失败: {}", task_id, e);
            store.mark_failed(&task_id, e.to_string()).await;
        }
    }
}
