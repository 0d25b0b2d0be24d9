//! 草稿自动保存 - 业务能力层
//!
//! 按固定间隔检查草稿，有变化且非空白时保存；停止时再保存一次

use std::sync::Arc;
use std::time::Duration;

use futures::future::BoxFuture;
use tokio::sync::{oneshot, watch};
use tokio::task::JoinHandle;
use tokio::time::{Instant, MissedTickBehavior};
use tracing::{debug, info, warn};

use crate::error::ApiError;
use crate::models::{SaveSubmissionRequest, Submission};

const MIN_INTERVAL: Duration = Duration::from_secs(1);

/// 草稿的持久化目标
pub trait SubmissionStore: Send + Sync + 'static {
    fn save<'a>(
        &'a self,
        exercise_uuid: &'a str,
        request: &'a SaveSubmissionRequest,
    ) -> BoxFuture<'a, Result<(), ApiError>>;
}

/// 自动保存器
///
/// drop 时会通知后台任务做最后一次保存，但不会等待它完成；需要等待请用 `stop()`
pub struct Autosaver {
    draft: watch::Sender<Option<Submission>>,
    stop: Option<oneshot::Sender<()>>,
    task: Option<JoinHandle<()>>,
}

impl Autosaver {
    /// 启动自动保存
    ///
    /// # 参数
    /// - `store`: 保存目标
    /// - `exercise_uuid`: 练习 ID
    /// - `interval`: 检查间隔，小于 1 秒时按 1 秒处理
    /// - `saved`: 服务端已有的提交，和它相同的草稿不会被重复保存
    pub fn spawn<S: SubmissionStore>(
        store: Arc<S>,
        exercise_uuid: impl Into<String>,
        interval: Duration,
        saved: Option<Submission>,
    ) -> Self {
        let (draft, draft_rx) = watch::channel(saved.clone());
        let (stop, stop_rx) = oneshot::channel();

        let worker = Worker {
            store,
            exercise_uuid: exercise_uuid.into(),
            draft: draft_rx,
            last_saved: saved,
        };
        let task = tokio::spawn(worker.run(interval.max(MIN_INTERVAL), stop_rx));

        Self {
            draft,
            stop: Some(stop),
            task: Some(task),
        }
    }

    /// 更新草稿，下一次检查时生效
    pub fn update(&self, submission: impl Into<Submission>) {
        self.draft.send_replace(Some(submission.into()));
    }

    /// 当前草稿
    pub fn draft(&self) -> Option<Submission> {
        self.draft.borrow().clone()
    }

    /// 停止自动保存，等待最后一次保存完成
    pub async fn stop(mut self) {
        if let Some(stop) = self.stop.take() {
            let _ = stop.send(());
        }
        if let Some(task) = self.task.take() {
            if let Err(e) = task.await {
                warn!("自动保存任务异常退出: {}", e);
            }
        }
    }
}

impl Drop for Autosaver {
    fn drop(&mut self) {
        if let Some(stop) = self.stop.take() {
            let _ = stop.send(());
        }
    }
}

struct Worker<S> {
    store: Arc<S>,
    exercise_uuid: String,
    draft: watch::Receiver<Option<Submission>>,
    last_saved: Option<Submission>,
}

impl<S: SubmissionStore> Worker<S> {
    async fn run(mut self, interval: Duration, mut stop: oneshot::Receiver<()>) {
        let mut ticker = tokio::time::interval_at(Instant::now() + interval, interval);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

        loop {
            tokio::select! {
                biased;
                _ = &mut stop => break,
                _ = ticker.tick() => self.flush().await,
            }
        }

        self.flush().await;
        debug!("自动保存已停止: {}", self.exercise_uuid);
    }

    /// 草稿有变化且非空白时保存，失败时保持脏状态等下一轮
    async fn flush(&mut self) {
        let draft = self.draft.borrow().clone();
        let Some(submission) = draft else {
            return;
        };
        if self.last_saved.as_ref() == Some(&submission) || submission.is_blank() {
            return;
        }

        let request = SaveSubmissionRequest {
            exercise_type: submission.exercise_type(),
            submission,
        };
        match self.store.save(&self.exercise_uuid, &request).await {
            Ok(()) => {
                info!("💾 草稿已保存: {}", self.exercise_uuid);
                self.last_saved = Some(request.submission);
            }
            Err(e) => warn!("保存草稿失败: {}", e),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{FileEntry, QuizAnswers};
    use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
    use std::sync::Mutex;

    #[derive(Default)]
    struct MemoryStore {
        saved: Mutex<Vec<(String, SaveSubmissionRequest)>>,
        calls: AtomicUsize,
        failing: AtomicBool,
    }

    impl MemoryStore {
        fn saved(&self) -> Vec<(String, SaveSubmissionRequest)> {
            self.saved.lock().unwrap().clone()
        }
    }

    impl SubmissionStore for MemoryStore {
        fn save<'a>(
            &'a self,
            exercise_uuid: &'a str,
            request: &'a SaveSubmissionRequest,
        ) -> BoxFuture<'a, Result<(), ApiError>> {
            Box::pin(async move {
                self.calls.fetch_add(1, Ordering::SeqCst);
                if self.failing.load(Ordering::SeqCst) {
                    return Err(ApiError::BadResponse {
                        endpoint: "memory".to_string(),
                        status: 503,
                        message: "unavailable".to_string(),
                        code: None,
                    });
                }
                self.saved
                    .lock()
                    .unwrap()
                    .push((exercise_uuid.to_string(), request.clone()));
                Ok(())
            })
        }
    }

    fn code(content: &str) -> FileEntry {
        FileEntry::file("main.py", content)
    }

    #[tokio::test(start_paused = true)]
    async fn test_saves_only_changed_non_blank_drafts() {
        let store = Arc::new(MemoryStore::default());
        let saver = Autosaver::spawn(
            store.clone(),
            "ex-1",
            Duration::from_secs(5),
            Some(code("print(1)").into()),
        );

        tokio::time::sleep(Duration::from_secs(6)).await;
        assert!(store.saved().is_empty());

        saver.update(code("print(2)"));
        tokio::time::sleep(Duration::from_secs(5)).await;
        tokio::time::sleep(Duration::from_secs(10)).await;

        saver.update(code("   "));
        tokio::time::sleep(Duration::from_secs(10)).await;
        saver.stop().await;

        let saved = store.saved();
        assert_eq!(saved.len(), 1);
        assert_eq!(saved[0].0, "ex-1");
        assert_eq!(saved[0].1.submission, Submission::Code(code("print(2)")));
    }

    #[tokio::test(start_paused = true)]
    async fn test_failed_save_is_retried_next_tick() {
        let store = Arc::new(MemoryStore::default());
        store.failing.store(true, Ordering::SeqCst);
        let saver = Autosaver::spawn(store.clone(), "ex-2", Duration::from_secs(5), None);

        saver.update(QuizAnswers::new().answer("q1", "a1"));
        tokio::time::sleep(Duration::from_secs(6)).await;
        assert_eq!(store.calls.load(Ordering::SeqCst), 1);
        assert!(store.saved().is_empty());

        store.failing.store(false, Ordering::SeqCst);
        tokio::time::sleep(Duration::from_secs(5)).await;

        let saved = store.saved();
        assert_eq!(saved.len(), 1);
        assert_eq!(
            serde_json::to_value(&saved[0].1).unwrap(),
            serde_json::json!({"type": "quiz", "submission": {"answers": {"q1": "a1"}}})
        );
        saver.stop().await;
    }

    #[tokio::test(start_paused = true)]
    async fn test_stop_flushes_pending_draft() {
        let store = Arc::new(MemoryStore::default());
        let saver = Autosaver::spawn(store.clone(), "ex-3", Duration::from_secs(5), None);

        saver.update(code("x = 1"));
        saver.stop().await;

        assert_eq!(store.saved().len(), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn test_drop_flushes_in_background() {
        let store = Arc::new(MemoryStore::default());
        let saver = Autosaver::spawn(store.clone(), "ex-4", Duration::from_secs(5), None);

        saver.update(code("x = 2"));
        drop(saver);
        tokio::time::sleep(Duration::from_millis(10)).await;

        assert_eq!(store.saved().len(), 1);
    }
}
