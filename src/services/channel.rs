//! 提交通道 - 业务能力层
//!
//! 维护到执行后端的一条持久连接：
//! - 把提交包装成 `{exercise_uuid, submission}` 文本帧发出
//! - 把带 `job_id` 的入站消息存为"最近一次结果"，并同步通知回调
//! - 断线后按指数退避无限重连，直到通道被关闭
//!
//! 状态机：`Connecting → Open → Closed(backoff) → Connecting → … → TornDown`

use std::fmt;
use std::sync::{Arc, Mutex, MutexGuard};
use std::time::Duration;

use futures::{SinkExt, StreamExt};
use serde::Serialize;
use tokio::sync::{mpsc, watch};
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};
use url::Url;

use crate::config::Config;
use crate::error::{ConfigError, SubmitError};
use crate::infrastructure::{Connection, Connector, WsConnector};
use crate::models::{ExecuteResult, InboundFrame, SubmissionEnvelope};
use crate::services::backoff::Backoff;

/// 关闭底层连接时最多等待的时间
const CLOSE_TIMEOUT: Duration = Duration::from_secs(1);

/// 通道状态
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ChannelState {
    /// 正在建立连接
    Connecting,
    /// 已连接，可以提交
    Open,
    /// 已断开，`retry_in` 之后重连
    Closed { retry_in: Duration },
    /// 已关闭，不会再有任何状态变化
    TornDown,
}

type ResultCallback = Arc<dyn Fn(&ExecuteResult) + Send + Sync>;

/// 通道和驱动任务共享的状态
struct Shared {
    /// 当前连接的出站发送端，只在 Open 时存在
    outbound: Mutex<Option<mpsc::UnboundedSender<String>>>,
    state: watch::Sender<ChannelState>,
    last_result: watch::Sender<Option<Arc<ExecuteResult>>>,
    callback: Mutex<Option<ResultCallback>>,
}

impl Shared {
    fn attach(&self, outbound: mpsc::UnboundedSender<String>) {
        *lock(&self.outbound) = Some(outbound);
    }

    fn detach(&self) {
        lock(&self.outbound).take();
    }

    /// 处理一个入站文本帧
    fn dispatch(&self, text: &str) {
        match InboundFrame::classify(text) {
            InboundFrame::Result(result) => {
                info!(
                    "📥 收到执行结果: job_id={} passed={} exit_code={}",
                    result.job_id, result.passed, result.exit_code
                );
                let result = Arc::new(result);
                self.last_result.send_replace(Some(result.clone()));

                let callback = lock(&self.callback).clone();
                if let Some(callback) = callback {
                    callback(&result);
                }
            }
            InboundFrame::Ignored => debug!("忽略不含 job_id 的消息"),
            InboundFrame::Malformed(reason) => warn!("解析 WebSocket 消息失败: {}", reason),
        }
    }
}

fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
}

/// 提交通道
///
/// 构造时立即开始连接；`close()` 或 drop 时关闭，关闭后不会再重连
pub struct SubmissionChannel {
    shared: Arc<Shared>,
    shutdown: watch::Sender<bool>,
    driver: Option<JoinHandle<()>>,
    url: Url,
}

impl SubmissionChannel {
    /// 按配置连接到执行后端
    pub fn open(config: &Config) -> Result<Self, ConfigError> {
        let url = config.ws_url()?;
        let connector = WsConnector::new(config.auth_token.clone());
        Ok(Self::connect(
            url,
            connector,
            config.backoff(),
            config.connect_timeout(),
        ))
    }

    /// 使用指定的连接器连接
    ///
    /// 必须在 tokio 运行时中调用
    ///
    /// # 参数
    /// - `url`: WebSocket 地址
    /// - `connector`: 连接器
    /// - `backoff`: 重连退避策略
    /// - `connect_timeout`: 单次连接（含握手）的最长时间，超时按断开处理
    pub fn connect<C: Connector>(
        url: Url,
        connector: C,
        backoff: Backoff,
        connect_timeout: Duration,
    ) -> Self {
        let shared = Arc::new(Shared {
            outbound: Mutex::new(None),
            state: watch::channel(ChannelState::Connecting).0,
            last_result: watch::channel(None).0,
            callback: Mutex::new(None),
        });
        let (shutdown, shutdown_rx) = watch::channel(false);

        let driver = Driver {
            shared: shared.clone(),
            connector,
            backoff,
            connect_timeout,
            url: url.clone(),
            shutdown: shutdown_rx,
        };
        let driver = tokio::spawn(driver.run());

        Self {
            shared,
            shutdown,
            driver: Some(driver),
            url,
        }
    }

    /// 发送一次提交
    ///
    /// # 参数
    /// - `exercise_uuid`: 练习 ID
    /// - `submission`: 代码或测验提交，通道不校验具体形状
    ///
    /// # 返回
    /// 通道不在 Open 状态时返回 `SubmitError::NotConnected`，提交被丢弃，不排队也不重试
    pub fn submit<S>(&self, exercise_uuid: &str, submission: &S) -> Result<(), SubmitError>
    where
        S: Serialize + ?Sized,
    {
        let frame = serde_json::to_string(&SubmissionEnvelope::new(exercise_uuid, submission))?;

        let outbound = lock(&self.shared.outbound);
        match outbound.as_ref() {
            Some(sender) if sender.send(frame).is_ok() => {
                debug!("📤 已发送提交: {}", exercise_uuid);
                Ok(())
            }
            _ => {
                warn!("WebSocket 未连接，提交已丢弃: {}", exercise_uuid);
                Err(SubmitError::NotConnected {
                    exercise_uuid: exercise_uuid.to_string(),
                })
            }
        }
    }

    /// 最近一次执行结果
    pub fn last_result(&self) -> Option<Arc<ExecuteResult>> {
        self.shared.last_result.borrow().clone()
    }

    /// 订阅最近一次执行结果的变化
    pub fn subscribe_results(&self) -> watch::Receiver<Option<Arc<ExecuteResult>>> {
        self.shared.last_result.subscribe()
    }

    /// 注册结果回调，替换之前注册的回调
    ///
    /// 回调在驱动任务中同步执行，不要在里面阻塞
    pub fn on_result<F>(&self, callback: F)
    where
        F: Fn(&ExecuteResult) + Send + Sync + 'static,
    {
        *lock(&self.shared.callback) = Some(Arc::new(callback));
    }

    pub fn clear_on_result(&self) {
        lock(&self.shared.callback).take();
    }

    pub fn state(&self) -> ChannelState {
        *self.shared.state.borrow()
    }

    pub fn watch_state(&self) -> watch::Receiver<ChannelState> {
        self.shared.state.subscribe()
    }

    pub fn is_connected(&self) -> bool {
        self.state() == ChannelState::Open
    }

    pub fn url(&self) -> &Url {
        &self.url
    }

    /// 等待通道进入 Open 状态
    ///
    /// # 返回
    /// 超时或通道已关闭时返回 false
    pub async fn wait_until_connected(&self, timeout: Duration) -> bool {
        let mut state = self.watch_state();
        let reached = tokio::time::timeout(
            timeout,
            state.wait_for(|s| matches!(s, ChannelState::Open | ChannelState::TornDown)),
        )
        .await;

        matches!(reached, Ok(Ok(ref s)) if **s == ChannelState::Open)
    }

    /// 关闭通道并等待驱动任务结束
    pub async fn close(mut self) {
        self.teardown();
        if let Some(driver) = self.driver.take() {
            if let Err(e) = driver.await {
                warn!("提交通道驱动任务异常退出: {}", e);
            }
        }
    }

    /// 先解除出站槽，再通知驱动任务退出
    fn teardown(&self) {
        self.shared.detach();
        self.shutdown.send_replace(true);
    }
}

impl Drop for SubmissionChannel {
    fn drop(&mut self) {
        self.teardown();
    }
}

impl fmt::Debug for SubmissionChannel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SubmissionChannel")
            .field("url", &self.url.as_str())
            .field("state", &self.state())
            .finish()
    }
}

/// 连接断开的原因
enum Disconnect {
    Dropped,
    TornDown,
}

/// 驱动任务：唯一持有底层连接的地方
struct Driver<C> {
    shared: Arc<Shared>,
    connector: C,
    backoff: Backoff,
    connect_timeout: Duration,
    url: Url,
    shutdown: watch::Receiver<bool>,
}

impl<C: Connector> Driver<C> {
    async fn run(mut self) {
        let mut attempts: u32 = 0;

        loop {
            if *self.shutdown.borrow() {
                break;
            }

            self.shared.state.send_replace(ChannelState::Connecting);
            debug!("正在连接执行后端: {}", self.url);

            let connecting =
                tokio::time::timeout(self.connect_timeout, self.connector.connect(&self.url));
            let outcome = tokio::select! {
                biased;
                _ = self.shutdown.changed() => break,
                outcome = connecting => outcome,
            };

            match outcome {
                Ok(Ok(connection)) => {
                    attempts = 0;
                    info!("✓ 已连接到执行后端: {}", self.url);
                    if let Disconnect::TornDown = self.pump(connection).await {
                        break;
                    }
                }
                Ok(Err(e)) => warn!("连接执行后端失败: {}", e),
                Err(_) => warn!(
                    "连接执行后端超时 ({} 秒): {}",
                    self.connect_timeout.as_secs(),
                    self.url
                ),
            }

            let retry_in = self.backoff.delay(attempts);
            attempts = attempts.saturating_add(1);
            self.shared
                .state
                .send_replace(ChannelState::Closed { retry_in });
            info!(
                "连接已断开，{} ms 后第 {} 次重连",
                retry_in.as_millis(),
                attempts
            );

            tokio::select! {
                biased;
                _ = self.shutdown.changed() => break,
                _ = tokio::time::sleep(retry_in) => {}
            }
        }

        self.shared.detach();
        self.shared.state.send_replace(ChannelState::TornDown);
        info!("提交通道已关闭: {}", self.url);
    }

    /// 在一条连接上收发，直到断开或关闭
    async fn pump(&mut self, connection: Connection) -> Disconnect {
        let Connection {
            mut sink,
            mut stream,
        } = connection;
        let (outbound, mut frames) = mpsc::unbounded_channel::<String>();
        self.shared.attach(outbound);
        self.shared.state.send_replace(ChannelState::Open);

        let reason = loop {
            tokio::select! {
                biased;
                _ = self.shutdown.changed() => break Disconnect::TornDown,
                Some(frame) = frames.recv() => {
                    if let Err(e) = sink.send(frame).await {
                        warn!("发送提交失败: {}", e);
                        break Disconnect::Dropped;
                    }
                }
                inbound = stream.next() => match inbound {
                    Some(Ok(text)) => self.shared.dispatch(&text),
                    Some(Err(e)) => {
                        warn!("WebSocket 连接异常: {}", e);
                        break Disconnect::Dropped;
                    }
                    None => {
                        info!("服务端关闭了连接");
                        break Disconnect::Dropped;
                    }
                },
            }
        };

        // 先解除出站槽和入站处理，再关闭底层连接，关闭动作本身不会再触发任何处理
        self.shared.detach();
        drop(frames);
        drop(stream);
        match tokio::time::timeout(CLOSE_TIMEOUT, sink.close()).await {
            Ok(Ok(())) => {}
            Ok(Err(e)) => debug!("关闭连接时出错: {}", e),
            Err(_) => debug!("关闭连接超时"),
        }

        reason
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::TransportError;
    use crate::models::FileEntry;
    use futures::channel::mpsc as duplex;
    use futures::future::BoxFuture;
    use serde_json::json;
    use std::collections::VecDeque;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use tokio::time::Instant;

    const CONNECT_TIMEOUT: Duration = Duration::from_secs(10);

    /// 每次连接尝试的脚本
    enum Plan {
        Refuse,
        Hang,
        Accept,
    }

    /// 服务端持有的一端
    struct ServerEnd {
        to_client: duplex::UnboundedSender<String>,
        from_client: duplex::UnboundedReceiver<String>,
    }

    /// 按脚本响应的内存连接器，脚本用完之后一律拒绝
    #[derive(Clone)]
    struct ScriptedConnector {
        plans: Arc<Mutex<VecDeque<Plan>>>,
        attempts: Arc<Mutex<Vec<Instant>>>,
        servers: mpsc::UnboundedSender<ServerEnd>,
    }

    impl ScriptedConnector {
        fn attempts(&self) -> Vec<Instant> {
            self.attempts.lock().unwrap().clone()
        }
    }

    impl Connector for ScriptedConnector {
        fn connect(&self, _url: &Url) -> BoxFuture<'static, Result<Connection, TransportError>> {
            self.attempts.lock().unwrap().push(Instant::now());
            let plan = self
                .plans
                .lock()
                .unwrap()
                .pop_front()
                .unwrap_or(Plan::Refuse);

            match plan {
                Plan::Refuse => Box::pin(async {
                    Err(TransportError::Connect {
                        url: "mock://backend".to_string(),
                        message: "connection refused".to_string(),
                    })
                }),
                Plan::Hang => Box::pin(futures::future::pending()),
                Plan::Accept => {
                    let (to_client, client_inbox) = duplex::unbounded::<String>();
                    let (client_outbox, from_client) = duplex::unbounded::<String>();
                    let _ = self.servers.send(ServerEnd {
                        to_client,
                        from_client,
                    });
                    let sink = client_outbox.sink_map_err(|e| TransportError::Send(e.to_string()));
                    let stream = client_inbox.map(Ok::<String, TransportError>);
                    Box::pin(async move { Ok(Connection::new(sink, stream)) })
                }
            }
        }
    }

    fn harness(
        plans: Vec<Plan>,
    ) -> (
        SubmissionChannel,
        ScriptedConnector,
        mpsc::UnboundedReceiver<ServerEnd>,
    ) {
        let (servers, server_rx) = mpsc::unbounded_channel();
        let connector = ScriptedConnector {
            plans: Arc::new(Mutex::new(plans.into_iter().collect())),
            attempts: Arc::new(Mutex::new(Vec::new())),
            servers,
        };
        let url = Url::parse("ws://localhost/ws").unwrap();
        let channel = SubmissionChannel::connect(
            url,
            connector.clone(),
            Backoff::default(),
            CONNECT_TIMEOUT,
        );
        (channel, connector, server_rx)
    }

    async fn wait_for_state(channel: &SubmissionChannel, f: impl FnMut(&ChannelState) -> bool) {
        channel.watch_state().wait_for(f).await.unwrap();
    }

    fn result_frame(job_id: &str, stdout: &str) -> String {
        json!({
            "job_id": job_id,
            "stdout": stdout,
            "stderr": "",
            "exit_code": 0,
            "time": 0.01,
            "memory": 64,
            "cpu": 0.1,
            "checker_results": [],
            "passed": true
        })
        .to_string()
    }

    fn gaps_ms(times: &[Instant]) -> Vec<u128> {
        times
            .windows(2)
            .map(|w| (w[1] - w[0]).as_millis())
            .collect()
    }

    #[tokio::test(start_paused = true)]
    async fn test_backoff_sequence_for_consecutive_failures() {
        let (channel, connector, _servers) = harness(vec![]);

        tokio::time::sleep(Duration::from_secs(100)).await;

        let attempts = connector.attempts();
        assert!(attempts.len() >= 7, "只有 {} 次连接尝试", attempts.len());
        assert_eq!(
            gaps_ms(&attempts[..7]),
            vec![1000, 2000, 4000, 8000, 16000, 30000]
        );
        assert!(matches!(channel.state(), ChannelState::Closed { .. }));
    }

    #[tokio::test(start_paused = true)]
    async fn test_stalled_handshake_times_out_and_retries() {
        let (channel, connector, _servers) = harness(vec![Plan::Hang]);

        wait_for_state(&channel, |s| {
            *s == ChannelState::Closed {
                retry_in: Duration::from_millis(1000),
            }
        })
        .await;
        tokio::time::sleep(Duration::from_millis(1500)).await;

        let attempts = connector.attempts();
        assert_eq!(attempts.len(), 2);
        assert_eq!(gaps_ms(&attempts), vec![11_000]);
    }

    #[tokio::test(start_paused = true)]
    async fn test_attempts_reset_after_successful_open() {
        let (channel, connector, mut servers) =
            harness(vec![Plan::Refuse, Plan::Refuse, Plan::Accept]);

        let server = servers.recv().await.unwrap();
        wait_for_state(&channel, |s| *s == ChannelState::Open).await;
        drop(server);

        wait_for_state(&channel, |s| {
            *s == ChannelState::Closed {
                retry_in: Duration::from_millis(1000),
            }
        })
        .await;
        tokio::time::sleep(Duration::from_secs(5)).await;

        let attempts = connector.attempts();
        assert!(attempts.len() >= 5);
        assert_eq!(gaps_ms(&attempts[..5]), vec![1000, 2000, 1000, 2000]);
    }

    #[tokio::test]
    async fn test_submit_sends_envelope_when_open() {
        let (channel, _connector, mut servers) = harness(vec![Plan::Accept]);
        let mut server = servers.recv().await.unwrap();
        wait_for_state(&channel, |s| *s == ChannelState::Open).await;

        channel
            .submit("ex-1", &FileEntry::file("main.py", "print(1)"))
            .unwrap();

        let frame = server.from_client.next().await.unwrap();
        let value: serde_json::Value = serde_json::from_str(&frame).unwrap();
        assert_eq!(
            value,
            json!({
                "exercise_uuid": "ex-1",
                "submission": {"name": "main.py", "content": "print(1)"}
            })
        );
        assert!(channel.is_connected());
    }

    /// 序列化总是失败的提交
    struct Unserializable;

    impl Serialize for Unserializable {
        fn serialize<S: serde::Serializer>(&self, _serializer: S) -> Result<S::Ok, S::Error> {
            Err(serde::ser::Error::custom("cannot encode"))
        }
    }

    #[tokio::test]
    async fn test_submit_reports_encode_error_and_sends_nothing() {
        let (channel, _connector, mut servers) = harness(vec![Plan::Accept]);
        let mut server = servers.recv().await.unwrap();
        wait_for_state(&channel, |s| *s == ChannelState::Open).await;

        let err = channel.submit("ex-1", &Unserializable).unwrap_err();
        assert!(matches!(err, SubmitError::Encode(_)));
        let nothing = tokio::time::timeout(Duration::from_millis(50), server.from_client.next()).await;
        assert!(nothing.is_err());
        assert!(channel.is_connected());
    }

    #[tokio::test]
    async fn test_sample_result_frame_becomes_last_result() {
        let (channel, _connector, mut servers) = harness(vec![Plan::Accept]);
        let calls = Arc::new(AtomicUsize::new(0));
        let counter = calls.clone();
        channel.on_result(move |_| {
            counter.fetch_add(1, Ordering::SeqCst);
        });

        let mut server = servers.recv().await.unwrap();
        wait_for_state(&channel, |s| *s == ChannelState::Open).await;
        channel
            .submit("ex-1", &FileEntry::file("main.py", "print(1)"))
            .unwrap();
        server.from_client.next().await.unwrap();

        server
            .to_client
            .unbounded_send(
                r#"{"job_id":"abc","stdout":"1\n","stderr":"","exit_code":0,"time":0.01,"memory":128,"cpu":0.1,"checker_results":[],"passed":true}"#
                    .to_string(),
            )
            .unwrap();
        channel
            .subscribe_results()
            .wait_for(|r| r.is_some())
            .await
            .unwrap();

        let expected = ExecuteResult {
            job_id: "abc".to_string(),
            stdout: "1\n".to_string(),
            stderr: String::new(),
            exit_code: 0,
            time: 0.01,
            memory: 128.0,
            cpu: 0.1,
            checker_results: vec![],
            passed: true,
            next_lesson_uuid: None,
            next_exercise_uuid: None,
            reward: None,
        };
        assert_eq!(*channel.last_result().unwrap(), expected);
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn test_submit_while_closed_or_connecting_is_dropped() {
        let (closed, _connector, _servers) = harness(vec![Plan::Refuse]);
        wait_for_state(&closed, |s| matches!(s, ChannelState::Closed { .. })).await;
        let err = closed
            .submit("ex-1", &FileEntry::file("main.py", "print(1)"))
            .unwrap_err();
        assert!(matches!(err, SubmitError::NotConnected { .. }));

        let (connecting, _connector, _servers) = harness(vec![Plan::Hang]);
        tokio::task::yield_now().await;
        assert_eq!(connecting.state(), ChannelState::Connecting);
        assert!(matches!(
            connecting.submit("ex-2", &json!({"answers": {}})),
            Err(SubmitError::NotConnected { .. })
        ));
    }

    #[tokio::test]
    async fn test_newest_result_wins_and_bad_frames_are_ignored() {
        let (channel, _connector, mut servers) = harness(vec![Plan::Accept]);
        let seen = Arc::new(Mutex::new(Vec::new()));
        let sink = seen.clone();
        channel.on_result(move |result| sink.lock().unwrap().push(result.job_id.clone()));

        let server = servers.recv().await.unwrap();
        wait_for_state(&channel, |s| *s == ChannelState::Open).await;

        for frame in [
            result_frame("r1", "first"),
            "not json at all".to_string(),
            r#"{"type":"hello"}"#.to_string(),
            r#"{"job_id":null,"stdout":"x"}"#.to_string(),
            r#"{"job_id":"bad","exit_code":"zero"}"#.to_string(),
            result_frame("r2", "second"),
        ] {
            server.to_client.unbounded_send(frame).unwrap();
        }

        channel
            .subscribe_results()
            .wait_for(|r| r.as_ref().map_or(false, |r| r.job_id == "r2"))
            .await
            .unwrap();

        let last = channel.last_result().unwrap();
        assert_eq!(last.stdout, "second");
        assert_eq!(*seen.lock().unwrap(), vec!["r1", "r2"]);
        assert!(channel.is_connected());
    }

    #[tokio::test]
    async fn test_cleared_callback_is_not_invoked() {
        let (channel, _connector, mut servers) = harness(vec![Plan::Accept]);
        let calls = Arc::new(AtomicUsize::new(0));
        let counter = calls.clone();
        channel.on_result(move |_| {
            counter.fetch_add(1, Ordering::SeqCst);
        });
        channel.clear_on_result();

        let server = servers.recv().await.unwrap();
        server
            .to_client
            .unbounded_send(result_frame("r1", ""))
            .unwrap();
        channel
            .subscribe_results()
            .wait_for(|r| r.is_some())
            .await
            .unwrap();

        assert_eq!(calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test(start_paused = true)]
    async fn test_close_while_waiting_to_reconnect_stops_retrying() {
        let (channel, connector, _servers) = harness(vec![Plan::Refuse]);
        let mut state = channel.watch_state();
        wait_for_state(&channel, |s| matches!(s, ChannelState::Closed { .. })).await;

        channel.close().await;
        tokio::time::sleep(Backoff::DEFAULT_MAX * 2).await;

        assert_eq!(connector.attempts().len(), 1);
        assert_eq!(*state.borrow_and_update(), ChannelState::TornDown);
    }

    #[tokio::test(start_paused = true)]
    async fn test_close_while_open_detaches_before_closing() {
        let (channel, connector, mut servers) = harness(vec![Plan::Accept, Plan::Accept]);
        let calls = Arc::new(AtomicUsize::new(0));
        let counter = calls.clone();
        channel.on_result(move |_| {
            counter.fetch_add(1, Ordering::SeqCst);
        });

        let mut server = servers.recv().await.unwrap();
        wait_for_state(&channel, |s| *s == ChannelState::Open).await;
        let mut state = channel.watch_state();

        channel.close().await;

        // 客户端的出站端已经关闭
        assert!(server.from_client.next().await.is_none());
        // 关闭之后到达的结果不会被处理
        let _ = server.to_client.unbounded_send(result_frame("late", ""));
        tokio::time::sleep(Backoff::DEFAULT_MAX * 2).await;

        assert_eq!(connector.attempts().len(), 1);
        assert_eq!(calls.load(Ordering::SeqCst), 0);
        assert_eq!(*state.borrow_and_update(), ChannelState::TornDown);
    }

    #[tokio::test(start_paused = true)]
    async fn test_drop_tears_down_the_driver() {
        let (channel, connector, _servers) = harness(vec![]);
        let mut state = channel.watch_state();
        wait_for_state(&channel, |s| matches!(s, ChannelState::Closed { .. })).await;

        drop(channel);
        state
            .wait_for(|s| *s == ChannelState::TornDown)
            .await
            .unwrap();
        tokio::time::sleep(Duration::from_secs(10)).await;

        assert_eq!(connector.attempts().len(), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn test_wait_until_connected_times_out() {
        let (channel, _connector, _servers) = harness(vec![Plan::Hang]);
        assert!(!channel.wait_until_connected(Duration::from_secs(3)).await);

        let (channel, _connector, _servers) = harness(vec![Plan::Accept]);
        assert!(channel.wait_until_connected(Duration::from_secs(3)).await);
    }
}
