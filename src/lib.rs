//! # Codim Client
//!
//! 练习平台的提交客户端：通过一条持久 WebSocket 连接提交代码或测验答案，
//! 接收执行结果，断线后按指数退避自动重连
//!
//! ## 架构设计
//!
//! 本系统采用四层架构：
//!
//! ### ① 基础设施层（Infrastructure）
//! - `infrastructure/` - 只暴露"建立一条文本帧连接"的能力
//! - `Connector` - 连接器抽象，测试时可替换
//! - `WsConnector` - 基于 tokio-tungstenite，携带 `auth_token` Cookie
//!
//! ### ② 业务能力层（Services）
//! - `services/` - 描述"我能做什么"
//! - `SubmissionChannel` - 提交通道：发送提交、保存最近结果、断线重连
//! - `Backoff` - 重连退避策略
//! - `ApiClient` - 登录、练习元数据，以及练习进度的读取和保存
//! - `Autosaver` - 草稿自动保存
//!
//! ### ③ 流程层（Workflow）
//! - `workflow/` - 定义"一道练习"的处理流程
//! - `ExerciseSession` - 编辑 → 运行 → 判定 → 结束
//!
//! ### ④ 编排层（Orchestration）
//! - `orchestrator/app` - 命令行一次调用的生命周期
//!
//! ## 模块结构

pub mod config;
pub mod error;
pub mod infrastructure;
pub mod logger;
pub mod models;
pub mod orchestrator;
pub mod services;
pub mod utils;
pub mod workflow;

// 重新导出常用类型
pub use config::Config;
pub use error::{AppError, AppResult};
pub use infrastructure::{Connector, WsConnector};
pub use models::{ExecuteResult, FileEntry, QuizAnswers, Submission};
pub use orchestrator::App;
pub use services::{ApiClient, Autosaver, Backoff, ChannelState, SubmissionChannel};
pub use workflow::{ExerciseSession, RunOutcome, Verdict};
