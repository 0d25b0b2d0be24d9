//! 编排层（Orchestration Layer）
//!
//! ## 职责
//!
//! 管理一次运行的完整生命周期：初始化、运行、清理。
//!
//! ## 层次关系
//!
//! ```text
//! orchestrator::App (一次命令行调用)
//!     ↓
//! workflow::ExerciseSession (一道练习)
//!     ↓
//! services (能力层：channel / autosave / api_client)
//!     ↓
//! infrastructure (基础设施：Connector)
//! ```

pub mod app;

pub use app::App;
