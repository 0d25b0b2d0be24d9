//! 传输抽象 - 基础设施层
//!
//! 只暴露"建立一条文本帧双工连接"的能力，不认识提交和执行结果

use std::pin::Pin;

use futures::future::BoxFuture;
use futures::{Sink, Stream};
use url::Url;

use crate::error::TransportError;

/// 出站方向：每个 `String` 是一个完整的文本帧
pub type FrameSink = Pin<Box<dyn Sink<String, Error = TransportError> + Send>>;

/// 入站方向：流结束表示连接已断开
pub type FrameStream = Pin<Box<dyn Stream<Item = Result<String, TransportError>> + Send>>;

/// 一条已经建立的连接
pub struct Connection {
    pub sink: FrameSink,
    pub stream: FrameStream,
}

impl Connection {
    pub fn new<Si, St>(sink: Si, stream: St) -> Self
    where
        Si: Sink<String, Error = TransportError> + Send + 'static,
        St: Stream<Item = Result<String, TransportError>> + Send + 'static,
    {
        Self {
            sink: Box::pin(sink),
            stream: Box::pin(stream),
        }
    }
}

/// 连接器
///
/// 每次调用 `connect` 都是一次独立的连接尝试，重试由调用方负责
pub trait Connector: Send + Sync + 'static {
    fn connect(&self, url: &Url) -> BoxFuture<'static, Result<Connection, TransportError>>;
}
