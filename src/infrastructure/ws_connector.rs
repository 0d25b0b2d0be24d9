use futures::future::{self, BoxFuture};
use futures::{SinkExt, StreamExt};
use tokio_tungstenite::tungstenite::client::IntoClientRequest;
use tokio_tungstenite::tungstenite::http::header::COOKIE;
use tokio_tungstenite::tungstenite::http::{HeaderValue, Request};
use tokio_tungstenite::tungstenite::{Error as WsError, Message};
use tracing::{debug, warn};
use url::Url;

use crate::error::TransportError;
use crate::infrastructure::transport::{Connection, Connector};

/// 后端用这个 Cookie 认证 WebSocket 升级请求
pub const AUTH_COOKIE_NAME: &str = "auth_token";

/// 基于 tokio-tungstenite 的连接器
#[derive(Debug, Clone, Default)]
pub struct WsConnector {
    auth_token: Option<String>,
}

impl WsConnector {
    pub fn new(auth_token: Option<String>) -> Self {
        Self { auth_token }
    }

    /// 构建握手请求，携带认证 Cookie
    fn build_request(&self, url: &Url) -> Result<Request<()>, TransportError> {
        let connect_failed = |message: String| TransportError::Connect {
            url: url.to_string(),
            message,
        };

        let mut request = url
            .as_str()
            .into_client_request()
            .map_err(|e| connect_failed(e.to_string()))?;

        if let Some(token) = &self.auth_token {
            let cookie = HeaderValue::from_str(&format!("{}={}", AUTH_COOKIE_NAME, token))
                .map_err(|e| connect_failed(format!("无效的认证令牌: {}", e)))?;
            request.headers_mut().insert(COOKIE, cookie);
        }

        Ok(request)
    }
}

impl Connector for WsConnector {
    fn connect(&self, url: &Url) -> BoxFuture<'static, Result<Connection, TransportError>> {
        let request = self.build_request(url);
        let url = url.to_string();

        Box::pin(async move {
            let (socket, response) = tokio_tungstenite::connect_async(request?)
                .await
                .map_err(|e| TransportError::Connect {
                    url: url.clone(),
                    message: e.to_string(),
                })?;
            debug!("WebSocket 握手完成: {} (状态: {})", url, response.status());

            let (sink, stream) = socket.split();

            let sink = sink
                .with(|text: String| future::ready(Ok::<_, WsError>(Message::text(text))))
                .sink_map_err(|e| TransportError::Send(e.to_string()));

            let stream = stream.filter_map(|message| {
                future::ready(match message {
                    Ok(Message::Text(text)) => Some(Ok(text.as_str().to_owned())),
                    Ok(Message::Binary(bytes)) => {
                        warn!("忽略二进制帧 ({} 字节)", bytes.len());
                        None
                    }
                    Ok(Message::Close(frame)) => {
                        debug!("收到关闭帧: {:?}", frame);
                        None
                    }
                    Ok(_) => None,
                    Err(e) => Some(Err(TransportError::Receive(e.to_string()))),
                })
            });

            Ok(Connection::new(sink, stream))
        })
    }
}
