pub mod transport;
pub mod ws_connector;

pub use transport::{Connection, Connector, FrameSink, FrameStream};
pub use ws_connector::{WsConnector, AUTH_COOKIE_NAME};
