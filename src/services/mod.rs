pub mod api_client;
pub mod autosave;
pub mod backoff;
pub mod channel;

pub use api_client::ApiClient;
pub use autosave::{Autosaver, SubmissionStore};
pub use backoff::Backoff;
pub use channel::{ChannelState, SubmissionChannel};
