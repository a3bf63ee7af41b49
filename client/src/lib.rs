pub use crate::decode::{DecodeError, Decoder, JsonDecoder};
pub use crate::dispatch::{Dispatcher, Immediate, Job, MainQueue, MainQueueHandle};
pub use crate::fetcher::Fetcher;
pub use crate::http::{ClientOptions, HttpClient, HttpRequest, HttpResponse, ReqwestClient};

pub mod decode;
pub mod dispatch;
pub mod fetcher;
pub mod http;

/// Error surfaced by the transport layer, passed through to callers untouched.
pub type TransportError = Box<dyn std::error::Error + Send + Sync>;

#[derive(Debug, thiserror::Error)]
pub enum FetchError {
    #[error("Malformed URL '{url}': {source}")]
    MalformedUrl {
        url: String,
        #[source]
        source: url::ParseError,
    },
    #[error("Invalid response")]
    InvalidResponse,
    #[error("Unsuccessful status code: {0}")]
    UnsuccessfulStatus(u16),
    #[error("Decoding failed: {0}")]
    DecodeFailure(String),
    #[error(transparent)]
    Transport(TransportError),
}

pub type Result<T> = std::result::Result<T, FetchError>;
