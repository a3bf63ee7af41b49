use crate::{FetchError, Result, TransportError};
use std::{collections::HashMap, time::Duration};

use futures::future::BoxFuture;
use reqwest::header::{HeaderMap, HeaderName, HeaderValue};
use url::Url;

const DEFAULT_USER_AGENT: &str = concat!("json-fetch/", env!("CARGO_PKG_VERSION"));

/// Transport used by the fetcher. One call is one GET; implementations must
/// not retry or rewrite the request.
pub trait HttpClient: Send + Sync {
    fn request(
        &self,
        request: HttpRequest,
    ) -> BoxFuture<'_, std::result::Result<HttpResponse, TransportError>>;
}

#[derive(Debug, Clone)]
pub struct HttpRequest {
    pub url: Url,
    pub headers: HashMap<String, String>,
}

impl HttpRequest {
    pub fn get(url: Url) -> Self {
        Self {
            url,
            headers: HashMap::new(),
        }
    }

    pub fn with_header<N: Into<String>, V: Into<String>>(mut self, name: N, value: V) -> Self {
        self.headers.insert(name.into(), value.into());
        self
    }
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct HttpResponse {
    /// `None` when the transport handed back something that is not an HTTP response.
    pub status: Option<u16>,
    pub body: Option<Vec<u8>>,
}

/// Settings for the reqwest-backed transport. Deadlines belong here, the
/// fetcher itself never times out.
#[derive(Debug, Clone)]
pub struct ClientOptions {
    pub user_agent: String,
    pub timeout: Option<Duration>,
    pub connect_timeout: Option<Duration>,
}

impl Default for ClientOptions {
    fn default() -> Self {
        Self {
            user_agent: DEFAULT_USER_AGENT.to_string(),
            timeout: None,
            connect_timeout: None,
        }
    }
}

impl ClientOptions {
    pub fn with_user_agent(mut self, user_agent: String) -> Self {
        self.user_agent = user_agent;
        self
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = Some(timeout);
        self
    }

    pub fn with_connect_timeout(mut self, connect_timeout: Duration) -> Self {
        self.connect_timeout = Some(connect_timeout);
        self
    }
}

pub struct ReqwestClient {
    inner: reqwest::Client,
}

impl ReqwestClient {
    pub fn new() -> Result<Self> {
        Self::with_options(ClientOptions::default())
    }

    pub fn with_options(options: ClientOptions) -> Result<Self> {
        let mut builder = reqwest::Client::builder().user_agent(options.user_agent);
        if let Some(timeout) = options.timeout {
            builder = builder.timeout(timeout);
        }
        if let Some(connect_timeout) = options.connect_timeout {
            builder = builder.connect_timeout(connect_timeout);
        }

        let inner = builder
            .build()
            .map_err(|err| FetchError::Transport(Box::new(err)))?;
        Ok(Self { inner })
    }

    /// Wrap an already configured reqwest client.
    pub fn from_reqwest(inner: reqwest::Client) -> Self {
        Self { inner }
    }

    pub fn client(&self) -> &reqwest::Client {
        &self.inner
    }

    async fn get(&self, request: HttpRequest) -> std::result::Result<HttpResponse, TransportError> {
        let mut headers = HeaderMap::new();
        for (name, value) in &request.headers {
            headers.insert(
                HeaderName::from_bytes(name.as_bytes())?,
                HeaderValue::from_str(value)?,
            );
        }

        let response = self.inner.get(request.url).headers(headers).send().await?;
        let status = response.status().as_u16();

        // Note: the whole body is buffered, no streaming
        let body = response.bytes().await?;

        Ok(HttpResponse {
            status: Some(status),
            body: if body.is_empty() {
                None
            } else {
                Some(body.to_vec())
            },
        })
    }
}

impl HttpClient for ReqwestClient {
    fn request(
        &self,
        request: HttpRequest,
    ) -> BoxFuture<'_, std::result::Result<HttpResponse, TransportError>> {
        Box::pin(self.get(request))
    }
}
