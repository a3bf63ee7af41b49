use crate::{
    decode::{Decoder, JsonDecoder},
    dispatch::Dispatcher,
    http::{HttpClient, HttpRequest, ReqwestClient},
    FetchError, Result,
};
use std::ops::RangeInclusive;

use serde::de::DeserializeOwned;
use url::Url;

const SUCCESS_STATUS: RangeInclusive<u16> = 200..=299;

/// Fetches a URL with a single GET and decodes the body into `T`.
///
/// Holds no per-request state, so one fetcher can serve any number of
/// concurrent calls. Nothing is retried: every call yields exactly one outcome.
pub struct Fetcher<C = ReqwestClient, D = JsonDecoder> {
    transport: C,
    decoder: D,
}

impl Fetcher {
    /// Fetcher backed by a default reqwest client and the JSON decoder.
    pub fn new() -> Result<Self> {
        Ok(Self::with_transport(ReqwestClient::new()?))
    }
}

impl<C: HttpClient> Fetcher<C, JsonDecoder> {
    pub fn with_transport(transport: C) -> Self {
        Self {
            transport,
            decoder: JsonDecoder,
        }
    }
}

impl<C: HttpClient, D: Decoder> Fetcher<C, D> {
    pub fn with_decoder<D2: Decoder>(self, decoder: D2) -> Fetcher<C, D2> {
        Fetcher {
            transport: self.transport,
            decoder,
        }
    }

    pub fn transport(&self) -> &C {
        &self.transport
    }

    pub fn decoder(&self) -> &D {
        &self.decoder
    }

    pub async fn fetch<T>(&self, url: &str) -> Result<T>
    where
        T: DeserializeOwned,
    {
        let parsed = Url::parse(url).map_err(|source| {
            log::warn!("Malformed URL '{}': {}", url, source);
            FetchError::MalformedUrl {
                url: url.to_string(),
                source,
            }
        })?;

        log::debug!("GET {}", parsed);
        let request = HttpRequest::get(parsed.clone()).with_header("Accept", "application/json");
        let response = self.transport.request(request).await.map_err(|err| {
            log::warn!("GET {} failed: {}", parsed, err);
            FetchError::Transport(err)
        })?;

        let Some(status) = response.status else {
            log::warn!("GET {} returned no HTTP response", parsed);
            return Err(FetchError::InvalidResponse);
        };

        // Status is checked before the body: an error status without a body is
        // still reported as an unsuccessful status.
        if !SUCCESS_STATUS.contains(&status) {
            log::warn!("GET {} returned status {}", parsed, status);
            return Err(FetchError::UnsuccessfulStatus(status));
        }

        let Some(body) = response.body else {
            log::warn!("GET {} returned status {} without a body", parsed, status);
            return Err(FetchError::InvalidResponse);
        };

        match self.decoder.decode::<T>(&body) {
            Ok(value) => {
                log::debug!("GET {} decoded {} bytes", parsed, body.len());
                Ok(value)
            }
            Err(err) => {
                log::warn!("Failed to decode response from {}: {:?}", parsed, err);
                Err(FetchError::DecodeFailure(err.to_string()))
            }
        }
    }

    /// Callback flavour of [`Fetcher::fetch`]: the outcome is handed to
    /// `completion` exactly once, on the context behind `dispatcher`.
    pub async fn fetch_with<T, X, F>(&self, url: &str, dispatcher: &X, completion: F)
    where
        T: DeserializeOwned + Send + 'static,
        X: Dispatcher + ?Sized,
        F: FnOnce(Result<T>) + Send + 'static,
    {
        let outcome = self.fetch::<T>(url).await;
        dispatcher.dispatch(Box::new(move || completion(outcome)));
    }
}
