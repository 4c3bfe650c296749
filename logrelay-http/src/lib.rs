//! HTTP transport for `logrelay` submissions.
//!
//! [`HttpTransport`] posts every submission as a single `application/json` request.
//!
//! ```rust,no_run
//! use logrelay::Hub;
//! use logrelay_http::HttpTransport;
//!
//! # fn main() -> Result<(), Box<dyn std::error::Error>> {
//! let hub = Hub::builder()
//!     .transport(HttpTransport::new()?)
//!     .submit_url("http://127.0.0.1:8080/log")
//!     .build();
//! # Ok(())
//! # }
//! ```
//!
//! Only plain `http` endpoints are supported out of the box. Enable one of the TLS features of `reqwest` in the
//! application to submit over `https`.

#![forbid(unsafe_code)]

use std::thread;
use std::time::Duration;

use logrelay::submit::{Delivery, Transport, TransportError};
use reqwest::blocking::{Client, Response};
use reqwest::header::CONTENT_TYPE;

/// How long a request may take unless configured otherwise.
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(30);

/// Errors of the HTTP transport.
#[derive(thiserror::Error, Debug)]
pub enum HttpError {
    /// The HTTP client could not be created.
    #[error("failed to build HTTP client")]
    Client(#[source] reqwest::Error),

    /// No thread could be started to carry out the request.
    #[error("failed to spawn request thread")]
    Spawn(#[source] std::io::Error),

    /// The request failed or the endpoint answered with an error status.
    #[error("request failed")]
    Request(#[source] reqwest::Error),

    /// The thread carrying out the request panicked.
    #[error("request thread panicked")]
    Panicked,
}

/// Submits entries with HTTP `POST` requests.
///
/// Every request runs on its own thread.
/// [`Delivery::Background`] returns as soon as the request is started and reports failures through `tracing`;
/// [`Delivery::Blocking`] waits for the response and fails on error statuses.
#[derive(Debug, Clone)]
pub struct HttpTransport {
    client: Client,
}

impl HttpTransport {
    /// Creates a transport whose requests time out after [`DEFAULT_TIMEOUT`].
    ///
    /// # Errors
    ///
    /// Fails if the HTTP client cannot be initialized.
    pub fn new() -> Result<Self, HttpError> {
        Self::with_timeout(DEFAULT_TIMEOUT)
    }

    /// Creates a transport whose requests time out after `timeout`.
    ///
    /// # Errors
    ///
    /// Fails if the HTTP client cannot be initialized.
    pub fn with_timeout(timeout: Duration) -> Result<Self, HttpError> {
        let client = Client::builder()
            .timeout(timeout)
            .build()
            .map_err(HttpError::Client)?;

        Ok(Self::from_client(client))
    }

    /// Creates a transport using a preconfigured client.
    pub fn from_client(client: Client) -> Self {
        Self { client }
    }
}

impl Transport for HttpTransport {
    fn send(&self, endpoint: &str, body: String, delivery: Delivery) -> Result<(), TransportError> {
        let request = self
            .client
            .post(endpoint)
            .header(CONTENT_TYPE, "application/json")
            .body(body);
        let endpoint = endpoint.to_owned();

        let request = thread::Builder::new()
            .name("logrelay-http".into())
            .spawn(move || {
                let result = request
                    .send()
                    .and_then(Response::error_for_status)
                    .map(drop);

                match &result {
                    Ok(()) => tracing::trace!(%endpoint, ?delivery, "log submission delivered"),
                    Err(error) if delivery == Delivery::Background => {
                        tracing::warn!(?error, %endpoint, "background log submission failed");
                    }
                    Err(_) => {}
                }
                result
            })
            .map_err(|error| TransportError::new(HttpError::Spawn(error)))?;

        match delivery {
            Delivery::Background => Ok(()),
            Delivery::Blocking => request
                .join()
                .map_err(|_| TransportError::new(HttpError::Panicked))?
                .map_err(|error| TransportError::new(HttpError::Request(error))),
        }
    }
}
