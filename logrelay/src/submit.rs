//! Submission of buffered entries to a remote endpoint.
//!
//! The hub turns a batch of entries into one request body (a JSON array of `{timestamp, level, message}` records,
//! run through the hub's [`Serializer`][crate::format::Serializer]) and hands it to a [`Transport`].
//! Submissions are never retried by the hub.
//!
//! # Examples
//!
//! ```rust
//! use logrelay::submit::{Delivery, Transport, TransportError};
//!
//! #[derive(Debug)]
//! struct StdoutTransport;
//!
//! impl Transport for StdoutTransport {
//!     fn send(&self, endpoint: &str, body: String, _: Delivery) -> Result<(), TransportError> {
//!         println!("POST {endpoint}\n{body}");
//!         Ok(())
//!     }
//! }
//!
//! let hub = logrelay::Hub::builder()
//!     .transport(StdoutTransport)
//!     .submit_url("https://logs.example.com/ingest")
//!     .build();
//!
//! assert!(hub.submit(&hub.get("*", None), Delivery::Background));
//! ```

use std::error::Error;
use std::fmt::{self, Debug};

/// How a submission is carried out.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash)]
pub enum Delivery {
    /// Fire and forget: the request is started, its completion is not awaited.
    Background,
    /// The request has completed (or failed) when `send` returns.
    ///
    /// Used at teardown, where nothing started in the background is guaranteed to finish.
    Blocking,
}

/// Carries a serialized batch of entries to an endpoint.
pub trait Transport: Debug + Send + Sync {
    /// Sends `body` as a single request to `endpoint`.
    ///
    /// For [`Delivery::Background`] success means the request was started, for [`Delivery::Blocking`] that it was
    /// completed successfully.
    fn send(&self, endpoint: &str, body: String, delivery: Delivery) -> Result<(), TransportError>;
}

/// A transport failed to open or send a request.
#[derive(Debug)]
pub struct TransportError(Box<dyn Error + Send + Sync>);

impl TransportError {
    /// Wraps an underlying error or message.
    pub fn new(error: impl Into<Box<dyn Error + Send + Sync>>) -> Self {
        Self(error.into())
    }
}

impl fmt::Display for TransportError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Display::fmt(&self.0, f)
    }
}

impl Error for TransportError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        self.0.source()
    }
}

/// The transport of a hub that was built without one; every send fails.
#[derive(Debug, Default, Copy, Clone)]
pub struct NoTransport;

impl Transport for NoTransport {
    fn send(&self, endpoint: &str, _: String, _: Delivery) -> Result<(), TransportError> {
        Err(TransportError::new(format!(
            "no transport configured to reach `{endpoint}`"
        )))
    }
}

/// Errors that can occur when submitting entries.
#[derive(thiserror::Error, Debug)]
pub enum SubmitError {
    /// Neither the caller nor the hub config names an endpoint.
    #[error("no submission endpoint configured")]
    NoEndpoint,

    /// The entries could not be converted into a payload.
    #[error("failed to serialize entries")]
    Serialize(#[source] serde_json::Error),

    /// The transport reported a failure.
    #[error("failed to submit to `{endpoint}`")]
    Transport {
        /// The endpoint the request was meant for.
        endpoint: String,
        /// The underlying failure.
        #[source]
        source: TransportError,
    },
}
