//! Outbound gateway calls
//!
//! Every resolved action is a plain HTTP GET. Delivery is best effort: a
//! failed call is reported to the caller, which logs it and moves on. There
//! is no retry.

use crate::config::Config;
use reqwest::blocking::Client;
use std::time::Duration;
use thiserror::Error;

/// Error type for a single gateway call
#[derive(Debug, Error)]
pub enum DispatchError {
    /// Request could not be built or sent
    #[error("request failed: {0}")]
    Request(#[from] reqwest::Error),
    /// Nothing accepted the connection at the gateway address
    #[error("gateway unreachable at {0}")]
    Unreachable(String),
    /// Gateway answered with a non-success status
    #[error("gateway returned {status} for {url}")]
    Status { status: u16, url: String },
}

impl DispatchError {
    /// True when the gateway never answered.
    ///
    /// A `Status` error means the request was delivered and rejected.
    pub fn is_transport(&self) -> bool {
        !matches!(self, Self::Status { .. })
    }
}

/// Executes resolved action URLs
pub trait Dispatcher {
    fn send(&self, url: &str) -> Result<(), DispatchError>;
}

impl<D: Dispatcher + ?Sized> Dispatcher for &D {
    fn send(&self, url: &str) -> Result<(), DispatchError> {
        (**self).send(url)
    }
}

/// Dispatcher backed by a blocking HTTP client
#[derive(Debug, Clone)]
pub struct HttpDispatcher {
    client: Client,
}

impl HttpDispatcher {
    pub fn new(timeout: Duration) -> Result<Self, DispatchError> {
        let client = Client::builder()
            .timeout(timeout)
            .user_agent(concat!("button-bridge/", env!("CARGO_PKG_VERSION")))
            .build()?;
        Ok(Self { client })
    }

    /// Build a dispatcher using the config's request timeout
    pub fn from_config(config: &Config) -> Result<Self, DispatchError> {
        Self::new(config.request_timeout())
    }
}

impl Dispatcher for HttpDispatcher {
    fn send(&self, url: &str) -> Result<(), DispatchError> {
        let response = self.client.get(url).send().map_err(|e| {
            if e.is_connect() {
                DispatchError::Unreachable(url.to_string())
            } else {
                DispatchError::Request(e)
            }
        })?;
        let status = response.status();
        if !status.is_success() {
            return Err(DispatchError::Status {
                status: status.as_u16(),
                url: url.to_string(),
            });
        }
        Ok(())
    }
}
