use core::{future::Future, pin::Pin, time::Duration};

use reqwest::Url;
use thiserror::Error;

/// Boxed future returned by [`Fetch::fetch`].
pub type FetchFuture<'a> = Pin<Box<dyn Future<Output = Result<u16, FetchError>> + Send + 'a>>;

/// Why a single fetch did not succeed.
///
/// Inside a benchmark job this outcome is deliberately discarded: failures
/// are part of the measured workload, not errors to report.
#[derive(Debug, Error)]
pub enum FetchError {
    #[error("request timed out")]
    Timeout,
    #[error("transport error: {0}")]
    Transport(String),
    #[error("unexpected status: {0}")]
    Status(u16),
}

/// Outbound HTTP GET capability.
///
/// One implementation hits the network; tests substitute deterministic
/// fakes. Implementations must be shareable across all concurrent jobs.
pub trait Fetch: Send + Sync {
    /// Issues one GET request, draining and discarding the response body.
    ///
    /// Returns the status code on 2xx, an error otherwise.
    fn fetch<'a>(&'a self, url: &'a Url, timeout: Duration) -> FetchFuture<'a>;
}

impl Fetch for reqwest::Client {
    fn fetch<'a>(&'a self, url: &'a Url, timeout: Duration) -> FetchFuture<'a> {
        Box::pin(async move {
            let resp = self
                .get(url.clone())
                .timeout(timeout)
                .send()
                .await
                .map_err(classify)?;

            let status = resp.status().as_u16();
            resp.bytes().await.map_err(classify)?;

            if !(200..300).contains(&status) {
                return Err(FetchError::Status(status));
            }

            Ok(status)
        })
    }
}

fn classify(err: reqwest::Error) -> FetchError {
    if err.is_timeout() {
        FetchError::Timeout
    } else {
        FetchError::Transport(err.to_string())
    }
}
