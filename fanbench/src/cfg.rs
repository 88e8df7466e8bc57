use core::{num::NonZero, time::Duration};

use reqwest::Url;
use thiserror::Error;

use crate::cmd::Cmd;

/// Validated benchmark config, immutable for the run.
#[derive(Debug, Clone)]
pub struct Config {
    /// Number of requests issued per strategy.
    pub total_requests: u64,
    /// Target endpoint.
    pub target_url: Url,
    /// Per-request timeout.
    pub request_timeout: Duration,
    /// Worker count of the bounded pool strategy.
    pub concurrency: NonZero<usize>,
}

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("number of requests must be positive")]
    ZeroRequests,
    #[error("concurrency must be positive")]
    ZeroConcurrency,
    #[error("invalid target URL: {0}")]
    InvalidUrl(String),
}

impl TryFrom<Cmd> for Config {
    type Error = ConfigError;

    fn try_from(v: Cmd) -> Result<Self, Self::Error> {
        let Cmd {
            requests,
            url,
            timeout,
            concurrency,
            verbose: _,
        } = v;

        if requests == 0 {
            return Err(ConfigError::ZeroRequests);
        }
        let concurrency = NonZero::new(concurrency).ok_or(ConfigError::ZeroConcurrency)?;
        let target_url = Url::parse(&url).map_err(|err| ConfigError::InvalidUrl(err.to_string()))?;

        let m = Self {
            total_requests: requests,
            target_url,
            request_timeout: Duration::from_secs(timeout),
            concurrency,
        };

        Ok(m)
    }
}
