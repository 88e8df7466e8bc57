use clap::{ArgAction, Parser};

/// Default number of requests issued per strategy.
pub const DEFAULT_TOTAL_REQUESTS: u64 = 1000;

/// Default target endpoint.
pub const DEFAULT_URL: &str = "https://httpbin.org/get";

/// Measures a fixed pool of OS worker threads against unbounded lightweight
/// tasks by fanning out many concurrent HTTP GET requests through each.
#[derive(Debug, Clone, Parser)]
#[command(version, about)]
pub struct Cmd {
    /// Number of requests to issue per strategy.
    #[clap(short = 'n', long, default_value_t = DEFAULT_TOTAL_REQUESTS)]
    pub requests: u64,
    /// Target URL.
    ///
    /// Treated as a black box with variable latency; the response body is
    /// discarded.
    #[clap(long, default_value = DEFAULT_URL)]
    pub url: String,
    /// Per-request timeout, in seconds.
    #[clap(long, default_value_t = 10)]
    pub timeout: u64,
    /// Worker count of the bounded pool strategy.
    ///
    /// This also limits the maximum concurrent requests in flight for that
    /// strategy. The unbounded strategy ignores it.
    #[clap(short, long, default_value_t = 100)]
    pub concurrency: usize,
    /// Be verbose in terms of logging.
    #[clap(short, action = ArgAction::Count)]
    pub verbose: u8,
}
