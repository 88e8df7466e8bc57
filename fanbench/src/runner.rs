use core::time::Duration;
use std::{sync::Arc, time::Instant};

use reqwest::Url;

use crate::{
    cfg::Config,
    exec::{Executor, Job},
    http::{Fetch, FetchError},
    latch::Latch,
    metrics::Collect,
    report::Report,
};

/// Runs one strategy to completion and derives its report.
///
/// Dispatches `total_requests` jobs, blocks until every one of them has
/// signaled the latch (success or failure alike), then closes the executor.
/// Individual fetch failures never abort the run; the only unrecoverable
/// condition is a latch that never reaches zero, which hangs here — no
/// internal deadline is imposed.
pub fn run<C>(label: &str, mut exec: Executor, cfg: &Config, client: Arc<dyn Fetch>, metrics: &C) -> Report
where
    C: Collect,
{
    log::debug!("benchmarking '{label}' against {}", cfg.target_url);

    let before = metrics.snapshot();
    let latch = Latch::new(cfg.total_requests);

    let start = Instant::now();
    for _ in 0..cfg.total_requests {
        let job = job(client.clone(), cfg.target_url.clone(), cfg.request_timeout, &latch);
        exec.submit(job);
    }
    latch.wait();
    let elapsed = start.elapsed();

    exec.close();
    let after = metrics.snapshot();

    Report::new(label, elapsed, &before, &after)
}

/// One unit of benchmarked work: a single GET plus completion signaling.
fn job(client: Arc<dyn Fetch>, url: Url, timeout: Duration, latch: &Latch) -> Job {
    let guard = latch.guard();

    Box::pin(async move {
        // Counts the latch down on every exit path of this job.
        let _guard = guard;

        // Failures are part of the measured workload, not errors to surface.
        let _outcome: Result<u16, FetchError> = client.fetch(&url, timeout).await;
    })
}
