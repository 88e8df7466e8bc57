use core::error::Error;
use std::sync::Arc;

use clap::Parser;
use fanbench::{
    cfg::Config,
    cmd::Cmd,
    exec::Executor,
    metrics::ProcessMetrics,
    runner,
};

pub fn main() {
    let cmd = Cmd::parse();
    fanbench::logging::init(cmd.verbose as usize).unwrap();

    if let Err(err) = run(cmd) {
        eprintln!("ERROR: {err}");
        std::process::exit(1);
    }
}

fn run(cmd: Cmd) -> Result<(), Box<dyn Error>> {
    let cfg: Config = cmd.try_into()?;

    println!("Running benchmarks with {} HTTP requests...", cfg.total_requests);
    println!();

    let client = Arc::new(reqwest::Client::builder().build()?);
    let metrics = ProcessMetrics::new();

    let exec = Executor::bounded_pool(cfg.concurrency)?;
    let report = runner::run("bounded thread pool", exec, &cfg, client.clone(), &metrics);
    println!("{report}");
    println!();

    let exec = Executor::unbounded()?;
    let report = runner::run("unbounded tasks", exec, &cfg, client, &metrics);
    println!("{report}");

    Ok(())
}
