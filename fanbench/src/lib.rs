pub mod cfg;
pub mod cmd;
pub mod exec;
pub mod http;
pub mod latch;
pub mod logging;
pub mod metrics;
pub mod report;
pub mod runner;
