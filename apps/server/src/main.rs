use anyhow::Context;
use modhub::domain::config::ApiConfig;
use modhub::kernel::config::load_config;
use modhub_logger::{LevelFilter, Logger};
use modhub_server::Server;

#[cfg(feature = "profiling")]
#[global_allocator]
static ALLOC: dhat::Alloc = dhat::Alloc;

#[modhub_runtime::main(high_performance)]
async fn main() -> anyhow::Result<()> {
    #[cfg(feature = "profiling")]
    let _profiler = dhat::Profiler::new_heap();

    let cfg: ApiConfig =
        load_config(Some("server")).context("Critical: Configuration is malformed")?;

    let _log = init_logger(&cfg)?;

    Server::builder().config(cfg).build()?.run().await
}

fn init_logger(cfg: &ApiConfig) -> anyhow::Result<Logger> {
    let logging = &cfg.logging;
    let level: LevelFilter = logging
        .level
        .parse()
        .with_context(|| format!("Invalid logging.level '{}'", logging.level))?;

    let builder = Logger::builder().name(env!("CARGO_PKG_NAME")).level(level);
    let builder = match &logging.env_filter {
        Some(filter) => builder.env_filter(filter),
        None => builder,
    };

    let logger = match &logging.path {
        Some(path) => builder.path(path).json(logging.json).init()?,
        None => builder.init()?,
    };
    Ok(logger)
}
