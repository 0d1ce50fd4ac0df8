use anyhow::Context;
use silo_kernel::config::load_config;
use silo_kernel::domain::config::{ApiConfig, LoggingConfig};
use silo_logger::{LevelFilter, Logger};
use silo_server::Server;

#[silo_runtime::main(cooperative)]
async fn main() -> anyhow::Result<()> {
    let cfg: ApiConfig =
        load_config(Some("server")).context("Critical: Configuration is malformed")?;

    let _log = init_logger(&cfg.logging)?;

    Server::builder().config(cfg).build().await?.run().await
}

fn init_logger(cfg: &LoggingConfig) -> anyhow::Result<Logger> {
    let level = cfg
        .level
        .parse::<LevelFilter>()
        .with_context(|| format!("Invalid logging.level '{}'", cfg.level))?;

    let builder = Logger::builder().name(env!("CARGO_PKG_NAME")).level(level);
    let logger = match &cfg.path {
        Some(path) => builder.path(path.clone()).json(cfg.json).init()?,
        None => builder.init()?,
    };

    Ok(logger)
}
