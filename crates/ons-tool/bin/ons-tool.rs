//! ons-tool binary entry point.
//!
//! Parses arguments, initializes logging and hands off to the library.

use anyhow::Result;
use ons_tool::ToolConfig;

fn main() -> Result<()> {
    let config = ToolConfig::from_args();

    tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(config.default_log_level())),
        )
        .init();

    tracing::debug!(
        "Configuration loaded: archives={}, command={:?}",
        config.archive_path.display(),
        config.command
    );

    config.validate()?;
    ons_tool::run(&config, &mut std::io::stdout().lock())
}
