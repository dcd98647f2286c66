//! Logging initialization
//!
//! Provides standardized tracing setup for the workspace's command-line tools.

use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use crate::level::LogLevel;

/// Initialize tracing/logging for a command-line tool
///
/// Sets up logging to stderr with:
/// - Formatted output without ANSI colors (for clean logs)
/// - Environment-based filtering via RUST_LOG
/// - The requested level applied to the specified crate
///
/// Set `LOG_FORMAT=json` for structured JSON output (useful for log aggregation).
/// Default is human-readable text output.
///
/// # Arguments
///
/// * `crate_name` - The name of the tool's library crate (e.g., "github_milestones")
/// * `level` - Log level selected on the command line
///
/// # Example
///
/// ```rust,ignore
/// cli_common::init_tracing("my_tool", cli_common::LogLevel::Info)?;
/// ```
pub fn init_tracing(crate_name: &str, level: LogLevel) -> anyhow::Result<()> {
    let mut filter = EnvFilter::from_default_env();
    for directive in directives(crate_name, level) {
        filter = filter.add_directive(directive.parse()?);
    }

    let use_json = std::env::var("LOG_FORMAT")
        .map(|v| v.eq_ignore_ascii_case("json"))
        .unwrap_or(false);

    let registry = tracing_subscriber::registry().with(filter);

    if use_json {
        registry
            .with(
                tracing_subscriber::fmt::layer()
                    .json()
                    .with_writer(std::io::stderr),
            )
            .try_init()?;
    } else {
        registry
            .with(
                tracing_subscriber::fmt::layer()
                    .with_writer(std::io::stderr)
                    .with_ansi(false),
            )
            .try_init()?;
    }

    tracing::trace!(level = %level, "Logging subsystem initialized");

    Ok(())
}

/// Filter directives applying `level` to the tool crate and to this crate
fn directives(crate_name: &str, level: LogLevel) -> Vec<String> {
    let mut directives = vec![level.directive(crate_name)];
    if crate_name != env!("CARGO_CRATE_NAME") {
        directives.push(level.directive(env!("CARGO_CRATE_NAME")));
    }
    directives
}
