use anyhow::{Result, anyhow};
use tracing_subscriber::EnvFilter;

use crate::{Args, OutputFormat};

/// Used when `RUST_LOG` is unset, so that fallbacks such as a guessed
/// evaluation column are still reported.
const DEFAULT_LOG_DIRECTIVE: &str = "cocoviz=warn";

fn env_filter() -> EnvFilter {
    EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(DEFAULT_LOG_DIRECTIVE))
}

/// Installs the global subscriber. Logs always go to stderr since stdout
/// carries the profiles.
pub fn setup_logging(args: &Args) -> Result<()> {
    let builder = tracing_subscriber::FmtSubscriber::builder()
        .with_writer(std::io::stderr)
        .with_env_filter(env_filter());
    match args.format {
        OutputFormat::Jsonl => tracing::subscriber::set_global_default(builder.json().finish())
            .map_err(|e| anyhow!("Failed to initialize tracing: {e}")),
        OutputFormat::Pretty => {
            tracing::subscriber::set_global_default(builder.with_target(false).finish())
                .map_err(|e| anyhow!("Failed to initialize tracing: {e}"))
        }
    }
}
