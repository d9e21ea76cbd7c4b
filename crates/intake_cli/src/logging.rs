use std::path::Path;

use color_eyre::Result;
use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter, Layer};

pub const LOG_FILE: &str = "intake.log";

/// Console (stderr) and file logging. Keep the returned guard alive until
/// exit or buffered file lines are lost.
pub fn init(data_dir: &Path, flag: Option<&str>, configured: &str) -> Result<WorkerGuard> {
    crate::config::ensure_data_dir_exists(data_dir)?;

    let file_appender = tracing_appender::rolling::never(data_dir, LOG_FILE);
    let (non_blocking, guard) = tracing_appender::non_blocking(file_appender);

    let env = std::env::var(EnvFilter::DEFAULT_ENV).ok();
    let selected = directive(flag, env.as_deref(), configured);
    let filter = || EnvFilter::try_new(selected);

    let file_layer = fmt::Layer::default()
        .with_target(false)
        .with_ansi(false)
        .with_writer(non_blocking)
        .with_filter(filter()?);

    let console_layer = fmt::Layer::default()
        .with_target(false)
        .with_writer(std::io::stderr)
        .with_filter(filter()?);

    tracing_subscriber::registry()
        .with(file_layer)
        .with(console_layer)
        .try_init()?;

    Ok(guard)
}

/// `--log-level` first, then `RUST_LOG`, then the configured level.
fn directive<'a>(flag: Option<&'a str>, env: Option<&'a str>, configured: &'a str) -> &'a str {
    flag.or(env.filter(|e| !e.trim().is_empty()))
        .unwrap_or(configured)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn flag_beats_env_beats_config() {
        assert_eq!(directive(Some("trace"), Some("warn"), "info"), "trace");
        assert_eq!(directive(None, Some("warn"), "info"), "warn");
        assert_eq!(directive(None, Some(" "), "info"), "info");
        assert_eq!(directive(None, None, "info"), "info");
    }
}
