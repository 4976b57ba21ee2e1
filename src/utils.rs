// Third Party
use chrono::{DateTime, Utc};
use signal_hook::{
    consts::{SIGINT, SIGTERM},
    iterator::Signals,
};
use tracing::{info, Level};
use tracing_subscriber::EnvFilter;

/// Rendered in place of any value the event does not carry.
pub const NO_INFO: &str = "no info";

const TIMESTAMP_FORMAT: &str = "%d/%m/%Y %H:%M:%S %Z";

/// Initialize the tracing subscriber, logging to stdout.
/// `RUST_LOG` takes precedence over `level` when it is set.
pub fn init_tracing(crate_name: &str, level: Level) {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| {
        EnvFilter::new(format!(
            "{}={}",
            crate_name,
            level.to_string().to_lowercase()
        ))
    });
    // A subscriber may already be installed, e.g. by a test harness
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stdout)
        .try_init();
}

/// Exit cleanly on SIGINT and SIGTERM. Nothing is queued beyond the in-flight event, so there is
/// nothing to drain.
pub fn setup_exit_hooks() -> std::io::Result<()> {
    let mut signals = Signals::new([SIGINT, SIGTERM])?;
    std::thread::spawn(move || {
        if let Some(signal) = signals.forever().next() {
            info!("Received signal {}, shutting down", signal);
            std::process::exit(0);
        }
    });
    Ok(())
}

/// Format a timestamp as day/month/year hour:minute:second in its zone, or the placeholder.
pub fn render_timestamp(timestamp: Option<&DateTime<Utc>>) -> String {
    match timestamp {
        Some(timestamp) => timestamp.format(TIMESTAMP_FORMAT).to_string(),
        None => NO_INFO.to_string(),
    }
}

/// Render an optional field, falling back to the placeholder.
pub fn or_no_info<T: ToString>(value: Option<T>) -> String {
    value
        .map(|value| value.to_string())
        .unwrap_or_else(|| NO_INFO.to_string())
}

#[cfg(test)]
mod tests {
    use chrono::TimeZone;

    use super::*;

    #[test]
    fn test_render_timestamp() {
        let timestamp = Utc.with_ymd_and_hms(2023, 9, 4, 13, 5, 9).unwrap();
        assert_eq!(render_timestamp(Some(&timestamp)), "04/09/2023 13:05:09 UTC");
        assert_eq!(render_timestamp(None), NO_INFO);
    }

    #[test]
    fn test_or_no_info() {
        assert_eq!(or_no_info(Some(4)), "4");
        assert_eq!(or_no_info(None::<&str>), NO_INFO);
    }
}
