//! Progress bars and log-only progress reporting.
//!
//! Bars are drawn on stderr for interactive runs. With `--log-only` they are
//! hidden and periodic progress lines go through `tracing` instead, which
//! keeps output tail-friendly.

use indicatif::{ProgressBar, ProgressDrawTarget, ProgressStyle};
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Duration;
use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

/// Global flag for log-only mode (set from args in main)
pub static LOG_ONLY: AtomicBool = AtomicBool::new(false);

pub fn set_log_only(value: bool) {
    LOG_ONLY.store(value, Ordering::Relaxed);
}

pub fn is_log_only() -> bool {
    LOG_ONLY.load(Ordering::Relaxed)
}

/// Install the stderr `tracing` subscriber. `RUST_LOG` overrides the default filter.
pub fn init_tracing() {
    tracing_subscriber::registry()
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| {
            "lyrics_reconcile=info,lyrics_match=info,lyrics_import=info".into()
        }))
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();
}

/// Format duration in human-readable format
pub fn format_duration(d: Duration) -> String {
    let secs = d.as_secs_f64();
    if secs < 60.0 {
        format!("{:.1}s", secs)
    } else {
        format!("{:.1}m", secs / 60.0)
    }
}

/// Progress bar with the crate's styling; hidden in log-only mode.
pub fn create_progress_bar(len: u64, msg: &str) -> ProgressBar {
    let pb = ProgressBar::new(len);
    if is_log_only() {
        pb.set_draw_target(ProgressDrawTarget::hidden());
        return with_message(pb, msg);
    }
    match ProgressStyle::default_bar()
        .template(
            "{msg} [{elapsed_precise}] [{bar:40.cyan/blue}] {pos}/{len} ({per_sec}, ETA: {eta})",
        )
    {
        Ok(style) => pb.set_style(style.progress_chars("=> ")),
        Err(e) => tracing::debug!("Falling back to default bar style: {}", e),
    }
    with_message(pb, msg)
}

/// Spinner for phases without a known length; hidden in log-only mode.
pub fn create_spinner(msg: &str) -> ProgressBar {
    let pb = ProgressBar::new_spinner();
    if is_log_only() {
        pb.set_draw_target(ProgressDrawTarget::hidden());
        info!("{}", msg);
        return with_message(pb, msg);
    }
    if let Ok(style) =
        ProgressStyle::default_spinner().template("{msg} {spinner} [{elapsed_precise}]")
    {
        pb.set_style(style);
    }
    pb.enable_steady_tick(Duration::from_millis(100));
    with_message(pb, msg)
}

fn with_message(pb: ProgressBar, msg: &str) -> ProgressBar {
    pb.set_message(msg.to_string());
    pb
}

/// Log progress every `interval` items (and at the end), in log-only mode only.
pub fn log_progress(phase: &str, current: u64, total: u64, interval: u64) {
    if !is_log_only() || total == 0 {
        return;
    }
    if current % interval.max(1) == 0 || current == total {
        let pct = 100.0 * current as f64 / total as f64;
        info!("[{}] {}/{} ({:.1}%)", phase, current, total, pct);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_format_duration() {
        assert_eq!(format_duration(Duration::from_millis(1500)), "1.5s");
        assert_eq!(format_duration(Duration::from_secs(90)), "1.5m");
    }

    #[test]
    fn test_log_progress_tolerates_zero() {
        log_progress("match", 0, 0, 0);
        log_progress("match", 1, 1, 0);
    }
}
