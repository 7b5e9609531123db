//! Transfer progress: tracing events plus an optional indicatif bar.

use indicatif::{ProgressBar, ProgressStyle};

/// `done * 100 / total`, an empty transfer counts as complete.
pub fn percent(done: u64, total: u64) -> u64 {
    if total == 0 {
        return 100;
    }
    (done.min(total) as u128 * 100 / total as u128) as u64
}

/// Byte-counting bar in the style used for layer downloads.
pub fn transfer_bar(total: u64, message: String) -> ProgressBar {
    let bar = ProgressBar::new(total);
    if let Ok(style) = ProgressStyle::default_bar().template(
        "{msg} [{elapsed_precise}] [{bar:40.cyan/blue}] {bytes}/{total_bytes} ({bytes_per_sec})",
    ) {
        bar.set_style(style.progress_chars("#>-"));
    }
    bar.set_message(message);
    bar
}

pub(crate) struct Progress {
    op: &'static str,
    key: String,
    total: u64,
    done: u64,
    bar: Option<ProgressBar>,
}

impl Progress {
    pub(crate) fn new(op: &'static str, key: &str, total: u64, bar: Option<ProgressBar>) -> Self {
        if let Some(bar) = &bar {
            bar.set_length(total);
        }
        Self {
            op,
            key: key.to_string(),
            total,
            done: 0,
            bar,
        }
    }

    pub(crate) fn advance(&mut self, n: u64) {
        self.done += n;
        tracing::debug!(
            "{} {}: {}% ({}/{} bytes)",
            self.op,
            self.key,
            percent(self.done, self.total),
            self.done,
            self.total
        );
        if let Some(bar) = &self.bar {
            bar.inc(n);
        }
    }

    pub(crate) fn finish(&self) {
        if let Some(bar) = &self.bar {
            bar.finish();
        }
    }

    pub(crate) fn abandon(&self) {
        if let Some(bar) = &self.bar {
            bar.abandon();
        }
    }
}
