//! Progress reporting for the long-running import.
//!
//! The CLI uses `IndicatifReporter` for a user-visible bar over the
//! estimated instance total. Library callers can use `NoopReporter` or
//! provide their own implementation.

use indicatif::{ProgressBar, ProgressDrawTarget, ProgressStyle};

/// Trait for reporting progress of the import walk.
pub trait ProgressReporter: Send + Sync {
    /// Begin a new task with an optional total count.
    fn start(&self, task: &str, total: Option<u64>);

    /// Set the absolute number of processed items.
    ///
    /// The walk discovers instances out of order, so progress is reported
    /// as an absolute position rather than increments.
    fn set_position(&self, pos: u64);

    /// Advance progress by the given amount.
    fn advance(&self, amount: u64);

    /// Mark the current task as finished.
    fn finish(&self);
}

/// No-op reporter for library callers that don't need progress output.
#[derive(Debug, Default)]
pub struct NoopReporter;

impl ProgressReporter for NoopReporter {
    fn start(&self, _task: &str, _total: Option<u64>) {}
    fn set_position(&self, _pos: u64) {}
    fn advance(&self, _amount: u64) {}
    fn finish(&self) {}
}

/// Reporter backed by `indicatif` progress bars for CLI use.
#[derive(Debug)]
pub struct IndicatifReporter {
    bar: ProgressBar,
}

impl Default for IndicatifReporter {
    fn default() -> Self {
        Self::new()
    }
}

impl IndicatifReporter {
    pub fn new() -> Self {
        Self {
            bar: ProgressBar::hidden(),
        }
    }
}

impl ProgressReporter for IndicatifReporter {
    fn start(&self, task: &str, total: Option<u64>) {
        self.bar.set_draw_target(ProgressDrawTarget::stderr());
        if let Some(total) = total {
            self.bar.set_length(total);
            self.bar.set_style(
                ProgressStyle::with_template(
                    "{spinner:.green} {msg} [{bar:30.cyan/blue}] {pos}/{len} ({eta})",
                )
                .unwrap()
                .progress_chars("=> "),
            );
        } else {
            self.bar.set_length(0);
            self.bar
                .set_style(ProgressStyle::with_template("{spinner:.green} {msg} {pos} items").unwrap());
        }
        self.bar.set_message(task.to_string());
        self.bar.reset();
    }

    fn set_position(&self, pos: u64) {
        self.bar.set_position(pos);
    }

    fn advance(&self, amount: u64) {
        self.bar.inc(amount);
    }

    fn finish(&self) {
        self.bar.finish_and_clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn noop_reporter_is_silent() {
        let reporter = NoopReporter;
        reporter.start("test", Some(100));
        reporter.set_position(50);
        reporter.advance(1);
        reporter.finish();
    }

    #[test]
    fn indicatif_reporter_lifecycle() {
        let reporter = IndicatifReporter::new();
        reporter.start("importing", Some(10));
        reporter.set_position(5);
        reporter.set_position(10);
        reporter.finish();
    }
}
