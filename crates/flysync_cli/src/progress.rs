use flysync_core::RunProgress;
use indicatif::{ProgressBar, ProgressStyle};
use std::cell::RefCell;

/// Terminal progress bar for a job's main loops.
///
/// Disabled bars draw nothing, which keeps debug output readable.
pub struct BarProgress {
    enabled: bool,
    bar: RefCell<Option<ProgressBar>>,
}

fn bar_template() -> &'static str {
    match terminal_columns() {
        Some(cols) if cols >= 110 => "{msg:24} {bar:40.cyan/blue} {pos}/{len}",
        Some(cols) if cols >= 80 => "{msg:24} {wide_bar:.cyan/blue} {pos}/{len}",
        _ => "{msg} {wide_bar:.cyan/blue} {percent}%",
    }
}

fn terminal_columns() -> Option<usize> {
    std::env::var("COLUMNS")
        .ok()
        .and_then(|v| v.parse::<usize>().ok())
}

impl BarProgress {
    #[must_use]
    pub fn new(enabled: bool) -> Self {
        Self {
            enabled,
            bar: RefCell::new(None),
        }
    }
}

impl RunProgress for BarProgress {
    fn start(&self, label: &str, total: u64) {
        if !self.enabled {
            return;
        }
        let bar = ProgressBar::new(total);
        bar.set_style(
            ProgressStyle::with_template(bar_template())
                .unwrap_or_else(|_| ProgressStyle::default_bar()),
        );
        bar.set_message(label.to_string());
        if let Some(previous) = self.bar.replace(Some(bar)) {
            previous.finish_and_clear();
        }
    }

    fn advance(&self) {
        if let Some(bar) = self.bar.borrow().as_ref() {
            bar.inc(1);
        }
    }

    fn finish(&self) {
        if let Some(bar) = self.bar.take() {
            bar.finish();
        }
    }
}
