//! Progress bar for long renders.
//!
//! Drawn on stderr so stdout stays clean for `--json` output.
//!
//! # Examples
//!
//! ```
//! use pdftoolkit::output::progress::{ProgressBar, ProgressStyle};
//!
//! let mut progress = ProgressBar::new(12, ProgressStyle::Bar);
//! progress.set_message("Rendering thumbnails");
//! for _ in 0..12 {
//!     progress.increment();
//! }
//! progress.finish();
//! ```

use std::io::{self, IsTerminal, Write};
use std::time::{Duration, Instant};

/// Style of progress indicator.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ProgressStyle {
    /// Classic progress bar: [=====>    ]
    Bar,
    /// Simple counter: 4/12
    Counter,
}

/// Progress indicator for page-by-page work.
pub struct ProgressBar {
    total: usize,
    current: usize,
    style: ProgressStyle,
    message: Option<String>,
    start_time: Instant,
    last_update: Instant,
    update_interval: Duration,
    enabled: bool,
}

impl ProgressBar {
    /// Create a progress bar; it only draws when stderr is a terminal.
    pub fn new(total: usize, style: ProgressStyle) -> Self {
        Self {
            total,
            current: 0,
            style,
            message: None,
            start_time: Instant::now(),
            last_update: Instant::now(),
            update_interval: Duration::from_millis(100),
            enabled: io::stderr().is_terminal(),
        }
    }

    /// Create a disabled progress bar (no output).
    pub fn disabled() -> Self {
        let mut pb = Self::new(0, ProgressStyle::Counter);
        pb.enabled = false;
        pb
    }

    /// Set the message shown in front of the bar.
    pub fn set_message(&mut self, message: impl Into<String>) {
        self.message = Some(message.into());
    }

    /// Update the progress bar to a specific value.
    pub fn update(&mut self, current: usize) {
        self.current = current;

        if self.last_update.elapsed() < self.update_interval && current < self.total {
            return;
        }

        self.last_update = Instant::now();
        self.render();
    }

    /// Increment the progress bar by one.
    pub fn increment(&mut self) {
        self.update(self.current + 1);
    }

    /// Mark the progress bar as finished.
    pub fn finish(&mut self) {
        self.current = self.total;
        if self.enabled {
            self.render();
            eprintln!();
        }
    }

    /// Current progress in percent.
    pub fn percent(&self) -> f64 {
        if self.total > 0 {
            (self.current as f64 / self.total as f64) * 100.0
        } else {
            0.0
        }
    }

    fn render(&self) {
        if !self.enabled {
            return;
        }

        let output = match self.style {
            ProgressStyle::Bar => self.render_bar(),
            ProgressStyle::Counter => self.render_counter(),
        };

        eprint!("\r{output}");
        io::stderr().flush().ok();
    }

    fn render_bar(&self) -> String {
        let width = 40;
        let filled = (width * self.current.min(self.total)) / self.total.max(1);
        let bar = format!(
            "[{}{}{}]",
            "=".repeat(filled.saturating_sub(1)),
            if filled > 0 { ">" } else { "" },
            " ".repeat(width - filled)
        );

        let mut parts = vec![
            bar,
            format!("{:.0}%", self.percent()),
            format!("{}/{}", self.current, self.total),
            format_duration(self.start_time.elapsed()),
        ];
        if let Some(ref msg) = self.message {
            parts.insert(0, msg.clone());
        }
        parts.join(" ")
    }

    fn render_counter(&self) -> String {
        let mut parts = vec![
            format!("{}/{}", self.current, self.total),
            format_duration(self.start_time.elapsed()),
        ];
        if let Some(ref msg) = self.message {
            parts.insert(0, msg.clone());
        }
        parts.join(" ")
    }
}

/// Format a duration as a human-readable string.
fn format_duration(duration: Duration) -> String {
    let secs = duration.as_secs();

    if secs < 60 {
        format!("{secs}s")
    } else if secs < 3600 {
        format!("{}m {}s", secs / 60, secs % 60)
    } else {
        format!("{}h {}m", secs / 3600, (secs % 3600) / 60)
    }
}
