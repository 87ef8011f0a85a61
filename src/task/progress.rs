//! Task progress reporting.
//!
//! Each line carries a wall-clock timestamp:
//!
//! ```text
//! [14:02:11] Starting 'clean-prod'...
//! [14:02:11] Finished 'clean-prod' after 3 ms
//! ```

use chrono::Local;
use std::io::Write;
use std::sync::Mutex;

/// Events that can be reported while tasks run.
#[derive(Debug, Clone)]
pub enum ProgressEvent {
    /// Tasks are about to run, in this order
    RunStarted { tasks: Vec<String> },
    TaskStarted { task: String },
    TaskFinished { task: String, duration_ms: u64 },
    TaskFailed { task: String, error: String, duration_ms: u64 },
    RunCompleted { success: bool, duration_ms: u64 },
}

/// Trait for progress reporters.
pub trait ProgressReporter: Send + Sync {
    fn report(&self, event: ProgressEvent);
}

/// A progress reporter that discards all events.
#[derive(Debug, Default)]
pub struct NullProgress;

impl NullProgress {
    pub fn new() -> Self {
        Self
    }
}

impl ProgressReporter for NullProgress {
    fn report(&self, _event: ProgressEvent) {}
}

/// Console progress reporter with optional colors.
pub struct ConsoleProgress {
    use_colors: bool,
    output: Mutex<Box<dyn Write + Send>>,
}

impl std::fmt::Debug for ConsoleProgress {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ConsoleProgress").field("use_colors", &self.use_colors).finish()
    }
}

impl ConsoleProgress {
    /// Create a reporter writing to stdout.
    pub fn new() -> Self {
        Self { use_colors: true, output: Mutex::new(Box::new(std::io::stdout())) }
    }

    /// Create a reporter that writes to a custom output, without colors.
    pub fn with_output<W: Write + Send + 'static>(output: W) -> Self {
        Self { use_colors: false, output: Mutex::new(Box::new(output)) }
    }

    pub fn with_colors(mut self, use_colors: bool) -> Self {
        self.use_colors = use_colors;
        self
    }

    fn color(&self, text: &str, color: &str) -> String {
        if self.use_colors {
            format!("{}{}\x1b[0m", color, text)
        } else {
            text.to_string()
        }
    }

    fn cyan(&self, text: &str) -> String {
        self.color(text, "\x1b[36m")
    }

    fn magenta(&self, text: &str) -> String {
        self.color(text, "\x1b[35m")
    }

    fn red(&self, text: &str) -> String {
        self.color(text, "\x1b[31m")
    }

    fn gray(&self, text: &str) -> String {
        self.color(text, "\x1b[90m")
    }

    fn writeln(&self, line: &str) {
        let stamp = self.gray(&timestamp());
        if let Ok(mut output) = self.output.lock() {
            let _ = writeln!(output, "[{}] {}", stamp, line);
        }
    }
}

impl Default for ConsoleProgress {
    fn default() -> Self {
        Self::new()
    }
}

impl ProgressReporter for ConsoleProgress {
    fn report(&self, event: ProgressEvent) {
        match event {
            ProgressEvent::RunStarted { tasks } => {
                tracing::debug!("task plan: {}", tasks.join(", "));
            }
            ProgressEvent::TaskStarted { task } => {
                self.writeln(&format!("Starting '{}'...", self.cyan(&task)));
            }
            ProgressEvent::TaskFinished { task, duration_ms } => {
                self.writeln(&format!(
                    "Finished '{}' after {}",
                    self.cyan(&task),
                    self.magenta(&format_duration(duration_ms))
                ));
            }
            ProgressEvent::TaskFailed { task, error, duration_ms } => {
                self.writeln(&format!(
                    "'{}' {} after {}",
                    self.cyan(&task),
                    self.red("errored"),
                    self.magenta(&format_duration(duration_ms))
                ));
                self.writeln(&self.red(&error));
            }
            ProgressEvent::RunCompleted { success, duration_ms } => {
                if !success {
                    self.writeln(&format!("{} after {}", self.red("Run failed"), format_duration(duration_ms)));
                }
            }
        }
    }
}

/// Current local time for log lines.
pub fn timestamp() -> String {
    Local::now().format("%H:%M:%S").to_string()
}

/// Format a duration in milliseconds for display.
pub fn format_duration(ms: u64) -> String {
    if ms < 1000 {
        format!("{} ms", ms)
    } else {
        format!("{:.2} s", ms as f64 / 1000.0)
    }
}
