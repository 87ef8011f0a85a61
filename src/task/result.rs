//! Task run result types.

use crate::paths::Profile;
use std::path::PathBuf;
use std::time::Duration;

/// Status of a single task.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TaskStatus {
    Success,
    /// Not run because an earlier task failed
    Skipped,
    Failed(String),
}

impl TaskStatus {
    pub fn is_failure(&self) -> bool {
        matches!(self, TaskStatus::Failed(_))
    }
}

impl std::fmt::Display for TaskStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            TaskStatus::Success => write!(f, "success"),
            TaskStatus::Skipped => write!(f, "skipped"),
            TaskStatus::Failed(err) => write!(f, "failed: {}", err),
        }
    }
}

/// Result of one task.
#[derive(Debug, Clone)]
pub struct TaskResult {
    pub task: String,
    pub status: TaskStatus,
    /// Files the task wrote
    pub written: Vec<PathBuf>,
    pub duration: Duration,
    /// Number of warnings reported while the task ran
    pub warnings: usize,
}

impl TaskResult {
    pub fn success(task: impl Into<String>, written: Vec<PathBuf>, duration: Duration) -> Self {
        Self { task: task.into(), status: TaskStatus::Success, written, duration, warnings: 0 }
    }

    pub fn skipped(task: impl Into<String>) -> Self {
        Self { task: task.into(), status: TaskStatus::Skipped, written: vec![], duration: Duration::ZERO, warnings: 0 }
    }

    pub fn failed(task: impl Into<String>, error: String, duration: Duration) -> Self {
        Self { task: task.into(), status: TaskStatus::Failed(error), written: vec![], duration, warnings: 0 }
    }

    pub fn with_warnings(mut self, warnings: usize) -> Self {
        self.warnings = warnings;
        self
    }

    pub fn is_success(&self) -> bool {
        self.status == TaskStatus::Success
    }
}

/// Result of a complete task run.
#[derive(Debug, Default)]
pub struct TaskReport {
    /// Results in execution order
    pub tasks: Vec<TaskResult>,
    pub total_duration: Duration,
    /// Set when a watch task completed; the caller starts serving this profile
    pub watch: Option<Profile>,
}

impl TaskReport {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add_result(&mut self, result: TaskResult) {
        self.tasks.push(result);
    }

    pub fn with_duration(mut self, duration: Duration) -> Self {
        self.total_duration = duration;
        self
    }

    pub fn success_count(&self) -> usize {
        self.tasks.iter().filter(|r| r.is_success()).count()
    }

    pub fn failed_count(&self) -> usize {
        self.tasks.iter().filter(|r| r.status.is_failure()).count()
    }

    pub fn is_success(&self) -> bool {
        self.failed_count() == 0 && self.tasks.iter().all(|r| r.status != TaskStatus::Skipped)
    }

    pub fn get(&self, task: &str) -> Option<&TaskResult> {
        self.tasks.iter().find(|r| r.task == task)
    }

    /// Position of a task in execution order.
    pub fn position(&self, task: &str) -> Option<usize> {
        self.tasks.iter().position(|r| r.task == task)
    }

    pub fn all_written(&self) -> Vec<&PathBuf> {
        self.tasks.iter().flat_map(|r| r.written.iter()).collect()
    }

    /// A one-line summary.
    pub fn summary(&self) -> String {
        let mut parts = vec![format!("{} succeeded", self.success_count())];
        if self.failed_count() > 0 {
            parts.push(format!("{} failed", self.failed_count()));
        }
        let skipped = self.tasks.iter().filter(|r| r.status == TaskStatus::Skipped).count();
        if skipped > 0 {
            parts.push(format!("{} skipped", skipped));
        }
        let warnings: usize = self.tasks.iter().map(|r| r.warnings).sum();
        if warnings > 0 {
            parts.push(format!("{} warning(s)", warnings));
        }
        format!("{} in {:.2}s", parts.join(", "), self.total_duration.as_secs_f64())
    }
}
