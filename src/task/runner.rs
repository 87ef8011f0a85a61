//! Running planned tasks.

use super::progress::{ProgressEvent, ProgressReporter};
use super::result::{TaskReport, TaskResult, TaskStatus};
use super::{Task, TaskAction, TaskError, TaskRegistry};
use crate::clean;
use crate::context::BuildContext;
use crate::diagnostic::Severity;
use crate::pipe::{PipeGraph, PipeRunner};
use std::time::Instant;

/// Runs tasks of a registry in prerequisite order.
///
/// Execution stops at the first failed task; every later task of the plan is
/// recorded as skipped.
pub struct TaskRunner<'a> {
    ctx: &'a BuildContext,
    registry: &'a TaskRegistry,
    graph: &'a PipeGraph,
    progress: &'a dyn ProgressReporter,
}

impl<'a> TaskRunner<'a> {
    pub fn new(
        ctx: &'a BuildContext,
        registry: &'a TaskRegistry,
        graph: &'a PipeGraph,
        progress: &'a dyn ProgressReporter,
    ) -> Self {
        Self { ctx, registry, graph, progress }
    }

    /// Run the named tasks and their prerequisites.
    ///
    /// Only an unknown task name is an error; task failures are part of the
    /// report.
    pub fn run(&self, names: &[&str]) -> Result<TaskReport, TaskError> {
        let plan = self.registry.plan(names.iter().copied())?;
        let start = Instant::now();
        let mut report = TaskReport::new();

        self.progress.report(ProgressEvent::RunStarted { tasks: plan.iter().map(|t| t.name.clone()).collect() });

        for task in plan {
            if report.failed_count() > 0 {
                report.add_result(TaskResult::skipped(&task.name));
                continue;
            }

            self.progress.report(ProgressEvent::TaskStarted { task: task.name.clone() });
            let result = self.execute(task, &mut report);
            let duration_ms = result.duration.as_millis() as u64;

            match &result.status {
                TaskStatus::Failed(error) => self.progress.report(ProgressEvent::TaskFailed {
                    task: task.name.clone(),
                    error: error.clone(),
                    duration_ms,
                }),
                _ => self.progress.report(ProgressEvent::TaskFinished { task: task.name.clone(), duration_ms }),
            }
            report.add_result(result);
        }

        let report = report.with_duration(start.elapsed());
        self.progress.report(ProgressEvent::RunCompleted {
            success: report.is_success(),
            duration_ms: report.total_duration.as_millis() as u64,
        });
        Ok(report)
    }

    fn execute(&self, task: &Task, report: &mut TaskReport) -> TaskResult {
        let start = Instant::now();

        match task.action {
            TaskAction::Pipe(pipe) => {
                let outcome = PipeRunner::new(self.ctx, self.graph).run(&[pipe]);
                let warnings = outcome.diagnostics.iter().filter(|d| d.severity == Severity::Warning).count();
                if outcome.is_success() {
                    TaskResult::success(&task.name, outcome.written, start.elapsed()).with_warnings(warnings)
                } else {
                    TaskResult::failed(&task.name, outcome.failure_summary(), start.elapsed()).with_warnings(warnings)
                }
            }
            TaskAction::Clean(profile) => match clean::clean(self.ctx, profile) {
                Ok(_) => TaskResult::success(&task.name, vec![], start.elapsed()),
                Err(e) => TaskResult::failed(&task.name, e.to_string(), start.elapsed()),
            },
            TaskAction::Watch(profile) => {
                report.watch = Some(profile);
                TaskResult::success(&task.name, vec![], start.elapsed())
            }
            TaskAction::None => TaskResult::success(&task.name, vec![], start.elapsed()),
        }
    }
}
