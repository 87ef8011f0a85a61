//! Named tasks and their prerequisites.
//!
//! A task is bound to one action: run a pipe (and everything it reads),
//! clean an output root, or start serving and watching a profile. Tasks
//! can name prerequisite tasks, which always complete before the task's own
//! action starts.

pub mod progress;
pub mod result;
pub mod runner;

pub use progress::{ConsoleProgress, NullProgress, ProgressEvent, ProgressReporter};
pub use result::{TaskReport, TaskResult, TaskStatus};
pub use runner::TaskRunner;

use crate::paths::Profile;
use crate::pipe::PipeId;
use std::collections::{HashMap, HashSet};
use thiserror::Error;

/// Task invoked when none is named.
pub const DEFAULT_TASK: &str = "default";

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum TaskError {
    #[error("Task '{0}' is not defined")]
    UnknownTask(String),

    #[error("Task '{task}' requires '{prerequisite}', which is not defined")]
    UnknownPrerequisite { task: String, prerequisite: String },

    #[error("Task '{0}' is defined twice")]
    Duplicate(String),

    #[error("Circular dependency detected involving task '{0}'")]
    Cycle(String),
}

/// What a task does once its prerequisites are done.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TaskAction {
    Pipe(PipeId),
    Clean(Profile),
    /// Serve the output root and re-run pipes on source changes
    Watch(Profile),
    /// Only prerequisites
    None,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Task {
    pub name: String,
    pub description: String,
    pub prerequisites: Vec<String>,
    pub action: TaskAction,
}

impl Task {
    pub fn new(name: impl Into<String>, action: TaskAction) -> Self {
        Self { name: name.into(), description: String::new(), prerequisites: Vec::new(), action }
    }

    pub fn describe(mut self, description: impl Into<String>) -> Self {
        self.description = description.into();
        self
    }

    pub fn after(mut self, prerequisites: &[&str]) -> Self {
        self.prerequisites = prerequisites.iter().map(|p| p.to_string()).collect();
        self
    }
}

/// All tasks, validated once at construction.
#[derive(Debug, Clone)]
pub struct TaskRegistry {
    tasks: Vec<Task>,
    index: HashMap<String, usize>,
}

impl TaskRegistry {
    /// Build a registry, checking for duplicates, undefined prerequisites
    /// and cycles.
    pub fn new(tasks: Vec<Task>) -> Result<Self, TaskError> {
        let mut index = HashMap::new();
        for (i, task) in tasks.iter().enumerate() {
            if index.insert(task.name.clone(), i).is_some() {
                return Err(TaskError::Duplicate(task.name.clone()));
            }
        }

        for task in &tasks {
            if let Some(missing) = task.prerequisites.iter().find(|p| !index.contains_key(p.as_str())) {
                return Err(TaskError::UnknownPrerequisite {
                    task: task.name.clone(),
                    prerequisite: missing.clone(),
                });
            }
        }

        let registry = Self { tasks, index };
        registry.plan(registry.tasks.iter().map(|t| t.name.as_str()))?;
        Ok(registry)
    }

    /// The build's task set.
    pub fn standard() -> Result<Self, TaskError> {
        use TaskAction::{Clean, Pipe, Watch};

        let pipe = |name: &str, id: PipeId, description: &str| Task::new(name, Pipe(id)).describe(description);

        Self::new(vec![
            Task::new("clean-dev", Clean(Profile::Dev)).describe("Remove the development output"),
            Task::new("clean-prod", Clean(Profile::Prod)).describe("Remove the production output"),
            pipe("validate-partials", PipeId::ValidatedPartials, "Lint partial templates"),
            pipe("validate-index", PipeId::ValidatedIndex, "Lint the entry document"),
            pipe("build-partials-dev", PipeId::BuiltPartialsDev, "Copy partials to the development output"),
            pipe("convert-partials-to-js", PipeId::ScriptedPartials, "Compile partials into a template script"),
            pipe("validate-devserver-scripts", PipeId::ValidatedDevServerScripts, "Lint dev server scripts"),
            pipe("validate-app-scripts", PipeId::ValidatedAppScripts, "Lint application scripts"),
            pipe("build-app-scripts-dev", PipeId::BuiltAppScriptsDev, "Copy application scripts"),
            pipe("build-app-scripts-prod", PipeId::BuiltAppScriptsProd, "Bundle and minify application scripts"),
            pipe("build-styles-dev", PipeId::BuiltStylesDev, "Compile styles"),
            pipe("build-styles-prod", PipeId::BuiltStylesProd, "Compile and minify styles"),
            pipe("build-fonts-dev", PipeId::BuiltFontsDev, "Copy fonts to the development output"),
            pipe("build-fonts-prod", PipeId::BuiltFontsProd, "Copy fonts to the production output"),
            pipe("build-vendor-scripts-dev", PipeId::BuiltVendorScriptsDev, "Copy vendor components"),
            pipe("build-vendor-scripts-prod", PipeId::BuiltVendorScriptsProd, "Bundle vendor scripts"),
            pipe("build-index-dev", PipeId::BuiltIndexDev, "Inject references into the development index"),
            pipe("build-index-prod", PipeId::BuiltIndexProd, "Inject references into the production index"),
            pipe("build-app-dev", PipeId::BuiltAppDev, "Build the complete development output"),
            pipe("build-app-prod", PipeId::BuiltAppProd, "Build the complete production output"),
            pipe("clean-build-app-dev", PipeId::BuiltAppDev, "Clean, then build the development output")
                .after(&["clean-dev"]),
            pipe("clean-build-app-prod", PipeId::BuiltAppProd, "Clean, then build the production output")
                .after(&["clean-prod"]),
            Task::new("watch-dev", Watch(Profile::Dev))
                .describe("Serve the development output and rebuild on change")
                .after(&["clean-build-app-dev", "validate-devserver-scripts"]),
            Task::new("watch-prod", Watch(Profile::Prod))
                .describe("Serve the production output and rebuild on change")
                .after(&["clean-build-app-prod", "validate-devserver-scripts"]),
            Task::new(DEFAULT_TASK, TaskAction::None)
                .describe("Clean, then build the production output")
                .after(&["clean-build-app-prod"]),
        ])
    }

    pub fn get(&self, name: &str) -> Option<&Task> {
        self.index.get(name).map(|i| &self.tasks[*i])
    }

    /// Tasks in definition order.
    pub fn tasks(&self) -> &[Task] {
        &self.tasks
    }

    /// Execution order for the named tasks: prerequisites first, each task
    /// once.
    pub fn plan<'a>(&self, names: impl IntoIterator<Item = &'a str>) -> Result<Vec<&Task>, TaskError> {
        let mut visited = HashSet::new();
        let mut visiting = HashSet::new();
        let mut order = Vec::new();

        for name in names {
            self.visit(name, &mut visited, &mut visiting, &mut order)?;
        }

        Ok(order)
    }

    fn visit<'s>(
        &'s self,
        name: &str,
        visited: &mut HashSet<String>,
        visiting: &mut HashSet<String>,
        order: &mut Vec<&'s Task>,
    ) -> Result<(), TaskError> {
        if visited.contains(name) {
            return Ok(());
        }
        if visiting.contains(name) {
            return Err(TaskError::Cycle(name.to_string()));
        }

        let task = self.get(name).ok_or_else(|| TaskError::UnknownTask(name.to_string()))?;
        visiting.insert(name.to_string());

        for prerequisite in &task.prerequisites {
            self.visit(prerequisite, visited, visiting, order)?;
        }

        visiting.remove(name);
        visited.insert(name.to_string());
        order.push(task);
        Ok(())
    }
}
