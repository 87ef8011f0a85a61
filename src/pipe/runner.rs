//! Level-parallel pipe execution.
//!
//! 1. Compute the closure of the requested pipes, grouped by dependency level
//! 2. Run each level on a scoped worker pool
//! 3. Wait for the whole level before starting the next; a failure stops
//!    scheduling of later levels
//!
//! Every pipe runs at most once per invocation; its output is kept for the
//! pipes that read it.

use super::library::{self, PipeInputs, PipeLog};
use super::{PipeError, PipeGraph, PipeId};
use crate::asset::FileSet;
use crate::context::BuildContext;
use crate::diagnostic::Diagnostic;
use std::collections::HashMap;
use std::path::PathBuf;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Mutex;
use std::time::{Duration, Instant};

/// Everything one invocation produced.
#[derive(Debug, Default)]
pub struct RunOutcome {
    /// Output file sets of pipes that succeeded
    pub outputs: HashMap<PipeId, FileSet>,
    /// Pipes that failed, in completion order
    pub failures: Vec<(PipeId, PipeError)>,
    /// Pipes never started because an earlier level failed
    pub skipped: Vec<PipeId>,
    /// Diagnostics of every pipe that ran
    pub diagnostics: Vec<Diagnostic>,
    /// Files written to output roots
    pub written: Vec<PathBuf>,
    /// Wall time per pipe that ran
    pub durations: Vec<(PipeId, Duration)>,
}

impl RunOutcome {
    pub fn is_success(&self) -> bool {
        self.failures.is_empty() && self.skipped.is_empty()
    }

    /// One line per failed pipe.
    pub fn failure_summary(&self) -> String {
        self.failures.iter().map(|(pipe, err)| format!("{}: {}", pipe, err)).collect::<Vec<_>>().join("; ")
    }
}

type PipeRun = (usize, PipeId, Result<FileSet, PipeError>, PipeLog, Duration);

/// Runs pipes of a graph against a build context.
pub struct PipeRunner<'a> {
    ctx: &'a BuildContext,
    graph: &'a PipeGraph,
}

impl<'a> PipeRunner<'a> {
    pub fn new(ctx: &'a BuildContext, graph: &'a PipeGraph) -> Self {
        Self { ctx, graph }
    }

    /// Run `requested` and everything they read.
    pub fn run(&self, requested: &[PipeId]) -> RunOutcome {
        let levels = self.graph.levels(requested);
        let mut outcome = RunOutcome::default();

        tracing::debug!(
            "running {} pipes in {} levels ({} workers)",
            levels.iter().map(Vec::len).sum::<usize>(),
            levels.len(),
            self.ctx.jobs()
        );

        for (index, level) in levels.iter().enumerate() {
            if !outcome.failures.is_empty() {
                outcome.skipped.extend(levels[index..].iter().flatten().copied());
                break;
            }
            tracing::debug!("level {}: {:?}", index, level.iter().map(|p| p.name()).collect::<Vec<_>>());

            for (_, pipe, result, log, duration) in self.run_level(level, &outcome.outputs) {
                outcome.diagnostics.extend(log.diagnostics);
                outcome.written.extend(log.written);
                outcome.durations.push((pipe, duration));
                match result {
                    Ok(files) => {
                        tracing::debug!("{} produced {} files in {:?}", pipe, files.len(), duration);
                        outcome.outputs.insert(pipe, files);
                    }
                    Err(e) => {
                        tracing::error!("{} failed: {}", pipe, e);
                        outcome.failures.push((pipe, e));
                    }
                }
            }
        }

        outcome
    }

    fn run_level(&self, level: &[PipeId], outputs: &HashMap<PipeId, FileSet>) -> Vec<PipeRun> {
        let inputs = PipeInputs::new(outputs);
        let jobs = self.ctx.jobs();

        if jobs == 1 || level.len() == 1 {
            return level.iter().enumerate().map(|(i, pipe)| self.execute(i, *pipe, &inputs)).collect();
        }

        let results: Mutex<Vec<PipeRun>> = Mutex::new(Vec::with_capacity(level.len()));
        let next_idx = AtomicUsize::new(0);

        std::thread::scope(|s| {
            for _ in 0..jobs.min(level.len()) {
                s.spawn(|| loop {
                    let idx = next_idx.fetch_add(1, Ordering::SeqCst);
                    if idx >= level.len() {
                        break;
                    }
                    let run = self.execute(idx, level[idx], &inputs);
                    results.lock().unwrap_or_else(|poisoned| poisoned.into_inner()).push(run);
                });
            }
        });

        // Deterministic order regardless of which worker finished first.
        let mut results = results.into_inner().unwrap_or_else(|poisoned| poisoned.into_inner());
        results.sort_by_key(|(idx, ..)| *idx);
        results
    }

    fn execute(&self, idx: usize, pipe: PipeId, inputs: &PipeInputs<'_>) -> PipeRun {
        let start = Instant::now();
        let mut log = PipeLog::default();
        tracing::debug!("starting {}", pipe);
        let result = library::run_pipe(pipe, self.ctx, inputs, &mut log);
        (idx, pipe, result, log, start.elapsed())
    }
}
