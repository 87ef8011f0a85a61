//! Task execution and watch mode

use super::{load_project, GlobalOptions, EXIT_ERROR, EXIT_INVALID_ARGS, EXIT_SUCCESS};
use crate::context::BuildContext;
use crate::paths::Profile;
use crate::pipe::PipeGraph;
use crate::server::{self, LiveReload};
use crate::task::{ConsoleProgress, TaskError, TaskRegistry, TaskRunner, DEFAULT_TASK};
use crate::watch::WatchController;
use std::process::ExitCode;

/// Run the named tasks, then serve and watch if a watch task ran.
pub fn run_tasks(tasks: &[String], options: &GlobalOptions) -> ExitCode {
    let ctx = match load_project(options) {
        Ok(ctx) => ctx,
        Err(e) => {
            eprintln!("{}", e);
            return ExitCode::from(EXIT_ERROR);
        }
    };

    let registry = match TaskRegistry::standard() {
        Ok(registry) => registry,
        Err(e) => {
            eprintln!("Error: {}", e);
            return ExitCode::from(EXIT_ERROR);
        }
    };
    let graph = match PipeGraph::new() {
        Ok(graph) => graph,
        Err(e) => {
            eprintln!("Error: {}", e);
            return ExitCode::from(EXIT_ERROR);
        }
    };

    let names: Vec<&str> =
        if tasks.is_empty() { vec![DEFAULT_TASK] } else { tasks.iter().map(String::as_str).collect() };

    let progress = ConsoleProgress::new();
    let report = match TaskRunner::new(&ctx, &registry, &graph, &progress).run(&names) {
        Ok(report) => report,
        Err(e @ TaskError::UnknownTask(_)) => {
            eprintln!("Error: {}", e);
            eprintln!("Run `assetline list` to see the available tasks");
            return ExitCode::from(EXIT_INVALID_ARGS);
        }
        Err(e) => {
            eprintln!("Error: {}", e);
            return ExitCode::from(EXIT_ERROR);
        }
    };

    if ctx.is_verbose() || !report.is_success() {
        println!("{}", report.summary());
    }
    if !report.is_success() {
        return ExitCode::from(EXIT_ERROR);
    }

    match report.watch {
        Some(profile) => serve_and_watch(&ctx, &graph, profile),
        None => ExitCode::from(EXIT_SUCCESS),
    }
}

/// Serve the profile's output root and rebuild on change until interrupted.
fn serve_and_watch(ctx: &BuildContext, graph: &PipeGraph, profile: Profile) -> ExitCode {
    let runtime = match tokio::runtime::Builder::new_multi_thread().enable_all().build() {
        Ok(runtime) => runtime,
        Err(e) => {
            eprintln!("Error: failed to start runtime: {}", e);
            return ExitCode::from(EXIT_ERROR);
        }
    };

    let listener = match runtime.block_on(server::bind(&ctx.config().server)) {
        Ok(listener) => listener,
        Err(e) => {
            eprintln!("Error: {}", e);
            return ExitCode::from(EXIT_ERROR);
        }
    };

    let live_reload = LiveReload::new();
    let root = ctx.paths().root(profile).to_path_buf();
    let inject = ctx.config().server.live_reload;
    runtime.spawn({
        let live_reload = live_reload.clone();
        async move {
            if let Err(e) = server::serve(listener, root, live_reload, inject).await {
                tracing::error!("{}", e);
            }
        }
    });

    let mut controller = WatchController::new(ctx, graph, profile, live_reload);
    match controller.watch() {
        Ok(()) => ExitCode::from(EXIT_SUCCESS),
        Err(e) => {
            eprintln!("Error: {}", e);
            ExitCode::from(EXIT_ERROR)
        }
    }
}
