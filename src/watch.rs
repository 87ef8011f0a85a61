//! Watch mode: re-run pipes when sources change.
//!
//! Four bindings map a source class to the pipe that rebuilds it. Debounced
//! filesystem events arrive over a channel and are handled one batch at a
//! time on the calling thread; pipe writes hold the lock of their output
//! root, so a rebuild never interleaves with another write to the same tree.
//! After a successful rebuild the written files are broadcast to live reload
//! clients.

use crate::context::BuildContext;
use crate::diagnostic::ErrorTracker;
use crate::discovery::matches_patterns;
use crate::paths::{AssetClass, Profile};
use crate::pipe::{PipeGraph, PipeId, PipeRunner};
use crate::server::{LiveReload, ReloadEvent};
use crate::task::progress::{format_duration, timestamp};
use notify::RecursiveMode;
use notify_debouncer_mini::{new_debouncer, DebouncedEventKind};
use std::path::{Path, PathBuf};
use std::sync::mpsc::channel;
use std::time::{Duration, Instant};
use thiserror::Error;

/// Error during watch mode
#[derive(Debug, Error)]
pub enum WatchError {
    #[error("Failed to initialize file watcher: {0}")]
    WatcherInit(#[source] notify::Error),

    #[error("Failed to watch {}: {source}", path.display())]
    WatchPath {
        path: PathBuf,
        #[source]
        source: notify::Error,
    },

    #[error("Watch channel error: {0}")]
    Channel(String),

    #[error("Project directory not found: {}", .0.display())]
    RootNotFound(PathBuf),
}

/// A source class and the pipe re-run when one of its files changes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct WatchBinding {
    pub class: AssetClass,
    pub pipe: PipeId,
}

/// The bindings of a profile.
///
/// In production, partials are compiled into the application bundle, so a
/// partial change rebuilds the bundled app scripts.
pub fn bindings(profile: Profile) -> [WatchBinding; 4] {
    let bind = |class, pipe| WatchBinding { class, pipe };
    match profile {
        Profile::Dev => [
            bind(AssetClass::Index, PipeId::BuiltIndexDev),
            bind(AssetClass::Scripts, PipeId::BuiltAppScriptsDev),
            bind(AssetClass::Partials, PipeId::BuiltPartialsDev),
            bind(AssetClass::Styles, PipeId::BuiltStylesDev),
        ],
        Profile::Prod => [
            bind(AssetClass::Index, PipeId::BuiltIndexProd),
            bind(AssetClass::Scripts, PipeId::BuiltAppScriptsProd),
            bind(AssetClass::Partials, PipeId::BuiltAppScriptsProd),
            bind(AssetClass::Styles, PipeId::BuiltStylesProd),
        ],
    }
}

/// What one batch of changes did.
#[derive(Debug, Default)]
pub struct Rebuild {
    /// Pipes that were re-run
    pub pipes: Vec<PipeId>,
    pub success: bool,
    pub written: Vec<PathBuf>,
    /// Files whose errors went away
    pub fixed: Vec<PathBuf>,
    /// Reload clients notified; `None` when nothing was sent
    pub notified: Option<usize>,
    pub duration: Duration,
}

/// Maps changed files to pipes and runs them.
pub struct WatchController<'a> {
    ctx: &'a BuildContext,
    graph: &'a PipeGraph,
    profile: Profile,
    live_reload: LiveReload,
    tracker: ErrorTracker,
}

impl<'a> WatchController<'a> {
    pub fn new(ctx: &'a BuildContext, graph: &'a PipeGraph, profile: Profile, live_reload: LiveReload) -> Self {
        Self { ctx, graph, profile, live_reload, tracker: ErrorTracker::new() }
    }

    pub fn profile(&self) -> Profile {
        self.profile
    }

    /// Bindings whose sources include `path`.
    pub fn matching(&self, path: &Path) -> Vec<WatchBinding> {
        let root = self.ctx.project_root();
        bindings(self.profile)
            .into_iter()
            .filter(|b| matches_patterns(root, self.ctx.paths().patterns(b.class), path))
            .collect()
    }

    /// Re-run the pipes bound to `paths`.
    ///
    /// Returns `None` when no binding matches any of the paths.
    pub fn handle_paths(&mut self, paths: &[PathBuf]) -> Option<Rebuild> {
        let mut matched: Vec<WatchBinding> = Vec::new();
        for path in paths {
            for binding in self.matching(path) {
                if !matched.contains(&binding) {
                    matched.push(binding);
                }
            }
        }
        if matched.is_empty() {
            return None;
        }

        let mut pipes: Vec<PipeId> = matched.iter().map(|b| b.pipe).collect();
        pipes.sort();
        pipes.dedup();

        if self.profile == Profile::Prod && matched.iter().any(|b| b.class == AssetClass::Partials) {
            tracing::info!("partials are bundled in production; rebuilding {}", PipeId::BuiltAppScriptsProd);
        }

        let start = Instant::now();
        let outcome = PipeRunner::new(self.ctx, self.graph).run(&pipes);
        let duration = start.elapsed();

        let root = self.ctx.project_root().to_path_buf();
        let scopes: Vec<&[String]> = matched.iter().map(|b| self.ctx.paths().patterns(b.class)).collect();
        let fixed = self
            .tracker
            .update(&outcome.diagnostics, |file| scopes.iter().any(|patterns| matches_patterns(&root, patterns, file)));

        let success = outcome.is_success();
        let notified = if success && !outcome.written.is_empty() {
            let event = ReloadEvent::for_written(self.ctx.paths().root(self.profile), &outcome.written);
            Some(self.live_reload.notify(event))
        } else {
            if !success {
                tracing::error!("rebuild failed: {}", outcome.failure_summary());
            }
            None
        };

        Some(Rebuild { pipes, success, written: outcome.written, fixed, notified, duration })
    }

    /// Watch the project and rebuild until the process ends.
    pub fn watch(&mut self) -> Result<(), WatchError> {
        let root = self.ctx.project_root().to_path_buf();
        if !root.exists() {
            return Err(WatchError::RootNotFound(root));
        }

        let (tx, rx) = channel();
        let debounce = Duration::from_millis(self.ctx.config().watch.debounce_ms as u64);
        let mut debouncer = new_debouncer(debounce, tx).map_err(WatchError::WatcherInit)?;
        debouncer
            .watcher()
            .watch(&root, RecursiveMode::Recursive)
            .map_err(|source| WatchError::WatchPath { path: root.clone(), source })?;

        let outputs: Vec<PathBuf> =
            [Profile::Dev, Profile::Prod].into_iter().map(|p| self.ctx.paths().root(p).to_path_buf()).collect();
        println!("[{}] Watching {} for changes...", timestamp(), root.display());

        loop {
            match rx.recv() {
                Ok(Ok(events)) => {
                    let changed: Vec<PathBuf> = events
                        .into_iter()
                        .filter(|e| matches!(e.kind, DebouncedEventKind::Any))
                        .map(|e| e.path)
                        .filter(|p| !outputs.iter().any(|o| p.starts_with(o)))
                        .collect();
                    if changed.is_empty() {
                        continue;
                    }

                    if self.ctx.config().watch.clear_screen {
                        clear_screen();
                    }
                    for path in &changed {
                        if let Some(name) = path.file_name() {
                            println!("[{}] Changed: {}", timestamp(), name.to_string_lossy());
                        }
                    }

                    if let Some(rebuild) = self.handle_paths(&changed) {
                        print_rebuild(&rebuild);
                    }
                }
                Ok(Err(error)) => {
                    eprintln!("[{}] Watch error: {:?}", timestamp(), error);
                    eprintln!("[{}] Continuing to watch...", timestamp());
                }
                Err(e) => {
                    return Err(WatchError::Channel(e.to_string()));
                }
            }
        }
    }
}

fn clear_screen() {
    print!("\x1B[2J\x1B[1;1H");
}

fn print_rebuild(rebuild: &Rebuild) {
    for fixed in &rebuild.fixed {
        if let Some(name) = fixed.file_name() {
            println!("[{}] Fixed: {}", timestamp(), name.to_string_lossy());
        }
    }

    let pipes: Vec<&str> = rebuild.pipes.iter().map(|p| p.name()).collect();
    let elapsed = format_duration(rebuild.duration.as_millis() as u64);
    if rebuild.success {
        let reload = match rebuild.notified {
            Some(0) | None => String::new(),
            Some(n) => format!(", reloaded {} client{}", n, if n == 1 { "" } else { "s" }),
        };
        println!("[{}] Rebuilt {} after {}{}", timestamp(), pipes.join(", "), elapsed, reload);
    } else {
        println!("[{}] Rebuild of {} failed after {}", timestamp(), pipes.join(", "), elapsed);
    }
}
