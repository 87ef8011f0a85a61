//! Build context shared by every pipe and task of an invocation.

use crate::config::Config;
use crate::paths::PathRegistry;
use crate::pipe::output::OutputLocks;
use std::path::{Path, PathBuf};
use std::sync::Arc;

/// Default number of parallel jobs (uses available parallelism).
fn default_jobs() -> usize {
    std::thread::available_parallelism().map(|n| n.get()).unwrap_or(1)
}

/// Configuration and resolved paths for a run.
///
/// The configuration is immutable once the context exists. Clones share the
/// same output locks, so a watcher and a server can hold their own copy.
#[derive(Debug, Clone)]
pub struct BuildContext {
    config: Arc<Config>,
    paths: Arc<PathRegistry>,
    locks: Arc<OutputLocks>,
    verbose: bool,
    jobs: usize,
}

impl BuildContext {
    /// Create a new build context.
    ///
    /// # Arguments
    /// - `config` - The loaded configuration
    /// - `project_root` - Directory that relative paths in the config refer to
    pub fn new(config: Config, project_root: PathBuf) -> Self {
        let paths = PathRegistry::from_config(&config.paths, &project_root);
        Self {
            config: Arc::new(config),
            paths: Arc::new(paths),
            locks: Arc::new(OutputLocks::new()),
            verbose: false,
            jobs: default_jobs(),
        }
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    pub fn paths(&self) -> &PathRegistry {
        &self.paths
    }

    pub fn project_root(&self) -> &Path {
        self.paths.project_root()
    }

    pub fn locks(&self) -> &OutputLocks {
        &self.locks
    }

    pub fn is_verbose(&self) -> bool {
        self.verbose
    }

    /// Number of pipes allowed to run at once.
    pub fn jobs(&self) -> usize {
        self.jobs
    }

    pub fn with_verbose(mut self, verbose: bool) -> Self {
        self.verbose = verbose;
        self
    }

    pub fn with_jobs(mut self, jobs: usize) -> Self {
        self.jobs = jobs.max(1);
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::paths::Profile;

    #[test]
    fn test_context_resolves_paths() {
        let ctx = BuildContext::new(Config::default(), PathBuf::from("/project"));
        assert_eq!(ctx.project_root(), Path::new("/project"));
        assert_eq!(ctx.paths().root(Profile::Dev), Path::new("/project/dist.dev"));
        assert!(!ctx.is_verbose());
        assert!(ctx.jobs() >= 1);
    }

    #[test]
    fn test_with_jobs_clamps() {
        let ctx = BuildContext::new(Config::default(), PathBuf::from("/project")).with_jobs(0);
        assert_eq!(ctx.jobs(), 1);
    }

    #[test]
    fn test_clones_share_locks() {
        let ctx = BuildContext::new(Config::default(), PathBuf::from("/project"));
        let other = ctx.clone().with_verbose(true);
        let a = ctx.locks().lock_for(Path::new("/project/dist.dev"));
        let b = other.locks().lock_for(Path::new("/project/dist.dev"));
        assert!(Arc::ptr_eq(&a, &b));
    }
}
