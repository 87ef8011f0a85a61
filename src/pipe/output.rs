//! Writing file sets to output roots.

use super::PipeError;
use crate::asset::FileSet;
use crate::context::BuildContext;
use crate::paths::Profile;
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};

/// One mutex per output root.
///
/// Pipe writes and clean both hold the lock of the root they touch, so a
/// watch rebuild cannot interleave with another write to the same tree.
#[derive(Debug, Default)]
pub struct OutputLocks {
    locks: Mutex<HashMap<PathBuf, Arc<Mutex<()>>>>,
}

impl OutputLocks {
    pub fn new() -> Self {
        Self::default()
    }

    /// The lock guarding `root`, created on first use.
    pub fn lock_for(&self, root: &Path) -> Arc<Mutex<()>> {
        let mut locks = self.locks.lock().unwrap_or_else(|poisoned| poisoned.into_inner());
        Arc::clone(locks.entry(root.to_path_buf()).or_default())
    }
}

/// The output root `dest` lies under, or `dest` itself.
pub fn owning_root(ctx: &BuildContext, dest: &Path) -> PathBuf {
    [Profile::Dev, Profile::Prod]
        .into_iter()
        .map(|p| ctx.paths().root(p))
        .find(|root| dest.starts_with(root))
        .unwrap_or(dest)
        .to_path_buf()
}

/// Write `files` under `dest`, keeping each file's relative path.
///
/// Returns the written files, based at `dest`. Destinations outside the
/// project root are refused.
pub fn write_files(ctx: &BuildContext, files: FileSet, dest: &Path) -> Result<FileSet, PipeError> {
    if !dest.starts_with(ctx.project_root()) || dest == ctx.project_root() {
        return Err(PipeError::OutsideRoot { path: dest.to_path_buf(), root: ctx.project_root().to_path_buf() });
    }

    let lock = ctx.locks().lock_for(&owning_root(ctx, dest));
    let _guard = lock.lock().unwrap_or_else(|poisoned| poisoned.into_inner());

    let written = files.map(|asset| asset.rebased(dest));
    for asset in &written {
        if let Some(parent) = asset.path.parent() {
            std::fs::create_dir_all(parent).map_err(|e| PipeError::io(parent, e))?;
        }
        std::fs::write(&asset.path, &asset.contents).map_err(|e| PipeError::io(&asset.path, e))?;
        tracing::debug!("wrote {}", asset.path.display());
    }

    Ok(written)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::asset::Asset;
    use crate::config::Config;
    use std::fs;
    use tempfile::TempDir;

    fn context(temp: &TempDir) -> BuildContext {
        BuildContext::new(Config::default(), temp.path().to_path_buf())
    }

    #[test]
    fn test_write_rebases_files() {
        let temp = TempDir::new().unwrap();
        let ctx = context(&temp);
        let src = temp.path().join("app");
        let files: FileSet = vec![Asset::new(&src, src.join("views/home.html"), b"<p></p>".to_vec())].into();

        let dest = temp.path().join("dist.dev");
        let written = write_files(&ctx, files, &dest).unwrap();

        assert_eq!(written.paths(), vec![dest.join("views/home.html")]);
        assert_eq!(fs::read_to_string(dest.join("views/home.html")).unwrap(), "<p></p>");
    }

    #[test]
    fn test_write_outside_project_refused() {
        let temp = TempDir::new().unwrap();
        let ctx = context(&temp);
        let other = TempDir::new().unwrap();

        let err = write_files(&ctx, FileSet::new(), other.path()).unwrap_err();
        assert!(matches!(err, PipeError::OutsideRoot { .. }));
        assert!(write_files(&ctx, FileSet::new(), temp.path()).is_err());
    }

    #[test]
    fn test_owning_root() {
        let temp = TempDir::new().unwrap();
        let ctx = context(&temp);
        let fonts = temp.path().join("dist.prod/fonts/bootstrap");
        assert_eq!(owning_root(&ctx, &fonts), temp.path().join("dist.prod"));
    }

    #[test]
    fn test_same_root_same_lock() {
        let locks = OutputLocks::new();
        let a = locks.lock_for(Path::new("/p/dist.dev"));
        let b = locks.lock_for(Path::new("/p/dist.dev"));
        let c = locks.lock_for(Path::new("/p/dist.prod"));
        assert!(Arc::ptr_eq(&a, &b));
        assert!(!Arc::ptr_eq(&a, &c));
    }
}
