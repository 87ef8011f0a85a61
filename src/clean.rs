//! Removing output roots.

use crate::context::BuildContext;
use crate::paths::Profile;
use std::path::{Path, PathBuf};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum CleanError {
    /// The root is the project itself, an ancestor of it, or lies outside it
    #[error("refusing to clean {}: not an output directory inside {}", path.display(), root.display())]
    Refused { path: PathBuf, root: PathBuf },

    #[error("failed to remove {}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

/// Remove the output root of `profile` and everything below it.
///
/// Returns `false` when there was nothing to remove.
pub fn clean(ctx: &BuildContext, profile: Profile) -> Result<bool, CleanError> {
    let root = ctx.paths().root(profile);
    check_target(ctx.project_root(), root)?;

    let lock = ctx.locks().lock_for(root);
    let _guard = lock.lock().unwrap_or_else(|poisoned| poisoned.into_inner());

    match std::fs::remove_dir_all(root) {
        Ok(()) => {
            tracing::debug!("removed {}", root.display());
            Ok(true)
        }
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(false),
        Err(source) => Err(CleanError::Io { path: root.to_path_buf(), source }),
    }
}

fn check_target(project_root: &Path, target: &Path) -> Result<(), CleanError> {
    let inside = target.starts_with(project_root) && target != project_root;
    let escapes = target.components().any(|c| matches!(c, std::path::Component::ParentDir));
    if inside && !escapes {
        Ok(())
    } else {
        Err(CleanError::Refused { path: target.to_path_buf(), root: project_root.to_path_buf() })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::Config;
    use std::fs;
    use tempfile::TempDir;

    #[test]
    fn test_clean_removes_only_its_root() {
        let temp = TempDir::new().unwrap();
        let dev = temp.path().join("dist.dev");
        let prod = temp.path().join("dist.prod");
        fs::create_dir_all(dev.join("scripts")).unwrap();
        fs::write(dev.join("scripts/app.js"), "x").unwrap();
        fs::create_dir_all(&prod).unwrap();
        fs::write(prod.join("index.html"), "y").unwrap();
        fs::write(temp.path().join("keep.txt"), "z").unwrap();

        let ctx = BuildContext::new(Config::default(), temp.path().to_path_buf());
        assert!(clean(&ctx, Profile::Dev).unwrap());

        assert!(!dev.exists());
        assert!(prod.join("index.html").exists());
        assert!(temp.path().join("keep.txt").exists());
    }

    #[test]
    fn test_clean_missing_root() {
        let temp = TempDir::new().unwrap();
        let ctx = BuildContext::new(Config::default(), temp.path().to_path_buf());
        assert!(!clean(&ctx, Profile::Prod).unwrap());
    }

    #[test]
    fn test_refuses_project_root() {
        let temp = TempDir::new().unwrap();
        let mut config = Config::default();
        config.paths.dist_dev = PathBuf::from(".");
        let ctx = BuildContext::new(config, temp.path().to_path_buf());

        assert!(matches!(clean(&ctx, Profile::Dev), Err(CleanError::Refused { .. })));
        assert!(temp.path().exists());
    }

    #[test]
    fn test_refuses_outside_root() {
        let project = Path::new("/work/site");
        assert!(check_target(project, Path::new("/work/site/dist")).is_ok());
        assert!(check_target(project, Path::new("/work")).is_err());
        assert!(check_target(project, Path::new("/tmp/dist")).is_err());
        assert!(check_target(project, Path::new("/work/site/../other")).is_err());
    }
}
