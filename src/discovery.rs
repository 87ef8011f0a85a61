//! Source file discovery.
//!
//! Expands ordered glob pattern lists (with `!` negations) into file sets.
//! Matches of one pattern are sorted; pattern order is preserved and the first
//! occurrence of a file wins.

use crate::asset::{Asset, FileSet};
use glob::{glob_with, MatchOptions, Pattern};
use std::collections::HashSet;
use std::path::{Path, PathBuf};
use thiserror::Error;

/// Error during source discovery.
#[derive(Debug, Error)]
pub enum DiscoveryError {
    /// Invalid glob pattern
    #[error("Invalid glob pattern '{0}': {1}")]
    InvalidPattern(String, glob::PatternError),
    /// IO error while reading a discovered file
    #[error("Failed to read {}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

fn match_options() -> MatchOptions {
    MatchOptions { case_sensitive: true, require_literal_separator: true, require_literal_leading_dot: false }
}

/// The static directory prefix of a glob pattern.
///
/// `app/**/*.js` -> `app`, `images/*` -> `images`, `app/index.html` -> `app`.
pub fn glob_base(pattern: &str) -> PathBuf {
    let mut base = PathBuf::new();
    let segments: Vec<&str> = pattern.split('/').filter(|s| !s.is_empty() && *s != ".").collect();
    for (i, segment) in segments.iter().enumerate() {
        let is_last = i + 1 == segments.len();
        if is_last || segment.contains(['*', '?', '[', '{']) {
            break;
        }
        base.push(segment);
    }
    base
}

/// Discover files matching a single glob pattern.
///
/// # Returns
/// Matching regular files, sorted.
pub fn discover_files(base_dir: &Path, pattern: &str) -> Result<Vec<PathBuf>, DiscoveryError> {
    let full_pattern = base_dir.join(pattern.trim_start_matches("./"));
    let pattern_str = full_pattern.to_string_lossy();

    let paths = glob_with(&pattern_str, match_options())
        .map_err(|e| DiscoveryError::InvalidPattern(pattern.to_string(), e))?;

    let mut files = Vec::new();
    for entry in paths {
        match entry {
            Ok(path) => {
                if path.is_file() {
                    files.push(path);
                }
            }
            Err(e) => {
                tracing::warn!("error reading path: {}", e);
            }
        }
    }

    files.sort();
    Ok(files)
}

/// A discovered file together with the glob base it was matched under.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SourceFile {
    pub base: PathBuf,
    pub path: PathBuf,
}

/// Expand an ordered pattern list.
pub fn discover(root: &Path, patterns: &[String]) -> Result<Vec<SourceFile>, DiscoveryError> {
    let mut excludes = Vec::new();
    for pattern in patterns.iter().filter_map(|p| p.strip_prefix('!')) {
        let full = root.join(pattern.trim_start_matches("./"));
        let compiled = Pattern::new(&full.to_string_lossy())
            .map_err(|e| DiscoveryError::InvalidPattern(pattern.to_string(), e))?;
        excludes.push(compiled);
    }

    let mut seen = HashSet::new();
    let mut files = Vec::new();
    for pattern in patterns.iter().filter(|p| !p.starts_with('!')) {
        let base = root.join(glob_base(pattern.trim_start_matches("./")));
        for path in discover_files(root, pattern)? {
            if excludes.iter().any(|ex| ex.matches_path_with(&path, match_options())) {
                continue;
            }
            if seen.insert(path.clone()) {
                files.push(SourceFile { base: base.clone(), path });
            }
        }
    }

    Ok(files)
}

/// Discover and read every file of a pattern list.
pub fn read_sources(root: &Path, patterns: &[String]) -> Result<FileSet, DiscoveryError> {
    let mut set = FileSet::new();
    for source in discover(root, patterns)? {
        let asset = Asset::read(&source.base, &source.path)
            .map_err(|e| DiscoveryError::Io { path: source.path.clone(), source: e })?;
        set.push(asset);
    }
    tracing::debug!("discovered {} files for {:?}", set.len(), patterns);
    Ok(set)
}

/// Check whether `path` is selected by a pattern list (respecting negations).
///
/// Used to route file-change events; invalid patterns never match.
pub fn matches_patterns(root: &Path, patterns: &[String], path: &Path) -> bool {
    let compiled = |p: &str| Pattern::new(&root.join(p.trim_start_matches("./")).to_string_lossy()).ok();

    let included = patterns
        .iter()
        .filter(|p| !p.starts_with('!'))
        .filter_map(|p| compiled(p))
        .any(|p| p.matches_path_with(path, match_options()));

    included
        && !patterns
            .iter()
            .filter_map(|p| p.strip_prefix('!'))
            .filter_map(compiled)
            .any(|p| p.matches_path_with(path, match_options()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs::{self, File};
    use std::io::Write;
    use tempfile::TempDir;

    fn create_test_file(dir: &Path, name: &str) -> PathBuf {
        let path = dir.join(name);
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).unwrap();
        }
        File::create(&path).unwrap().write_all(b"content").unwrap();
        path
    }

    #[test]
    fn test_glob_base() {
        assert_eq!(glob_base("app/**/*.js"), PathBuf::from("app"));
        assert_eq!(glob_base("./images/**/*"), PathBuf::from("images"));
        assert_eq!(glob_base("app/index.html"), PathBuf::from("app"));
        assert_eq!(
            glob_base("bower_components/bootstrap-sass/assets/fonts/bootstrap/*"),
            PathBuf::from("bower_components/bootstrap-sass/assets/fonts/bootstrap")
        );
        assert_eq!(glob_base("*.js"), PathBuf::new());
    }

    #[test]
    fn test_discover_files_recursive() {
        let temp = TempDir::new().unwrap();
        create_test_file(temp.path(), "app/a.js");
        create_test_file(temp.path(), "app/sub/b.js");
        create_test_file(temp.path(), "app/sub/deep/c.js");
        create_test_file(temp.path(), "app/readme.md");

        let files = discover_files(temp.path(), "app/**/*.js").unwrap();
        assert_eq!(files.len(), 3);
    }

    #[test]
    fn test_discover_files_no_match() {
        let temp = TempDir::new().unwrap();
        create_test_file(temp.path(), "app/a.css");

        let files = discover_files(temp.path(), "app/**/*.js").unwrap();
        assert!(files.is_empty());
    }

    #[test]
    fn test_discover_with_negation() {
        let temp = TempDir::new().unwrap();
        create_test_file(temp.path(), "app/index.html");
        create_test_file(temp.path(), "app/views/home.html");

        let patterns = vec!["app/**/*.html".to_string(), "!app/index.html".to_string()];
        let files = discover(temp.path(), &patterns).unwrap();
        assert_eq!(files.len(), 1);
        assert!(files[0].path.ends_with("views/home.html"));
        assert_eq!(files[0].base, temp.path().join("app"));
    }

    #[test]
    fn test_discover_preserves_pattern_order_and_dedupes() {
        let temp = TempDir::new().unwrap();
        create_test_file(temp.path(), "app/a.js");
        create_test_file(temp.path(), "app/b.jsx");

        let patterns =
            vec!["app/**/*.jsx".to_string(), "app/**/*".to_string(), "app/**/*.js".to_string()];
        let files = discover(temp.path(), &patterns).unwrap();
        let names: Vec<_> =
            files.iter().map(|f| f.path.file_name().unwrap().to_string_lossy().into_owned()).collect();
        assert_eq!(names, vec!["b.jsx", "a.js"]);
    }

    #[test]
    fn test_read_sources() {
        let temp = TempDir::new().unwrap();
        create_test_file(temp.path(), "images/logo.png");

        let set = read_sources(temp.path(), &["images/**/*".to_string()]).unwrap();
        assert_eq!(set.len(), 1);
        let asset = set.iter().next().unwrap();
        assert_eq!(asset.relative(), PathBuf::from("logo.png"));
        assert_eq!(asset.contents, b"content");
    }

    #[test]
    fn test_invalid_pattern() {
        let temp = TempDir::new().unwrap();
        let result = discover(temp.path(), &["app/[".to_string()]);
        assert!(matches!(result, Err(DiscoveryError::InvalidPattern(_, _))));
    }

    #[test]
    fn test_matches_patterns() {
        let root = Path::new("/p");
        let patterns = vec!["app/**/*.html".to_string(), "!app/index.html".to_string()];
        assert!(matches_patterns(root, &patterns, Path::new("/p/app/views/home.html")));
        assert!(!matches_patterns(root, &patterns, Path::new("/p/app/index.html")));
        assert!(!matches_patterns(root, &patterns, Path::new("/p/app/app.js")));

        let styles = vec!["./app/**/*.scss".to_string()];
        assert!(matches_patterns(root, &styles, Path::new("/p/app/site.scss")));
    }
}
