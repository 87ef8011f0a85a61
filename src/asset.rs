//! In-memory files flowing between pipes.

use std::path::{Path, PathBuf};

/// A file read from disk or produced by a pipe step.
///
/// `base` is the directory the file's relative path is measured from: the
/// static prefix of the glob that found it, or the output root it was written to.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Asset {
    pub base: PathBuf,
    pub path: PathBuf,
    pub contents: Vec<u8>,
}

impl Asset {
    pub fn new(base: impl Into<PathBuf>, path: impl Into<PathBuf>, contents: Vec<u8>) -> Self {
        Self { base: base.into(), path: path.into(), contents }
    }

    /// Read a file from disk.
    pub fn read(base: &Path, path: &Path) -> std::io::Result<Self> {
        let contents = std::fs::read(path)?;
        Ok(Self::new(base, path, contents))
    }

    /// Path relative to `base`. Falls back to the file name if the path lies
    /// outside the base.
    pub fn relative(&self) -> PathBuf {
        match self.path.strip_prefix(&self.base) {
            Ok(rel) => rel.to_path_buf(),
            Err(_) => self.path.file_name().map(PathBuf::from).unwrap_or_default(),
        }
    }

    /// Relative path with forward slashes, as used in URLs and template ids.
    pub fn relative_url(&self) -> String {
        self.relative()
            .components()
            .map(|c| c.as_os_str().to_string_lossy().into_owned())
            .collect::<Vec<_>>()
            .join("/")
    }

    pub fn file_name(&self) -> String {
        self.path.file_name().map(|n| n.to_string_lossy().into_owned()).unwrap_or_default()
    }

    pub fn extension(&self) -> Option<String> {
        self.path.extension().map(|e| e.to_string_lossy().to_lowercase())
    }

    /// Contents as UTF-8 text (lossy).
    pub fn text(&self) -> String {
        String::from_utf8_lossy(&self.contents).into_owned()
    }

    pub fn with_contents(mut self, contents: impl Into<Vec<u8>>) -> Self {
        self.contents = contents.into();
        self
    }

    /// Replace the extension, keeping base and directory.
    pub fn with_extension(mut self, ext: &str) -> Self {
        self.path.set_extension(ext);
        self
    }

    /// Insert `.min` before the extension (`site.css` -> `site.min.css`).
    pub fn minified_name(mut self) -> Self {
        let stem = self.path.file_stem().map(|s| s.to_string_lossy().into_owned());
        let ext = self.path.extension().map(|e| e.to_string_lossy().into_owned());
        if let Some(stem) = stem {
            let name = match ext {
                Some(ext) => format!("{}.min.{}", stem, ext),
                None => format!("{}.min", stem),
            };
            self.path.set_file_name(name);
        }
        self
    }

    /// Drop the directory part of the relative path.
    pub fn flattened(mut self) -> Self {
        let name = self.file_name();
        self.path = self.base.join(name);
        self
    }

    /// Move the asset under a new base, keeping its relative path.
    pub fn rebased(mut self, base: &Path) -> Self {
        let rel = self.relative();
        self.path = base.join(rel);
        self.base = base.to_path_buf();
        self
    }
}

/// An ordered collection of assets.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FileSet {
    assets: Vec<Asset>,
}

impl FileSet {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, asset: Asset) {
        self.assets.push(asset);
    }

    pub fn extend(&mut self, other: FileSet) {
        self.assets.extend(other.assets);
    }

    pub fn len(&self) -> usize {
        self.assets.len()
    }

    pub fn is_empty(&self) -> bool {
        self.assets.is_empty()
    }

    pub fn iter(&self) -> std::slice::Iter<'_, Asset> {
        self.assets.iter()
    }

    pub fn paths(&self) -> Vec<PathBuf> {
        self.assets.iter().map(|a| a.path.clone()).collect()
    }

    /// Assets whose extension is `ext` (case-insensitive, no dot).
    pub fn with_extension(&self, ext: &str) -> FileSet {
        self.assets
            .iter()
            .filter(|a| a.extension().as_deref() == Some(ext))
            .cloned()
            .collect()
    }

    /// Apply a fallible transformation to every asset, stopping at the first error.
    pub fn try_map<E>(self, f: impl FnMut(Asset) -> Result<Asset, E>) -> Result<FileSet, E> {
        let assets = self.assets.into_iter().map(f).collect::<Result<Vec<_>, E>>()?;
        Ok(FileSet { assets })
    }

    pub fn map(self, f: impl FnMut(Asset) -> Asset) -> FileSet {
        FileSet { assets: self.assets.into_iter().map(f).collect() }
    }

    pub fn into_vec(self) -> Vec<Asset> {
        self.assets
    }
}

impl FromIterator<Asset> for FileSet {
    fn from_iter<I: IntoIterator<Item = Asset>>(iter: I) -> Self {
        Self { assets: iter.into_iter().collect() }
    }
}

impl From<Vec<Asset>> for FileSet {
    fn from(assets: Vec<Asset>) -> Self {
        Self { assets }
    }
}

impl IntoIterator for FileSet {
    type Item = Asset;
    type IntoIter = std::vec::IntoIter<Asset>;

    fn into_iter(self) -> Self::IntoIter {
        self.assets.into_iter()
    }
}

impl<'a> IntoIterator for &'a FileSet {
    type Item = &'a Asset;
    type IntoIter = std::slice::Iter<'a, Asset>;

    fn into_iter(self) -> Self::IntoIter {
        self.assets.iter()
    }
}
