//! Vendor component resolution.
//!
//! Finds the main files of installed bower components: the project manifest
//! lists dependencies (and may override a component's `main`), each component
//! manifest names its main files and its own dependencies, which come first.

use crate::asset::{Asset, FileSet};
use crate::config::VendorConfig;
use crate::discovery::{discover_files, DiscoveryError};
use serde::Deserialize;
use std::collections::{HashMap, HashSet};
use std::path::{Component, Path, PathBuf};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum VendorError {
    #[error("Failed to read {}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Invalid manifest {}: {source}", path.display())]
    Manifest {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },

    #[error("Component '{0}' is not installed (run bower install)")]
    MissingComponent(String),

    #[error("Main file '{pattern}' of component '{component}' not found")]
    MissingMain { component: String, pattern: String },

    #[error(transparent)]
    Discovery(#[from] DiscoveryError),
}

/// `main` may be a single path or a list of paths.
#[derive(Debug, Clone, Deserialize)]
#[serde(untagged)]
pub enum MainFiles {
    One(String),
    Many(Vec<String>),
}

impl MainFiles {
    pub fn to_vec(&self) -> Vec<String> {
        match self {
            MainFiles::One(s) => vec![s.clone()],
            MainFiles::Many(v) => v.clone(),
        }
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct Override {
    #[serde(default)]
    pub main: Option<MainFiles>,
    #[serde(default)]
    pub dependencies: Option<serde_json::Map<String, serde_json::Value>>,
}

/// The fields of a `bower.json` that resolution needs.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct Manifest {
    #[serde(default)]
    pub main: Option<MainFiles>,
    #[serde(default)]
    pub dependencies: serde_json::Map<String, serde_json::Value>,
    #[serde(default)]
    pub overrides: HashMap<String, Override>,
}

impl Manifest {
    pub fn read(path: &Path) -> Result<Self, VendorError> {
        let text =
            std::fs::read_to_string(path).map_err(|e| VendorError::Io { path: path.to_path_buf(), source: e })?;
        serde_json::from_str(&text).map_err(|e| VendorError::Manifest { path: path.to_path_buf(), source: e })
    }
}

struct Resolver<'a> {
    components_dir: PathBuf,
    overrides: &'a HashMap<String, Override>,
    visited: HashSet<String>,
    files: FileSet,
}

impl Resolver<'_> {
    fn component_manifest(&self, name: &str) -> Result<Manifest, VendorError> {
        let dir = self.components_dir.join(name);
        if !dir.is_dir() {
            return Err(VendorError::MissingComponent(name.to_string()));
        }
        for file in ["bower.json", ".bower.json"] {
            let path = dir.join(file);
            if path.is_file() {
                return Manifest::read(&path);
            }
        }
        Ok(Manifest::default())
    }

    fn visit(&mut self, name: &str) -> Result<(), VendorError> {
        if !self.visited.insert(name.to_string()) {
            return Ok(());
        }

        let manifest = self.component_manifest(name)?;
        let overrides = self.overrides.get(name).cloned().unwrap_or_default();

        let dependencies = overrides.dependencies.unwrap_or(manifest.dependencies);
        for dep in dependencies.keys() {
            self.visit(dep)?;
        }

        let main = match overrides.main.or(manifest.main) {
            Some(main) => main.to_vec(),
            None => {
                tracing::debug!("component '{}' declares no main files", name);
                return Ok(());
            }
        };

        let dir = self.components_dir.join(name);
        for pattern in main {
            let matches = discover_files(&dir, &pattern)?;
            if matches.is_empty() {
                return Err(VendorError::MissingMain { component: name.to_string(), pattern });
            }
            for path in matches {
                let asset = Asset::read(&self.components_dir, &path)
                    .map_err(|e| VendorError::Io { path: path.clone(), source: e })?;
                self.files.push(asset);
            }
        }

        Ok(())
    }
}

/// Resolve the main files of every component, dependencies before dependents.
///
/// Assets are based at the components directory, so their relative path is
/// `<component>/<file>`. A project without a manifest has no vendor files.
pub fn resolve(project_root: &Path, config: &VendorConfig) -> Result<FileSet, VendorError> {
    let manifest_path = project_root.join(&config.manifest);
    if !manifest_path.is_file() {
        tracing::debug!("no vendor manifest at {}", manifest_path.display());
        return Ok(FileSet::new());
    }
    let manifest = Manifest::read(&manifest_path)?;

    let mut resolver = Resolver {
        components_dir: project_root.join(&config.components_dir),
        overrides: &manifest.overrides,
        visited: HashSet::new(),
        files: FileSet::new(),
    };
    for name in manifest.dependencies.keys() {
        resolver.visit(name)?;
    }

    tracing::debug!("resolved {} vendor files", resolver.files.len());
    Ok(resolver.files)
}

fn matches_priority(asset: &Asset, entry: &str) -> bool {
    let stem = asset.path.file_stem().map(|s| s.to_string_lossy().into_owned());
    asset.file_name() == entry
        || stem.as_deref() == Some(entry)
        || asset.relative().components().any(|c| matches!(c, Component::Normal(n) if n == entry))
}

/// Put files named by `priority` first, in list order. Everything else keeps
/// its original order after them.
pub fn order_by_priority(files: FileSet, priority: &[String]) -> FileSet {
    let mut rest: Vec<Option<Asset>> = files.into_iter().map(Some).collect();
    let mut ordered = FileSet::new();

    for entry in priority {
        for slot in rest.iter_mut() {
            if slot.as_ref().is_some_and(|a| matches_priority(a, entry)) {
                if let Some(asset) = slot.take() {
                    ordered.push(asset);
                }
            }
        }
    }
    ordered.extend(rest.into_iter().flatten().collect());
    ordered
}
