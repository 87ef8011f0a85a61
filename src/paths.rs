//! Path registry: asset classes mapped to source globs and output locations.
//!
//! Built once from the `[paths]` config section and resolved against the
//! project root. Lookups never fail.

use crate::config::PathsConfig;
use std::path::{Path, PathBuf};

/// A logical group of source files.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum AssetClass {
    Scripts,
    Styles,
    Images,
    Fonts,
    Index,
    Partials,
    DevServerScripts,
}

impl AssetClass {
    pub const ALL: [AssetClass; 7] = [
        AssetClass::Scripts,
        AssetClass::Styles,
        AssetClass::Images,
        AssetClass::Fonts,
        AssetClass::Index,
        AssetClass::Partials,
        AssetClass::DevServerScripts,
    ];
}

impl std::fmt::Display for AssetClass {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            AssetClass::Scripts => write!(f, "scripts"),
            AssetClass::Styles => write!(f, "styles"),
            AssetClass::Images => write!(f, "images"),
            AssetClass::Fonts => write!(f, "fonts"),
            AssetClass::Index => write!(f, "index"),
            AssetClass::Partials => write!(f, "partials"),
            AssetClass::DevServerScripts => write!(f, "dev-server-scripts"),
        }
    }
}

/// Build flavour; selects the output root.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Profile {
    Dev,
    Prod,
}

impl std::fmt::Display for Profile {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Profile::Dev => write!(f, "dev"),
            Profile::Prod => write!(f, "prod"),
        }
    }
}

/// Resolved, read-only view of the project's paths.
#[derive(Debug, Clone)]
pub struct PathRegistry {
    project_root: PathBuf,
    scripts: Vec<String>,
    styles: Vec<String>,
    images: Vec<String>,
    fonts: Vec<String>,
    index: String,
    partials: Vec<String>,
    dev_server_scripts: Vec<String>,
    dist_dev: PathBuf,
    dist_prod: PathBuf,
    prod_scripts: PathBuf,
    images_dir: PathBuf,
    fonts_dir: PathBuf,
    vendor_dev_dir: PathBuf,
}

impl PathRegistry {
    /// Resolve the configured paths against `project_root`.
    pub fn from_config(paths: &PathsConfig, project_root: &Path) -> Self {
        let resolve = |p: &Path| {
            if p.is_absolute() {
                p.to_path_buf()
            } else {
                project_root.join(p)
            }
        };

        Self {
            project_root: project_root.to_path_buf(),
            scripts: paths.scripts.clone(),
            styles: paths.styles.clone(),
            images: paths.images.clone(),
            fonts: paths.fonts.clone(),
            index: paths.index.clone(),
            partials: paths.partials.clone(),
            dev_server_scripts: paths.dev_server_scripts.clone(),
            dist_dev: resolve(&paths.dist_dev),
            dist_prod: resolve(&paths.dist_prod),
            prod_scripts: paths.prod_scripts.clone(),
            images_dir: paths.images_dir.clone(),
            fonts_dir: paths.fonts_dir.clone(),
            vendor_dev_dir: paths.vendor_dev_dir.clone(),
        }
    }

    pub fn project_root(&self) -> &Path {
        &self.project_root
    }

    /// Glob patterns for an asset class, relative to the project root.
    pub fn patterns(&self, class: AssetClass) -> &[String] {
        match class {
            AssetClass::Scripts => &self.scripts,
            AssetClass::Styles => &self.styles,
            AssetClass::Images => &self.images,
            AssetClass::Fonts => &self.fonts,
            AssetClass::Index => std::slice::from_ref(&self.index),
            AssetClass::Partials => &self.partials,
            AssetClass::DevServerScripts => &self.dev_server_scripts,
        }
    }

    /// Absolute path of the entry document.
    pub fn index_file(&self) -> PathBuf {
        self.project_root.join(&self.index)
    }

    /// Output root for a profile.
    pub fn root(&self, profile: Profile) -> &Path {
        match profile {
            Profile::Dev => &self.dist_dev,
            Profile::Prod => &self.dist_prod,
        }
    }

    /// Where bundled production scripts are written.
    pub fn prod_scripts_dir(&self) -> PathBuf {
        self.dist_prod.join(&self.prod_scripts)
    }

    pub fn images_dir(&self, profile: Profile) -> PathBuf {
        self.root(profile).join(&self.images_dir)
    }

    pub fn fonts_dir(&self, profile: Profile) -> PathBuf {
        self.root(profile).join(&self.fonts_dir)
    }

    /// Where unbundled vendor components are copied for development.
    pub fn vendor_dev_dir(&self) -> PathBuf {
        self.dist_dev.join(&self.vendor_dev_dir)
    }
}
