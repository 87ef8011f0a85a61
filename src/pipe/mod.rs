//! Named file-processing pipelines.
//!
//! Each pipe has a fixed set of input pipes and a body that turns their file
//! sets (and files it discovers itself) into a new file set. Pipes that write
//! to an output root return the written files, based at that root.

pub mod graph;
pub mod library;
pub mod output;
pub mod runner;

pub use graph::{GraphError, PipeGraph};
pub use runner::{PipeRunner, RunOutcome};

use crate::diagnostic::{error_count, Diagnostic};
use crate::discovery::DiscoveryError;
use crate::markup::MarkupError;
use crate::paths::Profile;
use crate::script::{OrderError, ScanError};
use crate::sourcemap::MapError;
use crate::style::StyleError;
use crate::vendor::VendorError;
use std::path::PathBuf;
use thiserror::Error;

/// Every pipe of the build.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum PipeId {
    ValidatedAppScripts,
    BuiltAppScriptsDev,
    ValidatedPartials,
    ScriptedPartials,
    BuiltAppScriptsProd,
    BuiltVendorScriptsDev,
    BuiltVendorScriptsProd,
    ValidatedDevServerScripts,
    BuiltPartialsDev,
    BuiltStylesDev,
    BuiltStylesProd,
    ProcessedImagesDev,
    ProcessedImagesProd,
    BuiltFontsDev,
    BuiltFontsProd,
    ValidatedIndex,
    BuiltIndexDev,
    BuiltIndexProd,
    BuiltAppDev,
    BuiltAppProd,
}

impl PipeId {
    pub const ALL: [PipeId; 20] = [
        PipeId::ValidatedAppScripts,
        PipeId::BuiltAppScriptsDev,
        PipeId::ValidatedPartials,
        PipeId::ScriptedPartials,
        PipeId::BuiltAppScriptsProd,
        PipeId::BuiltVendorScriptsDev,
        PipeId::BuiltVendorScriptsProd,
        PipeId::ValidatedDevServerScripts,
        PipeId::BuiltPartialsDev,
        PipeId::BuiltStylesDev,
        PipeId::BuiltStylesProd,
        PipeId::ProcessedImagesDev,
        PipeId::ProcessedImagesProd,
        PipeId::BuiltFontsDev,
        PipeId::BuiltFontsProd,
        PipeId::ValidatedIndex,
        PipeId::BuiltIndexDev,
        PipeId::BuiltIndexProd,
        PipeId::BuiltAppDev,
        PipeId::BuiltAppProd,
    ];

    pub fn name(self) -> &'static str {
        match self {
            PipeId::ValidatedAppScripts => "validated-app-scripts",
            PipeId::BuiltAppScriptsDev => "built-app-scripts-dev",
            PipeId::ValidatedPartials => "validated-partials",
            PipeId::ScriptedPartials => "scripted-partials",
            PipeId::BuiltAppScriptsProd => "built-app-scripts-prod",
            PipeId::BuiltVendorScriptsDev => "built-vendor-scripts-dev",
            PipeId::BuiltVendorScriptsProd => "built-vendor-scripts-prod",
            PipeId::ValidatedDevServerScripts => "validated-dev-server-scripts",
            PipeId::BuiltPartialsDev => "built-partials-dev",
            PipeId::BuiltStylesDev => "built-styles-dev",
            PipeId::BuiltStylesProd => "built-styles-prod",
            PipeId::ProcessedImagesDev => "processed-images-dev",
            PipeId::ProcessedImagesProd => "processed-images-prod",
            PipeId::BuiltFontsDev => "built-fonts-dev",
            PipeId::BuiltFontsProd => "built-fonts-prod",
            PipeId::ValidatedIndex => "validated-index",
            PipeId::BuiltIndexDev => "built-index-dev",
            PipeId::BuiltIndexProd => "built-index-prod",
            PipeId::BuiltAppDev => "built-app-dev",
            PipeId::BuiltAppProd => "built-app-prod",
        }
    }

    pub fn from_name(name: &str) -> Option<PipeId> {
        PipeId::ALL.iter().copied().find(|p| p.name() == name)
    }

    /// Pipes whose complete output this pipe consumes.
    pub fn inputs(self) -> &'static [PipeId] {
        use PipeId::*;
        match self {
            BuiltAppScriptsDev => &[ValidatedAppScripts],
            ScriptedPartials => &[ValidatedPartials],
            BuiltAppScriptsProd => &[ScriptedPartials, ValidatedAppScripts],
            BuiltPartialsDev => &[ValidatedPartials],
            BuiltIndexDev => {
                &[BuiltVendorScriptsDev, BuiltAppScriptsDev, BuiltStylesDev, BuiltFontsDev, ValidatedIndex]
            }
            BuiltIndexProd => {
                &[BuiltVendorScriptsProd, BuiltAppScriptsProd, BuiltStylesProd, BuiltFontsProd, ValidatedIndex]
            }
            BuiltAppDev => &[BuiltIndexDev, BuiltPartialsDev, ProcessedImagesDev],
            BuiltAppProd => &[BuiltIndexProd, ProcessedImagesProd],
            ValidatedAppScripts
            | ValidatedPartials
            | BuiltVendorScriptsDev
            | BuiltVendorScriptsProd
            | ValidatedDevServerScripts
            | BuiltStylesDev
            | BuiltStylesProd
            | ProcessedImagesDev
            | ProcessedImagesProd
            | BuiltFontsDev
            | BuiltFontsProd
            | ValidatedIndex => &[],
        }
    }

    /// The output tree this pipe writes into, if any.
    pub fn profile(self) -> Option<Profile> {
        use PipeId::*;
        match self {
            BuiltAppScriptsDev | BuiltVendorScriptsDev | BuiltPartialsDev | BuiltStylesDev
            | ProcessedImagesDev | BuiltFontsDev | BuiltIndexDev | BuiltAppDev => Some(Profile::Dev),
            BuiltAppScriptsProd | BuiltVendorScriptsProd | BuiltStylesProd | ProcessedImagesProd
            | BuiltFontsProd | BuiltIndexProd | BuiltAppProd => Some(Profile::Prod),
            ValidatedAppScripts | ValidatedPartials | ScriptedPartials | ValidatedDevServerScripts
            | ValidatedIndex => None,
        }
    }
}

impl std::fmt::Display for PipeId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.name())
    }
}

/// Error from a pipe body.
#[derive(Debug, Error)]
pub enum PipeError {
    /// Source files failed validation
    #[error("{} error(s) found while validating sources", error_count(.diagnostics))]
    Validation { diagnostics: Vec<Diagnostic> },

    #[error(transparent)]
    Discovery(#[from] DiscoveryError),

    #[error("{}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("{}: {source}", path.display())]
    Script {
        path: PathBuf,
        #[source]
        source: ScanError,
    },

    #[error("{}: {source}", path.display())]
    Markup {
        path: PathBuf,
        #[source]
        source: MarkupError,
    },

    #[error(transparent)]
    Order(#[from] OrderError),

    #[error(transparent)]
    Style(#[from] StyleError),

    #[error(transparent)]
    Vendor(#[from] VendorError),

    #[error(transparent)]
    SourceMap(#[from] MapError),

    /// Refused to write outside the project
    #[error("refusing to write {} outside of {}", path.display(), root.display())]
    OutsideRoot { path: PathBuf, root: PathBuf },
}

impl PipeError {
    /// Diagnostics carried by a validation failure.
    pub fn diagnostics(&self) -> &[Diagnostic] {
        match self {
            PipeError::Validation { diagnostics } => diagnostics,
            _ => &[],
        }
    }

    pub fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        PipeError::Io { path: path.into(), source }
    }
}
