//! Assetline - front-end asset pipelines
//!
//! This library provides:
//! - A path registry mapping asset classes to source globs and output roots
//! - A pipe library that validates, compiles, bundles and injects assets
//! - A task registry with prerequisites, run level-parallel over the pipe graph
//! - A static dev server with file watching and live reload

pub mod asset;
pub mod clean;
pub mod cli;
pub mod config;
pub mod context;
pub mod diagnostic;
pub mod discovery;
pub mod inject;
pub mod markup;
pub mod paths;
pub mod pipe;
pub mod script;
pub mod server;
pub mod sourcemap;
pub mod style;
pub mod task;
pub mod vendor;
pub mod watch;
