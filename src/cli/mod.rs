//! Command-line interface implementation
//!
//! Parses arguments, loads the project configuration and dispatches to the
//! task runner or the informational commands.

mod info;
mod run;

use crate::config::loader::{find_config_from, load_config, merge_cli_overrides, CliOverrides};
use crate::config::Config;
use crate::context::BuildContext;
use clap::{Parser, Subcommand};
use std::path::{Path, PathBuf};
use std::process::ExitCode;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

/// Exit codes
pub(crate) const EXIT_SUCCESS: u8 = 0;
pub(crate) const EXIT_ERROR: u8 = 1;
pub(crate) const EXIT_INVALID_ARGS: u8 = 2;

/// Environment variable holding the log filter
pub const LOG_ENV: &str = "ASSETLINE_LOG";

/// Assetline - front-end asset pipelines with a dev server and live reload
#[derive(Parser)]
#[command(name = "assetline")]
#[command(about = "Assetline - build, bundle and serve front-end assets")]
#[command(version)]
#[command(args_conflicts_with_subcommands = true)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Option<Commands>,

    /// Tasks to run (default: `default`)
    pub tasks: Vec<String>,

    #[command(flatten)]
    pub options: GlobalOptions,
}

#[derive(clap::Args, Debug, Clone, Default)]
pub struct GlobalOptions {
    /// Config file (default: assetline.toml found by walking up)
    #[arg(long, global = true)]
    pub config: Option<PathBuf>,

    /// Project root (default: directory of the config file)
    #[arg(long, global = true)]
    pub project_root: Option<PathBuf>,

    /// Worker threads per pipe level (default: available parallelism)
    #[arg(short, long, global = true)]
    pub jobs: Option<usize>,

    /// Verbose output
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Override the development output root
    #[arg(long, global = true)]
    pub dist_dev: Option<PathBuf>,

    /// Override the production output root
    #[arg(long, global = true)]
    pub dist_prod: Option<PathBuf>,

    /// Dev server port
    #[arg(long, global = true)]
    pub port: Option<u16>,

    /// Do not inject the live reload client
    #[arg(long, global = true)]
    pub no_reload: bool,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Run tasks and their prerequisites
    Run {
        /// Task names (default: `default`)
        tasks: Vec<String>,
    },

    /// List tasks with their prerequisites
    List,

    /// Show the pipe graph by dependency level
    Graph {
        /// Only show this pipe and its inputs
        pipe: Option<String>,
    },
}

/// Run the CLI
pub fn run() -> ExitCode {
    let cli = Cli::parse();
    init_logging(cli.options.verbose);

    match cli.command {
        Some(Commands::Run { tasks }) => run::run_tasks(&tasks, &cli.options),
        Some(Commands::List) => info::run_list(),
        Some(Commands::Graph { pipe }) => info::run_graph(pipe.as_deref()),
        None => run::run_tasks(&cli.tasks, &cli.options),
    }
}

fn init_logging(verbose: bool) {
    let fallback = if verbose { "assetline=debug,tower_http=debug" } else { "assetline=info" };
    let filter = EnvFilter::try_from_env(LOG_ENV).unwrap_or_else(|_| EnvFilter::new(fallback));

    let _ = tracing_subscriber::registry()
        .with(fmt::layer().with_writer(std::io::stderr).with_target(false).compact())
        .with(filter)
        .try_init();
}

/// Load the configuration and resolve the project root.
pub(crate) fn load_project(options: &GlobalOptions) -> Result<BuildContext, String> {
    let cwd = std::env::current_dir().map_err(|e| format!("Cannot read working directory: {}", e))?;
    let start = options.project_root.clone().unwrap_or_else(|| cwd.clone());

    let config_path = match &options.config {
        Some(path) => Some(path.clone()),
        None => find_config_from(start.clone()),
    };

    let mut config: Config = match &config_path {
        Some(path) => {
            tracing::debug!("Using config: {}", path.display());
            load_config(Some(path)).map_err(|e| format!("Error loading config: {}", e))?
        }
        None => {
            tracing::debug!("No assetline.toml found, using defaults");
            crate::config::loader::default_config()
        }
    };

    let overrides = CliOverrides {
        dist_dev: options.dist_dev.clone(),
        dist_prod: options.dist_prod.clone(),
        port: options.port,
        no_reload: options.no_reload,
    };
    merge_cli_overrides(&mut config, &overrides);

    let root = match (&options.project_root, &config_path) {
        (Some(root), _) => root.clone(),
        (None, Some(path)) => path.parent().map(Path::to_path_buf).unwrap_or_else(|| cwd.clone()),
        (None, None) => cwd,
    };
    let root = root.canonicalize().map_err(|e| format!("Project root {}: {}", root.display(), e))?;

    let mut ctx = BuildContext::new(config, root).with_verbose(options.verbose);
    if let Some(jobs) = options.jobs {
        ctx = ctx.with_jobs(jobs);
    }
    Ok(ctx)
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn test_cli_definition() {
        Cli::command().debug_assert();
    }

    #[test]
    fn test_bare_tasks() {
        let cli = Cli::try_parse_from(["assetline", "clean-dev", "build-app-dev", "--jobs", "2"]).unwrap();
        assert!(cli.command.is_none());
        assert_eq!(cli.tasks, vec!["clean-dev", "build-app-dev"]);
        assert_eq!(cli.options.jobs, Some(2));
    }

    #[test]
    fn test_run_subcommand() {
        let cli = Cli::try_parse_from(["assetline", "run", "watch-dev", "--verbose"]).unwrap();
        match cli.command {
            Some(Commands::Run { tasks }) => assert_eq!(tasks, vec!["watch-dev"]),
            _ => panic!("expected run"),
        }
        assert!(cli.options.verbose);
    }

    #[test]
    fn test_graph_subcommand() {
        let cli = Cli::try_parse_from(["assetline", "graph", "built-app-prod"]).unwrap();
        assert!(matches!(cli.command, Some(Commands::Graph { pipe: Some(ref p) }) if p == "built-app-prod"));
    }

    #[test]
    fn test_load_project_with_config() {
        let temp = tempfile::TempDir::new().unwrap();
        std::fs::write(temp.path().join("assetline.toml"), "[server]\nport = 4000\n").unwrap();

        let options = GlobalOptions {
            project_root: Some(temp.path().to_path_buf()),
            dist_dev: Some(PathBuf::from("out/dev")),
            jobs: Some(3),
            ..Default::default()
        };
        let ctx = load_project(&options).unwrap();

        assert_eq!(ctx.config().server.port, 4000);
        assert_eq!(ctx.jobs(), 3);
        assert!(ctx.paths().root(crate::paths::Profile::Dev).ends_with("out/dev"));
    }
}
