//! Watch controller integration tests
//!
//! Drives the controller with changed paths directly instead of waiting on
//! filesystem events, after an initial build of both output roots.

use std::fs;
use std::path::{Path, PathBuf};
use std::time::{Duration, SystemTime};
use tempfile::TempDir;

use assetline::config::Config;
use assetline::context::BuildContext;
use assetline::paths::Profile;
use assetline::pipe::{PipeGraph, PipeId};
use assetline::server::LiveReload;
use assetline::task::{NullProgress, TaskRegistry, TaskRunner};
use assetline::watch::WatchController;

fn create_test_file(root: &Path, rel: &str, content: &str) -> PathBuf {
    let path = root.join(rel);
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent).unwrap();
    }
    fs::write(&path, content).unwrap();
    path
}

fn create_project() -> TempDir {
    let temp = TempDir::new().unwrap();
    let root = temp.path();
    create_test_file(
        root,
        "app/index.html",
        "<!DOCTYPE html>\n<html><head>\n<!-- inject:css -->\n<!-- endinject -->\n</head><body>\n\
         <!-- inject:js -->\n<!-- endinject -->\n</body></html>\n",
    );
    create_test_file(root, "app/app.js", "angular.module('app', ['templates']);\n");
    create_test_file(root, "app/views/list.html", "<ul><li>one</li></ul>\n");
    create_test_file(root, "app/styles/site.scss", "$gap: 4px;\n.list { margin: $gap; }\n");
    temp
}

fn build_everything(ctx: &BuildContext, graph: &PipeGraph) {
    let registry = TaskRegistry::standard().unwrap();
    let progress = NullProgress::new();
    let report =
        TaskRunner::new(ctx, &registry, graph, &progress).run(&["build-app-dev", "build-app-prod"]).unwrap();
    assert!(report.is_success(), "{}", report.summary());
}

/// Modification times of every file below `dir`.
fn snapshot(dir: &Path) -> Vec<(PathBuf, SystemTime)> {
    let mut files = Vec::new();
    let mut stack = vec![dir.to_path_buf()];
    while let Some(current) = stack.pop() {
        for entry in fs::read_dir(&current).unwrap() {
            let path = entry.unwrap().path();
            if path.is_dir() {
                stack.push(path);
            } else {
                let modified = fs::metadata(&path).unwrap().modified().unwrap();
                files.push((path, modified));
            }
        }
    }
    files.sort();
    files
}

#[test]
fn test_style_change_updates_dev_output_and_reloads() {
    let temp = create_project();
    let root = temp.path();
    let ctx = BuildContext::new(Config::default(), root.to_path_buf());
    let graph = PipeGraph::new().unwrap();
    build_everything(&ctx, &graph);

    let artifact = root.join("dist.dev/styles/site.css");
    let before = fs::metadata(&artifact).unwrap().modified().unwrap();
    let prod_before = snapshot(&root.join("dist.prod"));

    // Coarse filesystem timestamps
    std::thread::sleep(Duration::from_millis(1100));
    let source = create_test_file(root, "app/styles/site.scss", "$gap: 8px;\n.list { margin: $gap; }\n");

    let live = LiveReload::new();
    let mut client = live.subscribe();
    let mut controller = WatchController::new(&ctx, &graph, Profile::Dev, live);
    let rebuild = controller.handle_paths(&[source]).unwrap();

    assert!(rebuild.success);
    assert_eq!(rebuild.pipes, vec![PipeId::BuiltStylesDev]);

    let after = fs::metadata(&artifact).unwrap().modified().unwrap();
    assert!(after > before, "style artifact was not rewritten");
    assert!(fs::read_to_string(&artifact).unwrap().contains("8px"));

    let event = client.try_recv().unwrap();
    assert_eq!(event.paths, vec!["/styles/site.css".to_string()]);
    assert!(event.css_only);

    assert_eq!(snapshot(&root.join("dist.prod")), prod_before, "prod output changed");
}

#[test]
fn test_prod_partial_change_rebuilds_app_bundle() {
    let temp = create_project();
    let root = temp.path();
    let ctx = BuildContext::new(Config::default(), root.to_path_buf());
    let graph = PipeGraph::new().unwrap();
    build_everything(&ctx, &graph);

    let partial = create_test_file(root, "app/views/list.html", "<ul><li>two</li></ul>\n");
    let mut controller = WatchController::new(&ctx, &graph, Profile::Prod, LiveReload::new());
    let rebuild = controller.handle_paths(&[partial]).unwrap();

    assert!(rebuild.success);
    assert_eq!(rebuild.pipes, vec![PipeId::BuiltAppScriptsProd]);
    let bundle = fs::read_to_string(root.join("dist.prod/scripts/app.min.js")).unwrap();
    assert!(bundle.contains("<li>two</li>"));
    assert!(!bundle.contains("<li>one</li>"));
}

#[test]
fn test_broken_partial_keeps_watching() {
    let temp = create_project();
    let root = temp.path();
    let ctx = BuildContext::new(Config::default(), root.to_path_buf());
    let graph = PipeGraph::new().unwrap();
    build_everything(&ctx, &graph);

    let live = LiveReload::new();
    let mut client = live.subscribe();
    let mut controller = WatchController::new(&ctx, &graph, Profile::Dev, live);

    let partial = create_test_file(root, "app/views/list.html", "<ul><li>two</ul>\n");
    let rebuild = controller.handle_paths(&[partial.clone()]).unwrap();
    assert!(!rebuild.success);
    assert!(client.try_recv().is_err());

    // The previous output stays in place
    assert!(fs::read_to_string(root.join("dist.dev/views/list.html")).unwrap().contains("one"));

    create_test_file(root, "app/views/list.html", "<ul><li>two</li></ul>\n");
    let rebuild = controller.handle_paths(&[partial.clone()]).unwrap();
    assert!(rebuild.success);
    assert_eq!(rebuild.fixed, vec![partial]);
    assert_eq!(client.try_recv().unwrap().paths, vec!["/views/list.html".to_string()]);
}
