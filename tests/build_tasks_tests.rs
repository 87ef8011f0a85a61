//! Task-level integration tests
//!
//! Builds a small bower-based single-page app in a temporary directory and
//! runs the standard tasks against it:
//!
//! - Prerequisite ordering
//! - Clean scope
//! - Development build with resolvable injected references
//! - Production vendor bundle ordering
//! - Failed production builds leave no entry document

use std::fs;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};
use tempfile::TempDir;

use assetline::config::Config;
use assetline::context::BuildContext;
use assetline::pipe::PipeGraph;
use assetline::task::{ConsoleProgress, NullProgress, TaskRegistry, TaskReport, TaskRunner, TaskStatus};

// ============================================================================
// Test Utilities
// ============================================================================

const INDEX: &str = r#"<!DOCTYPE html>
<html>
<head>
  <title>Fixture</title>
  <!-- inject:css -->
  <!-- endinject -->
  <!-- inject:woff -->
  <!-- endinject -->
</head>
<body ng-app="app">
  <div ng-view></div>
  <!-- bower:js -->
  <!-- endinject -->
  <!-- inject:js -->
  <!-- endinject -->
</body>
</html>
"#;

fn create_test_file(root: &Path, rel: &str, content: &str) -> PathBuf {
    let path = root.join(rel);
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent).unwrap();
    }
    fs::write(&path, content).unwrap();
    path
}

/// A project with app sources, styles, partials, images, fonts and three
/// vendor components.
fn create_project() -> TempDir {
    let temp = TempDir::new().unwrap();
    let root = temp.path();

    create_test_file(root, "app/index.html", INDEX);
    create_test_file(root, "app/app.js", "angular.module('app', ['ngRoute', 'templates']);\n");
    create_test_file(
        root,
        "app/home/home.controller.js",
        "angular.module('app').controller('HomeController', function () {\n  this.title = 'home';\n});\n",
    );
    create_test_file(root, "app/home/home.html", "<section class=\"home\">\n  <h1>{{ vm.title }}</h1>\n</section>\n");
    create_test_file(root, "app/styles/_colors.scss", "$accent: #336699;\n");
    create_test_file(root, "app/styles/main.scss", "@import 'colors';\n.title { color: $accent; }\n");
    create_test_file(root, "images/logo.svg", "<svg xmlns=\"http://www.w3.org/2000/svg\"></svg>\n");
    create_test_file(root, "bower_components/bootstrap-sass/assets/fonts/bootstrap/glyphs.woff", "woff");

    create_test_file(
        root,
        "bower.json",
        r#"{"name": "fixture", "dependencies": {"angular": "~1.5", "react-dom": "^15", "react": "^15"}}"#,
    );
    create_test_file(root, "bower_components/angular/bower.json", r#"{"main": "angular.js"}"#);
    create_test_file(root, "bower_components/angular/angular.js", "window.lib = 'lib-angular';\n");
    create_test_file(
        root,
        "bower_components/react-dom/bower.json",
        r#"{"main": "react-dom.js", "dependencies": {"react": "^15"}}"#,
    );
    create_test_file(root, "bower_components/react-dom/react-dom.js", "window.lib = 'lib-dom';\n");
    create_test_file(root, "bower_components/react/bower.json", r#"{"main": "react.js"}"#);
    create_test_file(root, "bower_components/react/react.js", "window.lib = 'lib-react';\n");

    temp
}

fn run_tasks(root: &Path, tasks: &[&str]) -> TaskReport {
    let ctx = BuildContext::new(Config::default(), root.to_path_buf()).with_jobs(4);
    let registry = TaskRegistry::standard().unwrap();
    let graph = PipeGraph::new().unwrap();
    let progress = NullProgress::new();
    TaskRunner::new(&ctx, &registry, &graph, &progress).run(tasks).unwrap()
}

/// Values of `src="..."` and `href="..."` attributes.
fn references(html: &str) -> Vec<String> {
    let re = regex::Regex::new(r#"(?:src|href)="([^"]+)""#).unwrap();
    re.captures_iter(html).map(|c| c[1].to_string()).collect()
}

struct TestWriter(Arc<Mutex<Vec<u8>>>);

impl std::io::Write for TestWriter {
    fn write(&mut self, buf: &[u8]) -> std::io::Result<usize> {
        self.0.lock().unwrap().extend_from_slice(buf);
        Ok(buf.len())
    }

    fn flush(&mut self) -> std::io::Result<()> {
        Ok(())
    }
}

// ============================================================================
// Task Ordering
// ============================================================================

#[test]
fn test_prerequisites_run_before_task() {
    let temp = create_project();
    let report = run_tasks(temp.path(), &["clean-build-app-prod"]);

    assert!(report.is_success(), "{}", report.summary());
    let names: Vec<&str> = report.tasks.iter().map(|t| t.task.as_str()).collect();
    assert_eq!(names, vec!["clean-prod", "clean-build-app-prod"]);
}

#[test]
fn test_progress_lines() {
    let temp = create_project();
    let buffer = Arc::new(Mutex::new(Vec::new()));
    let progress = ConsoleProgress::with_output(TestWriter(buffer.clone()));
    let ctx = BuildContext::new(Config::default(), temp.path().to_path_buf());
    let registry = TaskRegistry::standard().unwrap();
    let graph = PipeGraph::new().unwrap();

    let report = TaskRunner::new(&ctx, &registry, &graph, &progress).run(&["build-styles-dev"]).unwrap();
    assert!(report.is_success());

    let output = String::from_utf8(buffer.lock().unwrap().clone()).unwrap();
    assert!(output.contains("Starting 'build-styles-dev'..."));
    assert!(output.contains("Finished 'build-styles-dev' after"));
}

// ============================================================================
// Clean
// ============================================================================

#[test]
fn test_clean_removes_root_only() {
    let temp = create_project();
    let root = temp.path();
    assert!(run_tasks(root, &["build-app-dev", "build-app-prod"]).is_success());
    assert!(root.join("dist.dev/index.html").exists());

    let report = run_tasks(root, &["clean-dev"]);

    assert!(report.is_success());
    assert!(!root.join("dist.dev").exists());
    assert!(root.join("dist.prod/index.html").exists());
    assert!(root.join("app/index.html").exists());
    assert!(root.join("bower_components/react/react.js").exists());
}

// ============================================================================
// Development Build
// ============================================================================

#[test]
fn test_dev_build_references_resolve() {
    let temp = create_project();
    let root = temp.path();

    let report = run_tasks(root, &["clean-build-app-dev"]);
    assert!(report.is_success(), "{}", report.summary());

    let dist = root.join("dist.dev");
    let html = fs::read_to_string(dist.join("index.html")).unwrap();
    let refs = references(&html);

    assert!(refs.contains(&"bower_components/angular/angular.js".to_string()), "{:?}", refs);
    assert!(refs.contains(&"app.js".to_string()), "{:?}", refs);
    assert!(refs.contains(&"styles/main.css".to_string()), "{:?}", refs);
    assert!(refs.contains(&"fonts/bootstrap/glyphs.woff".to_string()), "{:?}", refs);
    for reference in &refs {
        assert!(dist.join(reference).is_file(), "{} does not resolve", reference);
    }

    // Module declaration before the controller that uses it
    let app = refs.iter().position(|r| r == "app.js").unwrap();
    let controller = refs.iter().position(|r| r == "home/home.controller.js").unwrap();
    assert!(app < controller);

    assert!(dist.join("home/home.html").is_file());
    assert!(dist.join("images/logo.svg").is_file());
    assert!(!dist.join("styles/_colors.css").exists());
}

// ============================================================================
// Production Build
// ============================================================================

#[test]
fn test_prod_vendor_bundle_priority_order() {
    let temp = create_project();
    let root = temp.path();

    let report = run_tasks(root, &["build-vendor-scripts-prod"]);
    assert!(report.is_success(), "{}", report.summary());

    let bundle = fs::read_to_string(root.join("dist.prod/scripts/vendor.min.js")).unwrap();
    let react = bundle.find("lib-react").unwrap();
    let dom = bundle.find("lib-dom").unwrap();
    let angular = bundle.find("lib-angular").unwrap();
    assert!(react < dom, "react.js must precede react-dom.js");
    assert!(dom < angular, "prioritized libraries come first");
}

#[test]
fn test_prod_build_outputs() {
    let temp = create_project();
    let root = temp.path();

    let report = run_tasks(root, &["default"]);
    assert!(report.is_success(), "{}", report.summary());

    let dist = root.join("dist.prod");
    let html = fs::read_to_string(dist.join("index.html")).unwrap();
    assert!(!html.contains("<!--"), "comments are stripped from the minified index");

    let refs = references(&html);
    assert!(refs.contains(&"scripts/vendor.min.js".to_string()), "{:?}", refs);
    assert!(refs.contains(&"scripts/app.min.js".to_string()), "{:?}", refs);
    for reference in &refs {
        assert!(dist.join(reference).is_file(), "{} does not resolve", reference);
    }

    let app = fs::read_to_string(dist.join("scripts/app.min.js")).unwrap();
    assert!(app.contains("$templateCache"));
    assert!(app.contains("sourceMappingURL=data:application/json;charset=utf8;base64,"));
}

#[test]
fn test_markup_error_fails_prod_build() {
    let temp = create_project();
    let root = temp.path();
    create_test_file(root, "app/home/broken.html", "<div>\n  <span>unclosed\n</div>\n");

    let report = run_tasks(root, &["default"]);

    assert!(!report.is_success());
    let build = report.get("clean-build-app-prod").unwrap();
    match &build.status {
        TaskStatus::Failed(message) => assert!(message.contains("validated-partials"), "{}", message),
        other => panic!("expected failure, got {}", other),
    }
    assert!(!root.join("dist.prod/index.html").exists());
}

#[test]
fn test_unknown_task_is_rejected() {
    let temp = create_project();
    let ctx = BuildContext::new(Config::default(), temp.path().to_path_buf());
    let registry = TaskRegistry::standard().unwrap();
    let graph = PipeGraph::new().unwrap();
    let progress = NullProgress::new();

    assert!(TaskRunner::new(&ctx, &registry, &graph, &progress).run(&["deploy"]).is_err());
}
