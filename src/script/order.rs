//! Dependency ordering for application scripts.
//!
//! Two kinds of edges are inferred from file contents:
//! - AngularJS modules: the file declaring `angular.module('x', [...])` comes
//!   before files that use `angular.module('x')` and before files declaring
//!   modules that list `x` as a requirement.
//! - Relative ES imports: `import ... from './other'` puts `other` first.
//!
//! The sort is stable: unrelated files keep their discovery order.

use crate::asset::{Asset, FileSet};
use regex::Regex;
use std::collections::{BTreeSet, HashMap};
use std::path::{Component, Path, PathBuf};
use std::sync::OnceLock;
use thiserror::Error;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum OrderError {
    #[error("circular dependency between scripts: {}", .0.join(" -> "))]
    Cycle(Vec<String>),
}

fn declaration_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(r#"angular\s*\.\s*module\s*\(\s*['"]([^'"]+)['"]\s*,\s*\[([^\]]*)\]"#)
            .expect("valid module declaration regex")
    })
}

fn usage_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(r#"angular\s*\.\s*module\s*\(\s*['"]([^'"]+)['"]\s*\)"#).expect("valid module usage regex")
    })
}

fn import_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(r#"(?m)^\s*import\s+(?:[^'";]*?\s+from\s+)?['"](\.{1,2}/[^'"]+)['"]"#)
            .expect("valid import regex")
    })
}

fn quoted_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r#"['"]([^'"]+)['"]"#).expect("valid quoted string regex"))
}

/// What a single script declares and needs.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct ModuleInfo {
    pub declares: Vec<String>,
    pub requires: Vec<String>,
    pub uses: Vec<String>,
    pub imports: Vec<String>,
}

pub fn scan_modules(source: &str) -> ModuleInfo {
    let mut info = ModuleInfo::default();

    for caps in declaration_re().captures_iter(source) {
        info.declares.push(caps[1].to_string());
        for dep in quoted_re().captures_iter(&caps[2]) {
            info.requires.push(dep[1].to_string());
        }
    }
    for caps in usage_re().captures_iter(source) {
        info.uses.push(caps[1].to_string());
    }
    for caps in import_re().captures_iter(source) {
        info.imports.push(caps[1].to_string());
    }

    info
}

/// Lexically normalise `a/./b/../c` to `a/c`.
fn normalize(path: &Path) -> PathBuf {
    let mut out = PathBuf::new();
    for component in path.components() {
        match component {
            Component::CurDir => {}
            Component::ParentDir => {
                out.pop();
            }
            other => out.push(other.as_os_str()),
        }
    }
    out
}

fn resolve_import(importer: &Asset, spec: &str, by_path: &HashMap<PathBuf, usize>) -> Option<usize> {
    let dir = importer.path.parent()?;
    let target = normalize(&dir.join(spec));
    let candidates = [
        target.clone(),
        target.with_extension("js"),
        target.with_extension("jsx"),
        target.join("index.js"),
    ];
    candidates.iter().find_map(|c| by_path.get(c).copied())
}

/// Reorder scripts so every file follows the files it depends on.
pub fn order_by_dependencies(files: FileSet) -> Result<FileSet, OrderError> {
    let assets = files.into_vec();
    let infos: Vec<ModuleInfo> = assets.iter().map(|a| scan_modules(&a.text())).collect();

    let mut declared_in: HashMap<&str, usize> = HashMap::new();
    for (i, info) in infos.iter().enumerate() {
        for name in &info.declares {
            declared_in.entry(name.as_str()).or_insert(i);
        }
    }
    let by_path: HashMap<PathBuf, usize> =
        assets.iter().enumerate().map(|(i, a)| (normalize(&a.path), i)).collect();

    // deps[i] = files that must precede i
    let mut deps: Vec<BTreeSet<usize>> = vec![BTreeSet::new(); assets.len()];
    for (i, info) in infos.iter().enumerate() {
        for name in info.requires.iter().chain(info.uses.iter()) {
            if let Some(&j) = declared_in.get(name.as_str()) {
                if j != i {
                    deps[i].insert(j);
                }
            }
        }
        for spec in &info.imports {
            if let Some(j) = resolve_import(&assets[i], spec, &by_path) {
                if j != i {
                    deps[i].insert(j);
                }
            }
        }
    }

    let mut remaining: Vec<usize> = deps.iter().map(BTreeSet::len).collect();
    let mut ready: BTreeSet<usize> = (0..assets.len()).filter(|&i| remaining[i] == 0).collect();
    let mut order = Vec::with_capacity(assets.len());

    while let Some(next) = ready.pop_first() {
        order.push(next);
        for (i, d) in deps.iter().enumerate() {
            if d.contains(&next) {
                remaining[i] -= 1;
                if remaining[i] == 0 {
                    ready.insert(i);
                }
            }
        }
    }

    if order.len() != assets.len() {
        let stuck = (0..assets.len()).filter(|i| remaining[*i] > 0).map(|i| assets[i].relative_url()).collect();
        return Err(OrderError::Cycle(stuck));
    }

    let mut slots: Vec<Option<Asset>> = assets.into_iter().map(Some).collect();
    Ok(order.into_iter().filter_map(|i| slots[i].take()).collect())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn script(name: &str, source: &str) -> Asset {
        Asset::new("/p/app", format!("/p/app/{}", name), source.as_bytes().to_vec())
    }

    fn names(set: &FileSet) -> Vec<String> {
        set.iter().map(|a| a.relative_url()).collect()
    }

    #[test]
    fn test_scan_modules() {
        let info = scan_modules(
            "angular.module('app', ['ngRoute', \"templates\"]);\nangular.module('app').controller('X', f);\nimport util from './util';",
        );
        assert_eq!(info.declares, vec!["app"]);
        assert_eq!(info.requires, vec!["ngRoute", "templates"]);
        assert_eq!(info.uses, vec!["app"]);
        assert_eq!(info.imports, vec!["./util"]);
    }

    #[test]
    fn test_declaration_before_usage() {
        let files: FileSet = vec![
            script("controllers/home.js", "angular.module('app').controller('Home', f);"),
            script("app.js", "angular.module('app', ['templates']);"),
            script("templates.js", "angular.module('templates', []);"),
        ]
        .into();

        let ordered = order_by_dependencies(files).unwrap();
        assert_eq!(names(&ordered), vec!["templates.js", "app.js", "controllers/home.js"]);
    }

    #[test]
    fn test_unrelated_files_keep_order() {
        let files: FileSet =
            vec![script("b.js", "var b;"), script("a.js", "var a;"), script("c.js", "var c;")].into();
        let ordered = order_by_dependencies(files).unwrap();
        assert_eq!(names(&ordered), vec!["b.js", "a.js", "c.js"]);
    }

    #[test]
    fn test_relative_imports() {
        let files: FileSet = vec![
            script("main.js", "import { api } from './lib/api';\napi();"),
            script("lib/api.js", "import helpers from '../helpers.js';\nexport const api = 1;"),
            script("helpers.js", "export default {};"),
        ]
        .into();

        let ordered = order_by_dependencies(files).unwrap();
        assert_eq!(names(&ordered), vec!["helpers.js", "lib/api.js", "main.js"]);
    }

    #[test]
    fn test_external_modules_are_ignored() {
        let files: FileSet = vec![script("app.js", "angular.module('app', ['ngRoute']);")].into();
        let ordered = order_by_dependencies(files).unwrap();
        assert_eq!(ordered.len(), 1);
    }

    #[test]
    fn test_cycle_is_an_error() {
        let files: FileSet = vec![
            script("a.js", "angular.module('a', ['b']);"),
            script("b.js", "angular.module('b', ['a']);"),
        ]
        .into();

        let err = order_by_dependencies(files).unwrap_err();
        assert_eq!(err, OrderError::Cycle(vec!["a.js".to_string(), "b.js".to_string()]));
    }
}
