//! Pipe bodies.

use super::output::write_files;
use super::{PipeError, PipeId};
use crate::asset::{Asset, FileSet};
use crate::context::BuildContext;
use crate::diagnostic::{self, Diagnostic};
use crate::discovery::{glob_base, read_sources};
use crate::inject::{inject, DEFAULT_TAG, VENDOR_TAG};
use crate::markup::{self, templates, MarkupKind};
use crate::paths::{AssetClass, Profile};
use crate::script::{self, order_by_dependencies, ScriptBundle};
use crate::{style, vendor};
use std::collections::HashMap;
use std::path::{Path, PathBuf};

/// Read-only view of the outputs of finished pipes.
#[derive(Debug, Clone, Copy)]
pub struct PipeInputs<'a> {
    outputs: &'a HashMap<PipeId, FileSet>,
}

impl<'a> PipeInputs<'a> {
    pub fn new(outputs: &'a HashMap<PipeId, FileSet>) -> Self {
        Self { outputs }
    }

    /// Output of an input pipe. Empty if it produced nothing.
    pub fn files(&self, pipe: PipeId) -> FileSet {
        self.outputs.get(&pipe).cloned().unwrap_or_default()
    }
}

/// Side records of a pipe run.
#[derive(Debug, Default)]
pub struct PipeLog {
    pub diagnostics: Vec<Diagnostic>,
    pub written: Vec<PathBuf>,
}

/// Run the body of `pipe`.
pub fn run_pipe(
    pipe: PipeId,
    ctx: &BuildContext,
    inputs: &PipeInputs<'_>,
    log: &mut PipeLog,
) -> Result<FileSet, PipeError> {
    use PipeId::*;
    let paths = ctx.paths();

    match pipe {
        ValidatedAppScripts => validated_scripts(ctx, AssetClass::Scripts, true, log),
        ValidatedDevServerScripts => validated_scripts(ctx, AssetClass::DevServerScripts, false, log),
        BuiltAppScriptsDev => write(ctx, log, inputs.files(ValidatedAppScripts), paths.root(Profile::Dev)),
        ValidatedPartials => validated_markup(ctx, AssetClass::Partials, MarkupKind::Partial, log),
        ScriptedPartials => scripted_partials(ctx, inputs),
        BuiltPartialsDev => write(ctx, log, inputs.files(ValidatedPartials), paths.root(Profile::Dev)),
        BuiltAppScriptsProd => built_app_scripts_prod(ctx, inputs, log),
        BuiltVendorScriptsDev => built_vendor_scripts_dev(ctx, log),
        BuiltVendorScriptsProd => built_vendor_scripts_prod(ctx, log),
        BuiltStylesDev => built_styles(ctx, Profile::Dev, log),
        BuiltStylesProd => built_styles(ctx, Profile::Prod, log),
        ProcessedImagesDev => processed_images(ctx, Profile::Dev, log),
        ProcessedImagesProd => processed_images(ctx, Profile::Prod, log),
        BuiltFontsDev => built_fonts(ctx, Profile::Dev, log),
        BuiltFontsProd => built_fonts(ctx, Profile::Prod, log),
        ValidatedIndex => validated_index(ctx, log),
        BuiltIndexDev => built_index(ctx, inputs, Profile::Dev, log),
        BuiltIndexProd => built_index(ctx, inputs, Profile::Prod, log),
        BuiltAppDev | BuiltAppProd => Ok(pipe.inputs().iter().flat_map(|p| inputs.files(*p)).collect()),
    }
}

fn write(ctx: &BuildContext, log: &mut PipeLog, files: FileSet, dest: &Path) -> Result<FileSet, PipeError> {
    let written = write_files(ctx, files, dest)?;
    log.written.extend(written.paths());
    Ok(written)
}

/// Record and report diagnostics. With `fatal`, any error fails the pipe.
fn conclude(diagnostics: Vec<Diagnostic>, fatal: bool, log: &mut PipeLog) -> Result<(), PipeError> {
    diagnostic::report(&diagnostics);
    log.diagnostics.extend(diagnostics.iter().cloned());
    if fatal && diagnostic::error_count(&diagnostics) > 0 {
        return Err(PipeError::Validation { diagnostics });
    }
    Ok(())
}

fn validated_scripts(
    ctx: &BuildContext,
    class: AssetClass,
    fatal: bool,
    log: &mut PipeLog,
) -> Result<FileSet, PipeError> {
    let files = read_sources(ctx.project_root(), ctx.paths().patterns(class))?;
    let mut diagnostics = Vec::new();
    let mut transpiled = FileSet::new();
    for asset in files.iter() {
        let (output, found) = script::validate(asset, &ctx.config().scripts);
        diagnostics.extend(found);
        // Report-only validation passes untranspilable sources through as read
        transpiled.push(output.unwrap_or_else(|| asset.clone()));
    }
    conclude(diagnostics, fatal, log)?;
    Ok(transpiled)
}

fn validated_markup(
    ctx: &BuildContext,
    class: AssetClass,
    kind: MarkupKind,
    log: &mut PipeLog,
) -> Result<FileSet, PipeError> {
    let files = read_sources(ctx.project_root(), ctx.paths().patterns(class))?;
    let diagnostics: Vec<Diagnostic> = files
        .iter()
        .flat_map(|asset| markup::check(&asset.path, &asset.text(), &ctx.config().markup, kind))
        .collect();
    conclude(diagnostics, true, log)?;
    Ok(files)
}

fn validated_index(ctx: &BuildContext, log: &mut PipeLog) -> Result<FileSet, PipeError> {
    let files = validated_markup(ctx, AssetClass::Index, MarkupKind::Document, log)?;
    if files.is_empty() {
        let path = ctx.paths().index_file();
        return Err(PipeError::io(path, std::io::Error::new(std::io::ErrorKind::NotFound, "entry document not found")));
    }
    Ok(files)
}

fn scripted_partials(ctx: &BuildContext, inputs: &PipeInputs<'_>) -> Result<FileSet, PipeError> {
    let partials = inputs.files(PipeId::ValidatedPartials);
    let base = match partials.iter().next() {
        Some(first) => first.base.clone(),
        None => {
            let pattern = ctx.paths().patterns(AssetClass::Partials).iter().find(|p| !p.starts_with('!'));
            ctx.project_root().join(pattern.map(|p| glob_base(p)).unwrap_or_default())
        }
    };

    let minified = partials.try_map(|asset| {
        let html = markup::minify(&asset.text()).map_err(|e| PipeError::Markup { path: asset.path.clone(), source: e })?;
        Ok::<_, PipeError>(asset.with_contents(html))
    })?;

    let script = templates::to_script(&minified, &base, &ctx.config().templates);
    tracing::debug!("compiled {} partials into {}", minified.len(), script.path.display());
    Ok(vec![script].into())
}

fn bundle_asset(dir: &Path, name: &str, code: String) -> FileSet {
    vec![Asset::new(dir, dir.join(name), code.into_bytes())].into()
}

fn built_app_scripts_prod(
    ctx: &BuildContext,
    inputs: &PipeInputs<'_>,
    log: &mut PipeLog,
) -> Result<FileSet, PipeError> {
    let config = &ctx.config().scripts;

    let mut merged = inputs.files(PipeId::ScriptedPartials);
    merged.extend(inputs.files(PipeId::ValidatedAppScripts));
    let ordered = order_by_dependencies(merged)?;

    let mut bundle = if config.source_maps { ScriptBundle::new().with_source_map() } else { ScriptBundle::new() };
    for asset in &ordered {
        bundle
            .add(&asset.relative_url(), &asset.text())
            .map_err(|e| PipeError::Script { path: asset.path.clone(), source: e })?;
    }
    let code = bundle.finish()?;

    let dir = ctx.paths().prod_scripts_dir();
    write(ctx, log, bundle_asset(&dir, &config.bundle, code), &dir)
}

fn built_vendor_scripts_dev(ctx: &BuildContext, log: &mut PipeLog) -> Result<FileSet, PipeError> {
    let config = &ctx.config().vendor;
    let files = vendor::resolve(ctx.project_root(), config)?;
    let written = write(ctx, log, files, &ctx.paths().vendor_dev_dir())?;
    Ok(vendor::order_by_priority(written, &config.priority))
}

fn built_vendor_scripts_prod(ctx: &BuildContext, log: &mut PipeLog) -> Result<FileSet, PipeError> {
    let config = &ctx.config().vendor;
    let scripts = vendor::resolve(ctx.project_root(), config)?.with_extension("js");
    let ordered = vendor::order_by_priority(scripts, &config.priority);

    let mut bundle = ScriptBundle::new();
    for asset in &ordered {
        let text = asset.text();
        if let Err(e) = bundle.add(&asset.relative_url(), &text) {
            tracing::warn!("{}: not minified ({})", asset.path.display(), e);
            bundle.add_raw(&text);
        }
    }
    let code = bundle.finish()?;

    let dir = ctx.paths().prod_scripts_dir();
    write(ctx, log, bundle_asset(&dir, &config.bundle, code), &dir)
}

fn built_styles(ctx: &BuildContext, profile: Profile, log: &mut PipeLog) -> Result<FileSet, PipeError> {
    let sources = read_sources(ctx.project_root(), ctx.paths().patterns(AssetClass::Styles))?;
    let mut compiled = FileSet::new();
    for asset in sources.iter().filter(|a| !style::is_partial(a)) {
        let css = style::compile(asset)?;
        compiled.push(match profile {
            Profile::Dev => css,
            Profile::Prod => style::minify(css)?,
        });
    }
    write(ctx, log, compiled, ctx.paths().root(profile))
}

fn processed_images(ctx: &BuildContext, profile: Profile, log: &mut PipeLog) -> Result<FileSet, PipeError> {
    let images = read_sources(ctx.project_root(), ctx.paths().patterns(AssetClass::Images))?;
    write(ctx, log, images, &ctx.paths().images_dir(profile))
}

fn built_fonts(ctx: &BuildContext, profile: Profile, log: &mut PipeLog) -> Result<FileSet, PipeError> {
    let fonts = read_sources(ctx.project_root(), ctx.paths().patterns(AssetClass::Fonts))?;
    write(ctx, log, fonts.map(Asset::flattened), &ctx.paths().fonts_dir(profile))
}

fn built_index(
    ctx: &BuildContext,
    inputs: &PipeInputs<'_>,
    profile: Profile,
    log: &mut PipeLog,
) -> Result<FileSet, PipeError> {
    use PipeId::*;
    let (vendor_pipe, app_pipe, styles_pipe, fonts_pipe) = match profile {
        Profile::Dev => (BuiltVendorScriptsDev, BuiltAppScriptsDev, BuiltStylesDev, BuiltFontsDev),
        Profile::Prod => (BuiltVendorScriptsProd, BuiltAppScriptsProd, BuiltStylesProd, BuiltFontsProd),
    };

    let mut written = FileSet::new();
    for index in inputs.files(ValidatedIndex) {
        let dest = ctx.paths().root(profile);
        let index_dir = match index.relative().parent() {
            Some(parent) => dest.join(parent),
            None => dest.to_path_buf(),
        };

        let app = order_by_dependencies(inputs.files(app_pipe))?;
        let mut html = index.text();
        html = inject(&html, VENDOR_TAG, &inputs.files(vendor_pipe), &index_dir);
        html = inject(&html, DEFAULT_TAG, &app, &index_dir);
        html = inject(&html, DEFAULT_TAG, &inputs.files(styles_pipe), &index_dir);
        html = inject(&html, DEFAULT_TAG, &inputs.files(fonts_pipe), &index_dir);

        if profile == Profile::Prod {
            html = markup::minify(&html).map_err(|e| PipeError::Markup { path: index.path.clone(), source: e })?;
        }

        written.extend(write(ctx, log, vec![index.with_contents(html)].into(), dest)?);
    }
    Ok(written)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::Config;
    use std::fs;
    use tempfile::TempDir;

    fn project(files: &[(&str, &str)]) -> (TempDir, BuildContext) {
        let temp = TempDir::new().unwrap();
        for (rel, contents) in files {
            let path = temp.path().join(rel);
            fs::create_dir_all(path.parent().unwrap()).unwrap();
            fs::write(path, contents).unwrap();
        }
        let ctx = BuildContext::new(Config::default(), temp.path().to_path_buf()).with_jobs(1);
        (temp, ctx)
    }

    fn run(pipe: PipeId, ctx: &BuildContext, outputs: &HashMap<PipeId, FileSet>) -> (Result<FileSet, PipeError>, PipeLog) {
        let mut log = PipeLog::default();
        let result = run_pipe(pipe, ctx, &PipeInputs::new(outputs), &mut log);
        (result, log)
    }

    #[test]
    fn test_validated_scripts_fail_on_error() {
        let (_temp, ctx) = project(&[("app/main.js", "function f() { debugger; }\n")]);
        let (result, log) = run(PipeId::ValidatedAppScripts, &ctx, &HashMap::new());
        assert!(matches!(result, Err(PipeError::Validation { .. })));
        assert_eq!(log.diagnostics.len(), 1);
    }

    #[test]
    fn test_dev_server_scripts_report_only() {
        let (_temp, ctx) = project(&[("devServer/server.js", "var s = 'open;\n")]);
        let (result, log) = run(PipeId::ValidatedDevServerScripts, &ctx, &HashMap::new());
        assert_eq!(result.unwrap().len(), 1);
        assert!(!log.diagnostics.is_empty());
        assert!(log.diagnostics.iter().all(|d| d.rule == "syntax"));
    }

    #[test]
    fn test_jsx_transpiled() {
        let (_temp, ctx) = project(&[(
            "app/hello.jsx",
            "function Hello() {\n  return <p className=\"hello\">Hello</p>;\n}\n",
        )]);
        let (result, log) = run(PipeId::ValidatedAppScripts, &ctx, &HashMap::new());
        assert!(log.diagnostics.is_empty(), "{:?}", log.diagnostics);

        let files = result.unwrap();
        let hello = files.iter().next().unwrap();
        assert_eq!(hello.relative_url(), "hello.js");
        assert!(hello.text().contains("React.createElement(\"p\""), "{}", hello.text());
    }

    #[test]
    fn test_scripted_partials_without_partials() {
        let (temp, ctx) = project(&[]);
        let (result, _) = run(PipeId::ScriptedPartials, &ctx, &HashMap::new());
        let files = result.unwrap();
        assert_eq!(files.paths(), vec![temp.path().join("app/templates.js")]);
    }

    #[test]
    fn test_fonts_flattened() {
        let (temp, ctx) = project(&[("bower_components/bootstrap-sass/assets/fonts/bootstrap/glyph.woff", "w")]);
        let (result, log) = run(PipeId::BuiltFontsDev, &ctx, &HashMap::new());
        assert_eq!(result.unwrap().len(), 1);
        assert_eq!(log.written, vec![temp.path().join("dist.dev/fonts/bootstrap/glyph.woff")]);
    }

    #[test]
    fn test_styles_skip_partials() {
        let (temp, ctx) = project(&[
            ("app/styles/_vars.scss", "$c: #010203;\n"),
            ("app/styles/site.scss", "@import 'vars';\nbody { color: $c; }\n"),
        ]);
        let (result, _) = run(PipeId::BuiltStylesDev, &ctx, &HashMap::new());
        assert_eq!(result.unwrap().paths(), vec![temp.path().join("dist.dev/styles/site.css")]);
        assert!(!temp.path().join("dist.dev/styles/_vars.css").exists());
    }

    #[test]
    fn test_index_missing_is_error() {
        let (_temp, ctx) = project(&[]);
        let (result, _) = run(PipeId::ValidatedIndex, &ctx, &HashMap::new());
        assert!(matches!(result, Err(PipeError::Io { .. })));
    }
}
