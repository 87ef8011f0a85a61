//! Style compilation and minification.
//!
//! Sources go through the SCSS compiler (plain CSS is valid SCSS). Production
//! output is optimised by lightningcss and carries an inline source map.

use crate::asset::Asset;
use crate::sourcemap::{inline_comment, CommentStyle};
use lightningcss::stylesheet::{MinifyOptions, ParserOptions, PrinterOptions, StyleSheet};
use parcel_sourcemap::SourceMap;
use std::path::PathBuf;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum StyleError {
    #[error("{}: {message}", path.display())]
    Compile { path: PathBuf, message: String },

    #[error("{}: failed to minify: {message}", path.display())]
    Minify { path: PathBuf, message: String },

    #[error("{}: failed to write source map: {message}", path.display())]
    SourceMap { path: PathBuf, message: String },
}

/// Import-only sources (`_name.scss`) are never compiled on their own.
pub fn is_partial(asset: &Asset) -> bool {
    asset.file_name().starts_with('_')
}

/// Compile a source to CSS. The result keeps its relative path with a `.css`
/// extension.
pub fn compile(asset: &Asset) -> Result<Asset, StyleError> {
    let options = grass::Options::default().load_path(&asset.base);
    let css = match asset.extension().as_deref() {
        Some("scss") => grass::from_path(&asset.path, &options),
        _ => grass::from_string(asset.text(), &options),
    }
    .map_err(|e| StyleError::Compile { path: asset.path.clone(), message: e.to_string() })?;

    Ok(asset.clone().with_contents(css).with_extension("css"))
}

/// Minify compiled CSS, append an inline source map and rename to `*.min.css`.
pub fn minify(asset: Asset) -> Result<Asset, StyleError> {
    let css = asset.text();
    let name = asset.relative_url();

    let mut source_map = SourceMap::new("/");
    source_map.add_source(&name);
    source_map
        .set_source_content(0, &css)
        .map_err(|e| StyleError::SourceMap { path: asset.path.clone(), message: format!("{:?}", e) })?;

    let code = {
        let mut sheet = StyleSheet::parse(&css, ParserOptions { filename: name.clone(), ..ParserOptions::default() })
            .map_err(|e| StyleError::Minify { path: asset.path.clone(), message: e.to_string() })?;
        sheet
            .minify(MinifyOptions::default())
            .map_err(|e| StyleError::Minify { path: asset.path.clone(), message: e.to_string() })?;
        sheet
            .to_css(PrinterOptions { minify: true, source_map: Some(&mut source_map), ..PrinterOptions::default() })
            .map_err(|e| StyleError::Minify { path: asset.path.clone(), message: e.to_string() })?
            .code
    };

    let map_json = source_map
        .to_json(None)
        .map_err(|e| StyleError::SourceMap { path: asset.path.clone(), message: format!("{:?}", e) })?;

    let contents = format!("{}{}", code, inline_comment(&map_json, CommentStyle::Style));
    Ok(asset.with_contents(contents).minified_name())
}
