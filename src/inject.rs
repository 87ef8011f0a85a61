//! Reference injection into the entry document.
//!
//! A block looks like:
//!
//! ```html
//! <!-- inject:js -->
//! <script src="app.js"></script>
//! <!-- endinject -->
//! ```
//!
//! The content between the markers is replaced with one reference per asset of
//! that extension, so injecting again yields the same document.

use crate::asset::FileSet;
use regex::Regex;
use std::path::{Component, Path};

/// Marker name for vendor assets.
pub const VENDOR_TAG: &str = "bower";
/// Marker name for everything else.
pub const DEFAULT_TAG: &str = "inject";

/// The reference element for a file, or `None` if the extension is not injectable.
pub fn reference_tag(ext: &str, url: &str) -> Option<String> {
    let tag = match ext {
        "js" => format!("<script src=\"{}\"></script>", url),
        "css" => format!("<link rel=\"stylesheet\" href=\"{}\">", url),
        "woff" | "woff2" | "ttf" | "otf" | "eot" => {
            format!("<link rel=\"preload\" href=\"{}\" as=\"font\" crossorigin>", url)
        }
        "svg" => format!("<link rel=\"preload\" href=\"{}\" as=\"image\">", url),
        "html" => format!("<link rel=\"import\" href=\"{}\">", url),
        _ => return None,
    };
    Some(tag)
}

/// `to` relative to the directory `from`, with forward slashes.
pub fn relative_url(from: &Path, to: &Path) -> String {
    let from: Vec<Component> = from.components().collect();
    let to: Vec<Component> = to.components().collect();
    let common = from.iter().zip(to.iter()).take_while(|(a, b)| a == b).count();

    let mut parts: Vec<String> = vec!["..".to_string(); from.len() - common];
    parts.extend(to[common..].iter().map(|c| c.as_os_str().to_string_lossy().into_owned()));
    parts.join("/")
}

/// Inject references to `files` into every `<!-- {tag}:{ext} -->` block of `html`.
///
/// File paths are made relative to `index_dir`, the directory the document is
/// written to. Blocks for extensions with no files are left untouched.
pub fn inject(html: &str, tag: &str, files: &FileSet, index_dir: &Path) -> String {
    let mut extensions: Vec<String> = Vec::new();
    for asset in files {
        if let Some(ext) = asset.extension() {
            if !extensions.contains(&ext) {
                extensions.push(ext);
            }
        }
    }

    let mut out = html.to_string();
    for ext in extensions {
        let references: Vec<String> = files
            .iter()
            .filter(|a| a.extension().as_deref() == Some(ext.as_str()))
            .filter_map(|a| reference_tag(&ext, &relative_url(index_dir, &a.path)))
            .collect();
        if references.is_empty() {
            continue;
        }
        out = replace_block(&out, tag, &ext, &references);
    }
    out
}

fn replace_block(html: &str, tag: &str, ext: &str, references: &[String]) -> String {
    let pattern = format!(
        r"(?s)(?P<indent>[ \t]*)(?P<start><!--\s*{}:{}\s*-->).*?(?P<end><!--\s*endinject\s*-->)",
        regex::escape(tag),
        regex::escape(ext)
    );
    let re = match Regex::new(&pattern) {
        Ok(re) => re,
        Err(e) => {
            tracing::warn!("invalid injection marker for {}:{}: {}", tag, ext, e);
            return html.to_string();
        }
    };

    if !re.is_match(html) {
        tracing::debug!("no <!-- {}:{} --> block, {} references skipped", tag, ext, references.len());
        return html.to_string();
    }

    re.replace_all(html, |caps: &regex::Captures| {
        let indent = &caps["indent"];
        let mut block = format!("{}{}\n", indent, &caps["start"]);
        for reference in references {
            block.push_str(indent);
            block.push_str(reference);
            block.push('\n');
        }
        block.push_str(indent);
        block.push_str(&caps["end"]);
        block
    })
    .into_owned()
}
