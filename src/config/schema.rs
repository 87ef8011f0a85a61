//! Configuration schema types for `assetline.toml`
//!
//! Defines the structure and validation rules for an assetline project. Every
//! section is optional; the defaults describe a bower-based single-page app with
//! sources under `app/` and outputs in `dist.dev` / `dist.prod`.

use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Validation severity level for lint rules
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ValidationLevel {
    /// Treat as error, fail the owning pipe
    Error,
    /// Emit warning, continue
    Warn,
    /// Silently ignore
    Ignore,
}

impl Default for ValidationLevel {
    fn default() -> Self {
        Self::Warn
    }
}

/// Project metadata section
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProjectConfig {
    /// Project name
    #[serde(default = "default_name")]
    pub name: String,
}

fn default_name() -> String {
    "app".to_string()
}

impl Default for ProjectConfig {
    fn default() -> Self {
        Self { name: default_name() }
    }
}

/// Source globs and output roots, relative to the project root.
///
/// Patterns starting with `!` exclude files matched by earlier patterns.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PathsConfig {
    #[serde(default = "default_scripts")]
    pub scripts: Vec<String>,
    #[serde(default = "default_styles")]
    pub styles: Vec<String>,
    #[serde(default = "default_images")]
    pub images: Vec<String>,
    #[serde(default = "default_fonts")]
    pub fonts: Vec<String>,
    /// The entry document
    #[serde(default = "default_index")]
    pub index: String,
    #[serde(default = "default_partials")]
    pub partials: Vec<String>,
    /// Scripts of the local dev server (validated, never built)
    #[serde(default = "default_dev_server_scripts")]
    pub dev_server_scripts: Vec<String>,
    /// Development output root
    #[serde(default = "default_dist_dev")]
    pub dist_dev: PathBuf,
    /// Production output root
    #[serde(default = "default_dist_prod")]
    pub dist_prod: PathBuf,
    /// Bundled scripts directory, relative to `dist_prod`
    #[serde(default = "default_prod_scripts")]
    pub prod_scripts: PathBuf,
    /// Images directory, relative to either output root
    #[serde(default = "default_images_dir")]
    pub images_dir: PathBuf,
    /// Fonts directory, relative to either output root
    #[serde(default = "default_fonts_dir")]
    pub fonts_dir: PathBuf,
    /// Vendor components directory, relative to `dist_dev`
    #[serde(default = "default_vendor_dev_dir")]
    pub vendor_dev_dir: PathBuf,
}

fn default_scripts() -> Vec<String> {
    vec!["app/**/*.js".to_string(), "app/**/*.jsx".to_string()]
}

fn default_styles() -> Vec<String> {
    vec!["app/**/*.css".to_string(), "app/**/*.scss".to_string()]
}

fn default_images() -> Vec<String> {
    vec!["images/**/*".to_string()]
}

fn default_fonts() -> Vec<String> {
    vec!["bower_components/bootstrap-sass/assets/fonts/bootstrap/*".to_string()]
}

fn default_index() -> String {
    "app/index.html".to_string()
}

fn default_partials() -> Vec<String> {
    vec!["app/**/*.html".to_string(), "!app/index.html".to_string()]
}

fn default_dev_server_scripts() -> Vec<String> {
    vec!["devServer/**/*.js".to_string()]
}

fn default_dist_dev() -> PathBuf {
    PathBuf::from("dist.dev")
}

fn default_dist_prod() -> PathBuf {
    PathBuf::from("dist.prod")
}

fn default_prod_scripts() -> PathBuf {
    PathBuf::from("scripts")
}

fn default_images_dir() -> PathBuf {
    PathBuf::from("images")
}

fn default_fonts_dir() -> PathBuf {
    PathBuf::from("fonts/bootstrap")
}

fn default_vendor_dev_dir() -> PathBuf {
    PathBuf::from("bower_components")
}

impl Default for PathsConfig {
    fn default() -> Self {
        Self {
            scripts: default_scripts(),
            styles: default_styles(),
            images: default_images(),
            fonts: default_fonts(),
            index: default_index(),
            partials: default_partials(),
            dev_server_scripts: default_dev_server_scripts(),
            dist_dev: default_dist_dev(),
            dist_prod: default_dist_prod(),
            prod_scripts: default_prod_scripts(),
            images_dir: default_images_dir(),
            fonts_dir: default_fonts_dir(),
            vendor_dev_dir: default_vendor_dev_dir(),
        }
    }
}

/// Vendor component settings
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct VendorConfig {
    /// Manifest listing the project's components
    #[serde(default = "default_manifest")]
    pub manifest: PathBuf,
    /// Directory the components are installed into
    #[serde(default = "default_components_dir")]
    pub components_dir: PathBuf,
    /// Files that must come first in vendor bundles, in this order
    #[serde(default = "default_priority")]
    pub priority: Vec<String>,
    /// Name of the bundled production vendor script
    #[serde(default = "default_vendor_bundle")]
    pub bundle: String,
}

fn default_manifest() -> PathBuf {
    PathBuf::from("bower.json")
}

fn default_components_dir() -> PathBuf {
    PathBuf::from("bower_components")
}

fn default_priority() -> Vec<String> {
    vec!["react.js".to_string(), "react-dom.js".to_string(), "schema-form".to_string()]
}

fn default_vendor_bundle() -> String {
    "vendor.min.js".to_string()
}

impl Default for VendorConfig {
    fn default() -> Self {
        Self {
            manifest: default_manifest(),
            components_dir: default_components_dir(),
            priority: default_priority(),
            bundle: default_vendor_bundle(),
        }
    }
}

/// Script lint and bundle settings
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ScriptsConfig {
    /// Name of the bundled production application script
    #[serde(default = "default_app_bundle")]
    pub bundle: String,
    /// Attach an inline source map to the application bundle
    #[serde(default = "default_true")]
    pub source_maps: bool,
    #[serde(default = "default_error_level")]
    pub no_debugger: ValidationLevel,
    #[serde(default)]
    pub eqeqeq: ValidationLevel,
    #[serde(default)]
    pub no_trailing_spaces: ValidationLevel,
    #[serde(default = "default_ignore_level")]
    pub no_console: ValidationLevel,
}

fn default_app_bundle() -> String {
    "app.min.js".to_string()
}

fn default_true() -> bool {
    true
}

fn default_error_level() -> ValidationLevel {
    ValidationLevel::Error
}

fn default_ignore_level() -> ValidationLevel {
    ValidationLevel::Ignore
}

impl Default for ScriptsConfig {
    fn default() -> Self {
        Self {
            bundle: default_app_bundle(),
            source_maps: true,
            no_debugger: ValidationLevel::Error,
            eqeqeq: ValidationLevel::Warn,
            no_trailing_spaces: ValidationLevel::Warn,
            no_console: ValidationLevel::Ignore,
        }
    }
}

/// Markup lint settings
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MarkupConfig {
    /// Require a doctype first in the entry document (never checked for partials)
    #[serde(default = "default_warn_level")]
    pub doctype_first: ValidationLevel,
    #[serde(default = "default_error_level")]
    pub tag_pair: ValidationLevel,
    #[serde(default)]
    pub tagname_lowercase: ValidationLevel,
    #[serde(default)]
    pub attr_lowercase: ValidationLevel,
    #[serde(default)]
    pub attr_value_double_quotes: ValidationLevel,
    #[serde(default = "default_error_level")]
    pub id_unique: ValidationLevel,
    #[serde(default = "default_error_level")]
    pub src_not_empty: ValidationLevel,
    #[serde(default = "default_error_level")]
    pub attr_no_duplication: ValidationLevel,
}

fn default_warn_level() -> ValidationLevel {
    ValidationLevel::Warn
}

impl Default for MarkupConfig {
    fn default() -> Self {
        Self {
            doctype_first: ValidationLevel::Warn,
            tag_pair: ValidationLevel::Error,
            tagname_lowercase: ValidationLevel::Warn,
            attr_lowercase: ValidationLevel::Warn,
            attr_value_double_quotes: ValidationLevel::Warn,
            id_unique: ValidationLevel::Error,
            src_not_empty: ValidationLevel::Error,
            attr_no_duplication: ValidationLevel::Error,
        }
    }
}

/// Settings for partials compiled into the production script bundle
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TemplatesConfig {
    /// Angular module the templates are registered in
    #[serde(default = "default_templates_module")]
    pub module: String,
    /// Output file name (merged into the app bundle)
    #[serde(default = "default_templates_file")]
    pub file: String,
}

fn default_templates_module() -> String {
    "templates".to_string()
}

fn default_templates_file() -> String {
    "templates.js".to_string()
}

impl Default for TemplatesConfig {
    fn default() -> Self {
        Self { module: default_templates_module(), file: default_templates_file() }
    }
}

/// Dev server settings
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerConfig {
    #[serde(default = "default_host")]
    pub host: String,
    #[serde(default = "default_port")]
    pub port: u16,
    /// Inject the live reload client into served HTML
    #[serde(default = "default_true")]
    pub live_reload: bool,
}

fn default_host() -> String {
    "127.0.0.1".to_string()
}

fn default_port() -> u16 {
    3000
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self { host: default_host(), port: default_port(), live_reload: true }
    }
}

/// Watch mode configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WatchConfig {
    /// Debounce delay in milliseconds
    #[serde(default = "default_debounce_ms")]
    pub debounce_ms: u32,
    /// Clear terminal between rebuilds
    #[serde(default)]
    pub clear_screen: bool,
}

fn default_debounce_ms() -> u32 {
    100
}

impl Default for WatchConfig {
    fn default() -> Self {
        Self { debounce_ms: 100, clear_screen: false }
    }
}

/// Complete assetline.toml configuration
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub project: ProjectConfig,
    #[serde(default)]
    pub paths: PathsConfig,
    #[serde(default)]
    pub vendor: VendorConfig,
    #[serde(default)]
    pub scripts: ScriptsConfig,
    #[serde(default)]
    pub markup: MarkupConfig,
    #[serde(default)]
    pub templates: TemplatesConfig,
    #[serde(default)]
    pub server: ServerConfig,
    #[serde(default)]
    pub watch: WatchConfig,
}

/// Configuration validation error
#[derive(Debug, Clone)]
pub struct ConfigValidationError {
    /// Path to the invalid field (e.g., "paths.scripts")
    pub field: String,
    /// Error message
    pub message: String,
}

impl std::fmt::Display for ConfigValidationError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "assetline.toml: '{}' {}", self.field, self.message)
    }
}

impl Config {
    /// Validate the configuration and return any errors
    pub fn validate(&self) -> Vec<ConfigValidationError> {
        let mut errors = Vec::new();

        let globs = [
            ("paths.scripts", &self.paths.scripts),
            ("paths.styles", &self.paths.styles),
            ("paths.partials", &self.paths.partials),
        ];
        for (field, patterns) in globs {
            if !patterns.iter().any(|p| !p.starts_with('!')) {
                errors.push(ConfigValidationError {
                    field: field.to_string(),
                    message: "must contain at least one non-negated glob pattern".to_string(),
                });
            }
        }

        if self.paths.index.trim().is_empty() {
            errors.push(ConfigValidationError {
                field: "paths.index".to_string(),
                message: "must be a non-empty path".to_string(),
            });
        }

        for (field, root) in
            [("paths.dist_dev", &self.paths.dist_dev), ("paths.dist_prod", &self.paths.dist_prod)]
        {
            if root.as_os_str().is_empty() || root == &PathBuf::from(".") {
                errors.push(ConfigValidationError {
                    field: field.to_string(),
                    message: "must name a directory below the project root".to_string(),
                });
            }
        }

        if self.paths.dist_dev == self.paths.dist_prod {
            errors.push(ConfigValidationError {
                field: "paths.dist_prod".to_string(),
                message: "must differ from paths.dist_dev".to_string(),
            });
        }

        for (field, name) in
            [("scripts.bundle", &self.scripts.bundle), ("vendor.bundle", &self.vendor.bundle)]
        {
            if !name.ends_with(".js") || name.contains('/') {
                errors.push(ConfigValidationError {
                    field: field.to_string(),
                    message: "must be a plain file name ending in .js".to_string(),
                });
            }
        }

        if self.scripts.bundle == self.vendor.bundle {
            errors.push(ConfigValidationError {
                field: "vendor.bundle".to_string(),
                message: "must differ from scripts.bundle".to_string(),
            });
        }

        if self.templates.module.is_empty() {
            errors.push(ConfigValidationError {
                field: "templates.module".to_string(),
                message: "must be a non-empty string".to_string(),
            });
        }

        if self.server.port == 0 {
            errors.push(ConfigValidationError {
                field: "server.port".to_string(),
                message: "must be a positive integer".to_string(),
            });
        }

        errors
    }

    /// Check if validation passed
    pub fn is_valid(&self) -> bool {
        self.validate().is_empty()
    }
}
