//! # Project Configuration
//!
//! [`BattmoConfig`] gathers every setting the tooling reads: where source
//! links point, how the schema registry is laid out, and the options
//! handed to the documentation generator. It is loaded once from
//! `battmo.yaml` (or built from defaults) and never mutated afterwards.
//!
//! ```text
//! BattmoConfig
//! ├── source  (SourceConfig — repository URL, branch, ignored dirs)
//! ├── schemas (SchemaConfig — schema dir, base URI, fragment list)
//! └── docs    (DocsConfig — generator options, theme, custom roles)
//! ```
//!
//! Every section is `#[serde(default)]`, so a file only has to name the
//! values it overrides.

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::error::{BattmoError, BattmoResult};

/// Name of the configuration file looked up at the project root.
pub const CONFIG_FILE_NAME: &str = "battmo.yaml";

// ---------------------------------------------------------------------------
// Source links
// ---------------------------------------------------------------------------

/// Where `:battmo:` references are searched for and where their links point.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct SourceConfig {
    /// Repository browser root (e.g., `https://github.com/BattMoTeam/BattMo-dev`).
    pub repo_url: String,
    /// Branch the links are pinned to.
    pub branch: String,
    /// Extension appended to a bare identifier, without the dot.
    pub extension: String,
    /// Directory names never descended into while searching.
    pub ignored_dirs: Vec<String>,
}

impl Default for SourceConfig {
    fn default() -> Self {
        Self {
            repo_url: "https://github.com/BattMoTeam/BattMo-dev".to_string(),
            branch: "modelrefac".to_string(),
            extension: "m".to_string(),
            ignored_dirs: ["output", "MRST", ".git", "Documentation"]
                .iter()
                .map(|s| s.to_string())
                .collect(),
        }
    }
}

// ---------------------------------------------------------------------------
// Schema registry
// ---------------------------------------------------------------------------

/// Layout of the JSON Schema fragments and the default validation run.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct SchemaConfig {
    /// Directory holding `<name>.schema.json` files, relative to the project root.
    pub schema_dir: PathBuf,
    /// Prefix of the synthetic URI each fragment is registered under.
    pub base_uri: String,
    /// Fragment names, registered in this order.
    pub fragments: Vec<String>,
    /// Name of the schema instances are validated against.
    pub top_level: String,
    /// Instance document checked when none is given on the command line.
    pub default_instance: PathBuf,
}

impl Default for SchemaConfig {
    fn default() -> Self {
        Self {
            schema_dir: PathBuf::from("Utilities").join("JsonSchemas"),
            base_uri: "file://batmo/schemas/".to_string(),
            fragments: [
                "activematerial",
                "battery",
                "binaryelectrolyte",
                "currentcollector",
                "soliddiffusion",
                "electrode",
                "electrolyte",
                "separator",
                "thermalmodel",
            ]
            .iter()
            .map(|s| s.to_string())
            .collect(),
            top_level: "battery".to_string(),
            default_instance: PathBuf::from("Battery").join("lithiumbattery.json"),
        }
    }
}

// ---------------------------------------------------------------------------
// Documentation build
// ---------------------------------------------------------------------------

/// Navigation options of the HTML theme.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ThemeOptions {
    pub collapse_navigation: bool,
    pub sticky_navigation: bool,
    /// Maximum depth of the navigation tree; `-1` for unlimited.
    pub navigation_depth: i32,
    pub includehidden: bool,
    pub titles_only: bool,
}

impl Default for ThemeOptions {
    fn default() -> Self {
        Self {
            collapse_navigation: false,
            sticky_navigation: true,
            navigation_depth: 4,
            includehidden: true,
            titles_only: false,
        }
    }
}

/// One LaTeX output document.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LatexDocument {
    /// Source start file (master document).
    pub start_doc: String,
    /// Output `.tex` file name.
    pub target_name: String,
    pub title: String,
    pub author: String,
    /// `manual`, `howto`, or a custom class.
    pub document_class: String,
}

/// Options consumed by the documentation generator.
///
/// Keys mirror the generator's own vocabulary so the section can be
/// handed over as-is.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct DocsConfig {
    pub project: String,
    pub copyright: String,
    pub author: String,
    pub master_doc: String,
    pub source_suffix: String,
    pub extensions: Vec<String>,
    pub bibtex_bibfiles: Vec<String>,
    /// Substitutions available on every page (`|battmo|` and friends).
    pub global_substitutions: BTreeMap<String, String>,
    pub templates_path: Vec<String>,
    pub exclude_patterns: Vec<String>,
    pub pygments_style: String,
    pub html_theme: String,
    pub html_theme_options: ThemeOptions,
    pub html_logo: Option<String>,
    pub html_favicon: Option<String>,
    pub html_static_path: Vec<String>,
    pub html_css_files: Vec<String>,
    pub autoclass_content: String,
    pub autodoc_member_order: String,
    pub add_module_names: bool,
    pub latex_documents: Vec<LatexDocument>,
    /// Inline roles that only attach a CSS class: role name → class.
    pub class_roles: BTreeMap<String, String>,
}

impl Default for DocsConfig {
    fn default() -> Self {
        let strings = |items: &[&str]| items.iter().map(|s| s.to_string()).collect::<Vec<_>>();
        Self {
            project: "BattMo".to_string(),
            copyright: "2021, Simon Clark".to_string(),
            author: "Simon Clark".to_string(),
            master_doc: "index".to_string(),
            source_suffix: ".rst".to_string(),
            extensions: strings(&["sphinxcontrib.globalsubs", "sphinxcontrib.bibtex"]),
            bibtex_bibfiles: strings(&["refs.bib"]),
            global_substitutions: BTreeMap::from([(
                "battmo".to_string(),
                "**BattMo**".to_string(),
            )]),
            templates_path: strings(&["_templates"]),
            exclude_patterns: strings(&["_build"]),
            pygments_style: "sphinx".to_string(),
            html_theme: "sphinx_rtd_theme".to_string(),
            html_theme_options: ThemeOptions::default(),
            html_logo: Some("battmologo.png".to_string()),
            html_favicon: Some("battmologo.ico".to_string()),
            html_static_path: strings(&["_static"]),
            html_css_files: strings(&["css/custom.css"]),
            autoclass_content: "both".to_string(),
            autodoc_member_order: "bysource".to_string(),
            add_module_names: false,
            latex_documents: vec![LatexDocument {
                start_doc: "index".to_string(),
                target_name: "MATLABSphinxDocumentationTest.tex".to_string(),
                title: "MATLAB Sphinx Documentation Test Documentation".to_string(),
                author: "Mark Mikofski".to_string(),
                document_class: "manual".to_string(),
            }],
            class_roles: BTreeMap::from([("todo".to_string(), "todo".to_string())]),
        }
    }
}

impl DocsConfig {
    /// Render the generator options as YAML.
    pub fn to_yaml(&self) -> BattmoResult<String> {
        serde_yaml::to_string(self).map_err(|e| BattmoError::Serialization(e.to_string()))
    }
}

// ---------------------------------------------------------------------------
// BattmoConfig
// ---------------------------------------------------------------------------

/// Complete project configuration.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct BattmoConfig {
    pub source: SourceConfig,
    pub schemas: SchemaConfig,
    pub docs: DocsConfig,
}

impl BattmoConfig {
    /// Parse a configuration from YAML text. `origin` is only used in
    /// error messages.
    pub fn from_yaml_str(content: &str, origin: &Path) -> BattmoResult<Self> {
        // An empty file deserializes to `null`; treat it as "all defaults".
        if content.trim().is_empty() {
            return Ok(Self::default());
        }
        serde_yaml::from_str(content).map_err(|e| BattmoError::ConfigParse {
            path: origin.to_path_buf(),
            reason: e.to_string(),
        })
    }

    /// Load a configuration file.
    pub fn load(path: &Path) -> BattmoResult<Self> {
        let content = std::fs::read_to_string(path).map_err(|source| BattmoError::ConfigRead {
            path: path.to_path_buf(),
            source,
        })?;
        let config = Self::from_yaml_str(&content, path)?;
        tracing::debug!(path = %path.display(), "loaded configuration");
        Ok(config)
    }

    /// Load `<root>/battmo.yaml` if present, otherwise fall back to defaults.
    pub fn load_from_root(root: &Path) -> BattmoResult<Self> {
        let candidate = root.join(CONFIG_FILE_NAME);
        if candidate.is_file() {
            Self::load(&candidate)
        } else {
            tracing::debug!(root = %root.display(), "no {CONFIG_FILE_NAME} found; using defaults");
            Ok(Self::default())
        }
    }

    /// Check internal consistency. Returns a list of problems (empty = valid).
    pub fn validate(&self) -> Vec<String> {
        let mut problems = Vec::new();

        if !self.source.repo_url.contains("://") {
            problems.push(format!(
                "source.repo_url must be an absolute URL, got '{}'",
                self.source.repo_url
            ));
        }
        if self.source.branch.trim().is_empty() {
            problems.push("source.branch must not be empty".to_string());
        }
        if self.source.extension.is_empty() || self.source.extension.starts_with('.') {
            problems.push(format!(
                "source.extension must be a bare extension such as 'm', got '{}'",
                self.source.extension
            ));
        }

        if !self.schemas.base_uri.ends_with('/') {
            problems.push(format!(
                "schemas.base_uri must end with '/', got '{}'",
                self.schemas.base_uri
            ));
        }
        if self.schemas.fragments.is_empty() {
            problems.push("schemas.fragments must list at least one schema".to_string());
        }
        let mut seen = std::collections::BTreeSet::new();
        for name in &self.schemas.fragments {
            if !seen.insert(name.as_str()) {
                problems.push(format!("schemas.fragments lists '{name}' more than once"));
            }
        }
        if self.schemas.top_level.trim().is_empty() {
            problems.push("schemas.top_level must not be empty".to_string());
        }

        if self.docs.project.trim().is_empty() {
            problems.push("docs.project must not be empty".to_string());
        }
        if self.docs.html_theme_options.navigation_depth == 0 {
            problems.push("docs.html_theme_options.navigation_depth must be -1 or positive".to_string());
        }

        problems
    }

    /// [`validate`](Self::validate), turned into an error when anything is wrong.
    pub fn ensure_valid(&self) -> BattmoResult<()> {
        let problems = self.validate();
        if problems.is_empty() {
            Ok(())
        } else {
            Err(BattmoError::InvalidConfig { problems })
        }
    }
}
