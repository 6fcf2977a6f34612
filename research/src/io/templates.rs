//! Template registry backed by files in the configuration directory.

use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};

use tracing::info;

use crate::error::ToolError;
use crate::io::config::ConfigStore;

const ARTICLE_TEMPLATE: &str = include_str!("templates/article.tex");
const BEAMER_TEMPLATE: &str = include_str!("templates/beamer.tex");

/// Templates shipped with the binary, copied out on first use.
pub const PACKAGED_TEMPLATES: &[(&str, &str)] =
    &[("article", ARTICLE_TEMPLATE), ("beamer", BEAMER_TEMPLATE)];

/// Template families with kind-specific render variables.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TemplateKind {
    /// Renders an abstract.
    Article,
    /// Renders an institute.
    Beamer,
    Other,
}

impl TemplateKind {
    pub fn from_name(name: &str) -> Self {
        match name {
            "article" => TemplateKind::Article,
            "beamer" => TemplateKind::Beamer,
            _ => TemplateKind::Other,
        }
    }

    pub fn uses_abstract(self) -> bool {
        self == TemplateKind::Article
    }

    pub fn uses_institute(self) -> bool {
        self == TemplateKind::Beamer
    }
}

/// Presence of one declared template.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TemplateStatus {
    pub name: String,
    pub path: PathBuf,
    pub present: bool,
}

/// Declared templates resolved against the configuration directory.
#[derive(Debug, Clone)]
pub struct TemplateStore {
    config_dir: PathBuf,
    registry: BTreeMap<String, String>,
}

impl TemplateStore {
    pub fn new(config_dir: impl Into<PathBuf>, registry: BTreeMap<String, String>) -> Self {
        Self {
            config_dir: config_dir.into(),
            registry,
        }
    }

    pub fn from_config(config: &ConfigStore) -> Self {
        Self::new(config.config_dir(), config.settings().templates.clone())
    }

    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.registry.keys().map(String::as_str)
    }

    /// File backing `name`, if the name is declared.
    pub fn resolve(&self, name: &str) -> Option<PathBuf> {
        self.registry.get(name).map(|raw| {
            let path = Path::new(raw);
            if path.is_absolute() {
                path.to_path_buf()
            } else {
                self.config_dir.join(path)
            }
        })
    }

    /// Copy packaged templates for declared names whose file is missing.
    ///
    /// Returns the paths written. Existing files are never touched.
    pub fn install_defaults(&self) -> Result<Vec<PathBuf>, ToolError> {
        let mut written = Vec::new();
        for (name, contents) in PACKAGED_TEMPLATES {
            let Some(path) = self.resolve(name) else {
                continue;
            };
            if path.exists() {
                continue;
            }
            if let Some(parent) = path.parent() {
                fs::create_dir_all(parent).map_err(|e| {
                    ToolError::io("create directory", parent.display().to_string(), e)
                })?;
            }
            fs::write(&path, contents)
                .map_err(|e| ToolError::io("write", path.display().to_string(), e))?;
            info!(template = name, path = %path.display(), "installed default template");
            written.push(path);
        }
        Ok(written)
    }

    pub fn status(&self) -> Vec<TemplateStatus> {
        self.registry
            .keys()
            .filter_map(|name| {
                self.resolve(name).map(|path| TemplateStatus {
                    name: name.clone(),
                    present: path.is_file(),
                    path,
                })
            })
            .collect()
    }
}
