//! Per-user configuration stored as TOML under the XDG config directory.
//!
//! The file is meant to be edited by hand. On every start the defaults are merged
//! back in so that keys introduced by newer versions always exist.

use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result, anyhow, bail};
use directories::ProjectDirs;
use serde::{Deserialize, Serialize};
use toml::{Table, Value};
use tracing::{debug, info};

use crate::core::merge::merge_missing;

pub const CONFIG_DIR_NAME: &str = "cheap_research";
pub const CONFIG_FILE_NAME: &str = "config.toml";

const ORCHESTRATOR_PROMPT: &str = "As an expert PhD-level researcher, you will coordinate a team of \
research assistant agents with specialized tools to gather and analyze information on a given \
topic. Your goal is to produce a comprehensive and well-researched report on the topic.
You will ensure that all information is appropriately cited and that the report is \
well-structured and easy to read.
All citations must be verified by your research assistants. Break up your research into smaller \
tasks and assign them to your research assistant agents. For example, you can have one task about \
gathering relevant web pages, and then have other tasks about analyzing and summarizing the \
information on those web pages.
The workflow should be as such:
 1. Gather relevant information. Prefer academic sources.
 2. Use the web_page_agent to visit the web pages and save the content to files. Make sure to \
check the files using the list_files tool.
 3. If there is insufficient information, repeat steps 1 and 2.
 4. Plan the structure of the report and the content of each section.
 5. Use the writing_agent to create a .bib file with all the citations.
 6. Use the writing_agent to write each section or slide in a separate tex file. Make sure to \
check the files using the list_files tool.
 7. Use the writing_agent to combine all the sections into a single document with the \
create_document tool and compile it with the compile_latex tool.";

const WEB_SEARCH_PROMPT: &str = "Respond in a very concise manner. Ensure that your responses are \
as short as possible while retaining all necessary information.
Make sure to include the full URL of any webpages you collect.
";

const WEB_PAGE_PROMPT: &str = "Respond in a very concise manner. Ensure that your responses are as \
short as possible while retaining all necessary information.

When requested to save a webpage, use the create_file tool to save the page content to a file in \
the specified location. Default to markdown files for webpage content and choose descriptive \
filenames based on the page title or URL. Within the file, make sure to include sufficient \
information to fully cite the webpage, including the URL, author, and date of publication, when \
available.
Include the filename in your response.
";

const WRITING_PROMPT: &str = "As a specialized writing assistant, you can read files, list \
available files, and create new files with content.
When writing content, follow these guidelines:
- Use clear, concise language appropriate for the requested content type
- Properly attribute any sources used in your writing
- Format content appropriately based on the file type and purpose
- For markdown files, use proper markdown syntax for headings, lists, etc.
- Always save files with appropriate extensions (.md, .tex, .bib, etc.)
- Note that you will be asked to write partial LaTeX documents, so do not include the \
\\documentclass or \\begin{document} commands in your responses unless requested to do so.
";

const DEFAULT_SMALL_MODEL: &str = "openrouter/mistralai/mistral-small-24b-instruct-2501";

/// Typed view of the configuration file.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct Settings {
    /// Set to `true` by the user once models and keys are filled in.
    pub initialized: bool,
    pub orchestrator: AgentSettings,
    pub web_search: AgentSettings,
    pub web_page: AgentSettings,
    pub writing: AgentSettings,
    pub file_saving: FileSavingSettings,
    pub file_listing: FileListingSettings,
    /// Template registry: name -> template file. Relative paths resolve against the
    /// configuration directory.
    pub templates: BTreeMap<String, String>,
    pub latex: LatexSettings,
    pub web: WebSettings,
    pub llm: LlmSettings,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(default)]
pub struct AgentSettings {
    /// LiteLLM-style model id, e.g. `openrouter/anthropic/claude-3.7-sonnet`.
    pub model: String,
    pub api_key: String,
    /// Appended to the agent's built-in system prompt.
    pub additional_system_prompt: String,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct FileSavingSettings {
    pub enabled: bool,
    /// Relative to the working directory.
    pub default_directory: String,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct FileListingSettings {
    pub enabled: bool,
    pub show_file_sizes: bool,
    pub show_modification_times: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct LatexSettings {
    pub compiler: String,
    /// Passed before the document file name; the defaults force every pass
    /// non-interactively.
    pub args: Vec<String>,
    /// Zero waits for the compiler indefinitely.
    pub timeout_secs: u64,
    /// Captured compiler stdout/stderr beyond this many bytes is discarded.
    pub output_limit_bytes: usize,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct WebSettings {
    pub timeout_secs: u64,
    pub max_output_chars: usize,
    pub user_agent: String,
    pub search_results: usize,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct LlmSettings {
    /// OpenAI-compatible API root, without the `/chat/completions` suffix.
    pub base_url: String,
    pub max_steps: u32,
    /// Per-request budget for a chat completion.
    pub timeout_secs: u64,
    /// Environment variable consulted when an agent's `api_key` is empty.
    pub api_key_env: String,
}

impl AgentSettings {
    fn with(model: &str, prompt: &str) -> Self {
        Self {
            model: model.to_string(),
            api_key: String::new(),
            additional_system_prompt: prompt.to_string(),
        }
    }
}

impl Default for FileSavingSettings {
    fn default() -> Self {
        Self {
            enabled: true,
            default_directory: "saved_pages".to_string(),
        }
    }
}

impl Default for FileListingSettings {
    fn default() -> Self {
        Self {
            enabled: true,
            show_file_sizes: true,
            show_modification_times: true,
        }
    }
}

impl Default for LatexSettings {
    fn default() -> Self {
        Self {
            compiler: "latexmk".to_string(),
            args: ["-pdf", "-g", "-interaction=nonstopmode", "-halt-on-error"]
                .into_iter()
                .map(str::to_string)
                .collect(),
            timeout_secs: 0,
            output_limit_bytes: 1_000_000,
        }
    }
}

impl Default for WebSettings {
    fn default() -> Self {
        Self {
            timeout_secs: 20,
            max_output_chars: 40_000,
            user_agent: "Mozilla/5.0 (X11; Linux x86_64) AppleWebKit/537.36 (KHTML, like Gecko) \
                         Chrome/124.0 Safari/537.36"
                .to_string(),
            search_results: 10,
        }
    }
}

impl Default for LlmSettings {
    fn default() -> Self {
        Self {
            base_url: "https://openrouter.ai/api/v1".to_string(),
            max_steps: 10,
            timeout_secs: 300,
            api_key_env: "OPENROUTER_API_KEY".to_string(),
        }
    }
}

impl Default for Settings {
    fn default() -> Self {
        let templates = [
            ("article", "templates/article.tex"),
            ("beamer", "templates/beamer.tex"),
        ]
        .into_iter()
        .map(|(name, path)| (name.to_string(), path.to_string()))
        .collect();

        Self {
            initialized: false,
            orchestrator: AgentSettings::with(
                "openrouter/anthropic/claude-3.7-sonnet",
                ORCHESTRATOR_PROMPT,
            ),
            web_search: AgentSettings::with(DEFAULT_SMALL_MODEL, WEB_SEARCH_PROMPT),
            web_page: AgentSettings::with(DEFAULT_SMALL_MODEL, WEB_PAGE_PROMPT),
            writing: AgentSettings::with(DEFAULT_SMALL_MODEL, WRITING_PROMPT),
            file_saving: FileSavingSettings::default(),
            file_listing: FileListingSettings::default(),
            templates,
            latex: LatexSettings::default(),
            web: WebSettings::default(),
            llm: LlmSettings::default(),
        }
    }
}

impl Settings {
    pub fn validate(&self) -> Result<()> {
        if self.web.max_output_chars == 0 {
            return Err(anyhow!("web.max_output_chars must be > 0"));
        }
        if self.web.timeout_secs == 0 {
            return Err(anyhow!("web.timeout_secs must be > 0"));
        }
        if self.llm.max_steps == 0 {
            return Err(anyhow!("llm.max_steps must be > 0"));
        }
        if self.llm.timeout_secs == 0 {
            return Err(anyhow!("llm.timeout_secs must be > 0"));
        }
        if self.latex.compiler.trim().is_empty() {
            return Err(anyhow!("latex.compiler must be non-empty"));
        }
        if self.latex.output_limit_bytes == 0 {
            return Err(anyhow!("latex.output_limit_bytes must be > 0"));
        }
        Ok(())
    }

    /// Built-in defaults as a TOML table, the reference for the merge.
    pub fn default_table() -> Result<Table> {
        into_table(&Settings::default())
    }
}

/// The configuration file on disk plus its typed view.
///
/// `table` keeps user-only keys that `Settings` does not know about, so saving never
/// drops them.
#[derive(Debug, Clone)]
pub struct ConfigStore {
    path: PathBuf,
    table: Table,
    settings: Settings,
    added_keys: Vec<String>,
}

impl ConfigStore {
    /// `$XDG_CONFIG_HOME/cheap_research/config.toml` (platform config dir elsewhere).
    pub fn default_path() -> Result<PathBuf> {
        let dirs = ProjectDirs::from("", "", CONFIG_DIR_NAME)
            .ok_or_else(|| anyhow!("could not determine the user configuration directory"))?;
        Ok(dirs.config_dir().join(CONFIG_FILE_NAME))
    }

    /// Load the configuration at `path`, creating it from defaults when missing and
    /// backfilling any default keys it lacks.
    pub fn open(path: impl Into<PathBuf>) -> Result<Self> {
        let path = path.into();
        let defaults = Settings::default_table()?;

        if !path.exists() {
            info!(path = %path.display(), "writing default configuration");
            write_table(&path, &defaults)?;
        }

        let mut table = read_table(&path)?;
        let added_keys = merge_missing(&mut table, &defaults);
        for key in &added_keys {
            info!(key, "added missing configuration entry");
        }
        if !added_keys.is_empty() {
            write_table(&path, &table)?;
        }

        let settings = settings_from(&table, &path)?;
        Ok(Self {
            path,
            table,
            settings,
            added_keys,
        })
    }

    /// Re-read the file, discarding in-memory changes.
    pub fn reload(&mut self) -> Result<()> {
        let table = read_table(&self.path)?;
        self.settings = settings_from(&table, &self.path)?;
        self.table = table;
        debug!(path = %self.path.display(), "configuration reloaded");
        Ok(())
    }

    /// Write the current in-memory state back to disk.
    pub fn save(&self) -> Result<()> {
        write_table(&self.path, &self.table)
    }

    /// Replace the typed settings, carrying user-only keys over.
    pub fn update(&mut self, settings: Settings) -> Result<()> {
        settings.validate()?;
        let typed = into_table(&settings)?;
        for (key, value) in typed {
            self.table.insert(key, value);
        }
        self.settings = settings;
        Ok(())
    }

    pub fn settings(&self) -> &Settings {
        &self.settings
    }

    pub fn table(&self) -> &Table {
        &self.table
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Directory holding the configuration file; template paths resolve here.
    pub fn config_dir(&self) -> &Path {
        self.path.parent().unwrap_or_else(|| Path::new("."))
    }

    /// Dotted keys backfilled from defaults when this store was opened.
    pub fn added_keys(&self) -> &[String] {
        &self.added_keys
    }
}

fn into_table(settings: &Settings) -> Result<Table> {
    match Value::try_from(settings).context("serialize settings")? {
        Value::Table(table) => Ok(table),
        other => bail!("settings serialized to a {} instead of a table", other.type_str()),
    }
}

fn settings_from(table: &Table, path: &Path) -> Result<Settings> {
    let settings: Settings = Value::Table(table.clone())
        .try_into()
        .with_context(|| format!("parse {}", path.display()))?;
    settings.validate()?;
    Ok(settings)
}

fn read_table(path: &Path) -> Result<Table> {
    let contents = fs::read_to_string(path).with_context(|| format!("read {}", path.display()))?;
    toml::from_str(&contents).with_context(|| format!("parse {}", path.display()))
}

/// Atomically write the table to disk (temp file + rename).
fn write_table(path: &Path, table: &Table) -> Result<()> {
    let mut buf = toml::to_string_pretty(table).context("serialize config toml")?;
    if !buf.ends_with('\n') {
        buf.push('\n');
    }
    write_atomic(path, &buf)
}

fn write_atomic(path: &Path, contents: &str) -> Result<()> {
    let parent = path
        .parent()
        .with_context(|| format!("config path missing parent {}", path.display()))?;
    fs::create_dir_all(parent).with_context(|| format!("create directory {}", parent.display()))?;
    let tmp_path = path.with_extension("toml.tmp");
    fs::write(&tmp_path, contents)
        .with_context(|| format!("write temp config {}", tmp_path.display()))?;
    fs::rename(&tmp_path, path).with_context(|| format!("replace config {}", path.display()))?;
    Ok(())
}
