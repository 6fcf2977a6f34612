//! LaTeX document assembly from a registered template and section files.

use std::fmt::Write as _;
use std::fs;

use minijinja::Environment;
use minijinja::syntax::SyntaxConfig;
use serde::Serialize;
use tracing::{debug, info, instrument};

use crate::core::path::relative_forward_slash;
use crate::error::{EntryKind, ToolError};
use crate::io::templates::{TemplateKind, TemplateStore};
use crate::io::workspace::Workspace;

/// Inputs for [`create_document`].
#[derive(Debug, Clone, Default)]
pub struct DocumentRequest {
    pub template: String,
    pub output_path: String,
    pub section_files: Vec<String>,
    pub title: Option<String>,
    pub author: Option<String>,
    pub date: Option<String>,
    pub abstract_text: Option<String>,
    pub institute: Option<String>,
}

/// Variables visible to document templates.
#[derive(Debug, Serialize)]
struct RenderContext {
    title: Option<String>,
    author: Option<String>,
    date: Option<String>,
    sections: Vec<String>,
    #[serde(rename = "abstract")]
    abstract_text: Option<String>,
    institute: Option<String>,
}

/// Template environment using `\VAR{..}`, `\BLOCK{..}` and `\#{..}` so LaTeX braces
/// pass through untouched.
fn latex_environment<'source>() -> Result<Environment<'source>, minijinja::Error> {
    let mut env = Environment::new();
    env.set_syntax(
        SyntaxConfig::builder()
            .block_delimiters("\\BLOCK{", "}")
            .variable_delimiters("\\VAR{", "}")
            .comment_delimiters("\\#{", "}")
            .build()?,
    );
    env.set_trim_blocks(true);
    env.set_lstrip_blocks(true);
    env.set_keep_trailing_newline(true);
    Ok(env)
}

/// Report which declared templates have a backing file.
pub fn list_templates(store: &TemplateStore) -> Result<String, ToolError> {
    store.install_defaults()?;
    let status = store.status();
    if status.is_empty() {
        return Ok("No templates are declared in the configuration".to_string());
    }
    let mut out = String::from("Available templates:\n");
    for entry in status {
        let state = if entry.present { "present" } else { "missing" };
        let _ = writeln!(out, "  {}: {} ({})", entry.name, state, entry.path.display());
    }
    Ok(out)
}

/// Render `request.template` with the given sections and write it to `request.output_path`.
///
/// Nothing is written unless every section file exists.
#[instrument(skip_all, fields(template = %request.template, output = %request.output_path, sections = request.section_files.len()))]
pub fn create_document(
    workspace: &Workspace,
    store: &TemplateStore,
    request: &DocumentRequest,
) -> Result<String, ToolError> {
    let Some(template_path) = store.resolve(&request.template) else {
        let known: Vec<&str> = store.names().collect();
        return Err(ToolError::InvalidArgument(format!(
            "unknown template '{}' (available: {})",
            request.template,
            known.join(", ")
        )));
    };

    let output = workspace.guard(&request.output_path)?;
    if output.is_dir() {
        return Err(ToolError::WrongType {
            path: request.output_path.clone(),
            expected: EntryKind::File,
            found: EntryKind::Directory,
        });
    }

    let mut sections = Vec::with_capacity(request.section_files.len());
    let mut missing = Vec::new();
    for raw in &request.section_files {
        let path = workspace.guard(raw)?;
        if path.is_file() {
            sections.push(path);
        } else {
            missing.push(raw.clone());
        }
    }
    if !missing.is_empty() {
        return Err(ToolError::MissingSections { paths: missing });
    }

    store.install_defaults()?;
    if !template_path.is_file() {
        return Err(ToolError::NotFound {
            what: EntryKind::File,
            path: template_path.display().to_string(),
        });
    }
    let source = fs::read_to_string(&template_path)
        .map_err(|e| ToolError::io("read", template_path.display().to_string(), e))?;

    let output_dir = output
        .parent()
        .map(std::path::Path::to_path_buf)
        .unwrap_or_else(|| workspace.root().to_path_buf());
    let includes: Vec<String> = sections
        .iter()
        .map(|section| relative_forward_slash(&output_dir, section))
        .collect();
    debug!(?includes, "resolved section includes");

    let kind = TemplateKind::from_name(&request.template);
    let non_empty = |value: &Option<String>| {
        value
            .as_deref()
            .map(str::trim)
            .filter(|s| !s.is_empty())
            .map(str::to_string)
    };
    let abstract_text = non_empty(&request.abstract_text).filter(|_| kind.uses_abstract());
    let institute = non_empty(&request.institute).filter(|_| kind.uses_institute());

    let ctx = RenderContext {
        title: non_empty(&request.title),
        author: non_empty(&request.author),
        date: non_empty(&request.date),
        sections: includes,
        abstract_text,
        institute,
    };

    let env = latex_environment().map_err(|e| ToolError::RenderError(e.to_string()))?;
    let rendered = env
        .template_from_named_str(&request.template, &source)
        .and_then(|template| template.render(&ctx))
        .map_err(|e| ToolError::RenderError(format!("{e:#}")))?;

    fs::create_dir_all(&output_dir)
        .map_err(|e| ToolError::io("create directory", workspace.display(&output_dir), e))?;
    fs::write(&output, rendered)
        .map_err(|e| ToolError::io("write", request.output_path.clone(), e))?;

    let shown = workspace.display(&output);
    info!(output = %shown, sections = sections.len(), "document created");
    Ok(format!(
        "Document created at: {shown} ({} section{} included)",
        sections.len(),
        if sections.len() == 1 { "" } else { "s" }
    ))
}
