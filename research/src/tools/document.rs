//! Tool adapters for template listing, document assembly and compilation.

use crate::error::ToolError;
use crate::io::compiler;
use crate::io::config::LatexSettings;
use crate::io::document::{self, DocumentRequest};
use crate::io::templates::TemplateStore;
use crate::io::workspace::Workspace;

use super::{ParamKind, ResearchTool, ToolArgs, ToolParam};

const CREATE_DOCUMENT_PARAMS: &[ToolParam] = &[
    ToolParam::required(
        "template",
        ParamKind::String,
        "Name of a registered template, e.g. \"article\" or \"beamer\".",
    ),
    ToolParam::required(
        "output_path",
        ParamKind::String,
        "Where to write the assembled .tex file, relative to the working directory.",
    ),
    ToolParam::required(
        "section_files",
        ParamKind::StringList,
        "Existing .tex files to include, in order, relative to the working directory.",
    ),
    ToolParam::optional("title", ParamKind::String, "Document title."),
    ToolParam::optional("author", ParamKind::String, "Document author."),
    ToolParam::optional(
        "date",
        ParamKind::String,
        "Document date. Defaults to the compile date.",
    ),
    ToolParam::optional(
        "abstract",
        ParamKind::String,
        "Abstract text. Only used by the article template.",
    ),
    ToolParam::optional(
        "institute",
        ParamKind::String,
        "Institute line. Only used by the beamer template.",
    ),
];

const COMPILE_PARAMS: &[ToolParam] = &[ToolParam::required(
    "tex_file",
    ParamKind::String,
    "Path of the .tex file to compile, relative to the working directory.",
)];

#[derive(Debug, Clone)]
pub struct ListTemplatesTool {
    store: TemplateStore,
}

impl ListTemplatesTool {
    pub fn new(store: TemplateStore) -> Self {
        Self { store }
    }
}

impl ResearchTool for ListTemplatesTool {
    fn name(&self) -> &str {
        "list_templates"
    }

    fn description(&self) -> &str {
        "Lists the LaTeX templates that create_document can use and whether each template file \
         is present."
    }

    fn parameters(&self) -> &[ToolParam] {
        &[]
    }

    fn call(&self, _args: &ToolArgs) -> Result<String, ToolError> {
        document::list_templates(&self.store)
    }
}

#[derive(Debug, Clone)]
pub struct CreateDocumentTool {
    workspace: Workspace,
    store: TemplateStore,
}

impl CreateDocumentTool {
    pub fn new(workspace: Workspace, store: TemplateStore) -> Self {
        Self { workspace, store }
    }
}

impl ResearchTool for CreateDocumentTool {
    fn name(&self) -> &str {
        "create_document"
    }

    fn description(&self) -> &str {
        "Assembles a complete LaTeX document from a template and a list of existing section \
         files, which are included with \\input in the given order. Fails without writing \
         anything if any section file is missing."
    }

    fn parameters(&self) -> &[ToolParam] {
        CREATE_DOCUMENT_PARAMS
    }

    fn call(&self, args: &ToolArgs) -> Result<String, ToolError> {
        let request = DocumentRequest {
            template: args.required_str("template")?.to_string(),
            output_path: args.required_str("output_path")?.to_string(),
            section_files: args.str_list("section_files"),
            title: args.optional_string("title"),
            author: args.optional_string("author"),
            date: args.optional_string("date"),
            abstract_text: args.optional_string("abstract"),
            institute: args.optional_string("institute"),
        };
        document::create_document(&self.workspace, &self.store, &request)
    }
}

#[derive(Debug, Clone)]
pub struct CompileLatexTool {
    workspace: Workspace,
    settings: LatexSettings,
}

impl CompileLatexTool {
    pub fn new(workspace: Workspace, settings: LatexSettings) -> Self {
        Self {
            workspace,
            settings,
        }
    }
}

impl ResearchTool for CompileLatexTool {
    fn name(&self) -> &str {
        "compile_latex"
    }

    fn description(&self) -> &str {
        "Compiles a .tex file to PDF next to it and reports the PDF path, or the first LaTeX \
         errors when compilation fails."
    }

    fn parameters(&self) -> &[ToolParam] {
        COMPILE_PARAMS
    }

    fn call(&self, args: &ToolArgs) -> Result<String, ToolError> {
        compiler::compile_latex(&self.workspace, &self.settings, args.required_str("tex_file")?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::{TestWorkspace, template_store};
    use crate::tools::ToolRegistry;
    use serde_json::json;

    #[test]
    fn create_document_maps_optional_fields() {
        let tw = TestWorkspace::new().expect("workspace");
        let (_cfg, store) = template_store().expect("store");
        tw.write("sec/a.tex", "A");
        let mut registry = ToolRegistry::new();
        registry.register(CreateDocumentTool::new(tw.workspace().clone(), store));

        let args = json!({
            "template": "article",
            "output_path": "paper.tex",
            "section_files": ["sec/a.tex"],
            "title": "On Things",
            "abstract": "We study things.",
        });
        let out = registry.dispatch("create_document", &args.to_string());
        assert_eq!(out, "Document created at: paper.tex (1 section included)");

        let doc = tw.read("paper.tex");
        assert!(doc.contains("\\title{On Things}"));
        assert!(doc.contains("We study things."));
        assert!(doc.contains("\\input{sec/a.tex}"));
    }

    #[test]
    fn section_files_must_be_a_list() {
        let tw = TestWorkspace::new().expect("workspace");
        let (_cfg, store) = template_store().expect("store");
        let mut registry = ToolRegistry::new();
        registry.register(CreateDocumentTool::new(tw.workspace().clone(), store));

        let args = json!({"template": "article", "output_path": "p.tex", "section_files": "a.tex"});
        let out = registry.dispatch("create_document", &args.to_string());
        assert!(out.contains("invalid arguments for create_document"));
    }

    #[test]
    fn list_templates_takes_no_arguments() {
        let (_cfg, store) = template_store().expect("store");
        let mut registry = ToolRegistry::new();
        registry.register(ListTemplatesTool::new(store));
        let out = registry.dispatch("list_templates", "{}");
        assert!(out.starts_with("Available templates:"));
    }

    #[test]
    fn compile_reports_missing_compiler() {
        let tw = TestWorkspace::new().expect("workspace");
        tw.write("main.tex", "x");
        let mut registry = ToolRegistry::new();
        registry.register(CompileLatexTool::new(
            tw.workspace().clone(),
            LatexSettings {
                compiler: "no-such-latex-binary".to_string(),
                ..LatexSettings::default()
            },
        ));
        let out = registry.dispatch("compile_latex", r#"{"tex_file":"main.tex"}"#);
        assert!(out.starts_with("Error: no-such-latex-binary is not available"));
    }
}
