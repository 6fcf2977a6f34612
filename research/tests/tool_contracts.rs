//! Contract tests for the model-facing tools.
//!
//! Drives the tool registries exactly as an agent would (tool name plus raw JSON
//! arguments) and checks the text that comes back and the files left behind.

use std::rc::Rc;

use research::agents::team::TeamBuilder;
use research::io::config::{Settings, WebSettings};
use research::io::fetch::WebFetcher;
use research::test_support::{ScriptedBackend, TestWorkspace, template_store};
use research::tools::ToolRegistry;
use serde_json::json;

/// Run `check` against the writing agent's registry (every file and document tool).
fn with_writing_tools(check: impl FnOnce(&TestWorkspace, &ToolRegistry)) {
    let tw = TestWorkspace::new().expect("workspace");
    let (_cfg, templates) = template_store().expect("templates");
    let fetcher = WebFetcher::new(&WebSettings::default()).expect("fetcher");
    let settings = Settings::default();
    let team = TeamBuilder::new(
        &settings,
        tw.workspace(),
        &templates,
        &fetcher,
        Rc::new(ScriptedBackend::default()),
    )
    .fallback_api_key(Some("k".to_string()));
    let writer = team.writing_agent().expect("writing agent");
    check(&tw, writer.tools());
}

#[test]
fn escaping_paths_never_touch_the_filesystem() {
    with_writing_tools(|tw, tools| {
        let calls = [
            ("create_file", json!({"content": "x", "filename": "../../etc/passwd"})),
            ("read_file", json!({"path": "../../etc/passwd"})),
            ("list_files", json!({"directory": "/etc"})),
            (
                "create_document",
                json!({"template": "article", "output_path": "../out.tex", "section_files": []}),
            ),
            ("compile_latex", json!({"tex_file": "../../etc/x.tex"})),
        ];
        for (tool, args) in calls {
            let out = tools.dispatch(tool, &args.to_string());
            assert!(
                out.contains("Cannot access paths outside the current working directory"),
                "{tool}: {out}"
            );
        }
        let parent = tw.path().parent().expect("parent");
        assert!(!parent.join("out.tex").exists());
    });
}

#[test]
fn create_then_read_returns_exact_content() {
    with_writing_tools(|_, tools| {
        for (name, content) in [("empty.txt", ""), ("notes/n.md", "# Notes\n\nline two\n")] {
            let out = tools.dispatch(
                "create_file",
                &json!({"content": content, "filename": name}).to_string(),
            );
            assert_eq!(out, format!("File successfully created at: {name}"));

            let out = tools.dispatch("read_file", &json!({"path": name}).to_string());
            let (header, body) = out.split_once("---\n").expect("header separator");
            assert!(header.starts_with(&format!("File: {name}\n")));
            assert!(header.contains("Size: "));
            assert!(header.contains("Modified: "));
            assert_eq!(body, content);
        }
    });
}

#[test]
fn listing_puts_directories_before_files() {
    with_writing_tools(|tw, tools| {
        assert!(tools.dispatch("list_files", "{}").starts_with("No files found"));

        tw.write("zeta.txt", "z");
        tw.write("alpha/inner.txt", "a");
        let out = tools.dispatch("list_files", "{}");
        let dirs_at = out.find("Directories:\n  alpha/").expect("directories");
        let files_at = out.find("Files:\n  zeta.txt").expect("files");
        assert!(dirs_at < files_at);
        assert!(!out.contains("inner.txt"));
    });
}

#[test]
fn document_with_a_missing_section_writes_nothing() {
    with_writing_tools(|tw, tools| {
        tw.write("sections/intro.tex", "Intro");
        let args = json!({
            "template": "article",
            "output_path": "report.tex",
            "section_files": ["sections/intro.tex", "sections/results.tex"],
        });
        let out = tools.dispatch("create_document", &args.to_string());
        assert_eq!(
            out,
            "Error: The following section files do not exist: sections/results.tex"
        );
        assert!(!tw.exists("report.tex"));
    });
}

#[test]
fn assembled_document_lists_sections_in_order() {
    with_writing_tools(|tw, tools| {
        tools.dispatch(
            "create_file",
            &json!({"content": "\\section{B}", "filename": "b.tex"}).to_string(),
        );
        tools.dispatch(
            "create_file",
            &json!({"content": "\\section{A}", "filename": "a.tex"}).to_string(),
        );
        let args = json!({
            "template": "article",
            "output_path": "doc/main.tex",
            "section_files": ["b.tex", "a.tex"],
            "author": "R. Searcher",
        });
        let out = tools.dispatch("create_document", &args.to_string());
        assert_eq!(out, "Document created at: doc/main.tex (2 sections included)");

        let doc = tw.read("doc/main.tex");
        let b = doc.find("\\input{../b.tex}").expect("b");
        let a = doc.find("\\input{../a.tex}").expect("a");
        assert!(b < a);
        assert!(doc.contains("\\author{R. Searcher}"));
    });
}
