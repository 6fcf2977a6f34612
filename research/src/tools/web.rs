//! Tool adapters for the web fetchers.

use crate::error::ToolError;
use crate::io::fetch::WebFetcher;

use super::{ParamKind, ResearchTool, ToolArgs, ToolParam};

const URL_PARAMS: &[ToolParam] = &[ToolParam::required(
    "url",
    ParamKind::String,
    "The http(s) URL to fetch.",
)];

const SEARCH_PARAMS: &[ToolParam] = &[ToolParam::required(
    "query",
    ParamKind::String,
    "The search query to perform.",
)];

#[derive(Debug, Clone)]
pub struct VisitWebpageTool {
    fetcher: WebFetcher,
}

impl VisitWebpageTool {
    pub fn new(fetcher: WebFetcher) -> Self {
        Self { fetcher }
    }
}

impl ResearchTool for VisitWebpageTool {
    fn name(&self) -> &str {
        "visit_webpage"
    }

    fn description(&self) -> &str {
        "Visits a webpage at the given URL and returns its content as Markdown-like text."
    }

    fn parameters(&self) -> &[ToolParam] {
        URL_PARAMS
    }

    fn call(&self, args: &ToolArgs) -> Result<String, ToolError> {
        self.fetcher.visit_webpage(args.required_str("url")?)
    }
}

#[derive(Debug, Clone)]
pub struct ExtractPdfTextTool {
    fetcher: WebFetcher,
}

impl ExtractPdfTextTool {
    pub fn new(fetcher: WebFetcher) -> Self {
        Self { fetcher }
    }
}

impl ResearchTool for ExtractPdfTextTool {
    fn name(&self) -> &str {
        "extract_pdf_text"
    }

    fn description(&self) -> &str {
        "Downloads a PDF from the given URL and returns its text content."
    }

    fn parameters(&self) -> &[ToolParam] {
        URL_PARAMS
    }

    fn call(&self, args: &ToolArgs) -> Result<String, ToolError> {
        self.fetcher.extract_pdf_text(args.required_str("url")?)
    }
}

#[derive(Debug, Clone)]
pub struct WebSearchTool {
    fetcher: WebFetcher,
}

impl WebSearchTool {
    pub fn new(fetcher: WebFetcher) -> Self {
        Self { fetcher }
    }
}

impl ResearchTool for WebSearchTool {
    fn name(&self) -> &str {
        "web_search"
    }

    fn description(&self) -> &str {
        "Performs a DuckDuckGo web search for the query and returns the top results as a \
         Markdown list of titles, links and snippets."
    }

    fn parameters(&self) -> &[ToolParam] {
        SEARCH_PARAMS
    }

    fn call(&self, args: &ToolArgs) -> Result<String, ToolError> {
        self.fetcher.web_search(args.required_str("query")?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::io::config::WebSettings;
    use crate::test_support::serve_once;
    use crate::tools::ToolRegistry;
    use serde_json::json;

    fn registry(fetcher: WebFetcher) -> ToolRegistry {
        let mut registry = ToolRegistry::new();
        registry
            .register(VisitWebpageTool::new(fetcher.clone()))
            .register(ExtractPdfTextTool::new(fetcher.clone()))
            .register(WebSearchTool::new(fetcher));
        registry
    }

    #[test]
    fn visit_webpage_through_registry() {
        let url = serve_once(
            "200 OK",
            "text/html",
            b"<html><body><p>Hello research</p></body></html>".to_vec(),
        );
        let fetcher = WebFetcher::new(&WebSettings::default()).expect("fetcher");
        let out = registry(fetcher).dispatch("visit_webpage", &json!({"url": url}).to_string());
        assert!(out.starts_with(&format!("Source: {url}\n\n")));
        assert!(out.contains("Hello research"));
    }

    #[test]
    fn upstream_failures_are_rendered() {
        let fetcher = WebFetcher::new(&WebSettings {
            timeout_secs: 2,
            ..WebSettings::default()
        })
        .expect("fetcher");
        let out = registry(fetcher).dispatch(
            "extract_pdf_text",
            r#"{"url":"http://127.0.0.1:9/paper.pdf"}"#,
        );
        assert!(out.starts_with("Error: Request to http://127.0.0.1:9/paper.pdf request failed"));
    }

    #[test]
    fn search_requires_a_query() {
        let fetcher = WebFetcher::new(&WebSettings::default()).expect("fetcher");
        let out = registry(fetcher).dispatch("web_search", "{}");
        assert!(out.contains("invalid arguments for web_search"));
    }
}
