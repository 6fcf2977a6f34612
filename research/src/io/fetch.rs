//! Outbound fetchers: web pages, PDFs and a DuckDuckGo search.
//!
//! Each call performs exactly one blocking request and converts the body to plain
//! text. Nothing is cached or written to disk.

use std::fmt::Write as _;
use std::panic::{self, AssertUnwindSafe};
use std::time::Duration;

use reqwest::blocking::{Client, Response};
use scraper::{Html, Selector};
use tracing::{debug, instrument, warn};
use url::Url;

use crate::core::text::{
    collapse_blank_lines, replace_non_ascii, truncate_with_marker, with_source,
};
use crate::error::{ToolError, UpstreamKind};
use crate::io::config::WebSettings;

pub const DUCKDUCKGO_HTML_ENDPOINT: &str = "https://html.duckduckgo.com/html/";

/// Wrap width handed to the HTML converter.
const TEXT_WIDTH: usize = 100;

/// One search hit.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SearchResult {
    pub title: String,
    pub url: String,
    pub snippet: String,
}

/// Blocking HTTP client configured from `[web]` settings.
#[derive(Debug, Clone)]
pub struct WebFetcher {
    client: Client,
    timeout: Duration,
    max_output_chars: usize,
    search_results: usize,
    search_endpoint: String,
}

impl WebFetcher {
    pub fn new(settings: &WebSettings) -> Result<Self, ToolError> {
        let timeout = Duration::from_secs(settings.timeout_secs);
        let client = Client::builder()
            .timeout(timeout)
            .user_agent(settings.user_agent.clone())
            .build()
            .map_err(|e| ToolError::MissingDependency {
                dependency: "HTTP client".to_string(),
                detail: e.to_string(),
            })?;
        Ok(Self {
            client,
            timeout,
            max_output_chars: settings.max_output_chars,
            search_results: settings.search_results,
            search_endpoint: DUCKDUCKGO_HTML_ENDPOINT.to_string(),
        })
    }

    /// Point searches at another DuckDuckGo-compatible HTML endpoint.
    pub fn with_search_endpoint(mut self, endpoint: impl Into<String>) -> Self {
        self.search_endpoint = endpoint.into();
        self
    }

    /// Fetch a page and return it as text, prefixed with its URL and truncated.
    #[instrument(skip(self))]
    pub fn visit_webpage(&self, url: &str) -> Result<String, ToolError> {
        let target = parse_http_url(url)?;
        let body = self
            .get(&target)?
            .text()
            .map_err(|e| self.classify(url, e))?;
        let text = html_to_text(&body).map_err(|detail| {
            warn!(url, %detail, "html conversion failed");
            ToolError::upstream(url, UpstreamKind::Parse, detail)
        })?;
        let text = collapse_blank_lines(text.trim());
        Ok(with_source(url, &truncate_with_marker(&text, self.max_output_chars)))
    }

    /// Download a PDF into memory and return its text, ASCII-only and truncated.
    #[instrument(skip(self))]
    pub fn extract_pdf_text(&self, url: &str) -> Result<String, ToolError> {
        let target = parse_http_url(url)?;
        let bytes = self
            .get(&target)?
            .bytes()
            .map_err(|e| self.classify(url, e))?;
        debug!(bytes = bytes.len(), "downloaded pdf");
        // pdf-extract panics on some malformed documents instead of returning an error.
        let extracted = panic::catch_unwind(AssertUnwindSafe(|| {
            pdf_extract::extract_text_from_mem(&bytes)
        }));
        let text = match extracted {
            Ok(Ok(text)) => text,
            Ok(Err(e)) => {
                return Err(ToolError::upstream(
                    url,
                    UpstreamKind::Parse,
                    format!("not a readable PDF: {e}"),
                ));
            }
            Err(_) => {
                return Err(ToolError::upstream(
                    url,
                    UpstreamKind::Parse,
                    "PDF parser aborted on malformed input",
                ));
            }
        };
        let text = replace_non_ascii(&collapse_blank_lines(text.trim()));
        Ok(with_source(url, &truncate_with_marker(&text, self.max_output_chars)))
    }

    /// Query DuckDuckGo and format the hits as a Markdown list.
    #[instrument(skip(self))]
    pub fn web_search(&self, query: &str) -> Result<String, ToolError> {
        let query = query.trim();
        if query.is_empty() {
            return Err(ToolError::InvalidArgument("search query is empty".to_string()));
        }
        let target = Url::parse_with_params(&self.search_endpoint, &[("q", query)])
            .map_err(|e| ToolError::InvalidArgument(format!("bad search endpoint: {e}")))?;
        let html = self
            .get(&target)?
            .text()
            .map_err(|e| self.classify(&self.search_endpoint, e))?;
        let results = parse_search_results(&html, self.search_results);
        debug!(hits = results.len(), "search finished");
        Ok(format_search_results(&results))
    }

    fn get(&self, url: &Url) -> Result<Response, ToolError> {
        let response = self
            .client
            .get(url.as_str())
            .send()
            .map_err(|e| self.classify(url.as_str(), e))?;
        response
            .error_for_status()
            .map_err(|e| self.classify(url.as_str(), e))
    }

    fn classify(&self, target: &str, err: reqwest::Error) -> ToolError {
        if err.is_timeout() {
            return ToolError::upstream(
                target,
                UpstreamKind::Timeout,
                format!("no response within {} seconds", self.timeout.as_secs()),
            );
        }
        match err.status() {
            Some(status) => ToolError::upstream(target, UpstreamKind::Status(status.as_u16()), err),
            None => ToolError::upstream(target, UpstreamKind::Request, err),
        }
    }
}

fn parse_http_url(raw: &str) -> Result<Url, ToolError> {
    let url = Url::parse(raw.trim())
        .map_err(|e| ToolError::InvalidArgument(format!("invalid URL '{raw}': {e}")))?;
    match url.scheme() {
        "http" | "https" => Ok(url),
        other => Err(ToolError::InvalidArgument(format!(
            "unsupported URL scheme '{other}' (expected http or https)"
        ))),
    }
}

/// Convert an HTML document to wrapped plain text with Markdown-style headings and links.
pub fn html_to_text(html: &str) -> Result<String, String> {
    html2text::from_read(html.as_bytes(), TEXT_WIDTH).map_err(|e| e.to_string())
}

/// Extract hits from a DuckDuckGo HTML results page.
pub fn parse_search_results(html: &str, limit: usize) -> Vec<SearchResult> {
    let document = Html::parse_document(html);
    let (Ok(result_sel), Ok(link_sel), Ok(snippet_sel)) = (
        Selector::parse("div.result"),
        Selector::parse("a.result__a"),
        Selector::parse(".result__snippet"),
    ) else {
        return Vec::new();
    };

    document
        .select(&result_sel)
        .filter_map(|result| {
            let link = result.select(&link_sel).next()?;
            let href = link.value().attr("href")?;
            let title = collapse_whitespace(&link.text().collect::<String>());
            let snippet = result
                .select(&snippet_sel)
                .next()
                .map(|s| collapse_whitespace(&s.text().collect::<String>()))
                .unwrap_or_default();
            Some(SearchResult {
                title,
                url: unwrap_redirect(href),
                snippet,
            })
        })
        .take(limit)
        .collect()
}

pub fn format_search_results(results: &[SearchResult]) -> String {
    if results.is_empty() {
        return "No results found! Try a less restrictive/shorter query.".to_string();
    }
    let mut out = String::from("## Search Results\n");
    for result in results {
        let _ = write!(out, "\n[{}]({})\n{}\n", result.title, result.url, result.snippet);
    }
    out
}

/// DuckDuckGo wraps result links as `//duckduckgo.com/l/?uddg=<target>`.
fn unwrap_redirect(href: &str) -> String {
    let absolute = if href.starts_with("//") {
        format!("https:{href}")
    } else {
        href.to_string()
    };
    Url::parse(&absolute)
        .ok()
        .and_then(|url| {
            url.query_pairs()
                .find(|(key, _)| key == "uddg")
                .map(|(_, value)| value.into_owned())
        })
        .unwrap_or(absolute)
}

fn collapse_whitespace(text: &str) -> String {
    text.split_whitespace().collect::<Vec<_>>().join(" ")
}
