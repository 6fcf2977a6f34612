//! Text shaping shared by the fetchers and the compiler invoker.

use std::sync::LazyLock;

use regex::Regex;

/// Placeholder substituted for non-ASCII characters in extracted PDF text.
pub const NON_ASCII_PLACEHOLDER: char = '?';

static BLANK_RUN_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\n{3,}").expect("blank-run regex is valid"));

/// Collapse runs of three or more newlines into a single blank line.
pub fn collapse_blank_lines(text: &str) -> String {
    BLANK_RUN_RE.replace_all(text, "\n\n").into_owned()
}

/// Marker appended after a truncated body.
pub fn truncation_marker(max_chars: usize) -> String {
    format!("\n..._This content has been truncated to stay below {max_chars} characters_...\n")
}

/// Keep at most `max_chars` characters, appending [`truncation_marker`] when anything was cut.
pub fn truncate_with_marker(text: &str, max_chars: usize) -> String {
    match text.char_indices().nth(max_chars) {
        None => text.to_string(),
        Some((byte_idx, _)) => {
            let mut out = text[..byte_idx].to_string();
            out.push_str(&truncation_marker(max_chars));
            out
        }
    }
}

pub fn replace_non_ascii(text: &str) -> String {
    text.chars()
        .map(|c| if c.is_ascii() { c } else { NON_ASCII_PLACEHOLDER })
        .collect()
}

/// Prefix a converted body with the URL it came from.
pub fn with_source(url: &str, body: &str) -> String {
    format!("Source: {url}\n\n{body}")
}

/// Collect compiler log lines that carry an error marker.
///
/// LaTeX reports errors on lines starting with `!`; latexmk and packages use `Error`.
pub fn error_lines(output: &str, limit: usize) -> Vec<String> {
    output
        .lines()
        .map(str::trim_end)
        .filter(|line| line.starts_with('!') || line.contains("Error"))
        .take(limit)
        .map(str::to_string)
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn collapse_blank_lines_keeps_single_blank_line() {
        let input = "a\n\n\n\nb\n\nc\n\n\nd";
        assert_eq!(collapse_blank_lines(input), "a\n\nb\n\nc\n\nd");
    }

    #[test]
    fn truncate_appends_marker_at_exact_ceiling() {
        let body = "x".repeat(25);
        let out = truncate_with_marker(&body, 10);
        assert_eq!(out, format!("{}{}", "x".repeat(10), truncation_marker(10)));
    }

    #[test]
    fn truncate_leaves_short_and_exact_bodies_alone() {
        assert_eq!(truncate_with_marker("short", 10), "short");
        assert_eq!(truncate_with_marker("0123456789", 10), "0123456789");
    }

    #[test]
    fn truncate_counts_characters_not_bytes() {
        let out = truncate_with_marker("ééééé", 3);
        assert!(out.starts_with("ééé\n"));
    }

    #[test]
    fn replace_non_ascii_uses_placeholder() {
        assert_eq!(replace_non_ascii("naïve – ok"), "na?ve ? ok");
    }

    #[test]
    fn error_lines_picks_marked_lines() {
        let log = "This is pdfTeX\n! Undefined control sequence.\nl.12 \\foo\nLatexmk: Error: bad\nfine\n";
        assert_eq!(
            error_lines(log, 10),
            vec!["! Undefined control sequence.", "Latexmk: Error: bad"]
        );
        assert_eq!(error_lines(log, 1).len(), 1);
    }
}
