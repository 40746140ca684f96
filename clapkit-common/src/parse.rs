//! Parse pipeline
//!
//! Raw text goes through: empty check → strict parse → auto-fix retry →
//! syntax diagnostic extraction. A parse failure is always recoverable — the
//! caller gets a positioned diagnostic and keeps the raw text for manual
//! repair; nothing is discarded.

use once_cell::sync::Lazy;
use regex::Regex;
use serde_json::Value;
use tracing::debug;

use crate::autofix::auto_fix_json;
use crate::model::Document;
use crate::validate::{Diagnostic, Severity};

static POSITION_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?i)position\s+(\d+)").expect("valid regex"));

/// Outcome of a parse attempt
#[derive(Debug, Clone)]
pub struct ParseOutcome {
    /// The classified document, present when parsing (possibly after
    /// auto-fixing) succeeded
    pub document: Option<Document>,
    /// Syntax diagnostics: one error on failure, one info per applied fix on
    /// an auto-fixed success, empty on a clean parse
    pub diagnostics: Vec<Diagnostic>,
    /// True when the document only parsed after auto-fixing
    pub auto_fixed: bool,
    /// The repaired text, when auto-fixing produced the parseable version
    pub fixed_json: Option<String>,
    /// Number of auto-fixes applied
    pub fix_count: usize,
}

impl ParseOutcome {
    pub fn is_valid(&self) -> bool {
        self.document.is_some()
    }

    fn failure(diagnostic: Diagnostic) -> Self {
        ParseOutcome {
            document: None,
            diagnostics: vec![diagnostic],
            auto_fixed: false,
            fixed_json: None,
            fix_count: 0,
        }
    }
}

/// Parse raw text into a classified document, auto-fixing when the first
/// attempt fails.
pub fn parse_document(input: &str) -> ParseOutcome {
    if input.trim().is_empty() {
        return ParseOutcome::failure(Diagnostic::syntax(
            Severity::Error,
            "",
            "JSON input is empty",
        ));
    }

    let first_error = match serde_json::from_str::<Value>(input) {
        Ok(value) => {
            return ParseOutcome {
                document: Some(Document::classify(value)),
                diagnostics: Vec::new(),
                auto_fixed: false,
                fixed_json: None,
                fix_count: 0,
            }
        }
        Err(err) => err,
    };

    // Second attempt: repair, then re-parse
    let repair = auto_fix_json(input);
    if repair.fixed {
        if let Ok(value) = serde_json::from_str::<Value>(&repair.json) {
            debug!(fix_count = repair.fixes.len(), "parse succeeded after auto-fix");
            return ParseOutcome {
                document: Some(Document::classify(value)),
                diagnostics: repair
                    .fixes
                    .iter()
                    .map(|fix| {
                        Diagnostic::syntax(Severity::Info, "", format!("auto-fixed: {fix}"))
                    })
                    .collect(),
                auto_fixed: true,
                fix_count: repair.fixes.len(),
                fixed_json: Some(repair.json),
            };
        }
    }

    // Report the FIRST error against the original text, not the repaired one
    let message = render_parse_error(&first_error, input);
    ParseOutcome::failure(syntax_diagnostic(&message, input))
}

/// Build a positioned syntax diagnostic from a raw parse-failure message.
///
/// Extracts a decimal character offset from a `position <n>` fragment
/// (case-insensitive) and turns it into a 1-based line number plus a context
/// window of the two lines before through two lines after, each prefixed with
/// its line number. Messages without a position yield a bare diagnostic with
/// an empty path.
pub fn syntax_diagnostic(message: &str, input: &str) -> Diagnostic {
    let position = POSITION_RE
        .captures(message)
        .and_then(|caps| caps[1].parse::<usize>().ok());

    let Some(position) = position else {
        return Diagnostic::syntax(Severity::Error, "", message);
    };

    let prefix: String = input.chars().take(position).collect();
    let line = prefix.matches('\n').count() + 1;

    let all_lines: Vec<&str> = input.split('\n').collect();
    let start = line.saturating_sub(3);
    let end = (line + 2).min(all_lines.len());
    let context = all_lines[start..end]
        .iter()
        .enumerate()
        .map(|(i, text)| format!("{}: {}", start + i + 1, text))
        .collect::<Vec<_>>()
        .join("\n");

    let mut diagnostic = Diagnostic::syntax(Severity::Error, format!("Line {line}"), message);
    diagnostic.line = Some(line);
    diagnostic.suggestion = Some(format!("near the error location:\n{context}"));
    diagnostic
}

/// Render a serde_json error with an absolute `position <n>` suffix so the
/// offset-based extraction above applies to native errors the same way it
/// applies to messages from foreign tooling.
fn render_parse_error(error: &serde_json::Error, input: &str) -> String {
    match char_offset(input, error.line(), error.column()) {
        Some(position) => format!("{error} (position {position})"),
        None => error.to_string(),
    }
}

/// Character offset of a 1-based line/column pair. Returns None when the
/// error carries no position (line 0) or points past the text.
fn char_offset(input: &str, line: usize, column: usize) -> Option<usize> {
    if line == 0 {
        return None;
    }
    let mut offset = 0usize;
    for (idx, text) in input.split('\n').enumerate() {
        if idx + 1 == line {
            return Some(offset + column.min(text.chars().count()));
        }
        offset += text.chars().count() + 1;
    }
    None
}
