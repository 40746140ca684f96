//! Structural validation
//!
//! Two stage-specific validators walk a raw document value against the
//! pipeline schemas and return an ordered diagnostics list. Validators never
//! fail and never stop early: every check is defensive against missing or
//! ill-typed structure and reports instead of propagating, so even a badly
//! broken document yields a complete, deterministic report.

pub mod stage1;
pub mod stage2;

use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Diagnostic severity, most severe first
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Severity {
    Error,
    Warning,
    Info,
}

/// Which rule family produced a diagnostic
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Category {
    /// Top-level identity fields the pipeline cannot proceed without
    Essential,
    /// Narrative content (logline, synopsis, scenario, shots)
    Story,
    /// Visual-block and camera/frame structure
    Visual,
    /// Type and format violations
    Schema,
    /// Anything else (unexpected fields, structural oddities)
    Other,
}

/// Diagnostic source: a failed parse or a schema rule
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DiagnosticKind {
    Syntax,
    Schema,
}

/// One validation finding
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Diagnostic {
    #[serde(rename = "type")]
    pub kind: DiagnosticKind,
    pub severity: Severity,
    pub category: Category,
    /// Dotted/bracketed field path, e.g. `scenes[2].shots[0].shot_id`
    pub path: String,
    pub message: String,
    /// 1-based line number, syntax diagnostics only
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub line: Option<usize>,
    /// Context hint (for syntax failures, the surrounding source lines)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub suggestion: Option<String>,
}

impl Diagnostic {
    /// Schema-rule diagnostic with error severity.
    pub fn schema(category: Category, path: impl Into<String>, message: impl Into<String>) -> Self {
        Diagnostic {
            kind: DiagnosticKind::Schema,
            severity: Severity::Error,
            category,
            path: path.into(),
            message: message.into(),
            line: None,
            suggestion: None,
        }
    }

    /// Syntax diagnostic (parse failure).
    pub fn syntax(severity: Severity, path: impl Into<String>, message: impl Into<String>) -> Self {
        Diagnostic {
            kind: DiagnosticKind::Syntax,
            severity,
            category: Category::Schema,
            path: path.into(),
            message: message.into(),
            line: None,
            suggestion: None,
        }
    }

    pub fn with_severity(mut self, severity: Severity) -> Self {
        self.severity = severity;
        self
    }
}

/// JSON-truthiness used by the defensive field checks: absent, `null`, `""`,
/// `false`, and `0` all count as missing, any object or array counts as
/// present even when empty.
pub(crate) fn truthy(value: Option<&Value>) -> bool {
    match value {
        None | Some(Value::Null) => false,
        Some(Value::Bool(b)) => *b,
        Some(Value::Number(n)) => n.as_f64().map_or(false, |f| f != 0.0),
        Some(Value::String(s)) => !s.is_empty(),
        Some(Value::Array(_)) | Some(Value::Object(_)) => true,
    }
}
