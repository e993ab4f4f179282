//! Diagnostic extraction from bundler errors.
//!
//! Rolldown reports failures as batched diagnostics whose concrete types are
//! not part of its stable surface, so we work from the `Debug` rendering and
//! pull out the pieces the CLI reports: what kind of failure, which file, and
//! any help text.

use std::fmt;

use serde::{Deserialize, Serialize};

/// A single compiler diagnostic in a cloneable, serializable form.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Diagnostic {
    pub kind: DiagnosticKind,
    pub severity: DiagnosticSeverity,
    pub message: String,
    pub file: Option<String>,
    pub help: Option<String>,
}

impl Diagnostic {
    /// Error-severity diagnostic with no location.
    pub fn error(kind: DiagnosticKind, message: impl Into<String>) -> Self {
        Self {
            kind,
            severity: DiagnosticSeverity::Error,
            message: message.into(),
            file: None,
            help: None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DiagnosticKind {
    MissingExport,
    ParseError,
    CircularDependency,
    UnresolvedEntry,
    UnresolvedImport,
    Plugin,
    Transform,
    Other,
}

impl fmt::Display for DiagnosticKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            DiagnosticKind::MissingExport => "MissingExport",
            DiagnosticKind::ParseError => "ParseError",
            DiagnosticKind::CircularDependency => "CircularDependency",
            DiagnosticKind::UnresolvedEntry => "UnresolvedEntry",
            DiagnosticKind::UnresolvedImport => "UnresolvedImport",
            DiagnosticKind::Plugin => "Plugin",
            DiagnosticKind::Transform => "Transform",
            DiagnosticKind::Other => "Error",
        };
        f.write_str(name)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DiagnosticSeverity {
    Error,
    Warning,
}

/// Extract diagnostics from a Rolldown error value.
pub fn extract_from_rolldown_error(error: &dyn fmt::Debug) -> Vec<Diagnostic> {
    let error_str = format!("{error:?}");

    let parts: Vec<&str> = error_str
        .split("BatchedBuildDiagnostic")
        .filter(|s| !s.trim().is_empty())
        .collect();

    if parts.len() > 1 {
        parts.iter().map(|part| extract_single(part)).collect()
    } else {
        vec![extract_single(&error_str)]
    }
}

fn extract_single(error_str: &str) -> Diagnostic {
    let kind = classify(error_str);

    let severity = if error_str.contains("warning") || error_str.contains("Warning") {
        DiagnosticSeverity::Warning
    } else {
        DiagnosticSeverity::Error
    };

    Diagnostic {
        kind,
        severity,
        message: error_str.trim().to_string(),
        file: extract_file_path(error_str),
        help: extract_help_text(error_str),
    }
}

fn classify(error_str: &str) -> DiagnosticKind {
    if error_str.contains("MissingExport") {
        DiagnosticKind::MissingExport
    } else if error_str.contains("Parse error")
        || error_str.contains("Syntax")
        || error_str.contains("Expected")
    {
        DiagnosticKind::ParseError
    } else if error_str.contains("Circular") || error_str.contains("cycle") {
        DiagnosticKind::CircularDependency
    } else if error_str.contains("UnresolvedEntry") {
        DiagnosticKind::UnresolvedEntry
    } else if error_str.contains("UnresolvedImport") || error_str.contains("Cannot resolve") {
        DiagnosticKind::UnresolvedImport
    } else if error_str.contains("Plugin") {
        DiagnosticKind::Plugin
    } else if error_str.contains("Transform") || error_str.contains("transform") {
        DiagnosticKind::Transform
    } else {
        DiagnosticKind::Other
    }
}

/// First script-looking path in the message.
fn extract_file_path(text: &str) -> Option<String> {
    for ext in &[".jsx", ".tsx", ".mjs", ".cjs", ".js", ".ts"] {
        let Some(pos) = text.find(ext) else {
            continue;
        };
        let before = &text[..pos + ext.len()];
        for indicator in &["\"", "'", "file: ", "path: ", "in ", "at "] {
            if let Some(start) = before.rfind(indicator) {
                let path_str = before[start + indicator.len()..]
                    .trim()
                    .trim_matches(['"', '\'', '\\']);
                if !path_str.is_empty() && !path_str.contains(char::is_whitespace) {
                    return Some(path_str.to_string());
                }
            }
        }
    }
    None
}

fn extract_help_text(text: &str) -> Option<String> {
    for indicator in &["help: ", "Help: ", "hint: ", "Hint: "] {
        if let Some(pos) = text.find(indicator) {
            let help = text[pos + indicator.len()..]
                .lines()
                .next()
                .unwrap_or("")
                .trim();
            if !help.is_empty() {
                return Some(help.to_string());
            }
        }
    }
    None
}
