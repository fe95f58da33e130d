//! The terminal validation report.

use std::fmt;

use crate::value::Value;

use super::kind::ErrorKind;
use super::line::LineError;
use super::location::Location;

/// Base for per-kind documentation links in rendered reports.
const ERROR_URL_BASE: &str = "https://docs.rs/veritype/latest/veritype/errors";

/// One materialized, immutable violation.
#[derive(Debug, Clone)]
pub struct ErrorRecord {
    kind: ErrorKind,
    location: Location,
    message: String,
    input: Option<Value>,
}

impl ErrorRecord {
    pub(crate) fn from_line(line: LineError) -> Self {
        let location = line.location();
        let message = line.kind.to_string();
        Self {
            kind: line.kind,
            location,
            message,
            input: line.input,
        }
    }

    /// The violation kind.
    pub fn kind(&self) -> &ErrorKind {
        &self.kind
    }

    /// Root-first structural location.
    pub fn location(&self) -> &Location {
        &self.location
    }

    /// Rendered message.
    pub fn message(&self) -> &str {
        &self.message
    }

    /// Echo of the offending input, when available.
    pub fn input(&self) -> Option<&Value> {
        self.input.as_ref()
    }

    /// Documentation link for this kind.
    pub fn url(&self) -> String {
        format!("{}#{}", ERROR_URL_BASE, self.kind.code())
    }

    fn to_json(&self, options: &RenderOptions) -> serde_json::Value {
        let mut entry = serde_json::Map::new();
        entry.insert("type".into(), self.kind.tag().into());
        entry.insert("loc".into(), self.location.to_json());
        entry.insert("msg".into(), self.message.clone().into());
        if options.include_input {
            if let Some(input) = &self.input {
                entry.insert("input".into(), input.to_json());
            }
        }
        if options.include_context {
            if let Some(ctx) = self.kind.context() {
                entry.insert("ctx".into(), ctx);
            }
        }
        if options.include_url {
            entry.insert("url".into(), self.url().into());
        }
        serde_json::Value::Object(entry)
    }
}

/// Rendering switches for structured report output.
#[derive(Debug, Clone, Copy)]
pub struct RenderOptions {
    /// Include the input echo in each entry.
    pub include_input: bool,
    /// Include the kind's substitution context in each entry.
    pub include_context: bool,
    /// Include a documentation URL in each entry.
    pub include_url: bool,
}

impl Default for RenderOptions {
    fn default() -> Self {
        Self {
            include_input: true,
            include_context: true,
            include_url: false,
        }
    }
}

/// The sole failure output of a validation call.
///
/// Non-empty whenever validation fails; records are ordered depth-first,
/// pre-order relative to schema traversal, so repeated calls with identical
/// input produce byte-identical reports.
#[derive(Debug, Clone)]
pub struct ValidationReport {
    title: String,
    records: Vec<ErrorRecord>,
}

impl ValidationReport {
    pub(crate) fn from_lines(title: impl Into<String>, lines: Vec<LineError>) -> Self {
        Self {
            title: title.into(),
            records: lines.into_iter().map(ErrorRecord::from_line).collect(),
        }
    }

    /// Human-readable title, derived from the schema root's declared name.
    pub fn title(&self) -> &str {
        &self.title
    }

    /// Number of violations.
    pub fn error_count(&self) -> usize {
        self.records.len()
    }

    /// The ordered violations.
    pub fn records(&self) -> &[ErrorRecord] {
        &self.records
    }

    /// Structured rendering with per-entry toggles.
    pub fn errors(&self, options: RenderOptions) -> Vec<serde_json::Value> {
        self.records.iter().map(|r| r.to_json(&options)).collect()
    }

    /// Encoded rendering of the full report.
    pub fn to_json(&self) -> serde_json::Value {
        serde_json::Value::Array(self.errors(RenderOptions::default()))
    }
}

impl fmt::Display for ValidationReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let n = self.error_count();
        writeln!(
            f,
            "{} validation error{} for {}",
            n,
            if n == 1 { "" } else { "s" },
            self.title
        )?;
        for record in &self.records {
            writeln!(f, "{}", record.location())?;
            write!(f, "  {} [type={}", record.message(), record.kind().tag())?;
            if let Some(input) = record.input() {
                write!(f, ", input_value={}", input.echo())?;
            }
            writeln!(f, "]")?;
        }
        Ok(())
    }
}

impl std::error::Error for ValidationReport {}
