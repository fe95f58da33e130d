//! Internal error plumbing for a single validation call.
//!
//! Leaf failures become `LineError`s; container frames prefix location
//! segments as the stack unwinds, so a line's path is stored leaf-first and
//! reversed once when the report materializes.

use crate::value::Value;

use super::kind::ErrorKind;
use super::location::{Location, PathSeg};

/// One violation in flight, path accumulated leaf-first.
#[derive(Debug, Clone)]
pub struct LineError {
    /// What went wrong.
    pub kind: ErrorKind,
    /// Path segments from the failing node up to the current frame.
    pub reverse_path: Vec<PathSeg>,
    /// Echo of the offending input.
    pub input: Option<Value>,
}

impl LineError {
    /// A violation at the current node, echoing the offending input.
    pub fn new(kind: ErrorKind, input: &Value) -> Self {
        Self {
            kind,
            reverse_path: Vec::new(),
            input: Some(input.clone()),
        }
    }

    /// A violation with no input echo (e.g. a missing field).
    pub fn without_input(kind: ErrorKind) -> Self {
        Self {
            kind,
            reverse_path: Vec::new(),
            input: None,
        }
    }

    /// Materializes the root-first location.
    pub fn location(&self) -> Location {
        let mut segs = self.reverse_path.clone();
        segs.reverse();
        Location::new(segs)
    }
}

/// Validation-internal outcome of one node.
///
/// `Omit` and `UseDefault` are control-flow signals raised by user hooks;
/// the nearest enclosing container or default logic consumes them and they
/// never surface to callers.
#[derive(Debug, Clone)]
pub enum ValError {
    /// One or more violations.
    Line(Vec<LineError>),
    /// Drop this value from the enclosing container.
    Omit,
    /// Substitute the node's configured default.
    UseDefault,
}

impl ValError {
    /// Single-violation constructor.
    pub fn new(kind: ErrorKind, input: &Value) -> Self {
        ValError::Line(vec![LineError::new(kind, input)])
    }

    /// Single violation with no input echo.
    pub fn without_input(kind: ErrorKind) -> Self {
        ValError::Line(vec![LineError::without_input(kind)])
    }

    /// Prefixes a location segment onto every carried line.
    pub fn with_prefix(self, seg: PathSeg) -> Self {
        match self {
            ValError::Line(mut lines) => {
                for line in &mut lines {
                    line.reverse_path.push(seg.clone());
                }
                ValError::Line(lines)
            }
            signal => signal,
        }
    }

    /// Unwraps the carried lines; control signals carry none.
    pub fn into_lines(self) -> Vec<LineError> {
        match self {
            ValError::Line(lines) => lines,
            ValError::Omit | ValError::UseDefault => Vec::new(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_prefix_builds_root_first_location() {
        let err = ValError::new(ErrorKind::IntType, &Value::Str("x".into()))
            .with_prefix(PathSeg::Index(2))
            .with_prefix(PathSeg::Field("items".into()));
        let lines = err.into_lines();
        assert_eq!(lines.len(), 1);
        assert_eq!(lines[0].location().to_string(), "items[2]");
    }

    #[test]
    fn test_signals_pass_through_prefix() {
        let err = ValError::Omit.with_prefix(PathSeg::Index(0));
        assert!(matches!(err, ValError::Omit));
    }
}
