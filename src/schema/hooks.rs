//! User extension hooks.
//!
//! A hook runs before, after, or wrapping a node's inner validator. The
//! shapes are a closed set; a wrapping hook receives an explicit handle to
//! the inner validator rather than an overridable method.

use std::fmt;
use std::sync::Arc;

use crate::errors::{LineError, ValError, ValidationReport};
use crate::value::Value;

/// Call-scoped information passed to every hook invocation.
pub struct HookContext<'a> {
    /// Opaque user payload supplied on the validation call.
    pub context: Option<&'a Value>,
    /// Effective strictness of the current call.
    pub strict: bool,
}

/// Failure or control signal raised by a hook.
pub enum HookError {
    /// Application-level violation, merged into the surrounding report.
    Custom {
        /// Stable tag for the violation kind.
        tag: String,
        /// Human-readable message.
        message: String,
    },
    /// Re-signal a failure previously returned by the inner validator.
    Inner(InnerFailure),
    /// Drop this value; consumed by the nearest enclosing container.
    Omit,
    /// Substitute the node's configured default.
    UseDefault,
}

impl HookError {
    /// Convenience constructor for application-level violations.
    pub fn custom(tag: impl Into<String>, message: impl Into<String>) -> Self {
        HookError::Custom {
            tag: tag.into(),
            message: message.into(),
        }
    }
}

/// What a hook returns.
pub type HookResult = Result<Value, HookError>;

/// An inner-validator failure held by a wrapping hook.
///
/// Opaque: the hook may inspect it as a report, re-signal it, or discard it
/// and substitute a value; the structured lines inside keep their paths
/// either way.
pub struct InnerFailure(pub(crate) Vec<LineError>);

impl InnerFailure {
    /// Read-only view of the failure as a report titled for inspection.
    pub fn report(&self) -> ValidationReport {
        ValidationReport::from_lines("inner validator", self.0.clone())
    }
}

impl fmt::Debug for InnerFailure {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "InnerFailure({} line(s))", self.0.len())
    }
}

/// Callable handle to a wrapping hook's inner validator.
pub struct InnerHandle<'h> {
    inner: &'h mut dyn FnMut(Value) -> Result<Value, InnerFailure>,
}

impl<'h> InnerHandle<'h> {
    pub(crate) fn new(inner: &'h mut dyn FnMut(Value) -> Result<Value, InnerFailure>) -> Self {
        Self { inner }
    }

    /// Invokes the inner validator on the given input.
    pub fn validate(&mut self, input: Value) -> Result<Value, InnerFailure> {
        (self.inner)(input)
    }
}

/// A plain (before/after) hook function.
pub type HookFn = Arc<dyn Fn(Value, &HookContext<'_>) -> HookResult + Send + Sync>;

/// A wrapping hook function.
pub type WrapHookFn =
    Arc<dyn Fn(Value, InnerHandle<'_>, &HookContext<'_>) -> HookResult + Send + Sync>;

/// The closed set of hook shapes.
#[derive(Clone)]
pub enum Hook {
    /// Transforms raw input before the inner validator runs.
    Before(HookFn),
    /// Transforms the validated output.
    After(HookFn),
    /// Receives the input and a handle to the inner validator.
    Wrap(WrapHookFn),
}

impl Hook {
    pub(crate) fn identity(&self) -> u64 {
        match self {
            Hook::Before(f) | Hook::After(f) => Arc::as_ptr(f) as *const () as u64,
            Hook::Wrap(f) => Arc::as_ptr(f) as *const () as u64,
        }
    }
}

impl fmt::Debug for Hook {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Hook::Before(_) => write!(f, "Hook::Before(..)"),
            Hook::After(_) => write!(f, "Hook::After(..)"),
            Hook::Wrap(_) => write!(f, "Hook::Wrap(..)"),
        }
    }
}

pub(crate) fn hook_error_to_val_error(err: HookError, input: &Value) -> ValError {
    match err {
        HookError::Custom { tag, message } => {
            ValError::new(crate::errors::ErrorKind::Custom { tag, message }, input)
        }
        HookError::Inner(failure) => ValError::Line(failure.0),
        HookError::Omit => ValError::Omit,
        HookError::UseDefault => ValError::UseDefault,
    }
}
