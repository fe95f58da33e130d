//! Per-call validation options.

use crate::config::EngineConfig;
use crate::value::Value;

/// Where the input came from; JSON input unlocks encoding-aware coercions
/// that stay available even under strict mode (e.g. building a set from an
/// array, parsing a datetime out of a string).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum InputSource {
    Native,
    Json,
}

/// Overrides applied to a single validation call.
///
/// Unset switches inherit the build-time [`EngineConfig`].
#[derive(Debug, Clone, Default)]
pub struct ValidateOptions {
    /// Exact type matching instead of lax coercion.
    pub strict: Option<bool>,
    /// Whether model validation may read attributes from opaque host objects.
    pub from_attributes: Option<bool>,
    /// Keep the valid elements of a partially invalid container instead of
    /// failing the container.
    pub allow_partial: bool,
    /// Opaque payload passed to user extension hooks.
    pub context: Option<Value>,
    /// Recursion limit override.
    pub recursion_limit: Option<usize>,
}

impl ValidateOptions {
    /// Strict-mode shorthand.
    pub fn strict() -> Self {
        Self {
            strict: Some(true),
            ..Self::default()
        }
    }

    /// Lax-mode shorthand.
    pub fn lax() -> Self {
        Self {
            strict: Some(false),
            ..Self::default()
        }
    }

    pub(crate) fn resolve(&self, config: &EngineConfig) -> CallSettings {
        CallSettings {
            strict: self.strict.unwrap_or(config.strict),
            from_attributes: self.from_attributes.unwrap_or(config.from_attributes),
            allow_partial: self.allow_partial,
            recursion_limit: self.recursion_limit.unwrap_or(config.recursion_limit),
        }
    }
}

/// Fully resolved switches for one call.
#[derive(Debug, Clone, Copy)]
pub(crate) struct CallSettings {
    pub strict: bool,
    pub from_attributes: bool,
    pub allow_partial: bool,
    pub recursion_limit: usize,
}
