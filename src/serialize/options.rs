//! Per-call serialization options.

use std::fmt;
use std::sync::Arc;

use crate::errors::WarningMode;
use crate::value::Value;

use super::filter::PathFilter;

/// Last-resort conversion for values no serializer recognizes.
pub type FallbackFn = Arc<dyn Fn(&Value) -> Option<Value> + Send + Sync>;

/// Switches applied to a single serialization call.
#[derive(Clone, Default)]
pub struct SerializeOptions {
    /// Keep only matching output entries.
    pub include: Option<PathFilter>,
    /// Drop matching output entries.
    pub exclude: Option<PathFilter>,
    /// Emit model fields under their serialization alias.
    pub by_alias: bool,
    /// Drop model fields that were filled from defaults.
    pub exclude_unset: bool,
    /// Drop model fields whose value equals the field default.
    pub exclude_defaults: bool,
    /// Drop null-valued model fields.
    pub exclude_none: bool,
    /// Re-emit raw leaves byte-for-byte instead of re-encoding.
    pub round_trip: bool,
    /// Conversion tried before a mismatch warning is recorded.
    pub fallback: Option<FallbackFn>,
    /// Whether mismatch warnings abort the call.
    pub warnings: WarningMode,
    /// Spaces per level for encoded output; compact when unset.
    pub indent: Option<usize>,
}

impl fmt::Debug for SerializeOptions {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SerializeOptions")
            .field("include", &self.include)
            .field("exclude", &self.exclude)
            .field("by_alias", &self.by_alias)
            .field("exclude_unset", &self.exclude_unset)
            .field("exclude_defaults", &self.exclude_defaults)
            .field("exclude_none", &self.exclude_none)
            .field("round_trip", &self.round_trip)
            .field("fallback", &self.fallback.as_ref().map(|_| ".."))
            .field("warnings", &self.warnings)
            .field("indent", &self.indent)
            .finish()
    }
}
