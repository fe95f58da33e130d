//! Error model for veritype
//!
//! Three disjoint public error surfaces:
//!
//! - `SchemaBuildError` — the schema graph itself is malformed; raised once,
//!   at compile time, never per call.
//! - `ValidationReport` — one or more input violations, each an
//!   `ErrorRecord` with a stable kind code and a structural location path.
//!   Success and a non-empty report are mutually exclusive.
//! - `SerializationError` — a value could not be converted to output;
//!   demoted to collected warnings unless strict warning mode is requested.
//!
//! Internal control flow (`ValError` with its `Omit` / `UseDefault`
//! signals) never crosses the public boundary.

mod build;
mod kind;
mod line;
mod location;
mod report;
mod ser;

pub use build::SchemaBuildError;
pub use kind::ErrorKind;
pub use line::{LineError, ValError};
pub use location::{Location, PathSeg};
pub use report::{ErrorRecord, RenderOptions, ValidationReport};
pub use ser::{SerializationError, SerializationWarning, WarningMode};
