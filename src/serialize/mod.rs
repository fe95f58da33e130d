//! Serializer tree for veritype
//!
//! The serializing counterpart of the validator: a second interpreter over
//! the same compiled arena. Output is shaped by per-call options (aliasing,
//! unset/default/none exclusion, nested include/exclude filters, raw
//! round-trip) and mismatches degrade to warnings rather than failures
//! unless strict warning mode is requested.

mod any;
mod filter;
mod options;
mod serializer;

pub use any::{serialize_any, serialize_any_json};
pub use filter::{FilterKey, PathFilter};
pub use options::{FallbackFn, SerializeOptions};
pub use serializer::SchemaSerializer;
