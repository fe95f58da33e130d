//! Value model for veritype
//!
//! Everything the engine validates or serializes flows through a single
//! closed value type:
//!
//! - Scalars (null, bool, int, float, string, bytes, date/time, uuid, urls)
//! - Ordered sequences (list, set, tuple)
//! - Insertion-ordered mappings with arbitrary scalar keys
//! - Model values carrying an explicitly-set field set
//! - Raw values that remember the encoded text they were decoded from
//! - Opaque host objects reachable only through the `OpaqueObject` trait
//!
//! The engine never retains caller values beyond a single call.

pub(crate) mod json;
mod opaque;
mod value;

pub use json::duration_to_iso8601;
pub use opaque::{OpaqueObject, OpaqueRef};
pub use value::{ModelValue, RawValue, Value, ValueMap};
