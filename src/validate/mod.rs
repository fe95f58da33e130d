//! Validator tree for veritype
//!
//! A recursive interpreter over the compiled schema. Dispatch is an
//! exhaustive match on the node tag; container nodes validate every child
//! and collect path-qualified errors instead of short-circuiting, so one
//! call reports every violation it can find.
//!
//! Validation semantics:
//! - Strict mode attempts an exact type match only; lax mode falls back to
//!   a fixed per-type coercion table.
//! - Coercion never silently drops information; lossy conversions have
//!   dedicated error kinds.
//! - Per-call options override build-time configuration, except where a
//!   node embeds an unconditional strict/lax override.
//! - Traversal is bounded by a per-call recursion guard.

mod guard;
mod model;
mod options;
mod scalars;
mod union;
mod validator;

pub use options::ValidateOptions;
pub use validator::SchemaValidator;

pub(crate) use guard::RecursionGuard;
