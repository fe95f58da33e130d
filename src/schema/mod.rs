//! Schema representation and compiler for veritype
//!
//! A schema is a declarative, composable description of an expected data
//! shape. Descriptions are built once with the constructors on [`Schema`],
//! compiled into an immutable arena of nodes addressed by stable handles,
//! and shared read-only across every validation and serialization call.
//!
//! Named references (`Schema::reference` resolved against
//! `Schema::definitions`) express self-referential and mutually-referential
//! shapes; the compiler resolves them to direct handles, so a recursive
//! schema occupies space proportional to its distinct nodes.

mod cache;
mod compiler;
mod hooks;
mod node;

pub use cache::SchemaCache;
pub use compiler::{CompiledSchema, NodeId};
pub use hooks::{Hook, HookContext, HookError, HookResult, InnerFailure, InnerHandle};
pub use node::{
    DefaultSource, Discriminator, ExtraPolicy, FieldSchema, LenConstraints, ModelSchema,
    NumConstraints, Schema, StrConstraints, UnionMode,
};

pub(crate) use compiler::{CField, CModel, CNode, CStrConstraints};
pub(crate) use hooks::hook_error_to_val_error;
