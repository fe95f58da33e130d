//! The host-object seam.
//!
//! The engine imposes no object model on its callers. A host value enters
//! validation as an `OpaqueRef`; model validation with `from_attributes`
//! reads its attributes through the trait, and the recursion guard tracks
//! its identity, since opaque graphs are the only values that can be cyclic.

use std::fmt;
use std::sync::Arc;

use super::value::Value;

/// A host object exposed to the engine by attribute lookup.
pub trait OpaqueObject: fmt::Debug + Send + Sync {
    /// Host-side type name, used in error messages.
    fn type_name(&self) -> &str;

    /// Looks up an attribute by name.
    fn get_attribute(&self, name: &str) -> Option<Value>;

    /// All attribute names, in a stable order.
    fn attribute_names(&self) -> Vec<String>;
}

/// Shared handle to a host object.
///
/// Equality is identity: two handles are equal only when they point at the
/// same host object.
#[derive(Clone)]
pub struct OpaqueRef(Arc<dyn OpaqueObject>);

impl OpaqueRef {
    /// Wraps a host object.
    pub fn new(obj: Arc<dyn OpaqueObject>) -> Self {
        Self(obj)
    }

    /// Host-side type name.
    pub fn type_name(&self) -> &str {
        self.0.type_name()
    }

    /// Looks up an attribute by name.
    pub fn get_attribute(&self, name: &str) -> Option<Value> {
        self.0.get_attribute(name)
    }

    /// All attribute names.
    pub fn attribute_names(&self) -> Vec<String> {
        self.0.attribute_names()
    }

    /// Stable identity for cycle detection.
    pub fn identity(&self) -> usize {
        Arc::as_ptr(&self.0) as *const () as usize
    }
}

impl fmt::Debug for OpaqueRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "OpaqueRef<{}>", self.0.type_name())
    }
}

impl PartialEq for OpaqueRef {
    fn eq(&self, other: &Self) -> bool {
        self.identity() == other.identity()
    }
}
