//! Compile-time schema errors.

use thiserror::Error;

/// The schema description itself is malformed.
///
/// Raised once, at compile time; compilation never partially succeeds.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SchemaBuildError {
    /// A named reference has no matching definition.
    #[error("unknown schema reference '{0}'")]
    UnknownRef(String),

    /// Two definitions share a name.
    #[error("duplicate schema definition '{0}'")]
    DuplicateDefinition(String),

    /// A definition resolves only through references back to itself.
    #[error("definition '{0}' is a reference cycle with no schema body")]
    CircularAlias(String),

    /// A union was declared with no members.
    #[error("union must have at least one member")]
    EmptyUnion,

    /// Two tagged-union branches share a tag.
    #[error("duplicate discriminator tag '{0}'")]
    DuplicateTag(String),

    /// A model declares the same field name or alias twice.
    #[error("duplicate model field or alias '{0}' on model '{1}'")]
    DuplicateField(String, String),

    /// Numeric or length bounds contradict each other.
    #[error("conflicting constraints: {0}")]
    ConflictingConstraints(String),

    /// A string pattern failed to compile.
    #[error("invalid pattern '{pattern}': {error}")]
    InvalidPattern {
        /// The offending pattern source.
        pattern: String,
        /// The regex engine's complaint.
        error: String,
    },

    /// A literal node was declared with no permitted values.
    #[error("literal must declare at least one permitted value")]
    EmptyLiteral,
}
