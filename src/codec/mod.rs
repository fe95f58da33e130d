//! Auxiliary codecs.
//!
//! Resource-locator values are first-class leaves in the value model; this
//! module owns their parsing, canonicalization, and reconstruction.

mod url;

pub use url::{HostPart, LocatorUrl, MultiHostUrl, UrlParseError};
