//! Structural locations for error records.

use std::fmt;

/// One step from a schema node to one of its children.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PathSeg {
    /// Model field name.
    Field(String),
    /// Mapping key.
    Key(String),
    /// Sequence index.
    Index(usize),
}

impl fmt::Display for PathSeg {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PathSeg::Field(name) => write!(f, "{}", name),
            PathSeg::Key(key) => write!(f, "{}", key),
            PathSeg::Index(i) => write!(f, "[{}]", i),
        }
    }
}

/// Root-first path from the schema root to a failing node.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct Location(Vec<PathSeg>);

impl Location {
    /// Empty location: the schema root itself.
    pub fn root() -> Self {
        Self::default()
    }

    /// Builds a location from root-first segments.
    pub fn new(segs: Vec<PathSeg>) -> Self {
        Self(segs)
    }

    /// The segments, root-first.
    pub fn segments(&self) -> &[PathSeg] {
        &self.0
    }

    /// True for the schema root.
    pub fn is_root(&self) -> bool {
        self.0.is_empty()
    }

    /// Renders as a JSON array of keys and indices.
    pub fn to_json(&self) -> serde_json::Value {
        serde_json::Value::Array(
            self.0
                .iter()
                .map(|seg| match seg {
                    PathSeg::Field(name) => serde_json::Value::String(name.clone()),
                    PathSeg::Key(key) => serde_json::Value::String(key.clone()),
                    PathSeg::Index(i) => serde_json::Value::from(*i),
                })
                .collect(),
        )
    }
}

impl fmt::Display for Location {
    /// `user.addresses[1].city` style rendering; bare `$root` at the root.
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.0.is_empty() {
            return write!(f, "$root");
        }
        for (i, seg) in self.0.iter().enumerate() {
            if i > 0 && !matches!(seg, PathSeg::Index(_)) {
                write!(f, ".")?;
            }
            write!(f, "{}", seg)?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_display_mixed_path() {
        let loc = Location::new(vec![
            PathSeg::Field("user".into()),
            PathSeg::Field("addresses".into()),
            PathSeg::Index(1),
            PathSeg::Field("city".into()),
        ]);
        assert_eq!(loc.to_string(), "user.addresses[1].city");
    }

    #[test]
    fn test_display_root() {
        assert_eq!(Location::root().to_string(), "$root");
    }

    #[test]
    fn test_to_json() {
        let loc = Location::new(vec![PathSeg::Field("a".into()), PathSeg::Index(0)]);
        assert_eq!(loc.to_json(), serde_json::json!(["a", 0]));
    }
}
