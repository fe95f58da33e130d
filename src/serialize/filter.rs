//! Include/exclude path filters for serialization.
//!
//! A filter is a small tree over field names, indices, and a `*` wildcard.
//! An include filter keeps only matching entries; an exclude filter drops
//! entries whose match is a leaf and recurses into entries whose match has
//! children. Wildcards apply to every entry at their level, with exact
//! matches taking precedence.

/// One addressable step in the output tree.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FilterKey {
    /// Model field or string map key.
    Field(String),
    /// Sequence index.
    Index(usize),
    /// Every entry at this level.
    Wildcard,
}

/// A nested selection over the output tree.
#[derive(Debug, Clone, Default)]
pub struct PathFilter {
    children: Vec<(FilterKey, PathFilter)>,
}

impl PathFilter {
    /// An empty filter: matches this node as a leaf.
    pub fn leaf() -> Self {
        Self::default()
    }

    /// True when the filter selects the whole subtree here.
    pub fn is_leaf(&self) -> bool {
        self.children.is_empty()
    }

    /// Adds a field-named child selection.
    pub fn field(mut self, name: impl Into<String>, sub: PathFilter) -> Self {
        self.children.push((FilterKey::Field(name.into()), sub));
        self
    }

    /// Adds an index child selection.
    pub fn index(mut self, index: usize, sub: PathFilter) -> Self {
        self.children.push((FilterKey::Index(index), sub));
        self
    }

    /// Adds a wildcard child selection.
    pub fn wildcard(mut self, sub: PathFilter) -> Self {
        self.children.push((FilterKey::Wildcard, sub));
        self
    }

    /// Shorthand for selecting whole fields.
    pub fn fields<I, S>(names: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        names
            .into_iter()
            .fold(Self::default(), |f, name| f.field(name, Self::leaf()))
    }

    /// Looks up the sub-filter for a field, falling back to a wildcard.
    pub fn for_field(&self, name: &str) -> Option<&PathFilter> {
        self.children
            .iter()
            .find(|(k, _)| matches!(k, FilterKey::Field(f) if f == name))
            .or_else(|| {
                self.children
                    .iter()
                    .find(|(k, _)| matches!(k, FilterKey::Wildcard))
            })
            .map(|(_, sub)| sub)
    }

    /// Looks up the sub-filter for an index, falling back to a wildcard.
    pub fn for_index(&self, index: usize) -> Option<&PathFilter> {
        self.children
            .iter()
            .find(|(k, _)| matches!(k, FilterKey::Index(i) if *i == index))
            .or_else(|| {
                self.children
                    .iter()
                    .find(|(k, _)| matches!(k, FilterKey::Wildcard))
            })
            .map(|(_, sub)| sub)
    }
}

/// Resolves whether an entry survives the surrounding include/exclude pair
/// and what filters apply to its subtree.
pub(super) fn entry_filters<'f>(
    include: Option<&'f PathFilter>,
    exclude: Option<&'f PathFilter>,
    lookup: impl Fn(&'f PathFilter) -> Option<&'f PathFilter>,
) -> Option<(Option<&'f PathFilter>, Option<&'f PathFilter>)> {
    let sub_include = match include {
        // An include filter at this level keeps only matching entries; a
        // leaf match keeps the whole subtree.
        Some(inc) => match lookup(inc) {
            Some(sub) if sub.is_leaf() => None,
            Some(sub) => Some(sub),
            None => return None,
        },
        None => None,
    };
    let sub_exclude = match exclude {
        Some(exc) => match lookup(exc) {
            Some(sub) if sub.is_leaf() => return None,
            Some(sub) => Some(sub),
            None => None,
        },
        None => None,
    };
    Some((sub_include, sub_exclude))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_include_keeps_only_named_fields() {
        let inc = PathFilter::fields(["a", "b"]);
        assert!(entry_filters(Some(&inc), None, |f| f.for_field("a")).is_some());
        assert!(entry_filters(Some(&inc), None, |f| f.for_field("c")).is_none());
    }

    #[test]
    fn test_exclude_leaf_drops_entry() {
        let exc = PathFilter::fields(["secret"]);
        assert!(entry_filters(None, Some(&exc), |f| f.for_field("secret")).is_none());
        assert!(entry_filters(None, Some(&exc), |f| f.for_field("public")).is_some());
    }

    #[test]
    fn test_nested_exclude_recurses() {
        let exc = PathFilter::leaf().field("inner", PathFilter::fields(["token"]));
        let (_, sub) = entry_filters(None, Some(&exc), |f| f.for_field("inner")).unwrap();
        assert!(sub.is_some());
        assert!(entry_filters(None, sub, |f| f.for_field("token")).is_none());
    }

    #[test]
    fn test_wildcard_applies_to_every_index() {
        let exc = PathFilter::leaf().wildcard(PathFilter::fields(["password"]));
        let (_, sub) = entry_filters(None, Some(&exc), |f| f.for_index(3)).unwrap();
        assert!(entry_filters(None, sub, |f| f.for_field("password")).is_none());
    }

    #[test]
    fn test_exact_index_beats_wildcard() {
        let inc = PathFilter::leaf()
            .index(0, PathFilter::leaf())
            .wildcard(PathFilter::fields(["name"]));
        let first = inc.for_index(0).unwrap();
        assert!(first.is_leaf());
        let other = inc.for_index(5).unwrap();
        assert!(!other.is_leaf());
    }
}
