//! Call-scoped recursion bookkeeping.
//!
//! Owned values cannot alias, so true structural cycles are only reachable
//! through opaque host objects; the guard tracks those by identity and
//! bounds everything else with a depth counter. Scoped to one top-level
//! call and discarded afterward.

use tracing::trace;

/// Bounds one traversal.
#[derive(Debug)]
pub(crate) struct RecursionGuard {
    depth: usize,
    limit: usize,
    seen: Vec<usize>,
}

impl RecursionGuard {
    pub fn new(limit: usize) -> Self {
        Self {
            depth: 0,
            limit,
            seen: Vec::new(),
        }
    }

    /// Descends one frame; `identity` marks an opaque host object.
    ///
    /// Fails on a revisited identity (a structural cycle in the data) or
    /// when the depth limit is exceeded.
    pub fn enter(&mut self, identity: Option<usize>) -> Result<(), GuardExceeded> {
        if self.depth >= self.limit {
            trace!(depth = self.depth, "recursion limit reached");
            return Err(GuardExceeded);
        }
        if let Some(id) = identity {
            if self.seen.contains(&id) {
                trace!(identity = id, "cyclic object revisited");
                return Err(GuardExceeded);
            }
            self.seen.push(id);
        }
        self.depth += 1;
        Ok(())
    }

    /// Unwinds the matching `enter`.
    pub fn exit(&mut self, identity: Option<usize>) {
        self.depth -= 1;
        if let Some(id) = identity {
            if let Some(pos) = self.seen.iter().rposition(|&s| s == id) {
                self.seen.remove(pos);
            }
        }
    }
}

/// The traversal bound was hit.
#[derive(Debug, Clone, Copy)]
pub(crate) struct GuardExceeded;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_depth_limit() {
        let mut guard = RecursionGuard::new(2);
        assert!(guard.enter(None).is_ok());
        assert!(guard.enter(None).is_ok());
        assert!(guard.enter(None).is_err());
        guard.exit(None);
        assert!(guard.enter(None).is_ok());
    }

    #[test]
    fn test_identity_cycle_detection() {
        let mut guard = RecursionGuard::new(100);
        assert!(guard.enter(Some(7)).is_ok());
        assert!(guard.enter(Some(8)).is_ok());
        assert!(guard.enter(Some(7)).is_err());
        guard.exit(Some(8));
        guard.exit(Some(7));
        assert!(guard.enter(Some(7)).is_ok());
    }
}
