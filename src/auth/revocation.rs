//! Keeps track of tokens that were revoked by logging out.

use std::{
    collections::HashSet,
    sync::{Arc, PoisonError, RwLock},
};

/// A shared, in-memory set of revoked tokens.
///
/// Cloning the registry is cheap and every clone refers to the same set.
/// Entries are never removed, so the set grows with every log out for the
/// lifetime of the process.
#[derive(Debug, Clone, Default)]
pub struct RevocationRegistry {
    revoked: Arc<RwLock<HashSet<String>>>,
}

impl RevocationRegistry {
    /// Create an empty registry.
    pub fn new() -> Self {
        Self::default()
    }

    /// Revoke `token`. Revoking a token more than once has no further effect.
    pub fn revoke(&self, token: &str) {
        // A panic while holding the lock cannot leave a `HashSet` half-inserted.
        let mut revoked = self.revoked.write().unwrap_or_else(PoisonError::into_inner);
        revoked.insert(token.to_owned());
    }

    /// Whether `token` has been revoked.
    pub fn is_revoked(&self, token: &str) -> bool {
        self.revoked
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .contains(token)
    }
}
