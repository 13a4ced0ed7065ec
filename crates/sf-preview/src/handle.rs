//! Preview handle types

use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Unique preview handle identifier
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct HandleId(pub Uuid);

impl HandleId {
    /// Generate new handle ID
    #[inline]
    #[must_use]
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }
}

impl Default for HandleId {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Display for HandleId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Opaque URI the UI uses to render a staged file locally
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct PreviewUri(String);

impl PreviewUri {
    /// URI scheme of locally allocated previews
    pub const SCHEME: &'static str = "blob:";

    /// Build the URI for a handle id
    #[inline]
    #[must_use]
    pub fn for_handle(id: HandleId) -> Self {
        Self(format!("{}{}", Self::SCHEME, id.0))
    }

    /// String form
    #[inline]
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for PreviewUri {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

/// Revocable reference to a staged file's contents
///
/// The backing bytes are held by the allocator, not by the handle, so
/// releasing the handle frees them even if the UI keeps the URI around.
/// A handle also records which allocator issued it and in what order, so
/// the allocator can tell a repeated release from a foreign handle without
/// remembering released ids.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct PreviewHandle {
    id: HandleId,
    uri: PreviewUri,
    origin: Uuid,
    seq: u64,
}

impl PreviewHandle {
    /// Create a handle with a fresh id that no allocator has issued
    #[must_use]
    pub fn fresh() -> Self {
        Self::issued(Uuid::nil(), 0)
    }

    /// Create a handle issued by allocator `origin` as its `seq`-th allocation
    #[must_use]
    pub fn issued(origin: Uuid, seq: u64) -> Self {
        let id = HandleId::new();
        Self {
            id,
            uri: PreviewUri::for_handle(id),
            origin,
            seq,
        }
    }

    /// Allocator that issued this handle (nil if none)
    #[inline]
    #[must_use]
    pub fn origin(&self) -> Uuid {
        self.origin
    }

    /// Allocation sequence number within the issuing allocator
    #[inline]
    #[must_use]
    pub fn seq(&self) -> u64 {
        self.seq
    }

    /// Handle id
    #[inline]
    #[must_use]
    pub fn id(&self) -> HandleId {
        self.id
    }

    /// Display URI
    #[inline]
    #[must_use]
    pub fn uri(&self) -> &PreviewUri {
        &self.uri
    }
}

/// Result of a release call
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReleaseOutcome {
    /// Handle was live and is now released
    Released,
    /// Handle had already been released; nothing happened
    AlreadyReleased,
    /// Handle was never allocated by this allocator; nothing happened
    Unknown,
}

impl ReleaseOutcome {
    /// Whether this call actually freed a handle
    #[inline]
    #[must_use]
    pub fn is_released(self) -> bool {
        matches!(self, Self::Released)
    }
}

/// Allocation counters
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct PreviewStats {
    /// Total handles allocated
    pub allocated: usize,
    /// Total handles released
    pub released: usize,
    /// Live handles (`allocated - released`)
    pub outstanding: usize,
}

impl PreviewStats {
    /// Whether every allocated handle has been released
    #[inline]
    #[must_use]
    pub fn is_balanced(&self) -> bool {
        self.outstanding == 0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn handle_uri_uses_blob_scheme() {
        let handle = PreviewHandle::fresh();
        assert!(handle.uri().as_str().starts_with("blob:"));
        assert!(handle.uri().as_str().ends_with(&handle.id().to_string()));
    }

    #[test]
    fn fresh_handles_are_distinct() {
        assert_ne!(PreviewHandle::fresh(), PreviewHandle::fresh());
        assert!(PreviewHandle::fresh().origin().is_nil());
    }

    #[test]
    fn issued_handle_keeps_origin_and_seq() {
        let origin = Uuid::new_v4();
        let handle = PreviewHandle::issued(origin, 7);
        assert_eq!(handle.origin(), origin);
        assert_eq!(handle.seq(), 7);
    }

    #[test]
    fn stats_balance() {
        let stats = PreviewStats {
            allocated: 3,
            released: 3,
            outstanding: 0,
        };
        assert!(stats.is_balanced());
        assert!(!PreviewStats {
            allocated: 1,
            released: 0,
            outstanding: 1
        }
        .is_balanced());
    }
}
