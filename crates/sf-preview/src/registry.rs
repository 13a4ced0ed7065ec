//! Preview allocator seam and its default in-memory registry

use crate::file::RawFile;
use crate::handle::{HandleId, PreviewHandle, PreviewStats, PreviewUri, ReleaseOutcome};
use parking_lot::Mutex;
use std::collections::HashMap;
use std::sync::Arc;
use uuid::Uuid;

/// Allocates and releases preview handles
///
/// Implementations must be cheap and non-blocking: `allocate` runs on every
/// selection event. `release` must never panic in default builds; an
/// unknown or already released handle is reported through the returned
/// [`ReleaseOutcome`].
pub trait PreviewAllocator: Send + Sync + std::fmt::Debug {
    /// Allocate a preview for `file`
    fn allocate(&self, file: &RawFile) -> PreviewHandle;

    /// Release a preview
    fn release(&self, handle: &PreviewHandle) -> ReleaseOutcome;

    /// Allocation counters
    fn stats(&self) -> PreviewStats;

    /// Backing bytes of a live preview
    fn resolve(&self, uri: &PreviewUri) -> Option<Arc<[u8]>>;
}

#[derive(Debug, Default)]
struct RegistryInner {
    live: HashMap<HandleId, (PreviewUri, Arc<[u8]>)>,
    next_seq: u64,
    released: usize,
}

/// In-memory preview registry
///
/// Holds one clone of each staged file's bytes per live handle and drops it
/// on release. Nothing is kept for a released handle: a non-live handle
/// issued by this registry (same origin, sequence below the next one) is a
/// repeated release, anything else is unknown. Memory is bounded by the
/// number of live handles.
#[derive(Debug)]
pub struct PreviewRegistry {
    origin: Uuid,
    inner: Mutex<RegistryInner>,
}

impl Default for PreviewRegistry {
    fn default() -> Self {
        Self {
            origin: Uuid::new_v4(),
            inner: Mutex::new(RegistryInner::default()),
        }
    }
}

impl PreviewRegistry {
    /// Create empty registry
    #[inline]
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Create registry behind an `Arc`, ready to share with sessions
    #[inline]
    #[must_use]
    pub fn shared() -> Arc<Self> {
        Arc::new(Self::new())
    }

    /// Whether `handle` is currently live
    #[must_use]
    pub fn is_live(&self, handle: &PreviewHandle) -> bool {
        self.inner.lock().live.contains_key(&handle.id())
    }
}

impl PreviewAllocator for PreviewRegistry {
    fn allocate(&self, file: &RawFile) -> PreviewHandle {
        let mut inner = self.inner.lock();
        let handle = PreviewHandle::issued(self.origin, inner.next_seq);
        inner.next_seq += 1;
        inner
            .live
            .insert(handle.id(), (handle.uri().clone(), Arc::clone(file.bytes())));

        tracing::debug!(
            handle = %handle.id(),
            file = file.name(),
            outstanding = inner.live.len(),
            "allocated preview"
        );
        handle
    }

    fn release(&self, handle: &PreviewHandle) -> ReleaseOutcome {
        let mut inner = self.inner.lock();
        if inner.live.remove(&handle.id()).is_some() {
            inner.released += 1;
            tracing::debug!(
                handle = %handle.id(),
                outstanding = inner.live.len(),
                "released preview"
            );
            return ReleaseOutcome::Released;
        }

        let outcome = if handle.origin() == self.origin && handle.seq() < inner.next_seq {
            ReleaseOutcome::AlreadyReleased
        } else {
            ReleaseOutcome::Unknown
        };
        drop(inner);

        if cfg!(feature = "strict-debug") {
            panic!("invalid preview release: {} ({outcome:?})", handle.id());
        }
        tracing::warn!(handle = %handle.id(), ?outcome, "ignored invalid preview release");
        outcome
    }

    fn stats(&self) -> PreviewStats {
        let inner = self.inner.lock();
        PreviewStats {
            allocated: usize::try_from(inner.next_seq).unwrap_or(usize::MAX),
            released: inner.released,
            outstanding: inner.live.len(),
        }
    }

    fn resolve(&self, uri: &PreviewUri) -> Option<Arc<[u8]>> {
        self.inner
            .lock()
            .live
            .values()
            .find(|(live_uri, _)| live_uri == uri)
            .map(|(_, bytes)| Arc::clone(bytes))
    }
}
