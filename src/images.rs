//! Revocable handles to encoded page images.
//!
//! Converted pages do not carry their JPEG bytes directly. The bytes live in
//! an [`ImageStore`] and each page owns an [`ImageHandle`] that addresses
//! them. Dropping the handle (or calling [`ImageHandle::revoke`]) releases
//! the bytes, so discarding a run is just dropping its pages.
//!
//! The store keeps a live count, which is how tests assert that cancelled,
//! failed and reset runs leave nothing behind.

use std::collections::HashMap;
use std::fmt;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex, MutexGuard, Weak};
use tracing::trace;

type Slots = Mutex<HashMap<u64, Arc<[u8]>>>;

/// Shared registry of encoded images.
///
/// Cheap to clone; clones refer to the same registry.
#[derive(Clone, Default)]
pub struct ImageStore {
    slots: Arc<Slots>,
    next_id: Arc<AtomicU64>,
}

impl ImageStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Store encoded bytes and return the owning handle.
    pub fn insert(&self, bytes: Vec<u8>) -> ImageHandle {
        let id = self.next_id.fetch_add(1, Ordering::Relaxed) + 1;
        let len = bytes.len();
        lock(&self.slots).insert(id, Arc::from(bytes));
        trace!("Stored image {} ({} bytes)", id, len);
        ImageHandle {
            id,
            len,
            slots: Arc::downgrade(&self.slots),
        }
    }

    /// Number of handles that have not been released yet.
    pub fn live_count(&self) -> usize {
        lock(&self.slots).len()
    }

    /// Total bytes held by live handles.
    pub fn live_bytes(&self) -> usize {
        lock(&self.slots).values().map(|b| b.len()).sum()
    }
}

impl fmt::Debug for ImageStore {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ImageStore")
            .field("live", &self.live_count())
            .finish()
    }
}

/// Owning, addressable reference to one encoded image.
///
/// Not `Clone`: exactly one page owns each image. The bytes are released
/// when the handle is dropped.
pub struct ImageHandle {
    id: u64,
    len: usize,
    slots: Weak<Slots>,
}

impl ImageHandle {
    pub fn id(&self) -> u64 {
        self.id
    }

    /// Address of the image, stable for the handle's lifetime.
    pub fn uri(&self) -> String {
        format!("image:{}", self.id)
    }

    /// Encoded size in bytes.
    pub fn len(&self) -> usize {
        self.len
    }

    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    /// The encoded bytes, or `None` once revoked or the store is gone.
    pub fn bytes(&self) -> Option<Arc<[u8]>> {
        let slots = self.slots.upgrade()?;
        let bytes = lock(&slots).get(&self.id).cloned();
        bytes
    }

    /// Whether the bytes are still held by the store.
    pub fn is_live(&self) -> bool {
        self.bytes().is_some()
    }

    /// Release the bytes now. Idempotent.
    pub fn revoke(&self) {
        if let Some(slots) = self.slots.upgrade() {
            if lock(&slots).remove(&self.id).is_some() {
                trace!("Revoked image {}", self.id);
            }
        }
    }
}

impl Drop for ImageHandle {
    fn drop(&mut self) {
        self.revoke();
    }
}

impl fmt::Debug for ImageHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ImageHandle")
            .field("id", &self.id)
            .field("len", &self.len)
            .finish()
    }
}

// A poisoned map is still consistent: every operation is a single insert/remove.
fn lock(slots: &Slots) -> MutexGuard<'_, HashMap<u64, Arc<[u8]>>> {
    slots.lock().unwrap_or_else(|e| e.into_inner())
}
