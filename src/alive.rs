//! Builders for liveness updates applied without re-supplying the full
//! server list.

use bytes::Bytes;

use crate::config::HandleUse;
use crate::ring::Ring;
use crate::server::Aliveness;

/// A batch of `(name, alive)` updates for
/// [`Ring::refresh_alive_by_name`](crate::Ring::refresh_alive_by_name).
///
/// Entries are applied in insertion order; a name listed twice ends up with
/// its last value. Names unknown to the ring are ignored at apply time.
#[derive(Default)]
pub struct AliveByName {
    entries: Vec<(Bytes, Aliveness)>,
}

impl AliveByName {
    /// Creates an empty update batch.
    pub fn new() -> AliveByName {
        AliveByName::default()
    }

    /// Queues an update for the server named `name`.
    pub fn add<N: AsRef<[u8]>>(&mut self, name: N, alive: Aliveness) {
        self.entries
            .push((Bytes::copy_from_slice(name.as_ref()), alive));
    }

    /// Number of queued updates.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Whether no updates are queued.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub(crate) fn entries(&self) -> impl Iterator<Item = &(Bytes, Aliveness)> {
        self.entries.iter()
    }
}

/// A batch of `(handle, alive)` updates for
/// [`Ring::refresh_alive_by_handle`](crate::Ring::refresh_alive_by_handle).
pub struct AliveByHandle {
    entries: Vec<(u64, Aliveness)>,
}

impl AliveByHandle {
    /// Creates an empty update batch for `ring`, or `None` when the ring was
    /// built without handle addressing.
    pub fn new(ring: &Ring) -> Option<AliveByHandle> {
        if ring.use_handle() == HandleUse::Disabled {
            return None;
        }
        Some(AliveByHandle {
            entries: Vec::new(),
        })
    }

    /// Queues an update for the server with `handle`.
    pub fn add(&mut self, handle: u64, alive: Aliveness) {
        self.entries.push((handle, alive));
    }

    /// Number of queued updates.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Whether no updates are queued.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub(crate) fn entries(&self) -> &[(u64, Aliveness)] {
        &self.entries
    }
}
