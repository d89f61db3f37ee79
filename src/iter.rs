//! Deterministic fallback iteration over the live servers for one item.

use bytes::Bytes;

use crate::config::HandleUse;
use crate::ring::Ring;
use crate::server::Aliveness;

/// Every iteration probes the continuum with this seed first, then walks
/// downward.
const INITIAL_SEED: u32 = !5;

/// Yields the servers responsible for one item, in fallback order.
///
/// The first yield is the item's primary server; each further yield is the
/// next fallback. A server is yielded at most once, and only while its
/// effective state is alive. Iteration ends once every live server has been
/// produced or every non-dead server has been probed.
///
/// The sequence is fully determined by the ring's configuration, server set,
/// and liveness. If the ring is reconfigured mid-iteration the remainder of
/// the sequence is meaningless; construct a fresh iterator instead.
pub struct ServerIter<'a> {
    ring: &'a Ring,
    item: Bytes,
    seed: u32,
    found: u32,
    visited: u32,
    bitmap: VisitedSet,
}

impl<'a> ServerIter<'a> {
    pub(crate) fn new(ring: &'a Ring, item: Bytes) -> ServerIter<'a> {
        ServerIter {
            bitmap: VisitedSet::with_capacity(ring.server_count()),
            ring,
            item,
            seed: INITIAL_SEED,
            found: 0,
            visited: 0,
        }
    }

    /// Index of the next live server in the current server list, or `None`
    /// when the iteration is exhausted.
    pub fn next_index(&mut self) -> Option<u32> {
        let ring = self.ring;
        if self.found >= ring.alive_count() {
            return None;
        }

        while self.visited < ring.visitable_count() {
            let hash = ring.config().item_hasher.hash_item(&self.item, self.seed);
            let server = ring.continuum().find(hash)?;
            self.seed = self.seed.wrapping_sub(1);

            if self.bitmap.test_and_set(server) {
                continue;
            }
            self.visited += 1;

            // An index past the server list means the continuum and list
            // disagree; stop rather than guess.
            if server as usize >= ring.server_count() {
                return None;
            }
            if ring.servers().item(server).effective_alive() == Aliveness::Alive {
                self.found += 1;
                return Some(server);
            }
        }

        None
    }

    /// Name of the next live server, or `None` when exhausted.
    pub fn next_name(&mut self) -> Option<&'a Bytes> {
        let index = self.next_index()?;
        Some(&self.ring.servers().item(index).name)
    }

    /// Handle of the next live server. `None` when exhausted, and
    /// immediately when the ring does not use handles.
    pub fn next_handle(&mut self) -> Option<u64> {
        if self.ring.use_handle() == HandleUse::Disabled {
            return None;
        }
        let index = self.next_index()?;
        Some(self.ring.servers().item(index).handle)
    }
}

impl<'a> Iterator for ServerIter<'a> {
    type Item = &'a Bytes;

    fn next(&mut self) -> Option<&'a Bytes> {
        self.next_name()
    }
}

/// Visited-server bit set: one inline word for rings of up to 32 servers, a
/// heap spill beyond that.
struct VisitedSet {
    small: u32,
    spill: Vec<u32>,
}

const BITS_PER_WORD: usize = 32;

impl VisitedSet {
    fn with_capacity(servers: usize) -> VisitedSet {
        let spill_words = (servers.saturating_sub(BITS_PER_WORD) + BITS_PER_WORD - 1) / BITS_PER_WORD;
        VisitedSet {
            small: 0,
            spill: vec![0; spill_words],
        }
    }

    /// Marks `pos` visited, returning whether it already was.
    fn test_and_set(&mut self, pos: u32) -> bool {
        let pos = pos as usize;
        if pos < BITS_PER_WORD {
            let mask = 1u32 << pos;
            let seen = self.small & mask != 0;
            self.small |= mask;
            seen
        } else {
            let pos = pos - BITS_PER_WORD;
            let word = pos / BITS_PER_WORD;
            if word >= self.spill.len() {
                self.spill.resize(word + 1, 0);
            }
            let mask = 1u32 << (pos % BITS_PER_WORD);
            let seen = self.spill[word] & mask != 0;
            self.spill[word] |= mask;
            seen
        }
    }
}
