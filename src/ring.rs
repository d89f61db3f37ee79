//! The ring: a server list, its continuum, and the operations that keep the
//! two consistent.

use std::mem;
use std::sync::Arc;

use bytes::Bytes;
use log::{debug, trace};

use crate::alive::{AliveByHandle, AliveByName};
use crate::config::{HandleUse, RingConfig};
use crate::continuum::Continuum;
use crate::iter::ServerIter;
use crate::server::{Aliveness, ServerList};

/// A weighted consistent-hash ring over a set of named servers.
///
/// The ring owns the current [`ServerList`] and a continuum of points built
/// from it. Server weights scale how many points each server anchors:
/// `points_per_server` points for a server of median weight, proportionally
/// more or less otherwise. Lookups and iteration never mutate the ring, so
/// concurrent reads of a quiescent ring are safe; any reconfiguration
/// ([`exchange_server_list`](Ring::exchange_server_list),
/// [`refresh_alive_by_name`](Ring::refresh_alive_by_name),
/// [`refresh_alive_by_handle`](Ring::refresh_alive_by_handle),
/// [`clean`](Ring::clean)) is a writer and must be serialized against all
/// readers by the embedder.
pub struct Ring {
    config: Arc<RingConfig>,
    servers: ServerList,
    continuum: Continuum,
    alive_count: u32,
    visitable_count: u32,
}

impl Ring {
    /// Creates an empty ring with the given configuration.
    pub fn new(mut config: RingConfig) -> Ring {
        config.normalize();
        let config = Arc::new(config);
        Ring {
            servers: ServerList::new(config.clone()),
            continuum: Continuum::new(),
            alive_count: 0,
            visitable_count: 0,
            config,
        }
    }

    /// Creates an empty [`ServerList`] sharing this ring's configuration.
    pub fn server_list(&self) -> ServerList {
        ServerList::new(self.config.clone())
    }

    /// Number of servers whose effective state is alive.
    pub fn alive_count(&self) -> u32 {
        self.alive_count
    }

    /// Number of servers in the current list.
    pub fn server_count(&self) -> usize {
        self.servers.len()
    }

    /// Handle addressing mode the ring was built with (never
    /// [`HandleUse::Default`]).
    pub fn use_handle(&self) -> HandleUse {
        self.config.use_handle
    }

    /// Replaces the ring's server set with `list`, returning the previous
    /// list.
    ///
    /// Servers present in both lists (matched by name) keep their cached
    /// continuum points and their updated liveness, so a reload does not
    /// re-hash surviving servers. The continuum is rebuilt before returning;
    /// a partially built ring is never observable through `&self` methods.
    pub fn exchange_server_list(&mut self, mut list: ServerList) -> ServerList {
        mem::swap(&mut self.servers, &mut list);

        let mut reused = 0usize;
        for old_item in list.items_mut() {
            if let Some(index) = self.servers.index_of_name(old_item.name.as_ref()) {
                self.servers.item_mut(index).steal_points_and_alive(old_item);
                reused += 1;
            }
        }
        debug!(
            "exchanged server list: {} servers ({} point caches reused)",
            self.servers.len(),
            reused
        );

        self.update_continuum();
        list
    }

    /// Resets every server's updated liveness to `default_alive`, then
    /// applies each `(name, alive)` entry of `list` to the server of that
    /// name (unknown names are skipped), and rebuilds the continuum.
    ///
    /// An empty ring is left untouched.
    pub fn refresh_alive_by_name(&mut self, list: &AliveByName, default_alive: Aliveness) {
        if self.servers.is_empty() {
            return;
        }
        self.servers.set_all_updated(default_alive);
        let mut applied = 0usize;
        for (name, alive) in list.entries() {
            if let Some(index) = self.servers.index_of_name(name.as_ref()) {
                self.servers.item_mut(index).alive_as_updated = *alive;
                applied += 1;
            }
        }
        trace!("refresh by name: {}/{} entries matched", applied, list.len());
        self.update_continuum();
    }

    /// As [`refresh_alive_by_name`](Ring::refresh_alive_by_name), keyed by
    /// handle. Only applicable when the ring uses handles; see
    /// [`AliveByHandle::new`].
    pub fn refresh_alive_by_handle(&mut self, list: &AliveByHandle, default_alive: Aliveness) {
        if self.servers.is_empty() {
            return;
        }
        self.servers.set_all_updated(default_alive);
        let mut applied = 0usize;
        for &(handle, alive) in list.entries() {
            if let Some(index) = self.servers.index_of_handle(handle) {
                self.servers.item_mut(index).alive_as_updated = alive;
                applied += 1;
            }
        }
        trace!(
            "refresh by handle: {}/{} entries matched",
            applied,
            list.len()
        );
        self.update_continuum();
    }

    /// Drops every server and continuum point, resetting the ring to its
    /// just-constructed state.
    pub fn clean(&mut self) {
        self.continuum.clear();
        self.servers = ServerList::new(self.config.clone());
        self.alive_count = 0;
        self.visitable_count = 0;
    }

    /// Starts a fallback iteration for `item`.
    pub fn iter<K: AsRef<[u8]>>(&self, item: K) -> ServerIter<'_> {
        ServerIter::new(self, Bytes::copy_from_slice(item.as_ref()))
    }

    /// Returns the names of the first `count` live servers for `item` in
    /// fallback order, or of every live server when `count` is `None`.
    pub fn get<K: AsRef<[u8]>>(&self, item: K, count: Option<usize>) -> Vec<Bytes> {
        if count == Some(0) {
            return Vec::new();
        }
        let mut iter = self.iter(item);
        let mut names = Vec::new();
        while let Some(name) = iter.next_name() {
            names.push(name.clone());
            if count == Some(names.len()) {
                break;
            }
        }
        names
    }

    /// Recomputes liveness counters and per-server point budgets, then
    /// rebuilds and sorts the continuum.
    fn update_continuum(&mut self) {
        self.alive_count = 0;
        self.visitable_count = 0;

        let mut weights = Vec::with_capacity(self.servers.len());
        for item in self.servers.items() {
            let alive = item.effective_alive();
            if alive == Aliveness::Alive {
                self.alive_count += 1;
            }
            if alive != Aliveness::Dead {
                weights.push(item.weight);
                self.visitable_count += 1;
            }
        }

        self.continuum.clear();

        if !weights.is_empty() {
            weights.sort_unstable();
            let median = weights[weights.len() / 2];
            let config = self.config.clone();

            for index in 0..self.servers.len() as u32 {
                let item = self.servers.item_mut(index);
                let used = if item.effective_alive() == Aliveness::Dead || median == 0 {
                    0
                } else {
                    // Single-precision on purpose: ports of this ring must
                    // truncate identically or their continuums diverge.
                    let share = item.weight as f32 / median as f32;
                    (config.points_per_server as f32 * share) as u32
                };
                item.set_used_points(&config, used);

                let item = self.servers.item(index);
                self.continuum
                    .add_server(index, &item.points[..item.used_points as usize]);
            }
            self.continuum.sort();
        }

        debug!(
            "continuum rebuilt: {} points, {} servers ({} alive, {} visitable)",
            self.continuum.len(),
            self.servers.len(),
            self.alive_count,
            self.visitable_count
        );
    }

    pub(crate) fn config(&self) -> &RingConfig {
        &self.config
    }

    pub(crate) fn continuum(&self) -> &Continuum {
        &self.continuum
    }

    pub(crate) fn servers(&self) -> &ServerList {
        &self.servers
    }

    pub(crate) fn visitable_count(&self) -> u32 {
        self.visitable_count
    }
}
