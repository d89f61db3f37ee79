//! Server records and the staging list used to (re)configure a ring.

use std::sync::Arc;

use bytes::Bytes;

use crate::config::{HandleUse, RingConfig};
use crate::error::Error;
use crate::hash::murmur3_32;
use crate::set::IndexSet;

/// Per-server liveness state.
///
/// Each server carries two layers: the configured value supplied with the
/// server list, and an updated value applied later through a refresh. The
/// effective state is the configured one unless an update overrides it, and
/// a configured `Dead` cannot be overridden at all.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Aliveness {
    /// Not part of the ring: contributes no continuum points.
    Dead = 0,
    /// Selectable.
    Alive = 1,
    /// Keeps its continuum points (so other servers' placement is
    /// undisturbed) but is skipped during selection.
    Down = 2,
    /// Only meaningful as an updated value or a refresh default: defer to the
    /// configured state.
    Default = 1 << 30,
}

pub(crate) struct ServerItem {
    pub(crate) name: Bytes,
    pub(crate) handle: u64,
    pub(crate) weight: u32,
    pub(crate) alive_as_configured: Aliveness,
    pub(crate) alive_as_updated: Aliveness,
    pub(crate) used_points: u32,
    /// Cached ring points, generated in blocks of four and reused across
    /// list exchanges.
    pub(crate) points: Vec<u32>,
}

impl ServerItem {
    fn new(name: Bytes, weight: u32, alive: Aliveness, handle: u64) -> ServerItem {
        ServerItem {
            name,
            handle,
            weight,
            alive_as_configured: alive,
            alive_as_updated: Aliveness::Default,
            used_points: 0,
            points: Vec::new(),
        }
    }

    pub(crate) fn effective_alive(&self) -> Aliveness {
        if self.alive_as_configured == Aliveness::Dead {
            Aliveness::Dead
        } else if self.alive_as_updated == Aliveness::Default {
            self.alive_as_configured
        } else {
            self.alive_as_updated
        }
    }

    /// Marks `used` points as contributed to the continuum, materializing any
    /// missing cache blocks first. The cache only ever grows; shrinking the
    /// contribution just lowers `used_points`.
    pub(crate) fn set_used_points(&mut self, config: &RingConfig, used: u32) {
        if (self.points.len() as u32) < used {
            let rounded = (used + 3) / 4 * 4;
            self.points.reserve(rounded as usize - self.points.len());
            while (self.points.len() as u32) < rounded {
                let block = self.points.len() as u32 / 4;
                let quad = config.point_hasher.hash_points(&self.name, block);
                self.points.extend_from_slice(&quad);
            }
        }
        self.used_points = used;
    }

    /// Moves the point cache and updated liveness out of a same-named
    /// predecessor, so an exchange does not re-hash surviving servers.
    pub(crate) fn steal_points_and_alive(&mut self, from: &mut ServerItem) {
        self.points = std::mem::take(&mut from.points);
        self.alive_as_updated = from.alive_as_updated;
    }
}

/// An ordered collection of servers, staged apart from the ring and swapped
/// in atomically with [`Ring::exchange_server_list`](crate::Ring::exchange_server_list).
///
/// Names are unique within a list; handles too, when the ring uses handles.
/// Obtain one from [`Ring::server_list`](crate::Ring::server_list) so it
/// shares the ring's configuration.
pub struct ServerList {
    config: Arc<RingConfig>,
    items: Vec<ServerItem>,
    by_name: IndexSet,
    by_handle: Option<IndexSet>,
}

impl ServerList {
    pub(crate) fn new(config: Arc<RingConfig>) -> ServerList {
        let by_handle = if config.use_handle == HandleUse::Enabled {
            Some(IndexSet::new())
        } else {
            None
        };
        ServerList {
            config,
            items: Vec::new(),
            by_name: IndexSet::new(),
            by_handle,
        }
    }

    /// Number of servers in the list.
    pub fn len(&self) -> usize {
        self.items.len()
    }

    /// Whether the list holds no servers.
    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    /// Appends a server.
    ///
    /// The name is copied. `handle` is ignored when the ring does not use
    /// handles. On a duplicate name or handle the list is left exactly as it
    /// was.
    pub fn add<N: AsRef<[u8]>>(
        &mut self,
        name: N,
        weight: u32,
        alive: Aliveness,
        handle: u64,
    ) -> Result<(), Error> {
        let name = Bytes::copy_from_slice(name.as_ref());
        let name_hash = murmur3_32(&name, 0);
        let index = self.items.len() as u32;
        self.items.push(ServerItem::new(name.clone(), weight, alive, handle));

        let name_taken = {
            let items = &self.items;
            self.by_name
                .insert(name_hash, index, |i| items[i as usize].name == name)
                .is_err()
        };
        if name_taken {
            self.items.pop();
            return Err(Error::NameExists);
        }

        let handle_hash = self.config.handle_hasher.hash_handle(handle);
        let handle_taken = match self.by_handle.as_mut() {
            Some(by_handle) => {
                let items = &self.items;
                let hasher = &self.config.handle_hasher;
                by_handle
                    .insert(handle_hash, index, |i| {
                        hasher.handles_eq(items[i as usize].handle, handle)
                    })
                    .is_err()
            }
            None => false,
        };
        if handle_taken {
            {
                let items = &self.items;
                self.by_name
                    .remove(name_hash, |i| items[i as usize].name == name);
            }
            self.items.pop();
            return Err(Error::HandleExists);
        }

        Ok(())
    }

    pub(crate) fn index_of_name(&self, name: &[u8]) -> Option<u32> {
        let hash = murmur3_32(name, 0);
        let items = &self.items;
        self.by_name.get(hash, |i| items[i as usize].name == name)
    }

    pub(crate) fn index_of_handle(&self, handle: u64) -> Option<u32> {
        let by_handle = self.by_handle.as_ref()?;
        let hash = self.config.handle_hasher.hash_handle(handle);
        let items = &self.items;
        let hasher = &self.config.handle_hasher;
        by_handle.get(hash, |i| hasher.handles_eq(items[i as usize].handle, handle))
    }

    pub(crate) fn item(&self, index: u32) -> &ServerItem {
        &self.items[index as usize]
    }

    pub(crate) fn item_mut(&mut self, index: u32) -> &mut ServerItem {
        &mut self.items[index as usize]
    }

    pub(crate) fn items(&self) -> impl Iterator<Item = &ServerItem> {
        self.items.iter()
    }

    pub(crate) fn items_mut(&mut self) -> impl Iterator<Item = &mut ServerItem> {
        self.items.iter_mut()
    }

    pub(crate) fn set_all_updated(&mut self, alive: Aliveness) {
        for item in &mut self.items {
            item.alive_as_updated = alive;
        }
    }
}
