//! A weighted consistent-hash ring with deterministic fallback ordering.
//!
//! The ring maps arbitrary item keys to a set of named servers so that
//! reconfiguring the set remaps as few items as possible. Every server
//! anchors many "points" on a 32-bit continuum in proportion to its weight;
//! an item hashes to a position and is owned by the server with the nearest
//! point. Beyond the single-owner lookup, [`Ring::iter`] yields the item's
//! servers in a reproducible fallback order, skipping servers marked down
//! and never repeating one, which is what a client needs to retry or
//! replicate across the first N live servers.
//!
//! Servers are configured through a staged [`ServerList`] swapped in
//! atomically, and their liveness can be adjusted afterwards through
//! [`AliveByName`]/[`AliveByHandle`] batches without rebuilding the list.
//! Point caches survive a swap for servers that keep their name, so periodic
//! reloads of an unchanged fleet cost no re-hashing.
//!
//! ```
//! use consistent_ring::{Aliveness, HandleUse, Ring, RingConfig};
//!
//! let mut ring = Ring::new(RingConfig {
//!     use_handle: HandleUse::Disabled,
//!     ..RingConfig::default()
//! });
//!
//! let mut servers = ring.server_list();
//! servers.add("cache-1:11211", 1, Aliveness::Alive, 0).unwrap();
//! servers.add("cache-2:11211", 1, Aliveness::Alive, 0).unwrap();
//! servers.add("cache-3:11211", 2, Aliveness::Alive, 0).unwrap();
//! ring.exchange_server_list(servers);
//!
//! // Primary plus one fallback for this key.
//! let owners = ring.get("user:1234", Some(2));
//! assert_eq!(owners.len(), 2);
//! assert_ne!(owners[0], owners[1]);
//! ```
#![deny(warnings)]

mod alive;
mod config;
mod continuum;
mod error;
pub mod hash;
mod iter;
mod ring;
mod server;
mod set;
mod util;

pub use self::alive::{AliveByHandle, AliveByName};
pub use self::config::{HandleUse, RingConfig};
pub use self::error::Error;
pub use self::iter::ServerIter;
pub use self::ring::Ring;
pub use self::server::{Aliveness, ServerList};
pub use self::util::parse_ipv4_with_port;

pub use bytes::Bytes;
