//! Construction-time configuration for a [`Ring`](crate::Ring).

use crate::hash::{HandleHasher, ItemHasher, Mix64Handle, Murmur3Item, Murmur3Points, PointHasher};

pub(crate) const DEFAULT_POINTS_PER_SERVER: u32 = 1000;

/// Whether servers are addressable by caller-supplied 64-bit handles in
/// addition to their names.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum HandleUse {
    /// Resolved to [`HandleUse::Enabled`] when the ring is built.
    Default,
    /// No by-handle index is kept; handle-based refresh and iteration are
    /// unavailable.
    Disabled,
    /// Handles are indexed and must be unique within a server list.
    Enabled,
}

/// Configuration consumed once by [`Ring::new`](crate::Ring::new).
///
/// All fields are public; build one with struct-update syntax over
/// [`RingConfig::default`]:
///
/// ```
/// use consistent_ring::{HandleUse, RingConfig, Ring};
///
/// let ring = Ring::new(RingConfig {
///     points_per_server: 500,
///     use_handle: HandleUse::Disabled,
///     ..RingConfig::default()
/// });
/// assert_eq!(ring.alive_count(), 0);
/// ```
pub struct RingConfig {
    /// Points contributed by a server of median weight. `0` selects the
    /// default of 1000.
    pub points_per_server: u32,
    /// Handle addressing mode.
    pub use_handle: HandleUse,
    /// Item hash; the default is Murmur3_32.
    pub item_hasher: Box<dyn ItemHasher + Send + Sync>,
    /// Point hash; the default derives four Murmur3_32 lanes. The `md5`
    /// feature provides `hash::Md5Points` as the MD5 alternative.
    pub point_hasher: Box<dyn PointHasher + Send + Sync>,
    /// Handle hash and equality.
    pub handle_hasher: Box<dyn HandleHasher + Send + Sync>,
}

impl Default for RingConfig {
    fn default() -> RingConfig {
        RingConfig {
            points_per_server: DEFAULT_POINTS_PER_SERVER,
            use_handle: HandleUse::Default,
            item_hasher: Box::new(Murmur3Item),
            point_hasher: Box::new(Murmur3Points),
            handle_hasher: Box::new(Mix64Handle),
        }
    }
}

impl RingConfig {
    /// Fills in unset values, mirroring what a fresh ring assumes.
    pub(crate) fn normalize(&mut self) {
        if self.points_per_server == 0 {
            self.points_per_server = DEFAULT_POINTS_PER_SERVER;
        }
        if self.use_handle == HandleUse::Default {
            self.use_handle = HandleUse::Enabled;
        }
    }
}
