//! Hash primitives for item placement and point generation.
//!
//! Two hash roles exist in the ring: the *item hash* maps an item key (plus a
//! probing seed) to a 32-bit position, and the *point hash* expands a server
//! name (plus a block seed) into four 32-bit ring points at a time. Both are
//! pluggable through [`ItemHasher`] and [`PointHasher`]; the defaults are
//! built on Murmur3_32 and are byte-for-byte compatible with the canonical
//! implementation, so rings built by different processes agree on placement.

pub(crate) const C1: u32 = 0xcc9e_2d51;
pub(crate) const C2: u32 = 0x1b87_3593;
pub(crate) const CM1: u32 = 0x85eb_ca6b;
pub(crate) const CM2: u32 = 0xc2b2_ae35;

/// Canonical Murmur3_32 over `data` with the given `seed`.
pub fn murmur3_32(data: &[u8], seed: u32) -> u32 {
    let mut h1 = seed;
    let nblocks = data.len() / 4;

    for block in data[..nblocks * 4].chunks_exact(4) {
        let mut k1 = u32::from_le_bytes([block[0], block[1], block[2], block[3]]);
        k1 = k1.wrapping_mul(C1);
        k1 = k1.rotate_left(15);
        k1 = k1.wrapping_mul(C2);
        h1 ^= k1;
        h1 = h1.rotate_left(13);
        h1 = h1.wrapping_mul(5).wrapping_add(0xe654_6b64);
    }

    let tail = &data[nblocks * 4..];
    if !tail.is_empty() {
        let mut k1 = 0u32;
        if tail.len() >= 3 {
            k1 ^= (tail[2] as u32) << 16;
        }
        if tail.len() >= 2 {
            k1 ^= (tail[1] as u32) << 8;
        }
        k1 ^= tail[0] as u32;
        k1 = k1.wrapping_mul(C1);
        k1 = k1.rotate_left(15);
        k1 = k1.wrapping_mul(C2);
        h1 ^= k1;
    }

    h1 ^= data.len() as u32;
    h1 ^= h1 >> 16;
    h1 = h1.wrapping_mul(CM1);
    h1 ^= h1 >> 13;
    h1 = h1.wrapping_mul(CM2);
    h1 ^ (h1 >> 16)
}

/// Mixes a 64-bit handle down to a 32-bit hash.
pub(crate) fn mix64(mut k: u64) -> u32 {
    k ^= k >> 33;
    k = k.wrapping_mul(0x5321_5229);
    k ^= k >> 33;
    k = k.wrapping_mul(0x5321_5229);
    (k as u32) ^ ((k >> 33) as u32)
}

/// Hashes an item key to its 32-bit ring position for one probing step.
pub trait ItemHasher {
    /// Returns the hash of `item` under `seed`.
    fn hash_item(&self, item: &[u8], seed: u32) -> u32;
}

/// Expands a server name into a block of four ring points.
///
/// The ring materializes point caches one block at a time, passing the block
/// index as `seed`; a given `(name, seed)` pair must always produce the same
/// four points.
pub trait PointHasher {
    /// Returns four points for `name` under the block `seed`.
    fn hash_points(&self, name: &[u8], seed: u32) -> [u32; 4];
}

/// Hash and equality for caller-supplied 64-bit handles.
pub trait HandleHasher {
    /// Returns the 32-bit hash of `handle`.
    fn hash_handle(&self, handle: u64) -> u32;

    /// Compares two handles for equality.
    fn handles_eq(&self, a: u64, b: u64) -> bool {
        a == b
    }
}

/// The default item hash: Murmur3_32.
#[derive(Clone, Copy, Debug, Default)]
pub struct Murmur3Item;

impl ItemHasher for Murmur3Item {
    fn hash_item(&self, item: &[u8], seed: u32) -> u32 {
        murmur3_32(item, seed)
    }
}

/// The default point hash: four Murmur3_32 lanes under derived seeds.
#[derive(Clone, Copy, Debug, Default)]
pub struct Murmur3Points;

impl PointHasher for Murmur3Points {
    fn hash_points(&self, name: &[u8], seed: u32) -> [u32; 4] {
        let i = seed.wrapping_mul(4);
        [
            murmur3_32(name, i.wrapping_mul(C1)),
            murmur3_32(name, i.wrapping_add(1).wrapping_mul(C2)),
            murmur3_32(name, i.wrapping_add(2).wrapping_mul(CM1)),
            murmur3_32(name, i.wrapping_add(3).wrapping_mul(CM2)),
        ]
    }
}

/// The default handle hash: a 64→32 multiply-xor mix with raw equality.
#[derive(Clone, Copy, Debug, Default)]
pub struct Mix64Handle;

impl HandleHasher for Mix64Handle {
    fn hash_handle(&self, handle: u64) -> u32 {
        mix64(handle)
    }
}

/// An MD5-based point hash.
///
/// The digest input is the 8-byte little-endian block seed followed by the
/// server name; the 16-byte digest is reinterpreted as four 32-bit words in
/// memory order. Heavier than the Murmur3 default but with better-studied
/// dispersion, this is the recommended choice when the ring is shared with
/// deployments that already use an MD5 continuum.
#[cfg(feature = "md5")]
#[derive(Clone, Copy, Debug, Default)]
pub struct Md5Points;

#[cfg(feature = "md5")]
impl PointHasher for Md5Points {
    fn hash_points(&self, name: &[u8], seed: u32) -> [u32; 4] {
        use md5::{Digest, Md5};

        let mut ctx = Md5::new();
        ctx.update((seed as u64).to_le_bytes());
        ctx.update(name);
        let digest = ctx.finalize();

        let mut points = [0u32; 4];
        for (word, chunk) in points.iter_mut().zip(digest.chunks_exact(4)) {
            *word = u32::from_ne_bytes([chunk[0], chunk[1], chunk[2], chunk[3]]);
        }
        points
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn murmur3_canonical_vectors() {
        assert_eq!(murmur3_32(b"", 0), 0);
        assert_eq!(murmur3_32(b"", 1), 0x514e_28b7);
        assert_eq!(murmur3_32(b"", 0xffff_ffff), 0x81f1_6f39);
        assert_eq!(murmur3_32(b"hello", 0), 0x248b_fa47);
        assert_eq!(murmur3_32(b"hello, world", 0), 0x149b_bb7f);
        assert_eq!(
            murmur3_32(b"The quick brown fox jumps over the lazy dog", 0),
            0x2e4f_f723
        );
    }

    #[test]
    fn murmur3_tail_lengths() {
        // One hash per tail residue; mostly a regression net for the
        // byte-order of the tail mix.
        let data = b"abcdefg";
        let hashes: Vec<u32> = (4..=7).map(|n| murmur3_32(&data[..n], 7)).collect();
        for (i, a) in hashes.iter().enumerate() {
            for b in &hashes[i + 1..] {
                assert_ne!(a, b);
            }
        }
    }

    #[test]
    fn point_lanes_are_independent() {
        let points = Murmur3Points.hash_points(b"cache-1.example.com", 0);
        for (i, a) in points.iter().enumerate() {
            for b in &points[i + 1..] {
                assert_ne!(a, b);
            }
        }
        assert_eq!(points, Murmur3Points.hash_points(b"cache-1.example.com", 0));
        assert_ne!(points, Murmur3Points.hash_points(b"cache-1.example.com", 1));
    }

    #[test]
    fn mix64_spreads_small_handles() {
        let hashes: Vec<u32> = (0u64..16).map(mix64).collect();
        for (i, a) in hashes.iter().enumerate() {
            for b in &hashes[i + 1..] {
                assert_ne!(a, b);
            }
        }
    }

    #[cfg(feature = "md5")]
    #[test]
    fn md5_points_are_seed_dependent() {
        let a = Md5Points.hash_points(b"cache-1.example.com", 0);
        let b = Md5Points.hash_points(b"cache-1.example.com", 1);
        assert_ne!(a, b);
        assert_eq!(a, Md5Points.hash_points(b"cache-1.example.com", 0));
    }
}
