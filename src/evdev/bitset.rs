use std::collections::BTreeSet;
use std::ops::{Deref, DerefMut};

/// Number of bytes needed to hold bits `0..=max`.
pub const fn byte_len(max: usize) -> usize {
    max / 8 + 1
}

/// Returns the indices in `0..=max` whose bit is set in `buf`.
///
/// Bit `i` lives in byte `i / 8` at position `i % 8`, which is how the kernel
/// lays out its `unsigned long` bitmaps when copying them to userspace. Bits
/// past the end of `buf` read as unset.
pub fn decode(buf: &[u8], max: usize) -> BTreeSet<usize> {
    (0..=max).filter(|&i| is_set(buf, i)).collect()
}

fn is_set(buf: &[u8], i: usize) -> bool {
    buf.get(i / 8).map_or(false, |byte| byte & (1 << (i % 8)) != 0)
}

/// Capability or state bitmask as returned by the kernel.
#[derive(Debug, Clone, Eq, PartialEq)]
pub struct BitSet(Box<[u8]>);

impl BitSet {
    pub fn with_len(len: usize) -> Self {
        BitSet(vec![0u8; len].into_boxed_slice())
    }

    pub fn for_max(max: usize) -> Self {
        Self::with_len(byte_len(max))
    }

    pub fn is_set(&self, i: usize) -> bool {
        is_set(&self.0, i)
    }

    pub fn decode(&self, max: usize) -> BTreeSet<usize> {
        decode(&self.0, max)
    }
}

impl From<Vec<u8>> for BitSet {
    fn from(buf: Vec<u8>) -> Self {
        BitSet(buf.into_boxed_slice())
    }
}

impl Deref for BitSet {
    type Target = [u8];

    fn deref(&self) -> &Self::Target {
        &self.0
    }
}

impl DerefMut for BitSet {
    fn deref_mut(&mut self) -> &mut Self::Target {
        &mut self.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn byte_len_covers_max() {
        assert_eq!(byte_len(0), 1);
        assert_eq!(byte_len(7), 1);
        assert_eq!(byte_len(8), 2);
        assert_eq!(byte_len(0x1f), 4);
        assert_eq!(byte_len(0x2ff), 96);
    }

    #[test]
    fn zeroes_decode_empty() {
        for max in [0, 7, 0x11, 0x2ff] {
            assert!(decode(&vec![0u8; byte_len(max)], max).is_empty());
        }
    }

    #[test]
    fn ones_decode_full_range() {
        for max in [0, 7, 0x11, 0x3f, 0x2ff] {
            let set = decode(&vec![0xffu8; byte_len(max)], max);
            assert_eq!(set, (0..=max).collect::<BTreeSet<_>>());
        }
    }

    #[test]
    fn bit_order_within_byte() {
        // bit 0 of byte 0 and bit 1 of byte 2
        let buf = [0b0000_0001, 0, 0b0000_0010];
        assert_eq!(decode(&buf, 23), BTreeSet::from([0, 17]));
    }

    #[test]
    fn ignores_bits_above_max() {
        assert_eq!(decode(&[0xff], 3), BTreeSet::from([0, 1, 2, 3]));
    }

    #[test]
    fn short_buffer_reads_unset() {
        let bits = BitSet::from(vec![0x80]);
        assert!(bits.is_set(7));
        assert!(!bits.is_set(8));
        assert_eq!(bits.decode(100), BTreeSet::from([7]));
    }

    #[test]
    fn for_max_allocates_zeroed() {
        let bits = BitSet::for_max(0x2ff);
        assert_eq!(bits.len(), 96);
        assert!(bits.iter().all(|&b| b == 0));
    }
}
