//! Internal-key encoding (spec.md §3).
//!
//! A user key `K` is mapped to an *internal key* `IK`: an unsigned integer
//! of the same width whose bitwise (MSB-first) ordering matches `K`'s
//! natural ordering. Unsigned types map to themselves; signed types are
//! sign-bit-flipped so that, e.g., `i8::MIN` becomes internal key `0` and
//! `i8::MAX` becomes internal key `u8::MAX`.
//!
//! Traversal consumes `IK` from the most-significant byte downward, one
//! byte (one trie level) at a time — this is the "256-way, 8 bits per
//! level" digital radix trie of spec.md §2.

use num_traits::{PrimInt, Unsigned};
use std::fmt::{Binary, Debug};

/// The unsigned, byte-addressable representation a trie walks over.
///
/// Implemented for `u8`, `u16`, `u32`, `u64` only — these are the four
/// widths spec.md §6 enumerates for `KEY`.
pub trait InternalKey:
    PrimInt
    + Unsigned
    + Debug
    + Binary
    + Default
    + num_traits::ToPrimitive
    + num_traits::NumCast
    + Send
    + Sync
    + 'static
{
    /// Width in bytes; also the maximum recursion depth of insert/erase.
    const BYTES: usize;

    /// The `index`-th byte counting from the most significant (index 0).
    fn byte_at(self, index: usize) -> u8;

    /// Reconstruct a key from at most `BYTES` big-endian bytes, left-padded
    /// implicitly with zero bytes (used when assembling a suffix back into
    /// a full key during iteration).
    fn from_be_bytes_slice(bytes: &[u8]) -> Self;

    /// Clear every bit from byte `from_byte` (inclusive) to the end,
    /// i.e. keep only the top `from_byte` bytes. Used to validate a skip
    /// prefix and to compute the suffix remaining below a given depth.
    fn mask_to_depth(self, from_byte: usize) -> Self;
}

macro_rules! impl_internal_key {
    ($t:ty) => {
        impl InternalKey for $t {
            const BYTES: usize = std::mem::size_of::<$t>();

            #[inline]
            fn byte_at(self, index: usize) -> u8 {
                self.to_be_bytes()[index]
            }

            #[inline]
            fn from_be_bytes_slice(bytes: &[u8]) -> Self {
                let mut buf = [0u8; std::mem::size_of::<$t>()];
                let start = buf.len() - bytes.len();
                buf[start..].copy_from_slice(bytes);
                <$t>::from_be_bytes(buf)
            }

            #[inline]
            fn mask_to_depth(self, from_byte: usize) -> Self {
                if from_byte >= Self::BYTES {
                    return self;
                }
                let shift = (Self::BYTES - from_byte) * 8;
                if shift >= Self::BYTES * 8 {
                    0
                } else {
                    (self >> shift) << shift
                }
            }
        }
    };
}

impl_internal_key!(u8);
impl_internal_key!(u16);
impl_internal_key!(u32);
impl_internal_key!(u64);

/// A fixed-width integer usable as a map key (spec.md §6, `KEY`).
///
/// Signed widths are supported by XOR-ing the sign bit so that ordered
/// comparison of the internal key matches the signed order of the user
/// key (spec.md §3).
pub trait TrieKey: Copy + Ord + Debug + Send + Sync + 'static {
    type Internal: InternalKey;

    fn to_internal(self) -> Self::Internal;
    fn from_internal(ik: Self::Internal) -> Self;
}

macro_rules! impl_trie_key_unsigned {
    ($t:ty) => {
        impl TrieKey for $t {
            type Internal = $t;

            #[inline]
            fn to_internal(self) -> Self::Internal {
                self
            }

            #[inline]
            fn from_internal(ik: Self::Internal) -> Self {
                ik
            }
        }
    };
}

macro_rules! impl_trie_key_signed {
    ($signed:ty, $unsigned:ty, $sign_bit:expr) => {
        impl TrieKey for $signed {
            type Internal = $unsigned;

            #[inline]
            fn to_internal(self) -> Self::Internal {
                (self as $unsigned) ^ $sign_bit
            }

            #[inline]
            fn from_internal(ik: Self::Internal) -> Self {
                (ik ^ $sign_bit) as $signed
            }
        }
    };
}

impl_trie_key_unsigned!(u8);
impl_trie_key_unsigned!(u16);
impl_trie_key_unsigned!(u32);
impl_trie_key_unsigned!(u64);

impl_trie_key_signed!(i8, u8, 0x80);
impl_trie_key_signed!(i16, u16, 0x8000);
impl_trie_key_signed!(i32, u32, 0x8000_0000);
impl_trie_key_signed!(i64, u64, 0x8000_0000_0000_0000);

#[derive(Clone, Copy, Eq, PartialEq, Debug)]
pub(crate) enum SuffixWidth {
    Bitmap,
    U16,
    U32,
    U64,
}

/// Choose the suffix container for `remaining_bits` unresolved key bits,
/// the smallest of {8, 16, 32, 64} that can hold them (spec.md §4.1's
/// `suffix_type` code: 00 = bitmap-leaf, 01/10/11 = u16/u32/u64 list).
///
/// Freshly created leaves (from an empty slot, or from partitioning an
/// oversized leaf) always get an empty skip chain and pay for any bits
/// this rounds up but doesn't need with always-zero high bits — cheap,
/// and it keeps leaf creation independent of whatever neighboring keys
/// happen to share. [`SkipPath`](crate::node::skip::SkipPath) compression
/// is reserved for single-child collapse during erase, where a shared
/// prefix is already known to exist across every entry below.
pub(crate) fn suffix_width_for(remaining_bits: u32) -> SuffixWidth {
    match remaining_bits {
        0..=8 => SuffixWidth::Bitmap,
        9..=16 => SuffixWidth::U16,
        17..=32 => SuffixWidth::U32,
        _ => SuffixWidth::U64,
    }
}

/// Bit width of the container `w` holds.
pub(crate) fn width_bits(w: SuffixWidth) -> u32 {
    match w {
        SuffixWidth::Bitmap => 8,
        SuffixWidth::U16 => 16,
        SuffixWidth::U32 => 32,
        SuffixWidth::U64 => 64,
    }
}

/// Reassemble up to 8 big-endian bytes into a `u64`, left-padded with
/// zero bytes. Used to read a key's remaining bytes as a single integer
/// suffix regardless of which concrete leaf container ultimately stores it.
pub(crate) fn suffix_u64_from_bytes(bytes: &[u8]) -> u64 {
    let mut buf = [0u8; 8];
    let start = 8 - bytes.len();
    buf[start..].copy_from_slice(bytes);
    u64::from_be_bytes(buf)
}
