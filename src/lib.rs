//! `bytetrie`: an ordered map over fixed-width integer keys (`u8..u64`,
//! `i8..i64`), backed by a 256-way byte-consuming digital radix trie.
//!
//! Every trie level dispatches on one byte of the key's big-endian,
//! order-preserving encoding, so lookup, insert and erase all cost
//! `O(key width in bytes)` rather than `O(log n)`, and forward/reverse
//! iteration walks entries in the key's natural numeric order without a
//! comparator. Runs of keys that agree on a long common prefix collapse
//! into a single skip chain instead of a column of single-child nodes;
//! small leaves are stored as flat sorted arrays (or a 256-bit presence
//! bitmap, for 8-bit suffixes) rather than further subdivided, and only
//! split into a 256-way bitmask-internal node once they outgrow
//! [`node::COMPACT_MAX`] entries.
//!
//! ```
//! use bytetrie::TrieMap;
//!
//! let mut m: TrieMap<i32, &str> = TrieMap::new();
//! m.insert(5, "five").unwrap();
//! m.insert(-1, "minus one").unwrap();
//! m.insert(0, "zero").unwrap();
//!
//! let ordered: Vec<i32> = m.iter().map(|(k, _)| k).collect();
//! assert_eq!(ordered, vec![-1, 0, 5]);
//! ```

mod bitmap;
mod iter;
mod key;
mod node;
mod ops;
mod stats;
mod value;

pub mod alloc;
pub mod error;
pub mod map;

pub use alloc::{GlobalAlloc, NodeAlloc};
pub use error::{TrieError, TrieResult};
pub use key::{InternalKey, TrieKey};
pub use map::{Iter, IterRev, TrieMap};
pub use stats::NodeStats;
