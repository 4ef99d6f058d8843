//! Error types returned by fallible operations on [`crate::TrieMap`]
//! (spec.md §7). Missing-key and duplicate-key conditions are ordinary
//! `bool`/`Option` return values per spec.md §4.8 and are not represented
//! here; this enum exists for the one condition that is a genuine error:
//! allocation failure on a growth path.

use std::fmt;

/// Errors that can be returned while growing the trie.
#[derive(Debug, PartialEq, Eq)]
pub enum TrieError {
    /// The backing [`NodeAlloc`](crate::alloc::NodeAlloc) could not supply
    /// a block for a new or resized node. The trie is left exactly as it
    /// was before the call that triggered this error: every node-growth
    /// path builds the replacement node first and only swaps it in once
    /// that allocation has succeeded.
    AllocationFailed,
}

impl std::error::Error for TrieError {}

impl fmt::Display for TrieError {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            TrieError::AllocationFailed => write!(
                f,
                "Error: the node allocator could not satisfy a growth \
                 request; the trie is unchanged."
            ),
        }
    }
}

pub type TrieResult<T> = Result<T, TrieError>;
