//! Recursive descent algorithms over [`crate::node::NodePtr`]: insert
//! (spec.md §4.5) and erase (spec.md §4.6). Both work directly on raw
//! big-endian key bytes and a byte cursor (`consumed`), so they carry no
//! generic parameter for the user's key width — [`crate::map::TrieMap`]
//! is the only place that knows about `K`/`InternalKey`.

pub(crate) mod erase;
pub(crate) mod insert;
