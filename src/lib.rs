//! chained-hashmap: a single-threaded associative container with a fixed
//! number of buckets and collision resolution by chaining.
//!
//! Internal Design:
//!
//! Summary
//! - Goal: a small map whose every operation touches exactly one bucket,
//!   with structural invariants simple enough to check exhaustively in
//!   tests.
//! - Layers:
//!   - BucketIndexer (`index`): pure function from a key's `Display` text
//!     to a bucket index. The default `TextFold` computes
//!     `acc = (acc * 31 + ch) % capacity` over the characters.
//!   - Bucket (`bucket`): a doubly linked chain whose nodes live in a
//!     `SlotMap` arena shared by all buckets. Scan, append-at-tail, and
//!     unlink are O(chain length).
//!   - ChainedHashMap (`map`): owns the bucket array and the arena; routes
//!     each call through the indexer and delegates to one chain.
//!
//! Constraints
//! - Capacity is fixed at construction (`> 0`) and never changes. There
//!   is no load-factor resize; `load_factor()` is informational.
//! - Keys are unique across the table; an entry for `k` lives only in
//!   bucket `index(k)`. `len()` always equals the sum of chain lengths.
//! - Traversal (`keys`, `values`, `items`, `iter`) walks buckets in index
//!   order, then each chain head to tail. This is deterministic for a given
//!   operation history but is not insertion order.
//!
//! Key equality
//! - Indexing is textual, equality is not. Two keys that render the same
//!   text (say `Int(1)` and `Text("1")` of one enum) share a bucket but
//!   are separate entries unless the key type's `Eq` says otherwise.
//! - Borrowed lookups (`K: Borrow<Q>`) require `Q` to render the same text
//!   as `K`, which holds for `String`/`str`.
//!
//! Errors
//! - `LookupError::NotFound` from `get`, `get_mut`, `remove`,
//!   `remove_entry`. Nothing is retried or swallowed.
//! - `CapacityError::Zero` when constructing with zero buckets; no map is
//!   returned.
//!
//! Notes and non-goals
//! - Single-threaded; mutation takes `&mut self`, there is no locking.
//! - No iteration-order guarantees beyond the bucket layout above.
//! - The default indexer is not collision resistant.
//! - Logging goes through the `log` facade (`debug!` for lifecycle,
//!   `trace!` per operation); the crate never installs a logger.

mod bucket;
pub mod config;
pub mod error;
pub mod index;
pub mod map;
mod map_proptest;

// Public surface
pub use config::{Builder, MapConfig};
pub use error::{CapacityError, LookupError};
pub use index::{text_fold, BucketIndexer, TextFold};
pub use map::ChainedHashMap;
