//! Key-to-bucket indexing.
//!
//! Keys are located by their textual form: whatever `Display` renders is
//! folded into a bucket index. Two keys that render the same text always
//! land in the same bucket, even if they are different values of a
//! multi-kind key type; whether they are the *same entry* is decided by
//! `Eq` in the bucket chain, never here.

use core::fmt::{self, Display, Write};
use core::num::NonZeroUsize;

/// Maps a key to a bucket index in `0..buckets`.
///
/// Implementations must be pure functions of `(key, buckets)`. The map
/// reduces out-of-range results modulo `buckets`, so a faulty indexer can
/// skew the distribution but cannot break memory safety or lookups.
pub trait BucketIndexer {
    fn bucket_index<Q>(&self, key: &Q, buckets: NonZeroUsize) -> usize
    where
        Q: ?Sized + Display;
}

/// Polynomial fold over the key's text: `acc = (acc * 31 + ch) % buckets`.
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq)]
pub struct TextFold;

impl BucketIndexer for TextFold {
    #[inline]
    fn bucket_index<Q>(&self, key: &Q, buckets: NonZeroUsize) -> usize
    where
        Q: ?Sized + Display,
    {
        let mut sink = FoldSink::new(buckets);
        // FoldSink never fails; an error here can only come from a Display
        // impl bailing out, and the partial fold is still a valid index.
        let _ = write!(sink, "{}", key);
        sink.finish()
    }
}

/// Folds already-rendered text exactly as [`TextFold`] does.
pub fn text_fold(text: &str, buckets: NonZeroUsize) -> usize {
    let mut sink = FoldSink::new(buckets);
    sink.push(text);
    sink.finish()
}

// Accumulator stays below `modulus` (<= usize::MAX), so `acc * 31 + ch`
// fits comfortably in u128.
struct FoldSink {
    acc: u128,
    modulus: u128,
}

impl FoldSink {
    fn new(buckets: NonZeroUsize) -> Self {
        Self {
            acc: 0,
            modulus: buckets.get() as u128,
        }
    }

    #[inline]
    fn push(&mut self, s: &str) {
        for ch in s.chars() {
            self.acc = (self.acc * 31 + u128::from(u32::from(ch))) % self.modulus;
        }
    }

    fn finish(self) -> usize {
        self.acc as usize
    }
}

impl Write for FoldSink {
    fn write_str(&mut self, s: &str) -> fmt::Result {
        self.push(s);
        Ok(())
    }
}
