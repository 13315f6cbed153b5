//! Weighted consistent-hash continuum (ketama-style).
//!
//! Each bucket is expanded into many points on a `u32` ring, the point count
//! proportional to the bucket's share of the total weight. A key is routed to
//! the bucket owning the first point at or after the key's hash, wrapping
//! around at the top of the ring. Because a membership change only inserts or
//! removes one bucket's points, it only remaps the keys falling in the
//! hash-space segments adjacent to those points.
//!
//! Construction is a pure function of the bucket list: the same multiset of
//! `(label, weight)` pairs always yields an identical ring, regardless of the
//! order the buckets were supplied in.

use std::collections::HashSet;
use std::sync::Arc;

use md5::{Digest, Md5};
use serde::{Deserialize, Serialize};

use crate::error::ConfigError;
use crate::Error;

/// Base number of points per bucket of average weight, before the four-way
/// digest split. A bucket with exactly average weight gets 40 points.
const POINT_FACTOR: usize = 40;

/// Each MD5 digest yields four 32-bit points.
const POINTS_PER_DIGEST: usize = 4;

/// A weighted server descriptor.
///
/// The label doubles as the source of the server's address (see
/// [`AddressTable`](crate::AddressTable)); the weight is its relative
/// capacity. Weight must be at least 1.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Bucket {
    pub label: String,
    pub weight: u32,
}

impl Bucket {
    pub fn new(label: impl Into<String>, weight: u32) -> Self {
        Self {
            label: label.into(),
            weight,
        }
    }
}

/// One hash-space coordinate owned by a bucket.
///
/// The label is shared across all of a bucket's points.
#[derive(Debug, Clone, PartialEq, Eq)]
struct RingPoint {
    hash: u32,
    label: Arc<str>,
}

/// The consistent-hash continuum: ring points sorted ascending by hash.
///
/// Immutable after construction; any membership change builds a new ring.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HashRing {
    points: Vec<RingPoint>,
    /// Unique bucket labels, sorted. Kept for introspection.
    labels: Vec<Arc<str>>,
}

impl HashRing {
    /// Build a ring from a list of weighted buckets.
    ///
    /// Each bucket receives `floor(40 * num_buckets * weight / total_weight)`
    /// points (at least one, so no positive-weight bucket ever drops off the
    /// ring). Points are the four little-endian `u32` words of the MD5 digest
    /// of `"{label}-{group}"` for successive group indices; the last digest's
    /// excess words are discarded. Point order is fixed by sorting on
    /// `(hash, label)`, so equal hashes from different buckets break ties
    /// deterministically without losing either point.
    ///
    /// Fails with [`ConfigError`] on an empty list, a zero weight, or a
    /// duplicate label.
    pub fn build(buckets: &[Bucket]) -> Result<Self, ConfigError> {
        if buckets.is_empty() {
            return Err(ConfigError::EmptyBuckets);
        }
        let mut seen = HashSet::with_capacity(buckets.len());
        for bucket in buckets {
            if bucket.weight == 0 {
                return Err(ConfigError::ZeroWeight {
                    label: bucket.label.clone(),
                });
            }
            if !seen.insert(bucket.label.as_str()) {
                return Err(ConfigError::DuplicateLabel {
                    label: bucket.label.clone(),
                });
            }
        }

        let total_weight: u64 = buckets.iter().map(|b| u64::from(b.weight)).sum();
        let mut points = Vec::with_capacity(POINT_FACTOR * buckets.len());
        let mut labels = Vec::with_capacity(buckets.len());

        for bucket in buckets {
            let label: Arc<str> = Arc::from(bucket.label.as_str());
            let count = point_count(bucket.weight, total_weight, buckets.len());
            let digests = count.div_ceil(POINTS_PER_DIGEST);

            'bucket: for group in 0..digests {
                let digest = Md5::digest(format!("{}-{}", bucket.label, group));
                for word in 0..POINTS_PER_DIGEST {
                    if group * POINTS_PER_DIGEST + word == count {
                        break 'bucket;
                    }
                    let off = word * 4;
                    let hash = u32::from_le_bytes([
                        digest[off],
                        digest[off + 1],
                        digest[off + 2],
                        digest[off + 3],
                    ]);
                    points.push(RingPoint {
                        hash,
                        label: Arc::clone(&label),
                    });
                }
            }
            labels.push(label);
        }

        points.sort_unstable_by(|a, b| a.hash.cmp(&b.hash).then_with(|| a.label.cmp(&b.label)));
        labels.sort_unstable();

        Ok(Self { points, labels })
    }

    /// Resolve a key to the label of the bucket owning it.
    ///
    /// Hashes the key with the same hash family as point generation, then
    /// binary-searches for the first point at or after that hash, wrapping
    /// to the start of the ring. O(log points).
    pub fn lookup(&self, key: impl AsRef<[u8]>) -> Result<&str, Error> {
        if self.points.is_empty() {
            return Err(Error::EmptyRing);
        }
        let hash = key_hash(key.as_ref());
        let idx = self.points.partition_point(|p| p.hash < hash);
        let idx = if idx == self.points.len() { 0 } else { idx };
        Ok(&self.points[idx].label)
    }

    /// Number of points on the ring.
    pub fn point_count(&self) -> usize {
        self.points.len()
    }

    /// Unique bucket labels on the ring, sorted.
    pub fn labels(&self) -> impl Iterator<Item = &str> {
        self.labels.iter().map(|l| l.as_ref())
    }

    /// Number of distinct buckets on the ring.
    pub fn bucket_count(&self) -> usize {
        self.labels.len()
    }

    /// Iterate over `(hash, label)` points in ring order.
    pub fn points(&self) -> impl Iterator<Item = (u32, &str)> {
        self.points.iter().map(|p| (p.hash, p.label.as_ref()))
    }
}

/// Points for one bucket: its weight share of `40 * num_buckets`, but never
/// zero, so a tiny bucket still owns at least one segment of the ring.
fn point_count(weight: u32, total_weight: u64, num_buckets: usize) -> usize {
    let count = POINT_FACTOR as u64 * num_buckets as u64 * u64::from(weight) / total_weight;
    (count as usize).max(1)
}

/// 32-bit key hash: the first little-endian word of the key's MD5 digest,
/// matching the word extraction used for ring points.
fn key_hash(key: &[u8]) -> u32 {
    let digest = Md5::digest(key);
    u32::from_le_bytes([digest[0], digest[1], digest[2], digest[3]])
}

#[cfg(test)]
mod tests {
    use super::*;

    fn buckets(labels: &[&str]) -> Vec<Bucket> {
        labels.iter().map(|l| Bucket::new(*l, 1)).collect()
    }

    #[test]
    fn build_rejects_empty_list() {
        assert_eq!(HashRing::build(&[]), Err(ConfigError::EmptyBuckets));
    }

    #[test]
    fn build_rejects_zero_weight() {
        let err = HashRing::build(&[Bucket::new("a", 1), Bucket::new("b", 0)]).unwrap_err();
        assert_eq!(
            err,
            ConfigError::ZeroWeight {
                label: "b".to_string()
            }
        );
    }

    #[test]
    fn build_rejects_duplicate_label() {
        let err = HashRing::build(&buckets(&["a", "b", "a"])).unwrap_err();
        assert_eq!(
            err,
            ConfigError::DuplicateLabel {
                label: "a".to_string()
            }
        );
    }

    #[test]
    fn uniform_weights_get_forty_points_each() {
        let ring = HashRing::build(&buckets(&["a", "b", "c"])).unwrap();
        assert_eq!(ring.point_count(), 3 * POINT_FACTOR);
        assert_eq!(ring.bucket_count(), 3);
    }

    #[test]
    fn tiny_weight_still_lands_on_the_ring() {
        // 1/1001 of the weight rounds down to zero points; the floor of one
        // point keeps the bucket reachable.
        let ring = HashRing::build(&[Bucket::new("big", 1000), Bucket::new("small", 1)]).unwrap();
        assert!(ring.labels().any(|l| l == "small"));
    }

    #[test]
    fn build_is_order_independent() {
        let forward = HashRing::build(&buckets(&["a", "b", "c", "d"])).unwrap();
        let reverse = HashRing::build(&buckets(&["d", "c", "b", "a"])).unwrap();
        assert_eq!(forward, reverse);
    }

    #[test]
    fn lookup_is_stable() {
        let ring = HashRing::build(&buckets(&["a", "b", "c"])).unwrap();
        let first = ring.lookup("some-key").unwrap().to_string();
        for _ in 0..10 {
            assert_eq!(ring.lookup("some-key").unwrap(), first);
        }
    }

    #[test]
    fn lookup_wraps_past_the_last_point() {
        let ring = HashRing::build(&buckets(&["a", "b"])).unwrap();
        let (top_hash, top_label) = ring.points().last().map(|(h, l)| (h, l.to_string())).unwrap();
        let first_label = ring.points().next().map(|(_, l)| l.to_string()).unwrap();

        // Find a key hashing strictly above the highest point; it must wrap
        // to the first point. Skip the probe if the top point is u32::MAX.
        if top_hash < u32::MAX {
            for i in 0..100_000u32 {
                let key = format!("wrap-probe-{i}");
                if key_hash(key.as_bytes()) > top_hash {
                    assert_eq!(ring.lookup(&key).unwrap(), first_label);
                    return;
                }
            }
            panic!("no probe key hashed above {top_hash:#x} (label {top_label})");
        }
    }

    #[test]
    fn key_hash_matches_point_word_extraction() {
        // The key hash must be the same value point generation would produce
        // for word 0 of the same input.
        let digest = Md5::digest("a-0");
        let expected =
            u32::from_le_bytes([digest[0], digest[1], digest[2], digest[3]]);
        assert_eq!(key_hash(b"a-0"), expected);
    }
}
