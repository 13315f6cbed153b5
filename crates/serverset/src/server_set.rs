//! Concurrency-safe server selection façade.
//!
//! A [`ServerSet`] owns exactly one published generation at a time: an
//! immutable `(HashRing, AddressTable)` pair built from one bucket list.
//! Configuration calls build the replacement generation entirely off to the
//! side and publish it with a single pointer swap, so concurrent readers
//! always observe one complete generation — never an old ring paired with new
//! addresses. Readers snapshot the current generation with an `Arc` clone and
//! release the lock before doing any hashing.

use std::sync::Arc;

use parking_lot::RwLock;
use tracing::debug;

use crate::addr::{AddressTable, ServerAddr};
use crate::error::{Error, Result};
use crate::ring::{Bucket, HashRing};

/// One atomically-published configuration generation.
///
/// Ring and address table are built together from the same bucket list and
/// never mutated after publication.
#[derive(Debug)]
struct Generation {
    id: u64,
    ring: HashRing,
    addrs: AddressTable,
}

/// Routes cache keys to server addresses over a weighted consistent-hash
/// ring.
///
/// Starts unconfigured: every [`pick_server`](Self::pick_server) fails until
/// the first successful [`set_buckets`](Self::set_buckets) or
/// [`set_servers`](Self::set_servers). A failed configuration call leaves the
/// previous generation fully intact, so the set stays usable with its
/// last-good configuration.
#[derive(Debug, Default)]
pub struct ServerSet {
    current: RwLock<Option<Arc<Generation>>>,
}

impl ServerSet {
    /// Create an unconfigured server set.
    pub fn new() -> Self {
        Self::default()
    }

    /// Replace the configuration with the given weighted buckets.
    ///
    /// Resolves every label to an address and builds the new ring before
    /// touching the published generation; on any error nothing is replaced.
    pub fn set_buckets(&self, buckets: &[Bucket]) -> Result<()> {
        // Build the whole generation outside the lock; only the swap below
        // is serialized against readers.
        let addrs = AddressTable::resolve(buckets)?;
        let ring = HashRing::build(buckets)?;

        let mut current = self.current.write();
        let id = current.as_ref().map_or(1, |g| g.id + 1);
        debug!(
            generation = id,
            buckets = buckets.len(),
            points = ring.point_count(),
            "published server set generation"
        );
        *current = Some(Arc::new(Generation { id, ring, addrs }));
        Ok(())
    }

    /// Replace the configuration with uniformly-weighted servers.
    ///
    /// Every label gets weight 1; use [`set_buckets`](Self::set_buckets) to
    /// control weights.
    pub fn set_servers<I, S>(&self, servers: I) -> Result<()>
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let buckets: Vec<Bucket> = servers
            .into_iter()
            .map(|label| Bucket::new(label, 1))
            .collect();
        self.set_buckets(&buckets)
    }

    /// Address of the server owning `key` under the current generation.
    ///
    /// Fails with [`Error::NoServers`] if no generation has been published,
    /// or if the ring resolves to a label the address table does not know —
    /// the latter cannot happen for a generation built by this type, but is
    /// checked rather than assumed.
    pub fn pick_server(&self, key: impl AsRef<[u8]>) -> Result<ServerAddr> {
        let generation = self.snapshot().ok_or(Error::NoServers)?;
        let label = generation.ring.lookup(key).map_err(|_| Error::NoServers)?;
        generation.addrs.get(label).cloned().ok_or(Error::NoServers)
    }

    /// Apply `visit` to every address of the current generation.
    ///
    /// Stops at the first visitor error and returns it; addresses already
    /// visited have each seen exactly one call. The order is unspecified but
    /// fixed within one generation. An unconfigured set visits nothing.
    pub fn each<E, F>(&self, mut visit: F) -> std::result::Result<(), E>
    where
        F: FnMut(&ServerAddr) -> std::result::Result<(), E>,
    {
        let Some(generation) = self.snapshot() else {
            return Ok(());
        };
        for addr in generation.addrs.addrs() {
            visit(addr)?;
        }
        Ok(())
    }

    /// Id of the current generation, if one has been published. Ids increase
    /// by one per successful configuration call.
    pub fn generation(&self) -> Option<u64> {
        self.snapshot().map(|g| g.id)
    }

    /// Number of servers in the current generation (zero if unconfigured).
    pub fn server_count(&self) -> usize {
        self.snapshot().map_or(0, |g| g.addrs.len())
    }

    fn snapshot(&self) -> Option<Arc<Generation>> {
        self.current.read().clone()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn unconfigured_set_fails_lookups() {
        let set = ServerSet::new();
        assert_eq!(set.pick_server("foo"), Err(Error::NoServers));
        assert_eq!(set.generation(), None);
        assert_eq!(set.server_count(), 0);
    }

    #[test]
    fn generation_id_increments_per_publish() {
        let set = ServerSet::new();
        set.set_servers(["a"]).unwrap();
        assert_eq!(set.generation(), Some(1));
        set.set_servers(["a", "b"]).unwrap();
        assert_eq!(set.generation(), Some(2));
    }

    #[test]
    fn failed_publish_keeps_generation_id() {
        let set = ServerSet::new();
        set.set_servers(["a", "b"]).unwrap();
        assert!(set.set_servers(Vec::<String>::new()).is_err());
        assert_eq!(set.generation(), Some(1));
        assert_eq!(set.server_count(), 2);
    }

    #[test]
    fn each_on_unconfigured_set_visits_nothing() {
        let set = ServerSet::new();
        let mut visited = 0;
        set.each(|_| -> Result<()> {
            visited += 1;
            Ok(())
        })
        .unwrap();
        assert_eq!(visited, 0);
    }
}
