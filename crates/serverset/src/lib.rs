//! Weighted consistent-hash server selection for distributed caches.
//!
//! This crate decides which backend server in a fixed pool should hold a
//! given cache key. It builds a ketama-style continuum from weighted server
//! descriptors and resolves keys to stable, connectable addresses:
//!
//! - [`HashRing`]: the weighted hash continuum and key lookup
//! - [`AddressTable`] / [`ServerAddr`]: label-to-address normalization
//! - [`ServerSet`]: the concurrency-safe façade that publishes one
//!   (ring, address table) generation at a time
//!
//! The crate never touches the network; it only maps keys to addresses.
//! Adding or removing a server remaps a small, bounded fraction of keys.
//!
//! # Example
//!
//! ```rust
//! use serverset::ServerSet;
//!
//! let set = ServerSet::new();
//! set.set_servers(["10.0.0.1:11211", "10.0.0.2:11211", "10.0.0.3"])?;
//!
//! let addr = set.pick_server("user:1234")?;
//! println!("key lives on {addr}");
//! # Ok::<(), serverset::Error>(())
//! ```

pub mod addr;
pub mod error;
pub mod ring;
pub mod server_set;

pub use addr::{AddressTable, ServerAddr, DEFAULT_PORT};
pub use error::{AddressError, ConfigError, Error, Result};
pub use ring::{Bucket, HashRing};
pub use server_set::ServerSet;
