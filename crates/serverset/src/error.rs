//! Error types for server selection.
//!
//! All failures are returned to the caller as typed values; nothing in this
//! crate retries, logs errors, or panics. A failed configuration call leaves
//! the previous generation untouched, so every error here is recoverable.

use thiserror::Error;

/// Result type alias for this crate.
pub type Result<T> = std::result::Result<T, Error>;

/// Rejected bucket configuration. The offending call has no effect.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ConfigError {
    /// The bucket list was empty.
    #[error("bucket list is empty")]
    EmptyBuckets,
    /// A bucket had weight zero; every bucket must carry positive weight.
    #[error("bucket {label:?} has zero weight")]
    ZeroWeight { label: String },
    /// The same label appeared twice in one configuration call.
    #[error("duplicate bucket label {label:?}")]
    DuplicateLabel { label: String },
}

/// A bucket label that could not be turned into a connectable address.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum AddressError {
    /// Label had no host part (e.g. `""` or `":11211"`).
    #[error("label {label:?} has an empty host")]
    EmptyHost { label: String },
    /// The port suffix did not parse as a u16.
    #[error("label {label:?} has invalid port {port:?}")]
    InvalidPort { label: String, port: String },
    /// Malformed host syntax, e.g. an unterminated `[v6]` literal or a bare
    /// multi-colon IPv6 address without brackets.
    #[error("label {label:?} is not a valid host:port: {reason}")]
    InvalidHost { label: String, reason: &'static str },
}

/// Top-level error surfaced by [`ServerSet`](crate::ServerSet) and
/// [`HashRing`](crate::HashRing) operations.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum Error {
    #[error(transparent)]
    Config(#[from] ConfigError),
    #[error(transparent)]
    Address(#[from] AddressError),
    /// No generation has ever been published, or the ring resolved to a
    /// label the address table does not know.
    #[error("no servers configured")]
    NoServers,
    /// Lookup against a ring with zero points.
    #[error("hash ring has no points")]
    EmptyRing,
}
