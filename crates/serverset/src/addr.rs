//! Address normalization for bucket labels.
//!
//! A bucket label is either a filesystem socket path (anything containing a
//! `/`) or a `host[:port]` string. Parsing is purely syntactic; no DNS
//! lookup is performed, so a configuration call can never block on the
//! network.

use std::collections::HashMap;
use std::fmt;
use std::path::PathBuf;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::AddressError;
use crate::ring::Bucket;

/// Conventional cache-protocol port, appended when a TCP label omits one.
pub const DEFAULT_PORT: u16 = 11211;

/// A connectable server address.
///
/// Carries enough structure for a transport layer to open a connection
/// (family plus host/port or path); `Display` gives the human-readable form.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ServerAddr {
    Tcp { host: String, port: u16 },
    Unix { path: PathBuf },
}

impl ServerAddr {
    /// Parse a bucket label into an address.
    ///
    /// Labels containing `/` become unix-socket addresses verbatim. Anything
    /// else is `host`, `host:port`, `[v6]`, or `[v6]:port`; a missing port
    /// defaults to [`DEFAULT_PORT`]. A bare IPv6 literal without brackets is
    /// rejected as ambiguous.
    pub fn parse_label(label: &str) -> Result<Self, AddressError> {
        if label.contains('/') {
            return Ok(ServerAddr::Unix {
                path: PathBuf::from(label),
            });
        }

        let (host, port) = split_host_port(label)?;
        if host.is_empty() {
            return Err(AddressError::EmptyHost {
                label: label.to_string(),
            });
        }
        let port = match port {
            Some(p) => p.parse::<u16>().map_err(|_| AddressError::InvalidPort {
                label: label.to_string(),
                port: p.to_string(),
            })?,
            None => DEFAULT_PORT,
        };

        Ok(ServerAddr::Tcp {
            host: host.to_string(),
            port,
        })
    }

    pub fn is_unix(&self) -> bool {
        matches!(self, ServerAddr::Unix { .. })
    }
}

impl fmt::Display for ServerAddr {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ServerAddr::Tcp { host, port } if host.contains(':') => {
                write!(f, "[{host}]:{port}")
            }
            ServerAddr::Tcp { host, port } => write!(f, "{host}:{port}"),
            ServerAddr::Unix { path } => write!(f, "{}", path.display()),
        }
    }
}

impl FromStr for ServerAddr {
    type Err = AddressError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse_label(s)
    }
}

/// Split a TCP label into host and optional port string.
fn split_host_port(label: &str) -> Result<(&str, Option<&str>), AddressError> {
    if let Some(rest) = label.strip_prefix('[') {
        // Bracketed IPv6 literal: "[v6]" or "[v6]:port".
        let Some((host, after)) = rest.split_once(']') else {
            return Err(AddressError::InvalidHost {
                label: label.to_string(),
                reason: "unterminated '[' in host",
            });
        };
        return match after {
            "" => Ok((host, None)),
            _ => match after.strip_prefix(':') {
                Some(port) => Ok((host, Some(port))),
                None => Err(AddressError::InvalidHost {
                    label: label.to_string(),
                    reason: "expected ':' after ']'",
                }),
            },
        };
    }

    match label.split_once(':') {
        None => Ok((label, None)),
        Some((host, port)) if !port.contains(':') => Ok((host, Some(port))),
        Some(_) => Err(AddressError::InvalidHost {
            label: label.to_string(),
            reason: "bare IPv6 literal must be bracketed",
        }),
    }
}

/// Immutable map from bucket label to its resolved address.
///
/// Always built from the same bucket list as the ring it is published with,
/// and keyed by the original label, so every label the ring can return has
/// exactly one entry here.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AddressTable {
    entries: HashMap<String, ServerAddr>,
}

impl AddressTable {
    /// Resolve every bucket label into an address.
    ///
    /// Fails on the first label that does not parse; nothing is partially
    /// resolved from the caller's perspective.
    pub fn resolve(buckets: &[Bucket]) -> Result<Self, AddressError> {
        let mut entries = HashMap::with_capacity(buckets.len());
        for bucket in buckets {
            let addr = ServerAddr::parse_label(&bucket.label)?;
            entries.insert(bucket.label.clone(), addr);
        }
        Ok(Self { entries })
    }

    /// Address for a ring label, if known.
    pub fn get(&self, label: &str) -> Option<&ServerAddr> {
        self.entries.get(label)
    }

    /// Iterate over all addresses. Order is unspecified but fixed for the
    /// lifetime of this table.
    pub fn addrs(&self) -> impl Iterator<Item = &ServerAddr> {
        self.entries.values()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}
