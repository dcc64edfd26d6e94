//! Hierarchy mutations and tree reads, addressed by an operation tag.
//!
//! A request arrives as a flat form (`type` plus named fields), is parsed into
//! a typed [`Operation`] before any store access, and is applied by the
//! [`Dispatcher`] inside a single transaction.

mod dispatcher;
mod request;

use std::fmt;
use std::str::FromStr;

pub use dispatcher::{DEFAULT_GEOCODE_TIMEOUT, Dispatcher, OperationOutcome};
pub use request::{
    AddBuilding, AddCluster, AddSensor, ClusterKey, EditBuilding, EditCluster, EditSensor,
    Operation, OperationKind, OperationRequest, RemoveSensor,
};

/// What happens to a node's descendants when the node is removed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CascadePolicy {
    /// Descendants are deleted in the same transaction.
    Cascade,
    /// Descendants are left pointing at the removed parent.
    Orphan,
}

impl FromStr for CascadePolicy {
    type Err = ();

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "cascade" => Ok(Self::Cascade),
            "orphan" => Ok(Self::Orphan),
            _ => Err(()),
        }
    }
}

impl fmt::Display for CascadePolicy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Cascade => "cascade",
            Self::Orphan => "orphan",
        })
    }
}

/// Cascade behaviour of `remove_building` and `remove_cluster`.
///
/// The default removes a building's whole subtree but leaves the sensors of a
/// removed cluster in place.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RemovalPolicy {
    pub building: CascadePolicy,
    pub cluster: CascadePolicy,
}

impl Default for RemovalPolicy {
    fn default() -> Self {
        Self {
            building: CascadePolicy::Cascade,
            cluster: CascadePolicy::Orphan,
        }
    }
}
