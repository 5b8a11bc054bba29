//! Engine-assigned internal identifiers
//!
//! Every persisted row gets an integer id from the database. The newtypes keep
//! a node id from being passed where an edge id is expected.

use serde::{Deserialize, Serialize};

macro_rules! internal_id {
    ($(#[$meta:meta])* $name:ident) => {
        $(#[$meta])*
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
        #[serde(transparent)]
        pub struct $name(pub i64);

        impl $name {
            pub fn get(self) -> i64 {
                self.0
            }
        }

        impl From<i64> for $name {
            fn from(id: i64) -> Self {
                Self(id)
            }
        }

        impl std::fmt::Display for $name {
            fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
                write!(f, "{}", self.0)
            }
        }
    };
}

internal_id!(
    /// Internal id of a hypergraph container
    HypergraphId
);
internal_id!(
    /// Internal id of a node type
    NodeTypeId
);
internal_id!(
    /// Internal id of an edge type
    EdgeTypeId
);
internal_id!(
    /// Internal id of a hyperedge type
    HyperedgeTypeId
);
internal_id!(
    /// Internal id of a node
    NodeId
);
internal_id!(
    /// Internal id of an edge
    EdgeId
);
internal_id!(
    /// Internal id of a hyperedge
    HyperedgeId
);
