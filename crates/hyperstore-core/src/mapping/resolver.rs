//! Lookups the mapping engine needs from the store

use crate::error::Result;
use crate::ids::{EdgeId, EdgeTypeId, HyperedgeId, HyperedgeTypeId, NodeId, NodeTypeId};
use crate::types::Category;
use serde_json::Value;

/// Minimal view of a stored node
#[derive(Debug, Clone, PartialEq)]
pub struct NodeRef {
    pub id: NodeId,
    pub type_id: NodeTypeId,
    pub payload_id: String,
}

/// Minimal view of a stored edge, with its endpoints
#[derive(Debug, Clone, PartialEq)]
pub struct EdgeRef {
    pub id: EdgeId,
    pub type_id: EdgeTypeId,
    pub from: NodeRef,
    pub to: NodeRef,
}

/// Minimal view of a stored hyperedge, with its members in order
#[derive(Debug, Clone, PartialEq)]
pub struct HyperedgeRef {
    pub id: HyperedgeId,
    pub type_id: HyperedgeTypeId,
    pub members: Vec<NodeRef>,
}

/// A record found by public id
#[derive(Debug, Clone, PartialEq)]
pub enum Resolved {
    Node(NodeRef),
    Edge(EdgeRef),
    Hyperedge(HyperedgeRef),
}

impl Resolved {
    pub fn internal_id(&self) -> i64 {
        match self {
            Self::Node(n) => n.id.get(),
            Self::Edge(e) => e.id.get(),
            Self::Hyperedge(h) => h.id.get(),
        }
    }

    pub fn type_id(&self) -> i64 {
        match self {
            Self::Node(n) => n.type_id.get(),
            Self::Edge(e) => e.type_id.get(),
            Self::Hyperedge(h) => h.type_id.get(),
        }
    }

    /// The nodes this record stands for as a hyperedge member
    pub fn into_member_nodes(self) -> Vec<NodeRef> {
        match self {
            Self::Node(n) => vec![n],
            Self::Edge(e) => vec![e.from, e.to],
            Self::Hyperedge(h) => h.members,
        }
    }
}

/// Resolution of public ids to stored records, injected into each row
/// transformation
pub trait Resolver {
    /// Find a record of the given category by its public id
    fn resolve(&self, category: Category, payload_id: &str) -> Option<Resolved>;

    /// Type id and current payload of a stored record
    fn current(&self, category: Category, internal_id: i64) -> Result<Option<(i64, Value)>>;
}

/// Type name lookup used while compiling mapping plans
pub trait TypeCatalog {
    fn type_id(&self, category: Category, name: &str) -> Option<i64>;
}
