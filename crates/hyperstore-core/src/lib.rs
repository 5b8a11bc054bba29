//! Hyperstore Core - Typed property hypergraph model
//!
//! This crate provides the data types, manifest formats, payload validation
//! and the tabular mapping engine used by the Hyperstore storage layer.

pub mod edge;
pub mod error;
pub mod hyperedge;
pub mod hypergraph;
pub mod ids;
pub mod manifest;
pub mod mapping;
pub mod node;
pub mod query;
pub mod reader;
pub mod types;
pub mod validation;

pub use edge::{Direction, Edge, EdgeGroup, Endpoint, RecordFilter};
pub use error::{Error, ErrorKind, Result};
pub use hyperedge::{Hyperedge, HyperedgeGroup};
pub use hypergraph::{Hypergraph, HypergraphMetadata};
pub use ids::{EdgeId, EdgeTypeId, HyperedgeId, HyperedgeTypeId, HypergraphId, NodeId, NodeTypeId};
pub use manifest::{
    DataFileDecl, DataManifest, EdgeTypeDecl, HyperedgeTypeDecl, HypergraphDecl, MetadataManifest,
    NodeTypeDecl,
};
pub use mapping::{MappingDescriptor, MappingPlan, Record, RecordStream, Resolver, Target, TypeCatalog};
pub use node::{Node, NodeFilter, NodeGroup, TypedNode};
pub use query::{DegreeThreshold, UpperQuery};
pub use reader::TabularReader;
pub use types::{Category, EdgeType, HyperedgeType, NodeType, SchemaDocument, TypeUsage, WeightDecl};
pub use validation::PayloadValidator;
