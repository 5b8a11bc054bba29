//! Request types for traversal queries

use crate::error::{Error, Result};
use serde::{Deserialize, Serialize};

/// Minimum out-degree an intermediate node must have to be followed
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DegreeThreshold {
    /// Inclusive lower bound
    pub min: u32,

    /// Edge type the degree is counted along; the second hop's type when absent
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub edge_type: Option<String>,
}

/// Two-hop ("upper node") traversal request.
///
/// Seeds are public node ids. The first edge type is followed from the seeds
/// to the intermediate nodes, the second one from those to the results.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UpperQuery {
    pub seeds: Vec<String>,
    pub first_edge_type: String,
    pub second_edge_type: String,

    /// Keep only result nodes of this type
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub target_node_type: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub degree: Option<DegreeThreshold>,
}

impl UpperQuery {
    pub fn new(
        seeds: impl IntoIterator<Item = impl Into<String>>,
        first_edge_type: impl Into<String>,
        second_edge_type: impl Into<String>,
    ) -> Result<Self> {
        let query = Self {
            seeds: seeds.into_iter().map(Into::into).collect(),
            first_edge_type: first_edge_type.into(),
            second_edge_type: second_edge_type.into(),
            target_node_type: None,
            degree: None,
        };
        if query.seeds.is_empty() {
            return Err(Error::InvalidRequest("at least one seed node is needed".into()));
        }
        if query.first_edge_type.is_empty() || query.second_edge_type.is_empty() {
            return Err(Error::InvalidRequest("edge type names must not be empty".into()));
        }
        Ok(query)
    }

    /// A query comparing several seeds: at least two distinct ids are needed.
    /// Duplicate seeds are dropped, keeping first occurrences.
    pub fn comparing(
        seeds: impl IntoIterator<Item = impl Into<String>>,
        first_edge_type: impl Into<String>,
        second_edge_type: impl Into<String>,
    ) -> Result<Self> {
        let mut query = Self::new(seeds, first_edge_type, second_edge_type)?;
        let mut distinct: Vec<String> = Vec::with_capacity(query.seeds.len());
        for seed in query.seeds.drain(..) {
            if !distinct.contains(&seed) {
                distinct.push(seed);
            }
        }
        if distinct.len() < 2 {
            return Err(Error::InvalidRequest(format!(
                "at least two distinct node ids are needed, got {}",
                distinct.len()
            )));
        }
        query.seeds = distinct;
        Ok(query)
    }

    pub fn with_min_degree(mut self, min: u32) -> Self {
        match &mut self.degree {
            Some(degree) => degree.min = min,
            None => {
                self.degree = Some(DegreeThreshold {
                    min,
                    edge_type: None,
                })
            }
        }
        self
    }

    /// Count degrees along another edge type than the second hop's
    pub fn with_degree_edge_type(mut self, edge_type: impl Into<String>) -> Self {
        let edge_type = Some(edge_type.into());
        match &mut self.degree {
            Some(degree) => degree.edge_type = edge_type,
            None => self.degree = Some(DegreeThreshold { min: 0, edge_type }),
        }
        self
    }

    pub fn with_target_type(mut self, node_type: impl Into<String>) -> Self {
        self.target_node_type = Some(node_type.into());
        self
    }

    /// Edge type used for the degree threshold: an intermediate node's
    /// degree is the number of its outgoing edges of this type
    pub fn degree_edge_type(&self) -> Option<&str> {
        self.degree
            .as_ref()
            .map(|d| d.edge_type.as_deref().unwrap_or(&self.second_edge_type))
    }
}
