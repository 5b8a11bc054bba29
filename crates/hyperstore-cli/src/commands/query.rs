//! Query commands over stored hypergraphs

use clap::{Args, Subcommand, ValueEnum};
use comfy_table::Table;
use serde::Serialize;

use crate::output::{cell, render, table};
use crate::{AppContext, Cli};
use hyperstore_core::{
    Direction, Edge, EdgeGroup, Endpoint, Hyperedge, HyperedgeGroup, Hypergraph, Node, NodeFilter,
    NodeGroup, NodeId, RecordFilter, TypedNode, UpperQuery,
};

#[derive(Args)]
pub struct QueryArgs {
    #[command(subcommand)]
    pub command: QueryCommands,
}

/// Which nodes of a type to start from; all of them when empty
#[derive(Args, Debug, Clone, Default)]
pub struct NodeSelector {
    /// Public node id (repeatable)
    #[arg(long = "id")]
    pub ids: Vec<String>,
    /// Internal node id (repeatable)
    #[arg(long = "internal-id")]
    pub internal_ids: Vec<i64>,
    /// Node name (repeatable)
    #[arg(long = "name")]
    pub names: Vec<String>,
}

impl NodeSelector {
    fn filter(&self) -> NodeFilter {
        NodeFilter {
            payload_ids: self.ids.clone(),
            internal_ids: self.internal_ids.iter().copied().map(NodeId).collect(),
            names: self.names.clone(),
        }
    }
}

/// One edge or hyperedge by id; all of them when empty
#[derive(Args, Debug, Clone, Default)]
pub struct RecordSelector {
    /// Public id
    #[arg(long = "id")]
    pub id: Option<String>,
    /// Internal id
    #[arg(long = "internal-id")]
    pub internal_id: Option<i64>,
}

impl RecordSelector {
    fn filter(&self) -> RecordFilter {
        RecordFilter {
            internal_id: self.internal_id,
            payload_id: self.id.clone(),
        }
    }
}

#[derive(Clone, Copy, Debug, ValueEnum)]
pub enum DirectionArg {
    Out,
    In,
}

impl From<DirectionArg> for Direction {
    fn from(d: DirectionArg) -> Self {
        match d {
            DirectionArg::Out => Direction::Outgoing,
            DirectionArg::In => Direction::Incoming,
        }
    }
}

#[derive(Clone, Copy, Debug, ValueEnum)]
pub enum CategoryArg {
    Node,
    Edge,
    Hyperedge,
}

#[derive(Clone, Copy, Debug, ValueEnum)]
pub enum EndArg {
    From,
    To,
}

#[derive(Subcommand)]
pub enum QueryCommands {
    /// List stored hypergraphs, or show one with its metadata
    Hypergraphs {
        /// Public id of the hypergraph to show
        id: Option<String>,
    },
    /// Types used in a hypergraph, with instance counts
    Types {
        hypergraph: String,
        #[arg(long, value_enum, default_value = "node")]
        category: CategoryArg,
        /// Only this type
        #[arg(long = "type")]
        type_name: Option<String>,
    },
    /// Nodes of a type
    Nodes {
        hypergraph: String,
        node_type: String,
        #[command(flatten)]
        select: NodeSelector,
    },
    /// Edges of the selected nodes, grouped by edge type
    NodeEdges {
        hypergraph: String,
        node_type: String,
        #[command(flatten)]
        select: NodeSelector,
        #[arg(long, value_enum, default_value = "out")]
        direction: DirectionArg,
        /// Only edges of this type
        #[arg(long)]
        edge_type: Option<String>,
    },
    /// Nodes one edge away from the selected nodes
    Neighbours {
        hypergraph: String,
        node_type: String,
        edge_type: String,
        #[command(flatten)]
        select: NodeSelector,
        #[arg(long, value_enum, default_value = "out")]
        direction: DirectionArg,
    },
    /// Hyperedges the selected nodes belong to
    NodeHyperedges {
        hypergraph: String,
        node_type: String,
        #[command(flatten)]
        select: NodeSelector,
        #[arg(long)]
        hyperedge_type: Option<String>,
    },
    /// Nodes sharing a hyperedge with the selected nodes
    HyperedgeNeighbours {
        hypergraph: String,
        node_type: String,
        #[command(flatten)]
        select: NodeSelector,
        #[arg(long)]
        hyperedge_type: Option<String>,
    },
    /// Edges of a type
    Edges {
        hypergraph: String,
        edge_type: String,
        #[command(flatten)]
        select: RecordSelector,
    },
    /// Source or target nodes of edges of a type
    Endpoints {
        hypergraph: String,
        edge_type: String,
        #[arg(long, value_enum, default_value = "to")]
        end: EndArg,
        #[command(flatten)]
        select: RecordSelector,
    },
    /// Hyperedges of a type with their members
    Hyperedges {
        hypergraph: String,
        hyperedge_type: String,
        #[command(flatten)]
        select: RecordSelector,
    },
    /// Member nodes of hyperedges of a type, in membership order
    Members {
        hypergraph: String,
        hyperedge_type: String,
        #[command(flatten)]
        select: RecordSelector,
    },
    /// Two-hop traversal from seed nodes
    Upper {
        hypergraph: String,
        /// Public id of a seed node (repeatable)
        #[arg(long = "seed", required = true)]
        seeds: Vec<String>,
        /// Edge type of the first hop
        #[arg(long)]
        first: String,
        /// Edge type of the second hop
        #[arg(long)]
        second: String,
        /// Keep only result nodes of this type
        #[arg(long)]
        target_type: Option<String>,
        /// Minimum out-degree of intermediate nodes
        #[arg(long)]
        min_degree: Option<u32>,
        /// Edge type the degree is counted along (default: the second hop's)
        #[arg(long)]
        degree_edge_type: Option<String>,
        /// Compare seeds: at least two distinct ids are needed
        #[arg(long)]
        compare: bool,
        /// Print the second-hop edges instead of the reached nodes
        #[arg(long, conflicts_with = "network")]
        edges: bool,
        /// Print the edges of this type running between intermediate nodes
        #[arg(long, value_name = "EDGE_TYPE")]
        network: Option<String>,
    },
}

/// Report an unknown hypergraph as a request error
fn found<T>(result: Option<T>, hypergraph: &str) -> anyhow::Result<T> {
    result.ok_or_else(|| {
        hyperstore_core::Error::InvalidRequest(format!("Unknown hypergraph {}", hypergraph)).into()
    })
}

fn print<T: Serialize>(cli: &Cli, data: &T, build: impl FnOnce(&T) -> Table) -> anyhow::Result<()> {
    println!("{}", render(data, cli.output_format(), build)?);
    Ok(())
}

fn node_row(node_type: &str, node: &Node) -> Vec<String> {
    vec![
        node_type.to_string(),
        node.id.get().to_string(),
        node.payload_id.clone(),
        node.name.clone().unwrap_or_default(),
        cell(node.payload.as_ref()),
    ]
}

const NODE_HEADERS: [&str; 5] = ["type", "internal id", "id", "name", "payload"];

fn typed_nodes_table(nodes: &Vec<TypedNode>) -> Table {
    let mut t = table(&NODE_HEADERS);
    for n in nodes {
        t.add_row(node_row(&n.node_type, &n.node));
    }
    t
}

fn node_groups_table(groups: &Vec<NodeGroup>) -> Table {
    let mut t = table(&NODE_HEADERS);
    for g in groups {
        for n in &g.nodes {
            t.add_row(node_row(&g.node_type, n));
        }
    }
    t
}

const EDGE_HEADERS: [&str; 7] = ["type", "internal id", "id", "from", "to", "weight", "payload"];

fn edge_row(edge_type: &str, e: &Edge) -> Vec<String> {
    vec![
        edge_type.to_string(),
        e.id.get().to_string(),
        e.payload_id.clone().unwrap_or_default(),
        e.from_payload_id.clone(),
        e.to_payload_id.clone(),
        e.weight.map(|w| w.to_string()).unwrap_or_default(),
        cell(e.payload.as_ref()),
    ]
}

const HYPEREDGE_HEADERS: [&str; 6] = ["type", "internal id", "id", "members", "weight", "payload"];

fn hyperedge_row(hyperedge_type: &str, h: &Hyperedge) -> Vec<String> {
    vec![
        hyperedge_type.to_string(),
        h.id.get().to_string(),
        h.payload_id.clone().unwrap_or_default(),
        h.node_payload_ids.join(", "),
        h.weight.map(|w| w.to_string()).unwrap_or_default(),
        cell(h.payload.as_ref()),
    ]
}

fn type_row(name: &str, schema_id: &str, description: Option<&String>, count: usize) -> Vec<String> {
    vec![
        name.to_string(),
        schema_id.to_string(),
        count.to_string(),
        description.cloned().unwrap_or_default(),
    ]
}

const TYPE_HEADERS: [&str; 4] = ["name", "schema", "count", "description"];

pub fn run(args: &QueryArgs, cli: &Cli, ctx: &AppContext) -> anyhow::Result<()> {
    let store = &ctx.store;
    tracing::debug!("Running query command");

    match &args.command {
        QueryCommands::Hypergraphs { id: None } => {
            let all = store.hypergraphs()?;
            print(cli, &all, |all: &Vec<Hypergraph>| {
                let mut t = table(&["internal id", "id", "stored at", "updated at"]);
                for h in all {
                    t.add_row(vec![
                        h.id.get().to_string(),
                        h.payload_id.clone(),
                        h.stored_at.to_rfc3339(),
                        h.updated_at.to_rfc3339(),
                    ]);
                }
                t
            })?;
        }
        QueryCommands::Hypergraphs { id: Some(id) } => {
            let hypergraph = found(store.hypergraph(id)?, id)?;
            let metadata = found(store.hypergraph_metadata(id)?, id)?;
            let shown = serde_json::json!({"hypergraph": hypergraph, "metadata": metadata});
            print(cli, &shown, |_| {
                let mut t = table(&["field", "value"]);
                t.add_row(vec!["internal id".to_string(), hypergraph.id.get().to_string()]);
                t.add_row(vec!["id".to_string(), hypergraph.payload_id.clone()]);
                t.add_row(vec!["stored at".to_string(), hypergraph.stored_at.to_rfc3339()]);
                t.add_row(vec!["updated at".to_string(), hypergraph.updated_at.to_rfc3339()]);
                t.add_row(vec!["metadata".to_string(), cell(Some(&metadata))]);
                t
            })?;
        }
        QueryCommands::Types {
            hypergraph,
            category,
            type_name,
        } => {
            let name = type_name.as_deref();
            match category {
                CategoryArg::Node => {
                    let usage = found(store.node_types_in(hypergraph, name)?, hypergraph)?;
                    print(cli, &usage, |usage| {
                        let mut t = table(&TYPE_HEADERS);
                        for u in usage {
                            let d = &u.declaration;
                            t.add_row(type_row(&d.name, &d.schema_id, d.description.as_ref(), u.count));
                        }
                        t
                    })?;
                }
                CategoryArg::Edge => {
                    let usage = found(store.edge_types_in(hypergraph, name)?, hypergraph)?;
                    print(cli, &usage, |usage| {
                        let mut t = table(&TYPE_HEADERS);
                        for u in usage {
                            let d = &u.declaration;
                            t.add_row(type_row(&d.name, &d.schema_id, d.description.as_ref(), u.count));
                        }
                        t
                    })?;
                }
                CategoryArg::Hyperedge => {
                    let usage = found(store.hyperedge_types_in(hypergraph, name)?, hypergraph)?;
                    print(cli, &usage, |usage| {
                        let mut t = table(&TYPE_HEADERS);
                        for u in usage {
                            let d = &u.declaration;
                            t.add_row(type_row(&d.name, &d.schema_id, d.description.as_ref(), u.count));
                        }
                        t
                    })?;
                }
            }
        }
        QueryCommands::Nodes {
            hypergraph,
            node_type,
            select,
        } => {
            let nodes = found(store.nodes(hypergraph, node_type, &select.filter())?, hypergraph)?;
            print(cli, &nodes, |nodes: &Vec<Node>| {
                let mut t = table(&NODE_HEADERS);
                for n in nodes {
                    t.add_row(node_row(node_type, n));
                }
                t
            })?;
        }
        QueryCommands::NodeEdges {
            hypergraph,
            node_type,
            select,
            direction,
            edge_type,
        } => {
            let groups = found(
                store.node_edges(
                    hypergraph,
                    node_type,
                    &select.filter(),
                    (*direction).into(),
                    edge_type.as_deref(),
                )?,
                hypergraph,
            )?;
            print(cli, &groups, |groups: &Vec<EdgeGroup>| {
                let mut t = table(&EDGE_HEADERS);
                for g in groups {
                    for e in &g.edges {
                        t.add_row(edge_row(&g.edge_type, e));
                    }
                }
                t
            })?;
        }
        QueryCommands::Neighbours {
            hypergraph,
            node_type,
            edge_type,
            select,
            direction,
        } => {
            let groups = found(
                store.node_neighbours(
                    hypergraph,
                    node_type,
                    &select.filter(),
                    edge_type,
                    (*direction).into(),
                )?,
                hypergraph,
            )?;
            print(cli, &groups, node_groups_table)?;
        }
        QueryCommands::NodeHyperedges {
            hypergraph,
            node_type,
            select,
            hyperedge_type,
        } => {
            let groups = found(
                store.node_hyperedges(
                    hypergraph,
                    node_type,
                    &select.filter(),
                    hyperedge_type.as_deref(),
                )?,
                hypergraph,
            )?;
            print(cli, &groups, |groups: &Vec<HyperedgeGroup>| {
                let mut t = table(&HYPEREDGE_HEADERS);
                for g in groups {
                    for h in &g.hyperedges {
                        t.add_row(hyperedge_row(&g.hyperedge_type, h));
                    }
                }
                t
            })?;
        }
        QueryCommands::HyperedgeNeighbours {
            hypergraph,
            node_type,
            select,
            hyperedge_type,
        } => {
            let groups = found(
                store.hyperedge_neighbours(
                    hypergraph,
                    node_type,
                    &select.filter(),
                    hyperedge_type.as_deref(),
                )?,
                hypergraph,
            )?;
            print(cli, &groups, node_groups_table)?;
        }
        QueryCommands::Edges {
            hypergraph,
            edge_type,
            select,
        } => {
            let edges = found(store.edges(hypergraph, edge_type, &select.filter())?, hypergraph)?;
            print(cli, &edges, |edges: &Vec<Edge>| {
                let mut t = table(&EDGE_HEADERS);
                for e in edges {
                    t.add_row(edge_row(edge_type, e));
                }
                t
            })?;
        }
        QueryCommands::Endpoints {
            hypergraph,
            edge_type,
            end,
            select,
        } => {
            let endpoint = match end {
                EndArg::From => Endpoint::From,
                EndArg::To => Endpoint::To,
            };
            let nodes = found(
                store.edge_endpoints(hypergraph, edge_type, endpoint, &select.filter())?,
                hypergraph,
            )?;
            print(cli, &nodes, typed_nodes_table)?;
        }
        QueryCommands::Hyperedges {
            hypergraph,
            hyperedge_type,
            select,
        } => {
            let hyperedges = found(
                store.hyperedges(hypergraph, hyperedge_type, &select.filter())?,
                hypergraph,
            )?;
            print(cli, &hyperedges, |hyperedges: &Vec<Hyperedge>| {
                let mut t = table(&HYPEREDGE_HEADERS);
                for h in hyperedges {
                    t.add_row(hyperedge_row(hyperedge_type, h));
                }
                t
            })?;
        }
        QueryCommands::Members {
            hypergraph,
            hyperedge_type,
            select,
        } => {
            let nodes = found(
                store.hyperedge_members(hypergraph, hyperedge_type, &select.filter())?,
                hypergraph,
            )?;
            print(cli, &nodes, typed_nodes_table)?;
        }
        QueryCommands::Upper {
            hypergraph,
            seeds,
            first,
            second,
            target_type,
            min_degree,
            degree_edge_type,
            compare,
            edges,
            network,
        } => {
            let mut query = if *compare {
                UpperQuery::comparing(seeds.iter().cloned(), first.as_str(), second.as_str())?
            } else {
                UpperQuery::new(seeds.iter().cloned(), first.as_str(), second.as_str())?
            };
            if let Some(target) = target_type {
                query = query.with_target_type(target.as_str());
            }
            if let Some(min) = min_degree {
                query = query.with_min_degree(*min);
            }
            if let Some(edge_type) = degree_edge_type {
                query = query.with_degree_edge_type(edge_type.as_str());
            }

            if let Some(edge_type) = network {
                let found_edges = found(
                    store.upper_network_edges(hypergraph, &query, edge_type)?,
                    hypergraph,
                )?;
                print(cli, &found_edges, |edges: &Vec<Edge>| {
                    let mut t = table(&EDGE_HEADERS);
                    for e in edges {
                        t.add_row(edge_row(edge_type, e));
                    }
                    t
                })?;
            } else if *edges {
                let found_edges = found(store.upper_edges(hypergraph, &query)?, hypergraph)?;
                print(cli, &found_edges, |edges: &Vec<Edge>| {
                    let mut t = table(&EDGE_HEADERS);
                    for e in edges {
                        t.add_row(edge_row(second, e));
                    }
                    t
                })?;
            } else {
                let nodes = found(store.upper_nodes(hypergraph, &query)?, hypergraph)?;
                print(cli, &nodes, typed_nodes_table)?;
            }
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_node_selector_filter() {
        let select = NodeSelector {
            ids: vec!["G1".into()],
            internal_ids: vec![4, 5],
            names: Vec::new(),
        };
        let filter = select.filter();
        assert_eq!(filter.payload_ids, vec!["G1"]);
        assert_eq!(filter.internal_ids, vec![NodeId(4), NodeId(5)]);
        assert!(NodeSelector::default().filter().is_empty());
    }

    #[test]
    fn test_unknown_hypergraph_is_a_request_error() {
        let err = found::<()>(None, "missing").unwrap_err();
        let core = err.downcast_ref::<hyperstore_core::Error>().unwrap();
        assert_eq!(core.kind(), hyperstore_core::ErrorKind::Request);
    }

    #[test]
    fn test_upper_network_flag() {
        use clap::Parser;

        let base = [
            "hyperstore", "query", "upper", "pharma", "--seed", "D1", "--first", "targets",
            "--second", "encodes",
        ];
        let cli = Cli::try_parse_from(base.iter().chain(&["--network", "interacts"])).unwrap();
        let crate::Commands::Query(args) = cli.command else {
            panic!("expected a query command");
        };
        let QueryCommands::Upper { network, edges, .. } = args.command else {
            panic!("expected an upper query");
        };
        assert_eq!(network.as_deref(), Some("interacts"));
        assert!(!edges);

        let both = base.iter().chain(&["--network", "interacts", "--edges"]);
        assert!(Cli::try_parse_from(both).is_err());
    }
}
