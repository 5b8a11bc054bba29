//! Store bootstrap and statistics

use crate::output::{render, table, OutputFormat};
use crate::{AppContext, Cli};
use hyperstore_storage::StoreStats;

/// Opening the context already bootstrapped the store
pub fn run_init(cli: &Cli, ctx: &AppContext) -> anyhow::Result<()> {
    let stats = ctx.store.stats()?;
    tracing::info!("Store ready at {}", ctx.store_config.path.display());
    if !cli.quiet {
        println!(
            "Initialized store at {} (schema version {})",
            ctx.store_config.path.display(),
            stats.schema_version
        );
    }
    Ok(())
}

pub fn run(cli: &Cli, ctx: &AppContext) -> anyhow::Result<()> {
    let stats = ctx.store.stats()?;
    let text = render(&stats, cli.output_format(), |s: &StoreStats| {
        let mut t = table(&["item", "count"]);
        let rows = [
            ("schema version", s.schema_version as usize),
            ("schemas", s.schemas),
            ("node types", s.node_types),
            ("edge types", s.edge_types),
            ("hyperedge types", s.hyperedge_types),
            ("hypergraphs", s.hypergraphs),
            ("nodes", s.nodes),
            ("edges", s.edges),
            ("hyperedges", s.hyperedges),
        ];
        for (item, count) in rows {
            t.add_row(vec![item.to_string(), count.to_string()]);
        }
        t
    })?;
    if cli.output_format() == OutputFormat::Table {
        println!("Store: {}", ctx.store_config.path.display());
    }
    println!("{}", text);
    Ok(())
}
