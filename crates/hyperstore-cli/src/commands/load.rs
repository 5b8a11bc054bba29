//! Load commands

use clap::{Args, Subcommand};
use std::path::PathBuf;
use tokio_util::sync::CancellationToken;

use crate::output::{render, table};
use crate::{AppContext, Cli};
use hyperstore_storage::{DuplicatePolicy, RegistryStats, UploadStats};

#[derive(Args)]
pub struct LoadArgs {
    #[command(subcommand)]
    pub command: LoadCommands,
}

#[derive(Subcommand)]
pub enum LoadCommands {
    /// Register the schemas and types of a metadata manifest
    Metadata {
        /// Metadata manifest (YAML or JSON)
        manifest: PathBuf,
        /// Skip schemas and types that are already registered
        #[arg(long)]
        skip_existing: bool,
    },
    /// Upload the hypergraphs listed in a data manifest
    Data {
        /// Data manifest (YAML or JSON)
        manifest: PathBuf,
    },
}

pub async fn run(args: &LoadArgs, cli: &Cli, ctx: &AppContext) -> anyhow::Result<()> {
    match &args.command {
        LoadCommands::Metadata {
            manifest,
            skip_existing,
        } => {
            let policy = if *skip_existing {
                DuplicatePolicy::Skip
            } else {
                DuplicatePolicy::Reject
            };
            let stats = ctx.store.populate_manifest(manifest, policy)?;
            tracing::info!("Registered metadata from {}", manifest.display());
            if !cli.quiet {
                println!(
                    "{}",
                    render(&stats, cli.output_format(), |s: &RegistryStats| {
                        let mut t = table(&["registered", "count"]);
                        t.add_row(vec!["schemas".to_string(), s.schemas.to_string()]);
                        t.add_row(vec!["node types".to_string(), s.node_types.to_string()]);
                        t.add_row(vec!["edge types".to_string(), s.edge_types.to_string()]);
                        t.add_row(vec![
                            "hyperedge types".to_string(),
                            s.hyperedge_types.to_string(),
                        ]);
                        t
                    })?
                );
            }
        }
        LoadCommands::Data { manifest } => {
            let stats = upload_data(ctx, manifest.clone()).await?;
            if !cli.quiet {
                println!(
                    "{}",
                    render(&stats, cli.output_format(), |all: &Vec<UploadStats>| {
                        let mut t = table(&[
                            "hypergraph",
                            "category",
                            "mappings",
                            "inserted",
                            "updated",
                            "filtered out",
                        ]);
                        for s in all {
                            for (category, c) in
                                [("node", s.nodes), ("edge", s.edges), ("hyperedge", s.hyperedges)]
                            {
                                t.add_row(vec![
                                    s.hypergraph.clone(),
                                    category.to_string(),
                                    c.mappings.to_string(),
                                    c.inserted.to_string(),
                                    c.updated.to_string(),
                                    c.filtered_out.to_string(),
                                ]);
                            }
                        }
                        t
                    })?
                );
            }
        }
    }
    Ok(())
}

/// Run the upload off the async runtime; Ctrl-C cancels it and rolls the
/// current hypergraph back
async fn upload_data(ctx: &AppContext, manifest: PathBuf) -> anyhow::Result<Vec<UploadStats>> {
    let cancel = CancellationToken::new();
    let store = ctx.store.clone();
    let token = cancel.clone();
    let mut task =
        tokio::task::spawn_blocking(move || store.populate_data_manifest(&manifest, &token));

    let stats = tokio::select! {
        joined = &mut task => joined??,
        _ = tokio::signal::ctrl_c() => {
            tracing::warn!("Interrupted, rolling back the hypergraph being uploaded");
            cancel.cancel();
            task.await??
        }
    };
    Ok(stats)
}
