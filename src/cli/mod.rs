//! CLI command handling module
//!
//! Handles all CLI subcommands and argument parsing.

mod commands;
mod config;
mod logging;
mod output;

pub use commands::run;
pub use config::{ConfigSubcommand, handle_config_command};
pub use logging::*;
pub use output::OutputFormat;

use clap::{Args as ClapArgs, Parser, Subcommand};
use std::path::PathBuf;

/// kubegraph - explore dependency relationships between Kubernetes resources
#[derive(Parser, Debug)]
#[command(name = "kubegraph", version)]
#[command(about = "Explore dependency relationships between Kubernetes resources", long_about = None)]
pub struct Args {
    /// Enable debug logging
    #[arg(long, short = 'd', global = true)]
    pub debug: bool,

    /// Read the graph from a JSON snapshot instead of the graph backend
    #[arg(long, global = true, conflicts_with = "offline")]
    pub source: Option<PathBuf>,

    /// Use generated placeholder data; nothing is contacted
    #[arg(long, global = true)]
    pub offline: bool,

    /// Kubeconfig context used to reach an in-cluster backend
    #[arg(long, global = true)]
    pub context: Option<String>,

    /// Output format
    #[arg(long, short = 'o', global = true, value_enum, default_value_t = OutputFormat::Table)]
    pub output: OutputFormat,

    #[command(subcommand)]
    pub command: Command,
}

/// Main commands
#[derive(Subcommand, Debug)]
pub enum Command {
    /// Retrieve and print the dependency graph
    Graph {
        #[command(flatten)]
        filter: FilterArgs,

        /// Print edges instead of nodes
        #[arg(long)]
        edges: bool,

        /// Re-fetch periodically until interrupted
        #[arg(long, short = 'w')]
        watch: bool,
    },
    /// Show everything within a number of hops of a resource
    Focus {
        /// Resource id (kind/name@namespace)
        id: String,

        /// Hops to follow (default from view.defaultDepth)
        #[arg(long)]
        depth: Option<usize>,

        #[command(flatten)]
        filter: FilterArgs,
    },
    /// Summarize the dependency graph
    Stats {
        #[command(flatten)]
        filter: FilterArgs,
    },
    /// Export the dependency graph
    Export {
        /// structured (json), tabular (csv) or report (markdown)
        #[arg(long, short = 'f', default_value = "structured")]
        format: String,

        /// Write to this file instead of stdout
        #[arg(long = "file")]
        file: Option<PathBuf>,

        /// Limit the export to the neighbourhood of this resource id
        #[arg(long)]
        focus: Option<String>,

        /// Hops to follow with --focus
        #[arg(long)]
        depth: Option<usize>,

        /// Append the raw graph JSON to reports
        #[arg(long)]
        raw: bool,

        /// Include CRD relationship details
        #[arg(long)]
        schema: bool,

        /// Include edge field paths and controller flags
        #[arg(long)]
        dependency_metadata: bool,

        #[command(flatten)]
        filter: FilterArgs,
    },
    /// Show relationships between custom resource definitions
    Crds {
        /// Restrict to these API groups
        #[arg(long = "group")]
        groups: Vec<String>,

        /// Restrict to these CRD names (plural.group)
        #[arg(long = "crd")]
        crds: Vec<String>,

        /// Relationship types: reference, composition, dependency
        #[arg(long = "type")]
        types: Vec<String>,

        /// Maximum relationships to return
        #[arg(long)]
        max: Option<usize>,

        /// List CRDs installed in the cluster instead of asking the backend
        #[arg(long)]
        live: bool,
    },
    /// Show the dependencies of one resource
    Deps {
        /// Resource id (kind/name@namespace)
        id: String,
    },
    /// Decode resource ids
    Decode {
        /// Resource ids (kind/name or kind/name@namespace)
        ids: Vec<String>,
    },
    /// Configuration management
    Config {
        #[command(subcommand)]
        subcommand: ConfigSubcommand,
    },
}

/// Graph retrieval constraints shared by graph commands
#[derive(ClapArgs, Debug, Clone, Default)]
pub struct FilterArgs {
    /// Namespace to query (default from defaultNamespace)
    #[arg(long, short = 'n')]
    pub namespace: Option<String>,

    /// Query every namespace
    #[arg(long, short = 'A', conflicts_with = "namespace")]
    pub all_namespaces: bool,

    /// Leave custom resources out
    #[arg(long)]
    pub no_custom: bool,

    /// Keep only these kinds
    #[arg(long = "kind")]
    pub kinds: Vec<String>,

    /// Keep only these dependency types
    #[arg(long = "type")]
    pub types: Vec<String>,

    /// Node limit for the request
    #[arg(long)]
    pub max_nodes: Option<usize>,

    /// Case-insensitive search over name, kind and namespace
    #[arg(long, short = 's')]
    pub search: Option<String>,

    /// Drop weak dependencies
    #[arg(long)]
    pub strong_only: bool,
}
