//! Output formatting for CLI commands

use kubegraph::graph::{
    CrdInfo, CrdRelationship, DependencyGraph, GraphEdge, GraphNode, GraphStats,
};
use serde::Serialize;
use tabled::settings::Style;
use tabled::{Table, Tabled};

/// Output format options
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, clap::ValueEnum)]
pub enum OutputFormat {
    #[default]
    Table,
    Json,
    Yaml,
}

/// Print rows as a table, or the serializable value behind them as JSON/YAML
pub fn print_output<T: Tabled, V: Serialize + ?Sized>(
    rows: Vec<T>,
    value: &V,
    format: OutputFormat,
) -> anyhow::Result<()> {
    match format {
        OutputFormat::Table => print_table(rows),
        OutputFormat::Json => print_json(value)?,
        OutputFormat::Yaml => print_yaml(value)?,
    }
    Ok(())
}

pub fn print_table<T: Tabled>(rows: Vec<T>) {
    if rows.is_empty() {
        println!("No results found");
        return;
    }
    let mut table = Table::new(rows);
    table.with(Style::sharp());
    println!("{}", table);
}

pub fn print_json<T: Serialize + ?Sized>(data: &T) -> anyhow::Result<()> {
    println!("{}", serde_json::to_string_pretty(data)?);
    Ok(())
}

pub fn print_yaml<T: Serialize + ?Sized>(data: &T) -> anyhow::Result<()> {
    print!("{}", serde_yaml::to_string(data)?);
    Ok(())
}

/// Warn on stderr when a result is not real cluster data
pub fn print_degradation(graph: &DependencyGraph) {
    if let Some(degradation) = &graph.metadata.degradation {
        eprintln!(
            "warning: showing {:?} data ({})",
            degradation.mode, degradation.cause
        );
    }
}

#[derive(Tabled)]
pub struct NodeRow {
    #[tabled(rename = "ID")]
    id: String,
    #[tabled(rename = "KIND")]
    kind: String,
    #[tabled(rename = "NAME")]
    name: String,
    #[tabled(rename = "NAMESPACE")]
    namespace: String,
    #[tabled(rename = "STATUS")]
    status: String,
}

impl From<&GraphNode> for NodeRow {
    fn from(n: &GraphNode) -> Self {
        Self {
            id: n.id.clone(),
            kind: n.kind.clone(),
            name: n.name.clone(),
            namespace: n.namespace.clone().unwrap_or_else(|| "-".to_string()),
            status: n.status.phase.clone().unwrap_or_default(),
        }
    }
}

#[derive(Tabled)]
pub struct EdgeRow {
    #[tabled(rename = "SOURCE")]
    source: String,
    #[tabled(rename = "TYPE")]
    dependency_type: String,
    #[tabled(rename = "STRENGTH")]
    strength: String,
    #[tabled(rename = "TARGET")]
    target: String,
    #[tabled(rename = "REASON")]
    reason: String,
}

impl From<&GraphEdge> for EdgeRow {
    fn from(e: &GraphEdge) -> Self {
        Self {
            source: e.source.clone(),
            dependency_type: e.dependency_type.to_string(),
            strength: e.strength.to_string(),
            target: e.target.clone(),
            reason: e.metadata.reason.clone(),
        }
    }
}

#[derive(Tabled)]
pub struct CountRow {
    #[tabled(rename = "KEY")]
    key: String,
    #[tabled(rename = "COUNT")]
    count: usize,
}

/// Statistics flattened to key/count rows
pub fn stats_rows(stats: &GraphStats) -> Vec<CountRow> {
    let mut rows = vec![
        CountRow {
            key: "nodes".to_string(),
            count: stats.total_nodes,
        },
        CountRow {
            key: "edges".to_string(),
            count: stats.total_edges,
        },
        CountRow {
            key: "strong".to_string(),
            count: stats.strong_dependencies,
        },
        CountRow {
            key: "weak".to_string(),
            count: stats.weak_dependencies,
        },
        CountRow {
            key: "namespaces".to_string(),
            count: stats.namespaces.len(),
        },
    ];
    rows.extend(stats.nodes_by_type.iter().map(|(kind, count)| CountRow {
        key: format!("kind/{}", kind),
        count: *count,
    }));
    rows.extend(stats.edges_by_type.iter().map(|(t, count)| CountRow {
        key: format!("type/{}", t),
        count: *count,
    }));
    rows
}

#[derive(Tabled)]
pub struct CrdRow {
    #[tabled(rename = "NAME")]
    name: String,
    #[tabled(rename = "KIND")]
    kind: String,
    #[tabled(rename = "VERSION")]
    version: String,
    #[tabled(rename = "SCOPE")]
    scope: String,
}

impl From<&CrdInfo> for CrdRow {
    fn from(c: &CrdInfo) -> Self {
        Self {
            name: c.name.clone(),
            kind: c.kind.clone(),
            version: c.version.clone(),
            scope: format!("{:?}", c.scope),
        }
    }
}

#[derive(Tabled)]
pub struct RelationshipRow {
    #[tabled(rename = "SOURCE")]
    source: String,
    #[tabled(rename = "TYPE")]
    relationship_type: String,
    #[tabled(rename = "TARGET")]
    target: String,
    #[tabled(rename = "CONFIDENCE")]
    confidence: String,
}

impl From<&CrdRelationship> for RelationshipRow {
    fn from(r: &CrdRelationship) -> Self {
        Self {
            source: r.source.clone(),
            relationship_type: r.relationship_type.to_string(),
            target: r.target.clone(),
            confidence: format!("{:.2}", r.confidence),
        }
    }
}
