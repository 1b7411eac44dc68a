//! Graph export
//!
//! Three representations are produced:
//! - `structured`: a JSON document that `import_structured` reads back with the
//!   same node and edge sets
//! - `tabular`: CSV with one row per edge
//! - `report`: a Markdown summary meant for people
//!
//! Only `structured` is lossless. The other two keep, per edge, the source,
//! target, type, strength and reason.

use super::crd::CrdRelationshipResponse;
use super::model::{DependencyGraph, GraphEdge, GraphMetadata, GraphNode};
use super::stats::{GraphStats, summarize};
use crate::error::GraphError;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::fmt::Write as _;
use std::str::FromStr;
use tabled::settings::Style;
use tabled::{Table, Tabled};

/// Output representation
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ExportFormat {
    Structured,
    Tabular,
    Report,
}

impl ExportFormat {
    pub fn as_str(&self) -> &'static str {
        match self {
            ExportFormat::Structured => "structured",
            ExportFormat::Tabular => "tabular",
            ExportFormat::Report => "report",
        }
    }

    pub fn file_extension(&self) -> &'static str {
        match self {
            ExportFormat::Structured => "json",
            ExportFormat::Tabular => "csv",
            ExportFormat::Report => "md",
        }
    }

    pub fn mime_type(&self) -> &'static str {
        match self {
            ExportFormat::Structured => "application/json",
            ExportFormat::Tabular => "text/csv",
            ExportFormat::Report => "text/markdown",
        }
    }
}

impl fmt::Display for ExportFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ExportFormat {
    type Err = GraphError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "structured" | "json" => Ok(ExportFormat::Structured),
            "tabular" | "csv" => Ok(ExportFormat::Tabular),
            "report" | "markdown" | "md" => Ok(ExportFormat::Report),
            other => Err(GraphError::InvalidFilter(format!(
                "unknown export format '{}' (expected structured, tabular or report)",
                other
            ))),
        }
    }
}

/// What to include beyond the per-edge essentials
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ExportOptions {
    /// Append the full graph JSON to the report
    #[serde(default)]
    pub include_raw_graph: bool,
    /// Include CRD details when schema data is attached
    #[serde(default)]
    pub include_schema_details: bool,
    /// Include edge field paths and controller flags in tabular and report output
    #[serde(default)]
    pub include_dependency_metadata: bool,
}

/// An exported graph, tagged with its format
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ExportPayload {
    pub format: ExportFormat,
    pub content: String,
}

impl ExportPayload {
    pub fn file_name(&self, stem: &str) -> String {
        format!("{}.{}", stem, self.format.file_extension())
    }
}

/// The structured export document
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StructuredExport {
    pub format: ExportFormat,
    pub exported_at: DateTime<Utc>,
    pub metadata: GraphMetadata,
    pub nodes: Vec<GraphNode>,
    pub edges: Vec<GraphEdge>,
    pub statistics: GraphStats,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub schema: Option<CrdRelationshipResponse>,
}

/// Export a graph
pub fn export(
    graph: &DependencyGraph,
    format: ExportFormat,
    options: &ExportOptions,
) -> Result<ExportPayload, GraphError> {
    export_with_schema(graph, None, format, options)
}

/// Export a graph together with CRD relationship data
pub fn export_with_schema(
    graph: &DependencyGraph,
    schema: Option<&CrdRelationshipResponse>,
    format: ExportFormat,
    options: &ExportOptions,
) -> Result<ExportPayload, GraphError> {
    let schema = schema.filter(|_| options.include_schema_details);
    let content = match format {
        ExportFormat::Structured => structured(graph, schema)?,
        ExportFormat::Tabular => tabular(graph, options),
        ExportFormat::Report => report(graph, schema, options)?,
    };
    tracing::debug!(
        "Exported {} nodes and {} edges as {}",
        graph.nodes.len(),
        graph.edges.len(),
        format
    );
    Ok(ExportPayload { format, content })
}

/// Read a structured export back into a snapshot
pub fn import_structured(content: &str) -> Result<DependencyGraph, GraphError> {
    let doc: StructuredExport = serde_json::from_str(content)?;
    if doc.format != ExportFormat::Structured {
        return Err(GraphError::MalformedResponse(format!(
            "expected a structured export, found '{}'",
            doc.format
        )));
    }
    let graph = DependencyGraph {
        metadata: doc.metadata,
        nodes: doc.nodes,
        edges: doc.edges,
    };
    graph.validate()?;
    Ok(graph)
}

fn structured(
    graph: &DependencyGraph,
    schema: Option<&CrdRelationshipResponse>,
) -> Result<String, GraphError> {
    let doc = StructuredExport {
        format: ExportFormat::Structured,
        exported_at: Utc::now(),
        metadata: graph.metadata.clone(),
        nodes: graph.nodes.clone(),
        edges: graph.edges.clone(),
        statistics: summarize(graph),
        schema: schema.cloned(),
    };
    Ok(serde_json::to_string_pretty(&doc)?)
}

fn tabular(graph: &DependencyGraph, options: &ExportOptions) -> String {
    let mut out = String::from("source,target,type,strength,reason");
    if options.include_dependency_metadata {
        out.push_str(",field,controller");
    }
    out.push('\n');

    for edge in &graph.edges {
        let mut row = vec![
            csv_field(&edge.source),
            csv_field(&edge.target),
            csv_field(edge.dependency_type.as_str()),
            csv_field(edge.strength.as_str()),
            csv_field(&edge.metadata.reason),
        ];
        if options.include_dependency_metadata {
            row.push(csv_field(edge.metadata.field.as_deref().unwrap_or_default()));
            row.push(
                edge.metadata
                    .controller
                    .map(|c| c.to_string())
                    .unwrap_or_default(),
            );
        }
        out.push_str(&row.join(","));
        out.push('\n');
    }
    out
}

/// Quote a CSV field when it contains a separator, quote or line break
fn csv_field(value: &str) -> String {
    if value.contains([',', '"', '\n', '\r']) {
        format!("\"{}\"", value.replace('"', "\"\""))
    } else {
        value.to_string()
    }
}

#[derive(Tabled)]
struct KindRow {
    #[tabled(rename = "Kind")]
    kind: String,
    #[tabled(rename = "Count")]
    count: usize,
}

#[derive(Tabled)]
struct EdgeRow {
    #[tabled(rename = "Source")]
    source: String,
    #[tabled(rename = "Target")]
    target: String,
    #[tabled(rename = "Type")]
    dependency_type: String,
    #[tabled(rename = "Strength")]
    strength: String,
    #[tabled(rename = "Reason")]
    reason: String,
}

#[derive(Tabled)]
struct DetailedEdgeRow {
    #[tabled(rename = "Source")]
    source: String,
    #[tabled(rename = "Target")]
    target: String,
    #[tabled(rename = "Type")]
    dependency_type: String,
    #[tabled(rename = "Strength")]
    strength: String,
    #[tabled(rename = "Reason")]
    reason: String,
    #[tabled(rename = "Field")]
    field: String,
    #[tabled(rename = "Controller")]
    controller: String,
}

#[derive(Tabled)]
struct CrdRow {
    #[tabled(rename = "CRD")]
    name: String,
    #[tabled(rename = "Kind")]
    kind: String,
    #[tabled(rename = "Group")]
    group: String,
    #[tabled(rename = "Version")]
    version: String,
    #[tabled(rename = "Scope")]
    scope: String,
}

#[derive(Tabled)]
struct CrdRelationshipRow {
    #[tabled(rename = "Source")]
    source: String,
    #[tabled(rename = "Target")]
    target: String,
    #[tabled(rename = "Type")]
    relationship_type: String,
    #[tabled(rename = "Confidence")]
    confidence: String,
    #[tabled(rename = "Reason")]
    reason: String,
}

/// Escape a Markdown table cell so it stays one cell on one line
fn markdown_cell(value: &str) -> String {
    value
        .replace('|', "\\|")
        .replace("\r\n", "<br>")
        .replace(['\n', '\r'], "<br>")
}

fn markdown_table<T: Tabled>(rows: Vec<T>) -> String {
    Table::new(rows).with(Style::markdown()).to_string()
}

fn report(
    graph: &DependencyGraph,
    schema: Option<&CrdRelationshipResponse>,
    options: &ExportOptions,
) -> Result<String, GraphError> {
    let stats = summarize(graph);
    let mut out = String::new();

    // Writing into a String cannot fail
    let _ = writeln!(out, "# Dependency Graph Report\n");
    if graph.is_placeholder() {
        let _ = writeln!(
            out,
            "> **Placeholder data.** The graph backend was unavailable; nothing below reflects the cluster.\n"
        );
    } else if let Some(degradation) = &graph.metadata.degradation {
        let _ = writeln!(
            out,
            "> Degraded snapshot ({:?}): {}\n",
            degradation.mode, degradation.cause
        );
    }
    let namespace = if graph.metadata.namespace.is_empty() {
        "all namespaces"
    } else {
        graph.metadata.namespace.as_str()
    };
    let _ = writeln!(out, "- Namespace: {}", namespace);
    let _ = writeln!(out, "- Snapshot: {}", graph.metadata.timestamp.to_rfc3339());
    let _ = writeln!(out, "- Resources: {}", stats.total_nodes);
    let _ = writeln!(
        out,
        "- Dependencies: {} ({} strong, {} weak)\n",
        stats.total_edges, stats.strong_dependencies, stats.weak_dependencies
    );

    if !stats.nodes_by_type.is_empty() {
        let _ = writeln!(out, "## Resources by kind\n");
        let rows = stats
            .nodes_by_type
            .iter()
            .map(|(kind, count)| KindRow {
                kind: markdown_cell(kind),
                count: *count,
            })
            .collect();
        let _ = writeln!(out, "{}\n", markdown_table::<KindRow>(rows));
    }

    if !graph.edges.is_empty() {
        let _ = writeln!(out, "## Dependencies\n");
        let table = if options.include_dependency_metadata {
            markdown_table::<DetailedEdgeRow>(
                graph
                    .edges
                    .iter()
                    .map(|e| DetailedEdgeRow {
                        source: markdown_cell(&e.source),
                        target: markdown_cell(&e.target),
                        dependency_type: e.dependency_type.to_string(),
                        strength: e.strength.to_string(),
                        reason: markdown_cell(&e.metadata.reason),
                        field: markdown_cell(e.metadata.field.as_deref().unwrap_or_default()),
                        controller: e
                            .metadata
                            .controller
                            .map(|c| c.to_string())
                            .unwrap_or_default(),
                    })
                    .collect(),
            )
        } else {
            markdown_table::<EdgeRow>(
                graph
                    .edges
                    .iter()
                    .map(|e| EdgeRow {
                        source: markdown_cell(&e.source),
                        target: markdown_cell(&e.target),
                        dependency_type: e.dependency_type.to_string(),
                        strength: e.strength.to_string(),
                        reason: markdown_cell(&e.metadata.reason),
                    })
                    .collect(),
            )
        };
        let _ = writeln!(out, "{}\n", table);
    }

    if let Some(schema) = schema {
        let _ = writeln!(out, "## Custom resource definitions\n");
        if schema.is_placeholder() {
            let _ = writeln!(out, "> **Placeholder data.** CRD analysis was unavailable.\n");
        }
        let crds = schema
            .crds
            .iter()
            .map(|c| CrdRow {
                name: markdown_cell(&c.name),
                kind: markdown_cell(&c.kind),
                group: markdown_cell(&c.group),
                version: markdown_cell(&c.version),
                scope: format!("{:?}", c.scope),
            })
            .collect();
        let _ = writeln!(out, "{}\n", markdown_table::<CrdRow>(crds));
        if !schema.relationships.is_empty() {
            let rels = schema
                .relationships
                .iter()
                .map(|r| CrdRelationshipRow {
                    source: markdown_cell(&r.source),
                    target: markdown_cell(&r.target),
                    relationship_type: r.relationship_type.to_string(),
                    confidence: format!("{:.2}", r.confidence),
                    reason: markdown_cell(&r.reason),
                })
                .collect();
            let _ = writeln!(out, "{}\n", markdown_table::<CrdRelationshipRow>(rels));
        }
    }

    if options.include_raw_graph {
        let _ = writeln!(out, "## Raw graph\n");
        let _ = writeln!(out, "```json\n{}\n```", serde_json::to_string_pretty(graph)?);
    }

    Ok(out)
}
