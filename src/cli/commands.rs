//! CLI command handlers

use super::output::{
    self, CrdRow, EdgeRow, NodeRow, OutputFormat, RelationshipRow, print_degradation,
};
use super::{Args, Command, FilterArgs, handle_config_command};
use anyhow::{Context, Result};
use kubegraph::config::{Config, ConfigLoader};
use kubegraph::graph::{
    self, CrdRelationshipOptions, CrdRelationshipResponse, CrdRelationshipType, DependencyGraph,
    ExportFormat, ExportOptions, GraphFilter, ResourceRef, ViewFilters,
};
use kubegraph::services::{GraphService, ViewSession};
use kubegraph::source::{
    DegradedGraphSource, FileGraphSource, GraphSource, HttpGraphSource, ServiceGraphSource,
};
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

/// Dispatch a parsed command line
pub async fn run(args: Args) -> Result<()> {
    let Args {
        source,
        offline,
        context,
        output: format,
        command,
        ..
    } = args;
    if let Command::Config { subcommand } = command {
        return handle_config_command(subcommand);
    }

    let config = ConfigLoader::load().context("Failed to load configuration")?;
    if let Err(e) = ConfigLoader::validate(&config) {
        tracing::warn!("Configuration problem: {:#}", e);
    }
    let selection = SourceSelection {
        file: source,
        offline,
        context: context.clone(),
    };
    let service = build_service(&selection, &config).await?;

    match command {
        Command::Graph {
            filter,
            edges,
            watch,
        } => {
            if watch {
                watch_graph(service, &config, &filter).await
            } else {
                let graph = fetch(&service, &config, &filter).await?;
                print_graph(&graph, edges, format)
            }
        }
        Command::Focus { id, depth, filter } => {
            let focus = graph::decode(&id)?.id();
            let graph = fetch(&service, &config, &filter).await?;
            let depth = depth.unwrap_or(config.view.default_depth);
            if graph.node(&focus).is_none() {
                anyhow::bail!("{} is not in the retrieved graph", focus);
            }
            let focused = graph::extract(&graph, &focus, depth).into_graph(&graph);
            print_graph(&focused, false, format)?;
            if format == OutputFormat::Table {
                println!();
                output::print_table(focused.edges.iter().map(EdgeRow::from).collect());
            }
            Ok(())
        }
        Command::Stats { filter } => {
            let graph = fetch(&service, &config, &filter).await?;
            let stats = graph::summarize(&graph);
            output::print_output(output::stats_rows(&stats), &stats, format)
        }
        Command::Export {
            format: export_format,
            file,
            focus,
            depth,
            raw,
            schema,
            dependency_metadata,
            filter,
        } => {
            let export_format: ExportFormat = export_format.parse()?;
            let mut graph = fetch(&service, &config, &filter).await?;
            if let Some(focus) = focus {
                let focus = graph::decode(&focus)?.id();
                let depth = depth.unwrap_or(config.view.default_depth);
                graph = graph::extract(&graph, &focus, depth).into_graph(&graph);
            }

            let crds: Option<CrdRelationshipResponse> = if schema {
                Some(
                    service
                        .crd_relationships(&CrdRelationshipOptions::default())
                        .await?,
                )
            } else {
                None
            };
            let options = ExportOptions {
                include_raw_graph: raw,
                include_schema_details: schema,
                include_dependency_metadata: dependency_metadata,
            };
            let payload = graph::export_with_schema(&graph, crds.as_ref(), export_format, &options)?;

            match file {
                Some(path) => {
                    std::fs::write(&path, &payload.content)
                        .with_context(|| format!("Failed to write {}", path.display()))?;
                    eprintln!("Exported {} to {}", payload.format, path.display());
                }
                None => print!("{}", payload.content),
            }
            Ok(())
        }
        Command::Crds {
            groups,
            crds,
            types,
            max,
            live,
        } => {
            if live {
                let client = kubegraph::kube::create_client(context.as_deref()).await?;
                let infos = kubegraph::kube::list_crds(client, &groups).await?;
                return output::print_output(
                    infos.iter().map(CrdRow::from).collect(),
                    &infos,
                    format,
                );
            }

            let relationship_types = types
                .iter()
                .map(|t| t.parse::<CrdRelationshipType>())
                .collect::<Result<Vec<_>, _>>()?;
            let options = CrdRelationshipOptions {
                api_groups: (!groups.is_empty()).then_some(groups),
                crds: (!crds.is_empty()).then_some(crds),
                max_relationships: max,
                relationship_types: (!relationship_types.is_empty()).then_some(relationship_types),
                include_metadata: None,
            };
            let response = service.crd_relationships(&options).await?;
            if let Some(degradation) = &response.metadata.degradation {
                eprintln!(
                    "warning: showing {:?} data ({})",
                    degradation.mode, degradation.cause
                );
            }
            match format {
                OutputFormat::Table => {
                    output::print_table(response.crds.iter().map(CrdRow::from).collect());
                    println!();
                    output::print_table(
                        response
                            .relationships
                            .iter()
                            .map(RelationshipRow::from)
                            .collect(),
                    );
                    Ok(())
                }
                OutputFormat::Json => output::print_json(&response),
                OutputFormat::Yaml => output::print_yaml(&response),
            }
        }
        Command::Deps { id } => {
            let resource: ResourceRef = id.parse()?;
            let deps = service.resource_dependencies(&resource).await?;
            match format {
                OutputFormat::Table => {
                    let set = &deps.dependencies;
                    for (title, edges) in [
                        ("Depends on", &set.outgoing),
                        ("Depended on by", &set.incoming),
                        ("Related", &set.related),
                    ] {
                        println!("{} ({})", title, edges.len());
                        output::print_table(edges.iter().map(EdgeRow::from).collect());
                        println!();
                    }
                    let peers = deps.peers();
                    if peers.skipped > 0 {
                        eprintln!("warning: {} peer ids could not be decoded", peers.skipped);
                    }
                    Ok(())
                }
                OutputFormat::Json => output::print_json(&deps),
                OutputFormat::Yaml => output::print_yaml(&deps),
            }
        }
        Command::Decode { ids } => {
            let batch = graph::decode_all(ids.iter().map(String::as_str));
            if batch.skipped > 0 {
                eprintln!("warning: skipped {} invalid ids", batch.skipped);
            }
            match format {
                OutputFormat::Table => {
                    for r in &batch.refs {
                        let scope = if r.is_cluster_scoped() {
                            "cluster"
                        } else {
                            "namespaced"
                        };
                        println!(
                            "{}\t{}\t{}\t{}",
                            r.kind,
                            r.name,
                            r.namespace.as_deref().unwrap_or("-"),
                            scope
                        );
                    }
                    Ok(())
                }
                OutputFormat::Json => output::print_json(&batch.refs),
                OutputFormat::Yaml => output::print_yaml(&batch.refs),
            }
        }
        // Handled before any configuration is loaded
        Command::Config { .. } => Ok(()),
    }
}

/// Source-related flags
struct SourceSelection {
    file: Option<PathBuf>,
    offline: bool,
    context: Option<String>,
}

/// Pick the graph source from flags and configuration
async fn build_service(selection: &SourceSelection, config: &Config) -> Result<GraphService> {
    let source: Arc<dyn GraphSource> = if selection.offline {
        Arc::new(DegradedGraphSource::new("offline mode"))
    } else if let Some(path) = &selection.file {
        Arc::new(FileGraphSource::new(path))
    } else if let Some(svc) = &config.collaborator.service {
        let client = kubegraph::kube::create_client(selection.context.as_deref()).await?;
        Arc::new(ServiceGraphSource::new(
            client,
            &svc.namespace,
            &svc.name,
            svc.port,
        ))
    } else {
        let timeout = Duration::from_secs(config.retrieval.timeout_seconds);
        Arc::new(HttpGraphSource::new(&config.collaborator.base_url, timeout)?)
    };

    tracing::debug!("Using {} graph source", source.source_type());
    Ok(GraphService::from_config(source, config))
}

fn to_filter(config: &Config, args: &FilterArgs) -> Result<GraphFilter> {
    let namespace = if args.all_namespaces {
        None
    } else {
        Some(
            args.namespace
                .clone()
                .unwrap_or_else(|| config.default_namespace.clone()),
        )
    };
    let filter = GraphFilter::from_raw(
        namespace,
        args.no_custom.then_some(false),
        &args.kinds,
        &args.types,
        args.max_nodes,
    )?;
    Ok(filter)
}

fn view_filters(args: &FilterArgs) -> ViewFilters {
    ViewFilters {
        search: args.search.clone().unwrap_or_default(),
        strong_only: args.strong_only,
        ..Default::default()
    }
}

async fn fetch(service: &GraphService, config: &Config, args: &FilterArgs) -> Result<DependencyGraph> {
    let filter = to_filter(config, args)?;
    let graph = service.retrieve(&filter).await?;
    print_degradation(&graph);
    Ok(view_filters(args).apply(&graph))
}

fn print_graph(graph: &DependencyGraph, edges: bool, format: OutputFormat) -> Result<()> {
    if edges {
        output::print_output(
            graph.edges.iter().map(EdgeRow::from).collect(),
            &graph.edges,
            format,
        )
    } else {
        match format {
            OutputFormat::Table => {
                output::print_table(graph.nodes.iter().map(NodeRow::from).collect());
                Ok(())
            }
            OutputFormat::Json => output::print_json(graph),
            OutputFormat::Yaml => output::print_yaml(graph),
        }
    }
}

/// Print a one-line summary on every refresh until Ctrl-C
async fn watch_graph(service: GraphService, config: &Config, args: &FilterArgs) -> Result<()> {
    let filter = to_filter(config, args)?;
    let view = view_filters(args);
    let interval = Duration::from_secs(config.view.refresh_interval_seconds.max(1));

    let mut session = ViewSession::new(service);
    let mut updates = session.subscribe();
    let initial = session.refresh(&filter).await?;
    print_degradation(&initial);

    session.start_auto_refresh(filter, interval, |result| {
        if let Err(e) = result {
            eprintln!("refresh failed: {}", e);
        }
    });

    loop {
        if let Some(graph) = updates.borrow_and_update().clone() {
            let stats = graph::summarize(&view.apply(&graph));
            println!(
                "{}  nodes={} edges={} strong={} weak={}{}",
                graph.metadata.timestamp.format("%H:%M:%S"),
                stats.total_nodes,
                stats.total_edges,
                stats.strong_dependencies,
                stats.weak_dependencies,
                if graph.is_degraded() { " (degraded)" } else { "" }
            );
        }
        tokio::select! {
            changed = updates.changed() => {
                if changed.is_err() {
                    break;
                }
            }
            _ = tokio::signal::ctrl_c() => break,
        }
    }

    session.stop_auto_refresh();
    Ok(())
}
