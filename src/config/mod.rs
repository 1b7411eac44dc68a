//! Configuration for kubegraph
//!
//! Built-in defaults, overridden by `config.yaml` in the config directory,
//! overridden by `KUBEGRAPH_*` environment variables.

mod defaults;
pub mod loader;
pub mod paths;
pub mod schema;

pub use loader::ConfigLoader;
pub use schema::{Config, CrdConfig, RetrievalConfig, ServiceRef, ViewConfig};

/// Keys accepted by `get_config_value` and `set_config_value`
pub const CONFIG_KEYS: &[&str] = &[
    "defaultNamespace",
    "collaborator.baseUrl",
    "collaborator.service",
    "retrieval.timeoutSeconds",
    "retrieval.fallbackTimeoutSeconds",
    "retrieval.maxNodes",
    "retrieval.fallbackMaxNodes",
    "retrieval.placeholderOnFailure",
    "crd.timeoutSeconds",
    "crd.fallbackTimeoutSeconds",
    "crd.maxRelationships",
    "crd.fallbackMaxRelationships",
    "view.defaultDepth",
    "view.refreshIntervalSeconds",
];

/// Get a configuration value by key (dot notation)
pub fn get_config_value(config: &schema::Config, key: &str) -> anyhow::Result<String> {
    match key {
        "defaultNamespace" => Ok(config.default_namespace.clone()),
        "collaborator.baseUrl" => Ok(config.collaborator.base_url.clone()),
        "collaborator.service" => Ok(config
            .collaborator
            .service
            .as_ref()
            .map(|s| format!("{}/{}:{}", s.namespace, s.name, s.port))
            .unwrap_or_default()),
        "retrieval.timeoutSeconds" => Ok(config.retrieval.timeout_seconds.to_string()),
        "retrieval.fallbackTimeoutSeconds" => {
            Ok(config.retrieval.fallback_timeout_seconds.to_string())
        }
        "retrieval.maxNodes" => Ok(config.retrieval.max_nodes.to_string()),
        "retrieval.fallbackMaxNodes" => Ok(config.retrieval.fallback_max_nodes.to_string()),
        "retrieval.placeholderOnFailure" => {
            Ok(config.retrieval.placeholder_on_failure.to_string())
        }
        "crd.timeoutSeconds" => Ok(config.crd.timeout_seconds.to_string()),
        "crd.fallbackTimeoutSeconds" => Ok(config.crd.fallback_timeout_seconds.to_string()),
        "crd.maxRelationships" => Ok(config.crd.max_relationships.to_string()),
        "crd.fallbackMaxRelationships" => Ok(config.crd.fallback_max_relationships.to_string()),
        "view.defaultDepth" => Ok(config.view.default_depth.to_string()),
        "view.refreshIntervalSeconds" => Ok(config.view.refresh_interval_seconds.to_string()),
        _ => Err(anyhow::anyhow!("Unknown configuration key: {}", key)),
    }
}

/// Set a configuration value by key (dot notation)
pub fn set_config_value(config: &mut schema::Config, key: &str, value: &str) -> anyhow::Result<()> {
    use anyhow::Context;
    match key {
        "defaultNamespace" => {
            config.default_namespace = value.to_string();
        }
        "collaborator.baseUrl" => {
            url::Url::parse(value).context("collaborator.baseUrl must be a valid URL")?;
            config.collaborator.base_url = value.to_string();
        }
        "collaborator.service" => {
            config.collaborator.service = if value.is_empty() {
                None
            } else {
                Some(parse_service_ref(value)?)
            };
        }
        "retrieval.timeoutSeconds" => {
            config.retrieval.timeout_seconds = value
                .parse()
                .context("retrieval.timeoutSeconds must be a number")?;
        }
        "retrieval.fallbackTimeoutSeconds" => {
            config.retrieval.fallback_timeout_seconds = value
                .parse()
                .context("retrieval.fallbackTimeoutSeconds must be a number")?;
        }
        "retrieval.maxNodes" => {
            config.retrieval.max_nodes = value
                .parse()
                .context("retrieval.maxNodes must be a number")?;
        }
        "retrieval.fallbackMaxNodes" => {
            config.retrieval.fallback_max_nodes = value
                .parse()
                .context("retrieval.fallbackMaxNodes must be a number")?;
        }
        "retrieval.placeholderOnFailure" => {
            config.retrieval.placeholder_on_failure = value
                .parse()
                .context("retrieval.placeholderOnFailure must be 'true' or 'false'")?;
        }
        "crd.timeoutSeconds" => {
            config.crd.timeout_seconds = value
                .parse()
                .context("crd.timeoutSeconds must be a number")?;
        }
        "crd.fallbackTimeoutSeconds" => {
            config.crd.fallback_timeout_seconds = value
                .parse()
                .context("crd.fallbackTimeoutSeconds must be a number")?;
        }
        "crd.maxRelationships" => {
            config.crd.max_relationships = value
                .parse()
                .context("crd.maxRelationships must be a number")?;
        }
        "crd.fallbackMaxRelationships" => {
            config.crd.fallback_max_relationships = value
                .parse()
                .context("crd.fallbackMaxRelationships must be a number")?;
        }
        "view.defaultDepth" => {
            config.view.default_depth = value
                .parse()
                .context("view.defaultDepth must be a number")?;
        }
        "view.refreshIntervalSeconds" => {
            config.view.refresh_interval_seconds = value
                .parse()
                .context("view.refreshIntervalSeconds must be a number")?;
        }
        _ => return Err(anyhow::anyhow!("Unknown configuration key: {}", key)),
    }

    Ok(())
}

/// Parse `namespace/name:port`
fn parse_service_ref(value: &str) -> anyhow::Result<ServiceRef> {
    let err = || {
        anyhow::anyhow!(
            "collaborator.service must look like namespace/name:port, got '{}'",
            value
        )
    };
    let (namespace, rest) = value.split_once('/').ok_or_else(err)?;
    let (name, port) = rest.rsplit_once(':').ok_or_else(err)?;
    if namespace.is_empty() || name.is_empty() {
        return Err(err());
    }
    Ok(ServiceRef {
        namespace: namespace.to_string(),
        name: name.to_string(),
        port: port.parse().map_err(|_| err())?,
    })
}
