//! Default configuration values

pub const BASE_URL: &str = "http://localhost:8080/api";
pub const NAMESPACE: &str = "default";

pub const RETRIEVAL_TIMEOUT_SECONDS: u64 = 30;
pub const RETRIEVAL_FALLBACK_TIMEOUT_SECONDS: u64 = 10;
pub const MAX_NODES: usize = 1000;
pub const FALLBACK_MAX_NODES: usize = 100;

pub const CRD_TIMEOUT_SECONDS: u64 = 10;
pub const CRD_FALLBACK_TIMEOUT_SECONDS: u64 = 5;
pub const MAX_RELATIONSHIPS: usize = 500;
pub const FALLBACK_MAX_RELATIONSHIPS: usize = 50;

pub const DEFAULT_DEPTH: usize = 2;
pub const REFRESH_INTERVAL_SECONDS: u64 = 30;

pub(super) fn base_url() -> String {
    BASE_URL.to_string()
}

pub(super) fn namespace() -> String {
    NAMESPACE.to_string()
}

pub(super) fn retrieval_timeout_seconds() -> u64 {
    RETRIEVAL_TIMEOUT_SECONDS
}

pub(super) fn retrieval_fallback_timeout_seconds() -> u64 {
    RETRIEVAL_FALLBACK_TIMEOUT_SECONDS
}

pub(super) fn max_nodes() -> usize {
    MAX_NODES
}

pub(super) fn fallback_max_nodes() -> usize {
    FALLBACK_MAX_NODES
}

pub(super) fn crd_timeout_seconds() -> u64 {
    CRD_TIMEOUT_SECONDS
}

pub(super) fn crd_fallback_timeout_seconds() -> u64 {
    CRD_FALLBACK_TIMEOUT_SECONDS
}

pub(super) fn max_relationships() -> usize {
    MAX_RELATIONSHIPS
}

pub(super) fn fallback_max_relationships() -> usize {
    FALLBACK_MAX_RELATIONSHIPS
}

pub(super) fn default_depth() -> usize {
    DEFAULT_DEPTH
}

pub(super) fn refresh_interval_seconds() -> u64 {
    REFRESH_INTERVAL_SECONDS
}

pub(super) fn default_true() -> bool {
    true
}
