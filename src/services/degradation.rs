//! Retry, fallback and placeholder policy for collaborator requests
//!
//! A request runs as: primary attempt, then at most one reduced fallback
//! attempt, then optionally placeholder data. Only transport-class failures
//! (`Transport`, `Timeout`) move to the next stage; malformed responses,
//! invalid filters and cancellation surface immediately.

use crate::error::GraphError;
use crate::graph::{CrdRelationshipResponse, DegradationMode, DependencyGraph};
use std::future::Future;
use std::pin::Pin;
use std::time::Duration;
use tokio_util::sync::CancellationToken;

/// One attempt at a collaborator request
pub type Attempt<'a, T> = Pin<Box<dyn Future<Output = Result<T, GraphError>> + Send + 'a>>;

/// Budgets for one kind of request
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DegradationPolicy {
    pub timeout: Duration,
    pub fallback_timeout: Duration,
    /// Size limit sent with the primary request when the caller sets none
    pub limit: usize,
    /// Upper bound of the fallback request's size limit
    pub fallback_limit: usize,
    pub placeholder_on_failure: bool,
}

impl DegradationPolicy {
    /// Defaults for graph retrieval
    pub fn graph() -> Self {
        Self {
            timeout: Duration::from_secs(30),
            fallback_timeout: Duration::from_secs(10),
            limit: 1000,
            fallback_limit: 100,
            placeholder_on_failure: true,
        }
    }

    /// Defaults for CRD relationship analysis, tighter for interactive use
    pub fn crd() -> Self {
        Self {
            timeout: Duration::from_secs(10),
            fallback_timeout: Duration::from_secs(5),
            limit: 500,
            fallback_limit: 50,
            placeholder_on_failure: true,
        }
    }

    /// Limit for the fallback request after a primary request for `requested`
    ///
    /// `None` when no limit both at least 1 and strictly below `requested`
    /// exists; the fallback is skipped then.
    pub fn fallback_limit_for(&self, requested: usize) -> Option<usize> {
        let limit = self.fallback_limit.min(requested / 2);
        (limit >= 1 && limit < requested).then_some(limit)
    }

    /// Fallback timeout, clamped to stay strictly below the primary timeout
    pub fn effective_fallback_timeout(&self) -> Duration {
        if self.fallback_timeout < self.timeout {
            self.fallback_timeout
        } else {
            self.timeout / 2
        }
    }
}

/// Build an attempt that calls `f` only when first polled, so nothing is sent
/// for a stage that never runs
pub fn deferred<'a, T, F, Fut>(f: F) -> Attempt<'a, T>
where
    F: FnOnce() -> Fut + Send + 'a,
    Fut: Future<Output = Result<T, GraphError>> + Send + 'a,
{
    Box::pin(async move { f().await })
}

/// Run `attempt` within `timeout`, giving up early when `cancel` fires
pub async fn bounded<T, F>(
    attempt: F,
    timeout: Duration,
    cancel: &CancellationToken,
) -> Result<T, GraphError>
where
    F: Future<Output = Result<T, GraphError>>,
{
    tokio::select! {
        biased;
        _ = cancel.cancelled() => Err(GraphError::Cancelled),
        result = tokio::time::timeout(timeout, attempt) => match result {
            Ok(inner) => inner,
            Err(_) => Err(GraphError::Timeout(timeout)),
        },
    }
}

/// Responses that can be checked and tagged as degraded
pub trait Degradable: Sized {
    /// Check the response invariants
    fn check(&self) -> Result<(), GraphError>;

    fn degrade(self, mode: DegradationMode, cause: String) -> Self;
}

impl Degradable for DependencyGraph {
    fn check(&self) -> Result<(), GraphError> {
        self.validate()
    }

    fn degrade(self, mode: DegradationMode, cause: String) -> Self {
        self.with_degradation(mode, cause)
    }
}

impl Degradable for CrdRelationshipResponse {
    fn check(&self) -> Result<(), GraphError> {
        self.validate()
    }

    fn degrade(self, mode: DegradationMode, cause: String) -> Self {
        self.with_degradation(mode, cause)
    }
}

/// The stages of one degradable request
pub struct Stages<'a, T> {
    pub primary: Attempt<'a, T>,
    pub fallback: Option<Attempt<'a, T>>,
    pub placeholder: Option<Attempt<'a, T>>,
}

/// Run a request through the policy
///
/// On success after degradation the result carries a marker naming the
/// stage and the failures that led there. When every stage fails the
/// primary failure is returned.
pub async fn execute<T: Degradable>(
    what: &str,
    policy: &DegradationPolicy,
    cancel: &CancellationToken,
    stages: Stages<'_, T>,
) -> Result<T, GraphError> {
    let primary_err = match checked(bounded(stages.primary, policy.timeout, cancel).await) {
        Ok(value) => return Ok(value),
        Err(e) if !e.is_transport() => {
            if e != GraphError::Cancelled {
                tracing::error!("{} failed: {}", what, e);
            }
            return Err(e);
        }
        Err(e) => e,
    };
    let mut cause = primary_err.to_string();

    if let Some(fallback) = stages.fallback {
        tracing::warn!("{} failed ({}), retrying with reduced request", what, cause);
        match checked(bounded(fallback, policy.effective_fallback_timeout(), cancel).await) {
            Ok(value) => {
                tracing::warn!("{} degraded to fallback data", what);
                return Ok(value.degrade(DegradationMode::Fallback, cause));
            }
            Err(e) if !e.is_transport() => {
                if e != GraphError::Cancelled {
                    tracing::error!("{} fallback failed: {}", what, e);
                }
                return Err(e);
            }
            Err(e) => cause = format!("{}; fallback: {}", cause, e),
        }
    }

    if policy.placeholder_on_failure {
        if let Some(placeholder) = stages.placeholder {
            match placeholder.await {
                Ok(value) => {
                    tracing::warn!("{} unavailable ({}), showing placeholder data", what, cause);
                    return Ok(value.degrade(DegradationMode::Placeholder, cause));
                }
                Err(e) => cause = format!("{}; placeholder: {}", cause, e),
            }
        }
    }

    tracing::error!("{} failed: {}", what, cause);
    Err(primary_err)
}

fn checked<T: Degradable>(result: Result<T, GraphError>) -> Result<T, GraphError> {
    let value = result?;
    value.check()?;
    Ok(value)
}
