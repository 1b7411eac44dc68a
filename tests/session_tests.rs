//! View session tests: last request wins and auto-refresh lifecycle

use async_trait::async_trait;
use kubegraph::error::{GraphError, ServiceError};
use kubegraph::graph::{
    CrdRelationshipOptions, CrdRelationshipResponse, DependencyGraph, GraphFilter, GraphNode,
    GraphQuery, ResourceDependencies, ResourceRef,
};
use kubegraph::services::{GraphService, ViewSession};
use kubegraph::source::GraphSource;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::time::Duration;
use tokio::sync::mpsc;

/// Numbers its responses; the first one can be made slow
#[derive(Default)]
struct CountingSource {
    calls: AtomicUsize,
    slow_first: Option<Duration>,
    failing: AtomicBool,
}

impl CountingSource {
    fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl GraphSource for CountingSource {
    async fn fetch_graph(&self, _query: &GraphQuery) -> Result<DependencyGraph, GraphError> {
        let n = self.calls.fetch_add(1, Ordering::SeqCst) + 1;
        if self.failing.load(Ordering::SeqCst) {
            return Err(GraphError::Transport("connection refused".to_string()));
        }
        if n == 1 {
            if let Some(delay) = self.slow_first {
                tokio::time::sleep(delay).await;
            }
        }
        let node = GraphNode::new("Pod", &format!("gen-{}", n), Some("default"));
        Ok(DependencyGraph::new("default", vec![node], vec![]))
    }

    async fn fetch_dependencies(
        &self,
        _resource: &ResourceRef,
    ) -> Result<ResourceDependencies, GraphError> {
        Err(GraphError::Transport("not served".to_string()))
    }

    async fn fetch_crd_relationships(
        &self,
        _options: &CrdRelationshipOptions,
    ) -> Result<CrdRelationshipResponse, GraphError> {
        Err(GraphError::Transport("not served".to_string()))
    }

    fn source_type(&self) -> &str {
        "counting"
    }
}

fn session_over(source: Arc<CountingSource>) -> ViewSession {
    ViewSession::new(GraphService::new(source))
}

fn current_name(session: &ViewSession) -> Option<String> {
    session.current().map(|g| g.nodes[0].name.clone())
}

#[tokio::test]
async fn test_stale_response_is_discarded() {
    let source = Arc::new(CountingSource {
        slow_first: Some(Duration::from_millis(300)),
        ..Default::default()
    });
    let session = session_over(source.clone());
    let filter = GraphFilter::default();

    let (first, second) = tokio::join!(session.refresh(&filter), async {
        tokio::time::sleep(Duration::from_millis(30)).await;
        session.refresh(&filter).await
    });

    assert_eq!(
        first.unwrap_err(),
        ServiceError::Superseded {
            sequence: 1,
            latest: 2
        }
    );
    assert_eq!(second.unwrap().nodes[0].name, "gen-2");
    assert_eq!(current_name(&session).as_deref(), Some("gen-2"));
    assert_eq!(session.latest_sequence(), 2);
}

#[tokio::test]
async fn test_failed_refresh_keeps_previous_snapshot() {
    let source = Arc::new(CountingSource::default());
    let session = session_over(source.clone());
    let filter = GraphFilter::default();

    session.refresh(&filter).await.unwrap();
    source.failing.store(true, Ordering::SeqCst);
    let err = session.refresh(&filter).await.unwrap_err();

    assert!(matches!(err, ServiceError::Graph(GraphError::Transport(_))));
    assert_eq!(current_name(&session).as_deref(), Some("gen-1"));
}

#[tokio::test]
async fn test_subscribers_see_each_snapshot() {
    let source = Arc::new(CountingSource::default());
    let session = session_over(source);
    let mut updates = session.subscribe();
    let filter = GraphFilter::default();

    session.refresh(&filter).await.unwrap();
    updates.changed().await.unwrap();
    let seen = updates.borrow_and_update().clone().unwrap();
    assert_eq!(seen.nodes[0].name, "gen-1");

    session.refresh(&filter).await.unwrap();
    updates.changed().await.unwrap();
    let seen = updates.borrow_and_update().clone().unwrap();
    assert_eq!(seen.nodes[0].name, "gen-2");
}

#[tokio::test]
async fn test_auto_refresh_publishes_until_stopped() {
    let source = Arc::new(CountingSource::default());
    let mut session = session_over(source.clone());
    let (tx, mut rx) = mpsc::unbounded_channel();

    session.start_auto_refresh(GraphFilter::default(), Duration::from_millis(20), move |result| {
        let _ = tx.send(result.map(|g| g.nodes[0].name.clone()));
    });
    assert!(session.is_auto_refreshing());

    for _ in 0..2 {
        let result = tokio::time::timeout(Duration::from_secs(5), rx.recv())
            .await
            .unwrap()
            .unwrap();
        assert!(result.is_ok());
    }
    assert!(session.current().is_some());

    session.stop_auto_refresh();
    assert!(!session.is_auto_refreshing());
    tokio::time::sleep(Duration::from_millis(50)).await;
    let calls = source.calls();
    tokio::time::sleep(Duration::from_millis(100)).await;
    assert_eq!(source.calls(), calls);
}

#[tokio::test]
async fn test_dropping_the_session_stops_auto_refresh() {
    let source = Arc::new(CountingSource::default());
    let mut session = session_over(source.clone());
    session.start_auto_refresh(GraphFilter::default(), Duration::from_millis(20), |_| {});

    tokio::time::sleep(Duration::from_millis(70)).await;
    drop(session);
    tokio::time::sleep(Duration::from_millis(50)).await;
    let calls = source.calls();
    assert!(calls >= 1);
    tokio::time::sleep(Duration::from_millis(100)).await;
    assert_eq!(source.calls(), calls);
}

#[tokio::test]
async fn test_focus_on_current_snapshot() {
    let source = Arc::new(CountingSource::default());
    let session = session_over(source);
    assert!(session.focus("Pod/gen-1@default", 1).is_none());

    session.refresh(&GraphFilter::default()).await.unwrap();
    let sub = session.focus("Pod/gen-1@default", 1).unwrap();
    assert_eq!(sub.nodes.len(), 1);
    assert!(session.focus("Pod/missing@default", 1).unwrap().nodes.is_empty());
}
