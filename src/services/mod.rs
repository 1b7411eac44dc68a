//! Service layer
//!
//! Sits between callers (the CLI, or any view embedding the library) and a
//! `GraphSource`. Services own request budgets, degradation and the
//! "last request wins" bookkeeping; graph transformations stay pure in
//! `crate::graph`.

pub mod degradation;
pub mod graph_service;
pub mod session;

pub use degradation::DegradationPolicy;
pub use graph_service::GraphService;
pub use session::ViewSession;
