//! Offline-first synchronisation between the remote catalog and the local
//! store.
//!
//! `SyncOrchestrator` answers first-page listings and details from the
//! local store when it can, and refreshes them in detached background tasks
//! (stale-while-revalidate). Everything else passes through to the remote.

pub mod orchestrator;

pub use orchestrator::SyncOrchestrator;
