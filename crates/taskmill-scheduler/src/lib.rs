//! `taskmill-scheduler` — the reconciliation loop that keeps an in-process
//! trigger-registration map in sync with the task table.
//!
//! # Overview
//!
//! The [`reconciler::Reconciler`] re-derives its full registration set from
//! the store every refresh interval instead of applying incremental deltas,
//! so a pass interrupted halfway converges on the next cycle. A separate
//! one-second tick fires due registrations; each fired run is spawned as its
//! own tokio task so a long script never stalls the loop.

pub mod reconciler;

pub use reconciler::Reconciler;
