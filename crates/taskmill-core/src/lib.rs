//! `taskmill-core` — configuration and shared plumbing for the taskmill tools.
//!
//! Holds the figment-backed [`config::TaskmillConfig`] (TOML file plus
//! `TASKMILL_*` env overrides), the data-directory layout helpers, and the
//! git-based self-updater used by `taskmill self-update`.

pub mod config;
pub mod error;
pub mod update;

pub use config::TaskmillConfig;
pub use error::{CoreError, Result};
