//! lifeboard - Life Area Task Tree Library
//!
//! A hierarchical task tree split into life areas, with kanban boards per parent,
//! a calendar projection and a home dashboard. The `lb` binary is a thin CLI over it.
//!
//! # Core Concepts
//!
//! - **Tasks**: one entity type; top-level tasks under the root sentinel are life areas
//! - **Buckets**: `(parent, status)` groups whose `order` values define render order
//! - **Engine**: the in-memory collection, navigation state and change notifications
//! - **Views**: pure projections (board, calendar, dashboard, archive, search)
//!
//! # Module Organization
//!
//! - `cli`: Command-line interface using clap
//! - `config`: Configuration loading from `lifeboard.toml`
//! - `engine`: `TaskEngine`, the authoritative state holder
//! - `error`: Error types and result aliases
//! - `events`: Engine change events and the JSONL sink
//! - `lock`: File locking and atomic writes
//! - `output`: Shared human/JSON output
//! - `seed`: First-run seed tree
//! - `storage`: File-backed task store
//! - `store`: Persistence port trait and in-memory store
//! - `task`: Data model
//! - `tree`: Tree and presentation helpers
//! - `views`: Derived views

pub mod cli;
pub mod config;
pub mod engine;
pub mod error;
pub mod events;
pub mod lock;
pub mod output;
pub mod seed;
pub mod storage;
pub mod store;
pub mod task;
pub mod tree;
pub mod views;

pub use engine::TaskEngine;
pub use error::{Error, Result};
