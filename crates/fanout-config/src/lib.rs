//! Fanout Config
//!
//! This crate contains the serializable job configuration types for fanout.
//! A job names the database instances to reach, the SQL statements to run
//! against every one of them, and the executor settings for the run.
//!
//! Jobs are loaded from JSON files (via the CLI with `fanout run job.json`).
//! The executor takes these types, validates them, and expands them into the
//! cross product of tasks it schedules.

mod enums;
mod error;
mod instance;
mod job;
mod query;

pub use enums::{Driver, MergeOrder};
pub use error::ConfigError;
pub use instance::{InstanceDescriptor, Secret};
pub use job::{ContentKeyDef, JobDef, ProvenanceDef};
pub use query::QueryDef;
