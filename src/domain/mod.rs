//! Core domain model: projects, modules, vulnerabilities, and file trees
//!
//! Everything in this layer is a read-only snapshot of server-reported state.
//! Records are owned by the collection that fetched them; views render copies
//! and never mutate them.

pub mod file_tree;
pub mod module;
pub mod project;
pub mod vulnerability;

pub use file_tree::{FileNode, MatchType, NodeKind};
pub use module::ModuleRecord;
pub use project::{AnalysisRate, KnownProject, ProjectRef};
pub use vulnerability::{Severity, VulnerabilityRecord};
