//! Editor-facing surface: command dispatch and tree item rendering

pub mod commands;
pub mod view;

pub use commands::{Command, CommandDispatcher};
pub use view::{Activation, TreeItemDescriptor};
