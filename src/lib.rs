//! filetidy - organize files into a categorized target tree
//!
//! This library scans source directories, classifies each file by type, date,
//! size, or extension, and moves it into a structured target tree. Runs are
//! journaled for undo, duplicate contents are detected by hash, emptied source
//! folders are swept away, and system directories are never touched.

pub mod categories;
pub mod classifier;
pub mod cli;
pub mod config;
pub mod engine;
pub mod guard;
pub mod hasher;
pub mod journal;
pub mod output;
pub mod reaper;
pub mod resolver;
pub mod scanner;
pub mod undo;

pub use categories::CategoryTable;
pub use classifier::OrganizationMode;
pub use config::{ConfigError, EngineConfig};
pub use engine::{
    EngineError, OrganizePlan, Organizer, PreviewReport, RunReport, RunStatistics,
};
pub use resolver::DuplicateHandling;
pub use undo::{UndoEngine, UndoReport};

pub use cli::{Cli, run};
