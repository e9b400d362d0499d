//! CLI command implementations

pub mod bulk;
pub mod completions;
pub mod config;
pub mod export;
pub mod import;
pub mod init;
pub mod item;
pub mod stats;
pub mod tin;
