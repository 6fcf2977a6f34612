//! Side-effecting operations: filesystem, subprocesses, HTTP and configuration.

pub mod compiler;
pub mod config;
pub mod document;
pub mod fetch;
pub mod files;
pub mod process;
pub mod templates;
pub mod workspace;
