//! Terminal research assistant built from cooperating tool-calling agents.
//!
//! An orchestrator agent delegates to web-search, web-page and writing agents,
//! which act through sandboxed tools. The crate keeps a strict separation:
//!
//! - **[`core`]**: Pure logic (path normalization, text shaping, config merge).
//!   No I/O, fully testable in isolation.
//! - **[`io`]**: Side-effecting operations (filesystem, HTTP, subprocesses,
//!   configuration file).
//!
//! [`tools`] adapts `io` operations to the model-facing tool interface,
//! [`agents`] runs the chat loops over them, and [`repl`] drives the session.

pub mod agents;
pub mod core;
pub mod error;
pub mod exit_codes;
pub mod io;
pub mod logging;
pub mod repl;
#[cfg(any(test, feature = "test-support"))]
pub mod test_support;
pub mod tools;
