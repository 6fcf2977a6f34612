//! Pure helpers: no I/O, fully testable in isolation.

pub mod format;
pub mod merge;
pub mod path;
pub mod text;
