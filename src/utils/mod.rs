//! Shared utilities: Arrow column helpers and logging.

pub mod arrow;
pub mod logging;
