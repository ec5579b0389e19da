//! Route handlers.

pub mod analyze;
pub mod info;
