//! Command implementations.

pub(crate) mod monitor;
