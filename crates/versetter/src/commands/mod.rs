//! Command implementations

pub mod stamp;
