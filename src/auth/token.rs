//! Token models handed back to gateway callers.

pub mod secret;
pub mod set;
