//! Auth-domain scope lists, token secrets, and token sets.

pub mod scope;
pub mod token;

pub use scope::*;
pub use token::{secret::*, set::*};
