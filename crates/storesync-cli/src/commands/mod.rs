//! CLI command implementations

pub mod count;
pub mod run;
pub mod search;
pub mod seed;
