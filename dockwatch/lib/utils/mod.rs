//! Utility functions and types.

mod env;
mod time;

//--------------------------------------------------------------------------------------------------
// Exports
//--------------------------------------------------------------------------------------------------

pub use env::*;
pub use time::*;
