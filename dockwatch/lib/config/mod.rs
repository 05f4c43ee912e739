//! Engine configuration types and helpers.

mod defaults;
mod engine;
mod validate;

//--------------------------------------------------------------------------------------------------
// Exports
//--------------------------------------------------------------------------------------------------

pub use defaults::*;
pub use engine::*;
