//! Data model shared by every component of the engine.

mod container;
mod image;
mod notification;
mod snapshot;
mod status;

//--------------------------------------------------------------------------------------------------
// Exports
//--------------------------------------------------------------------------------------------------

pub use container::*;
pub use image::*;
pub use notification::*;
pub use snapshot::*;
pub use status::*;
