//! The monitoring backend collaborator.
//!
//! [`DashboardBackend`] is the seam between the engine and the remote REST service. [`HttpBackend`]
//! implements it over HTTP; tests substitute an in-memory fake.

mod http;
#[cfg(test)]
pub(crate) mod mock;
mod traits;

//--------------------------------------------------------------------------------------------------
// Exports
//--------------------------------------------------------------------------------------------------

pub use http::*;
pub use traits::*;
