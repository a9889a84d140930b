//! Workspace façade crate.
//!
//! Re-exports the [`core_service`] API so hosts can depend on a single crate.

#[cfg(feature = "desktop-shims")]
pub use core_service::*;
