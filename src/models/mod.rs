//! Data models for the admin API.
//!
//! The stores persist schema-less documents; these typed views are only used
//! at the HTTP boundary.

mod session;
mod subscription;

pub use session::*;
pub use subscription::*;
