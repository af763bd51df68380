//! Data models shared by the extraction stages.
//!
//! Everything here is plain data: built once by one stage and handed read-only to the next.

mod manifest;
mod platform;
mod tables;
mod tenant;

pub use manifest::*;
pub use platform::*;
pub use tables::*;
pub use tenant::*;
