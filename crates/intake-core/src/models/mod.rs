//! Data models for the application
//!
//! Request forms, broker payloads and response bodies, grouped by flow.

mod registration;
mod upload;

pub use registration::*;
pub use upload::*;
