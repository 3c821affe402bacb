//! Intake API Library
//!
//! HTTP handlers, upload authorization, registration dispatch and application setup.

pub mod api_doc;
pub mod auth;
pub mod error;
pub mod handlers;
pub mod response;
pub mod services;
pub mod setup;
pub mod state;
pub mod utils;

pub use error::{ErrorResponse, HttpAppError};
pub use state::AppState;
