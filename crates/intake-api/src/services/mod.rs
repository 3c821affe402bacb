pub mod registration;

pub use registration::{validate_form, RegistrationService, Stage};
