pub mod config;
pub mod health;
pub mod presigned;
pub mod registers;
pub mod upload_token;
pub mod uploads;
