//! Upload authorization: token minting and the request gate.

pub mod middleware;
pub mod upload_token;

pub use middleware::upload_token_middleware;
pub use upload_token::{IssuedUploadToken, UploadTokenError, UploadTokenService};
