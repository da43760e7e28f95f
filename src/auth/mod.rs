//! Authentication module
//!
//! The catalog authenticates with a long-lived refresh token that mints
//! short-lived API access tokens. The `Authenticator` validates both kinds,
//! mints and revokes access tokens, and writes the current access token
//! into the transport's shared token cell.

mod authenticator;
mod types;

pub use authenticator::{
    is_auth_path, Authenticator, CREATE_ACCESS_TOKEN_PATH, REVOKE_ACCESS_TOKENS_PATH,
    VALIDATE_ACCESS_TOKEN_PATH, VALIDATE_REFRESH_TOKEN_PATH,
};
pub use types::{parse_timestamp, AccessToken, Credential, RefreshToken, TokenStatus};
