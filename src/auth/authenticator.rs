//! Authenticator implementation
//!
//! Drives the refresh-token → access-token lifecycle and installs the
//! current access token into the shared transport.

use super::types::{AccessToken, Credential, RefreshToken};
use crate::error::{Error, Result};
use crate::http::{HttpClient, Response, ResponseBody};
use crate::results::JobResult;
use serde::de::DeserializeOwned;
use serde_json::{json, Value};
use tokio::sync::Mutex;
use tracing::{debug, info};

/// Validates a refresh token
pub const VALIDATE_REFRESH_TOKEN_PATH: &str = "/integration/v1/validateRefreshToken/";
/// Mints an access token from a refresh token
pub const CREATE_ACCESS_TOKEN_PATH: &str = "/integration/v1/createAPIAccessToken/";
/// Validates an access token
pub const VALIDATE_ACCESS_TOKEN_PATH: &str = "/integration/v1/validateAPIAccessToken/";
/// Revokes every access token minted from a refresh token
pub const REVOKE_ACCESS_TOKENS_PATH: &str = "/integration/v1/revokeAPIAccessTokens/";

const AUTH_PATHS: [&str; 4] = [
    VALIDATE_REFRESH_TOKEN_PATH,
    CREATE_ACCESS_TOKEN_PATH,
    VALIDATE_ACCESS_TOKEN_PATH,
    REVOKE_ACCESS_TOKENS_PATH,
];

/// Check whether a URL path is one of the token endpoints
///
/// Matches on the path suffix so a base URL with a path prefix still
/// resolves to the same endpoints.
pub fn is_auth_path(path: &str) -> bool {
    AUTH_PATHS
        .iter()
        .any(|p| path.ends_with(p) || path.ends_with(p.trim_end_matches('/')))
}

/// Status synthesized when a validation endpoint reports `failed`
const UNAUTHORIZED: u16 = 401;
/// Status synthesized when a mutating token endpoint reports `failed`
const BAD_REQUEST: u16 = 400;

/// Owns the current credential and keeps the transport's token in sync
///
/// Every mutation of the credential happens under one async mutex, so two
/// callers never refresh at the same time.
pub struct Authenticator {
    client: HttpClient,
    user_id: i64,
    refresh_token: String,
    current: Mutex<Option<Credential>>,
}

impl Authenticator {
    /// Create an authenticator sharing `client`'s token cell
    pub fn new(client: HttpClient, user_id: i64, refresh_token: impl Into<String>) -> Self {
        Self {
            client,
            user_id,
            refresh_token: refresh_token.into(),
            current: Mutex::new(None),
        }
    }

    pub fn user_id(&self) -> i64 {
        self.user_id
    }

    /// The credential most recently obtained or validated
    pub async fn current(&self) -> Option<Credential> {
        self.current.lock().await.clone()
    }

    /// Validate a refresh token (the configured one when `token` is `None`)
    pub async fn validate_refresh_token(&self, token: Option<&str>) -> Result<RefreshToken> {
        let mut current = self.current.lock().await;
        let refresh = self.fetch_refresh_token(token).await?;
        *current = Some(Credential::Refresh(refresh.clone()));
        Ok(refresh)
    }

    /// Mint a new access token and install it into the transport
    ///
    /// The refresh token is validated first; if the server does not report
    /// it `ACTIVE` no access token is requested.
    pub async fn create_access_token(&self) -> Result<AccessToken> {
        let mut current = self.current.lock().await;
        let access = self.mint_access_token().await?;
        *current = Some(Credential::Access(access.clone()));
        Ok(access)
    }

    /// Validate an access token (the transport's current one when `token`
    /// is `None`)
    pub async fn validate_access_token(&self, token: Option<&str>) -> Result<AccessToken> {
        let token = match token {
            Some(t) => t.to_string(),
            None => self
                .client
                .token()
                .ok_or_else(|| Error::unauthenticated("no access token to validate"))?,
        };
        let response = self
            .client
            .post(
                VALIDATE_ACCESS_TOKEN_PATH,
                &json!({"api_access_token": token, "user_id": self.user_id}),
            )
            .await?;
        let mut access: AccessToken = parse_token_record(&response, UNAUTHORIZED)?;
        if access.api_access_token.is_empty() {
            access.api_access_token = token;
        }
        debug!(status = %access.token_status, "Validated access token");
        Ok(access)
    }

    /// Revoke every access token minted from the refresh token
    ///
    /// The transport's token is cleared on success.
    pub async fn revoke_access_tokens(&self) -> Result<JobResult> {
        let mut current = self.current.lock().await;
        let response = self.client.post(REVOKE_ACCESS_TOKENS_PATH, &self.refresh_body(None)).await?;
        check_semantic_failure(&response, BAD_REQUEST)?;

        self.client.set_token(None);
        if matches!(*current, Some(Credential::Access(_))) {
            *current = None;
        }
        info!(user_id = self.user_id, "Revoked API access tokens");
        Ok(JobResult::successful(response.body.into_json()))
    }

    /// Make sure the transport holds an active access token
    ///
    /// The access token obtained earlier is reused without a request while
    /// it is active and not about to expire. A token put into the transport
    /// from elsewhere (a pre-issued one) is validated first. Otherwise a
    /// new token is minted from the refresh token.
    pub async fn ensure_access_token(&self) -> Result<String> {
        let mut current = self.current.lock().await;
        let token = self.client.token();

        if let (Some(token), Some(Credential::Access(access))) = (&token, current.as_ref()) {
            if access.api_access_token == *token && access.is_usable() {
                return Ok(token.clone());
            }
        }

        if let Some(token) = token {
            match self.validate_access_token(Some(&token)).await {
                Ok(access) if access.is_usable() => {
                    *current = Some(Credential::Access(access));
                    return Ok(token);
                }
                Ok(access) => {
                    debug!(
                        status = %access.token_status,
                        "Access token not usable, minting a new one"
                    );
                }
                Err(e) if e.status() == Some(UNAUTHORIZED) => {
                    debug!(error = %e, "Access token rejected, minting a new one");
                }
                Err(e) => return Err(e),
            }
        }

        if self.refresh_token.is_empty() {
            return Err(Error::unauthenticated(
                "no usable access token and no refresh token configured",
            ));
        }

        let access = self.mint_access_token().await?;
        let token = access.api_access_token.clone();
        *current = Some(Credential::Access(access));
        Ok(token)
    }

    async fn fetch_refresh_token(&self, token: Option<&str>) -> Result<RefreshToken> {
        let response = self
            .client
            .post(VALIDATE_REFRESH_TOKEN_PATH, &self.refresh_body(token))
            .await?;
        let mut refresh: RefreshToken = parse_token_record(&response, UNAUTHORIZED)?;
        if refresh.refresh_token.is_empty() {
            refresh.refresh_token = token.unwrap_or(&self.refresh_token).to_string();
        }
        debug!(status = %refresh.token_status, "Validated refresh token");
        Ok(refresh)
    }

    async fn mint_access_token(&self) -> Result<AccessToken> {
        let refresh = self.fetch_refresh_token(None).await?;
        if !refresh.token_status.is_active() {
            return Err(Error::http_status(
                UNAUTHORIZED,
                self.client.build_url(VALIDATE_REFRESH_TOKEN_PATH)?.as_str(),
                ResponseBody::Json(json!({
                    "status": "failed",
                    "msg": format!("refresh token is {}", refresh.token_status),
                })),
            ));
        }

        let response = self
            .client
            .post(CREATE_ACCESS_TOKEN_PATH, &self.refresh_body(None))
            .await?;
        let access: AccessToken = parse_token_record(&response, BAD_REQUEST)?;
        if access.api_access_token.is_empty() {
            return Err(Error::http_status(
                BAD_REQUEST,
                response.url.as_str(),
                response.body,
            ));
        }

        self.client.set_token(Some(access.api_access_token.clone()));
        info!(user_id = access.user_id, "Created API access token");
        Ok(access)
    }

    fn refresh_body(&self, token: Option<&str>) -> Value {
        json!({
            "refresh_token": token.unwrap_or(&self.refresh_token),
            "user_id": self.user_id,
        })
    }
}

impl std::fmt::Debug for Authenticator {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Authenticator")
            .field("user_id", &self.user_id)
            .field("refresh_token", &"<redacted>")
            .finish_non_exhaustive()
    }
}

/// Re-raise a success response whose body says `status: failed`
fn check_semantic_failure(response: &Response, status: u16) -> Result<()> {
    let failed = response
        .body
        .as_json()
        .and_then(|b| b.get("status"))
        .and_then(Value::as_str)
        .is_some_and(|s| s.eq_ignore_ascii_case("failed"));
    if failed {
        return Err(Error::http_status(
            status,
            response.url.as_str(),
            response.body.clone(),
        ));
    }
    Ok(())
}

fn parse_token_record<T: DeserializeOwned>(response: &Response, failed_status: u16) -> Result<T> {
    check_semantic_failure(response, failed_status)?;
    response.json()
}
