//! Token acquisition against the chat server's form endpoints.
//!
//! The server answers form posts with `303 See Other`. A good login points
//! at `/chat?token=<jwt>`; anything pointing back at `/login` is a
//! rejection. Registration keeps the credential in a session cookie, so one
//! [`AuthClient`] must be used for both steps.

#[cfg(test)]
#[path = "api_test.rs"]
mod api_test;

use reqwest::header::LOCATION;
use reqwest::redirect::Policy;
use reqwest::{StatusCode, Url};
use tracing::{debug, info};

#[derive(Debug, thiserror::Error)]
pub enum ApiError {
    #[error("http request failed: {0}")]
    Http(#[from] reqwest::Error),
    #[error("invalid base URL: {0}")]
    InvalidBaseUrl(String),
    #[error("{action} rejected with HTTP {status}")]
    Rejected { action: &'static str, status: u16 },
    #[error("invalid username or password")]
    InvalidCredentials,
    #[error("login redirect carried no token")]
    MissingToken,
}

pub struct AuthClient {
    http: reqwest::Client,
    base_url: Url,
}

impl AuthClient {
    pub fn new(base_url: &str) -> Result<Self, ApiError> {
        let base_url = Url::parse(base_url).map_err(|e| ApiError::InvalidBaseUrl(format!("{base_url}: {e}")))?;
        if !matches!(base_url.scheme(), "http" | "https") {
            return Err(ApiError::InvalidBaseUrl(base_url.to_string()));
        }
        let http = reqwest::Client::builder()
            .redirect(Policy::none())
            .cookie_store(true)
            .build()?;
        Ok(Self { http, base_url })
    }

    pub fn base_url(&self) -> &Url {
        &self.base_url
    }

    /// Create an account. The server remembers it in this client's cookies.
    pub async fn register(&self, username: &str, password: &str) -> Result<(), ApiError> {
        let location = self.post_form("register", username, password).await?;
        match location.as_deref() {
            Some(loc) if path_of(loc, &self.base_url).as_deref() == Some("/login") => {
                info!(%username, "registered chat account");
                Ok(())
            }
            _ => Err(ApiError::Rejected { action: "register", status: StatusCode::SEE_OTHER.as_u16() }),
        }
    }

    /// Log in and return the chat token from the redirect.
    pub async fn login(&self, username: &str, password: &str) -> Result<String, ApiError> {
        let Some(location) = self.post_form("login", username, password).await? else {
            return Err(ApiError::MissingToken);
        };
        if path_of(&location, &self.base_url).as_deref() == Some("/login") {
            return Err(ApiError::InvalidCredentials);
        }
        let token = token_from_location(&location, &self.base_url).ok_or(ApiError::MissingToken)?;
        info!(%username, "chat login succeeded");
        Ok(token)
    }

    /// Post credentials and return the redirect target, if any.
    async fn post_form(&self, action: &'static str, username: &str, password: &str) -> Result<Option<String>, ApiError> {
        let url = self
            .base_url
            .join(action)
            .map_err(|e| ApiError::InvalidBaseUrl(format!("{}: {e}", self.base_url)))?;
        let response = self
            .http
            .post(url)
            .form(&[("username", username), ("password", password)])
            .send()
            .await?;

        let status = response.status();
        debug!(action, status = status.as_u16(), "auth form posted");
        if !status.is_redirection() {
            return Err(ApiError::Rejected { action, status: status.as_u16() });
        }
        let Some(value) = response.headers().get(LOCATION) else {
            return Ok(None);
        };
        match value.to_str() {
            Ok(location) => Ok(Some(location.to_owned())),
            Err(_) => Err(ApiError::Rejected { action, status: status.as_u16() }),
        }
    }
}

/// Pull `token` out of a redirect target, relative or absolute.
pub fn token_from_location(location: &str, base: &Url) -> Option<String> {
    let Ok(url) = base.join(location) else {
        return None;
    };
    url.query_pairs()
        .find(|(key, _)| key == "token")
        .map(|(_, value)| value.into_owned())
        .filter(|token| !token.trim().is_empty())
}

fn path_of(location: &str, base: &Url) -> Option<String> {
    match base.join(location) {
        Ok(url) => Some(url.path().to_owned()),
        Err(_) => None,
    }
}
