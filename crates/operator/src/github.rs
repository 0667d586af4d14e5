// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! GitHub App installation token exchange.
//!
//! A Workspace may point at a Secret carrying a GitHub App triple
//! (`appID`, `installationID`, `privateKey`). The resolver signs a
//! short-lived RS256 JWT as the App and trades it for an installation
//! token, which is then materialized as a per-Task Secret the Job mounts
//! as `GITHUB_TOKEN`.

use chrono::{DateTime, Utc};
use jsonwebtoken::{encode, Algorithm, EncodingKey, Header};
use k8s_openapi::api::core::v1::Secret;
use serde::{Deserialize, Serialize};
use thiserror::Error;

const DEFAULT_API: &str = "https://api.github.com";

/// Secret data keys forming the GitHub App triple.
const APP_ID_KEY: &str = "appID";
const INSTALLATION_ID_KEY: &str = "installationID";
const PRIVATE_KEY_KEY: &str = "privateKey";

/// Claim lifetime: issued 60 s in the past to absorb clock skew, expiring
/// after ten minutes, the maximum GitHub accepts.
const IAT_BACKDATE_SECS: i64 = 60;
const EXP_AHEAD_SECS: i64 = 600;

#[derive(Debug, Error)]
pub enum GitHubTokenError {
    #[error("secret is missing key {0:?}")]
    MissingKey(&'static str),

    #[error("secret key {0:?} is not UTF-8")]
    NotUtf8(&'static str),

    #[error("parsing RSA private key: {0}")]
    InvalidKey(#[from] jsonwebtoken::errors::Error),

    #[error("GitHub API request failed: {0}")]
    Http(#[from] reqwest::Error),

    #[error("GitHub API returned status {status}: {body}")]
    Status { status: u16, body: String },
}

/// The App triple read out of a Workspace secret.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GitHubAppCredentials {
    pub app_id: String,
    pub installation_id: String,
    pub private_key_pem: String,
}

impl GitHubAppCredentials {
    /// Detect the triple in a Secret's data. `None` means the Secret is a
    /// plain token secret and the App flow does not apply.
    pub fn from_secret(secret: &Secret) -> Option<Result<Self, GitHubTokenError>> {
        let data = secret.data.as_ref()?;
        if !data.contains_key(APP_ID_KEY)
            || !data.contains_key(INSTALLATION_ID_KEY)
            || !data.contains_key(PRIVATE_KEY_KEY)
        {
            return None;
        }
        Some(Self::read(secret))
    }

    fn read(secret: &Secret) -> Result<Self, GitHubTokenError> {
        Ok(Self {
            app_id: string_key(secret, APP_ID_KEY)?,
            installation_id: string_key(secret, INSTALLATION_ID_KEY)?,
            private_key_pem: string_key(secret, PRIVATE_KEY_KEY)?,
        })
    }
}

fn string_key(secret: &Secret, key: &'static str) -> Result<String, GitHubTokenError> {
    let bytes = secret
        .data
        .as_ref()
        .and_then(|d| d.get(key))
        .ok_or(GitHubTokenError::MissingKey(key))?;
    String::from_utf8(bytes.0.clone()).map_err(|_| GitHubTokenError::NotUtf8(key))
}

#[derive(Debug, Serialize)]
struct AppClaims {
    iss: String,
    iat: i64,
    exp: i64,
}

/// Sign the App JWT. PKCS#1 and PKCS#8 PEMs are both accepted.
pub fn make_app_jwt(
    creds: &GitHubAppCredentials,
    now: DateTime<Utc>,
) -> Result<String, GitHubTokenError> {
    let key = EncodingKey::from_rsa_pem(creds.private_key_pem.as_bytes())?;
    let claims = AppClaims {
        iss: creds.app_id.clone(),
        iat: now.timestamp() - IAT_BACKDATE_SECS,
        exp: now.timestamp() + EXP_AHEAD_SECS,
    };
    Ok(encode(&Header::new(Algorithm::RS256), &claims, &key)?)
}

/// An installation token as returned by GitHub.
#[derive(Debug, Clone, Deserialize, PartialEq, Eq)]
pub struct InstallationToken {
    pub token: String,
    pub expires_at: String,
}

/// Thin client for the installation token endpoint.
pub struct InstallationTokenClient {
    api_base: String,
    client: reqwest::Client,
}

impl Default for InstallationTokenClient {
    fn default() -> Self {
        Self::new(DEFAULT_API)
    }
}

impl InstallationTokenClient {
    pub fn new(api_base: impl Into<String>) -> Self {
        Self { api_base: api_base.into(), client: reqwest::Client::new() }
    }

    /// POST `/app/installations/{id}/access_tokens` with the App JWT.
    /// Anything but 201 Created is an error surface.
    pub async fn fetch(
        &self,
        creds: &GitHubAppCredentials,
    ) -> Result<InstallationToken, GitHubTokenError> {
        let jwt = make_app_jwt(creds, Utc::now())?;
        let url = format!(
            "{}/app/installations/{}/access_tokens",
            self.api_base.trim_end_matches('/'),
            creds.installation_id
        );
        let resp = self
            .client
            .post(url)
            .bearer_auth(jwt)
            .header("User-Agent", "axon-operator")
            .header("Accept", "application/vnd.github+json")
            .send()
            .await?;

        let status = resp.status();
        if status.as_u16() != 201 {
            let body = resp.text().await.unwrap_or_default();
            return Err(GitHubTokenError::Status { status: status.as_u16(), body });
        }
        Ok(resp.json().await?)
    }
}

#[cfg(test)]
#[path = "github_tests.rs"]
mod tests;
