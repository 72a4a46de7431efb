//! Service account authorization for Google APIs.
//!
//! A service account key signs a short-lived RS256 assertion which the
//! token endpoint exchanges for a bearer access token.

use std::path::Path;

use chrono::Utc;
use jsonwebtoken::{Algorithm, EncodingKey, Header, encode};
use reqwest::Client;
use serde::{Deserialize, Serialize};

use crate::error::{AppError, Result};
use crate::models::CredentialSource;
use crate::utils::http::first_line;

/// Read-only access to spreadsheet values.
pub const SHEETS_SCOPE: &str = "https://www.googleapis.com/auth/spreadsheets.readonly";
/// Read-only access to Drive files, for mirrored images.
pub const DRIVE_SCOPE: &str = "https://www.googleapis.com/auth/drive.readonly";

const JWT_BEARER_GRANT: &str = "urn:ietf:params:oauth:grant-type:jwt-bearer";
const ASSERTION_LIFETIME_SECS: i64 = 3600;

/// The fields of a service account key file we use.
#[derive(Debug, Clone, Deserialize)]
pub struct ServiceAccountKey {
    pub client_email: String,
    pub private_key: String,
    #[serde(default)]
    pub private_key_id: Option<String>,
    #[serde(default = "default_token_uri")]
    pub token_uri: String,
}

fn default_token_uri() -> String {
    "https://oauth2.googleapis.com/token".to_string()
}

/// Claims of the signed assertion.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct AssertionClaims {
    pub iss: String,
    pub scope: String,
    pub aud: String,
    pub iat: i64,
    pub exp: i64,
}

/// Bearer token returned by the token endpoint.
#[derive(Debug, Clone, Deserialize)]
pub struct AccessToken {
    pub access_token: String,
    #[serde(default)]
    pub expires_in: Option<u64>,
}

impl ServiceAccountKey {
    /// Load the key from its configured source.
    pub fn load(source: &CredentialSource) -> Result<Self> {
        match source {
            CredentialSource::Inline(json) => {
                log::info!("Authenticating using SERVICE_ACCOUNT_JSON environment variable");
                Self::parse(json).map_err(|e| {
                    AppError::auth(format!("Error parsing SERVICE_ACCOUNT_JSON: {e}"))
                })
            }
            CredentialSource::File(path) => {
                log::info!("Authenticating using credentials file at {}", path.display());
                Self::read_file(path)
            }
        }
    }

    fn read_file(path: &Path) -> Result<Self> {
        if !path.exists() {
            return Err(AppError::config(format!(
                "Credentials file not found at {}. Ensure the file exists or set CREDENTIALS_PATH.",
                path.display()
            )));
        }
        let content = std::fs::read_to_string(path)?;
        Self::parse(&content).map_err(|e| {
            AppError::auth(format!(
                "Error parsing credentials file {}: {e}",
                path.display()
            ))
        })
    }

    pub fn parse(json: &str) -> serde_json::Result<Self> {
        serde_json::from_str(json)
    }

    /// Claims for an assertion issued at `issued_at` (unix seconds).
    pub fn claims(&self, scopes: &[&str], issued_at: i64) -> AssertionClaims {
        AssertionClaims {
            iss: self.client_email.clone(),
            scope: scopes.join(" "),
            aud: self.token_uri.clone(),
            iat: issued_at,
            exp: issued_at + ASSERTION_LIFETIME_SECS,
        }
    }

    /// Sign an assertion for the given scopes.
    pub fn sign_assertion(&self, scopes: &[&str]) -> Result<String> {
        let mut header = Header::new(Algorithm::RS256);
        header.kid = self.private_key_id.clone();

        let key = EncodingKey::from_rsa_pem(self.private_key.as_bytes())?;
        let claims = self.claims(scopes, Utc::now().timestamp());
        Ok(encode(&header, &claims, &key)?)
    }

    /// Exchange a signed assertion for an access token.
    pub async fn authorize(&self, client: &Client, scopes: &[&str]) -> Result<AccessToken> {
        let assertion = self.sign_assertion(scopes)?;

        let response = client
            .post(&self.token_uri)
            .form(&[("grant_type", JWT_BEARER_GRANT), ("assertion", assertion.as_str())])
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(AppError::auth(format!(
                "token endpoint returned HTTP {}: {}",
                status.as_u16(),
                first_line(&body)
            )));
        }

        let token: AccessToken = response.json().await?;
        log::info!("Successfully authenticated as {}", self.client_email);
        Ok(token)
    }
}

/// Load credentials and obtain a token, the first thing every sync run does.
pub async fn authorize(
    client: &Client,
    source: &CredentialSource,
    scopes: &[&str],
) -> Result<AccessToken> {
    let key = ServiceAccountKey::load(source)?;
    key.authorize(client, scopes).await
}
