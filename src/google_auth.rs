//! Service account authentication for Google APIs.
//!
//! Mints a short-lived RS256 JWT from the service account key and
//! exchanges it for an OAuth2 access token, cached until shortly before
//! expiry.

use std::sync::{Arc, Mutex};

use anyhow::{Context, Result};
use serde::Deserialize;

const TOKEN_URI: &str = "https://oauth2.googleapis.com/token";

#[derive(Clone)]
pub struct GoogleAuth {
    scope: String,
    sa_key: ServiceAccountKey,
    /// Cached OAuth2 access token.
    token_cache: Arc<Mutex<Option<CachedToken>>>,
}

#[derive(Clone)]
struct CachedToken {
    access_token: String,
    expires_at: u64,
}

#[derive(Clone, Deserialize)]
struct ServiceAccountKey {
    client_email: String,
    private_key: String,
}

impl GoogleAuth {
    /// Load the service account key from the file named by
    /// `GOOGLE_SA_KEY_PATH`.
    pub fn from_env(scope: &str) -> Result<Self> {
        let key_path = std::env::var("GOOGLE_SA_KEY_PATH")
            .context("GOOGLE_SA_KEY_PATH environment variable not set")?;

        let key_json = std::fs::read_to_string(&key_path)
            .with_context(|| format!("Failed to read service account key: {}", key_path))?;

        let sa_key: ServiceAccountKey = serde_json::from_str(&key_json)
            .context("Failed to parse service account key JSON")?;

        Ok(Self {
            scope: scope.to_string(),
            sa_key,
            token_cache: Arc::new(Mutex::new(None)),
        })
    }

    /// Get a valid OAuth2 access token, refreshing if expired.
    pub async fn access_token(&self, client: &reqwest::Client) -> Result<String> {
        // Check cache
        {
            let cache = self.token_cache.lock().unwrap();
            if let Some(ref cached) = *cache {
                if now_secs() < cached.expires_at.saturating_sub(60) {
                    return Ok(cached.access_token.clone());
                }
            }
        }

        // Mint a new JWT
        let now = now_secs();
        let claims = serde_json::json!({
            "iss": self.sa_key.client_email,
            "scope": self.scope,
            "aud": TOKEN_URI,
            "iat": now,
            "exp": now + 3600,
        });

        let header = jsonwebtoken::Header::new(jsonwebtoken::Algorithm::RS256);
        let encoding_key =
            jsonwebtoken::EncodingKey::from_rsa_pem(self.sa_key.private_key.as_bytes())
                .context("Invalid RSA private key in service account JSON")?;

        let jwt = jsonwebtoken::encode(&header, &claims, &encoding_key)
            .context("Failed to encode JWT")?;

        // Exchange JWT for access token
        #[derive(Deserialize)]
        struct TokenResponse {
            access_token: String,
            expires_in: u64,
        }

        let resp: TokenResponse = client
            .post(TOKEN_URI)
            .form(&[
                ("grant_type", "urn:ietf:params:oauth:grant-type:jwt-bearer"),
                ("assertion", &jwt),
            ])
            .send()
            .await
            .context("Token exchange request failed")?
            .error_for_status()
            .context("Token exchange returned error")?
            .json()
            .await
            .context("Failed to parse token response")?;

        let token = resp.access_token.clone();
        {
            let mut cache = self.token_cache.lock().unwrap();
            *cache = Some(CachedToken {
                access_token: resp.access_token,
                expires_at: now + resp.expires_in,
            });
        }

        Ok(token)
    }
}

fn now_secs() -> u64 {
    std::time::SystemTime::now()
        .duration_since(std::time::UNIX_EPOCH)
        .unwrap_or_default()
        .as_secs()
}
