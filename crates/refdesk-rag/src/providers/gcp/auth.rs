//! GCP authentication using a service account
//!
//! Exchanges an RS256-signed JWT assertion for an OAuth2 bearer token and
//! caches it until shortly before expiry. All Vertex AI calls go through
//! [`GcpAuth::authorized_client`].

use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio::sync::RwLock;

use crate::error::{Error, Result};

const CLOUD_PLATFORM_SCOPE: &str = "https://www.googleapis.com/auth/cloud-platform";
const JWT_BEARER_GRANT: &str = "urn:ietf:params:oauth:grant-type:jwt-bearer";

/// Margin before expiry at which a cached token is refreshed
const REFRESH_MARGIN: Duration = Duration::from_secs(60);
/// Bound on the token-exchange round trip
const TOKEN_EXCHANGE_TIMEOUT: Duration = Duration::from_secs(30);

/// GCP authentication manager
#[derive(Debug)]
pub struct GcpAuth {
    /// Service account key path
    key_path: PathBuf,
    /// Project ID
    project_id: String,
    /// Cached access token
    token: Arc<RwLock<Option<CachedToken>>>,
}

#[derive(Clone, Debug)]
struct CachedToken {
    access_token: String,
    expires_at: Instant,
}

#[derive(serde::Deserialize)]
struct ServiceAccountKey {
    client_email: String,
    private_key: String,
    token_uri: String,
}

#[derive(serde::Deserialize)]
struct TokenResponse {
    access_token: String,
    #[serde(default)]
    expires_in: Option<u64>,
}

impl GcpAuth {
    /// Create from a service account JSON key file
    pub fn from_service_account(key_path: impl AsRef<Path>, project_id: String) -> Result<Self> {
        let key_path = key_path.as_ref().to_path_buf();
        if !key_path.exists() {
            return Err(Error::config(format!(
                "Service account key not found: {}",
                key_path.display()
            )));
        }

        Ok(Self {
            key_path,
            project_id,
            token: Arc::new(RwLock::new(None)),
        })
    }

    /// Get project ID
    pub fn project_id(&self) -> &str {
        &self.project_id
    }

    /// Get a valid access token, refreshing if the cached one is near expiry
    pub async fn get_token(&self) -> Result<String> {
        {
            let token = self.token.read().await;
            if let Some(ref cached) = *token {
                if cached.expires_at > Instant::now() + REFRESH_MARGIN {
                    return Ok(cached.access_token.clone());
                }
            }
        }

        let (new_token, lifetime) = self.refresh_token().await?;

        {
            let mut token = self.token.write().await;
            *token = Some(CachedToken {
                access_token: new_token.clone(),
                expires_at: Instant::now() + lifetime,
            });
        }

        Ok(new_token)
    }

    /// Exchange a signed JWT assertion for a fresh access token
    async fn refresh_token(&self) -> Result<(String, Duration)> {
        let key_content = tokio::fs::read_to_string(&self.key_path).await.map_err(|e| {
            Error::config(format!(
                "Failed to read service account key {}: {}",
                self.key_path.display(),
                e
            ))
        })?;

        let key: ServiceAccountKey = serde_json::from_str(&key_content)
            .map_err(|e| Error::config(format!("Invalid service account key format: {}", e)))?;

        let now = std::time::SystemTime::now()
            .duration_since(std::time::UNIX_EPOCH)
            .unwrap()
            .as_secs() as i64;

        let claims = serde_json::json!({
            "iss": key.client_email,
            "scope": CLOUD_PLATFORM_SCOPE,
            "aud": key.token_uri,
            "iat": now,
            "exp": now + 3600,
        });

        let jwt = sign_jwt(&key.private_key, &claims)?;

        let client = token_client()?;
        let response = client
            .post(&key.token_uri)
            .form(&[("grant_type", JWT_BEARER_GRANT), ("assertion", &jwt)])
            .send()
            .await
            .map_err(|e| Error::auth(format!("Token exchange request failed: {}", e)))?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            return Err(Error::auth(format!(
                "Token exchange failed ({}): {}",
                status, body
            )));
        }

        let token_response: TokenResponse = response
            .json()
            .await
            .map_err(|e| Error::auth(format!("Failed to parse token response: {}", e)))?;

        let lifetime = Duration::from_secs(token_response.expires_in.unwrap_or(3600));
        tracing::debug!(
            "Obtained access token for {} (valid {}s)",
            key.client_email,
            lifetime.as_secs()
        );
        Ok((token_response.access_token, lifetime))
    }

    /// Create an HTTP client with the bearer token attached and a bounded
    /// per-request timeout
    pub async fn authorized_client(&self, timeout: Duration) -> Result<reqwest::Client> {
        let token = self.get_token().await?;
        let mut headers = reqwest::header::HeaderMap::new();
        let bearer = format!("Bearer {}", token)
            .parse()
            .map_err(|e| Error::auth(format!("Invalid bearer header: {}", e)))?;
        headers.insert(reqwest::header::AUTHORIZATION, bearer);

        reqwest::Client::builder()
            .default_headers(headers)
            .timeout(timeout)
            .build()
            .map_err(|e| Error::internal(format!("Failed to build HTTP client: {}", e)))
    }
}

/// HTTP client for the token exchange, with its own bounded timeout
fn token_client() -> Result<reqwest::Client> {
    reqwest::Client::builder()
        .timeout(TOKEN_EXCHANGE_TIMEOUT)
        .build()
        .map_err(|e| Error::internal(format!("Failed to build HTTP client: {}", e)))
}

/// Sign `claims` as an RS256 JWT with the service account's private key
fn sign_jwt(private_key_pem: &str, claims: &serde_json::Value) -> Result<String> {
    use base64::Engine;
    let encoder = &base64::engine::general_purpose::URL_SAFE_NO_PAD;

    let header = encoder.encode(r#"{"alg":"RS256","typ":"JWT"}"#.as_bytes());
    let payload = encoder.encode(claims.to_string().as_bytes());
    let signing_input = format!("{}.{}", header, payload);

    let private_key = private_key_pem.replace("\\n", "\n");
    let pem = pem::parse(&private_key)
        .map_err(|e| Error::auth(format!("Failed to parse private key PEM: {}", e)))?;
    let key_pair = ring::signature::RsaKeyPair::from_pkcs8(pem.contents())
        .map_err(|e| Error::auth(format!("Failed to parse private key: {:?}", e)))?;

    let mut signature = vec![0u8; key_pair.public().modulus_len()];
    key_pair
        .sign(
            &ring::signature::RSA_PKCS1_SHA256,
            &ring::rand::SystemRandom::new(),
            signing_input.as_bytes(),
            &mut signature,
        )
        .map_err(|e| Error::auth(format!("Failed to sign JWT: {:?}", e)))?;

    let signature_b64 = encoder.encode(&signature);
    Ok(format!("{}.{}", signing_input, signature_b64))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_missing_key_file_is_config_error() {
        let err = GcpAuth::from_service_account("/no/such/key.json", "demo".to_string())
            .unwrap_err();
        assert!(matches!(err, Error::Config(_)));
    }

    #[test]
    fn test_sign_jwt_rejects_garbage_key() {
        let claims = serde_json::json!({"iss": "x"});
        let err = sign_jwt("not a pem", &claims).unwrap_err();
        assert!(matches!(err, Error::Auth(_)));
    }

    #[test]
    fn test_token_client_builds() {
        assert!(token_client().is_ok());
    }
}
