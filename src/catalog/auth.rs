//! Spotify Web API authentication
//!
//! Uses the client credentials flow: the app-level id/secret pair is exchanged
//! for a short-lived bearer token, which is cached until shortly before expiry.

use std::time::{Duration, Instant};
use tokio::sync::Mutex;

/// Token endpoint for the client credentials flow
pub const TOKEN_URL: &str = "https://accounts.spotify.com/api/token";

/// Refresh tokens this long before they actually expire
const EXPIRY_MARGIN: Duration = Duration::from_secs(60);

/// App-level credential pair
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClientCredentials {
    pub client_id: String,
    pub client_secret: String,
}

impl ClientCredentials {
    /// Build credentials, `None` unless both halves are non-empty
    pub fn new(client_id: &str, client_secret: &str) -> Option<Self> {
        let client_id = client_id.trim();
        let client_secret = client_secret.trim();
        if client_id.is_empty() || client_secret.is_empty() {
            return None;
        }
        Some(Self {
            client_id: client_id.to_string(),
            client_secret: client_secret.to_string(),
        })
    }
}

#[derive(Debug, Clone)]
struct CachedToken {
    value: String,
    expires_at: Instant,
}

/// Bearer token cache shared by all requests of one client
#[derive(Debug, Default)]
pub struct TokenCache {
    current: Mutex<Option<CachedToken>>,
}

impl TokenCache {
    /// Return a cached token still valid at `now`
    pub async fn get(&self, now: Instant) -> Option<String> {
        let guard = self.current.lock().await;
        guard
            .as_ref()
            .filter(|t| t.expires_at > now)
            .map(|t| t.value.clone())
    }

    /// Store a token that the server says lives for `expires_in` seconds
    pub async fn store(&self, value: String, expires_in: u64, now: Instant) {
        let lifetime = Duration::from_secs(expires_in).saturating_sub(EXPIRY_MARGIN);
        *self.current.lock().await = Some(CachedToken {
            value,
            expires_at: now + lifetime,
        });
    }

    /// Drop the cached token (after the API rejected it)
    pub async fn invalidate(&self) {
        *self.current.lock().await = None;
    }
}
