//! Spotify Web API HTTP client

use async_trait::async_trait;
use reqwest::{Client, StatusCode};
use serde::de::DeserializeOwned;
use std::sync::Arc;
use std::time::Instant;
use tracing::debug;
use url::Url;

use super::auth::{ClientCredentials, TOKEN_URL, TokenCache};
use super::models::*;
use super::{CatalogBackend, CatalogError, PlaylistRef};

/// Base URL of the Web API
pub const API_BASE: &str = "https://api.spotify.com/v1";

const PLAYLIST_FIELDS: &str = "id,name,description,owner(display_name,id),tracks(total)";
const TRACK_FIELDS: &str =
    "items(track(id,name,duration_ms,external_urls,album(name),artists(name)))";

/// HTTP client for the Spotify Web API
#[derive(Clone)]
pub struct SpotifyClient {
    credentials: Option<ClientCredentials>,
    tokens: Arc<TokenCache>,
    http_client: Client,
}

impl SpotifyClient {
    /// Create a new client; without credentials every call reports `NotConnected`
    pub fn new(credentials: Option<ClientCredentials>) -> Result<Self, CatalogError> {
        let http_client = Client::builder()
            .user_agent(concat!("tunefetch/", env!("CARGO_PKG_VERSION")))
            .build()?;

        Ok(Self {
            credentials,
            tokens: Arc::new(TokenCache::default()),
            http_client,
        })
    }

    /// Check the credentials by requesting a fresh token
    pub async fn verify(&self) -> Result<(), CatalogError> {
        self.tokens.invalidate().await;
        self.access_token().await.map(|_| ())
    }

    /// Get a valid bearer token, requesting a new one when needed
    async fn access_token(&self) -> Result<String, CatalogError> {
        let creds = self.credentials.as_ref().ok_or(CatalogError::NotConnected)?;

        if let Some(token) = self.tokens.get(Instant::now()).await {
            return Ok(token);
        }

        debug!("Requesting Spotify access token");
        let response = self
            .http_client
            .post(TOKEN_URL)
            .basic_auth(&creds.client_id, Some(&creds.client_secret))
            .form(&[("grant_type", "client_credentials")])
            .send()
            .await?;

        match response.status() {
            StatusCode::BAD_REQUEST | StatusCode::UNAUTHORIZED => {
                return Err(CatalogError::Unauthorized(
                    "client credentials were rejected".to_string(),
                ));
            }
            status if !status.is_success() => {
                return Err(CatalogError::Api {
                    status: status.as_u16(),
                    message: "token request failed".to_string(),
                });
            }
            _ => {}
        }

        let token: TokenResponse = response
            .json()
            .await
            .map_err(|e| CatalogError::Parse(e.to_string()))?;

        self.tokens
            .store(token.access_token.clone(), token.expires_in, Instant::now())
            .await;
        Ok(token.access_token)
    }

    /// GET an API endpoint and decode the JSON body
    async fn get_json<T: DeserializeOwned>(
        &self,
        segments: &[&str],
        query: &[(&str, String)],
    ) -> Result<T, CatalogError> {
        let token = self.access_token().await?;
        let url = endpoint(segments)?;
        debug!("GET {}", url);

        let response = self
            .http_client
            .get(url)
            .bearer_auth(token)
            .query(query)
            .send()
            .await?;

        let status = response.status();
        if status.is_success() {
            return response
                .json()
                .await
                .map_err(|e| CatalogError::Parse(e.to_string()));
        }

        let message = response
            .json::<ApiErrorEnvelope>()
            .await
            .map(|e| e.error.message)
            .unwrap_or_default();

        match status {
            StatusCode::NOT_FOUND | StatusCode::BAD_REQUEST => Err(CatalogError::NotFound(message)),
            StatusCode::UNAUTHORIZED | StatusCode::FORBIDDEN => {
                self.tokens.invalidate().await;
                Err(CatalogError::Unauthorized(message))
            }
            _ => Err(CatalogError::Api {
                status: status.as_u16(),
                message,
            }),
        }
    }
}

/// API URL for the given path segments, each percent-encoded
fn endpoint(segments: &[&str]) -> Result<Url, CatalogError> {
    let mut url = Url::parse(API_BASE).map_err(|e| CatalogError::Parse(e.to_string()))?;
    url.path_segments_mut()
        .map_err(|_| CatalogError::Parse(format!("{} cannot take a path", API_BASE)))?
        .extend(segments);
    Ok(url)
}

#[async_trait]
impl CatalogBackend for SpotifyClient {
    async fn resolve_playlist(&self, playlist: &PlaylistRef) -> Result<PlaylistInfo, CatalogError> {
        let api: ApiPlaylist = self
            .get_json(
                &["playlists", playlist.id()],
                &[("fields", PLAYLIST_FIELDS.to_string())],
            )
            .await?;

        Ok(PlaylistInfo::from(api))
    }

    async fn list_tracks(
        &self,
        playlist: &PlaylistRef,
        offset: usize,
        limit: usize,
    ) -> Result<TrackPage, CatalogError> {
        let api: ApiTrackPage = self
            .get_json(
                &["playlists", playlist.id(), "tracks"],
                &[
                    ("offset", offset.to_string()),
                    ("limit", limit.to_string()),
                    ("additional_types", "track".to_string()),
                    ("fields", TRACK_FIELDS.to_string()),
                ],
            )
            .await?;

        let page = TrackPage::from(api);
        debug!(
            "Fetched {} playlist entries at offset {}",
            page.items.len(),
            offset
        );
        Ok(page)
    }
}
