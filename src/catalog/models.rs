//! Spotify Web API response models and the catalog records built from them

use serde::{Deserialize, Serialize};

/// Playlist metadata snapshot, fetched once per run
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PlaylistInfo {
    pub id: String,
    pub name: String,
    pub description: String,
    /// Track count as declared by the catalog (may include unplayable entries)
    pub tracks_count: u32,
    pub owner: String,
}

/// One playable playlist entry
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TrackInfo {
    pub name: String,
    pub artists: Vec<String>,
    pub album: String,
    pub duration_ms: u64,
    pub external_url: Option<String>,
    pub id: Option<String>,
}

impl TrackInfo {
    /// Artists joined the way they appear in queries and file names
    pub fn artist_list(&self) -> String {
        self.artists.join(", ")
    }

    /// `"<name> - <artists>"`, used for log lines and file names
    pub fn display_name(&self) -> String {
        format!("{} - {}", self.name, self.artist_list())
    }
}

/// One page of playlist entries
///
/// Entries whose underlying track is gone (deleted, region-blocked) are kept
/// as `None` so the page length still reflects what the catalog returned.
#[derive(Debug, Clone, Default)]
pub struct TrackPage {
    pub items: Vec<Option<TrackInfo>>,
}

// Token endpoint response (client credentials flow)
#[derive(Debug, Clone, Deserialize)]
pub struct TokenResponse {
    pub access_token: String,
    #[serde(default = "default_expires_in")]
    pub expires_in: u64,
}

fn default_expires_in() -> u64 {
    3600
}

// Error envelope: {"error": {"status": 404, "message": "..."}}, the status
// repeats the HTTP one
#[derive(Debug, Clone, Deserialize)]
pub struct ApiErrorEnvelope {
    pub error: ApiErrorBody,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ApiErrorBody {
    #[serde(default)]
    pub message: String,
}

// Playlist response (GET /playlists/{id})
#[derive(Debug, Clone, Deserialize)]
pub struct ApiPlaylist {
    pub id: String,
    pub name: String,
    pub description: Option<String>,
    pub owner: ApiOwner,
    pub tracks: ApiTrackTotal,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ApiOwner {
    pub display_name: Option<String>,
    pub id: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ApiTrackTotal {
    pub total: u32,
}

impl From<ApiPlaylist> for PlaylistInfo {
    fn from(playlist: ApiPlaylist) -> Self {
        let owner = playlist
            .owner
            .display_name
            .or(playlist.owner.id)
            .unwrap_or_default();

        Self {
            id: playlist.id,
            name: playlist.name,
            description: playlist.description.unwrap_or_default(),
            tracks_count: playlist.tracks.total,
            owner,
        }
    }
}

// Playlist tracks response (GET /playlists/{id}/tracks)
#[derive(Debug, Clone, Deserialize)]
pub struct ApiTrackPage {
    #[serde(default)]
    pub items: Vec<ApiPlaylistItem>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ApiPlaylistItem {
    pub track: Option<ApiTrack>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ApiTrack {
    pub id: Option<String>,
    pub name: String,
    #[serde(default)]
    pub artists: Vec<ApiArtist>,
    pub album: Option<ApiAlbum>,
    #[serde(default)]
    pub duration_ms: u64,
    #[serde(default)]
    pub external_urls: ApiExternalUrls,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ApiArtist {
    pub name: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ApiAlbum {
    pub name: String,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct ApiExternalUrls {
    pub spotify: Option<String>,
}

impl From<ApiTrack> for TrackInfo {
    fn from(track: ApiTrack) -> Self {
        Self {
            name: track.name,
            artists: track.artists.into_iter().map(|a| a.name).collect(),
            album: track.album.map(|a| a.name).unwrap_or_default(),
            duration_ms: track.duration_ms,
            external_url: track.external_urls.spotify,
            id: track.id,
        }
    }
}

impl From<ApiTrackPage> for TrackPage {
    fn from(page: ApiTrackPage) -> Self {
        Self {
            items: page
                .items
                .into_iter()
                .map(|item| item.track.map(TrackInfo::from))
                .collect(),
        }
    }
}
