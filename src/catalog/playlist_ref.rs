//! Playlist reference extraction from user-supplied URLs

use regex::Regex;
use std::fmt;
use std::sync::LazyLock;

/// Known playlist URL shapes, most specific first
static PLAYLIST_PATTERNS: LazyLock<Vec<Regex>> = LazyLock::new(|| {
    [
        r"spotify\.com/(?:intl-[A-Za-z-]+/)?playlist/([A-Za-z0-9]+)",
        r"^spotify:playlist:([A-Za-z0-9]+)$",
        r"playlist/([A-Za-z0-9]+)",
    ]
    .iter()
    .filter_map(|p| Regex::new(p).ok())
    .collect()
});

/// Canonical catalog id of a playlist
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct PlaylistRef(String);

impl PlaylistRef {
    /// Extract the playlist id from a URL or URI, `None` if no known shape matches
    pub fn parse(input: &str) -> Option<Self> {
        let input = input.trim();
        PLAYLIST_PATTERNS.iter().find_map(|pattern| {
            pattern
                .captures(input)
                .and_then(|caps| caps.get(1))
                .map(|m| Self(m.as_str().to_string()))
        })
    }

    /// Wrap an id that is already known to be canonical
    #[cfg(test)]
    pub fn from_id(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn id(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for PlaylistRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}
