use std::fmt;

use serde::{Deserialize, Serialize};

/// One scraped song. Field names serialize to the camelCase JSON contract
/// shared with the other side of the migration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SongCard {
    pub title: String,
    pub artist: String,
    #[serde(default)]
    pub album: Option<String>,
    #[serde(default)]
    pub url: Option<String>,
    #[serde(default)]
    pub duration: Option<String>,
    pub added_at: String,
}

impl SongCard {
    /// A song with the required identity fields; optional fields start empty.
    /// `added_at` is an RFC3339 timestamp supplied by the caller.
    pub fn new(
        title: impl Into<String>,
        artist: impl Into<String>,
        added_at: impl Into<String>,
    ) -> Self {
        Self {
            title: title.into(),
            artist: artist.into(),
            album: None,
            url: None,
            duration: None,
            added_at: added_at.into(),
        }
    }

    /// A card is usable only when both identity fields are nonempty.
    pub fn is_valid(&self) -> bool {
        !self.title.trim().is_empty() && !self.artist.trim().is_empty()
    }
}

impl fmt::Display for SongCard {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} - {}", self.title, self.artist)?;
        if let Some(album) = &self.album {
            write!(f, " ({album})")?;
        }
        Ok(())
    }
}

/// One scraped playlist and its songs.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PlaylistCard {
    pub id: String,
    pub name: String,
    pub url: String,
    pub song_count: usize,
    pub scraped_at: String,
    #[serde(default)]
    pub songs: Vec<SongCard>,
}

impl PlaylistCard {
    pub fn new(
        id: impl Into<String>,
        name: impl Into<String>,
        url: impl Into<String>,
        scraped_at: impl Into<String>,
    ) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            url: url.into(),
            song_count: 0,
            scraped_at: scraped_at.into(),
            songs: Vec::new(),
        }
    }

    /// Appends a song, keeping `song_count` in step with the collection.
    pub fn add_song(&mut self, song: SongCard) {
        self.songs.push(song);
        self.song_count = self.songs.len();
    }

    pub fn is_valid(&self) -> bool {
        !self.id.is_empty() && !self.name.trim().is_empty() && !self.url.is_empty()
    }
}

impl fmt::Display for PlaylistCard {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} ({} songs)", self.name, self.song_count)
    }
}

/// A saved album reference.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AlbumCard {
    pub name: String,
    pub artist: String,
    #[serde(default)]
    pub url: Option<String>,
    pub scraped_at: String,
}

/// A followed artist reference.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ArtistCard {
    pub name: String,
    #[serde(default)]
    pub url: Option<String>,
    pub scraped_at: String,
}
