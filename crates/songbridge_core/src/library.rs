use serde::{Deserialize, Serialize};

use crate::{AlbumCard, ArtistCard, PlaylistCard, SongCard};

/// Summary counters kept in step with the collections below.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "camelCase")]
pub struct LibraryMetadata {
    pub scraped_at: String,
    pub total_songs: usize,
    pub total_playlists: usize,
    pub total_albums: usize,
    pub total_artists: usize,
}

/// The append-only output aggregate of a scraping run.
///
/// Entries are only ever added through the `add_*` operations, which bump the
/// matching metadata counter; existing entries are never mutated. The whole
/// aggregate is written and read wholesale by the engine's persist module.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "camelCase")]
pub struct Library {
    pub metadata: LibraryMetadata,
    pub liked_songs: Vec<SongCard>,
    pub playlists: Vec<PlaylistCard>,
    pub albums: Vec<AlbumCard>,
    pub artists: Vec<ArtistCard>,
}

impl Library {
    /// An empty library stamped with the run's start timestamp.
    pub fn new(scraped_at: impl Into<String>) -> Self {
        Self {
            metadata: LibraryMetadata {
                scraped_at: scraped_at.into(),
                ..LibraryMetadata::default()
            },
            ..Self::default()
        }
    }

    pub fn add_liked_song(&mut self, song: SongCard) {
        self.liked_songs.push(song);
        self.metadata.total_songs += 1;
    }

    pub fn add_playlist(&mut self, playlist: PlaylistCard) {
        self.playlists.push(playlist);
        self.metadata.total_playlists += 1;
    }

    pub fn add_album(&mut self, album: AlbumCard) {
        self.albums.push(album);
        self.metadata.total_albums += 1;
    }

    pub fn add_artist(&mut self, artist: ArtistCard) {
        self.artists.push(artist);
        self.metadata.total_artists += 1;
    }
}
