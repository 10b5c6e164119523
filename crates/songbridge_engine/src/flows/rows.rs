use songbridge_core::{FlowResult, SongCard};

use crate::actions::first_text;
use crate::page::{ElementHandle, PageEngine};

/// Selectors for one song row in a track table, shared by the likes and
/// playlist scrapers.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RowSelectors {
    pub row: String,
    pub title: String,
    pub artist: String,
    pub album: String,
    /// Row attribute carrying the song link, usually `href`.
    pub url_attribute: String,
}

/// Builds a song card from one row. Title and artist are required; album and
/// url are tolerated missing, as not every table renders them.
pub(crate) async fn extract_song(
    engine: &dyn PageEngine,
    row: &ElementHandle,
    selectors: &RowSelectors,
    added_at: &str,
) -> FlowResult<SongCard> {
    let title = first_text(engine, Some(row), &selectors.title).await?;
    let artist = first_text(engine, Some(row), &selectors.artist).await?;

    let mut song = SongCard::new(title, artist, added_at);
    song.album = first_text(engine, Some(row), &selectors.album)
        .await
        .ok()
        .filter(|album| !album.is_empty());
    song.url = engine
        .attribute(row, &selectors.url_attribute)
        .await
        .ok()
        .flatten();

    Ok(song)
}
