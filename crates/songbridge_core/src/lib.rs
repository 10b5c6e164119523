//! Songbridge core: resilience primitives and the scraped-catalog data model.
mod batch;
mod catalog;
mod converge;
mod library;
mod outcome;
mod pace;
mod retry;

pub use batch::{
    run_batch, BatchOptions, BatchProgress, BatchReport, ItemDisposition, ItemError, ProgressSink,
    SilentProgress,
};
pub use catalog::{AlbumCard, ArtistCard, PlaylistCard, SongCard};
pub use converge::{run_to_convergence, Convergence, ConvergencePlan};
pub use library::{Library, LibraryMetadata};
pub use outcome::{FlowError, FlowResult};
pub use pace::{NoPacer, Pacer, PauseKind};
pub use retry::{run_with_retry, RetryPolicy};
