use std::path::PathBuf;

use snafu::Snafu;

#[derive(Debug, Snafu)]
#[snafu(visibility(pub(crate)))]
pub enum MediaError {
    #[snafu(display("media file '{name}' was not found in the library"))]
    NotFound { stage: &'static str, name: String },
    #[snafu(display("library entry '{name}' is not a regular file"))]
    NotAFile { stage: &'static str, name: String },
    #[snafu(display("media name '{name}' would resolve outside the library root"))]
    OutsideLibraryRoot { stage: &'static str, name: String },
    #[snafu(display("failed to create media library root at {path:?}"))]
    CreateLibraryRoot {
        stage: &'static str,
        path: PathBuf,
        source: std::io::Error,
    },
    #[snafu(display("failed to read media library directory {path:?}"))]
    ReadLibraryDirectory {
        stage: &'static str,
        path: PathBuf,
        source: std::io::Error,
    },
    #[snafu(display("failed to read metadata for library entry {path:?}"))]
    ReadEntryMetadata {
        stage: &'static str,
        path: PathBuf,
        source: std::io::Error,
    },
}

pub type MediaResult<T> = Result<T, MediaError>;
