pub mod error;
pub mod kind;
pub mod library;

pub use error::{MediaError, MediaResult};
pub use kind::{
    AUDIO_EXTENSIONS, IMAGE_EXTENSIONS, MediaKind, VIDEO_EXTENSIONS, is_supported_extension,
    mime_type_for_extension,
};
pub use library::{MediaEntry, MediaLibrary};
