/// Strip component and visibility culling.
pub mod strip;
/// Thumbnail geometry constants and display mode.
pub mod thumbnail;

pub use strip::{ThumbnailModeToggled, TimelineStrip, visible_frame_range};
pub use thumbnail::ThumbnailMode;
