use serde::{Deserialize, Serialize};

/// Rendered width of one timeline thumbnail cell, in pixels.
pub const WIDTH: f32 = 50.0;
/// Rendered height of one timeline thumbnail cell, in pixels.
pub const HEIGHT: f32 = 40.0;
/// Vertical offset of the thumbnail row inside the strip, in pixels.
pub const TOP_OFFSET: f32 = 5.0;
/// Frames kept renderable on each side of the visible range.
///
/// Visibility culling widens the on-screen window by this count so scrubbing
/// never outruns the rendered cells.
pub const VISIBILITY_BUFFER_FRAMES: usize = 100;

/// Compile-time validation of thumbnail geometry relationships.
const _: () = {
    assert!(WIDTH > 0.0);
    assert!(HEIGHT > 0.0);
    assert!(TOP_OFFSET >= 0.0);
    assert!(VISIBILITY_BUFFER_FRAMES > 0);
};

/// How a thumbnail occupies its cell.
///
/// The lowercase wire names are persisted in settings files, so `"fit"` and
/// `"fill"` are part of the stable contract.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ThumbnailMode {
    /// Preserve aspect ratio, center the frame, pad the remainder.
    #[default]
    Fit,
    /// Cover the whole cell, cropping overflow.
    Fill,
}

impl ThumbnailMode {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Fit => "fit",
            Self::Fill => "fill",
        }
    }

    /// Parses a persisted mode, defaulting unknown input to `Fit`.
    pub fn parse(value: &str) -> Self {
        if value.trim().eq_ignore_ascii_case("fill") {
            Self::Fill
        } else {
            Self::Fit
        }
    }

    pub fn toggled(&self) -> Self {
        match self {
            Self::Fit => Self::Fill,
            Self::Fill => Self::Fit,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn geometry_constants_hold_their_contract_values() {
        assert_eq!(WIDTH, 50.0);
        assert_eq!(HEIGHT, 40.0);
        assert_eq!(TOP_OFFSET, 5.0);
        assert_eq!(VISIBILITY_BUFFER_FRAMES, 100);
    }

    #[test]
    fn mode_serializes_to_the_literal_wire_strings() {
        assert_eq!(
            serde_json::to_string(&ThumbnailMode::Fit).expect("serialize fit"),
            "\"fit\""
        );
        assert_eq!(
            serde_json::to_string(&ThumbnailMode::Fill).expect("serialize fill"),
            "\"fill\""
        );

        let fit: ThumbnailMode = serde_json::from_str("\"fit\"").expect("deserialize fit");
        let fill: ThumbnailMode = serde_json::from_str("\"fill\"").expect("deserialize fill");
        assert_eq!(fit, ThumbnailMode::Fit);
        assert_eq!(fill, ThumbnailMode::Fill);
    }

    #[test]
    fn mode_has_exactly_two_distinct_variants() {
        assert_ne!(ThumbnailMode::Fit, ThumbnailMode::Fill);
        assert_eq!(ThumbnailMode::Fit.as_str(), "fit");
        assert_eq!(ThumbnailMode::Fill.as_str(), "fill");
        assert_eq!(ThumbnailMode::Fit.toggled(), ThumbnailMode::Fill);
        assert_eq!(ThumbnailMode::Fill.toggled(), ThumbnailMode::Fit);
    }

    #[test]
    fn parse_round_trips_wire_names_and_defaults_unknowns() {
        assert_eq!(ThumbnailMode::parse("fill"), ThumbnailMode::Fill);
        assert_eq!(ThumbnailMode::parse(" FILL "), ThumbnailMode::Fill);
        assert_eq!(ThumbnailMode::parse("fit"), ThumbnailMode::Fit);
        assert_eq!(ThumbnailMode::parse("stretch"), ThumbnailMode::Fit);
        assert_eq!(ThumbnailMode::parse(""), ThumbnailMode::Fit);
    }

    #[test]
    fn default_mode_is_fit() {
        assert_eq!(ThumbnailMode::default(), ThumbnailMode::Fit);
    }
}
