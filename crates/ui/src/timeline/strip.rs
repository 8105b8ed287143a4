use std::ops::Range;

use gpui::*;
use gpui_component::{
    ActiveTheme, Sizable,
    button::{Button, ButtonVariants},
    h_flex,
    label::Label,
};

use montage_media::{MediaEntry, MediaKind};

use crate::timeline::thumbnail::{self, ThumbnailMode};

/// Cell count used for time-based media until a decoder reports real frames.
const PLACEHOLDER_FRAME_COUNT: usize = 240;
const STRIP_VERTICAL_PADDING: f32 = 5.0;

/// Emitted when the user toggles fit/fill from the strip header.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ThumbnailModeToggled {
    pub mode: ThumbnailMode,
}

/// Horizontal strip of frame thumbnails for the selected media entry.
///
/// Only the frames inside the culled window are materialized; spacer elements
/// stand in for everything outside it so scroll geometry stays correct.
pub struct TimelineStrip {
    media: Option<MediaEntry>,
    frame_count: usize,
    mode: ThumbnailMode,
    scroll_handle: ScrollHandle,
}

impl EventEmitter<ThumbnailModeToggled> for TimelineStrip {}

impl TimelineStrip {
    pub fn new(mode: ThumbnailMode, _cx: &mut Context<Self>) -> Self {
        Self {
            media: None,
            frame_count: 0,
            mode,
            scroll_handle: ScrollHandle::new(),
        }
    }

    pub fn media(&self) -> Option<&MediaEntry> {
        self.media.as_ref()
    }

    pub fn frame_count(&self) -> usize {
        self.frame_count
    }

    pub fn mode(&self) -> ThumbnailMode {
        self.mode
    }

    pub fn set_mode(&mut self, mode: ThumbnailMode, cx: &mut Context<Self>) {
        if self.mode != mode {
            self.mode = mode;
            cx.notify();
        }
    }

    pub fn set_media(&mut self, media: Option<MediaEntry>, cx: &mut Context<Self>) {
        self.frame_count = media
            .as_ref()
            .map(|entry| placeholder_frame_count(entry.kind))
            .unwrap_or(0);
        self.media = media;
        cx.notify();
    }

    fn toggle_mode(&mut self, cx: &mut Context<Self>) {
        let next_mode = self.mode.toggled();
        // The shell persists the toggle; the strip re-renders once settings echo it back.
        cx.emit(ThumbnailModeToggled { mode: next_mode });
    }

    fn render_cell(&self, frame_index: usize, cx: &Context<Self>) -> AnyElement {
        let theme = cx.theme();
        let cell = div()
            .flex_shrink_0()
            .w(px(thumbnail::WIDTH))
            .h(px(thumbnail::HEIGHT))
            .mt(px(thumbnail::TOP_OFFSET))
            .border_r_1()
            .border_color(theme.border.opacity(0.5))
            .bg(theme.muted)
            .overflow_hidden();

        let Some(media) = self.media.as_ref() else {
            return cell.into_any_element();
        };

        if media.kind == MediaKind::Image {
            let object_fit = match self.mode {
                ThumbnailMode::Fit => ObjectFit::Contain,
                ThumbnailMode::Fill => ObjectFit::Cover,
            };

            return cell
                .child(
                    img(media.path.clone())
                        .size_full()
                        .object_fit(object_fit),
                )
                .into_any_element();
        }

        // Frame extraction for time-based media happens outside this component;
        // until frames land the strip keeps stable placeholder geometry.
        let _ = frame_index;
        cell.into_any_element()
    }
}

/// Computes which frame cells must be materialized for the current viewport.
///
/// The on-screen window is widened by `VISIBILITY_BUFFER_FRAMES` on both sides
/// and clamped to `[0, frame_count)`.
pub fn visible_frame_range(
    scroll_offset: f32,
    viewport_width: f32,
    frame_count: usize,
) -> Range<usize> {
    if frame_count == 0 || viewport_width <= 0.0 {
        return 0..0;
    }

    let offset = scroll_offset.max(0.0);
    let first_visible = (offset / thumbnail::WIDTH) as usize;
    let last_visible = ((offset + viewport_width) / thumbnail::WIDTH).ceil() as usize;

    let start = first_visible.saturating_sub(thumbnail::VISIBILITY_BUFFER_FRAMES);
    let end = last_visible
        .saturating_add(thumbnail::VISIBILITY_BUFFER_FRAMES)
        .min(frame_count);

    start.min(end)..end
}

fn placeholder_frame_count(kind: MediaKind) -> usize {
    match kind {
        MediaKind::Image => 1,
        MediaKind::Video | MediaKind::Audio => PLACEHOLDER_FRAME_COUNT,
        MediaKind::Unknown => 0,
    }
}

impl Render for TimelineStrip {
    fn render(&mut self, _window: &mut Window, cx: &mut Context<Self>) -> impl IntoElement {
        let theme = cx.theme();
        let viewport_width = f32::from(self.scroll_handle.bounds().size.width).max(1.0);
        let scroll_offset = (-f32::from(self.scroll_handle.offset().x)).max(0.0);
        let visible = visible_frame_range(scroll_offset, viewport_width, self.frame_count);

        let leading_spacer = visible.start as f32 * thumbnail::WIDTH;
        let trailing_spacer = (self.frame_count - visible.end) as f32 * thumbnail::WIDTH;

        let header_label = match self.media.as_ref() {
            Some(media) => format!("{} · {} frames", media.name, self.frame_count),
            None => "No media selected".to_string(),
        };

        let strip_height = thumbnail::TOP_OFFSET + thumbnail::HEIGHT + STRIP_VERTICAL_PADDING;

        div()
            .id("timeline-strip")
            .w_full()
            .flex_shrink_0()
            .bg(theme.background)
            .border_t_1()
            .border_color(theme.border)
            .child(
                h_flex()
                    .id("timeline-strip-header")
                    .w_full()
                    .items_center()
                    .justify_between()
                    .px_3()
                    .py_1()
                    .child(
                        Label::new(header_label)
                            .text_xs()
                            .text_color(theme.foreground.opacity(0.6)),
                    )
                    .child(
                        Button::new("timeline-thumbnail-mode")
                            .ghost()
                            .small()
                            .child(self.mode.as_str().to_uppercase())
                            .on_click(cx.listener(|this, _, _window, cx| {
                                this.toggle_mode(cx);
                            })),
                    ),
            )
            .child(
                h_flex()
                    .id("timeline-strip-frames")
                    .w_full()
                    .h(px(strip_height))
                    .overflow_x_scroll()
                    .track_scroll(&self.scroll_handle)
                    .child(div().flex_shrink_0().w(px(leading_spacer)))
                    .children(
                        visible
                            .clone()
                            .map(|frame_index| self.render_cell(frame_index, cx)),
                    )
                    .child(div().flex_shrink_0().w(px(trailing_spacer))),
            )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::timeline::thumbnail::{VISIBILITY_BUFFER_FRAMES, WIDTH};

    #[test]
    fn empty_timelines_and_degenerate_viewports_render_nothing() {
        assert_eq!(visible_frame_range(0.0, 800.0, 0), 0..0);
        assert_eq!(visible_frame_range(0.0, 0.0, 500), 0..0);
        assert_eq!(visible_frame_range(0.0, -10.0, 500), 0..0);
    }

    #[test]
    fn window_is_widened_by_the_buffer_on_both_sides() {
        // 10 cells fit the viewport; the buffer extends the window well beyond.
        let range = visible_frame_range(0.0, WIDTH * 10.0, 10_000);
        assert_eq!(range.start, 0);
        assert_eq!(range.end, 10 + VISIBILITY_BUFFER_FRAMES);

        let scrolled = visible_frame_range(WIDTH * 200.0, WIDTH * 10.0, 10_000);
        assert_eq!(scrolled.start, 200 - VISIBILITY_BUFFER_FRAMES);
        assert_eq!(scrolled.end, 210 + VISIBILITY_BUFFER_FRAMES);
    }

    #[test]
    fn window_clamps_to_the_frame_count() {
        let range = visible_frame_range(WIDTH * 200.0, WIDTH * 10.0, 150);
        assert_eq!(range, 100..150);

        // Scrolled far past the end of a short timeline the window collapses.
        let collapsed = visible_frame_range(WIDTH * 200.0, WIDTH * 10.0, 50);
        assert!(collapsed.is_empty());
    }

    #[test]
    fn placeholder_frame_counts_follow_media_kind() {
        assert_eq!(placeholder_frame_count(MediaKind::Image), 1);
        assert_eq!(placeholder_frame_count(MediaKind::Video), 240);
        assert_eq!(placeholder_frame_count(MediaKind::Audio), 240);
        assert_eq!(placeholder_frame_count(MediaKind::Unknown), 0);
    }
}
