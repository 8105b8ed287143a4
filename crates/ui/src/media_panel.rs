use std::path::PathBuf;
use std::rc::Rc;

use gpui::*;
use gpui_component::{
    ActiveTheme, IconName, Sizable, VirtualListScrollHandle,
    button::{Button, ButtonVariants},
    h_flex,
    input::{Input, InputEvent, InputState},
    label::Label,
    list::ListItem,
    v_flex, v_virtual_list,
};
use gpui_tokio_bridge::Tokio;

use montage_media::{MediaEntry, MediaKind, MediaLibrary, MediaResult};

const GROUP_HEADER_HEIGHT: f32 = 26.0;
const MEDIA_ROW_HEIGHT: f32 = 40.0;

#[derive(Debug, Clone)]
enum PanelListItem {
    GroupHeader(&'static str),
    Entry(MediaEntry),
}

/// Emitted when the user picks a media entry for the timeline.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MediaSelected {
    pub entry: MediaEntry,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MediaPanelSettingsClicked;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MediaPanelToggleClicked;

/// Library sidebar listing every supported file under the media root.
pub struct MediaPanel {
    search_input: Entity<InputState>,
    search_query: String,
    library: MediaLibrary,
    entries: Vec<MediaEntry>,
    selected_path: Option<PathBuf>,
    flat_items: Vec<PanelListItem>,
    item_sizes: Rc<Vec<Size<Pixels>>>,
    scroll_handle: VirtualListScrollHandle,
    scan_error: Option<String>,
    scan_task: Option<Task<()>>,
}

impl EventEmitter<MediaSelected> for MediaPanel {}
impl EventEmitter<MediaPanelSettingsClicked> for MediaPanel {}
impl EventEmitter<MediaPanelToggleClicked> for MediaPanel {}

impl MediaPanel {
    pub fn new(library_root: PathBuf, window: &mut Window, cx: &mut Context<Self>) -> Self {
        let search_input = cx.new(|cx| InputState::new(window, cx).placeholder("Search media..."));

        cx.subscribe_in(
            &search_input,
            window,
            |this, _, _event: &InputEvent, _window, cx| {
                this.search_query = this.search_input.read(cx).value().to_string();
                this.rebuild_flat_items();
                cx.notify();
            },
        )
        .detach();

        let mut panel = Self {
            search_input,
            search_query: String::new(),
            library: MediaLibrary::new(library_root),
            entries: Vec::new(),
            selected_path: None,
            flat_items: Vec::new(),
            item_sizes: Rc::new(Vec::new()),
            scroll_handle: VirtualListScrollHandle::new(),
            scan_error: None,
            scan_task: None,
        };
        panel.refresh(cx);
        panel
    }

    pub fn selected_entry(&self) -> Option<&MediaEntry> {
        let selected_path = self.selected_path.as_ref()?;
        self.entries
            .iter()
            .find(|entry| &entry.path == selected_path)
    }

    /// Points the panel at a new library root and rescans.
    pub fn set_library_root(&mut self, root: PathBuf, cx: &mut Context<Self>) {
        if self.library.root() == root.as_path() {
            return;
        }

        self.library = MediaLibrary::new(root);
        self.selected_path = None;
        self.refresh(cx);
    }

    pub fn refresh(&mut self, cx: &mut Context<Self>) {
        let library = self.library.clone();
        let scan = Tokio::spawn(cx, async move { library.scan().await });

        self.scan_task = Some(cx.spawn(async move |this, cx| {
            let scan_result = scan.await;

            let _ = this.update(cx, |this, cx| {
                match scan_result {
                    Ok(result) => this.apply_scan_result(result, cx),
                    Err(join_error) => {
                        tracing::error!("media scan task failed: {join_error}");
                        this.scan_error = Some("Media scan failed".to_string());
                        cx.notify();
                    }
                }
                this.scan_task = None;
            });
        }));
    }

    fn apply_scan_result(&mut self, result: MediaResult<Vec<MediaEntry>>, cx: &mut Context<Self>) {
        match result {
            Ok(entries) => {
                tracing::debug!(entry_count = entries.len(), "media panel refreshed");
                self.entries = entries;
                self.scan_error = None;
            }
            Err(error) => {
                tracing::error!("failed to scan media library: {error}");
                self.entries = Vec::new();
                self.scan_error = Some(error.to_string());
            }
        }

        // Drop a selection that no longer exists on disk.
        if let Some(selected_path) = self.selected_path.clone()
            && !self.entries.iter().any(|entry| entry.path == selected_path)
        {
            self.selected_path = None;
        }

        self.rebuild_flat_items();
        cx.notify();
    }

    fn select_entry(&mut self, entry: MediaEntry, cx: &mut Context<Self>) {
        if self.selected_path.as_ref() == Some(&entry.path) {
            return;
        }

        self.selected_path = Some(entry.path.clone());
        cx.emit(MediaSelected { entry });
        cx.notify();
    }

    fn rebuild_flat_items(&mut self) {
        let normalized_query = self.search_query.trim().to_ascii_lowercase();
        let mut video_items = Vec::new();
        let mut audio_items = Vec::new();
        let mut image_items = Vec::new();

        for entry in &self.entries {
            if !matches_query(entry, &normalized_query) {
                continue;
            }

            match entry.kind {
                MediaKind::Video => video_items.push(entry.clone()),
                MediaKind::Audio => audio_items.push(entry.clone()),
                MediaKind::Image => image_items.push(entry.clone()),
                // Unsupported kinds never leave the scanner, but stay defensive about ordering.
                MediaKind::Unknown => {}
            }
        }

        let mut flat_items = Vec::new();
        let mut item_sizes = Vec::new();

        append_group(&mut flat_items, &mut item_sizes, "Video", video_items);
        append_group(&mut flat_items, &mut item_sizes, "Audio", audio_items);
        append_group(&mut flat_items, &mut item_sizes, "Images", image_items);

        self.flat_items = flat_items;
        self.item_sizes = Rc::new(item_sizes);
    }

    fn render_toolbar(&mut self, cx: &mut Context<Self>) -> impl IntoElement {
        h_flex()
            .w_full()
            .min_w_0()
            .gap_2()
            .px_3()
            .pt(px(8.))
            .pb_2()
            .child(Input::new(&self.search_input).w_full().small())
            .child(
                Button::new("media-refresh")
                    .small()
                    .ghost()
                    .child("Rescan")
                    .on_click(cx.listener(|this, _, _window, cx| {
                        this.refresh(cx);
                    })),
            )
    }

    fn render_empty_state(&mut self, cx: &mut Context<Self>) -> AnyElement {
        let theme = cx.theme();
        let message = if let Some(error) = &self.scan_error {
            error.clone()
        } else if self.entries.is_empty() {
            format!("No media in {}", self.library.root().display())
        } else {
            "No media match your search".to_string()
        };

        v_flex()
            .flex_1()
            .items_center()
            .justify_center()
            .px_4()
            .child(
                Label::new(message)
                    .text_sm()
                    .text_color(theme.foreground.opacity(0.55)),
            )
            .into_any_element()
    }

    fn render_media_list(&mut self, cx: &mut Context<Self>) -> AnyElement {
        if self.flat_items.is_empty() {
            return self.render_empty_state(cx);
        }

        let selected_path = self.selected_path.clone();
        let item_sizes = self.item_sizes.clone();
        let items = self.flat_items.clone();

        v_flex()
            .flex_1()
            .min_h_0()
            .child(
                v_virtual_list(
                    cx.entity().clone(),
                    "media-list",
                    item_sizes,
                    move |_this, visible_range, _window, cx| {
                        let theme = cx.theme();

                        visible_range
                            .map(|index| match &items[index] {
                                PanelListItem::GroupHeader(name) => div()
                                    .w_full()
                                    .h(px(GROUP_HEADER_HEIGHT))
                                    .px_3()
                                    .flex()
                                    .items_center()
                                    .child(
                                        Label::new(*name)
                                            .text_xs()
                                            .text_color(theme.foreground.opacity(0.5)),
                                    )
                                    .into_any_element(),
                                PanelListItem::Entry(entry) => {
                                    let is_selected =
                                        selected_path.as_ref() == Some(&entry.path);
                                    let row_entry = entry.clone();

                                    div()
                                        .w_full()
                                        .h(px(MEDIA_ROW_HEIGHT))
                                        .px_2()
                                        .child(
                                            ListItem::new(("media-entry", index))
                                                .w_full()
                                                .h_full()
                                                .px_3()
                                                .py_2()
                                                .rounded_md()
                                                .selected(is_selected)
                                                .on_click(cx.listener(
                                                    move |this, _event: &ClickEvent, _window, cx| {
                                                        this.select_entry(row_entry.clone(), cx);
                                                    },
                                                ))
                                                .child(
                                                    h_flex()
                                                        .w_full()
                                                        .items_center()
                                                        .gap_2()
                                                        .child(
                                                            div()
                                                                .flex_shrink_0()
                                                                .size(px(18.))
                                                                .rounded_md()
                                                                .border_1()
                                                                .border_color(theme.border)
                                                                .bg(theme.muted)
                                                                .flex()
                                                                .items_center()
                                                                .justify_center()
                                                                .child(
                                                                    Label::new(kind_badge(
                                                                        entry.kind,
                                                                    ))
                                                                    .text_xs()
                                                                    .text_color(
                                                                        theme
                                                                            .foreground
                                                                            .opacity(0.7),
                                                                    ),
                                                                ),
                                                        )
                                                        .child(
                                                            div()
                                                                .flex_1()
                                                                .min_w_0()
                                                                .truncate()
                                                                .child(
                                                                    Label::new(entry.name.clone())
                                                                        .text_sm(),
                                                                ),
                                                        )
                                                        .child(
                                                            Label::new(format_size_bytes(
                                                                entry.size_bytes,
                                                            ))
                                                            .text_xs()
                                                            .text_color(
                                                                theme.foreground.opacity(0.5),
                                                            ),
                                                        ),
                                                ),
                                        )
                                        .into_any_element()
                                }
                            })
                            .collect()
                    },
                )
                .w_full()
                .flex_1()
                .track_scroll(&self.scroll_handle),
            )
            .into_any_element()
    }

    fn render_footer(&mut self, cx: &mut Context<Self>) -> impl IntoElement {
        let theme = cx.theme();

        h_flex()
            .w_full()
            .min_w_0()
            .items_center()
            .justify_between()
            .px_3()
            .py_2()
            .border_t_1()
            .border_color(theme.border)
            .child(
                Label::new(format!("{} files", self.entries.len()))
                    .text_xs()
                    .text_color(theme.foreground.opacity(0.5)),
            )
            .child(
                h_flex()
                    .items_center()
                    .gap_1()
                    .child(
                        Button::new("media-panel-settings")
                            .ghost()
                            .small()
                            .icon(IconName::Settings)
                            .on_click(cx.listener(|_, _, _, cx| {
                                cx.emit(MediaPanelSettingsClicked);
                            })),
                    )
                    .child(
                        Button::new("media-panel-toggle")
                            .ghost()
                            .small()
                            .icon(IconName::PanelLeftClose)
                            .on_click(cx.listener(|_, _, _, cx| {
                                cx.emit(MediaPanelToggleClicked);
                            })),
                    ),
            )
    }
}

impl Render for MediaPanel {
    fn render(&mut self, _window: &mut Window, cx: &mut Context<Self>) -> impl IntoElement {
        let theme = cx.theme();

        v_flex()
            .size_full()
            .min_w_0()
            .overflow_hidden()
            .bg(theme.background)
            .child(self.render_toolbar(cx))
            .child(self.render_media_list(cx))
            .child(self.render_footer(cx))
    }
}

fn append_group(
    flat_items: &mut Vec<PanelListItem>,
    item_sizes: &mut Vec<Size<Pixels>>,
    title: &'static str,
    entries: Vec<MediaEntry>,
) {
    if entries.is_empty() {
        return;
    }

    flat_items.push(PanelListItem::GroupHeader(title));
    item_sizes.push(size(px(0.), px(GROUP_HEADER_HEIGHT)));

    for entry in entries {
        flat_items.push(PanelListItem::Entry(entry));
        item_sizes.push(size(px(0.), px(MEDIA_ROW_HEIGHT)));
    }
}

fn matches_query(entry: &MediaEntry, query: &str) -> bool {
    if query.is_empty() {
        return true;
    }

    entry.name.to_ascii_lowercase().contains(query)
}

fn kind_badge(kind: MediaKind) -> &'static str {
    match kind {
        MediaKind::Video => "V",
        MediaKind::Audio => "A",
        MediaKind::Image => "I",
        MediaKind::Unknown => "?",
    }
}

fn format_size_bytes(size_bytes: u64) -> String {
    const KIB: u64 = 1024;
    const MIB: u64 = KIB * 1024;
    const GIB: u64 = MIB * 1024;

    if size_bytes >= GIB {
        format!("{:.1} GB", size_bytes as f64 / GIB as f64)
    } else if size_bytes >= MIB {
        format!("{:.1} MB", size_bytes as f64 / MIB as f64)
    } else if size_bytes >= KIB {
        format!("{:.1} KB", size_bytes as f64 / KIB as f64)
    } else {
        format!("{size_bytes} B")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn size_formatting_picks_the_nearest_unit() {
        assert_eq!(format_size_bytes(512), "512 B");
        assert_eq!(format_size_bytes(2_048), "2.0 KB");
        assert_eq!(format_size_bytes(5 * 1024 * 1024), "5.0 MB");
        assert_eq!(format_size_bytes(3 * 1024 * 1024 * 1024), "3.0 GB");
    }
}
