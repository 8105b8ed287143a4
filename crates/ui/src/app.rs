use std::path::PathBuf;

use gpui::prelude::FluentBuilder;
use gpui::*;
use gpui_component::notification::NotificationList;
use gpui_component::{
    ActiveTheme, IconName, Root, Sizable,
    button::{Button, ButtonVariants},
    h_flex,
    label::Label,
    v_flex,
};

use montage_media::MediaKind;

use crate::chat::ChatBubblePanel;
use crate::media_panel::{
    MediaPanel, MediaPanelSettingsClicked, MediaPanelToggleClicked, MediaSelected,
};
use crate::settings::state::{SettingsChanged, SettingsState};
use crate::settings::view::SettingsView;
use crate::timeline::{ThumbnailModeToggled, TimelineStrip};

/// Returns the default themes directory path.
/// This is a pure function to allow deterministic testing of path resolution.
pub fn default_themes_path() -> PathBuf {
    PathBuf::from("./themes")
}

/// Default library sidebar width when expanded.
pub const SIDEBAR_DEFAULT_WIDTH: f32 = 260.0;
/// Minimum allowed sidebar width.
pub const SIDEBAR_MIN_WIDTH: f32 = 200.0;
/// Maximum allowed sidebar width.
pub const SIDEBAR_MAX_WIDTH: f32 = 400.0;
pub const SIDEBAR_COLLAPSED_WIDTH: f32 = 56.0;
/// Fixed width of the chat copilot panel.
pub const CHAT_PANEL_WIDTH: f32 = 360.0;
#[cfg(target_os = "macos")]
const WINDOW_TOOLBAR_LEFT_SAFE_PADDING: f32 = 78.0;
#[cfg(not(target_os = "macos"))]
const WINDOW_TOOLBAR_LEFT_SAFE_PADDING: f32 = 16.0;
#[cfg(target_os = "windows")]
const WINDOW_TOOLBAR_RIGHT_SAFE_PADDING: f32 = 120.0;
#[cfg(not(target_os = "windows"))]
const WINDOW_TOOLBAR_RIGHT_SAFE_PADDING: f32 = 16.0;
/// Compile-time validation of shell layout constraints.
const _: () = {
    assert!(SIDEBAR_COLLAPSED_WIDTH > 0.0);
    assert!(SIDEBAR_MIN_WIDTH < SIDEBAR_DEFAULT_WIDTH);
    assert!(SIDEBAR_DEFAULT_WIDTH < SIDEBAR_MAX_WIDTH);
    assert!(SIDEBAR_MIN_WIDTH > 0.0);
    assert!(CHAT_PANEL_WIDTH > 0.0);
};

/// Computes the top toolbar height using a responsive formula so the title
/// area respects user font scaling via rem size.
fn window_toolbar_height(window: &Window) -> Pixels {
    (1.75 * window.rem_size()).max(px(34.0))
}

/// Computes the effective sidebar width given a drag position.
/// The result is clamped to [SIDEBAR_MIN_WIDTH, SIDEBAR_MAX_WIDTH].
pub fn compute_sidebar_width(drag_x: f32) -> f32 {
    drag_x.clamp(SIDEBAR_MIN_WIDTH, SIDEBAR_MAX_WIDTH)
}

gpui::actions!(shell, [NewSession, ToggleLibrary, Quit,]);

/// Marker type for sidebar resize drag operations.
#[derive(Clone)]
struct SidebarResizeDrag;

/// Empty drag visual used during sidebar resize.
/// The drag preview itself is invisible; only the cursor changes.
struct EmptyDragView;

impl Render for EmptyDragView {
    fn render(&mut self, _: &mut Window, _: &mut Context<Self>) -> impl IntoElement {
        div()
    }
}

/// Main editor shell that manages the root layout.
///
/// The shell provides:
/// - A collapsible media library sidebar with a resize handle
/// - A preview area above the timeline thumbnail strip
/// - The chat copilot panel on the right
/// - Toolbar buttons for quick actions and a notification layer
pub struct EditorShell {
    notification_list: Entity<NotificationList>,
    settings_state: Entity<SettingsState>,
    media_panel: Entity<MediaPanel>,
    chat_panel: Entity<ChatBubblePanel>,
    timeline_strip: Entity<TimelineStrip>,
    settings_window: Option<WindowHandle<Root>>,
    sidebar_collapsed: bool,
    sidebar_width: f32,
    title_bar_should_move: bool,
}

impl EditorShell {
    pub fn new(
        notification_list: Entity<NotificationList>,
        window: &mut Window,
        cx: &mut Context<Self>,
    ) -> Self {
        let settings_state = SettingsState::new(cx);
        let initial_settings = settings_state.read(cx).settings();

        let media_panel = cx.new(|cx| {
            MediaPanel::new(initial_settings.resolved_media_root(), window, cx)
        });
        let chat_panel = cx.new(|cx| ChatBubblePanel::new(settings_state.clone(), window, cx));
        let timeline_strip =
            cx.new(|cx| TimelineStrip::new(initial_settings.thumbnail_mode, cx));

        cx.subscribe(&media_panel, |this, _, event: &MediaSelected, cx| {
            this.timeline_strip.update(cx, |strip, cx| {
                strip.set_media(Some(event.entry.clone()), cx);
            });
            cx.notify();
        })
        .detach();

        cx.subscribe(&media_panel, |this, _, _event: &MediaPanelSettingsClicked, cx| {
            this.open_settings(cx);
        })
        .detach();

        cx.subscribe(&media_panel, |this, _, _event: &MediaPanelToggleClicked, cx| {
            this.toggle_sidebar(cx);
        })
        .detach();

        cx.subscribe(&timeline_strip, |this, _, event: &ThumbnailModeToggled, cx| {
            this.persist_thumbnail_mode(event.mode, cx);
        })
        .detach();

        cx.subscribe(&settings_state, |this, _, event: &SettingsChanged, cx| {
            this.handle_settings_changed(event, cx);
        })
        .detach();

        Self {
            notification_list,
            settings_state,
            media_panel,
            chat_panel,
            timeline_strip,
            settings_window: None,
            sidebar_collapsed: false,
            sidebar_width: SIDEBAR_DEFAULT_WIDTH,
            title_bar_should_move: false,
        }
    }

    pub fn settings_state(&self) -> &Entity<SettingsState> {
        &self.settings_state
    }

    fn toggle_sidebar(&mut self, cx: &mut Context<Self>) {
        self.sidebar_collapsed = !self.sidebar_collapsed;
        cx.notify();
    }

    fn resize_sidebar(&mut self, new_width: f32, cx: &mut Context<Self>) {
        self.sidebar_width = compute_sidebar_width(new_width);
        cx.notify();
    }

    /// Handles the new chat session action.
    pub fn new_session(&mut self, cx: &mut Context<Self>) {
        self.chat_panel
            .update(cx, |chat_panel, cx| chat_panel.start_new_session(cx));
    }

    fn persist_thumbnail_mode(
        &mut self,
        mode: crate::timeline::ThumbnailMode,
        cx: &mut Context<Self>,
    ) {
        let mut settings = (*self.settings_state.read(cx).settings()).clone();
        settings.thumbnail_mode = mode;

        let update_result = self
            .settings_state
            .update(cx, |state, cx| state.update_settings(settings, cx));
        if let Err(error) = update_result {
            // The toggle still applies for this run even when persistence fails.
            tracing::error!("failed to persist thumbnail mode: {error}");
            self.timeline_strip.update(cx, |strip, cx| {
                strip.set_mode(mode, cx);
            });
        }
    }

    fn handle_settings_changed(&mut self, event: &SettingsChanged, cx: &mut Context<Self>) {
        event.settings.apply_theme(None, cx);
        cx.refresh_windows();

        let media_root = event.settings.resolved_media_root();
        self.media_panel.update(cx, |panel, cx| {
            panel.set_library_root(media_root, cx);
        });

        let thumbnail_mode = event.settings.thumbnail_mode;
        self.timeline_strip.update(cx, |strip, cx| {
            strip.set_mode(thumbnail_mode, cx);
        });

        cx.notify();
    }

    fn open_settings(&mut self, cx: &mut Context<Self>) {
        if let Some(settings_window) = self.settings_window.as_ref()
            && settings_window
                .update(cx, |_, window, _| {
                    window.activate_window();
                })
                .is_ok()
        {
            return;
        }

        self.settings_window = None;

        let settings_state = self.settings_state.clone();
        let settings_bounds = Bounds::centered(None, size(px(860.), px(760.)), cx);
        let settings_window = cx.open_window(
            WindowOptions {
                window_bounds: Some(WindowBounds::Windowed(settings_bounds)),
                titlebar: Some(TitlebarOptions {
                    appears_transparent: true,
                    traffic_light_position: Some(point(px(14.), px(14.))),
                    ..Default::default()
                }),
                ..Default::default()
            },
            move |window, cx| {
                let settings_view = cx.new(|cx| SettingsView::new(&settings_state, window, cx));
                cx.new(|cx| Root::new(settings_view, window, cx))
            },
        );

        match settings_window {
            Ok(settings_window) => {
                self.settings_window = Some(settings_window);
            }
            Err(error) => {
                tracing::error!("failed to open settings window: {}", error);
            }
        }
    }

    fn render_preview(&self, cx: &Context<Self>) -> AnyElement {
        let theme = cx.theme();
        let selected = self
            .timeline_strip
            .read(cx)
            .media()
            .cloned();

        let Some(media) = selected else {
            return v_flex()
                .id("preview-empty")
                .flex_1()
                .min_h_0()
                .items_center()
                .justify_center()
                .child(
                    Label::new("Select media from the library to preview it")
                        .text_sm()
                        .text_color(theme.foreground.opacity(0.5)),
                )
                .into_any_element();
        };

        let preview_body = if media.kind == MediaKind::Image {
            div()
                .flex_1()
                .min_h_0()
                .p_4()
                .child(
                    img(media.path.clone())
                        .size_full()
                        .object_fit(ObjectFit::Contain),
                )
                .into_any_element()
        } else {
            v_flex()
                .flex_1()
                .min_h_0()
                .items_center()
                .justify_center()
                .gap_2()
                .child(Label::new(media.name.clone()).text_sm())
                .child(
                    Label::new(format!("{} · {}", media.kind.as_str(), media.mime_type))
                        .text_xs()
                        .text_color(theme.foreground.opacity(0.5)),
                )
                .into_any_element()
        };

        v_flex()
            .id("preview-area")
            .flex_1()
            .min_h_0()
            .child(preview_body)
            .into_any_element()
    }
}

impl Render for EditorShell {
    fn render(&mut self, window: &mut Window, cx: &mut Context<Self>) -> impl IntoElement {
        let theme = cx.theme();
        let toolbar_height = window_toolbar_height(window);
        let collapsed = self.sidebar_collapsed;
        let media_panel = self.media_panel.clone();

        div()
            .size_full()
            .relative()
            .bg(theme.background)
            .child(
                v_flex()
                    .size_full()
                    .child(
                        h_flex()
                            .id("editor-shell-body")
                            .flex_1()
                            .min_w_0()
                            .min_h_0()
                            .pt(toolbar_height)
                            .overflow_hidden()
                            .child(self.render_sidebar(media_panel, cx))
                            .when(!collapsed, |el| el.child(self.render_resize_handle(cx)))
                            .child(
                                v_flex()
                                    .id("editor-main-content")
                                    .flex_1()
                                    .h_full()
                                    .min_w_0()
                                    .min_h_0()
                                    .overflow_hidden()
                                    .child(self.render_preview(cx))
                                    .child(self.timeline_strip.clone()),
                            )
                            .child(
                                div()
                                    .id("editor-chat-panel")
                                    .h_full()
                                    .flex_shrink_0()
                                    .w(px(CHAT_PANEL_WIDTH))
                                    .border_l_1()
                                    .border_color(theme.border)
                                    .child(self.chat_panel.clone()),
                            ),
                    )
                    .child(self.render_bottom_bar(cx)),
            )
            .child(
                div()
                    .absolute()
                    .top_0()
                    .left_0()
                    .right_0()
                    .child(self.render_top_bar(window, toolbar_height, cx)),
            )
            .child(self.notification_list.clone())
    }
}

impl EditorShell {
    fn render_collapsed_sidebar(&self, cx: &Context<Self>) -> AnyElement {
        v_flex()
            .id("collapsed-sidebar")
            .size_full()
            .items_center()
            .justify_start()
            .py_3()
            .px_2()
            .child(
                v_flex().items_center().gap_2().child(
                    Button::new("new-session-collapsed")
                        .ghost()
                        .small()
                        .icon(IconName::Plus)
                        .on_click(cx.listener(|this, _, _window, cx| {
                            this.new_session(cx);
                        })),
                ),
            )
            .into_any_element()
    }

    fn render_top_bar(
        &self,
        window: &Window,
        toolbar_height: Pixels,
        cx: &Context<Self>,
    ) -> impl IntoElement {
        let theme = cx.theme();
        let (provider_id, session_title) = {
            let chat_panel = self.chat_panel.read(cx);
            (
                chat_panel.resolved_provider_id(cx),
                chat_panel.session_title().to_string(),
            )
        };

        h_flex()
            .id("editor-top-bar")
            .window_control_area(WindowControlArea::Drag)
            .on_mouse_down_out(cx.listener(|this, _, _window, _cx| {
                this.title_bar_should_move = false;
            }))
            .on_mouse_up(
                MouseButton::Left,
                cx.listener(|this, _, _window, _cx| {
                    this.title_bar_should_move = false;
                }),
            )
            .on_mouse_down(
                MouseButton::Left,
                cx.listener(|this, _, _window, _cx| {
                    this.title_bar_should_move = true;
                }),
            )
            .on_mouse_move(cx.listener(|this, _, window, _cx| {
                if this.title_bar_should_move {
                    this.title_bar_should_move = false;
                    window.start_window_move();
                }
            }))
            .w_full()
            .h(toolbar_height)
            .flex_shrink_0()
            .pl(px(WINDOW_TOOLBAR_LEFT_SAFE_PADDING))
            .pr(px(WINDOW_TOOLBAR_RIGHT_SAFE_PADDING))
            .items_center()
            .justify_between()
            .bg(theme.background)
            .border_b_1()
            .border_color(theme.border)
            .child(
                Label::new(session_title)
                    .text_sm()
                    .text_color(theme.foreground.opacity(0.7)),
            )
            .child(
                h_flex().gap_2().items_center().child(
                    div()
                        .id("editor-provider-id")
                        .px_2()
                        .py_1()
                        .rounded_full()
                        .bg(theme.muted)
                        .border_1()
                        .border_color(theme.border)
                        .text_xs()
                        .text_color(theme.muted_foreground)
                        .child(provider_id),
                ),
            )
            .when(
                cfg!(target_os = "linux") && window.window_controls().window_menu,
                |title_bar| {
                    title_bar.on_mouse_down(MouseButton::Right, |event, window, _| {
                        window.show_window_menu(event.position);
                    })
                },
            )
            .child(self.render_linux_window_controls(window, cx))
    }

    fn render_linux_window_controls(&self, window: &Window, cx: &Context<Self>) -> AnyElement {
        #[cfg(target_os = "linux")]
        {
            let maximize_icon = if window.is_maximized() {
                IconName::WindowRestore
            } else {
                IconName::WindowMaximize
            };

            h_flex()
                .id("linux-window-controls")
                .items_center()
                // Prevent clicks on window controls from bubbling into title bar gestures
                // (e.g. double-click maximize), which can cause double-toggle behavior.
                .on_mouse_down(MouseButton::Left, |_, _, cx| cx.stop_propagation())
                .on_mouse_down(MouseButton::Right, |_, _, cx| cx.stop_propagation())
                .gap_2()
                .ml_2()
                .child(
                    Button::new("linux-window-minimize")
                        .ghost()
                        .small()
                        .icon(IconName::WindowMinimize)
                        .on_click(cx.listener(|_, _, window, _| {
                            window.minimize_window();
                        })),
                )
                .child(
                    Button::new("linux-window-maximize")
                        .ghost()
                        .small()
                        .icon(maximize_icon)
                        .on_click(cx.listener(|_, _, window, _| {
                            window.zoom_window();
                        })),
                )
                .child(
                    Button::new("linux-window-close")
                        .ghost()
                        .small()
                        .icon(IconName::WindowClose)
                        .on_click(cx.listener(|_, _, window, _| {
                            window.remove_window();
                        })),
                )
                .into_any_element()
        }

        #[cfg(not(target_os = "linux"))]
        {
            let _ = (window, cx);
            div().into_any_element()
        }
    }

    fn render_bottom_bar(&self, cx: &Context<Self>) -> impl IntoElement {
        let theme = cx.theme();
        let sidebar_toggle_icon = if self.sidebar_collapsed {
            IconName::PanelLeftOpen
        } else {
            IconName::PanelLeftClose
        };

        h_flex()
            .id("editor-bottom-bar")
            .w_full()
            .flex_shrink_0()
            .items_center()
            .border_t_1()
            .border_color(theme.border)
            .child(
                h_flex()
                    .id("editor-bottom-sidebar-controls")
                    .w(px(SIDEBAR_DEFAULT_WIDTH))
                    .h_full()
                    .flex_shrink_0()
                    .items_center()
                    .justify_start()
                    .gap_1()
                    .px_3()
                    .py_1()
                    .child(
                        Button::new("sidebar-toggle")
                            .ghost()
                            .small()
                            .icon(sidebar_toggle_icon)
                            .on_click(cx.listener(|this, _, _window, cx| {
                                this.toggle_sidebar(cx);
                            })),
                    )
                    .child(
                        Button::new("shell-settings")
                            .ghost()
                            .small()
                            .icon(IconName::Settings)
                            .on_click(cx.listener(|this, _, _window, cx| {
                                this.open_settings(cx);
                            })),
                    ),
            )
            .child(div().id("editor-bottom-main-spacer").flex_1().min_w_0())
    }

    fn render_sidebar(&self, media_panel: Entity<MediaPanel>, cx: &Context<Self>) -> impl IntoElement {
        let collapsed = self.sidebar_collapsed;
        let expanded_width = self.sidebar_width;
        let sidebar_width = if collapsed {
            SIDEBAR_COLLAPSED_WIDTH
        } else {
            expanded_width
        };
        let sidebar_content = if collapsed {
            self.render_collapsed_sidebar(cx)
        } else {
            media_panel.into_any_element()
        };
        let theme = cx.theme();

        div()
            .id("sidebar-container")
            .h_full()
            .min_w_0()
            .flex_shrink_0()
            .w(px(sidebar_width))
            .overflow_hidden()
            .bg(theme.background)
            .border_r_1()
            .border_color(theme.border)
            .child(sidebar_content)
    }

    /// Renders the resize handle for adjusting sidebar width.
    fn render_resize_handle(&self, cx: &Context<Self>) -> impl IntoElement {
        let theme = cx.theme();

        div()
            .id("sidebar-resize-handle")
            .w(px(1.0))
            .h_full()
            .flex_shrink_0()
            .cursor(CursorStyle::ResizeLeftRight)
            .bg(theme.border)
            .hover(|el| el.bg(theme.primary))
            .on_drag(SidebarResizeDrag, |_, _, _, cx| cx.new(|_| EmptyDragView))
            .on_drag_move::<SidebarResizeDrag>(cx.listener(
                |this, event: &DragMoveEvent<SidebarResizeDrag>, _window, cx| {
                    // Use the x position of the drag event as the new sidebar width
                    let new_width: f32 = event.event.position.x.into();
                    this.resize_sidebar(new_width, cx);
                },
            ))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn sidebar_width_clamps_to_its_bounds() {
        assert_eq!(compute_sidebar_width(0.0), SIDEBAR_MIN_WIDTH);
        assert_eq!(compute_sidebar_width(300.0), 300.0);
        assert_eq!(compute_sidebar_width(10_000.0), SIDEBAR_MAX_WIDTH);
    }
}
