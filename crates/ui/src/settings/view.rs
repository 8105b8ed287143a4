use gpui::prelude::FluentBuilder;
use gpui::*;
use gpui_component::{
    ActiveTheme, IndexPath, Sizable, ThemeMode, ThemeRegistry,
    button::{Button, ButtonVariants},
    h_flex,
    input::{Input, InputState},
    select::{Select, SelectState},
    v_flex,
};

use crate::settings::state::{EditorSettings, SettingsState};
use crate::timeline::thumbnail::ThumbnailMode;

pub struct SettingsView {
    state: Entity<SettingsState>,
    provider_input: Entity<InputState>,
    api_key_input: Entity<InputState>,
    endpoint_input: Entity<InputState>,
    model_input: Entity<InputState>,
    media_root_input: Entity<InputState>,
    theme_preset_select: Entity<SelectState<Vec<SharedString>>>,
    theme_mode: ThemeMode,
    thumbnail_mode: ThumbnailMode,
    error_message: Option<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SettingsClose;

impl EventEmitter<SettingsClose> for SettingsView {}

impl SettingsView {
    fn theme_names(cx: &App) -> Vec<SharedString> {
        ThemeRegistry::global(cx)
            .sorted_themes()
            .iter()
            .map(|theme| theme.name.clone())
            .collect()
    }

    fn selected_theme_index(
        theme_names: &[SharedString],
        selected_theme_name: &str,
    ) -> Option<IndexPath> {
        if selected_theme_name.trim().is_empty() {
            return None;
        }

        theme_names
            .iter()
            .position(|theme_name| theme_name.as_ref() == selected_theme_name.trim())
            .map(|index| IndexPath::default().row(index))
    }

    pub fn new(state: &Entity<SettingsState>, window: &mut Window, cx: &mut Context<Self>) -> Self {
        let settings = state.read(cx).settings().clone();

        let provider_input =
            cx.new(|cx| InputState::new(window, cx).placeholder("Provider ID (e.g., openai)"));
        provider_input.update(cx, |input_state, cx| {
            input_state.set_value(settings.provider_id.clone(), window, cx);
        });

        let api_key_input = cx.new(|cx| InputState::new(window, cx).placeholder("API Key"));
        api_key_input.update(cx, |input_state, cx| {
            input_state.set_value(settings.api_key.clone(), window, cx);
        });

        let endpoint_input = cx.new(|cx| {
            InputState::new(window, cx).placeholder("Endpoint (e.g., https://api.openai.com/v1)")
        });
        endpoint_input.update(cx, |input_state, cx| {
            input_state.set_value(settings.endpoint.clone(), window, cx);
        });

        let model_input =
            cx.new(|cx| InputState::new(window, cx).placeholder("Model (e.g., gpt-4o-mini)"));
        model_input.update(cx, |input_state, cx| {
            input_state.set_value(settings.model.clone(), window, cx);
        });

        let media_root_input =
            cx.new(|cx| InputState::new(window, cx).placeholder("Media library folder"));
        media_root_input.update(cx, |input_state, cx| {
            input_state.set_value(settings.media_root.clone(), window, cx);
        });

        let theme_names = Self::theme_names(cx);
        let selected_theme_index = Self::selected_theme_index(&theme_names, &settings.theme_name);
        let theme_preset_select = cx.new(|cx| {
            SelectState::new(theme_names, selected_theme_index, window, cx).searchable(true)
        });

        Self {
            state: state.clone(),
            provider_input,
            api_key_input,
            endpoint_input,
            model_input,
            media_root_input,
            theme_preset_select,
            theme_mode: settings.theme_mode,
            thumbnail_mode: settings.thumbnail_mode,
            error_message: None,
        }
    }

    fn select_theme_mode(&mut self, mode: ThemeMode, cx: &mut Context<Self>) {
        self.theme_mode = mode;
        cx.notify();
    }

    fn select_thumbnail_mode(&mut self, mode: ThumbnailMode, cx: &mut Context<Self>) {
        self.thumbnail_mode = mode;
        cx.notify();
    }

    fn save_settings(
        &mut self,
        _event: &gpui::ClickEvent,
        _window: &mut Window,
        cx: &mut Context<Self>,
    ) {
        let theme_name = self
            .theme_preset_select
            .read(cx)
            .selected_value()
            .map(|theme_name| theme_name.to_string())
            .unwrap_or_default();

        let new_settings = EditorSettings {
            provider_id: self.provider_input.read(cx).value().to_string(),
            api_key: self.api_key_input.read(cx).value().to_string(),
            endpoint: self.endpoint_input.read(cx).value().to_string(),
            model: self.model_input.read(cx).value().to_string(),
            theme_mode: self.theme_mode,
            theme_name,
            media_root: self.media_root_input.read(cx).value().to_string(),
            thumbnail_mode: self.thumbnail_mode,
        };

        match self
            .state
            .update(cx, |state, cx| state.update_settings(new_settings, cx))
        {
            Ok(()) => {
                self.error_message = None;
                cx.emit(SettingsClose);
                cx.notify();
            }
            Err(e) => {
                self.error_message = Some(format!("Failed to save settings: {e}"));
                cx.notify();
            }
        }
    }

    fn cancel(&mut self, _event: &gpui::ClickEvent, _window: &mut Window, cx: &mut Context<Self>) {
        self.error_message = None;
        cx.emit(SettingsClose);
        cx.notify();
    }

    fn render_labeled_input(
        &self,
        label: &'static str,
        input: &Entity<InputState>,
        cx: &Context<Self>,
    ) -> impl IntoElement {
        let theme = cx.theme();

        v_flex()
            .gap_1()
            .child(div().text_sm().text_color(theme.foreground).child(label))
            .child(Input::new(input).w_full())
    }

    fn render_mode_button<T: PartialEq + Copy + 'static>(
        id: &'static str,
        label: &'static str,
        mode: T,
        current: T,
        on_select: impl Fn(&mut Self, T, &mut Context<Self>) + 'static,
        cx: &Context<Self>,
    ) -> impl IntoElement {
        Button::new(id)
            .small()
            .when(current == mode, |button| button.primary())
            .when(current != mode, |button| button.ghost())
            .child(label)
            .on_click(cx.listener(move |this, _, _window, cx| {
                on_select(this, mode, cx);
            }))
    }
}

impl Render for SettingsView {
    fn render(&mut self, _window: &mut Window, cx: &mut Context<Self>) -> impl IntoElement {
        let theme = cx.theme();

        v_flex()
            .id("settings-view")
            .w(px(420.))
            .gap_4()
            .p_4()
            .bg(theme.popover)
            .rounded_lg()
            .shadow_lg()
            .child(
                div()
                    .text_lg()
                    .font_weight(FontWeight::SEMIBOLD)
                    .text_color(theme.foreground)
                    .child("Editor Settings"),
            )
            .child(
                v_flex()
                    .gap_3()
                    .child(self.render_labeled_input("Provider", &self.provider_input, cx))
                    .child(self.render_labeled_input("API Key", &self.api_key_input, cx))
                    .child(self.render_labeled_input("Endpoint", &self.endpoint_input, cx))
                    .child(self.render_labeled_input("Model", &self.model_input, cx))
                    .child(self.render_labeled_input("Media Library", &self.media_root_input, cx))
                    .child(
                        v_flex()
                            .gap_1()
                            .child(
                                div()
                                    .text_sm()
                                    .text_color(theme.foreground)
                                    .child("Timeline Thumbnails"),
                            )
                            .child(
                                h_flex()
                                    .gap_2()
                                    .child(Self::render_mode_button(
                                        "settings-thumbnail-fit",
                                        "Fit",
                                        ThumbnailMode::Fit,
                                        self.thumbnail_mode,
                                        Self::select_thumbnail_mode,
                                        cx,
                                    ))
                                    .child(Self::render_mode_button(
                                        "settings-thumbnail-fill",
                                        "Fill",
                                        ThumbnailMode::Fill,
                                        self.thumbnail_mode,
                                        Self::select_thumbnail_mode,
                                        cx,
                                    )),
                            ),
                    )
                    .child(
                        v_flex()
                            .gap_1()
                            .child(
                                div()
                                    .text_sm()
                                    .text_color(theme.foreground)
                                    .child("Theme Mode"),
                            )
                            .child(
                                h_flex()
                                    .gap_2()
                                    .child(Self::render_mode_button(
                                        "settings-theme-light",
                                        "Light",
                                        ThemeMode::Light,
                                        self.theme_mode,
                                        Self::select_theme_mode,
                                        cx,
                                    ))
                                    .child(Self::render_mode_button(
                                        "settings-theme-dark",
                                        "Dark",
                                        ThemeMode::Dark,
                                        self.theme_mode,
                                        Self::select_theme_mode,
                                        cx,
                                    )),
                            ),
                    )
                    .child(
                        v_flex()
                            .gap_1()
                            .child(
                                div()
                                    .text_sm()
                                    .text_color(theme.foreground)
                                    .child("Theme Preset"),
                            )
                            .child(
                                Select::new(&self.theme_preset_select)
                                    .w_full()
                                    .placeholder("Follow mode")
                                    .search_placeholder("Search theme preset")
                                    .cleanable(true),
                            ),
                    ),
            )
            .when_some(self.error_message.clone(), |el, error| {
                el.child(div().text_sm().text_color(theme.danger).child(error))
            })
            .child(
                h_flex()
                    .gap_2()
                    .justify_end()
                    .child(
                        Button::new("settings-cancel")
                            .ghost()
                            .small()
                            .child("Cancel")
                            .on_click(cx.listener(Self::cancel)),
                    )
                    .child(
                        Button::new("settings-save")
                            .primary()
                            .small()
                            .child("Save")
                            .on_click(cx.listener(Self::save_settings)),
                    ),
            )
    }
}
