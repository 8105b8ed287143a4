use std::collections::hash_map::DefaultHasher;
use std::hash::Hasher;

use gpui::prelude::FluentBuilder as _;
use gpui::*;
use gpui_component::{
    ActiveTheme, IconName, Sizable,
    button::{Button, ButtonVariants},
    h_flex,
    label::Label,
    text::TextView,
    v_flex,
};

use crate::chat::message::{ChatMessage, MessageStatus, Role};

pub const SPEAKER_LABEL_HEIGHT: Pixels = px(16.);
pub const SPEAKER_LABEL_GAP: Pixels = px(8.);
pub const STREAMING_INDICATOR_HEIGHT: Pixels = px(20.);
pub const STREAMING_INDICATOR_GAP: Pixels = px(8.);
pub const ERROR_ROW_HEIGHT: Pixels = px(20.);
pub const ERROR_ROW_GAP: Pixels = px(8.);
/// Oversized payloads fall back to plain text so markdown layout stays predictable.
pub const MARKDOWN_SAFE_FALLBACK_THRESHOLD_BYTES: usize = 128 * 1024;

/// Full-width block for one assistant (or system) message.
#[derive(IntoElement)]
pub struct AIChatMessage {
    message: ChatMessage,
    index: usize,
}

impl AIChatMessage {
    pub fn new(message: ChatMessage, index: usize) -> Self {
        Self { message, index }
    }

    fn render_body(&self) -> AnyElement {
        let message = &self.message;

        if message.content.trim().is_empty() {
            let empty_label = if matches!(message.status, MessageStatus::Streaming(_)) {
                "Waiting for response..."
            } else {
                "(empty response)"
            };

            return Label::new(empty_label).text_sm().into_any_element();
        }

        if message.content.len() > MARKDOWN_SAFE_FALLBACK_THRESHOLD_BYTES {
            return Label::new(message.content.clone())
                .text_sm()
                .into_any_element();
        }

        let markdown_id = ElementId::Name(SharedString::from(format!(
            "copilot-markdown-{}-{}",
            message.id.0, self.index
        )));

        TextView::markdown(markdown_id, message.content.clone())
            .code_block_actions(|code_block, _window, _cx| {
                let code = code_block.code().to_string();
                let mut hasher = DefaultHasher::new();
                hasher.write(code.as_bytes());
                let copy_button_id = format!("copy-code-{}", hasher.finish());

                h_flex().w_full().justify_end().child(
                    Button::new(copy_button_id)
                        .ghost()
                        .small()
                        .icon(IconName::Copy)
                        .child("Copy")
                        .on_click(move |_, _, cx| {
                            cx.write_to_clipboard(ClipboardItem::new_string(code.clone()));
                        }),
                )
            })
            .selectable(true)
            .into_any_element()
    }
}

impl RenderOnce for AIChatMessage {
    fn render(self, _window: &mut Window, cx: &mut App) -> impl IntoElement {
        let theme = cx.theme();
        let speaker_label = if self.message.role == Role::System {
            "System"
        } else {
            "Copilot"
        };

        let body = self.render_body();
        let is_streaming = matches!(self.message.status, MessageStatus::Streaming(_));
        let error_message = if let MessageStatus::Error(error) = &self.message.status {
            Some(error.clone())
        } else {
            None
        };

        v_flex()
            .w_full()
            .gap_2()
            .child(
                Label::new(speaker_label)
                    .text_xs()
                    .text_color(theme.foreground.opacity(0.5)),
            )
            .child(body)
            .when(is_streaming, |column| {
                column.child(
                    h_flex()
                        .w_full()
                        .gap_2()
                        .items_center()
                        .child(div().size(px(8.)).rounded_full().bg(theme.primary))
                        .child(
                            Label::new("Streaming")
                                .text_xs()
                                .text_color(theme.foreground.opacity(0.65)),
                        ),
                )
            })
            .when_some(error_message, |column, error| {
                column.child(
                    Label::new(format!("Error: {error}"))
                        .text_xs()
                        .text_color(theme.danger),
                )
            })
    }
}
