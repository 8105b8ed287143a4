use gpui::*;
use gpui_component::{ActiveTheme, label::Label, v_flex};

use crate::chat::message::ChatMessage;

pub const USER_BUBBLE_MAX_WIDTH: Pixels = px(540.);
pub const USER_BUBBLE_PADDING_X: Pixels = px(14.);
pub const USER_BUBBLE_PADDING_Y: Pixels = px(10.);

/// Right-aligned accent bubble for one user-authored message.
#[derive(IntoElement)]
pub struct UserChatMessage {
    message: ChatMessage,
}

impl UserChatMessage {
    pub fn new(message: ChatMessage) -> Self {
        Self { message }
    }
}

impl RenderOnce for UserChatMessage {
    fn render(self, _window: &mut Window, cx: &mut App) -> impl IntoElement {
        let theme = cx.theme();
        // An all-whitespace payload still needs one line of bubble height.
        let content = if self.message.content.is_empty() {
            " ".to_string()
        } else {
            self.message.content
        };

        v_flex().w_full().items_end().child(
            div()
                .max_w(USER_BUBBLE_MAX_WIDTH)
                .px(USER_BUBBLE_PADDING_X)
                .py(USER_BUBBLE_PADDING_Y)
                .rounded_lg()
                .bg(theme.accent)
                .text_color(theme.accent_foreground)
                .child(Label::new(content).text_sm()),
        )
    }
}
