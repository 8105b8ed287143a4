use std::collections::hash_map::DefaultHasher;
use std::collections::{HashMap, HashSet};
use std::hash::Hasher;
use std::ops::Range;
use std::rc::Rc;

use gpui::*;
use gpui_component::{v_flex, v_virtual_list};

use crate::chat::ai_message::{
    AIChatMessage, ERROR_ROW_GAP, ERROR_ROW_HEIGHT, SPEAKER_LABEL_GAP, SPEAKER_LABEL_HEIGHT,
    STREAMING_INDICATOR_GAP, STREAMING_INDICATOR_HEIGHT,
};
use crate::chat::message::{ChatMessage, MessageId, MessageStatus, Role};
use crate::chat::scroll::FollowScroll;
use crate::chat::user_message::{
    USER_BUBBLE_MAX_WIDTH, USER_BUBBLE_PADDING_X, USER_BUBBLE_PADDING_Y, UserChatMessage,
};

const DEFAULT_CONTENT_WIDTH: Pixels = px(680.);
const LIST_HORIZONTAL_PADDING: Pixels = px(16.);
const CONTENT_WIDTH_CHANGE_EPSILON: f32 = 1.0;
const ESTIMATED_TEXT_LINE_HEIGHT: Pixels = px(18.);
const ESTIMATED_CHAR_WIDTH: f32 = 7.0;

struct SizeCacheEntry {
    layout_hash: u64,
    height: Pixels,
    measured: bool,
}

/// Virtualized list over one conversation's messages.
pub struct ChatMessageList {
    messages: Vec<ChatMessage>,
    item_sizes: Rc<Vec<Size<Pixels>>>,
    scroll: FollowScroll,
    size_cache: HashMap<MessageId, SizeCacheEntry>,
    content_width: Option<Pixels>,
}

impl ChatMessageList {
    pub fn new(_cx: &mut Context<Self>) -> Self {
        Self {
            messages: Vec::new(),
            item_sizes: Rc::new(Vec::new()),
            scroll: FollowScroll::new(),
            size_cache: HashMap::new(),
            content_width: None,
        }
    }

    pub fn messages(&self) -> &[ChatMessage] {
        &self.messages
    }

    pub fn set_messages(&mut self, messages: Vec<ChatMessage>, cx: &mut Context<Self>) {
        let should_request_follow = messages.len() > self.messages.len()
            || messages
                .iter()
                .any(|message| matches!(message.status, MessageStatus::Streaming(_)));

        self.messages = messages;
        self.rebuild_item_sizes();

        if should_request_follow {
            self.scroll.request_jump_if_following();
        }

        cx.notify();
    }

    pub fn request_scroll_to_bottom(&mut self, cx: &mut Context<Self>) {
        self.scroll.request_jump_to_tail();
        cx.notify();
    }

    pub fn reset_scroll_tracking(&mut self, cx: &mut Context<Self>) {
        self.scroll.reset();
        cx.notify();
    }

    fn update_content_width(&mut self, cx: &mut Context<Self>) {
        let list_width = self.scroll.bounds().size.width;
        if list_width <= Pixels::ZERO {
            return;
        }

        let next_content_width = max_pixels(px(1.), list_width - LIST_HORIZONTAL_PADDING * 2);
        let width_changed = self.content_width.is_none_or(|current| {
            (f32::from(current) - f32::from(next_content_width)).abs()
                > CONTENT_WIDTH_CHANGE_EPSILON
        });

        if width_changed {
            self.content_width = Some(next_content_width);

            // Mark cached measurements dirty so item heights can be recalculated for new width.
            for entry in self.size_cache.values_mut() {
                entry.measured = false;
            }

            self.rebuild_item_sizes();
            cx.notify();
        }
    }

    fn rebuild_item_sizes(&mut self) {
        let content_width = self.content_width.unwrap_or(DEFAULT_CONTENT_WIDTH);
        let mut active_ids = HashSet::with_capacity(self.messages.len());
        let mut sizes = Vec::with_capacity(self.messages.len());

        for message in &self.messages {
            let next_hash = layout_hash(message);
            let estimated_height = estimate_message_height(message, content_width);

            let entry = self.size_cache.entry(message.id).or_insert(SizeCacheEntry {
                layout_hash: next_hash,
                height: estimated_height,
                measured: false,
            });

            // Keep cache entries stable by message id and invalidate only on semantic content changes.
            if entry.layout_hash != next_hash {
                entry.layout_hash = next_hash;
                entry.height = estimated_height;
                entry.measured = false;
            } else if !entry.measured {
                entry.height = estimated_height;
            }

            sizes.push(size(px(0.), entry.height));
            active_ids.insert(message.id);
        }

        self.size_cache.retain(|id, _| active_ids.contains(id));
        self.item_sizes = Rc::new(sizes);
    }

    fn measure_visible_items(
        &mut self,
        visible_range: Range<usize>,
        window: &mut Window,
        cx: &mut Context<Self>,
    ) {
        if self.messages.is_empty() {
            return;
        }

        let content_width = self.content_width.unwrap_or(DEFAULT_CONTENT_WIDTH);
        let available_space = size(
            AvailableSpace::Definite(content_width),
            AvailableSpace::MinContent,
        );
        let mut updated = false;

        for index in visible_range {
            let Some(message) = self.messages.get(index).cloned() else {
                continue;
            };

            let next_hash = layout_hash(&message);
            let estimated_height = estimate_message_height(&message, content_width);

            {
                let entry = self.size_cache.entry(message.id).or_insert(SizeCacheEntry {
                    layout_hash: next_hash,
                    height: estimated_height,
                    measured: false,
                });

                if entry.layout_hash != next_hash {
                    entry.layout_hash = next_hash;
                    entry.height = estimated_height;
                    entry.measured = false;
                }
            }

            let mut row = render_message_row(&message, index);
            let measured_height = row.layout_as_root(available_space, window, cx).height;
            let Some(entry) = self.size_cache.get_mut(&message.id) else {
                continue;
            };
            let height_changed = !entry.measured || pixels_changed(entry.height, measured_height);
            if height_changed {
                entry.height = measured_height;
                updated = true;
            }
            entry.measured = true;
        }

        if updated {
            self.rebuild_item_sizes();
            cx.notify();
        }
    }
}

fn render_message_row(message: &ChatMessage, index: usize) -> AnyElement {
    if message.role == Role::User {
        UserChatMessage::new(message.clone()).into_any_element()
    } else {
        AIChatMessage::new(message.clone(), index).into_any_element()
    }
}

impl Render for ChatMessageList {
    fn render(&mut self, _window: &mut Window, cx: &mut Context<Self>) -> impl IntoElement {
        self.update_content_width(cx);
        self.scroll.update_follow_state();
        self.scroll.apply_pending_jump();

        v_flex().size_full().min_h_0().child(
            v_virtual_list(
                cx.entity().clone(),
                "chat-message-list",
                self.item_sizes.clone(),
                |this, visible_range, window, cx| {
                    // Measure only visible rows so long histories keep O(visible) layout work.
                    this.update_content_width(cx);
                    this.measure_visible_items(visible_range.clone(), window, cx);
                    visible_range
                        .filter_map(|index| {
                            this.messages
                                .get(index)
                                .map(|message| render_message_row(message, index))
                        })
                        .collect::<Vec<_>>()
                },
            )
            .size_full()
            .px_4()
            .py_3()
            .gap_4()
            .track_scroll(self.scroll.handle()),
        )
    }
}

fn layout_hash(message: &ChatMessage) -> u64 {
    let mut hasher = DefaultHasher::new();

    hasher.write_u64(message.id.0);

    let role_tag = match message.role {
        Role::System => 0,
        Role::User => 1,
        Role::Assistant => 2,
    };
    hasher.write_u8(role_tag);

    match &message.status {
        MessageStatus::Pending => hasher.write_u8(0),
        MessageStatus::Streaming(session_id) => {
            hasher.write_u8(1);
            hasher.write_u64(session_id.0);
        }
        MessageStatus::Done => hasher.write_u8(2),
        MessageStatus::Error(error) => {
            hasher.write_u8(3);
            hasher.write(error.as_bytes());
        }
        MessageStatus::Cancelled => hasher.write_u8(4),
    }

    hasher.write(message.content.as_bytes());
    hasher.finish()
}

fn estimate_message_height(message: &ChatMessage, content_width: Pixels) -> Pixels {
    match message.role {
        Role::User => {
            let bubble_width = min_pixels(content_width, USER_BUBBLE_MAX_WIDTH);
            let text_width = max_pixels(px(1.), bubble_width - USER_BUBBLE_PADDING_X * 2);
            let text_height = estimate_text_height(&message.content, text_width);
            text_height + USER_BUBBLE_PADDING_Y * 2
        }
        Role::System | Role::Assistant => {
            let text_height = if message.content.is_empty() {
                ESTIMATED_TEXT_LINE_HEIGHT
            } else {
                estimate_text_height(&message.content, content_width)
            };

            let mut total_height = SPEAKER_LABEL_HEIGHT + SPEAKER_LABEL_GAP + text_height;
            if matches!(message.status, MessageStatus::Streaming(_)) {
                total_height += STREAMING_INDICATOR_GAP + STREAMING_INDICATOR_HEIGHT;
            }
            if matches!(message.status, MessageStatus::Error(_)) {
                total_height += ERROR_ROW_GAP + ERROR_ROW_HEIGHT;
            }

            total_height
        }
    }
}

fn estimate_text_height(content: &str, width: Pixels) -> Pixels {
    if content.is_empty() {
        return ESTIMATED_TEXT_LINE_HEIGHT;
    }

    let width_as_f32 = f32::from(width);
    let chars_per_line = (width_as_f32 / ESTIMATED_CHAR_WIDTH).floor().max(1.0) as usize;

    let mut line_count = 0usize;
    for line in content.lines() {
        let char_count = line.chars().count().max(1);
        line_count += char_count.div_ceil(chars_per_line);
    }

    // Account for the trailing empty line when content ends with a newline.
    if content.ends_with('\n') {
        line_count += 1;
    }

    ESTIMATED_TEXT_LINE_HEIGHT * line_count.max(1)
}

fn max_pixels(a: Pixels, b: Pixels) -> Pixels {
    if f32::from(a) >= f32::from(b) { a } else { b }
}

fn min_pixels(a: Pixels, b: Pixels) -> Pixels {
    if f32::from(a) <= f32::from(b) { a } else { b }
}

fn pixels_changed(a: Pixels, b: Pixels) -> bool {
    (f32::from(a) - f32::from(b)).abs() > 0.5
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct VirtualizationMetric {
    pub message_id: MessageId,
    pub estimated_height: f32,
    pub layout_hash: u64,
}

pub fn virtualization_metrics(
    messages: &[ChatMessage],
    content_width: f32,
) -> Vec<VirtualizationMetric> {
    let bounded_width = px(content_width.max(1.0));

    messages
        .iter()
        .map(|message| VirtualizationMetric {
            message_id: message.id,
            estimated_height: f32::from(estimate_message_height(message, bounded_width)),
            layout_hash: layout_hash(message),
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::chat::message::StreamSessionId;

    #[test]
    fn large_history_fixture_keeps_row_metrics_deterministic() {
        let mut messages = (0..2_000)
            .map(|index| {
                let role = if index % 2 == 0 {
                    Role::User
                } else {
                    Role::Assistant
                };
                let status = if index == 1_999 {
                    MessageStatus::Streaming(StreamSessionId::new(42))
                } else {
                    MessageStatus::Done
                };

                ChatMessage::new(
                    MessageId::new(index as u64 + 1),
                    role,
                    format!("message-{index}: virtualization fixture payload"),
                    status,
                )
            })
            .collect::<Vec<_>>();

        let content_width = px(680.);
        let heights_before = messages
            .iter()
            .map(|message| estimate_message_height(message, content_width))
            .collect::<Vec<_>>();
        let hashes_before = messages.iter().map(layout_hash).collect::<Vec<_>>();

        assert_eq!(heights_before.len(), 2_000);
        assert!(heights_before.iter().all(|height| *height > Pixels::ZERO));

        if let Some(last_message) = messages.last_mut() {
            // Tail-only mutation should invalidate only the final row hash.
            last_message.content.push_str(" [finalized]");
            last_message.status = MessageStatus::Done;
        }

        let heights_after = messages
            .iter()
            .map(|message| estimate_message_height(message, content_width))
            .collect::<Vec<_>>();
        let hashes_after = messages.iter().map(layout_hash).collect::<Vec<_>>();

        assert_eq!(heights_after.len(), 2_000);
        assert!(heights_after.iter().all(|height| *height > Pixels::ZERO));
        assert_eq!(hashes_before[..1_999], hashes_after[..1_999]);
        assert_ne!(hashes_before[1_999], hashes_after[1_999]);
    }

    #[test]
    fn metrics_track_streaming_and_error_extras() {
        let base = ChatMessage::new(
            MessageId::new(1),
            Role::Assistant,
            "same body",
            MessageStatus::Done,
        );
        let streaming = ChatMessage::new(
            MessageId::new(1),
            Role::Assistant,
            "same body",
            MessageStatus::Streaming(StreamSessionId::new(1)),
        );

        let metrics = virtualization_metrics(&[base, streaming], 680.0);
        assert!(metrics[1].estimated_height > metrics[0].estimated_height);
        assert_ne!(metrics[0].layout_hash, metrics[1].layout_hash);
    }
}
