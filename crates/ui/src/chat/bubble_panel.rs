use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

use gpui::*;
use gpui_component::{
    ActiveTheme, IconName, Sizable,
    button::{Button, ButtonVariants},
    h_flex,
    label::Label,
    v_flex,
};
use gpui_tokio_bridge::Tokio;

use crate::chat::events::{Stop, Submit};
use crate::chat::message::{
    ChatMessage, Conversation, ConversationId, MessageId, MessageStatus, Role, StreamSessionId,
    StreamTarget, StreamTransition,
};
use crate::chat::{ChatInput, ChatMessageList};
use crate::settings::state::{SettingsChanged, SettingsState};
use montage_llm::{
    DEFAULT_OPENAI_MODEL, LlmProvider, ProviderConfig, ProviderError, ProviderEventStream,
    ProviderMessage, ProviderStreamHandle, Role as ProviderRole,
    StreamEventMapped as ProviderStreamEventMapped,
    StreamEventPayload as ProviderStreamEventPayload, StreamRequest,
    StreamTarget as ProviderStreamTarget, create_provider, estimate_token_usage,
};
use montage_storage::{
    MessageId as StorageMessageId, MessagePatch, MessageRole as StorageMessageRole, MessageStore,
    NewMessage, NewSession, SessionId as StorageSessionId, SessionStore, SqliteStorage,
};

pub const STREAM_DEBOUNCE_MS: u64 = 50;
/// Matches the sampling temperature the copilot backend has always used.
const REQUEST_TEMPERATURE: f64 = 0.7;
const DEFAULT_CHAT_DB_RELATIVE_PATH: &str = ".montage/chat.db";

/// Coordinator-level stream metadata kept outside the domain model.
struct ActiveStream {
    target: StreamTarget,
    assistant_message_id: MessageId,
    request_messages: Vec<ProviderMessage>,
}

/// Chat copilot panel: message list + composer + provider/persistence wiring.
pub struct ChatBubblePanel {
    message_list: Entity<ChatMessageList>,
    input: Entity<ChatInput>,
    settings_state: Entity<SettingsState>,
    provider: Option<Arc<dyn LlmProvider>>,
    provider_error: Option<String>,
    current_model_id: String,
    conversation: Conversation,
    storage: Option<Arc<SqliteStorage>>,
    storage_session_id: Option<StorageSessionId>,
    storage_message_ids: HashMap<MessageId, StorageMessageId>,
    next_conversation_id: u64,
    next_message_id: u64,
    next_stream_session_id: u64,
    active_stream: Option<ActiveStream>,
    stream_worker_task: Option<Task<Result<(), gpui_tokio_bridge::JoinError>>>,
    stream_reader_task: Option<Task<()>>,
    stream_debounce_task: Option<Task<()>>,
    pending_stream_chunk: String,
}

impl ChatBubblePanel {
    pub fn new(
        settings_state: Entity<SettingsState>,
        window: &mut Window,
        cx: &mut Context<Self>,
    ) -> Self {
        let message_list = cx.new(ChatMessageList::new);
        let input = cx.new(|cx| ChatInput::new(window, cx));
        let storage = Self::open_storage();

        let (provider, current_model_id, provider_error) =
            Self::initialize_provider(&settings_state, cx);

        let mut this = Self {
            message_list: message_list.clone(),
            input: input.clone(),
            settings_state: settings_state.clone(),
            provider,
            provider_error,
            current_model_id,
            conversation: Conversation::new(ConversationId::new(1), "New Session"),
            storage,
            storage_session_id: None,
            storage_message_ids: HashMap::new(),
            next_conversation_id: 2,
            next_message_id: 1,
            next_stream_session_id: 1,
            active_stream: None,
            stream_worker_task: None,
            stream_reader_task: None,
            stream_debounce_task: None,
            pending_stream_chunk: String::new(),
        };

        this.resume_or_create_session(cx);

        cx.subscribe(&input, |this, _, event: &Submit, cx| {
            this.handle_submit(event.clone(), cx);
        })
        .detach();

        cx.subscribe(&input, |this, _, event: &Stop, cx| {
            this.handle_stop(*event, cx);
        })
        .detach();

        cx.subscribe(&settings_state, |this, _, event: &SettingsChanged, cx| {
            this.handle_settings_changed(event, cx);
        })
        .detach();

        this
    }

    pub fn session_title(&self) -> &str {
        &self.conversation.title
    }

    pub fn resolved_provider_id(&self, cx: &App) -> String {
        let configured_provider_id = self.settings_state.read(cx).settings().provider_id.clone();

        if configured_provider_id.trim().is_empty() {
            "openai".to_string()
        } else {
            configured_provider_id.trim().to_string()
        }
    }

    /// Cancels any active stream and switches to a fresh persisted session.
    pub fn start_new_session(&mut self, cx: &mut Context<Self>) {
        if self.active_stream.is_some() {
            self.cancel_active_stream(cx);
        }

        let created = self.storage.as_ref().and_then(|storage| {
            match storage.create_session(NewSession {
                title: String::new(),
            }) {
                Ok(session) => Some(session),
                Err(error) => {
                    tracing::error!("failed to create chat session: {error}");
                    None
                }
            }
        });

        let conversation_id = self.alloc_conversation_id();
        let title = created
            .as_ref()
            .map(|session| session.title.clone())
            .unwrap_or_else(|| "New Session".to_string());

        self.storage_session_id = created.map(|session| session.id);
        self.storage_message_ids.clear();
        self.conversation = Conversation::new(conversation_id, title);

        self.input.update(cx, |input, cx| {
            input.set_streaming(false, cx);
        });
        self.update_input_stream_target(cx);
        self.sync_messages(cx, true);
        cx.notify();
    }

    fn open_storage() -> Option<Arc<SqliteStorage>> {
        // Panel constructor is sync, so storage bootstrap runs in a local current-thread runtime.
        let runtime = match tokio::runtime::Builder::new_current_thread()
            .enable_all()
            .build()
        {
            Ok(runtime) => runtime,
            Err(error) => {
                tracing::error!("failed to initialize runtime for sqlite storage: {error}");
                return None;
            }
        };

        match runtime.block_on(SqliteStorage::open(DEFAULT_CHAT_DB_RELATIVE_PATH)) {
            Ok(storage) => Some(Arc::new(storage)),
            Err(error) => {
                tracing::error!("failed to open sqlite chat storage: {error}");
                None
            }
        }
    }

    /// Resumes the most recent persisted session, creating one when none exist.
    fn resume_or_create_session(&mut self, cx: &mut Context<Self>) {
        let most_recent = self.storage.as_ref().and_then(|storage| {
            match storage.list_sessions(false) {
                Ok(sessions) => sessions.into_iter().next(),
                Err(error) => {
                    tracing::error!("failed to list chat sessions: {error}");
                    None
                }
            }
        });

        let Some(session) = most_recent else {
            self.start_new_session(cx);
            return;
        };

        let conversation_id = self.alloc_conversation_id();
        self.conversation = Conversation::new(conversation_id, session.title.clone());
        self.storage_session_id = Some(session.id);
        self.hydrate_messages();
        self.update_input_stream_target(cx);
        self.sync_messages(cx, true);
    }

    fn hydrate_messages(&mut self) {
        let persisted_messages = match (self.storage.as_ref(), self.storage_session_id) {
            (Some(storage), Some(session_id)) => match storage.list_messages(session_id) {
                Ok(messages) => messages,
                Err(error) => {
                    tracing::error!("failed to load persisted chat history: {error}");
                    Vec::new()
                }
            },
            _ => Vec::new(),
        };

        let mut hydrated_messages = Vec::with_capacity(persisted_messages.len());
        let mut storage_message_ids = HashMap::with_capacity(persisted_messages.len());

        // Keep a deterministic in-memory<->storage ID bridge so stream updates can scope writes.
        for persisted_message in persisted_messages {
            let message_id = self.alloc_message_id();
            storage_message_ids.insert(message_id, persisted_message.id);
            hydrated_messages.push(ChatMessage::new(
                message_id,
                storage_role_to_chat(persisted_message.role),
                persisted_message.content,
                MessageStatus::Done,
            ));
        }

        self.conversation.messages = hydrated_messages;
        self.storage_message_ids = storage_message_ids;
    }

    fn initialize_provider(
        settings_state: &Entity<SettingsState>,
        cx: &mut Context<Self>,
    ) -> (Option<Arc<dyn LlmProvider>>, String, Option<String>) {
        let settings = settings_state.read(cx).settings();
        let default_model_from_settings = settings.model_name();

        if settings.is_valid() {
            match Self::create_provider_from_settings(&settings) {
                Ok((provider, model_id)) => {
                    tracing::info!("initialized provider from persisted settings");
                    return (provider, model_id, None);
                }
                Err(e) => {
                    tracing::warn!(
                        "failed to create provider from persisted settings, falling back: {}",
                        e
                    );
                }
            }
        }

        let (provider, environment_model_id, provider_error) = Self::provider_from_environment();
        if provider.is_some() {
            (provider, environment_model_id, provider_error)
        } else {
            (provider, default_model_from_settings, provider_error)
        }
    }

    fn create_provider_from_settings(
        settings: &crate::settings::state::EditorSettings,
    ) -> Result<(Option<Arc<dyn LlmProvider>>, String), ProviderError> {
        let config = settings.to_provider_config();
        let model_id = settings.model_name();

        let Some(config) = config else {
            return Ok((None, model_id));
        };

        match create_provider(config) {
            Ok(provider) => Ok((Some(provider), model_id)),
            Err(error) => Err(error),
        }
    }

    fn provider_from_environment() -> (Option<Arc<dyn LlmProvider>>, String, Option<String>) {
        let api_key = std::env::var("OPENAI_API_KEY")
            .ok()
            .map(|value| value.trim().to_string())
            .filter(|value| !value.is_empty());

        let Some(api_key) = api_key else {
            return (None, DEFAULT_OPENAI_MODEL.to_string(), None);
        };

        let model_id = std::env::var("OPENAI_MODEL")
            .ok()
            .map(|value| value.trim().to_string())
            .filter(|value| !value.is_empty())
            .unwrap_or_else(|| DEFAULT_OPENAI_MODEL.to_string());

        let endpoint = std::env::var("OPENAI_BASE_URL")
            .unwrap_or_else(|_| crate::settings::state::DEFAULT_ENDPOINT.to_string());

        let config = ProviderConfig::new("openai", api_key, endpoint);

        match create_provider(config) {
            Ok(provider) => (Some(provider), model_id, None),
            Err(error) => {
                tracing::error!("failed to initialize provider adapter: {error}");
                (None, model_id, Some(format!("Provider error: {}", error)))
            }
        }
    }

    fn handle_settings_changed(&mut self, event: &SettingsChanged, cx: &mut Context<Self>) {
        if self.active_stream.is_some() {
            self.cancel_active_stream(cx);
        }

        let model_id = event.settings.model_name();

        match Self::create_provider_from_settings(&event.settings) {
            Ok((provider, _)) => {
                self.provider = provider;
                self.current_model_id = model_id;
                self.provider_error = None;
                tracing::info!("reloaded provider adapter with new settings");
            }
            Err(error) => {
                self.provider = None;
                self.provider_error = Some(format!("{}", error));
                self.current_model_id = model_id;
                tracing::error!("failed to reload provider adapter: {error}");
            }
        }

        cx.notify();
    }

    fn handle_submit(&mut self, event: Submit, cx: &mut Context<Self>) {
        if event.target.conversation_id != self.conversation.id {
            return;
        }

        if self.active_stream.is_some() {
            // Single-stream rule: ignore additional submits while one stream is active.
            return;
        }

        if self.provider.is_none() {
            self.push_provider_not_configured_error(cx);
            return;
        }

        let user_message_id = self.alloc_message_id();
        let assistant_message_id = self.alloc_message_id();

        if self
            .conversation
            .apply_stream_transition(event.start_transition())
            .is_err()
        {
            return;
        }

        self.conversation.messages.push(ChatMessage::user_done(
            user_message_id,
            event.content.clone(),
        ));
        self.conversation.messages.push(ChatMessage::assistant_streaming(
            assistant_message_id,
            event.target.session_id,
        ));

        let request_messages = Self::build_provider_messages(&self.conversation);

        // Persist user/assistant inserts after transition acceptance to keep stream lifecycle ordering unchanged.
        self.persist_inserted_message(user_message_id, Role::User, event.content.clone());
        self.persist_inserted_message(assistant_message_id, Role::Assistant, String::new());

        self.active_stream = Some(ActiveStream {
            target: event.target,
            assistant_message_id,
            request_messages: request_messages.clone(),
        });

        self.pending_stream_chunk.clear();
        self.stream_debounce_task = None;

        self.input.update(cx, |input, cx| {
            input.set_streaming(true, cx);
        });

        self.sync_messages(cx, false);

        // Reserve the next session id immediately so follow-up submissions never reuse a target.
        self.next_stream_session_id = self.next_stream_session_id.saturating_add(1);

        let request = StreamRequest::new(
            Self::chat_target_to_provider(event.target),
            self.current_model_id.clone(),
            request_messages,
        )
        .with_temperature(REQUEST_TEMPERATURE);

        let stream_result = match self.provider.as_ref() {
            Some(provider) => provider.stream_chat(request),
            None => return,
        };

        match stream_result {
            Ok(handle) => self.spawn_stream_pipeline(handle, cx),
            Err(error) => {
                self.finish_stream_with_error(event.target, error.to_string(), cx);
            }
        }
    }

    fn spawn_stream_pipeline(&mut self, handle: ProviderStreamHandle, cx: &mut Context<Self>) {
        self.stream_worker_task = Some(Tokio::spawn(cx, handle.worker));
        self.spawn_stream_reader(handle.stream, cx);
    }

    fn handle_stop(&mut self, event: Stop, cx: &mut Context<Self>) {
        let Some(active_stream) = self.active_stream.as_ref() else {
            return;
        };

        if active_stream.target != event.target {
            // Ignore stale stop events that do not match the in-flight stream target.
            return;
        }

        self.cancel_active_stream(cx);
    }

    fn spawn_stream_reader(&mut self, mut stream: ProviderEventStream, cx: &mut Context<Self>) {
        let stream_target = stream.target();

        self.stream_reader_task = Some(cx.spawn(async move |this, cx| {
            while let Some(event) = stream.recv().await {
                let _ = this.update(cx, |this, cx| {
                    this.handle_stream_event(event, cx);
                });
            }

            let _ = this.update(cx, |this, cx| {
                this.handle_stream_reader_closed(stream_target, cx);
            });
        }));
    }

    fn handle_stream_event(&mut self, event: ProviderStreamEventMapped, cx: &mut Context<Self>) {
        // Provider events carry montage-llm typed IDs; normalize them to chat-domain IDs
        // before stale-session checks so stream isolation logic stays consistent.
        let event_target = Self::provider_target_to_chat(event.target);

        if !self.stream_event_is_current(event_target) {
            // Strict target equality prevents chunk leakage across session boundaries.
            return;
        }

        match event.payload {
            ProviderStreamEventPayload::Delta(chunk)
            | ProviderStreamEventPayload::ReasoningDelta(chunk) => {
                self.pending_stream_chunk.push_str(&chunk);
                self.schedule_debounced_stream_flush(cx);
            }
            ProviderStreamEventPayload::Done => {
                self.flush_pending_stream_chunk(cx);
                self.finish_stream_with_done(event_target, cx);
            }
            ProviderStreamEventPayload::Error(message) => {
                self.flush_pending_stream_chunk(cx);
                self.finish_stream_with_error(event_target, message, cx);
            }
        }
    }

    fn handle_stream_reader_closed(
        &mut self,
        target: ProviderStreamTarget,
        cx: &mut Context<Self>,
    ) {
        let target = Self::provider_target_to_chat(target);
        self.stream_worker_task = None;
        self.stream_reader_task = None;

        if self.stream_event_is_current(target) {
            self.finish_stream_with_error(
                target,
                "provider stream ended before a terminal event".to_string(),
                cx,
            );
        }
    }

    fn schedule_debounced_stream_flush(&mut self, cx: &mut Context<Self>) {
        if self.stream_debounce_task.is_some() {
            return;
        }

        self.stream_debounce_task = Some(cx.spawn(async move |this, cx| {
            // Debounce token bursts into a single UI mutation roughly every 50ms.
            cx.background_executor()
                .timer(Duration::from_millis(STREAM_DEBOUNCE_MS))
                .await;

            let _ = this.update(cx, |this, cx| {
                this.flush_pending_stream_chunk(cx);
                this.stream_debounce_task = None;
            });
        }));
    }

    fn flush_pending_stream_chunk(&mut self, cx: &mut Context<Self>) {
        if self.pending_stream_chunk.is_empty() {
            return;
        }

        let Some(active_stream) = self.active_stream.as_ref() else {
            self.pending_stream_chunk.clear();
            return;
        };
        let target = active_stream.target;
        let assistant_message_id = active_stream.assistant_message_id;

        if !self.stream_event_is_current(target) {
            self.pending_stream_chunk.clear();
            return;
        }

        let chunk = std::mem::take(&mut self.pending_stream_chunk);
        let mut persisted_assistant_content = None;

        if let Some(message) = self
            .conversation
            .messages
            .iter_mut()
            .find(|message| message.id == assistant_message_id)
        {
            message.content.push_str(&chunk);
            persisted_assistant_content = Some(message.content.clone());
        }

        if let Some(content) = persisted_assistant_content {
            self.persist_updated_message(assistant_message_id, content);
        }

        self.sync_messages(cx, false);
    }

    fn finish_stream_with_done(&mut self, target: StreamTarget, cx: &mut Context<Self>) {
        self.finalize_stream(
            target,
            MessageStatus::Done,
            StreamTransition::Complete(target),
            cx,
        );
    }

    fn finish_stream_with_error(
        &mut self,
        target: StreamTarget,
        message: String,
        cx: &mut Context<Self>,
    ) {
        self.finalize_stream(
            target,
            MessageStatus::Error(message.clone()),
            StreamTransition::Fail { target, message },
            cx,
        );
    }

    fn cancel_active_stream(&mut self, cx: &mut Context<Self>) {
        let Some(active_stream) = self.active_stream.as_ref() else {
            return;
        };
        let target = active_stream.target;

        // Dropping the task cancels the stream reader and drops ProviderEventStream,
        // which in turn signals cancellation to the provider worker.
        self.stream_worker_task = None;
        self.stream_reader_task = None;

        self.finalize_stream(
            target,
            MessageStatus::Cancelled,
            StreamTransition::Cancel(target),
            cx,
        );
    }

    fn finalize_stream(
        &mut self,
        target: StreamTarget,
        final_status: MessageStatus,
        transition: StreamTransition,
        cx: &mut Context<Self>,
    ) {
        let Some(active_stream) = self.active_stream.as_ref() else {
            return;
        };

        if active_stream.target != target {
            return;
        }

        let assistant_message_id = active_stream.assistant_message_id;
        let stream_completed = matches!(final_status, MessageStatus::Done);

        self.pending_stream_chunk.clear();
        self.stream_debounce_task = None;
        self.stream_worker_task = None;

        let _ = self.conversation.apply_stream_transition(transition);

        let mut persisted_assistant_content = None;
        if let Some(message) = self
            .conversation
            .messages
            .iter_mut()
            .find(|message| message.id == assistant_message_id)
        {
            message.status = final_status;
            persisted_assistant_content = Some(message.content.clone());
        }

        if let Some(content) = persisted_assistant_content.clone() {
            self.persist_updated_message(assistant_message_id, content);
        }

        if stream_completed {
            let request_messages = self
                .active_stream
                .as_ref()
                .map(|active| active.request_messages.as_slice())
                .unwrap_or_default();
            let usage = estimate_token_usage(
                request_messages,
                persisted_assistant_content.as_deref().unwrap_or_default(),
            );
            tracing::info!(
                target = ?target,
                prompt_tokens = usage.prompt_tokens,
                completion_tokens = usage.completion_tokens,
                total_tokens = usage.total_tokens,
                "stream completed"
            );
        }

        self.active_stream = None;
        self.input.update(cx, |input, cx| {
            input.set_streaming(false, cx);
        });

        self.update_input_stream_target(cx);
        self.sync_messages(cx, false);
        cx.notify();
    }

    fn update_input_stream_target(&mut self, cx: &mut Context<Self>) {
        let target = StreamTarget::new(
            self.conversation.id,
            StreamSessionId::new(self.next_stream_session_id),
        );

        self.input.update(cx, |input, cx| {
            input.set_stream_target(target, cx);
        });
    }

    fn sync_messages(&mut self, cx: &mut Context<Self>, reset_scroll: bool) {
        let messages = self.conversation.messages.clone();

        self.message_list.update(cx, |list, cx| {
            if reset_scroll {
                list.reset_scroll_tracking(cx);
            }
            list.set_messages(messages, cx);
        });
    }

    fn persist_inserted_message(&mut self, message_id: MessageId, role: Role, content: String) {
        let (Some(storage), Some(session_id)) = (self.storage.as_ref(), self.storage_session_id)
        else {
            return;
        };

        match storage.append_message(
            session_id,
            NewMessage {
                role: chat_role_to_storage(role),
                content,
            },
        ) {
            Ok(persisted_message) => {
                self.storage_message_ids
                    .insert(message_id, persisted_message.id);
            }
            Err(error) => {
                tracing::error!("failed to append persisted message: {error}");
            }
        }
    }

    fn persist_updated_message(&mut self, message_id: MessageId, content: String) {
        let (Some(storage), Some(session_id)) = (self.storage.as_ref(), self.storage_session_id)
        else {
            return;
        };

        let Some(storage_message_id) = self.storage_message_ids.get(&message_id).copied() else {
            tracing::warn!("missing persisted message mapping for message={message_id:?}");
            return;
        };

        // All message mutations stay scoped by (session_id, message_id) to prevent cross-session writes.
        if let Err(error) = storage.update_message(
            session_id,
            storage_message_id,
            MessagePatch {
                content: Some(content),
            },
        ) {
            tracing::error!("failed to update persisted message {storage_message_id}: {error}");
        }
    }

    fn build_provider_messages(conversation: &Conversation) -> Vec<ProviderMessage> {
        conversation
            .messages
            .iter()
            .filter(|message| !message.content.trim().is_empty())
            .filter(|message| !matches!(message.status, MessageStatus::Streaming(_)))
            .map(|message| {
                // Keep role mapping explicit at the crate boundary so llm types stay
                // decoupled from chat domain enums.
                ProviderMessage::new(
                    Self::chat_role_to_provider(message.role),
                    message.content.clone(),
                )
            })
            .collect()
    }

    fn chat_role_to_provider(role: Role) -> ProviderRole {
        match role {
            Role::System => ProviderRole::System,
            Role::User => ProviderRole::User,
            Role::Assistant => ProviderRole::Assistant,
        }
    }

    fn chat_target_to_provider(target: StreamTarget) -> ProviderStreamTarget {
        // Preserve numeric identity while translating between domain-specific typed wrappers.
        ProviderStreamTarget::new(
            montage_llm::ConversationId::new(target.conversation_id.0),
            montage_llm::StreamSessionId::new(target.session_id.0),
        )
    }

    fn provider_target_to_chat(target: ProviderStreamTarget) -> StreamTarget {
        // Convert provider routing keys back into chat routing keys for state transitions.
        StreamTarget::new(
            ConversationId::new(target.conversation_id.0),
            StreamSessionId::new(target.session_id.0),
        )
    }

    fn push_provider_not_configured_error(&mut self, cx: &mut Context<Self>) {
        let message_id = self.alloc_message_id();

        let error_text = if let Some(ref error) = self.provider_error {
            format!(
                "Provider configuration error: {}. Please check settings.",
                error
            )
        } else {
            "Provider is not configured. Please set API key in settings.".to_string()
        };
        let persisted_error_text = error_text.clone();

        self.conversation.messages.push(ChatMessage::new(
            message_id,
            Role::Assistant,
            error_text,
            MessageStatus::Error("Provider not configured".to_string()),
        ));

        self.persist_inserted_message(message_id, Role::Assistant, persisted_error_text);

        self.sync_messages(cx, false);
        cx.notify();
    }

    fn stream_event_is_current(&self, target: StreamTarget) -> bool {
        self.active_stream
            .as_ref()
            .is_some_and(|active_stream| active_stream.target == target)
            && self.conversation.stream_state.accepts_stream_event(target)
    }

    fn alloc_message_id(&mut self) -> MessageId {
        let id = MessageId::new(self.next_message_id);
        self.next_message_id = self.next_message_id.saturating_add(1);
        id
    }

    fn alloc_conversation_id(&mut self) -> ConversationId {
        let id = ConversationId::new(self.next_conversation_id);
        self.next_conversation_id = self.next_conversation_id.saturating_add(1);
        id
    }
}

fn chat_role_to_storage(role: Role) -> StorageMessageRole {
    match role {
        Role::System => StorageMessageRole::System,
        Role::User => StorageMessageRole::User,
        Role::Assistant => StorageMessageRole::Assistant,
    }
}

fn storage_role_to_chat(role: StorageMessageRole) -> Role {
    match role {
        StorageMessageRole::System => Role::System,
        StorageMessageRole::User => Role::User,
        StorageMessageRole::Assistant => Role::Assistant,
    }
}

impl Render for ChatBubblePanel {
    fn render(&mut self, _window: &mut Window, cx: &mut Context<Self>) -> impl IntoElement {
        let theme = cx.theme();

        v_flex()
            .id("chat-bubble-panel")
            .relative()
            .size_full()
            .min_h_0()
            .overflow_hidden()
            .bg(theme.background)
            .child(
                h_flex()
                    .id("chat-bubble-panel-header")
                    .w_full()
                    .flex_shrink_0()
                    .items_center()
                    .justify_between()
                    .px_3()
                    .py_2()
                    .border_b_1()
                    .border_color(theme.border)
                    .child(
                        Label::new(self.conversation.title.clone())
                            .text_sm()
                            .text_color(theme.foreground.opacity(0.8)),
                    )
                    .child(
                        Button::new("chat-new-session")
                            .ghost()
                            .small()
                            .icon(IconName::Plus)
                            .on_click(cx.listener(|this, _, _window, cx| {
                                this.start_new_session(cx);
                            })),
                    ),
            )
            .child(
                div()
                    .id("chat-bubble-panel-list")
                    .flex_1()
                    .min_h_0()
                    .child(self.message_list.clone()),
            )
            .child(
                div()
                    .id("chat-bubble-panel-input")
                    .flex_shrink_0()
                    .w_full()
                    .border_t_1()
                    .border_color(theme.border)
                    .child(self.input.clone()),
            )
    }
}
