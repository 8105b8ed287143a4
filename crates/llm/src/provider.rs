use std::future::Future;
use std::pin::Pin;

use snafu::Snafu;
use tokio::sync::{mpsc, oneshot};

use super::model::{Model, ModelCatalog};

/// Provider-side copy of the conversation identifier.
///
/// The crate keeps its own typed ids so chat-domain enums never leak into
/// provider plumbing; callers translate at the boundary.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ConversationId(pub u64);

impl ConversationId {
    pub const fn new(raw: u64) -> Self {
        Self(raw)
    }
}

/// Provider-side copy of the streaming session identifier.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct StreamSessionId(pub u64);

impl StreamSessionId {
    pub const fn new(raw: u64) -> Self {
        Self(raw)
    }
}

/// Routing key attached to every stream event for stale-chunk rejection.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct StreamTarget {
    pub conversation_id: ConversationId,
    pub session_id: StreamSessionId,
}

impl StreamTarget {
    pub const fn new(conversation_id: ConversationId, session_id: StreamSessionId) -> Self {
        Self {
            conversation_id,
            session_id,
        }
    }
}

/// Chat speaker role as providers understand it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Role {
    System,
    User,
    Assistant,
}

/// Provider-agnostic stream payload.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StreamEventPayload {
    Delta(String),
    ReasoningDelta(String),
    Done,
    Error(String),
}

/// One mapped provider stream event, tagged with its routing key.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StreamEventMapped {
    pub target: StreamTarget,
    pub payload: StreamEventPayload,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProviderConfig {
    pub provider_id: String,
    pub api_key: String,
    pub endpoint: String,
}

impl ProviderConfig {
    pub fn new(
        provider_id: impl Into<String>,
        api_key: impl Into<String>,
        endpoint: impl Into<String>,
    ) -> Self {
        Self {
            provider_id: provider_id.into().trim().to_string(),
            api_key: api_key.into().trim().to_string(),
            endpoint: endpoint.into().trim().to_string(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProviderMessage {
    pub role: Role,
    pub content: String,
}

impl ProviderMessage {
    pub fn new(role: Role, content: impl Into<String>) -> Self {
        Self {
            role,
            content: content.into(),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct StreamRequest {
    pub target: StreamTarget,
    pub model_id: String,
    pub messages: Vec<ProviderMessage>,
    pub preamble: Option<String>,
    pub temperature: Option<f64>,
    pub max_tokens: Option<u64>,
}

impl StreamRequest {
    pub fn new(
        target: StreamTarget,
        model_id: impl Into<String>,
        messages: Vec<ProviderMessage>,
    ) -> Self {
        Self {
            target,
            model_id: model_id.into(),
            messages,
            preamble: None,
            temperature: None,
            max_tokens: None,
        }
    }

    pub fn with_preamble(mut self, preamble: impl Into<String>) -> Self {
        self.preamble = Some(preamble.into());
        self
    }

    pub fn with_temperature(mut self, temperature: f64) -> Self {
        self.temperature = Some(temperature);
        self
    }

    pub fn with_max_tokens(mut self, max_tokens: u64) -> Self {
        self.max_tokens = Some(max_tokens);
        self
    }
}

pub type BoxFuture<'a, T> = Pin<Box<dyn Future<Output = T> + Send + 'a>>;
pub type ProviderWorker = Pin<Box<dyn Future<Output = ()> + Send + 'static>>;
pub type ProviderResult<T> = Result<T, ProviderError>;

#[derive(Debug, Snafu)]
#[snafu(visibility(pub(crate)))]
pub enum ProviderError {
    #[snafu(display("missing API key for provider '{provider_id}'"))]
    MissingApiKey {
        stage: &'static str,
        provider_id: String,
    },
    #[snafu(display("provider '{provider_id}' is not supported"))]
    UnsupportedProvider {
        stage: &'static str,
        provider_id: String,
    },
    #[snafu(display("stream request for {target:?} has no messages"))]
    EmptyMessageSet {
        stage: &'static str,
        target: StreamTarget,
    },
    #[snafu(display("http client failed on `{stage}`, {source}"))]
    HttpClient {
        stage: &'static str,
        source: rig::http_client::Error,
    },
    #[snafu(display("failed to finalize HTTP request body: {message}"))]
    BuildHttpRequestBody {
        stage: &'static str,
        message: String,
    },
    #[snafu(display("provider model endpoint returned status {status}: {body}"))]
    ModelFetchStatus {
        stage: &'static str,
        status: u16,
        body: String,
    },
    #[snafu(display("failed to parse provider model list: {details}"))]
    ModelPayloadParse {
        stage: &'static str,
        details: String,
    },
    #[snafu(display("completions failed on `{stage}`, {source}"))]
    CompletionsFailed {
        stage: &'static str,
        source: rig::completion::CompletionError,
    },
}

pub struct ProviderEventStream {
    target: StreamTarget,
    events: mpsc::UnboundedReceiver<StreamEventMapped>,
    cancel_tx: Option<oneshot::Sender<()>>,
}

pub struct ProviderStreamHandle {
    pub stream: ProviderEventStream,
    pub worker: ProviderWorker,
}

impl ProviderEventStream {
    pub(crate) fn new(
        target: StreamTarget,
        events: mpsc::UnboundedReceiver<StreamEventMapped>,
        cancel_tx: oneshot::Sender<()>,
    ) -> Self {
        Self {
            target,
            events,
            cancel_tx: Some(cancel_tx),
        }
    }

    pub fn target(&self) -> StreamTarget {
        self.target
    }

    pub async fn recv(&mut self) -> Option<StreamEventMapped> {
        self.events.recv().await
    }

    pub fn try_recv(&mut self) -> Option<StreamEventMapped> {
        self.events.try_recv().ok()
    }

    pub fn cancel(&mut self) -> bool {
        self.cancel_tx
            .take()
            .map(|tx| tx.send(()).is_ok())
            .unwrap_or(false)
    }
}

impl Drop for ProviderEventStream {
    fn drop(&mut self) {
        if let Some(cancel_tx) = self.cancel_tx.take() {
            let _ = cancel_tx.send(());
        }
    }
}

pub trait LlmProvider: Send + Sync {
    fn id(&self) -> &str;
    fn name(&self) -> &str;
    fn default_model(&self) -> &str;
    fn fallback_models(&self) -> &[Model];
    fn fetch_models<'a>(&'a self) -> BoxFuture<'a, ProviderResult<ModelCatalog>>;
    fn stream_chat(&self, request: StreamRequest) -> ProviderResult<ProviderStreamHandle>;
}

pub(crate) fn make_event_stream(
    target: StreamTarget,
) -> (
    mpsc::UnboundedSender<StreamEventMapped>,
    ProviderEventStream,
    oneshot::Receiver<()>,
) {
    let (event_tx, event_rx) = mpsc::unbounded_channel();
    let (cancel_tx, cancel_rx) = oneshot::channel();
    (
        event_tx,
        ProviderEventStream::new(target, event_rx, cancel_tx),
        cancel_rx,
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    fn test_target() -> StreamTarget {
        StreamTarget::new(ConversationId::new(7), StreamSessionId::new(3))
    }

    #[test]
    fn provider_config_trims_all_fields() {
        let config = ProviderConfig::new(" openai ", " sk-test ", " https://example.test/v1 ");
        assert_eq!(config.provider_id, "openai");
        assert_eq!(config.api_key, "sk-test");
        assert_eq!(config.endpoint, "https://example.test/v1");
    }

    #[test]
    fn stream_request_builders_layer_optional_fields() {
        let request = StreamRequest::new(test_target(), "gpt-4o-mini", Vec::new())
            .with_preamble("You are a video editing copilot.")
            .with_temperature(0.7)
            .with_max_tokens(512);

        assert_eq!(request.model_id, "gpt-4o-mini");
        assert_eq!(
            request.preamble.as_deref(),
            Some("You are a video editing copilot.")
        );
        assert_eq!(request.temperature, Some(0.7));
        assert_eq!(request.max_tokens, Some(512));
    }

    #[tokio::test]
    async fn event_stream_delivers_in_order_and_cancels_once() {
        let target = test_target();
        let (event_tx, mut stream, mut cancel_rx) = make_event_stream(target);

        event_tx
            .send(StreamEventMapped {
                target,
                payload: StreamEventPayload::Delta("a".to_string()),
            })
            .expect("send delta");
        event_tx
            .send(StreamEventMapped {
                target,
                payload: StreamEventPayload::Done,
            })
            .expect("send done");

        assert_eq!(
            stream.recv().await.map(|event| event.payload),
            Some(StreamEventPayload::Delta("a".to_string()))
        );
        assert_eq!(
            stream.recv().await.map(|event| event.payload),
            Some(StreamEventPayload::Done)
        );

        assert!(stream.cancel());
        assert!(!stream.cancel());
        assert!(cancel_rx.try_recv().is_ok());
    }

    #[tokio::test]
    async fn dropping_the_stream_signals_cancellation() {
        let (_event_tx, stream, mut cancel_rx) = make_event_stream(test_target());
        drop(stream);
        assert!(cancel_rx.try_recv().is_ok());
    }
}
