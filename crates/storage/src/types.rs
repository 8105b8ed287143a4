use super::ids::{MediaRefId, MessageId, SessionId};

/// Default session title applied when a caller supplies an empty one.
pub const DEFAULT_SESSION_TITLE: &str = "New Session";

/// Storage-local message role, intentionally decoupled from UI-layer role enums.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum MessageRole {
    System,
    User,
    Assistant,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SessionRecord {
    pub id: SessionId,
    pub title: String,
    pub created_at_unix_seconds: u64,
    pub updated_at_unix_seconds: u64,
    pub deleted_at_unix_seconds: Option<u64>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewSession {
    pub title: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct SessionPatch {
    pub title: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MessageRecord {
    pub id: MessageId,
    pub session_id: SessionId,
    pub seq: u64,
    pub role: MessageRole,
    pub content: String,
    pub deleted_at_unix_seconds: Option<u64>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewMessage {
    pub role: MessageRole,
    pub content: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct MessagePatch {
    pub content: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MediaRefRecord {
    pub id: MediaRefId,
    pub session_id: SessionId,
    pub message_id: MessageId,
    pub uri: String,
    pub mime_type: String,
    pub size_bytes: u64,
    pub duration_ms: Option<u64>,
    pub width_px: Option<u32>,
    pub height_px: Option<u32>,
    pub deleted_at_unix_seconds: Option<u64>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewMediaRef {
    pub uri: String,
    pub mime_type: String,
    pub size_bytes: u64,
    pub duration_ms: Option<u64>,
    pub width_px: Option<u32>,
    pub height_px: Option<u32>,
}
