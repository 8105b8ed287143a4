#![deny(unsafe_code)]

/// Editor shell and window chrome.
///
/// This crate provides the montage desktop editor built with GPUI and
/// gpui-component: a media library sidebar, a frame-thumbnail timeline, and a
/// chat copilot panel backed by a streaming LLM provider.
pub mod app;
/// Chat copilot components and domain contracts.
pub mod chat;
/// Media library sidebar.
pub mod media_panel;
/// Settings persistence and UI.
pub mod settings;
/// Timeline strip and thumbnail geometry.
pub mod timeline;
/// Returns a stable marker used by integration smoke tests.
pub fn smoke_marker() -> &'static str {
    "montage"
}
