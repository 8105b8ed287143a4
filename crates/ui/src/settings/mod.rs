pub mod state;
pub mod view;

pub use state::{EditorSettings, SettingsChanged, SettingsState, SettingsStore};
pub use view::SettingsView;
