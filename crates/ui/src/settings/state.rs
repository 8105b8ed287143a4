use std::path::PathBuf;
use std::sync::Arc;

use arc_swap::ArcSwap;
use figment::{
    Figment,
    providers::{Format, Json, Serialized},
};
use gpui::*;
use gpui_component::{Theme, ThemeMode, ThemeRegistry};
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use snafu::{ResultExt, Snafu};

use crate::timeline::thumbnail::ThumbnailMode;
use montage_llm::{DEFAULT_OPENAI_MODEL, ProviderConfig};

pub const DEFAULT_PROVIDER_ID: &str = "openai";
pub const DEFAULT_ENDPOINT: &str = "https://api.openai.com/v1";
pub const SETTINGS_DIRECTORY_NAME: &str = "montage";
pub const SETTINGS_FILE_NAME: &str = "settings.json";
/// Environment override for the media library root.
pub const MEDIA_ROOT_ENV_VAR: &str = "MONTAGE_MEDIA_ROOT";

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EditorSettings {
    #[serde(default = "default_provider_id")]
    pub provider_id: String,
    #[serde(default)]
    pub api_key: String,
    #[serde(default = "default_endpoint")]
    pub endpoint: String,
    #[serde(default = "default_model")]
    pub model: String,
    #[serde(
        default = "default_theme_mode",
        serialize_with = "serialize_theme_mode",
        deserialize_with = "deserialize_theme_mode"
    )]
    pub theme_mode: ThemeMode,
    #[serde(default)]
    pub theme_name: String,
    #[serde(default = "default_media_root")]
    pub media_root: String,
    #[serde(default)]
    pub thumbnail_mode: ThumbnailMode,
}

impl Default for EditorSettings {
    fn default() -> Self {
        Self {
            provider_id: default_provider_id(),
            api_key: String::new(),
            endpoint: default_endpoint(),
            model: default_model(),
            theme_mode: default_theme_mode(),
            theme_name: String::new(),
            media_root: default_media_root(),
            thumbnail_mode: ThumbnailMode::default(),
        }
    }
}

impl EditorSettings {
    pub fn to_provider_config(&self) -> Option<ProviderConfig> {
        if self.api_key.trim().is_empty() {
            return None;
        }

        Some(ProviderConfig::new(
            &self.provider_id,
            &self.api_key,
            &self.endpoint,
        ))
    }

    pub fn is_valid(&self) -> bool {
        !self.api_key.trim().is_empty()
    }

    pub fn model_name(&self) -> String {
        let name = self.model.trim();
        if name.is_empty() {
            DEFAULT_OPENAI_MODEL.to_string()
        } else {
            name.to_string()
        }
    }

    /// Media library root, with the environment variable taking precedence
    /// over the persisted value.
    pub fn resolved_media_root(&self) -> PathBuf {
        let env_root = std::env::var(MEDIA_ROOT_ENV_VAR)
            .ok()
            .map(|value| value.trim().to_string())
            .filter(|value| !value.is_empty());

        match env_root {
            Some(root) => PathBuf::from(root),
            None => PathBuf::from(&self.media_root),
        }
    }

    pub fn normalized(mut self) -> Self {
        self.provider_id = if self.provider_id.trim().is_empty() {
            default_provider_id()
        } else {
            self.provider_id.trim().to_string()
        };
        self.api_key = self.api_key.trim().to_string();
        self.endpoint = if self.endpoint.trim().is_empty() {
            default_endpoint()
        } else {
            self.endpoint.trim().to_string()
        };
        self.model = if self.model.trim().is_empty() {
            default_model()
        } else {
            self.model.trim().to_string()
        };
        self.theme_name = self.theme_name.trim().to_string();
        self.media_root = if self.media_root.trim().is_empty() {
            default_media_root()
        } else {
            self.media_root.trim().to_string()
        };

        self
    }

    pub fn apply_theme(&self, window: Option<&mut Window>, cx: &mut App) {
        if let Some(theme_config) = ThemeRegistry::global(cx)
            .themes()
            .get(&SharedString::from(self.theme_name.trim().to_string()))
            .cloned()
        {
            let mode = theme_config.mode;
            let theme = Theme::global_mut(cx);
            if mode.is_dark() {
                theme.dark_theme = theme_config;
            } else {
                theme.light_theme = theme_config;
            }
            Theme::change(mode, window, cx);
            return;
        }

        Theme::change(self.theme_mode, window, cx);
    }
}

pub struct SettingsStore {
    settings: Arc<ArcSwap<EditorSettings>>,
    config_path: PathBuf,
}

impl SettingsStore {
    pub fn default_config_dir() -> PathBuf {
        dirs::config_dir()
            .map(|path| path.join(SETTINGS_DIRECTORY_NAME))
            .unwrap_or_else(|| PathBuf::from(".montage"))
    }

    pub fn default_config_path() -> PathBuf {
        Self::default_config_dir().join(SETTINGS_FILE_NAME)
    }

    pub fn new(config_path: PathBuf) -> Self {
        let settings = Self::load_from_disk(&config_path);
        Self {
            settings: Arc::new(ArcSwap::from_pointee(settings)),
            config_path,
        }
    }

    pub fn load() -> Self {
        Self::new(Self::default_config_path())
    }

    pub fn settings(&self) -> Arc<EditorSettings> {
        self.settings.load_full()
    }

    pub fn update(&self, settings: EditorSettings) -> Result<(), SettingsError> {
        let normalized_settings = settings.normalized();
        self.persist(&normalized_settings)?;
        self.settings.store(Arc::new(normalized_settings));
        Ok(())
    }

    fn load_from_disk(path: &PathBuf) -> EditorSettings {
        if !path.exists() {
            tracing::info!("settings file not found at {:?}, using defaults", path);
            return EditorSettings::default();
        }

        let figment =
            Figment::from(Serialized::defaults(EditorSettings::default())).merge(Json::file(path));

        match figment.extract::<EditorSettings>() {
            Ok(settings) => settings.normalized(),
            Err(error) => {
                tracing::warn!(
                    "failed to parse settings from {:?}: {}. using defaults",
                    path,
                    error
                );
                EditorSettings::default()
            }
        }
    }

    fn persist(&self, settings: &EditorSettings) -> Result<(), SettingsError> {
        if let Some(parent) = self.config_path.parent() {
            std::fs::create_dir_all(parent).context(CreateDirSnafu {
                stage: "create-settings-directory",
                path: parent.to_path_buf(),
            })?;
        }

        let content = serde_json::to_string_pretty(settings).context(SerializeConfigSnafu {
            stage: "serialize-settings-json",
        })?;

        let temp_path = self.config_path.with_extension("json.tmp");
        std::fs::write(&temp_path, content).context(WriteFileSnafu {
            stage: "write-temporary-settings-file",
            path: temp_path.clone(),
        })?;

        std::fs::rename(&temp_path, &self.config_path).context(RenameTempFileSnafu {
            stage: "rename-temporary-settings-file",
            from: temp_path,
            to: self.config_path.clone(),
        })?;

        tracing::info!("saved settings to {:?}", self.config_path);
        Ok(())
    }
}

#[derive(Debug, Snafu)]
#[snafu(visibility(pub(crate)))]
pub enum SettingsError {
    #[snafu(display("failed to create settings directory at {path:?} on `{stage}`: {source}"))]
    CreateDir {
        stage: &'static str,
        path: PathBuf,
        source: std::io::Error,
    },
    #[snafu(display("failed to serialize settings on `{stage}`: {source}"))]
    SerializeConfig {
        stage: &'static str,
        source: serde_json::Error,
    },
    #[snafu(display("failed to write settings file at {path:?} on `{stage}`: {source}"))]
    WriteFile {
        stage: &'static str,
        path: PathBuf,
        source: std::io::Error,
    },
    #[snafu(display(
        "failed to replace settings file from {from:?} to {to:?} on `{stage}`: {source}"
    ))]
    RenameTempFile {
        stage: &'static str,
        from: PathBuf,
        to: PathBuf,
        source: std::io::Error,
    },
}

pub struct SettingsState {
    store: SettingsStore,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SettingsChanged {
    pub settings: EditorSettings,
}

impl EventEmitter<SettingsChanged> for SettingsState {}

impl SettingsState {
    pub fn new(cx: &mut App) -> Entity<Self> {
        cx.new(|_| Self {
            store: SettingsStore::load(),
        })
    }

    pub fn settings(&self) -> Arc<EditorSettings> {
        self.store.settings()
    }

    pub fn update_settings(
        &mut self,
        settings: EditorSettings,
        cx: &mut Context<Self>,
    ) -> Result<(), SettingsError> {
        let normalized_settings = settings.normalized();
        self.store.update(normalized_settings.clone())?;
        cx.emit(SettingsChanged {
            settings: normalized_settings,
        });
        cx.notify();
        Ok(())
    }
}

fn default_provider_id() -> String {
    DEFAULT_PROVIDER_ID.to_string()
}

fn default_endpoint() -> String {
    DEFAULT_ENDPOINT.to_string()
}

fn default_model() -> String {
    DEFAULT_OPENAI_MODEL.to_string()
}

fn default_media_root() -> String {
    dirs::video_dir()
        .map(|path| path.join("montage").display().to_string())
        .unwrap_or_else(|| "./media".to_string())
}

fn default_theme_mode() -> ThemeMode {
    ThemeMode::Light
}

fn serialize_theme_mode<S>(value: &ThemeMode, serializer: S) -> Result<S::Ok, S::Error>
where
    S: Serializer,
{
    serializer.serialize_str(value.name())
}

fn deserialize_theme_mode<'de, D>(deserializer: D) -> Result<ThemeMode, D::Error>
where
    D: Deserializer<'de>,
{
    let value = String::deserialize(deserializer)?;
    Ok(parse_theme_mode(&value))
}

fn parse_theme_mode(value: &str) -> ThemeMode {
    if value.trim().eq_ignore_ascii_case("dark") {
        ThemeMode::Dark
    } else {
        ThemeMode::Light
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn settings_file_round_trips_through_the_store() {
        let dir = tempfile::tempdir().expect("create settings dir");
        let config_path = dir.path().join("settings.json");

        let store = SettingsStore::new(config_path.clone());
        let mut settings = EditorSettings::default();
        settings.api_key = "sk-test".to_string();
        settings.thumbnail_mode = ThumbnailMode::Fill;
        settings.media_root = "/tmp/montage-library".to_string();
        store.update(settings).expect("persist settings");

        // A second store must observe the persisted values, including the
        // lowercase thumbnail mode on the wire.
        let raw = std::fs::read_to_string(&config_path).expect("read settings file");
        assert!(raw.contains("\"thumbnail_mode\": \"fill\""));

        let reloaded = SettingsStore::new(config_path);
        let loaded = reloaded.settings();
        assert_eq!(loaded.api_key, "sk-test");
        assert_eq!(loaded.thumbnail_mode, ThumbnailMode::Fill);
        assert_eq!(loaded.media_root, "/tmp/montage-library");
    }

    #[test]
    fn partial_settings_files_fall_back_to_defaults() {
        let dir = tempfile::tempdir().expect("create settings dir");
        let config_path = dir.path().join("settings.json");
        std::fs::write(&config_path, r#"{"thumbnail_mode":"fill"}"#).expect("write settings");

        let store = SettingsStore::new(config_path);
        let settings = store.settings();

        assert_eq!(settings.thumbnail_mode, ThumbnailMode::Fill);
        assert_eq!(settings.provider_id, DEFAULT_PROVIDER_ID);
        assert_eq!(settings.endpoint, DEFAULT_ENDPOINT);
        assert_eq!(settings.model, DEFAULT_OPENAI_MODEL);
    }

    #[test]
    fn malformed_settings_files_load_as_defaults() {
        let dir = tempfile::tempdir().expect("create settings dir");
        let config_path = dir.path().join("settings.json");
        std::fs::write(&config_path, "{not json").expect("write settings");

        let store = SettingsStore::new(config_path);
        assert_eq!(*store.settings(), EditorSettings::default());
    }

    #[test]
    fn normalization_restores_blank_required_fields() {
        let settings = EditorSettings {
            provider_id: "  ".to_string(),
            endpoint: String::new(),
            model: " ".to_string(),
            media_root: String::new(),
            ..EditorSettings::default()
        }
        .normalized();

        assert_eq!(settings.provider_id, DEFAULT_PROVIDER_ID);
        assert_eq!(settings.endpoint, DEFAULT_ENDPOINT);
        assert_eq!(settings.model, DEFAULT_OPENAI_MODEL);
        assert!(!settings.media_root.is_empty());
    }
}
