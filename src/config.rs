use anyhow::Context;
use ratatui::style::Color;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

use crate::llm::Provider;
use crate::source::{builtin_sources, DataSource, SourceTable, NO_RESTRICTION};

/// RGB color represented as a 3-element array.
pub type Rgb = [u8; 3];

/// Default system prompt sent as the first message of every conversation.
pub const DEFAULT_SYSTEM_PROMPT: &str = "You are Eugene the AI Sea Cow, a friendly manatee who helps \
people find local government and community information. Answer clearly and concisely. Use **bold** \
for key facts, start list items with the • character followed by plain text (never begin a list \
item with bold or other formatting), and cite the sources you used.";

/// Per-provider connection settings.
#[derive(Debug, Clone, Default, Deserialize, Serialize, PartialEq)]
#[serde(default)]
pub struct ProviderConfigFile {
    /// API base URL (provider default when unset)
    pub api_base: Option<String>,
    /// API key (can also be set via the provider's env var)
    pub api_key: Option<String>,
}

/// LLM configuration for API access.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct LlmConfigFile {
    /// Model selected at startup
    pub default_model: String,
    /// Models offered in the menu
    pub models: Vec<String>,
    /// Let providers search the web
    pub web_search: bool,
    /// Temperature for generation
    pub temperature: Option<f32>,
    /// Max tokens for generation
    pub max_tokens: Option<u32>,
    /// First message of every conversation
    pub system_prompt: String,
    pub openai: ProviderConfigFile,
    pub anthropic: ProviderConfigFile,
}

impl Default for LlmConfigFile {
    fn default() -> Self {
        Self {
            default_model: "gpt-4o-mini".to_string(),
            models: vec![
                "gpt-4o-mini".to_string(),
                "gpt-4o".to_string(),
                "o4-mini-deep-research".to_string(),
                "claude-sonnet-4-5".to_string(),
                "claude-haiku-4-5".to_string(),
            ],
            web_search: true,
            temperature: Some(0.7),
            max_tokens: Some(4096),
            system_prompt: DEFAULT_SYSTEM_PROMPT.to_string(),
            openai: ProviderConfigFile::default(),
            anthropic: ProviderConfigFile::default(),
        }
    }
}

impl LlmConfigFile {
    /// Settings section for a provider.
    pub fn provider(&self, provider: Provider) -> &ProviderConfigFile {
        match provider {
            Provider::OpenAi => &self.openai,
            Provider::Anthropic => &self.anthropic,
        }
    }
}

/// Behavior configuration for the UI.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct BehaviorConfig {
    /// Number of lines to scroll with Page Up/Down
    pub scroll_page_size: usize,
    /// Event polling interval in milliseconds
    pub idle_poll_ms: u64,
    /// Cursor blink interval in milliseconds
    pub cursor_blink_ms: u64,
    /// Where exported transcripts go (current directory when unset)
    pub transcript_dir: Option<PathBuf>,
    /// Open exported transcripts in the browser
    pub open_transcript: bool,
}

impl Default for BehaviorConfig {
    fn default() -> Self {
        Self {
            scroll_page_size: 10,
            idle_poll_ms: 50,
            cursor_blink_ms: 530,
            transcript_dir: None,
            open_transcript: true,
        }
    }
}

/// Color configuration for the UI.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct ColorConfig {
    /// Chat area gradient start color (Teal by default)
    pub chat_gradient_start: Rgb,
    /// Chat area gradient end color (Blue by default)
    pub chat_gradient_end: Rgb,
    /// Input area gradient start color (Green by default)
    pub input_gradient_start: Rgb,
    /// Input area gradient end color (Cyan by default)
    pub input_gradient_end: Rgb,
    /// User bubble text
    pub user: Rgb,
    /// Assistant bubble text
    pub assistant: Rgb,
    /// Headings in assistant replies
    pub heading: Rgb,
    /// Inline and block code
    pub code: Rgb,
    /// Link labels
    pub link: Rgb,
    /// Menu background
    pub menu_bg: Rgb,
    /// Selected menu row background
    pub menu_selected_bg: Rgb,
    /// Status: Ready
    pub status_ready: Rgb,
    /// Status: Waiting for a reply
    pub status_sending: Rgb,
    /// Status: Error / not configured
    pub status_error: Rgb,
}

impl Default for ColorConfig {
    fn default() -> Self {
        Self {
            chat_gradient_start: [20, 184, 166], // Teal
            chat_gradient_end: [59, 130, 246],   // Blue
            input_gradient_start: [16, 185, 129], // Green
            input_gradient_end: [6, 182, 212],   // Cyan
            user: [125, 211, 252],
            assistant: [226, 232, 240],
            heading: [250, 204, 21],
            code: [251, 146, 60],
            link: [96, 165, 250],
            menu_bg: [25, 25, 35],
            menu_selected_bg: [60, 60, 80],
            status_ready: [100, 255, 100],
            status_sending: [100, 200, 255],
            status_error: [255, 100, 100],
        }
    }
}

impl ColorConfig {
    /// Convert an RGB array to a tuple for gradient math.
    pub fn to_tuple(rgb: &Rgb) -> (u8, u8, u8) {
        (rgb[0], rgb[1], rgb[2])
    }

    /// Convert an RGB array to a ratatui Color.
    pub fn to_color(rgb: &Rgb) -> Color {
        Color::Rgb(rgb[0], rgb[1], rgb[2])
    }

    /// Get chat gradient colors as tuples.
    pub fn chat_gradient(&self) -> ((u8, u8, u8), (u8, u8, u8)) {
        (
            Self::to_tuple(&self.chat_gradient_start),
            Self::to_tuple(&self.chat_gradient_end),
        )
    }

    /// Get input gradient colors as tuples.
    pub fn input_gradient(&self) -> ((u8, u8, u8), (u8, u8, u8)) {
        (
            Self::to_tuple(&self.input_gradient_start),
            Self::to_tuple(&self.input_gradient_end),
        )
    }
}

/// Data source configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct SourcesConfig {
    /// Source selected at startup
    pub default: String,
    /// The source table
    pub entries: Vec<DataSource>,
}

impl Default for SourcesConfig {
    fn default() -> Self {
        Self {
            default: NO_RESTRICTION.to_string(),
            entries: builtin_sources(),
        }
    }
}

impl SourcesConfig {
    /// Build the lookup table.
    pub fn table(&self) -> SourceTable {
        SourceTable::new(self.entries.clone())
    }
}

/// Main application configuration.
#[derive(Debug, Clone, Deserialize, Serialize, Default)]
#[serde(default)]
pub struct Config {
    pub llm: LlmConfigFile,
    pub behavior: BehaviorConfig,
    pub colors: ColorConfig,
    pub sources: SourcesConfig,
}

impl Config {
    /// Returns the default config file path: ~/.config/eugene-chat/config.toml
    pub fn default_path() -> Option<PathBuf> {
        dirs::config_dir().map(|p| p.join("eugene-chat").join("config.toml"))
    }

    /// Load configuration from the default path, falling back to defaults,
    /// then apply environment overrides.
    pub fn load() -> Self {
        let mut config = Self::default_path()
            .and_then(|path| Self::load_from_path(&path).ok())
            .unwrap_or_default();
        config.apply_env();
        config
    }

    /// Load configuration from a specific path.
    pub fn load_from_path(path: impl AsRef<Path>) -> anyhow::Result<Self> {
        let path = path.as_ref();
        let contents = std::fs::read_to_string(path)
            .with_context(|| format!("reading {}", path.display()))?;
        let config: Config =
            toml::from_str(&contents).with_context(|| format!("parsing {}", path.display()))?;
        Ok(config)
    }

    /// Apply `EUGENE_MODEL` and `EUGENE_SOURCE`.
    ///
    /// API keys and bases are read per provider by `LlmConfig`.
    pub fn apply_env(&mut self) {
        if let Ok(model) = std::env::var("EUGENE_MODEL") {
            if !model.trim().is_empty() {
                self.llm.default_model = model.trim().to_string();
            }
        }

        if let Ok(source) = std::env::var("EUGENE_SOURCE") {
            self.sources.default = source.trim().to_string();
        }
    }

    /// Save configuration to the default path.
    pub fn save(&self) -> anyhow::Result<()> {
        if let Some(path) = Self::default_path() {
            self.save_to_path(&path)
        } else {
            Err(anyhow::anyhow!("Could not determine config directory"))
        }
    }

    /// Save configuration to a specific path.
    pub fn save_to_path(&self, path: impl AsRef<Path>) -> anyhow::Result<()> {
        let path = path.as_ref();
        // Ensure parent directory exists
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }

        let contents = toml::to_string_pretty(self)?;
        std::fs::write(path, contents)?;
        Ok(())
    }

    /// The model list, with the default model first if it was missing.
    pub fn model_choices(&self) -> Vec<String> {
        let mut models = self.llm.models.clone();
        if !models.iter().any(|m| m == &self.llm.default_model) {
            models.insert(0, self.llm.default_model.clone());
        }
        models
    }
}
