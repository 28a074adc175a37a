//! Configuration management for tth.
//!
//! Loads configuration from ${TTH_HOME}/config.toml with sensible defaults.

use std::fs;
use std::path::Path;
use std::sync::Arc;

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};

use crate::markup::{DEFAULT_THEME, Highlighter, PlainHighlighter, SyntectHighlighter};
use crate::providers::OllamaConfig;
use crate::providers::ollama::{DEFAULT_MAX_TOKENS, DEFAULT_TEMPERATURE};

/// Returns the default config template.
///
/// Embedded from default_config.toml at compile time.
fn default_config_template() -> &'static str {
    include_str!("../default_config.toml")
}

/// Recursively merges items from source table into target table.
fn merge_items(target: &mut toml_edit::Table, source: &toml_edit::Table) {
    use toml_edit::Item;

    for (key, value) in source {
        match value {
            Item::Value(v) => {
                target[key] = Item::Value(v.clone());
            }
            Item::Table(src_table) => {
                if let Some(Item::Table(target_table)) = target.get_mut(key) {
                    merge_items(target_table, src_table);
                } else {
                    target[key] = Item::Table(src_table.clone());
                }
            }
            Item::ArrayOfTables(src_arr) => {
                target[key] = Item::ArrayOfTables(src_arr.clone());
            }
            Item::None => {}
        }
    }
}

pub mod paths {
    //! Path resolution for the tth configuration directory.
    //!
    //! TTH_HOME resolution order:
    //! 1. TTH_HOME environment variable (if set)
    //! 2. ~/.config/tth (default)

    use std::path::PathBuf;

    use anyhow::{Context, Result};

    /// Returns the tth home directory.
    ///
    /// # Errors
    /// Returns an error if `TTH_HOME` is unset and the home directory
    /// cannot be determined.
    pub fn tth_home() -> Result<PathBuf> {
        if let Ok(home) = std::env::var("TTH_HOME")
            && !home.trim().is_empty()
        {
            return Ok(PathBuf::from(home));
        }

        dirs::home_dir()
            .map(|h| h.join(".config").join("tth"))
            .context("Could not determine home directory (set TTH_HOME)")
    }

    /// Returns the path to the config.toml file.
    ///
    /// # Errors
    /// See [`tth_home`].
    pub fn config_path() -> Result<PathBuf> {
        Ok(tth_home()?.join("config.toml"))
    }
}

/// Main configuration structure.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Ollama model name
    pub model: String,

    /// Sampling temperature
    pub temperature: f64,

    /// Maximum tokens to generate
    pub max_tokens: u32,

    /// Preset prompts for `tth ask`
    pub questions: Vec<String>,

    #[serde(default)]
    pub ollama: OllamaSection,

    #[serde(default)]
    pub render: RenderConfig,
}

impl Config {
    const DEFAULT_MODEL: &str = "deepseek-r1:14b";

    /// Loads configuration from the default config path.
    ///
    /// # Errors
    /// Returns an error if the file exists but cannot be read or parsed.
    pub fn load() -> Result<Self> {
        Self::load_from(&paths::config_path()?)
    }

    /// Loads configuration from a specific path.
    /// Returns defaults if the file doesn't exist.
    ///
    /// # Errors
    /// Returns an error if the file exists but cannot be read or parsed.
    pub fn load_from(path: &Path) -> Result<Self> {
        if path.exists() {
            let contents = fs::read_to_string(path)
                .with_context(|| format!("Failed to read config from {}", path.display()))?;
            toml::from_str(&contents)
                .with_context(|| format!("Failed to parse config from {}", path.display()))
        } else {
            tracing::debug!("no config at {}, using defaults", path.display());
            Ok(Config::default())
        }
    }

    /// Creates a default config file at the given path.
    ///
    /// # Errors
    /// Returns an error if the file already exists or cannot be written.
    pub fn init(path: &Path) -> Result<()> {
        if path.exists() {
            anyhow::bail!("Config file already exists at {}", path.display());
        }

        Self::write_config(path, default_config_template())
    }

    /// Generates a fresh config TOML from Rust defaults, keeping the
    /// template's comments and layout.
    ///
    /// # Errors
    /// Returns an error if serialization or template parsing fails.
    pub fn generate() -> Result<String> {
        use toml_edit::DocumentMut;

        let generated_toml = toml::to_string(&Config::default())
            .context("Failed to serialize default config to TOML")?;

        let mut doc: DocumentMut = default_config_template()
            .parse()
            .context("Failed to parse default config template")?;
        let generated_doc: DocumentMut = generated_toml
            .parse()
            .context("Failed to parse generated config")?;

        merge_items(doc.as_table_mut(), generated_doc.as_table());

        Ok(doc.to_string())
    }

    /// Resolved Ollama client settings (env > config > default base URL).
    ///
    /// # Errors
    /// Returns an error if the base URL is invalid.
    pub fn ollama_config(&self, model_override: Option<&str>) -> Result<OllamaConfig> {
        OllamaConfig::resolve(
            model_override.unwrap_or(&self.model),
            self.ollama.base_url.as_deref(),
            self.temperature,
            self.max_tokens,
        )
    }

    /// Writes config content to a file, creating parent directories as needed.
    /// Uses atomic write (temp file + rename) to prevent corruption.
    fn write_config(path: &Path, content: &str) -> Result<()> {
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)
                .with_context(|| format!("Failed to create directory {}", parent.display()))?;
        }

        let tmp_path = path.with_extension("toml.tmp");
        fs::write(&tmp_path, content)
            .with_context(|| format!("Failed to write config to {}", tmp_path.display()))?;
        fs::rename(&tmp_path, path).with_context(|| {
            format!(
                "Failed to rename {} to {}",
                tmp_path.display(),
                path.display()
            )
        })?;

        Ok(())
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            model: Self::DEFAULT_MODEL.to_string(),
            temperature: DEFAULT_TEMPERATURE,
            max_tokens: DEFAULT_MAX_TOKENS,
            questions: Vec::new(),
            ollama: OllamaSection::default(),
            render: RenderConfig::default(),
        }
    }
}

/// `[ollama]` section.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct OllamaSection {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub base_url: Option<String>,
}

/// `[render]` section.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct RenderConfig {
    pub highlight: bool,
    pub theme: String,
    pub user_label: String,
    pub ai_label: String,
}

impl Default for RenderConfig {
    fn default() -> Self {
        Self {
            highlight: true,
            theme: DEFAULT_THEME.to_string(),
            user_label: "User".to_string(),
            ai_label: "AI".to_string(),
        }
    }
}

impl RenderConfig {
    /// Highlighter selected by this section.
    pub fn highlighter(&self) -> Arc<dyn Highlighter> {
        if self.highlight {
            Arc::new(SyntectHighlighter::new(Some(&self.theme)))
        } else {
            Arc::new(PlainHighlighter)
        }
    }
}
