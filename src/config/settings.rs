//! Configuration settings for lectern.

use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Root configuration structure.
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
#[serde(default)]
pub struct Settings {
    pub general: GeneralSettings,
    pub model: ModelSettings,
    pub chunking: ChunkingSettings,
    pub store: StoreSettings,
    pub bus: BusSettings,
}

/// General application settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct GeneralSettings {
    /// Directory for storing application data.
    pub data_dir: String,
    /// Log level (trace, debug, info, warn, error).
    pub log_level: String,
}

impl Default for GeneralSettings {
    fn default() -> Self {
        Self {
            data_dir: "~/.lectern".to_string(),
            log_level: "info".to_string(),
        }
    }
}

/// Embedding model settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ModelSettings {
    /// Path to the serialized ONNX model.
    pub model_path: String,
    /// Path to the tokenizer definition file.
    pub tokenizer_path: String,
    /// Hidden size of the model output (dimension of each embedding).
    pub hidden_size: usize,
    /// Upper bound on batch_size x padded_seq_len per forward pass.
    /// Controls peak device memory.
    pub max_batch_tokens: usize,
    /// CUDA device id to request; falls back to CPU if unavailable.
    pub cuda_device: i32,
}

impl Default for ModelSettings {
    fn default() -> Self {
        Self {
            model_path: "model.onnx".to_string(),
            tokenizer_path: "tokenizer.json".to_string(),
            hidden_size: 1024,
            // 12000 tokens is about 240 short sentences (50 tokens each),
            // 24 medium chunks (500 tokens), or 12 large chunks per batch.
            max_batch_tokens: 12_000,
            cuda_device: 0,
        }
    }
}

/// Semantic chunking settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ChunkingSettings {
    /// Optimal chunk size in tokens; no size penalty at or below this.
    pub optimal_size: usize,
    /// Hard chunk size limit in tokens.
    pub max_size: usize,
    /// Penalty weight at max_size, in normalized-similarity units.
    pub lambda_size: f32,
    /// Flat penalty per chunk, discouraging over-fragmentation.
    pub chunk_penalty: f32,
}

impl Default for ChunkingSettings {
    fn default() -> Self {
        Self {
            optimal_size: 470,
            max_size: 512,
            lambda_size: 3.0,
            chunk_penalty: 1.0,
        }
    }
}

/// Lecture store settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct StoreSettings {
    /// Store provider (sqlite, memory).
    pub provider: String,
    /// Path to the SQLite database (for the sqlite provider).
    pub sqlite_path: String,
}

impl Default for StoreSettings {
    fn default() -> Self {
        Self {
            provider: "sqlite".to_string(),
            sqlite_path: "~/.lectern/lectures.db".to_string(),
        }
    }
}

/// Event source settings for the worker loop.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct BusSettings {
    /// Path to the newline-delimited JSON events file.
    pub events_path: String,
    /// Sleep between polls when the source is drained, in milliseconds.
    pub poll_interval_ms: u64,
}

impl Default for BusSettings {
    fn default() -> Self {
        Self {
            events_path: "~/.lectern/events.jsonl".to_string(),
            poll_interval_ms: 500,
        }
    }
}

impl Settings {
    /// Load settings from the default configuration file.
    pub fn load() -> crate::error::Result<Self> {
        Self::load_from(None)
    }

    /// Load settings from a specific path, or the default location if None.
    pub fn load_from(path: Option<&PathBuf>) -> crate::error::Result<Self> {
        let config_path = match path {
            Some(p) => p.clone(),
            None => Self::default_config_path(),
        };

        if config_path.exists() {
            let content = std::fs::read_to_string(&config_path)?;
            let settings: Settings = toml::from_str(&content)?;
            Ok(settings)
        } else {
            Ok(Settings::default())
        }
    }

    /// Save settings to a specific path.
    pub fn save_to(&self, path: &PathBuf) -> crate::error::Result<()> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let content = toml::to_string_pretty(self)
            .map_err(|e| crate::error::LecternError::Config(e.to_string()))?;
        std::fs::write(path, content)?;
        Ok(())
    }

    /// Get the default configuration file path.
    pub fn default_config_path() -> PathBuf {
        dirs::config_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join("lectern")
            .join("config.toml")
    }

    /// Expand shell variables in paths (e.g., ~).
    pub fn expand_path(path: &str) -> PathBuf {
        PathBuf::from(shellexpand::tilde(path).to_string())
    }

    /// Get the expanded data directory path.
    pub fn data_dir(&self) -> PathBuf {
        Self::expand_path(&self.general.data_dir)
    }

    /// Get the expanded SQLite database path.
    pub fn sqlite_path(&self) -> PathBuf {
        Self::expand_path(&self.store.sqlite_path)
    }

    /// Get the expanded events file path.
    pub fn events_path(&self) -> PathBuf {
        Self::expand_path(&self.bus.events_path)
    }

    /// Get the expanded model path.
    pub fn model_path(&self) -> PathBuf {
        Self::expand_path(&self.model.model_path)
    }

    /// Get the expanded tokenizer path.
    pub fn tokenizer_path(&self) -> PathBuf {
        Self::expand_path(&self.model.tokenizer_path)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let settings = Settings::default();
        assert_eq!(settings.chunking.optimal_size, 470);
        assert_eq!(settings.chunking.max_size, 512);
        assert_eq!(settings.model.max_batch_tokens, 12_000);
        assert_eq!(settings.bus.poll_interval_ms, 500);
    }

    #[test]
    fn test_partial_toml_fills_defaults() {
        let settings: Settings = toml::from_str(
            r#"
            [chunking]
            max_size = 256
            "#,
        )
        .unwrap();

        assert_eq!(settings.chunking.max_size, 256);
        assert_eq!(settings.chunking.optimal_size, 470);
        assert_eq!(settings.model.hidden_size, 1024);
    }
}
