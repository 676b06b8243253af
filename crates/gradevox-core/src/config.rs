use std::path::Path;

use serde::{Deserialize, Serialize};
use tracing::{info, warn};

use crate::error::Result;

/// Top-level configuration for the voice gradebook.
///
/// Loaded from `~/.gradevox/config.toml` by default. Each section
/// corresponds to one stage of the transcript-to-edit pipeline.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct GradevoxConfig {
    #[serde(default)]
    pub general: GeneralConfig,
    #[serde(default)]
    pub normalizer: NormalizerConfig,
    #[serde(default)]
    pub parser: ParserConfig,
    #[serde(default)]
    pub resolver: ResolverConfig,
    #[serde(default)]
    pub disambiguation: DisambiguationConfig,
    #[serde(default)]
    pub dictation: DictationConfig,
}

impl GradevoxConfig {
    /// Load configuration from a TOML file.
    ///
    /// Returns an error if the file cannot be read or parsed.
    pub fn load(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)?;
        let config: GradevoxConfig = toml::from_str(&content)?;
        info!("Configuration loaded from {}", path.display());
        Ok(config)
    }

    /// Load configuration from a TOML file, falling back to defaults if the
    /// file does not exist or cannot be parsed.
    pub fn load_or_default(path: &Path) -> Self {
        match Self::load(path) {
            Ok(config) => config,
            Err(e) => {
                warn!(
                    "Failed to load config from {}: {}. Using defaults.",
                    path.display(),
                    e
                );
                Self::default()
            }
        }
    }

    /// Save the current configuration to a TOML file.
    pub fn save(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let content = toml::to_string_pretty(self)?;
        std::fs::write(path, content)?;
        info!("Configuration saved to {}", path.display());
        Ok(())
    }
}

/// General application settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct GeneralConfig {
    /// Log level: trace, debug, info, warn, error.
    pub log_level: String,
}

impl Default for GeneralConfig {
    fn default() -> Self {
        Self {
            log_level: "info".to_string(),
        }
    }
}

/// Transcript normalization settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct NormalizerConfig {
    /// Combined score a vocabulary word must exceed to replace a token.
    pub context_threshold: f64,
    /// Weight of normalized edit similarity in the combined score.
    pub edit_weight: f64,
    /// Weight of phonetic-code equality in the combined score.
    pub phonetic_weight: f64,
    /// Tokens shorter than this are never context-corrected.
    pub min_token_len: usize,
    /// Times a learned correction must be seen before it is applied.
    pub learned_min_count: u32,
}

impl Default for NormalizerConfig {
    fn default() -> Self {
        Self {
            context_threshold: 0.7,
            edit_weight: 0.7,
            phonetic_weight: 0.3,
            min_token_len: 3,
            learned_min_count: 2,
        }
    }
}

/// Command grammar settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ParserConfig {
    /// Minimum column-match score (0-100) for a header to be accepted.
    pub column_score_threshold: f64,
    /// Per-word similarity needed for a header word to count as found.
    pub word_fuzzy_threshold: f64,
    /// Maximum number of tokens kept for an extracted student name.
    pub max_name_tokens: usize,
}

impl Default for ParserConfig {
    fn default() -> Self {
        Self {
            column_score_threshold: 30.0,
            word_fuzzy_threshold: 0.7,
            max_name_tokens: 2,
        }
    }
}

/// Fuzzy name resolution settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ResolverConfig {
    /// Candidates scoring at or above this are discarded.
    pub max_candidate_score: u32,
    /// Edit similarity a name must exceed to count as a fuzzy match.
    pub fuzzy_similarity_floor: f64,
    /// Candidates within `best + window` of the best score are ambiguous.
    pub ambiguity_window: u32,
    /// Number of recently touched students remembered for biasing.
    pub recent_students_capacity: usize,
    /// Matching strategy: "prefix" (name groups + 2-letter prefix) or "soundex".
    pub strategy: String,
}

impl Default for ResolverConfig {
    fn default() -> Self {
        Self {
            max_candidate_score: 10,
            fuzzy_similarity_floor: 0.6,
            ambiguity_window: 2,
            recent_students_capacity: 5,
            strategy: "prefix".to_string(),
        }
    }
}

/// Disambiguation prompt settings.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct DisambiguationConfig {
    /// Seconds after which a pending prompt is dropped. `None` waits forever.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub timeout_secs: Option<u64>,
    /// Ask for confirmation before applying a low-confidence single match.
    pub confirm_low_confidence: bool,
}

/// Listening session settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct DictationConfig {
    /// Keep listening after each finalized command.
    pub continuous: bool,
    /// Consecutive no-speech timeouts before the host is told.
    pub no_speech_surface_after: u32,
    /// Run the secondary engine for comparison logging.
    pub secondary_enabled: bool,
    /// Upper bound on a single secondary transcription.
    pub secondary_timeout_secs: u64,
    /// Sample rate of buffered utterance audio.
    pub sample_rate: u32,
    /// Phrases that end a continuous session.
    pub stop_phrases: Vec<String>,
}

impl Default for DictationConfig {
    fn default() -> Self {
        Self {
            continuous: false,
            no_speech_surface_after: 3,
            secondary_enabled: false,
            secondary_timeout_secs: 10,
            sample_rate: 16000,
            stop_phrases: vec![
                "stop listening".to_string(),
                "finish".to_string(),
                "done grading".to_string(),
                "thats all".to_string(),
            ],
        }
    }
}
