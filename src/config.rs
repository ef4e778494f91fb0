//! Configuration types.
//!
//! Everything is read from `INTAKE_*` environment variables at startup.
//! Optional collaborators (generation, remote embeddings, calendar) are `None`
//! when their credentials are absent; the service then runs in the degraded
//! mode for that concern instead of refusing to start. Embeddings default to
//! a local model and need no credentials.

use std::path::PathBuf;
use std::str::FromStr;
use std::time::Duration;

use secrecy::SecretString;

use crate::error::ConfigError;
use crate::llm::{LlmBackend, LlmConfig};

/// Decorative glyphs stripped from answer text by default.
pub const DEFAULT_DECORATIVE_SYMBOLS: &[char] = &[
    '\u{1F4E6}', // package
    '\u{1F680}', // rocket
    '\u{1F6E0}', // hammer and wrench
    '\u{2757}',  // exclamation mark
    '\u{2714}',  // check mark
    '\u{1F4DE}', // telephone receiver
    '\u{1F449}', // pointing finger
    '\u{FE0F}',  // variation selector
];

/// Where the local sentence-transformer export is looked for.
pub const DEFAULT_EMBEDDING_MODEL_DIR: &str = "./models/all-MiniLM-L6-v2";

/// How the reference document is split and searched.
#[derive(Debug, Clone)]
pub struct KnowledgeConfig {
    /// Path of the reference document.
    pub document_path: PathBuf,
    /// Words per chunk.
    pub chunk_size: usize,
    /// Words shared between consecutive chunks.
    pub chunk_overlap: usize,
    /// Number of candidates considered per query.
    pub top_k: usize,
    /// Candidates must score strictly above this to be returned.
    pub relevance_threshold: f32,
    /// Number of chunks returned when nothing clears the threshold.
    pub fallback_k: usize,
}

impl Default for KnowledgeConfig {
    fn default() -> Self {
        Self {
            document_path: PathBuf::from("./reference.pdf"),
            chunk_size: 500,
            chunk_overlap: 50,
            top_k: 5,
            relevance_threshold: 0.2,
            fallback_k: 2,
        }
    }
}

/// Answer synthesis tuning.
#[derive(Debug, Clone)]
pub struct AnswerConfig {
    /// Upper bound on the generative call; expiry routes to the fallback.
    pub generation_timeout: Duration,
    /// Generated answers longer than this are cut to three sentences.
    pub max_answer_chars: usize,
    /// Code points removed during text cleanup.
    pub decorative_symbols: Vec<char>,
}

impl Default for AnswerConfig {
    fn default() -> Self {
        Self {
            generation_timeout: Duration::from_secs(20),
            max_answer_chars: 500,
            decorative_symbols: DEFAULT_DECORATIVE_SYMBOLS.to_vec(),
        }
    }
}

/// Embedding backend for chunks and queries.
#[derive(Debug, Clone)]
pub enum EmbeddingConfig {
    /// Sentence-transformer ONNX export on local disk.
    Local { model_dir: PathBuf },
    /// OpenAI embeddings API.
    OpenAi { api_key: SecretString, model: String },
}


/// Google Calendar booking.
#[derive(Debug, Clone)]
pub struct CalendarConfig {
    pub access_token: SecretString,
    pub calendar_id: String,
}

/// Full service configuration.
#[derive(Debug, Clone)]
pub struct AppConfig {
    pub port: u16,
    pub db_path: PathBuf,
    pub knowledge: KnowledgeConfig,
    pub answer: AnswerConfig,
    pub llm: Option<LlmConfig>,
    pub embedding: Option<EmbeddingConfig>,
    pub calendar: Option<CalendarConfig>,
    /// Timezone name attached to calendar event times.
    pub timezone: String,
    /// Also run the stdin/stdout channel.
    pub cli_enabled: bool,
}

impl AppConfig {
    /// Read the configuration from the process environment.
    pub fn from_env() -> Result<Self, ConfigError> {
        let defaults = KnowledgeConfig::default();
        let knowledge = KnowledgeConfig {
            document_path: env_or("INTAKE_DOCUMENT_PATH", "./reference.pdf").into(),
            chunk_size: parse_env("INTAKE_CHUNK_SIZE", defaults.chunk_size)?,
            chunk_overlap: parse_env("INTAKE_CHUNK_OVERLAP", defaults.chunk_overlap)?,
            top_k: parse_env("INTAKE_TOP_K", defaults.top_k)?,
            relevance_threshold: parse_env(
                "INTAKE_RELEVANCE_THRESHOLD",
                defaults.relevance_threshold,
            )?,
            fallback_k: parse_env("INTAKE_FALLBACK_K", defaults.fallback_k)?,
        };
        if knowledge.chunk_size == 0 || knowledge.chunk_overlap >= knowledge.chunk_size {
            return Err(ConfigError::InvalidValue {
                key: "INTAKE_CHUNK_OVERLAP".to_string(),
                message: format!(
                    "overlap ({}) must be smaller than a non-zero chunk size ({})",
                    knowledge.chunk_overlap, knowledge.chunk_size
                ),
            });
        }

        let answer = AnswerConfig {
            generation_timeout: Duration::from_secs(parse_env(
                "INTAKE_GENERATION_TIMEOUT_SECS",
                20u64,
            )?),
            max_answer_chars: parse_env("INTAKE_MAX_ANSWER_CHARS", 500usize)?,
            decorative_symbols: std::env::var("INTAKE_DECORATIVE_SYMBOLS")
                .map(|s| s.chars().filter(|c| !c.is_whitespace()).collect())
                .unwrap_or_else(|_| DEFAULT_DECORATIVE_SYMBOLS.to_vec()),
        };

        Ok(Self {
            port: parse_env("INTAKE_PORT", 8080u16)?,
            db_path: env_or("INTAKE_DB_PATH", "./data/intake.db").into(),
            knowledge,
            answer,
            llm: llm_from_env()?,
            embedding: embedding_from_env()?,
            calendar: calendar_from_env(),
            timezone: env_or("INTAKE_TIMEZONE", "UTC"),
            cli_enabled: std::env::var("INTAKE_CLI").is_ok_and(|v| v == "1" || v == "true"),
        })
    }
}

fn llm_from_env() -> Result<Option<LlmConfig>, ConfigError> {
    let backend = match env_or("INTAKE_LLM_BACKEND", "gemini").to_lowercase().as_str() {
        "gemini" | "google" => LlmBackend::Gemini,
        "openai" => LlmBackend::OpenAi,
        other => {
            return Err(ConfigError::InvalidValue {
                key: "INTAKE_LLM_BACKEND".to_string(),
                message: format!("unknown backend '{other}' (expected gemini or openai)"),
            });
        }
    };

    let vendor_key = match backend {
        LlmBackend::Gemini => "GEMINI_API_KEY",
        LlmBackend::OpenAi => "OPENAI_API_KEY",
    };
    let Some(api_key) = non_empty_var("INTAKE_LLM_API_KEY").or_else(|| non_empty_var(vendor_key))
    else {
        return Ok(None);
    };

    let default_model = match backend {
        LlmBackend::Gemini => "gemini-1.5-flash",
        LlmBackend::OpenAi => "gpt-4o-mini",
    };
    Ok(Some(LlmConfig {
        backend,
        api_key: SecretString::from(api_key),
        model: env_or("INTAKE_LLM_MODEL", default_model),
    }))
}

fn embedding_from_env() -> Result<Option<EmbeddingConfig>, ConfigError> {
    match env_or("INTAKE_EMBEDDING_BACKEND", "local").to_lowercase().as_str() {
        "local" | "onnx" => Ok(Some(EmbeddingConfig::Local {
            model_dir: env_or("INTAKE_EMBEDDING_MODEL_DIR", DEFAULT_EMBEDDING_MODEL_DIR).into(),
        })),
        "openai" => {
            let Some(api_key) = non_empty_var("INTAKE_EMBEDDING_API_KEY")
                .or_else(|| non_empty_var("OPENAI_API_KEY"))
            else {
                return Ok(None);
            };
            Ok(Some(EmbeddingConfig::OpenAi {
                api_key: SecretString::from(api_key),
                model: env_or("INTAKE_EMBEDDING_MODEL", "text-embedding-3-small"),
            }))
        }
        "none" | "off" => Ok(None),
        other => Err(ConfigError::InvalidValue {
            key: "INTAKE_EMBEDDING_BACKEND".to_string(),
            message: format!("unknown backend '{other}' (expected local, openai or none)"),
        }),
    }
}

fn calendar_from_env() -> Option<CalendarConfig> {
    let access_token = non_empty_var("INTAKE_CALENDAR_TOKEN")?;
    Some(CalendarConfig {
        access_token: SecretString::from(access_token),
        calendar_id: env_or("INTAKE_CALENDAR_ID", "primary"),
    })
}

fn env_or(key: &str, default: &str) -> String {
    std::env::var(key).unwrap_or_else(|_| default.to_string())
}

fn non_empty_var(key: &str) -> Option<String> {
    std::env::var(key)
        .ok()
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}

/// Parse an optional variable, falling back to `default` when unset.
fn parse_env<T>(key: &str, default: T) -> Result<T, ConfigError>
where
    T: FromStr,
    T::Err: std::fmt::Display,
{
    match std::env::var(key) {
        Ok(raw) => parse_value(key, &raw),
        Err(_) => Ok(default),
    }
}

fn parse_value<T>(key: &str, raw: &str) -> Result<T, ConfigError>
where
    T: FromStr,
    T::Err: std::fmt::Display,
{
    raw.trim().parse().map_err(|e: T::Err| ConfigError::InvalidValue {
        key: key.to_string(),
        message: format!("'{raw}': {e}"),
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn knowledge_defaults_match_documented_values() {
        let k = KnowledgeConfig::default();
        assert_eq!(k.chunk_size, 500);
        assert_eq!(k.chunk_overlap, 50);
        assert_eq!(k.top_k, 5);
        assert!((k.relevance_threshold - 0.2).abs() < f32::EPSILON);
        assert_eq!(k.fallback_k, 2);
    }

    #[test]
    fn answer_defaults() {
        let a = AnswerConfig::default();
        assert_eq!(a.max_answer_chars, 500);
        assert!(a.decorative_symbols.contains(&'\u{1F680}'));
    }

    #[test]
    fn parse_value_reports_key() {
        let err = parse_value::<u16>("INTAKE_PORT", "eighty").unwrap_err();
        let msg = err.to_string();
        assert!(msg.contains("INTAKE_PORT"));
        assert!(msg.contains("eighty"));
    }

    #[test]
    fn parse_value_trims() {
        let v: f32 = parse_value("INTAKE_RELEVANCE_THRESHOLD", " 0.35 ").unwrap();
        assert!((v - 0.35).abs() < f32::EPSILON);
    }
}
