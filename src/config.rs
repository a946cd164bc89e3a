//! Configuration loading from environment variables.
//!
//! Values are intentionally validated early so startup fails fast with
//! actionable errors.

use crate::error::AppError;
use std::env;

pub const DEFAULT_CHAT_TEMPERATURE: f32 = 0.7;
pub const DEFAULT_CHAT_MAX_TOKENS: u32 = 500;

/// Runtime configuration for the remote model collaborators.
#[derive(Debug, Clone)]
pub struct AppConfig {
    /// API key sent as a bearer token to the model endpoints.
    pub api_key: String,
    /// Base URL of the OpenAI-compatible API, without a trailing slash.
    pub base_url: String,
    /// Model id used for chat completions.
    pub chat_model: String,
    /// Model id used for audio transcription.
    pub transcribe_model: String,
    /// Sampling temperature for chat turns.
    pub chat_temperature: f32,
    /// Completion token budget for chat turns.
    pub chat_max_tokens: u32,
}

impl AppConfig {
    /// Builds configuration from environment variables.
    ///
    /// Variables:
    /// - `OPENAI_API_KEY` (required)
    /// - `OPENAI_BASE_URL` (default `https://api.openai.com/v1`)
    /// - `CHAT_MODEL` (default `gpt-3.5-turbo`)
    /// - `TRANSCRIBE_MODEL` (default `whisper-1`)
    /// - `CHAT_TEMPERATURE` (default `0.7`, range `[0.0, 2.0]`)
    /// - `CHAT_MAX_TOKENS` (default `500`, range `[1, 4096]`)
    pub fn from_env() -> Result<Self, AppError> {
        let api_key = env_opt("OPENAI_API_KEY")
            .ok_or_else(|| AppError::internal("missing required OPENAI_API_KEY"))?;
        let base_url = env_str("OPENAI_BASE_URL", "https://api.openai.com/v1")
            .trim_end_matches('/')
            .to_string();
        let chat_model = env_str("CHAT_MODEL", "gpt-3.5-turbo");
        let transcribe_model = env_str("TRANSCRIBE_MODEL", "whisper-1");
        let chat_temperature =
            env_f32_bounded("CHAT_TEMPERATURE", DEFAULT_CHAT_TEMPERATURE, 0.0, 2.0)?;
        let chat_max_tokens =
            env_u32_bounded("CHAT_MAX_TOKENS", DEFAULT_CHAT_MAX_TOKENS, 1, 4096)?;

        Ok(Self {
            api_key,
            base_url,
            chat_model,
            transcribe_model,
            chat_temperature,
            chat_max_tokens,
        })
    }
}

fn env_str(name: &str, default: &str) -> String {
    match env::var(name) {
        Ok(value) => {
            let trimmed = value.trim();
            if trimmed.is_empty() {
                default.to_string()
            } else {
                trimmed.to_string()
            }
        }
        Err(_) => default.to_string(),
    }
}

fn env_opt(name: &str) -> Option<String> {
    match env::var(name) {
        Ok(value) => {
            let trimmed = value.trim();
            if trimmed.is_empty() {
                None
            } else {
                Some(trimmed.to_string())
            }
        }
        Err(_) => None,
    }
}

fn env_f32_bounded(name: &str, default: f32, min: f32, max: f32) -> Result<f32, AppError> {
    let raw = env::var(name).unwrap_or_else(|_| default.to_string());
    parse_f32_bounded(name, &raw, min, max)
}

fn env_u32_bounded(name: &str, default: u32, min: u32, max: u32) -> Result<u32, AppError> {
    let raw = env::var(name).unwrap_or_else(|_| default.to_string());
    parse_u32_bounded(name, &raw, min, max)
}

fn parse_f32_bounded(name: &str, raw: &str, min: f32, max: f32) -> Result<f32, AppError> {
    let parsed = raw.trim().parse::<f32>().map_err(|_| {
        AppError::internal(format!(
            "invalid {name}={raw:?}; expected float in range [{min}, {max}]"
        ))
    })?;
    if !parsed.is_finite() || parsed < min || parsed > max {
        return Err(AppError::internal(format!(
            "invalid {name}={raw:?}; expected float in range [{min}, {max}]"
        )));
    }
    Ok(parsed)
}

fn parse_u32_bounded(name: &str, raw: &str, min: u32, max: u32) -> Result<u32, AppError> {
    let parsed = raw.trim().parse::<u32>().map_err(|_| {
        AppError::internal(format!(
            "invalid {name}={raw:?}; expected integer in range [{min}, {max}]"
        ))
    })?;
    if parsed < min || parsed > max {
        return Err(AppError::internal(format!(
            "invalid {name}={raw:?}; expected integer in range [{min}, {max}]"
        )));
    }
    Ok(parsed)
}

#[cfg(test)]
mod tests {
    use super::{parse_f32_bounded, parse_u32_bounded};

    #[test]
    fn parse_f32_bounded_accepts_in_range_values() {
        assert_eq!(
            parse_f32_bounded("CHAT_TEMPERATURE", "0.0", 0.0, 2.0).unwrap(),
            0.0
        );
        assert_eq!(
            parse_f32_bounded("CHAT_TEMPERATURE", "2.0", 0.0, 2.0).unwrap(),
            2.0
        );
    }

    #[test]
    fn parse_f32_bounded_rejects_bad_values() {
        assert!(parse_f32_bounded("CHAT_TEMPERATURE", "abc", 0.0, 2.0).is_err());
        assert!(parse_f32_bounded("CHAT_TEMPERATURE", "NaN", 0.0, 2.0).is_err());
        assert!(parse_f32_bounded("CHAT_TEMPERATURE", "2.5", 0.0, 2.0).is_err());
    }

    #[test]
    fn parse_u32_bounded_rejects_out_of_range_values() {
        assert!(parse_u32_bounded("CHAT_MAX_TOKENS", "0", 1, 4096).is_err());
        assert!(parse_u32_bounded("CHAT_MAX_TOKENS", "5000", 1, 4096).is_err());
        assert_eq!(
            parse_u32_bounded("CHAT_MAX_TOKENS", "500", 1, 4096).unwrap(),
            500
        );
    }
}
