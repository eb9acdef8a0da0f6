//! Configuration module for the call bot gateway
//!
//! This module handles server configuration from various sources: .env files, YAML files,
//! and environment variables. Priority: YAML > ENV vars > .env values > defaults.
//!
//! # Modules
//! - `yaml`: YAML configuration file loading
//! - `env`: Environment variable loading
//! - `merge`: Merging YAML and environment configurations
//! - `validation`: Configuration validation logic
//!
//! # Example
//! ```rust,no_run
//! use callbot_gateway::config::ServerConfig;
//! use std::path::PathBuf;
//!
//! # fn main() -> Result<(), Box<dyn std::error::Error>> {
//! // Load from environment variables only
//! let config = ServerConfig::from_env()?;
//!
//! // Load from YAML file with environment variable overrides
//! let config_path = PathBuf::from("config.yaml");
//! let config = ServerConfig::from_file(&config_path)?;
//!
//! println!("Server listening on {}", config.address());
//! # Ok(())
//! # }
//! ```

use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

mod env;
mod merge;
mod validation;
mod yaml;

use crate::core::llm::{NimConfig, SamplingParams};
use crate::core::session::SessionSettings;
use crate::core::speaking::SpeakingDetectionConfig;

/// Spoken when a media stream starts
pub const DEFAULT_GREETING: &str =
    "Welcome to our pizza ordering service! How can I help you order a delicious pizza today?";

/// TLS configuration for HTTPS and WSS
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TlsConfig {
    /// Path to the TLS certificate file (PEM format)
    pub cert_path: PathBuf,
    /// Path to the TLS private key file (PEM format)
    pub key_path: PathBuf,
}

/// Server configuration
///
/// Built once at startup and handed to each component at construction:
/// - Server settings (host, port, TLS, public host for TwiML)
/// - Riva speech endpoints and speech parameters
/// - NIM language model endpoint and sampling
/// - Dialog behaviour (speaking detection, barge-in, greeting)
/// - Security settings (CORS)
#[derive(Debug, Clone)]
pub struct ServerConfig {
    // Server settings
    pub host: String,
    pub port: u16,
    pub tls: Option<TlsConfig>,
    /// Host advertised in the TwiML stream URL; falls back to the request `Host` header
    pub public_host: Option<String>,

    // Riva settings
    pub riva_asr_address: String,
    pub riva_tts_address: String,
    pub riva_use_tls: bool,

    // Speech settings
    pub language_code: String,
    pub voice_name: String,
    pub tts_chunk_timeout: Option<Duration>,
    pub asr_shutdown_grace: Duration,

    // Language model settings
    pub llm_address: String,
    pub llm_use_tls: bool,
    pub llm_model: String,
    pub llm_api_key: Option<String>,
    pub llm_timeout: Option<Duration>,
    pub llm_sampling: SamplingParams,

    // Dialog settings
    pub speaking_threshold: u32,
    pub speaking_reset_window: Duration,
    pub barge_in_on_speech_start: bool,
    pub greeting: String,

    // Security settings
    /// Comma-separated list, or "*" for any origin
    pub cors_allowed_origins: Option<String>,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: "0.0.0.0".to_string(),
            port: 8080,
            tls: None,
            public_host: None,
            riva_asr_address: "localhost:50051".to_string(),
            riva_tts_address: "localhost:50051".to_string(),
            riva_use_tls: false,
            language_code: "en-US".to_string(),
            voice_name: "English-US.Female-1".to_string(),
            tts_chunk_timeout: None,
            asr_shutdown_grace: Duration::from_millis(2000),
            llm_address: "localhost:8000".to_string(),
            llm_use_tls: true,
            llm_model: "meta/llama-3.1-8b-instruct".to_string(),
            llm_api_key: None,
            llm_timeout: None,
            llm_sampling: SamplingParams::default(),
            speaking_threshold: 3,
            speaking_reset_window: Duration::from_millis(500),
            barge_in_on_speech_start: false,
            greeting: DEFAULT_GREETING.to_string(),
            cors_allowed_origins: None,
        }
    }
}

/// Implement Drop to zeroize secret fields when ServerConfig is dropped.
impl Drop for ServerConfig {
    fn drop(&mut self) {
        use zeroize::Zeroize;

        if let Some(ref mut key) = self.llm_api_key {
            key.zeroize();
        }
    }
}

impl ServerConfig {
    /// Load configuration from a YAML file with environment variable base
    ///
    /// Priority order (highest to lowest):
    /// 1. YAML file values
    /// 2. Environment variables (actual ENV vars override .env values)
    /// 3. .env file values
    /// 4. Default values
    ///
    /// # Errors
    /// Returns an error if:
    /// - The YAML file cannot be read or is malformed
    /// - Environment variables have invalid formats
    /// - Configuration validation fails
    pub fn from_file(path: &PathBuf) -> Result<Self, Box<dyn std::error::Error>> {
        // Note: .env file is loaded in main.rs at application startup
        let yaml_config = yaml::YamlConfig::from_file(path)?;

        let config = merge::merge_config(Some(yaml_config))?;
        validation::validate(&config)?;

        Ok(config)
    }

    /// Get the server address as a string
    ///
    /// Returns the address in the format "host:port"
    pub fn address(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }

    /// Check if TLS is configured
    pub fn is_tls_enabled(&self) -> bool {
        self.tls.is_some()
    }

    /// Chat completions URL of the language model endpoint
    pub fn llm_url(&self) -> String {
        let scheme = if self.llm_use_tls { "https" } else { "http" };
        format!("{scheme}://{}/v1/chat/completions", self.llm_address)
    }

    pub fn nim_config(&self) -> NimConfig {
        NimConfig {
            url: self.llm_url(),
            model: self.llm_model.clone(),
            api_key: self.llm_api_key.clone(),
            sampling: self.llm_sampling.clone(),
            timeout: self.llm_timeout,
        }
    }

    pub fn speaking_detection(&self) -> SpeakingDetectionConfig {
        SpeakingDetectionConfig {
            threshold: self.speaking_threshold,
            reset_window: self.speaking_reset_window,
        }
    }

    /// Per-session settings, with the system prompt built once at startup
    pub fn session_settings(&self, system_prompt: impl Into<Arc<str>>) -> SessionSettings {
        SessionSettings {
            language_code: self.language_code.clone(),
            voice_name: self.voice_name.clone(),
            greeting: self.greeting.clone(),
            system_prompt: system_prompt.into(),
            speaking: self.speaking_detection(),
            barge_in_on_speech_start: self.barge_in_on_speech_start,
            forward_transcripts: true,
            tts_chunk_timeout: self.tts_chunk_timeout,
            asr_shutdown_grace: self.asr_shutdown_grace,
        }
    }
}
