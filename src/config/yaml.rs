use serde::Deserialize;
use std::path::PathBuf;

/// Complete YAML configuration structure
///
/// All fields are optional to allow partial configuration. Values present here
/// override environment variables.
///
/// # Example YAML structure
/// ```yaml
/// server:
///   host: "0.0.0.0"
///   port: 8080
///   public_host: "bot.example.com"
///   tls:
///     cert_path: "/etc/callbot/cert.pem"
///     key_path: "/etc/callbot/key.pem"
///
/// riva:
///   asr_address: "riva:50051"
///   tts_address: "riva:50051"
///   use_tls: false
///
/// speech:
///   language_code: "en-US"
///   voice_name: "English-US.Female-1"
///   chunk_timeout_seconds: 10
///   asr_shutdown_grace_ms: 2000
///
/// llm:
///   address: "integrate.api.nvidia.com"
///   use_tls: true
///   model: "meta/llama-3.1-8b-instruct"
///   api_key: "nvapi-..."
///   timeout_seconds: 30
///   temperature: 0.7
///   top_p: 0.9
///   max_tokens: 300
///   frequency_penalty: 1.0
///   stop: ["\nHuman:", "\n\nHuman:"]
///
/// dialog:
///   speaking_threshold: 3
///   reset_window_ms: 500
///   barge_in_on_speech_start: false
///   greeting: "Welcome!"
///
/// security:
///   cors_allowed_origins: "https://console.example.com"
/// ```
#[derive(Debug, Clone, Deserialize, Default)]
#[serde(default)]
pub struct YamlConfig {
    pub server: Option<ServerYaml>,
    pub riva: Option<RivaYaml>,
    pub speech: Option<SpeechYaml>,
    pub llm: Option<LlmYaml>,
    pub dialog: Option<DialogYaml>,
    pub security: Option<SecurityYaml>,
}

/// Server configuration from YAML
#[derive(Debug, Clone, Deserialize, Default)]
#[serde(default)]
pub struct ServerYaml {
    pub host: Option<String>,
    pub port: Option<u16>,
    pub public_host: Option<String>,
    pub tls: Option<TlsYaml>,
}

/// TLS configuration from YAML
#[derive(Debug, Clone, Deserialize, Default)]
#[serde(default)]
pub struct TlsYaml {
    pub cert_path: Option<String>,
    pub key_path: Option<String>,
}

/// Riva endpoints from YAML
#[derive(Debug, Clone, Deserialize, Default)]
#[serde(default)]
pub struct RivaYaml {
    pub asr_address: Option<String>,
    pub tts_address: Option<String>,
    pub use_tls: Option<bool>,
}

/// Speech parameters from YAML
#[derive(Debug, Clone, Deserialize, Default)]
#[serde(default)]
pub struct SpeechYaml {
    pub language_code: Option<String>,
    pub voice_name: Option<String>,
    /// Maximum wait for each synthesized chunk
    pub chunk_timeout_seconds: Option<u64>,
    /// Time the recognizer gets to flush after the call ends
    pub asr_shutdown_grace_ms: Option<u64>,
}

/// Language model endpoint and sampling from YAML
#[derive(Debug, Clone, Deserialize, Default)]
#[serde(default)]
pub struct LlmYaml {
    pub address: Option<String>,
    pub use_tls: Option<bool>,
    pub model: Option<String>,
    pub api_key: Option<String>,
    pub timeout_seconds: Option<u64>,
    pub temperature: Option<f32>,
    pub top_p: Option<f32>,
    pub max_tokens: Option<u32>,
    pub frequency_penalty: Option<f32>,
    pub stop: Option<Vec<String>>,
}

/// Dialog behaviour from YAML
#[derive(Debug, Clone, Deserialize, Default)]
#[serde(default)]
pub struct DialogYaml {
    pub speaking_threshold: Option<u32>,
    pub reset_window_ms: Option<u64>,
    pub barge_in_on_speech_start: Option<bool>,
    pub greeting: Option<String>,
}

/// Security configuration from YAML
#[derive(Debug, Clone, Deserialize, Default)]
#[serde(default)]
pub struct SecurityYaml {
    pub cors_allowed_origins: Option<String>,
}

impl YamlConfig {
    /// Load configuration from a YAML file
    ///
    /// # Errors
    /// Returns an error if:
    /// - The file cannot be read
    /// - The YAML is malformed
    /// - Fields have invalid types
    pub fn from_file(path: &PathBuf) -> Result<Self, Box<dyn std::error::Error>> {
        let contents = std::fs::read_to_string(path)
            .map_err(|e| format!("Failed to read config file {}: {e}", path.display()))?;

        let config: YamlConfig = serde_yaml::from_str(&contents)
            .map_err(|e| format!("Failed to parse YAML config: {e}"))?;

        Ok(config)
    }
}
