//! Merging environment and YAML configuration
//!
//! Environment values are applied over the defaults first, then any value
//! present in the YAML file wins.

use std::error::Error;
use std::path::PathBuf;
use std::time::Duration;

use super::env::{flag, parse, var};
use super::yaml::YamlConfig;
use super::{ServerConfig, TlsConfig};

pub(super) fn merge_config(yaml: Option<YamlConfig>) -> Result<ServerConfig, Box<dyn Error>> {
    let mut config = ServerConfig::default();
    apply_env(&mut config)?;
    if let Some(yaml) = yaml {
        apply_yaml(&mut config, yaml);
    }
    Ok(config)
}

fn apply_env(config: &mut ServerConfig) -> Result<(), Box<dyn Error>> {
    // Server
    if let Some(host) = var("HOST") {
        config.host = host;
    }
    if let Some(port) = parse("PORT")? {
        config.port = port;
    }
    config.tls = tls_from_parts(var("TLS_CERT_PATH"), var("TLS_KEY_PATH"))?;
    if let Some(public_host) = var("PUBLIC_HOST") {
        config.public_host = Some(public_host);
    }

    // Riva
    if let Some(address) = var("RIVA_ASR_SERVICE_ADDRESS") {
        config.riva_asr_address = address;
    }
    if let Some(address) = var("RIVA_TTS_SERVICE_ADDRESS") {
        config.riva_tts_address = address;
    }
    if let Some(use_tls) = flag("RIVA_USE_TLS")? {
        config.riva_use_tls = use_tls;
    }

    // Speech
    if let Some(language) = var("LANGUAGE_CODE") {
        config.language_code = language;
    }
    if let Some(voice) = var("TTS_VOICE") {
        config.voice_name = voice;
    }
    if let Some(secs) = parse::<u64>("TTS_CHUNK_TIMEOUT_SECONDS")? {
        config.tts_chunk_timeout = Some(Duration::from_secs(secs));
    }
    if let Some(ms) = parse::<u64>("ASR_SHUTDOWN_GRACE_MS")? {
        config.asr_shutdown_grace = Duration::from_millis(ms);
    }

    // Language model
    if let Some(address) = var("NIM_LLM_SERVICE_ADDRESS") {
        config.llm_address = address;
    }
    if let Some(use_tls) = flag("NIM_LLM_USE_TLS")? {
        config.llm_use_tls = use_tls;
    }
    if let Some(model) = var("NIM_LLM_MODEL") {
        config.llm_model = model;
    }
    if let Some(key) = var("NIM_API_KEY") {
        config.llm_api_key = Some(key);
    }
    if let Some(secs) = parse::<u64>("LLM_TIMEOUT_SECONDS")? {
        config.llm_timeout = Some(Duration::from_secs(secs));
    }

    // Dialog
    if let Some(threshold) = parse("SPEAKING_THRESHOLD")? {
        config.speaking_threshold = threshold;
    }
    if let Some(ms) = parse::<u64>("SPEAKING_RESET_WINDOW_MS")? {
        config.speaking_reset_window = Duration::from_millis(ms);
    }
    if let Some(barge_in) = flag("BARGE_IN_ON_SPEECH_START")? {
        config.barge_in_on_speech_start = barge_in;
    }
    if let Some(greeting) = var("GREETING_TEXT") {
        config.greeting = greeting;
    }

    // Security
    if let Some(origins) = var("CORS_ALLOWED_ORIGINS") {
        config.cors_allowed_origins = Some(origins);
    }

    Ok(())
}

fn tls_from_parts(
    cert_path: Option<String>,
    key_path: Option<String>,
) -> Result<Option<TlsConfig>, Box<dyn Error>> {
    match (cert_path, key_path) {
        (Some(cert), Some(key)) => Ok(Some(TlsConfig {
            cert_path: PathBuf::from(cert),
            key_path: PathBuf::from(key),
        })),
        (None, None) => Ok(None),
        _ => Err("TLS requires both a certificate path and a key path".into()),
    }
}

fn apply_yaml(config: &mut ServerConfig, yaml: YamlConfig) {
    if let Some(server) = yaml.server {
        if let Some(host) = server.host {
            config.host = host;
        }
        if let Some(port) = server.port {
            config.port = port;
        }
        if let Some(public_host) = server.public_host {
            config.public_host = Some(public_host);
        }
        if let Some(tls) = server.tls {
            // Validation reports a half-configured pair
            match (tls.cert_path, tls.key_path) {
                (Some(cert), Some(key)) => {
                    config.tls = Some(TlsConfig {
                        cert_path: PathBuf::from(cert),
                        key_path: PathBuf::from(key),
                    });
                }
                (Some(cert), None) => {
                    config.tls = Some(TlsConfig {
                        cert_path: PathBuf::from(cert),
                        key_path: PathBuf::new(),
                    });
                }
                (None, Some(key)) => {
                    config.tls = Some(TlsConfig {
                        cert_path: PathBuf::new(),
                        key_path: PathBuf::from(key),
                    });
                }
                (None, None) => {}
            }
        }
    }

    if let Some(riva) = yaml.riva {
        if let Some(address) = riva.asr_address {
            config.riva_asr_address = address;
        }
        if let Some(address) = riva.tts_address {
            config.riva_tts_address = address;
        }
        if let Some(use_tls) = riva.use_tls {
            config.riva_use_tls = use_tls;
        }
    }

    if let Some(speech) = yaml.speech {
        if let Some(language) = speech.language_code {
            config.language_code = language;
        }
        if let Some(voice) = speech.voice_name {
            config.voice_name = voice;
        }
        if let Some(secs) = speech.chunk_timeout_seconds {
            config.tts_chunk_timeout = Some(Duration::from_secs(secs));
        }
        if let Some(ms) = speech.asr_shutdown_grace_ms {
            config.asr_shutdown_grace = Duration::from_millis(ms);
        }
    }

    if let Some(llm) = yaml.llm {
        if let Some(address) = llm.address {
            config.llm_address = address;
        }
        if let Some(use_tls) = llm.use_tls {
            config.llm_use_tls = use_tls;
        }
        if let Some(model) = llm.model {
            config.llm_model = model;
        }
        if let Some(key) = llm.api_key {
            config.llm_api_key = Some(key);
        }
        if let Some(secs) = llm.timeout_seconds {
            config.llm_timeout = Some(Duration::from_secs(secs));
        }

        let sampling = &mut config.llm_sampling;
        if let Some(temperature) = llm.temperature {
            sampling.temperature = temperature;
        }
        if let Some(top_p) = llm.top_p {
            sampling.top_p = top_p;
        }
        if let Some(max_tokens) = llm.max_tokens {
            sampling.max_tokens = max_tokens;
        }
        if let Some(penalty) = llm.frequency_penalty {
            sampling.frequency_penalty = penalty;
        }
        if let Some(stop) = llm.stop {
            sampling.stop = stop;
        }
    }

    if let Some(dialog) = yaml.dialog {
        if let Some(threshold) = dialog.speaking_threshold {
            config.speaking_threshold = threshold;
        }
        if let Some(ms) = dialog.reset_window_ms {
            config.speaking_reset_window = Duration::from_millis(ms);
        }
        if let Some(barge_in) = dialog.barge_in_on_speech_start {
            config.barge_in_on_speech_start = barge_in;
        }
        if let Some(greeting) = dialog.greeting {
            config.greeting = greeting;
        }
    }

    if let Some(security) = yaml.security
        && let Some(origins) = security.cors_allowed_origins
    {
        config.cors_allowed_origins = Some(origins);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_tls_requires_both_parts() {
        assert!(tls_from_parts(None, None).unwrap().is_none());
        assert!(
            tls_from_parts(Some("cert.pem".into()), Some("key.pem".into()))
                .unwrap()
                .is_some()
        );
        assert!(tls_from_parts(Some("cert.pem".into()), None).is_err());
        assert!(tls_from_parts(None, Some("key.pem".into())).is_err());
    }

    #[test]
    fn test_apply_yaml_leaves_unset_fields() {
        let yaml: YamlConfig = serde_yaml::from_str(
            r#"
llm:
  max_tokens: 128
dialog:
  barge_in_on_speech_start: true
"#,
        )
        .unwrap();

        let mut config = ServerConfig::default();
        apply_yaml(&mut config, yaml);

        assert_eq!(config.llm_sampling.max_tokens, 128);
        assert_eq!(config.llm_sampling.temperature, 0.7);
        assert!(config.barge_in_on_speech_start);
        assert_eq!(config.port, 8080);
    }

    #[test]
    fn test_apply_yaml_half_tls_is_kept_for_validation() {
        let yaml: YamlConfig =
            serde_yaml::from_str("server:\n  tls:\n    cert_path: \"/c.pem\"\n").unwrap();

        let mut config = ServerConfig::default();
        apply_yaml(&mut config, yaml);

        let tls = config.tls.clone().unwrap();
        assert_eq!(tls.cert_path, PathBuf::from("/c.pem"));
        assert_eq!(tls.key_path, PathBuf::new());
    }
}
