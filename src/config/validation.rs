//! Configuration validation logic

use std::error::Error;

use super::ServerConfig;
use crate::core::tts::{available_voices, is_voice_available};

/// Validate a fully merged configuration
pub(super) fn validate(config: &ServerConfig) -> Result<(), Box<dyn Error>> {
    validate_port(config.port)?;
    validate_speaking_threshold(config.speaking_threshold)?;
    validate_voice(&config.language_code, &config.voice_name)?;
    validate_tls(config)?;
    Ok(())
}

fn validate_port(port: u16) -> Result<(), Box<dyn Error>> {
    if port == 0 {
        return Err("PORT must be non-zero".into());
    }
    Ok(())
}

fn validate_speaking_threshold(threshold: u32) -> Result<(), Box<dyn Error>> {
    if threshold == 0 {
        return Err("SPEAKING_THRESHOLD must be at least 1".into());
    }
    Ok(())
}

fn validate_voice(language_code: &str, voice_name: &str) -> Result<(), Box<dyn Error>> {
    if available_voices(language_code).is_none() {
        return Err(format!("Unsupported language code: {language_code}").into());
    }
    if !is_voice_available(language_code, voice_name) {
        return Err(
            format!("Voice {voice_name} is not available for language {language_code}").into(),
        );
    }
    Ok(())
}

fn validate_tls(config: &ServerConfig) -> Result<(), Box<dyn Error>> {
    let Some(tls) = &config.tls else {
        return Ok(());
    };
    if tls.cert_path.as_os_str().is_empty() || tls.key_path.as_os_str().is_empty() {
        return Err("TLS requires both a certificate path and a key path".into());
    }
    Ok(())
}
