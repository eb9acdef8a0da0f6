use std::sync::Arc;

use anyhow::anyhow;
use tracing::info;

use crate::config::ServerConfig;
use crate::core::llm::{NimChatClient, PizzaOrderTool, ToolRegistry, prompt};
use crate::core::session::{SessionServices, SessionSettings};
use crate::core::stt::RivaSpeechRecognizer;
use crate::core::tts::RivaSpeechSynthesizer;

/// Application state shared by every request and media stream
pub struct AppState {
    pub config: ServerConfig,
    pub services: SessionServices,
    pub session_settings: SessionSettings,
}

impl AppState {
    /// Build the upstream clients described by `config`.
    ///
    /// gRPC channels connect lazily, so an unreachable Riva server only
    /// surfaces when the first call is made.
    pub async fn new(config: ServerConfig) -> anyhow::Result<Arc<Self>> {
        let recognizer = RivaSpeechRecognizer::new(&config.riva_asr_address, config.riva_use_tls)
            .map_err(|e| anyhow!("Failed to create Riva ASR client: {e}"))?;
        let synthesizer = RivaSpeechSynthesizer::new(&config.riva_tts_address, config.riva_use_tls)
            .map_err(|e| anyhow!("Failed to create Riva TTS client: {e}"))?;
        let llm = NimChatClient::new(config.nim_config())
            .map_err(|e| anyhow!("Failed to create NIM client: {e}"))?;

        let services = SessionServices {
            recognizer: Arc::new(recognizer),
            synthesizer: Arc::new(synthesizer),
            llm: Arc::new(llm),
            tools: Arc::new(ToolRegistry::new().with_tool(Arc::new(PizzaOrderTool))),
        };

        info!(
            language = %config.language_code,
            voice = %config.voice_name,
            model = %config.llm_model,
            "Application state initialized"
        );
        Ok(Self::with_services(config, services))
    }

    /// State over caller-provided services
    pub fn with_services(config: ServerConfig, services: SessionServices) -> Arc<Self> {
        let system_prompt = prompt::system_prompt(&services.tools);
        let session_settings = config.session_settings(system_prompt);
        Arc::new(Self {
            config,
            services,
            session_settings,
        })
    }
}
