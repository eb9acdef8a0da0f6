pub mod audio;
pub mod dialog;
pub mod grpc;
pub mod llm;
pub mod session;
pub mod speaking;
pub mod stt;
pub mod tts;

// Re-export commonly used types for convenience
pub use audio::{AudioFrame, CodecError, ingest_queue};

pub use stt::{
    RivaSpeechRecognizer, STTError, STTResult, TranscriptEvent, TranscriptionBridge,
    TranscriptionService,
};

pub use tts::{
    ResponseSynthesisStreamer, RivaSpeechSynthesizer, SynthesisService, TTSError, TTSResult,
};

pub use llm::{LLMError, LLMResult, LanguageModel, NimChatClient, ToolRegistry};

pub use dialog::{DialogOrchestrator, TurnState};

pub use session::{SessionController, SessionServices, SessionSettings};

pub use speaking::{SpeakingDetectionConfig, SpeakingStateTracker};
