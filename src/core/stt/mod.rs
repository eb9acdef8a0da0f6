mod base;
pub mod bridge;
pub mod riva;

// Re-export public types and traits
pub use base::{
    AudioFrameStream, RecognitionAlternative, RecognitionBatch, RecognitionResult,
    RecognitionSettings, RecognitionStream, STTError, STTResult, TranscriptEvent,
    TranscriptionService, clock_now,
};

pub use bridge::{BridgeExit, DEFAULT_SHUTDOWN_GRACE, TranscriptionBridge};

// Re-export Riva implementation
pub use riva::RivaSpeechRecognizer;
