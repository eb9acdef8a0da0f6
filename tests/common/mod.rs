//! Scripted boundary doubles for driving whole sessions
//!
//! - `ScriptedRecognizer` answers each received audio frame with the next step of a script
//! - `RecordingSynth` records requested texts and streams silent PCM chunks
//! - `ScriptedModel` replays canned completions and records the prompts it saw

// Not every test binary uses every helper
#![allow(dead_code)]

use std::collections::VecDeque;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;
use base64::Engine;
use base64::engine::general_purpose::STANDARD as BASE64;
use bytes::Bytes;
use futures::StreamExt;
use serde_json::json;
use tokio::sync::mpsc;

use callbot_gateway::core::llm::{
    ChatMessage, LLMResult, LanguageModel, PizzaOrderTool, ToolRegistry,
};
use callbot_gateway::core::session::{OutboundMessage, OutboundRoute, SessionServices, SessionSettings};
use callbot_gateway::core::speaking::SpeakingDetectionConfig;
use callbot_gateway::core::stt::{
    AudioFrameStream, RecognitionAlternative, RecognitionBatch, RecognitionResult,
    RecognitionSettings, RecognitionStream, STTResult, TranscriptionService,
};
use callbot_gateway::core::tts::{
    AudioChunkStream, SynthesisRequest, SynthesisService, TTSError, TTSResult,
};

pub const STREAM_SID: &str = "MZ00000000000000000000000000000001";

/// What the recognizer emits in answer to one audio frame
#[derive(Debug, Clone)]
pub enum Step {
    Silence,
    Interim(&'static str),
    Final(&'static str),
}

pub struct ScriptedRecognizer {
    script: Mutex<VecDeque<Step>>,
    pub frames: Arc<AtomicUsize>,
    pub pcm_bytes: Arc<AtomicUsize>,
}

impl ScriptedRecognizer {
    pub fn new(script: Vec<Step>) -> Arc<Self> {
        Arc::new(Self {
            script: Mutex::new(script.into()),
            frames: Arc::new(AtomicUsize::new(0)),
            pcm_bytes: Arc::new(AtomicUsize::new(0)),
        })
    }

    fn take_script(&self) -> VecDeque<Step> {
        std::mem::take(&mut *self.script.lock().unwrap())
    }
}

#[async_trait]
impl TranscriptionService for ScriptedRecognizer {
    async fn streaming_recognize(
        &self,
        settings: RecognitionSettings,
        audio: AudioFrameStream,
    ) -> STTResult<RecognitionStream> {
        assert_eq!(settings.sample_rate_hz, 8000);
        assert!(settings.interim_results);

        let mut script = self.take_script();
        let frames = Arc::clone(&self.frames);
        let pcm_bytes = Arc::clone(&self.pcm_bytes);
        let stream = async_stream::stream! {
            let mut audio = audio;
            while let Some(frame) = audio.next().await {
                frames.fetch_add(1, Ordering::SeqCst);
                pcm_bytes.fetch_add(frame.as_bytes().len(), Ordering::SeqCst);
                match script.pop_front() {
                    Some(Step::Interim(text)) => yield Ok(batch(false, text)),
                    Some(Step::Final(text)) => yield Ok(batch(true, text)),
                    Some(Step::Silence) | None => {}
                }
            }
        };
        Ok(stream.boxed())
    }

    fn provider_name(&self) -> &'static str {
        "scripted"
    }
}

fn batch(is_final: bool, text: &str) -> RecognitionBatch {
    RecognitionBatch {
        results: vec![RecognitionResult {
            is_final,
            alternatives: vec![RecognitionAlternative {
                transcript: text.to_string(),
                confidence: 0.9,
            }],
        }],
    }
}

/// Records each requested text and streams `chunks` silent 20 ms chunks
pub struct RecordingSynth {
    chunks: usize,
    delay: Duration,
    fail: bool,
    pub texts: Mutex<Vec<String>>,
}

impl RecordingSynth {
    pub fn new(chunks: usize, delay: Duration) -> Arc<Self> {
        Arc::new(Self {
            chunks,
            delay,
            fail: false,
            texts: Mutex::new(Vec::new()),
        })
    }

    /// Every request fails to open
    pub fn failing() -> Arc<Self> {
        Arc::new(Self {
            chunks: 0,
            delay: Duration::ZERO,
            fail: true,
            texts: Mutex::new(Vec::new()),
        })
    }

    pub fn texts(&self) -> Vec<String> {
        self.texts.lock().unwrap().clone()
    }
}

#[async_trait]
impl SynthesisService for RecordingSynth {
    async fn synthesize(&self, request: SynthesisRequest) -> TTSResult<AudioChunkStream> {
        self.texts.lock().unwrap().push(request.text);
        if self.fail {
            return Err(TTSError::ConnectionFailed("synthesizer offline".to_string()));
        }

        let (chunks, delay) = (self.chunks, self.delay);
        Ok(async_stream::stream! {
            for _ in 0..chunks {
                tokio::time::sleep(delay).await;
                yield Ok(Bytes::from(vec![0u8; 320]));
            }
        }
        .boxed())
    }

    fn provider_name(&self) -> &'static str {
        "recording"
    }
}

pub struct ScriptedModel {
    replies: Mutex<VecDeque<LLMResult<String>>>,
    pub calls: Mutex<Vec<Vec<ChatMessage>>>,
}

impl ScriptedModel {
    pub fn new(replies: Vec<LLMResult<String>>) -> Arc<Self> {
        Arc::new(Self {
            replies: Mutex::new(replies.into()),
            calls: Mutex::new(Vec::new()),
        })
    }

    pub fn call_count(&self) -> usize {
        self.calls.lock().unwrap().len()
    }
}

#[async_trait]
impl LanguageModel for ScriptedModel {
    async fn complete(&self, messages: &[ChatMessage]) -> LLMResult<String> {
        self.calls.lock().unwrap().push(messages.to_vec());
        self.replies
            .lock()
            .unwrap()
            .pop_front()
            .unwrap_or_else(|| Ok("Okay.".to_string()))
    }

    fn model_name(&self) -> &str {
        "scripted"
    }
}

pub fn services(
    recognizer: Arc<ScriptedRecognizer>,
    synth: Arc<RecordingSynth>,
    model: Arc<ScriptedModel>,
) -> SessionServices {
    SessionServices {
        recognizer,
        synthesizer: synth,
        llm: model,
        tools: Arc::new(ToolRegistry::new().with_tool(Arc::new(PizzaOrderTool))),
    }
}

pub fn settings(greeting: &str) -> SessionSettings {
    SessionSettings {
        language_code: "en-US".to_string(),
        voice_name: "English-US.Female-1".to_string(),
        greeting: greeting.to_string(),
        system_prompt: Arc::from("You take pizza orders."),
        speaking: SpeakingDetectionConfig::default(),
        barge_in_on_speech_start: false,
        forward_transcripts: true,
        tts_chunk_timeout: None,
        asr_shutdown_grace: Duration::from_millis(500),
    }
}

// =============================================================================
// Inbound frames
// =============================================================================

pub fn connected_json() -> String {
    json!({"event": "connected", "protocol": "Call", "version": "1.0.0"}).to_string()
}

pub fn start_json(stream_sid: &str) -> String {
    json!({
        "event": "start",
        "sequenceNumber": "1",
        "start": {
            "accountSid": "AC0001",
            "streamSid": stream_sid,
            "callSid": "CA0001",
            "tracks": ["inbound"],
            "mediaFormat": {"encoding": "audio/x-mulaw", "sampleRate": 8000, "channels": 1}
        },
        "streamSid": stream_sid
    })
    .to_string()
}

/// 20 ms of mu-law silence
pub fn media_json() -> String {
    json!({
        "event": "media",
        "media": {"track": "inbound", "chunk": "1", "timestamp": "5", "payload": BASE64.encode([0xFFu8; 160])}
    })
    .to_string()
}

pub fn mark_json(name: &str) -> String {
    json!({"event": "mark", "streamSid": STREAM_SID, "mark": {"name": name}}).to_string()
}

pub fn stop_json() -> String {
    json!({"event": "stop", "streamSid": STREAM_SID, "stop": {"callSid": "CA0001"}}).to_string()
}

// =============================================================================
// Outbound inspection
// =============================================================================

pub fn drain(rx: &mut mpsc::Receiver<OutboundRoute>) -> Vec<OutboundRoute> {
    let mut routes = Vec::new();
    while let Ok(route) = rx.try_recv() {
        routes.push(route);
    }
    routes
}

pub fn messages(routes: &[OutboundRoute]) -> Vec<&OutboundMessage> {
    routes
        .iter()
        .filter_map(|route| match route {
            OutboundRoute::Message(message) => Some(message),
            OutboundRoute::Close => None,
        })
        .collect()
}

pub fn marker_names(routes: &[OutboundRoute]) -> Vec<String> {
    messages(routes)
        .into_iter()
        .filter_map(|message| match message {
            OutboundMessage::Mark { mark, .. } => Some(mark.name.clone()),
            _ => None,
        })
        .collect()
}

pub fn media_count(routes: &[OutboundRoute]) -> usize {
    messages(routes)
        .into_iter()
        .filter(|message| matches!(message, OutboundMessage::Media { .. }))
        .count()
}
