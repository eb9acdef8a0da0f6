//! Per-connection session lifecycle
//!
//! The controller owns everything one media stream needs: the ingest queue
//! feeding the transcription bridge, the dialog orchestrator task and the
//! synthesis streamer it drives. Messages from the socket are fed in one at a
//! time; [`SessionController::shutdown`] tears the whole graph down.

use std::sync::Arc;
use std::time::Duration;

use base64::Engine;
use base64::engine::general_purpose::STANDARD as BASE64;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info, warn};

use super::protocol::{BotMarker, InboundMessage, OutboundRoute, StartPayload};
use crate::core::audio::{AudioFrame, IngestSender, ingest_queue};
use crate::core::dialog::{DialogCommand, DialogConfig, DialogOrchestrator, DialogSummary};
use crate::core::llm::{LanguageModel, ToolRegistry};
use crate::core::speaking::SpeakingDetectionConfig;
use crate::core::stt::{RecognitionSettings, TranscriptionBridge, TranscriptionService};
use crate::core::tts::{ResponseSynthesisStreamer, StreamerConfig, SynthesisService};

/// Upstream services shared by every session
#[derive(Clone)]
pub struct SessionServices {
    pub recognizer: Arc<dyn TranscriptionService>,
    pub synthesizer: Arc<dyn SynthesisService>,
    pub llm: Arc<dyn LanguageModel>,
    pub tools: Arc<ToolRegistry>,
}

/// Per-session behaviour derived from the server configuration
#[derive(Debug, Clone)]
pub struct SessionSettings {
    pub language_code: String,
    pub voice_name: String,
    /// Spoken as soon as the stream starts; empty disables the greeting
    pub greeting: String,
    pub system_prompt: Arc<str>,
    pub speaking: SpeakingDetectionConfig,
    pub barge_in_on_speech_start: bool,
    pub forward_transcripts: bool,
    pub tts_chunk_timeout: Option<Duration>,
    pub asr_shutdown_grace: Duration,
}

struct ActiveSession {
    stream_sid: String,
    call_sid: Option<String>,
    ingest: IngestSender,
    commands: mpsc::UnboundedSender<DialogCommand>,
    cancel: CancellationToken,
    bridge: TranscriptionBridge,
    dialog: JoinHandle<DialogSummary>,
}

pub struct SessionController {
    services: SessionServices,
    settings: SessionSettings,
    outbound: mpsc::Sender<OutboundRoute>,
    session: Option<ActiveSession>,
    closed: bool,
    media_dropped: u64,
}

impl SessionController {
    pub fn new(
        services: SessionServices,
        settings: SessionSettings,
        outbound: mpsc::Sender<OutboundRoute>,
    ) -> Self {
        Self {
            services,
            settings,
            outbound,
            session: None,
            closed: false,
            media_dropped: 0,
        }
    }

    /// Stream SID bound by the `start` event, if any
    pub fn stream_sid(&self) -> Option<&str> {
        self.session.as_ref().map(|s| s.stream_sid.as_str())
    }

    pub fn is_started(&self) -> bool {
        self.session.is_some()
    }

    pub fn is_closed(&self) -> bool {
        self.closed
    }

    /// Handle one text frame. Returns false once the stream has ended.
    pub async fn handle_text(&mut self, text: &str) -> bool {
        match serde_json::from_str::<InboundMessage>(text) {
            Ok(message) => self.handle_message(message).await,
            Err(e) => {
                warn!("Failed to parse media stream message: {}", e);
                true
            }
        }
    }

    /// Dispatch one inbound message. Returns false once the stream has ended.
    pub async fn handle_message(&mut self, message: InboundMessage) -> bool {
        if self.closed {
            debug!(event = message.kind(), "Message after session close ignored");
            return false;
        }

        match message {
            InboundMessage::Connected { protocol, version } => {
                info!(?protocol, ?version, "Media stream connected");
            }
            InboundMessage::Start { start, stream_sid } => self.on_start(start, stream_sid),
            InboundMessage::Media { media } => self.on_media(&media.payload),
            InboundMessage::Stop { stream_sid } => {
                info!(?stream_sid, "Media stream stopped");
                self.shutdown().await;
                return false;
            }
            InboundMessage::Mark { mark } => self.on_mark(&mark.name),
            InboundMessage::Dtmf { dtmf } => {
                info!(digit = %dtmf.digit, stream_sid = ?self.stream_sid(), "DTMF received");
            }
            InboundMessage::Unknown => debug!("Ignoring unknown media stream event"),
        }
        true
    }

    fn on_start(&mut self, start: StartPayload, top_level_sid: Option<String>) {
        if let Some(existing) = &self.session {
            warn!(stream_sid = %existing.stream_sid, "Duplicate start event ignored");
            return;
        }

        let Some(stream_sid) = start.stream_sid.or(top_level_sid) else {
            error!("Start event without a stream SID, session not started");
            return;
        };

        if let Some(format) = &start.media_format
            && (format.encoding != "audio/x-mulaw" || format.sample_rate != 8000)
        {
            warn!(
                encoding = %format.encoding,
                sample_rate = format.sample_rate,
                "Unexpected media format, assuming 8 kHz mu-law"
            );
        }

        info!(stream_sid = %stream_sid, call_sid = ?start.call_sid, "Media stream started");
        self.session = Some(self.launch(stream_sid, start.call_sid));
    }

    fn launch(&self, stream_sid: String, call_sid: Option<String>) -> ActiveSession {
        let settings = &self.settings;
        let cancel = CancellationToken::new();

        let (ingest, frames) = ingest_queue();
        let (results_tx, results_rx) = mpsc::unbounded_channel();
        let bridge = TranscriptionBridge::spawn(
            Arc::clone(&self.services.recognizer),
            RecognitionSettings::telephony(settings.language_code.clone()),
            frames,
            results_tx,
            cancel.child_token(),
            settings.asr_shutdown_grace,
        );

        let streamer = ResponseSynthesisStreamer::new(
            Arc::clone(&self.services.synthesizer),
            StreamerConfig {
                language_code: settings.language_code.clone(),
                voice_name: settings.voice_name.clone(),
                chunk_timeout: settings.tts_chunk_timeout,
            },
            stream_sid.as_str(),
            self.outbound.clone(),
        );
        let orchestrator = DialogOrchestrator::new(
            stream_sid.as_str(),
            DialogConfig {
                system_prompt: Arc::clone(&settings.system_prompt),
                speaking: settings.speaking,
                barge_in_on_speech_start: settings.barge_in_on_speech_start,
                forward_transcripts: settings.forward_transcripts,
            },
            Arc::clone(&self.services.llm),
            Arc::clone(&self.services.tools),
            streamer,
            self.outbound.clone(),
        );

        let (commands, commands_rx) = mpsc::unbounded_channel();
        let dialog = tokio::spawn(orchestrator.run(results_rx, commands_rx, cancel.child_token()));

        if !settings.greeting.trim().is_empty() {
            // The receiver is alive: the task was just spawned
            let _ = commands.send(DialogCommand::Speak(settings.greeting.clone()));
        }

        ActiveSession {
            stream_sid,
            call_sid,
            ingest,
            commands,
            cancel,
            bridge,
            dialog,
        }
    }

    fn on_media(&mut self, payload: &str) {
        let Some(session) = self.session.as_mut() else {
            self.media_dropped += 1;
            if self.media_dropped == 1 {
                warn!("Media received before start, dropping");
            }
            return;
        };

        let wire = match BASE64.decode(payload) {
            Ok(wire) => wire,
            Err(e) => {
                warn!("Dropping media frame with invalid base64: {}", e);
                return;
            }
        };
        match AudioFrame::from_mulaw(&wire) {
            Ok(frame) => {
                if !session.ingest.push(frame) {
                    debug!("Ingest queue closed, dropping media frame");
                }
            }
            Err(e) => warn!("Dropping undecodable media frame: {}", e),
        }
    }

    fn on_mark(&mut self, name: &str) {
        let Some(marker) = BotMarker::from_name(name) else {
            debug!(name, "Ignoring unrecognized mark");
            return;
        };
        match &self.session {
            Some(session) => {
                let _ = session.commands.send(DialogCommand::PlaybackMark(marker));
            }
            None => debug!(name, "Mark received before start"),
        }
    }

    /// Tear the session down. Idempotent.
    ///
    /// Cancels synthesis, gives recognition its grace period to flush,
    /// waits for the dialog task and finally asks the writer to close the
    /// socket.
    pub async fn shutdown(&mut self) {
        if self.closed {
            return;
        }
        self.closed = true;

        if let Some(session) = self.session.take() {
            let ActiveSession {
                stream_sid,
                call_sid,
                ingest,
                commands,
                cancel,
                bridge,
                dialog,
            } = session;

            info!(
                stream_sid = %stream_sid,
                call_sid = ?call_sid,
                frames = ingest.frames_pushed(),
                "Tearing down session"
            );
            cancel.cancel();
            drop(ingest);

            let exit = bridge.join().await;
            debug!(?exit, "Transcription bridge exited");

            drop(commands);
            match dialog.await {
                Ok(summary) => info!(
                    stream_sid = %stream_sid,
                    turns = summary.turns,
                    interruptions = summary.interruptions,
                    history = summary.history.len(),
                    "Session finished"
                ),
                Err(e) => error!("Dialog task panicked: {}", e),
            }
        }

        if self.media_dropped > 0 {
            debug!(count = self.media_dropped, "Media frames dropped before start");
        }
        if self.outbound.send(OutboundRoute::Close).await.is_err() {
            debug!("Socket writer already gone");
        }
    }
}
