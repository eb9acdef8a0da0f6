//! Turn-taking state machine
//!
//! ```text
//!            final transcript              reply text
//!   IDLE ─────────────────────▶ AWAITING ─────────────▶ SPEAKING
//!    ▲                          RESPONSE                    │
//!    └──────────────────────────────────────────────────────┘
//!            synthesis finished (completed or cancelled)
//! ```
//!
//! A final transcript while SPEAKING cancels the reply in flight before the
//! next model call is made (barge-in).

use std::sync::Arc;

use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info, warn};

use super::history::ConversationHistory;
use crate::core::llm::{LanguageModel, ToolRegistry, fallback};
use crate::core::session::protocol::{BotMarker, OutboundMessage, OutboundRoute};
use crate::core::speaking::{
    CallerTransition, SpeakerActivity, SpeakingDetectionConfig, SpeakingState,
    SpeakingStateTracker,
};
use crate::core::stt::{TranscriptEvent, clock_now};
use crate::core::tts::{ResponseSynthesisStreamer, SynthesisOutcome, SynthesisStatus};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TurnState {
    Idle,
    AwaitingResponse,
    Speaking,
}

/// Requests from the session controller
#[derive(Debug, Clone, PartialEq)]
pub enum DialogCommand {
    /// Speak text without a model turn (the greeting)
    Speak(String),
    /// The far end echoed one of our markers
    PlaybackMark(BotMarker),
}

#[derive(Debug, Clone)]
pub struct DialogConfig {
    pub system_prompt: Arc<str>,
    pub speaking: SpeakingDetectionConfig,
    /// Cancel the reply as soon as caller speech onset is detected,
    /// instead of waiting for the final transcript
    pub barge_in_on_speech_start: bool,
    /// Echo transcript events to the outbound channel
    pub forward_transcripts: bool,
}

/// What the orchestrator leaves behind when the session ends
#[derive(Debug, Clone, Default)]
pub struct DialogSummary {
    pub history: ConversationHistory,
    pub turns: u32,
    pub interruptions: u32,
}

enum Input {
    Closing,
    SynthesisFinished(SynthesisOutcome),
    Command(DialogCommand),
    CommandsClosed,
    Transcript(TranscriptEvent),
    TranscriptsClosed,
}

pub struct DialogOrchestrator {
    stream_sid: Arc<str>,
    config: DialogConfig,
    llm: Arc<dyn LanguageModel>,
    tools: Arc<ToolRegistry>,
    streamer: ResponseSynthesisStreamer,
    outbound: mpsc::Sender<OutboundRoute>,
    tracker: SpeakingStateTracker,
    bot: SpeakerActivity,
    playback: SpeakerActivity,
    state: TurnState,
    closing: bool,
    summary: DialogSummary,
}

impl DialogOrchestrator {
    pub fn new(
        stream_sid: impl Into<Arc<str>>,
        config: DialogConfig,
        llm: Arc<dyn LanguageModel>,
        tools: Arc<ToolRegistry>,
        streamer: ResponseSynthesisStreamer,
        outbound: mpsc::Sender<OutboundRoute>,
    ) -> Self {
        Self {
            stream_sid: stream_sid.into(),
            tracker: SpeakingStateTracker::new(config.speaking),
            config,
            llm,
            tools,
            streamer,
            outbound,
            bot: SpeakerActivity::default(),
            playback: SpeakerActivity::default(),
            state: TurnState::Idle,
            closing: false,
            summary: DialogSummary::default(),
        }
    }

    pub fn state(&self) -> TurnState {
        self.state
    }

    pub fn speaking_state(&self) -> SpeakingState {
        SpeakingState {
            caller_speaking: self.tracker.is_caller_speaking(),
            bot_speaking: self.bot.is_speaking(),
        }
    }

    /// Drive the dialog until the session closes.
    ///
    /// After `cancel` fires the active reply is cut short and no new turns
    /// start, but transcript events keep draining until the bridge drops its
    /// sender so late results are still logged.
    pub async fn run(
        mut self,
        mut transcripts: mpsc::UnboundedReceiver<TranscriptEvent>,
        mut commands: mpsc::UnboundedReceiver<DialogCommand>,
        cancel: CancellationToken,
    ) -> DialogSummary {
        let mut transcripts_open = true;
        let mut commands_open = true;

        loop {
            let input = tokio::select! {
                biased;
                _ = cancel.cancelled(), if !self.closing => Input::Closing,
                Some(outcome) = self.streamer.wait(), if self.streamer.is_active() => {
                    Input::SynthesisFinished(outcome)
                }
                command = commands.recv(), if commands_open => match command {
                    Some(command) => Input::Command(command),
                    None => Input::CommandsClosed,
                },
                event = transcripts.recv(), if transcripts_open => match event {
                    Some(event) => Input::Transcript(event),
                    None => Input::TranscriptsClosed,
                },
                else => break,
            };

            match input {
                Input::Closing => {
                    info!(stream_sid = %self.stream_sid, "Dialog closing");
                    self.closing = true;
                    self.stop_speaking().await;
                }
                Input::SynthesisFinished(outcome) => self.finish_speaking(outcome),
                Input::Command(command) => self.on_command(command, &cancel).await,
                Input::CommandsClosed => commands_open = false,
                Input::Transcript(event) => self.on_transcript(event, &cancel).await,
                Input::TranscriptsClosed => {
                    debug!(stream_sid = %self.stream_sid, "Transcript channel closed");
                    transcripts_open = false;
                }
            }
        }

        self.stop_speaking().await;
        info!(
            stream_sid = %self.stream_sid,
            turns = self.summary.turns,
            interruptions = self.summary.interruptions,
            "Dialog finished"
        );
        self.summary
    }

    async fn on_command(&mut self, command: DialogCommand, cancel: &CancellationToken) {
        match command {
            DialogCommand::Speak(text) => {
                if self.closing || cancel.is_cancelled() {
                    debug!("Ignoring speak request, session closing");
                    return;
                }
                self.speak(text).await;
            }
            DialogCommand::PlaybackMark(BotMarker::SpeakingStart) => {
                self.playback.begin(clock_now());
                debug!(stream_sid = %self.stream_sid, "Far end started playing reply");
            }
            DialogCommand::PlaybackMark(BotMarker::SpeakingEnd) => {
                match self.playback.end(clock_now()) {
                    Some(duration) => info!(
                        stream_sid = %self.stream_sid,
                        duration_ms = duration.as_millis() as u64,
                        "Far end finished playing reply"
                    ),
                    None => warn!(
                        stream_sid = %self.stream_sid,
                        "Playback end acknowledged without a matching start"
                    ),
                }
            }
        }
    }

    async fn on_transcript(&mut self, event: TranscriptEvent, cancel: &CancellationToken) {
        if self.config.forward_transcripts {
            let message = OutboundMessage::transcription(&self.stream_sid, event.clone());
            if self.outbound.send(OutboundRoute::Message(message)).await.is_err() {
                debug!("Outbound channel closed, transcript not forwarded");
            }
        }

        if let Some(transition) = self.tracker.observe(&event) {
            self.log_speaking_status();
            if transition == CallerTransition::Started
                && self.config.barge_in_on_speech_start
                && self.streamer.is_active()
            {
                info!(stream_sid = %self.stream_sid, "Caller started talking over the bot");
                self.summary.interruptions += 1;
                self.stop_speaking().await;
            }
        }

        if !event.is_final {
            return;
        }

        let text = event.text.trim();
        if text.is_empty() {
            debug!("Ignoring empty final transcript");
            return;
        }
        if self.closing {
            debug!(text, "Session closing, final transcript not answered");
            return;
        }

        info!(stream_sid = %self.stream_sid, text, confidence = event.confidence, "Caller said");
        self.take_turn(text.to_string(), cancel).await;
    }

    async fn take_turn(&mut self, text: String, cancel: &CancellationToken) {
        if self.streamer.is_active() {
            warn!(stream_sid = %self.stream_sid, "Caller interrupted the bot, cancelling reply");
            self.summary.interruptions += 1;
            self.stop_speaking().await;
        }

        self.transition(TurnState::AwaitingResponse);
        self.summary.history.push_user(text);

        let messages = self.summary.history.to_messages(&self.config.system_prompt);
        let started = clock_now();
        let result = tokio::select! {
            result = self.llm.complete(&messages) => result,
            _ = cancel.cancelled() => {
                info!("Session closing while awaiting the model, turn abandoned");
                self.transition(TurnState::Idle);
                return;
            }
        };

        let reply = match result {
            Ok(raw) => {
                let resolved = self.tools.resolve(&raw);
                let elapsed = clock_now().saturating_duration_since(started);
                info!(
                    stream_sid = %self.stream_sid,
                    duration_ms = elapsed.as_millis() as u64,
                    tool = ?resolved.tool,
                    reply = %resolved.text,
                    "Model replied"
                );
                resolved.text
            }
            Err(e) => {
                error!(stream_sid = %self.stream_sid, "Model call failed: {}", e);
                fallback::for_error(&e).to_string()
            }
        };

        self.summary.history.push_assistant(reply.clone());
        self.summary.turns += 1;
        self.speak(reply).await;
    }

    async fn speak(&mut self, text: String) {
        self.stop_speaking().await;

        self.bot.begin(clock_now());
        let task_id = self.streamer.start(text).await;
        debug!(task_id, "Synthesis task started");
        self.transition(TurnState::Speaking);
        self.log_speaking_status();
    }

    /// Cancel the reply in flight, if any, and wait for its end marker.
    async fn stop_speaking(&mut self) {
        if let Some(outcome) = self.streamer.cancel_active().await {
            self.finish_speaking(outcome);
        }
    }

    fn finish_speaking(&mut self, outcome: SynthesisOutcome) {
        match self.bot.end(clock_now()) {
            Some(duration) => info!(
                stream_sid = %self.stream_sid,
                task_id = outcome.task_id,
                cancelled = outcome.status == SynthesisStatus::Cancelled,
                duration_ms = duration.as_millis() as u64,
                "Bot finished speaking"
            ),
            None => warn!(
                task_id = outcome.task_id,
                "Bot finished speaking without a recorded start"
            ),
        }
        if self.state == TurnState::Speaking {
            self.transition(TurnState::Idle);
        }
        self.log_speaking_status();
    }

    fn transition(&mut self, next: TurnState) {
        if self.state != next {
            debug!(stream_sid = %self.stream_sid, from = ?self.state, to = ?next, "Turn state");
            self.state = next;
        }
    }

    fn log_speaking_status(&self) {
        info!(stream_sid = %self.stream_sid, "Speaking status: {}", self.speaking_state());
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::dialog::TurnRole;
    use crate::core::llm::{ChatMessage, ChatRole, LLMError, LLMResult, PizzaOrderTool};
    use crate::core::tts::{
        AudioChunkStream, StreamerConfig, SynthesisRequest, SynthesisService, TTSResult,
    };
    use async_trait::async_trait;
    use bytes::Bytes;
    use futures::StreamExt;
    use std::collections::VecDeque;
    use std::sync::Mutex;
    use std::time::Duration;
    use tokio::time::sleep;

    struct ScriptedModel {
        delay: Duration,
        replies: Mutex<VecDeque<LLMResult<String>>>,
        calls: Mutex<Vec<Vec<ChatMessage>>>,
    }

    impl ScriptedModel {
        fn new(replies: Vec<LLMResult<String>>) -> Arc<Self> {
            Self::slow(replies, Duration::ZERO)
        }

        /// Answers only after `delay`
        fn slow(replies: Vec<LLMResult<String>>, delay: Duration) -> Arc<Self> {
            Arc::new(Self {
                delay,
                replies: Mutex::new(replies.into()),
                calls: Mutex::new(Vec::new()),
            })
        }
    }

    #[async_trait]
    impl LanguageModel for ScriptedModel {
        async fn complete(&self, messages: &[ChatMessage]) -> LLMResult<String> {
            self.calls.lock().unwrap().push(messages.to_vec());
            if !self.delay.is_zero() {
                sleep(self.delay).await;
            }
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

    /// Records requested texts; yields `chunks` chunks `delay` apart.
    struct RecordingSynth {
        chunks: usize,
        delay: Duration,
        texts: Mutex<Vec<String>>,
    }

    impl RecordingSynth {
        fn new(chunks: usize, delay: Duration) -> Arc<Self> {
            Arc::new(Self {
                chunks,
                delay,
                texts: Mutex::new(Vec::new()),
            })
        }
    }

    #[async_trait]
    impl SynthesisService for RecordingSynth {
        async fn synthesize(&self, request: SynthesisRequest) -> TTSResult<AudioChunkStream> {
            self.texts.lock().unwrap().push(request.text);
            let (chunks, delay) = (self.chunks, self.delay);
            Ok(async_stream::stream! {
                for _ in 0..chunks {
                    sleep(delay).await;
                    yield Ok(Bytes::from(vec![0u8; 320]));
                }
            }
            .boxed())
        }

        fn provider_name(&self) -> &'static str {
            "recording"
        }
    }

    struct Harness {
        transcripts: mpsc::UnboundedSender<TranscriptEvent>,
        commands: mpsc::UnboundedSender<DialogCommand>,
        outbound: mpsc::Receiver<OutboundRoute>,
        cancel: CancellationToken,
        handle: tokio::task::JoinHandle<DialogSummary>,
    }

    fn dialog_config(forward_transcripts: bool, barge_in_on_speech_start: bool) -> DialogConfig {
        DialogConfig {
            system_prompt: Arc::from("system"),
            speaking: SpeakingDetectionConfig::default(),
            barge_in_on_speech_start,
            forward_transcripts,
        }
    }

    fn start(
        llm: Arc<ScriptedModel>,
        synth: Arc<RecordingSynth>,
        forward_transcripts: bool,
    ) -> Harness {
        start_with(llm, synth, dialog_config(forward_transcripts, false))
    }

    fn start_with(
        llm: Arc<ScriptedModel>,
        synth: Arc<RecordingSynth>,
        config: DialogConfig,
    ) -> Harness {
        let (out_tx, out_rx) = mpsc::channel(1024);
        let streamer = ResponseSynthesisStreamer::new(
            synth,
            StreamerConfig {
                language_code: "en-US".to_string(),
                voice_name: "English-US.Female-1".to_string(),
                chunk_timeout: None,
            },
            "MZ1",
            out_tx.clone(),
        );
        let orchestrator = DialogOrchestrator::new(
            "MZ1",
            config,
            llm,
            Arc::new(ToolRegistry::new().with_tool(Arc::new(PizzaOrderTool))),
            streamer,
            out_tx,
        );

        let (t_tx, t_rx) = mpsc::unbounded_channel();
        let (c_tx, c_rx) = mpsc::unbounded_channel();
        let cancel = CancellationToken::new();
        let handle = tokio::spawn(orchestrator.run(t_rx, c_rx, cancel.clone()));

        Harness {
            transcripts: t_tx,
            commands: c_tx,
            outbound: out_rx,
            cancel,
            handle,
        }
    }

    impl Harness {
        fn say(&self, event: TranscriptEvent) {
            self.transcripts.send(event).unwrap();
        }

        async fn finish(self) -> (DialogSummary, Vec<OutboundMessage>) {
            let Harness {
                transcripts,
                commands,
                mut outbound,
                cancel,
                handle,
            } = self;
            cancel.cancel();
            drop(transcripts);
            drop(commands);
            let summary = handle.await.unwrap();

            let mut messages = Vec::new();
            while let Ok(OutboundRoute::Message(message)) = outbound.try_recv() {
                messages.push(message);
            }
            (summary, messages)
        }
    }

    fn marker_names(messages: &[OutboundMessage]) -> Vec<String> {
        messages
            .iter()
            .filter_map(|m| match m {
                OutboundMessage::Mark { mark, .. } => Some(mark.name.clone()),
                _ => None,
            })
            .collect()
    }

    async fn settle() {
        sleep(Duration::from_millis(100)).await;
    }

    #[tokio::test(start_paused = true)]
    async fn test_final_transcript_produces_turn() {
        let llm = ScriptedModel::new(vec![Ok("What size would you like?".to_string())]);
        let synth = RecordingSynth::new(2, Duration::ZERO);
        let harness = start(llm.clone(), synth.clone(), false);

        harness.say(TranscriptEvent::final_result("I want a pizza", 0.9));
        settle().await;

        let (summary, messages) = harness.finish().await;
        let turns = summary.history.turns();
        assert_eq!(turns.len(), 2);
        assert_eq!(turns[0].text, "I want a pizza");
        assert_eq!(turns[1].text, "What size would you like?");
        assert_eq!(summary.turns, 1);

        let calls = llm.calls.lock().unwrap();
        assert_eq!(calls.len(), 1);
        assert_eq!(calls[0][0].role, ChatRole::System);
        assert_eq!(calls[0][1].content, "I want a pizza");

        assert_eq!(
            synth.texts.lock().unwrap().as_slice(),
            ["What size would you like?"]
        );
        assert_eq!(
            marker_names(&messages),
            vec!["bot_speaking_start", "bot_speaking_end"]
        );
    }

    #[tokio::test(start_paused = true)]
    async fn test_interim_transcripts_do_not_call_model() {
        let llm = ScriptedModel::new(vec![]);
        let synth = RecordingSynth::new(1, Duration::ZERO);
        let harness = start(llm.clone(), synth, true);

        for text in ["I", "I want", "I want a"] {
            harness.say(TranscriptEvent::interim(text, 0.1));
        }
        settle().await;

        let (summary, messages) = harness.finish().await;
        assert!(summary.history.is_empty());
        assert!(llm.calls.lock().unwrap().is_empty());
        let forwarded = messages
            .iter()
            .filter(|m| matches!(m, OutboundMessage::Transcription { .. }))
            .count();
        assert_eq!(forwarded, 3);
    }

    #[tokio::test(start_paused = true)]
    async fn test_pizza_tool_reply_is_confirmed() {
        let llm = ScriptedModel::new(vec![Ok(
            r#"<function=process_pizza_order>{"size":"medium","toppings":["cheese","pepperoni"],"crust":"thin"}</function>"#
                .to_string(),
        )]);
        let synth = RecordingSynth::new(1, Duration::ZERO);
        let harness = start(llm, synth.clone(), false);

        harness.say(TranscriptEvent::final_result(
            "I'd like a medium pizza with cheese and pepperoni on a thin crust",
            0.95,
        ));
        settle().await;

        let (summary, _) = harness.finish().await;
        let spoken = synth.texts.lock().unwrap()[0].clone();
        assert!(!spoken.contains("<function"));
        assert!(spoken.contains("medium"));
        assert!(spoken.contains("thin crust"));
        assert_eq!(summary.history.turns()[1].text, spoken);
    }

    #[tokio::test(start_paused = true)]
    async fn test_model_failure_speaks_apology() {
        let llm = ScriptedModel::new(vec![Err(LLMError::RequestFailed("refused".to_string()))]);
        let synth = RecordingSynth::new(1, Duration::ZERO);
        let harness = start(llm, synth.clone(), false);

        harness.say(TranscriptEvent::final_result("hello", 0.9));
        settle().await;

        let (summary, _) = harness.finish().await;
        assert_eq!(
            synth.texts.lock().unwrap().as_slice(),
            [fallback::MODEL_UNAVAILABLE]
        );
        assert_eq!(summary.history.len(), 2);
    }

    #[tokio::test(start_paused = true)]
    async fn test_barge_in_cancels_reply_before_next_turn() {
        let llm = ScriptedModel::new(vec![
            Ok("A long answer".to_string()),
            Ok("Short answer".to_string()),
        ]);
        let synth = RecordingSynth::new(100, Duration::from_millis(10));
        let harness = start(llm, synth.clone(), false);

        harness.say(TranscriptEvent::final_result("first question", 0.9));
        sleep(Duration::from_millis(55)).await;
        harness.say(TranscriptEvent::final_result("second question", 0.9));
        settle().await;

        let (summary, messages) = harness.finish().await;
        assert_eq!(summary.interruptions, 1);
        assert_eq!(summary.turns, 2);
        assert_eq!(
            marker_names(&messages),
            vec![
                "bot_speaking_start",
                "bot_speaking_end",
                "bot_speaking_start",
                "bot_speaking_end"
            ]
        );

        let roles: Vec<TurnRole> = summary.history.turns().iter().map(|t| t.role).collect();
        assert_eq!(
            roles,
            vec![
                TurnRole::User,
                TurnRole::Assistant,
                TurnRole::User,
                TurnRole::Assistant
            ]
        );
        let texts: Vec<&str> = summary
            .history
            .turns()
            .iter()
            .map(|t| t.text.as_str())
            .collect();
        assert_eq!(
            texts,
            vec!["first question", "A long answer", "second question", "Short answer"]
        );

        // Five 10ms chunks fit before the second question at 55ms
        let first_reply_chunks = messages
            .iter()
            .skip(1)
            .take_while(|m| matches!(m, OutboundMessage::Media { .. }))
            .count();
        assert_eq!(first_reply_chunks, 5);
    }

    #[tokio::test(start_paused = true)]
    async fn test_spaced_interims_behind_slow_model_are_not_speech_onset() {
        let llm = ScriptedModel::slow(vec![Ok("Sure".to_string())], Duration::from_secs(2));
        let synth = RecordingSynth::new(100, Duration::from_millis(10));
        let harness = start_with(llm, synth.clone(), dialog_config(false, true));

        harness.say(TranscriptEvent::final_result("first question", 0.9));
        // Queued while the model is still thinking, wider apart than the window
        for text in ["um", "um so", "um so yeah"] {
            sleep(Duration::from_millis(600)).await;
            harness.say(TranscriptEvent::interim(text, 0.2));
        }
        sleep(Duration::from_millis(300)).await;

        let (summary, messages) = harness.finish().await;
        assert_eq!(summary.interruptions, 0);
        assert_eq!(synth.texts.lock().unwrap().as_slice(), ["Sure"]);

        // The reply played until the session closed, not cut at its start
        let chunks = messages
            .iter()
            .filter(|m| matches!(m, OutboundMessage::Media { .. }))
            .count();
        assert!(chunks > 0);
    }

    #[tokio::test(start_paused = true)]
    async fn test_quick_interims_behind_slow_model_still_barge_in() {
        let llm = ScriptedModel::slow(vec![Ok("Sure".to_string())], Duration::from_secs(2));
        let synth = RecordingSynth::new(100, Duration::from_millis(10));
        let harness = start_with(llm, synth, dialog_config(false, true));

        harness.say(TranscriptEvent::final_result("first question", 0.9));
        sleep(Duration::from_millis(1500)).await;
        for text in ["wait", "wait no", "wait no make"] {
            harness.say(TranscriptEvent::interim(text, 0.2));
            sleep(Duration::from_millis(100)).await;
        }
        sleep(Duration::from_millis(300)).await;

        let (summary, messages) = harness.finish().await;
        assert_eq!(summary.interruptions, 1);
        assert_eq!(
            marker_names(&messages),
            vec!["bot_speaking_start", "bot_speaking_end"]
        );
        // Cancelled as soon as the queued burst was read
        assert!(
            !messages
                .iter()
                .any(|m| matches!(m, OutboundMessage::Media { .. }))
        );
    }

    #[tokio::test(start_paused = true)]
    async fn test_speak_command_and_playback_marks() {
        let llm = ScriptedModel::new(vec![]);
        let synth = RecordingSynth::new(1, Duration::ZERO);
        let harness = start(llm.clone(), synth.clone(), false);

        harness
            .commands
            .send(DialogCommand::Speak("Welcome!".to_string()))
            .unwrap();
        harness
            .commands
            .send(DialogCommand::PlaybackMark(BotMarker::SpeakingStart))
            .unwrap();
        harness
            .commands
            .send(DialogCommand::PlaybackMark(BotMarker::SpeakingEnd))
            .unwrap();
        settle().await;

        let (summary, messages) = harness.finish().await;
        assert!(summary.history.is_empty());
        assert!(llm.calls.lock().unwrap().is_empty());
        assert_eq!(synth.texts.lock().unwrap().as_slice(), ["Welcome!"]);
        assert_eq!(marker_names(&messages).len(), 2);
    }

    #[tokio::test(start_paused = true)]
    async fn test_cancel_stops_active_reply() {
        let llm = ScriptedModel::new(vec![]);
        let synth = RecordingSynth::new(1000, Duration::from_millis(10));
        let harness = start(llm, synth, false);

        harness
            .commands
            .send(DialogCommand::Speak("A very long greeting".to_string()))
            .unwrap();
        sleep(Duration::from_millis(30)).await;

        let (_, messages) = tokio::time::timeout(Duration::from_secs(2), harness.finish())
            .await
            .expect("orchestrator should stop promptly");
        assert_eq!(
            marker_names(&messages),
            vec!["bot_speaking_start", "bot_speaking_end"]
        );
    }
}
