//! Interruptible response speech streaming
//!
//! Each reply is spoken by one synthesis task: a start marker, the audio
//! chunks as mu-law media messages, then an end marker. The end marker is sent
//! on every exit path (completion, cancellation, synthesis failure) so the far
//! end never sees an unterminated reply.
//!
//! At most one task runs per session. [`ResponseSynthesisStreamer::start`]
//! cancels and awaits the previous task before spawning the next one, which
//! keeps audio from two replies from interleaving on the outbound channel.

use std::sync::Arc;
use std::time::{Duration, Instant};

use base64::{Engine, engine::general_purpose::STANDARD as BASE64_STANDARD};
use futures::StreamExt;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info, warn};

use super::base::{AudioChunkStream, SynthesisRequest, SynthesisService, TTSError, TTSResult};
use crate::core::audio::StreamingEncoder;
use crate::core::session::protocol::{BotMarker, OutboundMessage, OutboundRoute};

/// Settings shared by every task of one streamer
#[derive(Debug, Clone)]
pub struct StreamerConfig {
    pub language_code: String,
    pub voice_name: String,
    /// Maximum wait for the next synthesis chunk; `None` waits forever
    pub chunk_timeout: Option<Duration>,
}

/// How a synthesis task ended
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SynthesisStatus {
    Completed,
    Cancelled,
    Failed,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SynthesisOutcome {
    pub task_id: u64,
    pub status: SynthesisStatus,
    pub chunks_sent: usize,
    pub elapsed: Duration,
}

/// One in-flight "speak this text" operation
#[derive(Debug)]
pub struct SynthesisTask {
    id: u64,
    cancel: CancellationToken,
    handle: JoinHandle<SynthesisOutcome>,
}

impl SynthesisTask {
    pub fn id(&self) -> u64 {
        self.id
    }

    /// Request cooperative cancellation without waiting
    pub fn cancel(&self) {
        self.cancel.cancel();
    }

    pub fn is_cancelled(&self) -> bool {
        self.cancel.is_cancelled()
    }

    async fn finish(handle: &mut JoinHandle<SynthesisOutcome>, id: u64) -> SynthesisOutcome {
        match handle.await {
            Ok(outcome) => outcome,
            Err(e) => {
                error!(task_id = id, "Synthesis task panicked: {}", e);
                SynthesisOutcome {
                    task_id: id,
                    status: SynthesisStatus::Failed,
                    chunks_sent: 0,
                    elapsed: Duration::ZERO,
                }
            }
        }
    }
}

/// Drives synthesis tasks for one session
pub struct ResponseSynthesisStreamer {
    service: Arc<dyn SynthesisService>,
    config: StreamerConfig,
    stream_sid: Arc<str>,
    outbound: mpsc::Sender<OutboundRoute>,
    active: Option<SynthesisTask>,
    next_id: u64,
}

impl ResponseSynthesisStreamer {
    pub fn new(
        service: Arc<dyn SynthesisService>,
        config: StreamerConfig,
        stream_sid: impl Into<Arc<str>>,
        outbound: mpsc::Sender<OutboundRoute>,
    ) -> Self {
        Self {
            service,
            config,
            stream_sid: stream_sid.into(),
            outbound,
            active: None,
            next_id: 1,
        }
    }

    pub fn is_active(&self) -> bool {
        self.active.is_some()
    }

    pub fn active_task(&self) -> Option<&SynthesisTask> {
        self.active.as_ref()
    }

    /// Start speaking `text`, returning the new task's id.
    ///
    /// Any task still running is cancelled and awaited first.
    pub async fn start(&mut self, text: impl Into<String>) -> u64 {
        if let Some(previous) = self.cancel_active().await {
            debug!(
                task_id = previous.task_id,
                status = ?previous.status,
                "Previous synthesis task stopped before starting a new one"
            );
        }

        let id = self.next_id;
        self.next_id += 1;

        let request = SynthesisRequest::new(
            text,
            self.config.language_code.clone(),
            self.config.voice_name.clone(),
        );
        let cancel = CancellationToken::new();
        let handle = tokio::spawn(run_task(
            id,
            Arc::clone(&self.service),
            request,
            Arc::clone(&self.stream_sid),
            self.outbound.clone(),
            cancel.clone(),
            self.config.chunk_timeout,
        ));

        self.active = Some(SynthesisTask { id, cancel, handle });
        id
    }

    /// Wait for the active task to end on its own.
    ///
    /// Returns `None` immediately when nothing is active. Safe to use as a
    /// `select!` branch: dropping the future leaves the task in place.
    pub async fn wait(&mut self) -> Option<SynthesisOutcome> {
        let task = self.active.as_mut()?;
        let outcome = SynthesisTask::finish(&mut task.handle, task.id).await;
        self.active = None;
        Some(outcome)
    }

    /// Cancel the active task and wait for it to emit its end marker.
    ///
    /// Idempotent: returns `None` when nothing is active.
    pub async fn cancel_active(&mut self) -> Option<SynthesisOutcome> {
        let mut task = self.active.take()?;
        task.cancel();
        Some(SynthesisTask::finish(&mut task.handle, task.id).await)
    }
}

async fn run_task(
    id: u64,
    service: Arc<dyn SynthesisService>,
    request: SynthesisRequest,
    stream_sid: Arc<str>,
    outbound: mpsc::Sender<OutboundRoute>,
    cancel: CancellationToken,
    chunk_timeout: Option<Duration>,
) -> SynthesisOutcome {
    let started = Instant::now();
    let provider = service.provider_name();
    info!(task_id = id, provider, text = %request.text, "Speaking");

    send_marker(&outbound, &stream_sid, BotMarker::SpeakingStart).await;

    let mut chunks_sent = 0usize;
    let status = stream_audio(
        service.as_ref(),
        request,
        &stream_sid,
        &outbound,
        &cancel,
        chunk_timeout,
        &mut chunks_sent,
    )
    .await;

    send_marker(&outbound, &stream_sid, BotMarker::SpeakingEnd).await;

    let elapsed = started.elapsed();
    info!(
        task_id = id,
        status = ?status,
        chunks = chunks_sent,
        duration_ms = elapsed.as_millis() as u64,
        "Synthesis task finished"
    );

    SynthesisOutcome {
        task_id: id,
        status,
        chunks_sent,
        elapsed,
    }
}

async fn stream_audio(
    service: &dyn SynthesisService,
    request: SynthesisRequest,
    stream_sid: &str,
    outbound: &mpsc::Sender<OutboundRoute>,
    cancel: &CancellationToken,
    chunk_timeout: Option<Duration>,
    chunks_sent: &mut usize,
) -> SynthesisStatus {
    let opened = tokio::select! {
        biased;
        _ = cancel.cancelled() => return SynthesisStatus::Cancelled,
        opened = service.synthesize(request) => opened,
    };

    let mut chunks = match opened {
        Ok(chunks) => chunks,
        Err(e) => {
            error!("Synthesis request failed: {}", e);
            return SynthesisStatus::Failed;
        }
    };

    let mut encoder = StreamingEncoder::new();
    loop {
        let next = tokio::select! {
            biased;
            _ = cancel.cancelled() => return SynthesisStatus::Cancelled,
            next = next_chunk(&mut chunks, chunk_timeout) => next,
        };

        let pcm = match next {
            None => break,
            Some(Ok(pcm)) => pcm,
            Some(Err(e)) => {
                error!(chunks = *chunks_sent, "Synthesis stream failed: {}", e);
                return SynthesisStatus::Failed;
            }
        };

        let wire = encoder.push(&pcm);
        if wire.is_empty() {
            continue;
        }

        if cancel.is_cancelled() {
            return SynthesisStatus::Cancelled;
        }

        let message = OutboundMessage::media(stream_sid, BASE64_STANDARD.encode(&wire));
        if outbound.send(OutboundRoute::Message(message)).await.is_err() {
            warn!("Outbound channel closed while streaming audio");
            return SynthesisStatus::Failed;
        }
        *chunks_sent += 1;
    }

    if encoder.has_pending() {
        debug!("Dropping trailing half sample from synthesis stream");
    }
    SynthesisStatus::Completed
}

async fn next_chunk(
    chunks: &mut AudioChunkStream,
    timeout: Option<Duration>,
) -> Option<TTSResult<bytes::Bytes>> {
    match timeout {
        None => chunks.next().await,
        Some(limit) => match tokio::time::timeout(limit, chunks.next()).await {
            Ok(item) => item,
            Err(_) => Some(Err(TTSError::Timeout(limit))),
        },
    }
}

async fn send_marker(outbound: &mpsc::Sender<OutboundRoute>, stream_sid: &str, marker: BotMarker) {
    let message = OutboundMessage::mark(stream_sid, marker);
    if outbound.send(OutboundRoute::Message(message)).await.is_err() {
        debug!(marker = marker.as_str(), "Outbound channel closed, marker not sent");
    }
}
