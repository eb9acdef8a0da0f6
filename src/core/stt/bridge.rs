//! Transcription bridge
//!
//! Runs one long-lived streaming recognition call per session on its own
//! task. It touches nothing shared with the rest of the session: frames come
//! in through the ingest queue, transcript events leave through the results
//! channel.

use std::sync::Arc;
use std::time::Duration;

use futures::StreamExt;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info, warn};

use super::base::{RecognitionSettings, TranscriptEvent, TranscriptionService, clock_now};
use crate::core::audio::IngestReceiver;

/// Default time the upstream call gets to flush results after cancellation
pub const DEFAULT_SHUTDOWN_GRACE: Duration = Duration::from_secs(2);

/// How the bridge task finished
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BridgeExit {
    /// Upstream closed the stream after the audio sequence ended
    Completed,
    /// Upstream did not close within the grace period after cancellation
    GraceExpired,
    /// Opening the call failed
    OpenFailed,
    /// The stream errored mid-call
    StreamFailed,
    /// Nobody is listening for transcript events any more
    ConsumerGone,
}

/// Handle to a running bridge task
#[derive(Debug)]
pub struct TranscriptionBridge {
    handle: JoinHandle<BridgeExit>,
}

impl TranscriptionBridge {
    /// Start the bridge on a dedicated task.
    ///
    /// The frame sequence is considered exhausted once `cancel` fires; the
    /// upstream call is then given `shutdown_grace` to deliver its remaining
    /// results before the bridge exits regardless.
    pub fn spawn(
        service: Arc<dyn TranscriptionService>,
        settings: RecognitionSettings,
        frames: IngestReceiver,
        results: mpsc::UnboundedSender<TranscriptEvent>,
        cancel: CancellationToken,
        shutdown_grace: Duration,
    ) -> Self {
        let handle = tokio::spawn(run_bridge(
            service,
            settings,
            frames,
            results,
            cancel,
            shutdown_grace,
        ));
        Self { handle }
    }

    pub fn is_finished(&self) -> bool {
        self.handle.is_finished()
    }

    /// Wait for the bridge task to exit.
    pub async fn join(self) -> BridgeExit {
        match self.handle.await {
            Ok(exit) => exit,
            Err(e) => {
                error!("Transcription bridge task panicked: {}", e);
                BridgeExit::StreamFailed
            }
        }
    }
}

async fn run_bridge(
    service: Arc<dyn TranscriptionService>,
    settings: RecognitionSettings,
    frames: IngestReceiver,
    results: mpsc::UnboundedSender<TranscriptEvent>,
    cancel: CancellationToken,
    shutdown_grace: Duration,
) -> BridgeExit {
    let provider = service.provider_name();
    let audio = frames.into_stream(cancel.clone());

    let mut upstream = match service.streaming_recognize(settings, audio).await {
        Ok(stream) => stream,
        Err(e) => {
            error!(provider, "Failed to open streaming recognition: {}", e);
            return BridgeExit::OpenFailed;
        }
    };
    info!(provider, "Streaming recognition started");

    let drain = async {
        let mut published = 0u64;
        while let Some(item) = upstream.next().await {
            let batch = match item {
                Ok(batch) => batch,
                Err(e) => {
                    error!(provider, "Streaming recognition failed: {}", e);
                    return BridgeExit::StreamFailed;
                }
            };

            let received_at = clock_now();
            for result in &batch.results {
                let event = TranscriptEvent::from(result).with_received_at(received_at);
                debug!(
                    is_final = event.is_final,
                    confidence = event.confidence,
                    text = %event.text,
                    "Transcript event"
                );
                if results.send(event).is_err() {
                    return BridgeExit::ConsumerGone;
                }
                published += 1;
            }
        }
        info!(provider, published, "Streaming recognition closed");
        BridgeExit::Completed
    };

    let grace = async {
        cancel.cancelled().await;
        tokio::time::sleep(shutdown_grace).await;
    };

    tokio::select! {
        exit = drain => exit,
        _ = grace => {
            warn!(
                provider,
                grace_ms = shutdown_grace.as_millis() as u64,
                "Recognition stream did not close in time, abandoning it"
            );
            BridgeExit::GraceExpired
        }
    }
}
