//! Audio ingest queue
//!
//! Unbounded single-producer/single-consumer FIFO that decouples the socket
//! receive path from the transcription stream. The producer never blocks; the
//! consumer awaits the next frame instead of polling.

use futures::stream::BoxStream;
use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;

use super::AudioFrame;

/// Create a connected producer/consumer pair.
pub fn ingest_queue() -> (IngestSender, IngestReceiver) {
    let (tx, rx) = mpsc::unbounded_channel();
    (IngestSender { tx, pushed: 0 }, IngestReceiver { rx })
}

/// Producer half, held by the session controller.
#[derive(Debug)]
pub struct IngestSender {
    tx: mpsc::UnboundedSender<AudioFrame>,
    pushed: u64,
}

impl IngestSender {
    /// Enqueue a frame. Returns false once the consumer is gone.
    pub fn push(&mut self, frame: AudioFrame) -> bool {
        if self.tx.send(frame).is_err() {
            return false;
        }
        self.pushed += 1;
        true
    }

    /// Number of frames accepted so far
    pub fn frames_pushed(&self) -> u64 {
        self.pushed
    }

    pub fn is_closed(&self) -> bool {
        self.tx.is_closed()
    }
}

/// Consumer half, owned by the transcription bridge.
#[derive(Debug)]
pub struct IngestReceiver {
    rx: mpsc::UnboundedReceiver<AudioFrame>,
}

impl IngestReceiver {
    pub async fn recv(&mut self) -> Option<AudioFrame> {
        self.rx.recv().await
    }

    /// Turn the queue into a lazy frame sequence.
    ///
    /// The sequence is exhausted when `cancel` fires or every producer is
    /// dropped, whichever comes first. Frames still queued at cancellation are
    /// discarded.
    pub fn into_stream(self, cancel: CancellationToken) -> BoxStream<'static, AudioFrame> {
        let mut rx = self.rx;
        Box::pin(async_stream::stream! {
            loop {
                let next = tokio::select! {
                    biased;
                    _ = cancel.cancelled() => None,
                    frame = rx.recv() => frame,
                };
                match next {
                    Some(frame) => yield frame,
                    None => break,
                }
            }
        })
    }
}
