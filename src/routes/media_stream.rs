//! Media stream WebSocket route configuration

use axum::{Router, routing::get};
use tower_http::trace::TraceLayer;

use crate::handlers::media_stream_handler;
use crate::handlers::twiml::MEDIA_STREAM_PATH;
use crate::state::AppState;
use std::sync::Arc;

/// Create the media stream router
///
/// # Endpoint
///
/// `GET /ws` - WebSocket upgrade for one Twilio media stream
///
/// # Protocol
///
/// Twilio sends `connected`, `start`, then `media` frames carrying base64
/// 8 kHz mu-law audio, `mark` echoes, `dtmf` and finally `stop`.
///
/// The gateway responds with:
/// - `media` frames carrying the synthesized reply
/// - `mark` frames named `bot_speaking_start` / `bot_speaking_end` around each reply
/// - `transcription` frames echoing caller transcripts
///
/// # Example
///
/// ```json
/// {"event": "start", "start": {"streamSid": "MZ...", "callSid": "CA..."}}
/// {"event": "media", "media": {"payload": "//7+/..."}}
/// ```
pub fn create_media_stream_router() -> Router<Arc<AppState>> {
    Router::new()
        .route(MEDIA_STREAM_PATH, get(media_stream_handler))
        .layer(TraceLayer::new_for_http())
}
