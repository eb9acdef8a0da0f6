//! TwiML answer webhook
//!
//! Twilio fetches this document when a call comes in and opens a media
//! stream to the URL it names.

use axum::{
    extract::State,
    http::{HeaderMap, header},
    response::{IntoResponse, Response},
};
use std::sync::Arc;
use tracing::info;

use crate::errors::{AppError, AppResult};
use crate::state::AppState;

/// Path the media stream socket is served on
pub const MEDIA_STREAM_PATH: &str = "/ws";

/// TwiML connecting the call to the media stream socket on `host`
pub fn connect_stream_twiml(host: &str) -> String {
    format!(
        r#"<?xml version="1.0" encoding="UTF-8"?><Response><Connect><Stream url="wss://{host}{MEDIA_STREAM_PATH}"/></Connect></Response>"#
    )
}

/// Answer an incoming call
///
/// The stream host is the configured public host, or else the request's
/// `Host` header.
pub async fn answer_call(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
) -> AppResult<Response> {
    let host = match &state.config.public_host {
        Some(host) => host.clone(),
        None => headers
            .get(header::HOST)
            .and_then(|value| value.to_str().ok())
            .map(str::to_string)
            .ok_or_else(|| AppError::BadRequest("Missing Host header".to_string()))?,
    };

    info!(host = %host, "Answering incoming call");
    Ok((
        [(header::CONTENT_TYPE, "application/xml")],
        connect_stream_twiml(&host),
    )
        .into_response())
}
