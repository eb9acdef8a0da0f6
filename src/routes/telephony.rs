//! Telephony webhook routes
//!
//! `POST /answer` is configured as the voice webhook of the phone number. It
//! answers with TwiML that connects the call to the media stream socket.

use axum::{Router, routing::post};
use tower_http::trace::TraceLayer;

use crate::handlers::twiml::answer_call;
use crate::state::AppState;
use std::sync::Arc;

pub fn create_telephony_router() -> Router<Arc<AppState>> {
    Router::new()
        .route("/answer", post(answer_call))
        .layer(TraceLayer::new_for_http())
}
