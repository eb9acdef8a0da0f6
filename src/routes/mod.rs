pub mod api;
pub mod media_stream;
pub mod telephony;

use axum::Router;
use std::sync::Arc;

use crate::state::AppState;

/// All routes of the gateway bound to `state`
pub fn create_router(state: Arc<AppState>) -> Router {
    api::create_api_router()
        .merge(telephony::create_telephony_router())
        .merge(media_stream::create_media_stream_router())
        .with_state(state)
}
