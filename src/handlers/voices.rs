use axum::{
    extract::{Query, State},
    response::Json,
};
use serde::{Deserialize, Serialize};
use std::sync::Arc;

use crate::core::tts::{Voice, available_voices};
use crate::errors::{AppError, AppResult};
use crate::state::AppState;

#[derive(Debug, Deserialize)]
pub struct VoicesQuery {
    /// Defaults to the configured language
    pub language: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct VoicesResponse {
    pub language: String,
    /// Voice used for replies
    pub default_voice: String,
    pub voices: Vec<Voice>,
}

/// List the synthesis voices for a language
pub async fn list_voices(
    State(state): State<Arc<AppState>>,
    Query(query): Query<VoicesQuery>,
) -> AppResult<Json<VoicesResponse>> {
    let language = query
        .language
        .unwrap_or_else(|| state.config.language_code.clone());
    let voices = available_voices(&language)
        .ok_or_else(|| AppError::NotFound(format!("No voices for language {language}")))?;

    Ok(Json(VoicesResponse {
        default_voice: state.config.voice_name.clone(),
        voices: voices.to_vec(),
        language,
    }))
}
