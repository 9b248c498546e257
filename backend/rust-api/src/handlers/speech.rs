use axum::{
    extract::State,
    http::{header, StatusCode},
    response::IntoResponse,
};
use std::sync::Arc;

use crate::{
    errors::ApiError,
    services::{speech_service::SpeechService, AppState},
};

/// POST /api/v1/speech/demo - Generate the demo narration audio. Returns the
/// MP3 payload, or a JSON error body on upstream failure.
pub async fn generate_demo_speech(
    State(state): State<Arc<AppState>>,
) -> Result<impl IntoResponse, ApiError> {
    let service = SpeechService::from_config(&state.config)?;
    let audio = service.generate_demo_speech().await?;

    Ok((
        StatusCode::OK,
        [
            (header::CONTENT_TYPE, "audio/mpeg".to_string()),
            (header::CONTENT_LENGTH, audio.len().to_string()),
        ],
        audio,
    ))
}
