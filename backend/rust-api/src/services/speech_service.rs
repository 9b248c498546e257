use axum::body::Bytes;
use reqwest::Client;
use serde_json::json;

use crate::config::Config;
use crate::errors::ApiError;
use crate::metrics::SPEECH_REQUESTS_TOTAL;

/// Voice used for the landing-page demo narration.
const DEMO_VOICE_ID: &str = "9BWtsMINqrJLrRacOk9x";
const DEMO_MODEL_ID: &str = "eleven_multilingual_v2";
const UPSTREAM_TIMEOUT_SECS: u64 = 30;

/// The fixed narration script for the platform demo audio.
const DEMO_SCRIPT: &str = "\
Welcome to Ujuzi Skills, the revolutionary e-learning platform designed specifically for rural communities.

Are you ready to transform your life through digital education? At Ujuzi Skills, we believe that everyone deserves access to quality education, regardless of their location.

Our platform offers interactive live classes where you can learn directly from expert instructors. Whether you want to develop digital literacy, learn new technical skills, or pursue professional development, we have courses tailored for your needs.

With over 500 students already enrolled and a 95% success rate, Ujuzi Skills is bridging the digital divide one student at a time. Our courses are designed to be practical and applicable to rural contexts, ensuring that what you learn can be immediately implemented in your daily life.

What makes us special? We provide lifetime access to course materials, certificates of completion, and most importantly, a supportive community of learners just like you. Many of our courses are completely free, because we believe education should be accessible to everyone.

Join the hundreds of students who have already transformed their lives through digital education. From basic computer skills to advanced technical training, from entrepreneurship to agricultural technology, we have the tools you need to succeed.

Don't let distance be a barrier to your dreams. With Ujuzi Skills, quality education is just a click away. Our mobile-friendly platform works on any device, so you can learn whenever and wherever it's convenient for you.

Take the first step towards a brighter future. Enroll today and discover how digital education can unlock new opportunities for you and your community. Your journey to success starts here, at Ujuzi Skills.

Click the enroll button now and join our growing community of lifelong learners. Together, we're building a more connected and educated world, one student at a time.";

/// Stateless proxy to the text-to-speech provider. Carries no state across
/// calls and touches no part of the data model.
pub struct SpeechService {
    http_client: Client,
    api_url: String,
    api_key: String,
}

impl SpeechService {
    /// Fails when no provider API key is configured.
    pub fn from_config(config: &Config) -> Result<Self, ApiError> {
        let api_key = config
            .elevenlabs_api_key
            .clone()
            .ok_or_else(|| ApiError::SpeechUpstream("ELEVENLABS_API_KEY is not set".to_string()))?;

        Ok(Self {
            http_client: Client::new(),
            api_url: config.elevenlabs_api_url.clone(),
            api_key,
        })
    }

    /// Forward the fixed demo script to the provider and return the MP3
    /// payload.
    pub async fn generate_demo_speech(&self) -> Result<Bytes, ApiError> {
        let url = format!("{}/v1/text-to-speech/{}", self.api_url, DEMO_VOICE_ID);

        let body = json!({
            "text": DEMO_SCRIPT,
            "model_id": DEMO_MODEL_ID,
            "voice_settings": {
                "stability": 0.5,
                "similarity_boost": 0.8,
                "style": 0.2,
                "use_speaker_boost": true
            }
        });

        tracing::debug!("Calling speech provider: {}", url);

        let response = self
            .http_client
            .post(&url)
            .header("xi-api-key", &self.api_key)
            .json(&body)
            .timeout(std::time::Duration::from_secs(UPSTREAM_TIMEOUT_SECS))
            .send()
            .await
            .map_err(|e| {
                SPEECH_REQUESTS_TOTAL.with_label_values(&["error"]).inc();
                ApiError::SpeechUpstream(format!("Failed to call speech provider: {}", e))
            })?;

        if !response.status().is_success() {
            let status = response.status();
            SPEECH_REQUESTS_TOTAL.with_label_values(&["error"]).inc();
            return Err(ApiError::SpeechUpstream(format!(
                "Speech provider returned status: {}",
                status
            )));
        }

        let audio = response.bytes().await.map_err(|e| {
            SPEECH_REQUESTS_TOTAL.with_label_values(&["error"]).inc();
            ApiError::SpeechUpstream(format!("Failed to read audio payload: {}", e))
        })?;

        SPEECH_REQUESTS_TOTAL.with_label_values(&["ok"]).inc();
        tracing::info!("Generated demo speech ({} bytes)", audio.len());

        Ok(audio)
    }
}
