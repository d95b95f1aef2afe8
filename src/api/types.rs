//! Wire types for the generation service.

use serde::{Deserialize, Serialize};

/// Emotion preset sent with a generation request. The service folds the
/// choice into its exaggeration parameter server-side.
#[derive(Serialize, Deserialize, Clone, Copy, Debug, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum Emotion {
    Neutral,
    Happy,
    Sad,
    Angry,
    Excited,
    Calm,
}

impl Emotion {
    pub const ALL: [Emotion; 6] = [
        Emotion::Neutral,
        Emotion::Happy,
        Emotion::Sad,
        Emotion::Angry,
        Emotion::Excited,
        Emotion::Calm,
    ];

    pub fn label(self) -> &'static str {
        match self {
            Emotion::Neutral => "Neutral",
            Emotion::Happy => "Happy",
            Emotion::Sad => "Sad",
            Emotion::Angry => "Angry",
            Emotion::Excited => "Excited",
            Emotion::Calm => "Calm",
        }
    }
}

/// Body of `POST /api/generate`. Field names match the service exactly.
#[derive(Serialize, Clone, Debug)]
#[serde(rename_all = "camelCase")]
pub struct GenerateRequest {
    pub text: String,
    pub emotion: Emotion,
    pub speed: f32,
    pub exaggeration: f32,
    pub cfg_weight: f32,
}

/// Response of `POST /api/generate`. `duration` and `sample_rate` are
/// informational extras; older servers omit them.
#[derive(Deserialize, Clone, Debug)]
#[serde(rename_all = "camelCase")]
pub struct GenerateResponse {
    pub success: bool,
    #[serde(default)]
    pub audio_file: Option<String>,
    #[serde(default)]
    pub user_id: Option<String>,
    #[serde(default)]
    pub error: Option<String>,
    #[serde(default)]
    pub duration: Option<f64>,
    #[serde(default)]
    pub sample_rate: Option<u32>,
}

/// Response of `GET /api/health`. Only the two model flags drive behavior;
/// the rest feeds the status line when present.
#[derive(Deserialize, Clone, Debug)]
pub struct HealthStatus {
    #[serde(default)]
    pub model_ready: bool,
    #[serde(default)]
    pub model_loading: bool,
    #[serde(default)]
    pub status: Option<String>,
    #[serde(default)]
    pub device: Option<String>,
    #[serde(default)]
    pub loading_progress: Option<u8>,
}

/// One row of `GET /api/list-audio`.
#[derive(Deserialize, Clone, Debug, PartialEq)]
pub struct AudioFileEntry {
    pub filename: String,
    #[serde(default)]
    pub size: u64,
    /// Unix seconds, fractional.
    #[serde(default)]
    pub created: f64,
}

#[derive(Deserialize, Clone, Debug, Default)]
pub struct ListAudioResponse {
    #[serde(default)]
    pub files: Vec<AudioFileEntry>,
}

#[derive(Serialize, Clone, Copy, Debug)]
pub struct CleanupRequest {
    pub max_files: u32,
}

#[derive(Deserialize, Clone, Debug)]
pub struct CleanupSummary {
    #[serde(default)]
    pub message: Option<String>,
    #[serde(default)]
    pub deleted_count: Option<u32>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn generate_request_uses_service_field_names() {
        let req = GenerateRequest {
            text: "hello".into(),
            emotion: Emotion::Calm,
            speed: 1.2,
            exaggeration: 0.8,
            cfg_weight: 0.5,
        };
        let value = serde_json::to_value(&req).unwrap();
        assert_eq!(value["text"], "hello");
        assert_eq!(value["emotion"], "calm");
        assert_eq!(value["cfgWeight"], 0.5);
        assert!(value.get("cfg_weight").is_none());
    }

    #[test]
    fn success_response_parses() {
        let raw = r#"{
            "success": true,
            "audioFile": "tts_happy_20250101_120000.wav",
            "filePath": "generated_audio/u1/tts_happy_20250101_120000.wav",
            "duration": 2.5,
            "sampleRate": 24000,
            "userId": "u1"
        }"#;
        let resp: GenerateResponse = serde_json::from_str(raw).unwrap();
        assert!(resp.success);
        assert_eq!(resp.audio_file.as_deref(), Some("tts_happy_20250101_120000.wav"));
        assert_eq!(resp.user_id.as_deref(), Some("u1"));
        assert_eq!(resp.sample_rate, Some(24000));
        assert_eq!(resp.error, None);
    }

    #[test]
    fn failure_response_parses() {
        let raw = r#"{"success": false, "error": "text too long"}"#;
        let resp: GenerateResponse = serde_json::from_str(raw).unwrap();
        assert!(!resp.success);
        assert_eq!(resp.error.as_deref(), Some("text too long"));
        assert_eq!(resp.audio_file, None);
    }

    #[test]
    fn health_parses_with_and_without_extras() {
        let full: HealthStatus = serde_json::from_str(
            r#"{"status":"running","device":"mps","model_ready":true,"model_loading":false,"loading_progress":100}"#,
        )
        .unwrap();
        assert!(full.model_ready);
        assert_eq!(full.device.as_deref(), Some("mps"));

        let bare: HealthStatus = serde_json::from_str(r#"{"model_loading":true}"#).unwrap();
        assert!(!bare.model_ready);
        assert!(bare.model_loading);
        assert_eq!(bare.loading_progress, None);
    }

    #[test]
    fn emotion_labels_cover_all_variants() {
        for emotion in Emotion::ALL {
            assert!(!emotion.label().is_empty());
        }
    }
}
