//! Blocking HTTP client for the generation service.

use std::io::Read;

use anyhow::{Context, Result};
use lazy_static::lazy_static;

use super::types::{
    AudioFileEntry, CleanupRequest, CleanupSummary, GenerateRequest, HealthStatus,
    ListAudioResponse,
};

lazy_static! {
    /// Shared agent. Keeps connections alive and, importantly, carries the
    /// session cookie the service uses to key per-user audio files.
    pub static ref HTTP_AGENT: ureq::Agent = ureq::AgentBuilder::new().build();
}

pub struct ApiClient {
    base: String,
}

impl ApiClient {
    pub fn new(base: impl Into<String>) -> Self {
        let mut base = base.into();
        while base.ends_with('/') {
            base.pop();
        }
        Self { base }
    }

    fn endpoint(&self, path: &str) -> String {
        format!("{}{}", self.base, path)
    }

    /// Path portion of an audio resource URL. Files generated within a
    /// session live under the user id; legacy files sit at the top level.
    pub fn audio_path(file: &str, user_id: Option<&str>) -> String {
        match user_id {
            Some(user) => format!(
                "/api/audio/{}/{}",
                urlencoding::encode(user),
                urlencoding::encode(file)
            ),
            None => format!("/api/audio/{}", urlencoding::encode(file)),
        }
    }

    pub fn audio_url(&self, file: &str, user_id: Option<&str>) -> String {
        self.endpoint(&Self::audio_path(file, user_id))
    }

    pub fn health(&self) -> Result<HealthStatus> {
        let resp = HTTP_AGENT
            .get(&self.endpoint("/api/health"))
            .call()
            .context("health check failed")?;
        Ok(resp.into_json::<HealthStatus>()?)
    }

    /// Raw POST so the caller can distinguish HTTP status failures from
    /// transport errors and read the body itself.
    pub fn post_generate(&self, req: &GenerateRequest) -> Result<ureq::Response, ureq::Error> {
        HTTP_AGENT
            .post(&self.endpoint("/api/generate"))
            .send_json(req)
    }

    pub fn fetch_bytes(&self, url: &str) -> Result<Vec<u8>> {
        let resp = HTTP_AGENT
            .get(url)
            .call()
            .with_context(|| format!("fetching {url}"))?;
        let mut data = Vec::new();
        resp.into_reader()
            .read_to_end(&mut data)
            .context("reading audio body")?;
        Ok(data)
    }

    pub fn list_audio(&self) -> Result<Vec<AudioFileEntry>> {
        let resp = HTTP_AGENT
            .get(&self.endpoint("/api/list-audio"))
            .call()
            .context("listing audio files")?;
        Ok(resp.into_json::<ListAudioResponse>()?.files)
    }

    pub fn cleanup(&self, max_files: u32) -> Result<CleanupSummary> {
        let resp = HTTP_AGENT
            .post(&self.endpoint("/api/cleanup"))
            .send_json(&CleanupRequest { max_files })
            .map_err(|e| anyhow::anyhow!("cleanup request failed: {e}"))?;
        Ok(resp.into_json::<CleanupSummary>()?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn audio_path_without_user_is_flat() {
        assert_eq!(ApiClient::audio_path("x.wav", None), "/api/audio/x.wav");
    }

    #[test]
    fn audio_path_with_user_nests() {
        assert_eq!(
            ApiClient::audio_path("x.wav", Some("u1")),
            "/api/audio/u1/x.wav"
        );
    }

    #[test]
    fn audio_path_escapes_awkward_names() {
        assert_eq!(
            ApiClient::audio_path("a b.wav", None),
            "/api/audio/a%20b.wav"
        );
    }

    #[test]
    fn endpoint_tolerates_trailing_slash_in_base() {
        let client = ApiClient::new("http://box:5000/");
        assert_eq!(
            client.audio_url("x.wav", Some("u1")),
            "http://box:5000/api/audio/u1/x.wav"
        );
        let client = ApiClient::new("http://box:5000");
        assert_eq!(client.endpoint("/api/health"), "http://box:5000/api/health");
    }
}
