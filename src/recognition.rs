//! # Image Recognition Module
//!
//! Client for the Cloudmersive "Recognize / Describe" endpoint, which returns
//! an English sentence describing an uploaded image.
//! API doc: https://api.cloudmersive.com/docs/image.asp

use std::path::Path;

use async_trait::async_trait;
use reqwest::multipart::{Form, Part};
use serde::Deserialize;
use tracing::{debug, info, warn};

use crate::config::RecognitionConfig;
use crate::credentials::Credential;
use crate::errors::RecognitionError;

pub const DESCRIBE_PATH: &str = "/image/recognize/describe";
pub const API_KEY_HEADER: &str = "Apikey";
pub const IMAGE_FIELD: &str = "imageFile";

/// Description of an image, as returned by the recognition API
#[derive(Debug, Clone, PartialEq)]
pub struct ImageDescription {
    pub successful: bool,
    pub high_confidence: bool,
    pub best_description: String,
    pub confidence_score: Option<f64>,
}

/// How an [`ImageDescription`] should be phrased to the user
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Classification<'a> {
    Unrecognized,
    Tentative(&'a str),
    Confident(&'a str),
}

impl ImageDescription {
    pub fn classify(&self) -> Classification<'_> {
        let description = self.best_description.trim();
        if !self.successful || description.is_empty() {
            Classification::Unrecognized
        } else if !self.high_confidence {
            Classification::Tentative(description)
        } else {
            Classification::Confident(description)
        }
    }
}

/// Anything able to describe a local image file
#[async_trait]
pub trait ImageDescriber: Send + Sync {
    async fn describe(&self, image_path: &Path) -> Result<ImageDescription, RecognitionError>;
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "PascalCase")]
struct DescribeResponse {
    #[serde(default)]
    successful: bool,
    #[serde(default)]
    highconfidence: bool,
    best_outcome: Option<RecognitionOutcome>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "PascalCase")]
struct RecognitionOutcome {
    confidence_score: Option<f64>,
    description: Option<String>,
}

impl From<DescribeResponse> for ImageDescription {
    fn from(response: DescribeResponse) -> Self {
        let (best_description, confidence_score) = match response.best_outcome {
            Some(outcome) => (outcome.description.unwrap_or_default(), outcome.confidence_score),
            None => (String::new(), None),
        };
        Self {
            successful: response.successful,
            high_confidence: response.highconfidence,
            best_description,
            confidence_score,
        }
    }
}

/// HTTP client for the Cloudmersive image API
#[derive(Debug, Clone)]
pub struct CloudmersiveClient {
    http: reqwest::Client,
    api_key: Credential,
    describe_url: String,
}

impl CloudmersiveClient {
    pub fn new(api_key: Credential, config: &RecognitionConfig) -> Result<Self, RecognitionError> {
        let http = reqwest::Client::builder()
            .timeout(config.timeout())
            .build()?;
        Ok(Self {
            http,
            api_key,
            describe_url: format!("{}{}", config.base_url.trim_end_matches('/'), DESCRIBE_PATH),
        })
    }
}

#[async_trait]
impl ImageDescriber for CloudmersiveClient {
    async fn describe(&self, image_path: &Path) -> Result<ImageDescription, RecognitionError> {
        let bytes = tokio::fs::read(image_path).await?;
        let file_name = image_path
            .file_name()
            .map(|name| name.to_string_lossy().into_owned())
            .unwrap_or_else(|| "image".to_string());
        debug!(path = %image_path.display(), size = bytes.len(), "Uploading image for description");

        let form = Form::new().part(IMAGE_FIELD, Part::bytes(bytes).file_name(file_name));
        let response = self
            .http
            .post(&self.describe_url)
            .header(API_KEY_HEADER, self.api_key.expose())
            .multipart(form)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let message = response.text().await.unwrap_or_default();
            warn!(status = status.as_u16(), "Recognition API rejected the request");
            return Err(RecognitionError::Api {
                status: status.as_u16(),
                message: message.trim().to_string(),
            });
        }

        let body = response.text().await?;
        let parsed: DescribeResponse = serde_json::from_str(&body)
            .map_err(|e| RecognitionError::MalformedResponse(e.to_string()))?;
        let description = ImageDescription::from(parsed);

        info!(
            successful = description.successful,
            high_confidence = description.high_confidence,
            confidence_score = ?description.confidence_score,
            "Image description received"
        );
        Ok(description)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn description(successful: bool, high_confidence: bool, text: &str) -> ImageDescription {
        ImageDescription {
            successful,
            high_confidence,
            best_description: text.to_string(),
            confidence_score: None,
        }
    }

    #[test]
    fn test_classify_unsuccessful_ignores_other_fields() {
        assert_eq!(description(false, true, "a cat").classify(), Classification::Unrecognized);
        assert_eq!(description(false, false, "").classify(), Classification::Unrecognized);
    }

    #[test]
    fn test_classify_by_confidence() {
        assert_eq!(description(true, false, "a cat").classify(), Classification::Tentative("a cat"));
        assert_eq!(
            description(true, true, "a dog running").classify(),
            Classification::Confident("a dog running")
        );
    }

    #[test]
    fn test_classify_blank_description_is_unrecognized() {
        assert_eq!(description(true, true, "  ").classify(), Classification::Unrecognized);
    }

    #[test]
    fn test_parse_pascal_case_response() {
        let body = r#"{
            "Successful": true,
            "Highconfidence": false,
            "BestOutcome": {"ConfidenceScore": 0.42, "Description": "a cat sitting on a couch"},
            "RunnerUpOutcome": {"ConfidenceScore": 0.1, "Description": "a dog"}
        }"#;
        let parsed: DescribeResponse = serde_json::from_str(body).unwrap();
        let description = ImageDescription::from(parsed);

        assert!(description.successful);
        assert!(!description.high_confidence);
        assert_eq!(description.best_description, "a cat sitting on a couch");
        assert_eq!(description.confidence_score, Some(0.42));
    }

    #[test]
    fn test_parse_response_without_outcome() {
        let parsed: DescribeResponse = serde_json::from_str(r#"{"Successful": false}"#).unwrap();
        let description = ImageDescription::from(parsed);

        assert!(!description.successful);
        assert!(description.best_description.is_empty());
    }

    #[test]
    fn test_describe_url_joins_base() {
        let config = RecognitionConfig {
            base_url: "http://localhost:1234/".to_string(),
            ..Default::default()
        };
        let client = CloudmersiveClient::new(Credential::new("key"), &config).unwrap();
        assert_eq!(client.describe_url, "http://localhost:1234/image/recognize/describe");
    }
}
