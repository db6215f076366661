//! Fakes shared by the integration tests

#![allow(dead_code)]

use std::path::{Path, PathBuf};
use std::sync::Mutex;

use async_trait::async_trait;
use photo_describer::bot::events::{Messenger, Origin, PhotoMessage, PhotoVariant};
use photo_describer::errors::{PlatformDeliveryError, RecognitionError};
use photo_describer::recognition::{ImageDescriber, ImageDescription};

pub const ORIGIN: Origin = Origin {
    chat_id: 4242,
    message_id: 17,
};

fn delivery_error() -> PlatformDeliveryError {
    PlatformDeliveryError::Request(teloxide::RequestError::Api(teloxide::ApiError::BotBlocked))
}

/// Records replies and serves file downloads from memory
#[derive(Default)]
pub struct FakeMessenger {
    pub replies: Mutex<Vec<(Origin, String)>>,
    pub fetched: Mutex<Vec<String>>,
    pub fail_download: bool,
    pub fail_reply: bool,
}

impl FakeMessenger {
    pub fn failing_download() -> Self {
        Self {
            fail_download: true,
            ..Default::default()
        }
    }

    pub fn failing_reply() -> Self {
        Self {
            fail_reply: true,
            ..Default::default()
        }
    }

    pub fn reply_texts(&self) -> Vec<String> {
        self.replies
            .lock()
            .unwrap()
            .iter()
            .map(|(_, text)| text.clone())
            .collect()
    }
}

#[async_trait]
impl Messenger for FakeMessenger {
    async fn send_reply(&self, origin: Origin, text: &str) -> Result<(), PlatformDeliveryError> {
        if self.fail_reply {
            return Err(delivery_error());
        }
        self.replies.lock().unwrap().push((origin, text.to_string()));
        Ok(())
    }

    async fn fetch_file(&self, file_ref: &str) -> Result<Vec<u8>, PlatformDeliveryError> {
        self.fetched.lock().unwrap().push(file_ref.to_string());
        if self.fail_download {
            return Err(delivery_error());
        }
        Ok(format!("image bytes of {file_ref}").into_bytes())
    }
}

/// Returns a canned answer and remembers which files it was given
pub struct FakeDescriber {
    answer: Box<dyn Fn() -> Result<ImageDescription, RecognitionError> + Send + Sync>,
    pub seen_paths: Mutex<Vec<PathBuf>>,
    pub seen_contents: Mutex<Vec<Vec<u8>>>,
}

impl FakeDescriber {
    pub fn answering(successful: bool, high_confidence: bool, text: &str) -> Self {
        let text = text.to_string();
        Self::with(move || {
            Ok(ImageDescription {
                successful,
                high_confidence,
                best_description: text.clone(),
                confidence_score: Some(0.5),
            })
        })
    }

    pub fn failing() -> Self {
        Self::with(|| {
            Err(RecognitionError::Api {
                status: 500,
                message: "upstream exploded".to_string(),
            })
        })
    }

    fn with<F>(answer: F) -> Self
    where
        F: Fn() -> Result<ImageDescription, RecognitionError> + Send + Sync + 'static,
    {
        Self {
            answer: Box::new(answer),
            seen_paths: Mutex::new(Vec::new()),
            seen_contents: Mutex::new(Vec::new()),
        }
    }
}

#[async_trait]
impl ImageDescriber for FakeDescriber {
    async fn describe(&self, image_path: &Path) -> Result<ImageDescription, RecognitionError> {
        assert!(image_path.exists(), "temp file must exist while describing");
        self.seen_paths.lock().unwrap().push(image_path.to_path_buf());
        self.seen_contents
            .lock()
            .unwrap()
            .push(std::fs::read(image_path).unwrap());
        (self.answer)()
    }
}

pub fn photo(file_refs: &[&str]) -> PhotoMessage {
    PhotoMessage {
        origin: ORIGIN,
        variants: file_refs
            .iter()
            .enumerate()
            .map(|(i, file_ref)| PhotoVariant {
                file_ref: file_ref.to_string(),
                width: 90 * (i as u32 + 1),
                height: 90 * (i as u32 + 1),
                file_size: None,
            })
            .collect(),
    }
}
