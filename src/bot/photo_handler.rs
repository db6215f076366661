//! Photo Handler module: download, describe, reply

use std::path::PathBuf;
use std::sync::Arc;

use tempfile::NamedTempFile;
use thiserror::Error;
use tracing::{debug, error, info, warn};

use crate::errors::{PlatformDeliveryError, RecognitionError};
use crate::localization::t;
use crate::recognition::{Classification, ImageDescriber, ImageDescription};

use super::events::{Messenger, PhotoMessage, PhotoVariant};

/// Why a photo could not be described
#[derive(Debug, Error)]
enum PhotoError {
    #[error("photo message has no size variants")]
    NoVariant,
    #[error(transparent)]
    Download(#[from] PlatformDeliveryError),
    #[error("cannot write temporary file: {0}")]
    TempFile(#[from] std::io::Error),
    #[error(transparent)]
    Recognition(#[from] RecognitionError),
}

/// Reply text for a description
pub fn compose_reply(description: &ImageDescription) -> String {
    match description.classify() {
        Classification::Unrecognized => t("describe-unrecognized"),
        Classification::Tentative(text) => format!("{}\n\n{}", t("describe-tentative"), text),
        Classification::Confident(text) => format!("{}\n\n{}", t("describe-confident"), text),
    }
}

pub struct PhotoHandler {
    describer: Arc<dyn ImageDescriber>,
    temp_dir: Option<PathBuf>,
}

impl PhotoHandler {
    pub fn new(describer: Arc<dyn ImageDescriber>) -> Self {
        Self {
            describer,
            temp_dir: None,
        }
    }

    /// Create temporary files in `dir` instead of the system temp directory
    pub fn with_temp_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.temp_dir = Some(dir.into());
        self
    }

    /// Describe the photo and send exactly one reply.
    ///
    /// Download and recognition failures degrade to the "cannot recognize"
    /// reply; only a failure to deliver that reply is returned.
    pub async fn handle(
        &self,
        messenger: &dyn Messenger,
        photo: &PhotoMessage,
    ) -> Result<(), PlatformDeliveryError> {
        let chat_id = photo.origin.chat_id;
        debug!(user_id = chat_id, variants = photo.variants.len(), "Received photo message from user");

        let reply = match self.download_and_describe(messenger, photo.largest()).await {
            Ok(description) => compose_reply(&description),
            Err(e) => {
                warn!(user_id = chat_id, error = %e, "Photo description failed");
                t("describe-unrecognized")
            }
        };

        messenger.send_reply(photo.origin, &reply).await?;
        info!(user_id = chat_id, "Photo description sent");
        Ok(())
    }

    async fn download_and_describe(
        &self,
        messenger: &dyn Messenger,
        variant: Option<&PhotoVariant>,
    ) -> Result<ImageDescription, PhotoError> {
        let variant = variant.ok_or(PhotoError::NoVariant)?;
        let bytes = messenger.fetch_file(&variant.file_ref).await?;

        // Deleted on drop, so every early return below cleans up
        let temp_file = self.create_temp_file()?;
        tokio::fs::write(temp_file.path(), &bytes).await?;
        debug!(
            temp_path = %temp_file.path().display(),
            width = variant.width,
            height = variant.height,
            "Image downloaded successfully"
        );

        let result = self.describer.describe(temp_file.path()).await;

        let temp_path = temp_file.path().display().to_string();
        if let Err(cleanup_err) = temp_file.close() {
            error!(temp_path = %temp_path, error = %cleanup_err, "Failed to clean up temporary file");
        } else {
            debug!(temp_path = %temp_path, "Temporary file cleaned up successfully");
        }

        Ok(result?)
    }

    fn create_temp_file(&self) -> std::io::Result<NamedTempFile> {
        let mut builder = tempfile::Builder::new();
        builder.prefix("photo-").suffix(".jpg");
        match &self.temp_dir {
            Some(dir) => builder.tempfile_in(dir),
            None => builder.tempfile(),
        }
    }
}
