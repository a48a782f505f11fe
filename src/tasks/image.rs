//! Image processing task.

use std::time::Duration;

use async_trait::async_trait;
use serde_json::json;

use crate::error::TaskError;
use crate::pool::{Task, TaskContext};
use crate::tasks::DurationRange;

/// Simulated cost of fetching image metadata when a prototype is built.
pub const METADATA_FETCH_DELAY: Duration = Duration::from_millis(200);

/// Processes one image. The metadata is fetched once for the prototype and
/// carried into every clone.
#[derive(Debug, Clone)]
pub struct ImageProcessingTask {
    pub image_path: String,
    pub metadata: serde_json::Value,
    pub duration: DurationRange,
}

impl ImageProcessingTask {
    /// Build a prototype, paying the metadata fetch.
    pub async fn load(image_path: impl Into<String>) -> Self {
        Self::load_with_fetch_delay(image_path, METADATA_FETCH_DELAY).await
    }

    /// Like [`load`](Self::load) with a custom fetch delay.
    pub async fn load_with_fetch_delay(image_path: impl Into<String>, delay: Duration) -> Self {
        let image_path = image_path.into();
        let metadata = fetch_metadata(&image_path, delay).await;
        Self {
            image_path,
            metadata,
            duration: DurationRange::from_millis(100, 500),
        }
    }

    pub fn with_duration(mut self, duration: DurationRange) -> Self {
        self.duration = duration;
        self
    }
}

async fn fetch_metadata(image_path: &str, delay: Duration) -> serde_json::Value {
    tracing::debug!(image = %image_path, "Fetching image metadata");
    tokio::time::sleep(delay).await;
    json!({
        "resolution": "3000x2000",
        "format": "JPEG",
    })
}

#[async_trait]
impl Task for ImageProcessingTask {
    fn kind(&self) -> &'static str {
        "image_processing"
    }

    fn label(&self) -> String {
        self.image_path.clone()
    }

    async fn run(&mut self, ctx: &TaskContext) -> Result<(), TaskError> {
        if self.image_path.trim().is_empty() {
            return Err(TaskError::InvalidInput {
                kind: self.kind().to_string(),
                reason: "image path is empty".to_string(),
            });
        }

        tracing::info!(
            worker = %ctx.worker_name,
            image = %self.image_path,
            metadata = %self.metadata,
            "Processing image"
        );
        tokio::time::sleep(self.duration.sample()).await;
        Ok(())
    }
}
