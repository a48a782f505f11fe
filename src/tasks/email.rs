//! Email sending task.

use std::collections::BTreeMap;
use std::time::Duration;

use async_trait::async_trait;

use crate::error::TaskError;
use crate::pool::{Task, TaskContext};
use crate::tasks::DurationRange;

/// Simulated cost of loading the email template when a prototype is built.
pub const TEMPLATE_FETCH_DELAY: Duration = Duration::from_millis(100);

const DEFAULT_TEMPLATE: &str = "<div>...Email Template...</div>";

#[derive(Debug, Clone)]
pub struct EmailTask {
    pub recipient: String,
    pub subject: String,
    pub message: String,
    pub template: String,
    pub headers: BTreeMap<String, String>,
    pub duration: DurationRange,
}

impl EmailTask {
    /// Build a prototype, paying the template load.
    pub async fn load(
        recipient: impl Into<String>,
        subject: impl Into<String>,
        message: impl Into<String>,
    ) -> Self {
        Self::load_with_fetch_delay(recipient, subject, message, TEMPLATE_FETCH_DELAY).await
    }

    pub async fn load_with_fetch_delay(
        recipient: impl Into<String>,
        subject: impl Into<String>,
        message: impl Into<String>,
        delay: Duration,
    ) -> Self {
        tokio::time::sleep(delay).await;
        Self {
            recipient: recipient.into(),
            subject: subject.into(),
            message: message.into(),
            template: DEFAULT_TEMPLATE.to_string(),
            headers: BTreeMap::new(),
            duration: DurationRange::from_millis(100, 300),
        }
    }

    pub fn with_duration(mut self, duration: DurationRange) -> Self {
        self.duration = duration;
        self
    }

    pub fn with_header(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.headers.insert(name.into(), value.into());
        self
    }

    /// Message body rendered into the template.
    pub fn render(&self) -> String {
        self.template.replace("...Email Template...", &self.message)
    }
}

#[async_trait]
impl Task for EmailTask {
    fn kind(&self) -> &'static str {
        "email"
    }

    fn label(&self) -> String {
        self.recipient.clone()
    }

    async fn run(&mut self, ctx: &TaskContext) -> Result<(), TaskError> {
        if !self.recipient.contains('@') {
            return Err(TaskError::InvalidInput {
                kind: self.kind().to_string(),
                reason: format!("invalid recipient {:?}", self.recipient),
            });
        }

        tracing::info!(
            worker = %ctx.worker_name,
            recipient = %self.recipient,
            subject = %self.subject,
            headers = self.headers.len(),
            "Sending email"
        );
        let body = self.render();
        tracing::trace!(recipient = %self.recipient, bytes = body.len(), "Rendered email body");
        tokio::time::sleep(self.duration.sample()).await;
        Ok(())
    }
}
