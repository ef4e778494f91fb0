//! Channel trait and message types shared by transports.

use std::pin::Pin;
use std::sync::Arc;

use async_trait::async_trait;
use futures::{Stream, StreamExt};

use crate::error::ChannelError;
use crate::onboarding::IntakeManager;

/// A message received from a transport.
#[derive(Debug, Clone)]
pub struct IncomingMessage {
    /// Name of the channel it arrived on.
    pub channel: String,
    /// Stable sender identity; sessions are keyed by it.
    pub user_id: String,
    pub content: String,
}

impl IncomingMessage {
    pub fn new(channel: &str, user_id: &str, content: &str) -> Self {
        Self {
            channel: channel.to_string(),
            user_id: user_id.to_string(),
            content: content.to_string(),
        }
    }
}

/// Reply text handed back to a transport.
#[derive(Debug, Clone)]
pub struct OutgoingResponse {
    pub content: String,
}

impl OutgoingResponse {
    pub fn text(content: impl Into<String>) -> Self {
        Self {
            content: content.into(),
        }
    }
}

pub type MessageStream = Pin<Box<dyn Stream<Item = IncomingMessage> + Send>>;

/// A pull-style transport: yields inbound messages and accepts replies.
#[async_trait]
pub trait Channel: Send + Sync {
    fn name(&self) -> &str;

    /// Start receiving messages.
    async fn start(&self) -> Result<MessageStream, ChannelError>;

    /// Deliver the reply to `msg`.
    async fn respond(
        &self,
        msg: &IncomingMessage,
        response: OutgoingResponse,
    ) -> Result<(), ChannelError>;
}

/// Feed every message from `channel` through the intake manager until the
/// stream ends.
pub async fn run_channel(
    channel: Arc<dyn Channel>,
    manager: Arc<IntakeManager>,
) -> Result<(), ChannelError> {
    let mut stream = channel.start().await?;
    tracing::info!(channel = channel.name(), "Channel started");

    while let Some(msg) = stream.next().await {
        tracing::debug!(channel = %msg.channel, sender = %msg.user_id, "Message received");
        let reply = manager.handle_message(&msg.user_id, &msg.content).await;
        if let Err(e) = channel.respond(&msg, OutgoingResponse::text(reply)).await {
            tracing::warn!(channel = channel.name(), error = %e, "Failed to deliver reply");
        }
    }

    tracing::info!(channel = channel.name(), "Channel stream ended");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::answer::AnswerSynthesizer;
    use crate::config::{AnswerConfig, KnowledgeConfig};
    use crate::knowledge::KnowledgeBase;
    use crate::onboarding::prompts;
    use crate::store::LibSqlBackend;
    use std::sync::Mutex;

    struct ScriptChannel {
        script: Vec<&'static str>,
        replies: Mutex<Vec<String>>,
    }

    #[async_trait]
    impl Channel for ScriptChannel {
        fn name(&self) -> &str {
            "script"
        }

        async fn start(&self) -> Result<MessageStream, ChannelError> {
            let msgs: Vec<_> = self
                .script
                .iter()
                .map(|line| IncomingMessage::new("script", "tester", line))
                .collect();
            Ok(Box::pin(futures::stream::iter(msgs)))
        }

        async fn respond(
            &self,
            _msg: &IncomingMessage,
            response: OutgoingResponse,
        ) -> Result<(), ChannelError> {
            self.replies.lock().unwrap().push(response.content);
            Ok(())
        }
    }

    #[tokio::test]
    async fn run_channel_replies_to_each_message() {
        let store = Arc::new(LibSqlBackend::new_memory().await.unwrap());
        let manager = Arc::new(IntakeManager::new(
            store,
            Arc::new(KnowledgeBase::empty(&KnowledgeConfig::default())),
            Arc::new(AnswerSynthesizer::new(None, &AnswerConfig::default())),
            None,
        ));
        let channel = Arc::new(ScriptChannel {
            script: vec!["hi", "Alice", "a@x.com"],
            replies: Mutex::new(Vec::new()),
        });

        run_channel(channel.clone(), manager).await.unwrap();

        let replies = channel.replies.lock().unwrap();
        assert_eq!(
            *replies,
            vec![prompts::WELCOME, prompts::ASK_EMAIL, prompts::ASK_BUSINESS]
        );
    }
}
